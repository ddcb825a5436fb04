//! Group administration: narration of group-state changes and the
//! `/name`, `/add` and `/remove` commands.

use {
    msgkit_commands::{RosterMember, roster::BOT_ALIAS},
    msgkit_common::ids,
    msgkit_dispatch::{Command, Error, MessageContext, Result, error::Context as _},
    msgkit_protocol::{GroupUpdated, metadata_fields},
    tracing::{info, warn},
};

use crate::Narrator;

pub const RENAME_FAILED_REPLY: &str = "No admin privileges";
pub const ADD_FAILED_REPLY: &str = "User already exists or no admin privileges";
pub const REMOVE_FAILED_REPLY: &str = "User doesn't exist or no admin privileges";

/// Alias used when the initiator of a change is not on the roster.
pub const UNKNOWN_ADMIN: &str = "Admin";

/// Announcement for a group-state change, if it warrants one.
///
/// Additions win over removals, which win over a rename.
pub fn describe_update<C: Command>(
    ctx: &MessageContext<C>,
    update: &GroupUpdated,
    narrator: &Narrator,
) -> Option<String> {
    let roster = ctx.roster();
    let admin = roster
        .find_by_inbox_id(&update.initiated_by_inbox_id)
        .map(|m| m.alias.as_str())
        .unwrap_or(UNKNOWN_ADMIN);

    if !update.added_inboxes.is_empty() {
        let names: Vec<String> = update
            .added_inboxes
            .iter()
            .filter_map(|added| roster.find_by_inbox_id(&added.inbox_id))
            .map(RosterMember::mention)
            .collect();
        return narrator.welcome(&names, admin);
    }
    if !update.removed_inboxes.is_empty() {
        return Some(narrator.farewell(admin));
    }
    let change = update.metadata_field_changes.first()?;
    if change.field_name != metadata_fields::GROUP_NAME {
        return None;
    }
    Some(narrator.rename(change.new_value.as_deref().unwrap_or_default(), admin))
}

/// Narrate a group-state change into the conversation.
pub async fn on_group_update<C: Command>(
    ctx: &MessageContext<C>,
    update: &GroupUpdated,
    narrator: &Narrator,
) -> Result<()> {
    match describe_update(ctx, update, narrator) {
        Some(text) if !text.is_empty() => {
            ctx.reply(&text).await?;
        },
        _ => {
            info!(
                conversation_id = %ctx.message().conversation_id,
                "group update needs no announcement"
            );
        },
    }
    Ok(())
}

pub async fn rename<C: Command>(
    ctx: &MessageContext<C>,
    name: &str,
    narrator: &Narrator,
) -> Result<()> {
    match ctx.conversation().update_name(name).await {
        Ok(()) => {
            ctx.reply(&narrator.rename(name, BOT_ALIAS)).await?;
        },
        Err(error) => {
            warn!(%error, name, "failed to rename group");
            ctx.reply(RENAME_FAILED_REPLY).await?;
        },
    }
    Ok(())
}

pub async fn add<C: Command>(
    ctx: &MessageContext<C>,
    users: &[RosterMember],
    narrator: &Narrator,
) -> Result<()> {
    let conversation = ctx.conversation();
    let inbox_ids: Vec<String> = users.iter().map(|u| ids::normalize(&u.inbox_id)).collect();
    let result = async {
        conversation.sync().await?;
        conversation.add_members(&inbox_ids).await?;
        conversation.sync().await
    }
    .await;

    match result {
        Ok(()) => {
            let names: Vec<String> = users.iter().map(RosterMember::mention).collect();
            if let Some(text) = narrator.welcome(&names, BOT_ALIAS) {
                ctx.reply(&text).await?;
            }
        },
        Err(error) => {
            warn!(%error, ?inbox_ids, "failed to add members");
            ctx.reply(ADD_FAILED_REPLY).await?;
        },
    }
    Ok(())
}

/// Account addresses of `users`; removal works on addresses, not inbox ids.
fn account_addresses(users: &[RosterMember]) -> Result<Vec<String>> {
    users
        .iter()
        .map(|user| {
            Some(&user.identifier)
                .filter(|id| ids::is_address(id))
                .cloned()
                .with_context(|| format!("{} has no account address", user.mention()))
        })
        .collect()
}

pub async fn remove<C: Command>(
    ctx: &MessageContext<C>,
    users: &[RosterMember],
    narrator: &Narrator,
) -> Result<()> {
    let conversation = ctx.conversation();
    let result = async {
        let addresses = account_addresses(users)?;
        conversation.sync().await?;
        conversation.remove_members(&addresses).await?;
        Ok::<_, Error>(())
    }
    .await;

    match result {
        Ok(()) => {
            ctx.reply(&narrator.farewell(BOT_ALIAS)).await?;
        },
        Err(error) => {
            let users: Vec<String> = users.iter().map(RosterMember::mention).collect();
            warn!(%error, ?users, "failed to remove members");
            ctx.reply(REMOVE_FAILED_REPLY).await?;
        },
    }
    Ok(())
}

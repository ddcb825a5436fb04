//! Roster resolution.
//!
//! Turns the live participant list of a conversation into [`RosterMember`]s
//! with lowercased identifiers and human-friendly aliases. The sender is
//! aliased `me`, the bot client `bot`; everyone else is named by the injected
//! [`RosterProvider`], their protocol username, or their address.

use {
    msgkit_common::ids,
    msgkit_protocol::Member,
    serde::{Deserialize, Serialize},
    tracing::trace,
};

pub const SENDER_ALIAS: &str = "me";
pub const BOT_ALIAS: &str = "bot";

/// A normalized conversation participant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RosterMember {
    /// Lowercased account address, or inbox id for address-less members.
    pub identifier: String,
    pub inbox_id: String,
    pub alias: String,
    /// The sender of the message being processed.
    pub is_self: bool,
    /// The bot's own client.
    pub is_bot: bool,
    /// Injected by a [`RosterProvider`] rather than present in the conversation.
    pub is_fixture: bool,
}

impl RosterMember {
    pub fn new(identifier: &str, inbox_id: &str, alias: &str) -> Self {
        Self {
            identifier: ids::normalize(identifier),
            inbox_id: ids::normalize(inbox_id),
            alias: ids::normalize(alias),
            is_self: false,
            is_bot: false,
            is_fixture: false,
        }
    }

    /// Stand-in for a sender that is not in the roster.
    pub fn unresolved(sender_id: &str) -> Self {
        Self::new(sender_id, sender_id, sender_id)
    }

    /// `@alias`.
    pub fn mention(&self) -> String {
        format!("{}{}", ids::MENTION_SIGIL, self.alias)
    }

    fn matches_id(&self, id: &str) -> bool {
        !id.is_empty() && (ids::same(&self.identifier, id) || ids::same(&self.inbox_id, id))
    }
}

/// Strategy for naming members the conversation itself does not name.
///
/// Production uses [`NoFixtures`]; offline demos use [`FixtureRoster`].
pub trait RosterProvider: Send + Sync {
    /// Alias for a member identified by its normalized identifier.
    fn alias_for(&self, identifier: &str) -> Option<String>;

    /// Extra members appended when absent from the conversation.
    fn supplemental(&self) -> Vec<RosterMember> {
        Vec::new()
    }
}

/// No fixture fallback.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoFixtures;

impl RosterProvider for NoFixtures {
    fn alias_for(&self, _identifier: &str) -> Option<String> {
        None
    }
}

/// A known identity used for offline testing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fixture {
    pub alias: String,
    pub address: String,
    pub inbox_id: String,
}

/// Fixed table of well-known test identities.
#[derive(Debug, Clone, Default)]
pub struct FixtureRoster {
    fixtures: Vec<Fixture>,
}

impl FixtureRoster {
    pub fn new(fixtures: Vec<Fixture>) -> Self {
        Self { fixtures }
    }

    /// The stock demo identities.
    pub fn demo() -> Self {
        let fixture = |alias: &str, address: &str, inbox_id: &str| Fixture {
            alias: alias.into(),
            address: address.into(),
            inbox_id: inbox_id.into(),
        };
        Self::new(vec![
            fixture(
                "alix",
                "0x3a044b218BaE80E5b9E16609443A192129A67BeA",
                "da3750159ea7541dda1e271076a3663d8c14576ab85bbd3416d45c9f19e35cbc",
            ),
            fixture(
                "eva",
                "0xeAc10D864802fCcfe897E3957776634D1AE006B2",
                "6196afe3fd16c276113b0e4fc913745c39af337ea869fb49a2835201874de49c",
            ),
            fixture(
                "bo",
                "0xbc3246461ab5e1682baE48fa95172CDf0689201a",
                "8d833f5419cbbfda027813e1fcd1db86c9ec320fd22fbe182883c47a7f34adc0",
            ),
        ])
    }

    pub fn fixtures(&self) -> &[Fixture] {
        &self.fixtures
    }
}

impl RosterProvider for FixtureRoster {
    fn alias_for(&self, identifier: &str) -> Option<String> {
        self.fixtures
            .iter()
            .find(|f| ids::same(&f.address, identifier) || ids::same(&f.inbox_id, identifier))
            .map(|f| ids::normalize(&f.alias))
    }

    fn supplemental(&self) -> Vec<RosterMember> {
        self.fixtures
            .iter()
            .map(|f| RosterMember {
                is_fixture: true,
                ..RosterMember::new(&f.address, &f.inbox_id, &f.alias)
            })
            .collect()
    }
}

/// Whose eyes the roster is resolved through.
#[derive(Debug, Clone, Copy)]
pub struct Perspective<'a> {
    pub client_address: &'a str,
    pub client_inbox_id: &'a str,
    /// Inbox id or legacy address of the message sender.
    pub sender_id: &'a str,
}

/// Resolved participants of one conversation, for one message.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Roster {
    members: Vec<RosterMember>,
}

impl Roster {
    /// Build from already-resolved members, keeping the first occurrence of
    /// each identifier.
    pub fn from_members(members: impl IntoIterator<Item = RosterMember>) -> Self {
        let mut roster = Self::default();
        for member in members {
            roster.push_unique(member);
        }
        roster
    }

    /// Append `member` unless its identifier or inbox id is already taken.
    ///
    /// A kept member known only by inbox id adopts the duplicate's address.
    fn push_unique(&mut self, member: RosterMember) -> bool {
        let Some(index) = self.members.iter().position(|m| {
            m.identifier == member.identifier
                || (!member.inbox_id.is_empty() && m.inbox_id == member.inbox_id)
        }) else {
            self.members.push(member);
            return true;
        };

        let adopts_address = self.members[index].identifier == self.members[index].inbox_id
            && member.identifier != member.inbox_id
            && self.members.iter().all(|m| m.identifier != member.identifier);
        if adopts_address {
            self.members[index].identifier = member.identifier;
        }
        false
    }

    pub fn members(&self) -> &[RosterMember] {
        &self.members
    }

    pub fn iter(&self) -> impl Iterator<Item = &RosterMember> {
        self.members.iter()
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Resolve `@handle` (or a bare handle, address, or inbox id).
    ///
    /// Aliases take precedence over identifiers.
    pub fn find_by_mention(&self, token: &str) -> Option<&RosterMember> {
        let handle = ids::mention_handle(token).unwrap_or_else(|| ids::normalize(token));
        if handle.is_empty() {
            return None;
        }
        self.members
            .iter()
            .find(|m| m.alias == handle)
            .or_else(|| self.members.iter().find(|m| m.matches_id(&handle)))
    }

    pub fn find_by_inbox_id(&self, inbox_id: &str) -> Option<&RosterMember> {
        self.members
            .iter()
            .find(|m| ids::same(&m.inbox_id, inbox_id))
    }

    /// Look up by identifier or inbox id.
    pub fn find(&self, id: &str) -> Option<&RosterMember> {
        self.members.iter().find(|m| m.matches_id(id))
    }

    /// The member marked as the sender.
    pub fn sender(&self) -> Option<&RosterMember> {
        self.members.iter().find(|m| m.is_self)
    }

    pub fn bot(&self) -> Option<&RosterMember> {
        self.members.iter().find(|m| m.is_bot)
    }
}

/// Normalize `raw` into a [`Roster`] as seen from `perspective`.
///
/// Never mutates its input; the result has no duplicate identifiers.
pub fn resolve(
    raw: &[Member],
    perspective: Perspective<'_>,
    provider: &dyn RosterProvider,
) -> Roster {
    let mut roster = Roster::default();
    let mut sender_assigned = false;

    for member in raw {
        let inbox_id = ids::normalize(&member.inbox_id);
        let identifier = member
            .primary_address()
            .map(ids::normalize)
            .filter(|a| !a.is_empty())
            .unwrap_or_else(|| inbox_id.clone());
        if identifier.is_empty() {
            continue;
        }

        let mut resolved = RosterMember::new(&identifier, &inbox_id, &identifier);
        let is_sender = !sender_assigned && resolved.matches_id(perspective.sender_id);
        let is_client = resolved.matches_id(perspective.client_address)
            || resolved.matches_id(perspective.client_inbox_id);

        if is_sender {
            resolved.alias = SENDER_ALIAS.into();
            resolved.is_self = true;
        } else if is_client {
            resolved.alias = BOT_ALIAS.into();
            resolved.is_bot = true;
        } else if let Some(alias) = provider.alias_for(&identifier) {
            resolved.alias = alias;
        } else if let Some(username) = member.username.as_deref().filter(|u| !u.trim().is_empty())
        {
            resolved.alias = ids::normalize(username);
        }

        if roster.push_unique(resolved) && is_sender {
            sender_assigned = true;
        }
    }

    for fixture in provider.supplemental() {
        roster.push_unique(fixture);
    }

    trace!(members = roster.len(), "resolved roster");
    roster
}

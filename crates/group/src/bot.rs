use std::sync::Arc;

use {
    async_trait::async_trait,
    msgkit_dispatch::{Content, Handler, MessageContext, Result},
    msgkit_providers::TextGenerator,
    tracing::debug,
};

use crate::{Agent, GroupCommand, Narrator, admin};

/// The group bot's [`Handler`].
pub struct GroupBot {
    agent: Agent,
    narrator: Narrator,
    respond_to_plaintext: bool,
}

impl GroupBot {
    pub fn new(generator: Option<Arc<dyn TextGenerator>>) -> Self {
        Self {
            agent: Agent::new(generator),
            narrator: Narrator::default(),
            respond_to_plaintext: true,
        }
    }

    #[must_use]
    pub fn with_narrator(mut self, narrator: Narrator) -> Self {
        self.narrator = narrator;
        self
    }

    /// Whether free text (not only `/agent`) goes to the model.
    #[must_use]
    pub fn with_plaintext_replies(mut self, enabled: bool) -> Self {
        self.respond_to_plaintext = enabled;
        self
    }

    #[must_use]
    pub fn with_log_prompts(mut self, enabled: bool) -> Self {
        self.agent = self.agent.with_log_prompts(enabled);
        self
    }
}

#[async_trait]
impl Handler<GroupCommand> for GroupBot {
    async fn command(&self, command: GroupCommand, ctx: &MessageContext<GroupCommand>) -> Result<()> {
        let Some(intent) = ctx.message().content.intent() else {
            return Ok(());
        };
        match command {
            GroupCommand::Name => {
                admin::rename(ctx, intent.text("name").unwrap_or_default(), &self.narrator).await
            },
            GroupCommand::Add => admin::add(ctx, intent.users("users"), &self.narrator).await,
            GroupCommand::Remove => {
                admin::remove(ctx, intent.users("users"), &self.narrator).await
            },
            GroupCommand::Agent => {
                self.agent
                    .respond(ctx, intent.text("prompt").unwrap_or_default())
                    .await
            },
            GroupCommand::Help => {
                ctx.reply(&ctx.registry().help_text()).await?;
                Ok(())
            },
        }
    }

    async fn agent(&self, ctx: &MessageContext<GroupCommand>) -> Result<()> {
        if !self.respond_to_plaintext {
            debug!(message_id = %ctx.message().id, "plaintext replies disabled");
            return Ok(());
        }
        let prompt = ctx
            .message()
            .content
            .intent()
            .map(|intent| intent.raw_text())
            .unwrap_or_default();
        self.agent.respond(ctx, prompt).await
    }

    async fn group_update(&self, ctx: &MessageContext<GroupCommand>) -> Result<()> {
        if let Content::GroupUpdated(update) = &ctx.message().content {
            admin::on_group_update(ctx, update, &self.narrator).await?;
        }
        Ok(())
    }
}

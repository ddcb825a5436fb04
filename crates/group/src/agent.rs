//! Free-text assistant backed by a [`TextGenerator`].

use std::sync::Arc;

use {
    msgkit_commands::{CommandRegistry, Roster, RosterMember},
    msgkit_dispatch::{Command, IntentOptions, MessageContext, Result, error::Context as _},
    msgkit_providers::TextGenerator,
    serde_json::json,
    tracing::{debug, error, info, warn},
};

pub const MISSING_KEY_REPLY: &str =
    "No OpenAI API key found. Set OPENAI_API_KEY to talk to the agent.";
pub const AGENT_ERROR_REPLY: &str = "An error occurred while processing your request.";

/// A model answer that is a single slash command, to be dispatched rather
/// than posted.
pub fn is_command_reply(reply: &str) -> bool {
    reply
        .strip_prefix('/')
        .is_some_and(|rest| !rest.is_empty() && !rest.contains('/'))
}

/// Instructions sent with every prompt: who is in the group, what commands
/// exist, and who is asking.
pub fn system_prompt(
    roster: &Roster,
    registry: &CommandRegistry,
    sender: &RosterMember,
) -> Result<String> {
    let members: Vec<serde_json::Value> = roster
        .iter()
        .map(|m| {
            json!({
                "username": m.mention(),
                "address": m.identifier,
                "inboxId": m.inbox_id,
            })
        })
        .collect();
    let members = serde_json::Value::Array(members);
    let commands = registry
        .to_json()
        .context("serializing commands for the agent prompt")?;

    Ok(format!(
        "You are a helpful agent that lives inside a web3 messaging group.\n\
         These are the users of the group: {members}\n\
         This group app has these commands available: {commands}\n\
         If a user asks for jokes, make jokes about web3 devs.\n\
         If the user asks about performing an action and a command would help, \
         answer with the command and nothing else. Fill in real or random values, \
         never placeholders.\n\
         If the request does not map to a command, answer helpfully or ask a \
         clarifying question.\n\
         The message was sent by {sender}.\n\
         Every time you are thanked, ask for a tip.",
        sender = sender.mention(),
    ))
}

pub struct Agent {
    generator: Option<Arc<dyn TextGenerator>>,
    log_prompts: bool,
}

impl Agent {
    pub fn new(generator: Option<Arc<dyn TextGenerator>>) -> Self {
        Self {
            generator,
            log_prompts: false,
        }
    }

    #[must_use]
    pub fn with_log_prompts(mut self, enabled: bool) -> Self {
        self.log_prompts = enabled;
        self
    }

    /// Answer `prompt` in the conversation, re-dispatching command answers.
    pub async fn respond<C: Command>(&self, ctx: &MessageContext<C>, prompt: &str) -> Result<()> {
        let Some(generator) = &self.generator else {
            debug!("agent has no generator configured");
            ctx.reply(MISSING_KEY_REPLY).await?;
            return Ok(());
        };

        let prompt = prompt.trim();
        let system = system_prompt(ctx.roster(), ctx.registry(), ctx.sender())?;
        if self.log_prompts {
            info!(prompt, sender = %ctx.sender().alias, "agent prompt");
        }

        match generator.generate(prompt, &system).await {
            Ok(generation) => {
                let reply = generation.reply.trim();
                if is_command_reply(reply) {
                    if self.log_prompts {
                        info!(reply, "agent answered with a command");
                    }
                    ctx.intent(reply, IntentOptions::default()).await?;
                } else {
                    ctx.reply(reply).await?;
                }
            },
            Err(e) if e.is_missing_credential() => {
                warn!(model = generator.model(), "agent credential missing");
                ctx.reply(MISSING_KEY_REPLY).await?;
            },
            Err(e) => {
                error!(model = generator.model(), error = %e, "text generation failed");
                ctx.reply(AGENT_ERROR_REPLY).await?;
            },
        }
        Ok(())
    }
}

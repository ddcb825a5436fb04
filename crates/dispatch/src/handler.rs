use async_trait::async_trait;

use crate::{MessageContext, Result};

/// An application's command set.
///
/// Implemented by an enum with one variant per registered trigger, so
/// handlers `match` exhaustively instead of comparing strings. Triggers
/// registered in the schema but unknown to the enum return `None` and get
/// the unknown-command reply.
pub trait Command: Send + Sync + Sized + 'static {
    /// Map a lowercased trigger (with its `/`) to a command.
    fn from_trigger(trigger: &str) -> Option<Self>;
}

/// Bot behavior, one method per routing outcome.
#[async_trait]
pub trait Handler<C: Command>: Send + Sync {
    /// A parsed slash command.
    async fn command(&self, command: C, ctx: &MessageContext<C>) -> Result<()>;

    /// Free text that is not a command.
    async fn agent(&self, ctx: &MessageContext<C>) -> Result<()>;

    /// Membership or metadata change of the conversation.
    async fn group_update(&self, _ctx: &MessageContext<C>) -> Result<()> {
        Ok(())
    }

    /// Replies, reactions, attachments and unknown content. Ignored by default.
    async fn content(&self, _ctx: &MessageContext<C>) -> Result<()> {
        Ok(())
    }
}

use std::sync::Arc;

use {
    async_trait::async_trait,
    msgkit_protocol::{Attachment, DecodedMessage, Member, OutboundContent, RemoteAttachment},
};

use crate::Result;

/// Client-wide operations of the underlying messaging client.
#[async_trait]
pub trait TransportClient: Send + Sync {
    /// Account address the bot signs in with.
    fn account_address(&self) -> &str;

    /// Inbox id of the bot.
    fn inbox_id(&self) -> &str;

    /// Open (or reuse) a direct conversation with `address`.
    async fn new_conversation(&self, address: &str) -> Result<Arc<dyn Conversation>>;

    /// Download and decrypt a remote attachment.
    async fn load_attachment(&self, remote: &RemoteAttachment) -> Result<Attachment>;

    /// Look up a previously received message. `None` by default.
    async fn message_by_id(&self, _id: &str) -> Result<Option<DecodedMessage>> {
        Ok(None)
    }
}

/// One chat (DM or group) on the underlying client.
#[async_trait]
pub trait Conversation: Send + Sync {
    fn id(&self) -> &str;

    /// Current participants, as reported by the client.
    async fn members(&self) -> Result<Vec<Member>>;

    /// Send content; returns the id of the sent message.
    async fn send(&self, content: OutboundContent) -> Result<String>;

    /// Pull the latest group state. No-op by default.
    async fn sync(&self) -> Result<()> {
        Ok(())
    }

    /// Rename the group. Needs admin rights.
    async fn update_name(&self, name: &str) -> Result<()>;

    /// Add members by inbox id. Needs admin rights.
    async fn add_members(&self, inbox_ids: &[String]) -> Result<()>;

    /// Remove members by account address. Needs admin rights.
    async fn remove_members(&self, addresses: &[String]) -> Result<()>;
}

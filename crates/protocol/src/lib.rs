//! Wire types of the messaging protocol as seen by the bot layer.
//!
//! A decoded message carries a declared [`ContentTypeId`] and an opaque JSON
//! payload. The payload shapes for the content types the framework
//! understands are defined here; turning one into the other happens in the
//! dispatcher's classifier.

use {
    chrono::{DateTime, Utc},
    serde::{Deserialize, Serialize},
};

// ── Constants ────────────────────────────────────────────────────────────────

pub const XMTP_AUTHORITY: &str = "xmtp.org";

pub mod type_ids {
    pub const TEXT: &str = "text";
    pub const REPLY: &str = "reply";
    pub const REACTION: &str = "reaction";
    pub const ATTACHMENT: &str = "attachment";
    pub const REMOTE_ATTACHMENT: &str = "remoteStaticAttachment";
    pub const GROUP_UPDATED: &str = "group_updated";
}

/// Metadata field names carried in [`MetadataFieldChange::field_name`].
pub mod metadata_fields {
    pub const GROUP_NAME: &str = "group_name";
    pub const DESCRIPTION: &str = "description";
    pub const IMAGE_URL: &str = "group_image_url_square";
}

// ── Content types ────────────────────────────────────────────────────────────

/// Declared content type of a message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentTypeId {
    pub authority_id: String,
    pub type_id: String,
    pub version_major: u32,
    pub version_minor: u32,
}

impl ContentTypeId {
    pub fn new(type_id: impl Into<String>, version_major: u32) -> Self {
        Self {
            authority_id: XMTP_AUTHORITY.into(),
            type_id: type_id.into(),
            version_major,
            version_minor: 0,
        }
    }

    pub fn text() -> Self {
        Self::new(type_ids::TEXT, 1)
    }

    pub fn reply() -> Self {
        Self::new(type_ids::REPLY, 1)
    }

    pub fn reaction() -> Self {
        Self::new(type_ids::REACTION, 1)
    }

    pub fn attachment() -> Self {
        Self::new(type_ids::ATTACHMENT, 1)
    }

    pub fn remote_attachment() -> Self {
        Self::new(type_ids::REMOTE_ATTACHMENT, 1)
    }

    pub fn group_updated() -> Self {
        Self::new(type_ids::GROUP_UPDATED, 1)
    }

    /// Same authority and type id; versions are ignored.
    pub fn same_as(&self, other: &ContentTypeId) -> bool {
        self.authority_id == other.authority_id && self.type_id == other.type_id
    }
}

impl std::fmt::Display for ContentTypeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}/{}:{}.{}",
            self.authority_id, self.type_id, self.version_major, self.version_minor
        )
    }
}

// ── Messages and members ─────────────────────────────────────────────────────

/// An inbound message after protocol decoding.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DecodedMessage {
    pub id: String,
    pub conversation_id: String,
    pub sender_inbox_id: String,
    /// Only populated by legacy (address-based) conversations.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sender_address: Option<String>,
    pub content_type: ContentTypeId,
    /// Codec output; its shape depends on `content_type`.
    pub content: serde_json::Value,
    pub sent_at: DateTime<Utc>,
}

impl DecodedMessage {
    /// Identifier to resolve the sender by: the legacy address if present,
    /// otherwise the inbox id.
    pub fn sender_id(&self) -> &str {
        self.sender_address
            .as_deref()
            .unwrap_or(&self.sender_inbox_id)
    }

    /// Build a text message, mostly useful for local transports and tests.
    pub fn text(
        id: impl Into<String>,
        conversation_id: impl Into<String>,
        sender_inbox_id: impl Into<String>,
        text: &str,
    ) -> Self {
        Self {
            id: id.into(),
            conversation_id: conversation_id.into(),
            sender_inbox_id: sender_inbox_id.into(),
            sender_address: None,
            content_type: ContentTypeId::text(),
            content: serde_json::Value::String(text.to_string()),
            sent_at: Utc::now(),
        }
    }
}

/// A conversation participant as reported by the protocol client.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Member {
    pub inbox_id: String,
    #[serde(default)]
    pub account_addresses: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
}

impl Member {
    pub fn new(inbox_id: impl Into<String>, address: impl Into<String>) -> Self {
        Self {
            inbox_id: inbox_id.into(),
            account_addresses: vec![address.into()],
            username: None,
        }
    }

    pub fn with_username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    pub fn primary_address(&self) -> Option<&str> {
        self.account_addresses.first().map(String::as_str)
    }
}

// ── Payloads ─────────────────────────────────────────────────────────────────

/// Threaded reply to an earlier message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reply {
    /// Id of the message being replied to.
    pub reference: String,
    pub content_type: ContentTypeId,
    pub content: serde_json::Value,
}

impl Reply {
    pub fn text(reference: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            reference: reference.into(),
            content_type: ContentTypeId::text(),
            content: serde_json::Value::String(text.into()),
        }
    }

    /// The reply body when it is plain text.
    pub fn text_body(&self) -> Option<&str> {
        if self.content_type.type_id == type_ids::TEXT {
            self.content.as_str()
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReactionAction {
    #[default]
    Added,
    Removed,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReactionSchema {
    #[default]
    Unicode,
    Shortcode,
    Custom,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reaction {
    pub reference: String,
    pub action: ReactionAction,
    pub schema: ReactionSchema,
    pub content: String,
}

impl Reaction {
    /// A unicode emoji added to `reference`.
    pub fn unicode(reference: impl Into<String>, emoji: impl Into<String>) -> Self {
        Self {
            reference: reference.into(),
            action: ReactionAction::Added,
            schema: ReactionSchema::Unicode,
            content: emoji.into(),
        }
    }
}

/// Pointer to an encrypted attachment stored off-network.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteAttachment {
    pub url: String,
    pub content_digest: String,
    pub scheme: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_length: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
    /// Hex-encoded key material; never logged.
    #[serde(default)]
    pub secret: String,
    #[serde(default)]
    pub salt: String,
    #[serde(default)]
    pub nonce: String,
}

/// A downloaded and decrypted attachment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attachment {
    pub filename: String,
    pub mime_type: String,
    pub data: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InboxRef {
    pub inbox_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetadataFieldChange {
    pub field_name: String,
    #[serde(default)]
    pub old_value: Option<String>,
    #[serde(default)]
    pub new_value: Option<String>,
}

/// Group-state change descriptor (membership or metadata).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GroupUpdated {
    pub initiated_by_inbox_id: String,
    pub added_inboxes: Vec<InboxRef>,
    pub removed_inboxes: Vec<InboxRef>,
    pub metadata_field_changes: Vec<MetadataFieldChange>,
}

// ── Outbound ─────────────────────────────────────────────────────────────────

/// Content the bot sends into a conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum OutboundContent {
    Text { text: String },
    Reply(Reply),
    Reaction(Reaction),
}

impl OutboundContent {
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text { text: text.into() }
    }

    pub fn content_type(&self) -> ContentTypeId {
        match self {
            Self::Text { .. } => ContentTypeId::text(),
            Self::Reply(_) => ContentTypeId::reply(),
            Self::Reaction(_) => ContentTypeId::reaction(),
        }
    }

    /// Human-readable body, used by local transports for display.
    pub fn display_text(&self) -> String {
        match self {
            Self::Text { text } => text.clone(),
            Self::Reply(reply) => reply
                .text_body()
                .map(str::to_string)
                .unwrap_or_else(|| reply.content.to_string()),
            Self::Reaction(reaction) => reaction.content.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use {super::*, serde_json::json};

    #[test]
    fn group_updated_from_codec_json() {
        let update: GroupUpdated = serde_json::from_value(json!({
            "initiatedByInboxId": "abc",
            "addedInboxes": [],
            "removedInboxes": [],
            "metadataFieldChanges": [
                { "fieldName": "group_name", "oldValue": "old", "newValue": "new" }
            ]
        }))
        .unwrap();
        assert_eq!(update.initiated_by_inbox_id, "abc");
        assert_eq!(
            update.metadata_field_changes[0].field_name,
            metadata_fields::GROUP_NAME
        );
        assert_eq!(
            update.metadata_field_changes[0].new_value.as_deref(),
            Some("new")
        );
    }

    #[test]
    fn content_type_same_as_ignores_version() {
        let mut v2 = ContentTypeId::text();
        v2.version_major = 2;
        assert!(ContentTypeId::text().same_as(&v2));
        assert!(!ContentTypeId::text().same_as(&ContentTypeId::reply()));
        assert_eq!(ContentTypeId::reply().to_string(), "xmtp.org/reply:1.0");
    }

    #[test]
    fn reaction_serializes_lowercase() {
        let value = serde_json::to_value(Reaction::unicode("m1", "👍")).unwrap();
        assert_eq!(value["action"], "added");
        assert_eq!(value["schema"], "unicode");
        assert_eq!(value["reference"], "m1");
    }

    #[test]
    fn sender_id_prefers_legacy_address() {
        let mut msg = DecodedMessage::text("m1", "c1", "inbox", "hi");
        assert_eq!(msg.sender_id(), "inbox");
        msg.sender_address = Some("0xabc".into());
        assert_eq!(msg.sender_id(), "0xabc");
    }
}

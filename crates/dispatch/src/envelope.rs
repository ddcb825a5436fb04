use {
    chrono::{DateTime, Utc},
    msgkit_commands::{ParsedIntent, RosterMember},
    msgkit_protocol::{Attachment, GroupUpdated, Reaction, Reply},
    serde::Serialize,
};

/// Outcome of resolving an attachment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum AttachmentContent {
    Loaded(Attachment),
    /// The transport could not fetch or decrypt the attachment.
    Failed { url: String, reason: String },
}

/// Typed payload of an inbound message.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "payload", rename_all = "snake_case")]
pub enum Content {
    Text(ParsedIntent),
    Reply(Reply),
    Reaction(Reaction),
    Attachment(AttachmentContent),
    GroupUpdated(GroupUpdated),
    Unknown {
        type_id: String,
        raw: serde_json::Value,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentKind {
    Text,
    Reply,
    Reaction,
    Attachment,
    GroupUpdated,
    Unknown,
}

impl ContentKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Reply => "reply",
            Self::Reaction => "reaction",
            Self::Attachment => "attachment",
            Self::GroupUpdated => "group_updated",
            Self::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for ContentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Content {
    pub fn kind(&self) -> ContentKind {
        match self {
            Self::Text(_) => ContentKind::Text,
            Self::Reply(_) => ContentKind::Reply,
            Self::Reaction(_) => ContentKind::Reaction,
            Self::Attachment(_) => ContentKind::Attachment,
            Self::GroupUpdated(_) => ContentKind::GroupUpdated,
            Self::Unknown { .. } => ContentKind::Unknown,
        }
    }

    pub fn intent(&self) -> Option<&ParsedIntent> {
        match self {
            Self::Text(intent) => Some(intent),
            _ => None,
        }
    }
}

/// A classified inbound message as handlers see it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MessageEnvelope {
    pub id: String,
    pub conversation_id: String,
    /// Resolved sender, or a synthetic member when the sender is not on the roster.
    pub sender: RosterMember,
    pub content: Content,
    pub sent_at: DateTime<Utc>,
}

impl MessageEnvelope {
    /// Same message identity and sender, different content.
    pub fn with_content(&self, content: Content) -> Self {
        Self {
            id: self.id.clone(),
            conversation_id: self.conversation_id.clone(),
            sender: self.sender.clone(),
            content,
            sent_at: self.sent_at,
        }
    }

    pub fn kind(&self) -> ContentKind {
        self.content.kind()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derived_envelope_keeps_identity() {
        let envelope = MessageEnvelope {
            id: "m1".into(),
            conversation_id: "c1".into(),
            sender: RosterMember::unresolved("0xabc"),
            content: Content::Text(ParsedIntent::plaintext("hi")),
            sent_at: Utc::now(),
        };
        let derived = envelope.with_content(Content::Reaction(Reaction::unicode("m1", "👍")));
        assert_eq!(derived.id, envelope.id);
        assert_eq!(derived.sender, envelope.sender);
        assert_eq!(derived.kind(), ContentKind::Reaction);
        assert!(derived.content.intent().is_none());
    }
}

//! Content classification: declared content type → typed [`Content`].

use {
    msgkit_channels::TransportClient,
    msgkit_commands::{CommandRegistry, Roster, parse},
    msgkit_protocol::{
        Attachment, DecodedMessage, GroupUpdated, Reaction, RemoteAttachment, Reply,
        XMTP_AUTHORITY, type_ids,
    },
    serde::de::DeserializeOwned,
    tracing::{debug, warn},
};

use crate::{AttachmentContent, Content, Error, Result};

/// Classify `message` into a typed payload.
///
/// Text runs through the intent parser. Remote attachments are fetched
/// through `client`; a failed fetch is reported as
/// [`AttachmentContent::Failed`] instead of an error.
///
/// # Errors
///
/// [`Error::Decode`] when a known content type carries a malformed payload.
pub async fn classify(
    message: &DecodedMessage,
    registry: &CommandRegistry,
    roster: &Roster,
    client: &dyn TransportClient,
) -> Result<Content> {
    let content_type = &message.content_type;
    if content_type.authority_id != XMTP_AUTHORITY {
        return Ok(unknown(message));
    }

    let content = match content_type.type_id.as_str() {
        type_ids::TEXT => {
            let text: String = decode(message)?;
            Content::Text(parse(&text, registry, roster))
        },
        type_ids::REPLY => Content::Reply(decode::<Reply>(message)?),
        type_ids::REACTION => Content::Reaction(decode::<Reaction>(message)?),
        type_ids::ATTACHMENT => {
            Content::Attachment(AttachmentContent::Loaded(decode::<Attachment>(message)?))
        },
        type_ids::REMOTE_ATTACHMENT => {
            let remote: RemoteAttachment = decode(message)?;
            Content::Attachment(load_remote(&remote, client).await)
        },
        type_ids::GROUP_UPDATED => Content::GroupUpdated(decode::<GroupUpdated>(message)?),
        _ => unknown(message),
    };

    debug!(
        message_id = %message.id,
        kind = %content.kind(),
        "classified message"
    );
    Ok(content)
}

fn decode<T: DeserializeOwned>(message: &DecodedMessage) -> Result<T> {
    serde_json::from_value(message.content.clone()).map_err(|source| Error::Decode {
        content_type: message.content_type.to_string(),
        source,
    })
}

fn unknown(message: &DecodedMessage) -> Content {
    Content::Unknown {
        type_id: message.content_type.to_string(),
        raw: message.content.clone(),
    }
}

async fn load_remote(remote: &RemoteAttachment, client: &dyn TransportClient) -> AttachmentContent {
    match client.load_attachment(remote).await {
        Ok(attachment) => AttachmentContent::Loaded(attachment),
        Err(error) => {
            warn!(url = %remote.url, %error, "failed to load remote attachment");
            AttachmentContent::Failed {
                url: remote.url.clone(),
                reason: error.to_string(),
            }
        },
    }
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        chrono::Utc,
        msgkit_channels::MemoryTransport,
        msgkit_commands::{CommandGroup, CommandSchema, IntentKind, ParamSpec},
        msgkit_protocol::{ContentTypeId, ReactionAction},
        serde_json::json,
    };

    fn registry() -> CommandRegistry {
        CommandRegistry::new(vec![CommandGroup::new("Test", "", vec![
            CommandSchema::new("/echo", "Echo").param(ParamSpec::text("text")),
        ])])
        .unwrap()
    }

    fn message(content_type: ContentTypeId, content: serde_json::Value) -> DecodedMessage {
        DecodedMessage {
            id: "m1".into(),
            conversation_id: "c1".into(),
            sender_inbox_id: "sender".into(),
            sender_address: None,
            content_type,
            content,
            sent_at: Utc::now(),
        }
    }

    fn remote(url: &str) -> serde_json::Value {
        json!({
            "url": url,
            "contentDigest": "abc",
            "scheme": "https://",
            "filename": "cat.png",
        })
    }

    async fn run(message: DecodedMessage, transport: &MemoryTransport) -> Result<Content> {
        classify(&message, &registry(), &Roster::default(), transport).await
    }

    #[tokio::test]
    async fn text_is_parsed_into_an_intent() {
        let transport = MemoryTransport::new("0xb07", "bot");
        let content = run(message(ContentTypeId::text(), json!("/echo hi")), &transport)
            .await
            .unwrap();
        let intent = content.intent().unwrap();
        assert_eq!(intent.kind(), IntentKind::Command);
        assert_eq!(intent.text("text"), Some("hi"));
    }

    #[tokio::test]
    async fn reaction_and_reply_are_typed() {
        let transport = MemoryTransport::new("0xb07", "bot");
        let reaction = json!({
            "reference": "m0",
            "action": "removed",
            "schema": "unicode",
            "content": "👍",
        });
        let Content::Reaction(reaction) =
            run(message(ContentTypeId::reaction(), reaction), &transport)
                .await
                .unwrap()
        else {
            panic!("expected a reaction");
        };
        assert_eq!(reaction.action, ReactionAction::Removed);

        let reply = serde_json::to_value(Reply::text("m0", "sure")).unwrap();
        let Content::Reply(reply) = run(message(ContentTypeId::reply(), reply), &transport)
            .await
            .unwrap()
        else {
            panic!("expected a reply");
        };
        assert_eq!(reply.reference, "m0");
        assert_eq!(reply.text_body(), Some("sure"));
    }

    #[tokio::test]
    async fn failed_attachment_does_not_abort() {
        let transport = MemoryTransport::new("0xb07", "bot");
        let content = run(
            message(
                ContentTypeId::remote_attachment(),
                remote("https://cdn.example/missing"),
            ),
            &transport,
        )
        .await
        .unwrap();
        assert!(matches!(
            content,
            Content::Attachment(AttachmentContent::Failed { ref url, .. })
                if url == "https://cdn.example/missing"
        ));
    }

    #[tokio::test]
    async fn remote_attachment_is_loaded() {
        let transport = MemoryTransport::new("0xb07", "bot");
        transport.insert_attachment("https://cdn.example/cat", Attachment {
            filename: "cat.png".into(),
            mime_type: "image/png".into(),
            data: vec![1, 2, 3],
        });
        let content = run(
            message(
                ContentTypeId::remote_attachment(),
                remote("https://cdn.example/cat"),
            ),
            &transport,
        )
        .await
        .unwrap();
        let Content::Attachment(AttachmentContent::Loaded(attachment)) = content else {
            panic!("expected a loaded attachment");
        };
        assert_eq!(attachment.data, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn group_update_passes_through() {
        let transport = MemoryTransport::new("0xb07", "bot");
        let update = json!({
            "initiatedByInboxId": "admin",
            "metadataFieldChanges": [
                {"fieldName": "group_name", "oldValue": "a", "newValue": "b"}
            ],
        });
        let Content::GroupUpdated(update) =
            run(message(ContentTypeId::group_updated(), update), &transport)
                .await
                .unwrap()
        else {
            panic!("expected a group update");
        };
        assert_eq!(update.initiated_by_inbox_id, "admin");
        assert_eq!(update.metadata_field_changes[0].new_value.as_deref(), Some("b"));
        assert!(update.added_inboxes.is_empty());
    }

    #[tokio::test]
    async fn unknown_types_are_kept_raw() {
        let transport = MemoryTransport::new("0xb07", "bot");
        let content = run(
            message(ContentTypeId::new("transactionReference", 1), json!({"tx": 1})),
            &transport,
        )
        .await
        .unwrap();
        assert!(matches!(
            content,
            Content::Unknown { ref type_id, .. } if type_id == "xmtp.org/transactionReference:1.0"
        ));

        let mut foreign = message(ContentTypeId::text(), json!("hi"));
        foreign.content_type.authority_id = "example.com".into();
        assert!(matches!(
            run(foreign, &transport).await.unwrap(),
            Content::Unknown { .. }
        ));
    }

    #[tokio::test]
    async fn malformed_payload_is_a_decode_error() {
        let transport = MemoryTransport::new("0xb07", "bot");
        let err = run(message(ContentTypeId::reaction(), json!("oops")), &transport)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Decode { .. }));
    }
}

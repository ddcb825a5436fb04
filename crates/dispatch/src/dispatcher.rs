use std::sync::Arc;

use {
    futures::future::BoxFuture,
    msgkit_channels::{Conversation, TransportClient},
    msgkit_commands::{
        CommandRegistry, NoFixtures, Roster, RosterMember, RosterProvider,
        roster::{Perspective, resolve},
    },
    msgkit_common::ids,
    msgkit_protocol::DecodedMessage,
    tracing::{debug, error, info, warn},
};

#[cfg(feature = "metrics")]
use msgkit_metrics::{counter, dispatch as dispatch_metrics, histogram, labels};

use crate::{Command, Content, Handler, MessageContext, MessageEnvelope, Result, classify};

/// Derived dispatches allowed below one inbound message.
pub const DEFAULT_MAX_INTENT_DEPTH: usize = 5;

pub const UNKNOWN_COMMAND_REPLY: &str =
    "Unknown command. Type /help for a list of available commands.";

pub const RECURSION_LIMIT_REPLY: &str = "Too much recursion, stopping here.";

/// Routes classified messages to a [`Handler`].
///
/// Shared behind an `Arc` and never mutated after construction.
pub struct Dispatcher<C: Command> {
    client: Arc<dyn TransportClient>,
    registry: Arc<CommandRegistry>,
    handler: Arc<dyn Handler<C>>,
    roster_provider: Arc<dyn RosterProvider>,
    max_intent_depth: usize,
    log_messages: bool,
}

impl<C: Command> Dispatcher<C> {
    pub fn new(
        client: Arc<dyn TransportClient>,
        registry: Arc<CommandRegistry>,
        handler: Arc<dyn Handler<C>>,
    ) -> Self {
        Self {
            client,
            registry,
            handler,
            roster_provider: Arc::new(NoFixtures),
            max_intent_depth: DEFAULT_MAX_INTENT_DEPTH,
            log_messages: false,
        }
    }

    #[must_use]
    pub fn with_roster_provider(mut self, provider: Arc<dyn RosterProvider>) -> Self {
        self.roster_provider = provider;
        self
    }

    #[must_use]
    pub fn with_max_intent_depth(mut self, depth: usize) -> Self {
        self.max_intent_depth = depth;
        self
    }

    /// Log message bodies and intent splits at `info`.
    #[must_use]
    pub fn with_log_messages(mut self, enabled: bool) -> Self {
        self.log_messages = enabled;
        self
    }

    pub fn client(&self) -> &dyn TransportClient {
        self.client.as_ref()
    }

    pub fn registry(&self) -> &CommandRegistry {
        &self.registry
    }

    pub fn max_intent_depth(&self) -> usize {
        self.max_intent_depth
    }

    pub(crate) fn log_messages(&self) -> bool {
        self.log_messages
    }

    /// Resolve the current participants of `conversation` for a message from `sender_id`.
    pub async fn resolve_roster(
        &self,
        conversation: &dyn Conversation,
        sender_id: &str,
    ) -> Result<Roster> {
        let members = conversation.members().await?;
        Ok(resolve(
            &members,
            Perspective {
                client_address: self.client.account_address(),
                client_inbox_id: self.client.inbox_id(),
                sender_id,
            },
            self.roster_provider.as_ref(),
        ))
    }

    fn is_own(&self, message: &DecodedMessage) -> bool {
        ids::same(&message.sender_inbox_id, self.client.inbox_id())
            || message
                .sender_address
                .as_deref()
                .is_some_and(|address| ids::same(address, self.client.account_address()))
    }

    /// Process one inbound message end to end.
    ///
    /// Handler failures are logged and answered in the conversation; they do
    /// not surface here.
    ///
    /// # Errors
    ///
    /// Fails only when the conversation roster cannot be read.
    pub async fn process(
        self: &Arc<Self>,
        conversation: Arc<dyn Conversation>,
        message: DecodedMessage,
    ) -> Result<()> {
        #[cfg(feature = "metrics")]
        let start = std::time::Instant::now();

        if self.is_own(&message) {
            debug!(message_id = %message.id, "ignoring own message");
            #[cfg(feature = "metrics")]
            counter!(dispatch_metrics::MESSAGES_IGNORED_TOTAL, labels::REASON => "own").increment(1);
            return Ok(());
        }

        let roster = self
            .resolve_roster(conversation.as_ref(), message.sender_id())
            .await?;

        let content =
            match classify(&message, &self.registry, &roster, self.client.as_ref()).await {
                Ok(content) => content,
                Err(error) => {
                    warn!(message_id = %message.id, %error, "dropping undecodable message");
                    #[cfg(feature = "metrics")]
                    counter!(dispatch_metrics::MESSAGES_IGNORED_TOTAL, labels::REASON => "decode")
                        .increment(1);
                    return Ok(());
                },
            };

        #[cfg(feature = "metrics")]
        counter!(
            dispatch_metrics::MESSAGES_RECEIVED_TOTAL,
            labels::CONTENT_KIND => content.kind().as_str()
        )
        .increment(1);

        let sender = roster
            .sender()
            .cloned()
            .unwrap_or_else(|| RosterMember::unresolved(message.sender_id()));

        if self.log_messages {
            info!(
                message_id = %message.id,
                conversation_id = %message.conversation_id,
                sender = %sender.alias,
                kind = %content.kind(),
                content = %message.content,
                "message received"
            );
        }

        let envelope = MessageEnvelope {
            id: message.id,
            conversation_id: message.conversation_id,
            sender,
            content,
            sent_at: message.sent_at,
        };
        let ctx = MessageContext::new(envelope, roster, conversation, Arc::clone(self));
        self.dispatch(&ctx).await;

        #[cfg(feature = "metrics")]
        histogram!(dispatch_metrics::PROCESSING_DURATION_SECONDS)
            .record(start.elapsed().as_secs_f64());

        Ok(())
    }

    /// Route `ctx` and recover from handler errors.
    ///
    /// Boxed because handlers re-enter it through [`MessageContext::intent`].
    pub(crate) fn dispatch<'a>(&'a self, ctx: &'a MessageContext<C>) -> BoxFuture<'a, ()> {
        Box::pin(async move {
            if let Err(error) = self.route(ctx).await {
                error!(
                    message_id = %ctx.message().id,
                    conversation_id = %ctx.message().conversation_id,
                    depth = ctx.depth(),
                    %error,
                    "handler failed"
                );
                #[cfg(feature = "metrics")]
                counter!(dispatch_metrics::HANDLER_ERRORS_TOTAL).increment(1);
                if let Err(reply_error) = ctx.reply(&error.user_message()).await {
                    warn!(%reply_error, "could not deliver error reply");
                }
            }
        })
    }

    async fn route(&self, ctx: &MessageContext<C>) -> Result<()> {
        match &ctx.message().content {
            Content::Text(intent) => match intent.trigger() {
                Some(trigger) => match C::from_trigger(trigger) {
                    Some(command) => {
                        debug!(trigger, depth = ctx.depth(), "routing command");
                        #[cfg(feature = "metrics")]
                        counter!(
                            dispatch_metrics::COMMANDS_TOTAL,
                            labels::TRIGGER => trigger.to_string()
                        )
                        .increment(1);
                        self.handler.command(command, ctx).await
                    },
                    None => {
                        debug!(trigger, "no command variant for trigger");
                        #[cfg(feature = "metrics")]
                        counter!(dispatch_metrics::UNKNOWN_COMMANDS_TOTAL).increment(1);
                        ctx.reply(UNKNOWN_COMMAND_REPLY).await?;
                        Ok(())
                    },
                },
                None => self.handler.agent(ctx).await,
            },
            Content::GroupUpdated(_) => self.handler.group_update(ctx).await,
            Content::Reply(_)
            | Content::Reaction(_)
            | Content::Attachment(_)
            | Content::Unknown { .. } => self.handler.content(ctx).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::{GENERIC_ERROR_REPLY, testing::*},
        msgkit_protocol::{ContentTypeId, GroupUpdated, InboxRef, Reaction},
        serde_json::json,
    };

    #[tokio::test]
    async fn commands_reach_the_handler() {
        let harness = Harness::new();
        harness.text("/ECHO loud").await;
        assert_eq!(harness.handler.calls(), vec!["Echo@0 text=loud"]);
        assert_eq!(harness.sent_text(), vec!["loud"]);
    }

    #[tokio::test]
    async fn plaintext_goes_to_the_agent() {
        let harness = Harness::new();
        harness.text("hello bot").await;
        harness.text("/unregistered thing").await;
        assert_eq!(harness.handler.calls(), vec!["agent", "agent"]);
    }

    #[tokio::test]
    async fn missing_required_param_falls_back_to_agent() {
        let harness = Harness::new();
        harness.text("/echo").await;
        assert_eq!(harness.handler.calls(), vec!["agent"]);
    }

    #[tokio::test]
    async fn trigger_without_variant_gets_unknown_reply() {
        let harness = Harness::new();
        harness.text("/orphan").await;
        assert!(harness.handler.calls().is_empty());
        assert_eq!(harness.sent_text(), vec![UNKNOWN_COMMAND_REPLY]);
    }

    #[tokio::test]
    async fn own_messages_are_ignored() {
        let harness = Harness::new();
        let mut message = DecodedMessage::text("m-own", GROUP_ID, BOT_INBOX, "/echo loop");
        message.sender_address = Some(BOT_ADDRESS.to_uppercase());
        harness.deliver(message).await;
        assert!(harness.handler.calls().is_empty());
        assert!(harness.conversation.sent().is_empty());
    }

    #[tokio::test]
    async fn intent_splits_and_redispatches() {
        let harness = Harness::new();
        harness.text("/split").await;
        assert_eq!(harness.handler.calls(), vec!["Split@0", "Echo@1 text=one"]);
        assert_eq!(harness.sent_text(), vec![
            "one",
            "plain two",
            UNKNOWN_COMMAND_REPLY
        ]);
    }

    #[tokio::test]
    async fn depth_guard_stops_runaway_intents() {
        let harness = Harness::new();
        harness.text("/loop").await;
        let calls = harness.handler.calls();
        assert_eq!(calls.len(), DEFAULT_MAX_INTENT_DEPTH + 1);
        assert_eq!(calls.last().map(String::as_str), Some("Loop@5"));
        assert_eq!(harness.sent_text(), vec![RECURSION_LIMIT_REPLY]);
        assert_eq!(
            harness.handler.outcomes().first(),
            Some(&crate::IntentOutcome::RecursionLimit)
        );
    }

    #[tokio::test]
    async fn depth_is_configurable() {
        let harness = Harness::with_depth(1);
        harness.text("/loop").await;
        assert_eq!(harness.handler.calls(), vec!["Loop@0", "Loop@1"]);
    }

    #[tokio::test]
    async fn handler_errors_become_replies() {
        let harness = Harness::new();
        harness.text("/fail").await;
        assert_eq!(harness.sent_text(), vec![GENERIC_ERROR_REPLY]);
    }

    #[tokio::test]
    async fn group_updates_and_other_content_are_routed() {
        let harness = Harness::new();
        let update = GroupUpdated {
            initiated_by_inbox_id: USER_INBOX.into(),
            added_inboxes: vec![InboxRef {
                inbox_id: "new".into(),
            }],
            ..Default::default()
        };
        harness
            .deliver(harness.message(
                ContentTypeId::group_updated(),
                serde_json::to_value(update).unwrap(),
            ))
            .await;
        harness
            .deliver(harness.message(
                ContentTypeId::reaction(),
                serde_json::to_value(Reaction::unicode("m0", "🔥")).unwrap(),
            ))
            .await;
        harness
            .deliver(harness.message(ContentTypeId::new("readReceipt", 1), json!({})))
            .await;
        assert_eq!(harness.handler.calls(), vec![
            "group_update",
            "content:reaction",
            "content:unknown"
        ]);
    }

    #[tokio::test]
    async fn malformed_messages_are_dropped() {
        let harness = Harness::new();
        harness
            .deliver(harness.message(ContentTypeId::text(), json!(42)))
            .await;
        assert!(harness.handler.calls().is_empty());
        assert!(harness.conversation.sent().is_empty());
    }

    #[tokio::test]
    async fn unknown_sender_gets_a_synthetic_member() {
        let harness = Harness::new();
        harness
            .deliver(DecodedMessage::text(
                "m-stranger",
                GROUP_ID,
                "Stranger-Inbox",
                "who am i",
            ))
            .await;
        let sender = harness.handler.last_sender().unwrap();
        assert_eq!(sender.identifier, "stranger-inbox");
        assert!(!sender.is_self);
    }
}

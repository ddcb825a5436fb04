//! Per-message context handed to handlers.

use std::{collections::BTreeMap, sync::Arc};

use {
    futures::future::join_all,
    msgkit_channels::{Conversation, TransportClient},
    msgkit_commands::{COMMAND_SIGIL, CommandRegistry, ParamValue, Roster, RosterMember, parse},
    msgkit_common::ids,
    msgkit_protocol::{DecodedMessage, OutboundContent, Reaction, Reply},
    serde::Serialize,
    tracing::{debug, info, warn},
};

#[cfg(feature = "metrics")]
use msgkit_metrics::{counter, labels, outbound as outbound_metrics};

use crate::{
    Command, Content, Dispatcher, MessageEnvelope, RECURSION_LIMIT_REPLY, Result,
    UNKNOWN_COMMAND_REPLY,
};

#[derive(Debug, Clone, Copy, Default)]
pub struct IntentOptions {
    /// Split the text and hand the messages back without dispatching them.
    pub return_messages: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IntentOutcome {
    /// Split messages, returned because of [`IntentOptions::return_messages`].
    Messages(Vec<String>),
    /// Every message was replied or dispatched.
    Handled { messages: usize },
    /// The depth guard refused to dispatch further.
    RecursionLimit,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailedSend {
    pub receiver: String,
    pub error: String,
}

/// Per-receiver outcome of [`MessageContext::send_to`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SendReport {
    pub delivered: Vec<String>,
    /// The bot itself, or blank addresses.
    pub skipped: Vec<String>,
    pub failed: Vec<FailedSend>,
}

impl SendReport {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Everything a handler needs to answer one message.
///
/// Immutable; [`intent`](Self::intent) dispatches through a derived context
/// one level deeper.
pub struct MessageContext<C: Command> {
    envelope: Arc<MessageEnvelope>,
    roster: Arc<Roster>,
    conversation: Arc<dyn Conversation>,
    dispatcher: Arc<Dispatcher<C>>,
    depth: usize,
}

impl<C: Command> MessageContext<C> {
    pub(crate) fn new(
        envelope: MessageEnvelope,
        roster: Roster,
        conversation: Arc<dyn Conversation>,
        dispatcher: Arc<Dispatcher<C>>,
    ) -> Self {
        Self {
            envelope: Arc::new(envelope),
            roster: Arc::new(roster),
            conversation,
            dispatcher,
            depth: 0,
        }
    }

    fn derive(&self, content: Content) -> Self {
        Self {
            envelope: Arc::new(self.envelope.with_content(content)),
            roster: Arc::clone(&self.roster),
            conversation: Arc::clone(&self.conversation),
            dispatcher: Arc::clone(&self.dispatcher),
            depth: self.depth + 1,
        }
    }

    pub fn message(&self) -> &MessageEnvelope {
        &self.envelope
    }

    pub fn sender(&self) -> &RosterMember {
        &self.envelope.sender
    }

    pub fn roster(&self) -> &Roster {
        &self.roster
    }

    pub fn conversation(&self) -> &Arc<dyn Conversation> {
        &self.conversation
    }

    pub fn registry(&self) -> &CommandRegistry {
        self.dispatcher.registry()
    }

    pub fn client(&self) -> &dyn TransportClient {
        self.dispatcher.client()
    }

    /// 0 for the inbound message, +1 per re-entrant [`intent`](Self::intent).
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Bound parameters when the message is a parsed command.
    pub fn intent_params(&self) -> Option<&BTreeMap<String, ParamValue>> {
        self.envelope
            .content
            .intent()
            .filter(|intent| intent.is_command())
            .map(|intent| intent.params())
    }

    /// Look up an earlier message through the transport.
    pub async fn message_by_id(&self, id: &str) -> Result<Option<DecodedMessage>> {
        Ok(self.client().message_by_id(id).await?)
    }

    // ── Outbound ────────────────────────────────────────────────────────────

    /// Send `text` into the conversation.
    pub async fn send(&self, text: &str) -> Result<String> {
        self.deliver(OutboundContent::text(text)).await
    }

    /// Threaded reply to the current message.
    pub async fn reply(&self, text: &str) -> Result<String> {
        self.deliver(OutboundContent::Reply(Reply::text(&self.envelope.id, text)))
            .await
    }

    /// React to the current message with a unicode emoji.
    pub async fn react(&self, emoji: &str) -> Result<String> {
        self.deliver(OutboundContent::Reaction(Reaction::unicode(
            &self.envelope.id,
            emoji,
        )))
        .await
    }

    async fn deliver(&self, content: OutboundContent) -> Result<String> {
        #[cfg(feature = "metrics")]
        let kind = content.content_type().type_id;

        match self.conversation.send(content).await {
            Ok(id) => {
                #[cfg(feature = "metrics")]
                counter!(outbound_metrics::MESSAGES_SENT_TOTAL, labels::CONTENT_KIND => kind)
                    .increment(1);
                Ok(id)
            },
            Err(error) => {
                #[cfg(feature = "metrics")]
                counter!(outbound_metrics::SEND_FAILURES_TOTAL, labels::CONTENT_KIND => kind)
                    .increment(1);
                warn!(
                    conversation_id = %self.conversation.id(),
                    message_id = %self.envelope.id,
                    %error,
                    "failed to send"
                );
                Err(error.into())
            },
        }
    }

    /// Send `text` to each receiver in its own direct conversation.
    ///
    /// Receivers are deduplicated and the bot's own address is skipped. Sends
    /// run concurrently and a failed receiver never stops the others.
    pub async fn send_to(&self, text: &str, receivers: &[String]) -> SendReport {
        let client = self.client();
        let mut report = SendReport::default();
        let mut targets: Vec<String> = Vec::new();

        for receiver in receivers {
            let address = ids::normalize(receiver);
            if address.is_empty()
                || ids::same(&address, client.account_address())
                || ids::same(&address, client.inbox_id())
            {
                debug!(receiver = %receiver, "skipping receiver");
                report.skipped.push(receiver.clone());
                continue;
            }
            if !targets.contains(&address) {
                targets.push(address);
            }
        }

        #[cfg(feature = "metrics")]
        counter!(outbound_metrics::RECIPIENTS_SKIPPED_TOTAL).increment(report.skipped.len() as u64);

        let sends = targets.into_iter().map(|address| async move {
            let result = match client.new_conversation(&address).await {
                Ok(conversation) => conversation.send(OutboundContent::text(text)).await,
                Err(error) => Err(error),
            };
            (address, result)
        });

        for (receiver, result) in join_all(sends).await {
            match result {
                Ok(_) => report.delivered.push(receiver),
                Err(error) => {
                    #[cfg(feature = "metrics")]
                    counter!(outbound_metrics::SEND_FAILURES_TOTAL, labels::CONTENT_KIND => "text")
                        .increment(1);
                    warn!(receiver = %receiver, %error, "send_to failed for receiver");
                    report.failed.push(FailedSend {
                        receiver,
                        error: error.to_string(),
                    });
                },
            }
        }

        debug!(
            delivered = report.delivered.len(),
            skipped = report.skipped.len(),
            failed = report.failed.len(),
            "send_to finished"
        );
        report
    }

    // ── Re-entrant dispatch ─────────────────────────────────────────────────

    /// Act on handler output as if the sender had typed it.
    ///
    /// A JSON array of strings is split into one message per element. Each
    /// message starting with `/` is parsed and dispatched through a derived
    /// context; anything else is sent as a reply. Slash text that is not a
    /// registered command gets the unknown-command reply.
    pub async fn intent(&self, text: &str, options: IntentOptions) -> Result<IntentOutcome> {
        let messages = split_messages(text);
        if self.dispatcher.log_messages() {
            info!(
                message_id = %self.envelope.id,
                depth = self.depth,
                ?messages,
                "intent"
            );
        }
        if options.return_messages {
            return Ok(IntentOutcome::Messages(messages));
        }

        let count = messages.len();
        for message in &messages {
            let trimmed = message.trim();
            if trimmed.is_empty() {
                continue;
            }
            if !trimmed.starts_with(COMMAND_SIGIL) {
                self.reply(message).await?;
                continue;
            }

            let limit = self.dispatcher.max_intent_depth();
            if self.depth >= limit {
                warn!(
                    message_id = %self.envelope.id,
                    depth = self.depth,
                    limit,
                    "intent recursion limit reached"
                );
                #[cfg(feature = "metrics")]
                counter!(msgkit_metrics::dispatch::DEPTH_EXCEEDED_TOTAL).increment(1);
                self.reply(RECURSION_LIMIT_REPLY).await?;
                return Ok(IntentOutcome::RecursionLimit);
            }

            let parsed = parse(trimmed, self.registry(), &self.roster);
            if !parsed.is_command() {
                debug!(text = %message, "intent is not a registered command");
                self.reply(UNKNOWN_COMMAND_REPLY).await?;
                continue;
            }

            let derived = self.derive(Content::Text(parsed));
            self.dispatcher.dispatch(&derived).await;
        }

        Ok(IntentOutcome::Handled { messages: count })
    }
}

/// A JSON array of strings becomes its elements as given, anything else one
/// trimmed message.
fn split_messages(text: &str) -> Vec<String> {
    let trimmed = text.trim();
    if trimmed.starts_with('[')
        && let Ok(parts) = serde_json::from_str::<Vec<String>>(trimmed)
    {
        return parts;
    }
    if trimmed.is_empty() {
        Vec::new()
    } else {
        vec![trimmed.to_string()]
    }
}

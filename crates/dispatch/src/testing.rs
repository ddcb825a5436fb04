//! Shared fixtures for dispatch tests.

use std::sync::{
    Arc, Mutex,
    atomic::{AtomicUsize, Ordering},
};

use {
    async_trait::async_trait,
    msgkit_channels::{MemoryConversation, MemoryTransport},
    msgkit_commands::{
        CommandGroup, CommandRegistry, CommandSchema, FixtureRoster, ParamSpec, RosterMember,
        roster::Fixture,
    },
    msgkit_protocol::{ContentTypeId, DecodedMessage, Member},
};

use crate::{
    Command, Dispatcher, Error, Handler, IntentOptions, IntentOutcome, MessageContext, Result,
    SendReport,
};

pub(crate) const BOT_ADDRESS: &str = "0xb070000000000000000000000000000000000b07";
pub(crate) const BOT_INBOX: &str = "bot-inbox";
pub(crate) const USER_ADDRESS: &str = "0x5e4d000000000000000000000000000000005e4d";
pub(crate) const USER_INBOX: &str = "user-inbox";
pub(crate) const GROUP_ID: &str = "group-1";

pub(crate) fn alix() -> Fixture {
    FixtureRoster::demo().fixtures()[0].clone()
}

pub(crate) fn eva() -> Fixture {
    FixtureRoster::demo().fixtures()[1].clone()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TestCommand {
    Echo,
    Loop,
    Split,
    Preview,
    Fail,
    Fanout,
}

impl Command for TestCommand {
    fn from_trigger(trigger: &str) -> Option<Self> {
        match trigger {
            "/echo" => Some(Self::Echo),
            "/loop" => Some(Self::Loop),
            "/split" => Some(Self::Split),
            "/preview" => Some(Self::Preview),
            "/fail" => Some(Self::Fail),
            "/fanout" => Some(Self::Fanout),
            _ => None,
        }
    }
}

pub(crate) fn registry() -> CommandRegistry {
    CommandRegistry::new(vec![CommandGroup::new("Test", "Test commands", vec![
        CommandSchema::new("/echo", "Echo text").param(ParamSpec::text("text")),
        CommandSchema::new("/loop", "Re-enter forever"),
        CommandSchema::new("/split", "Reply with several messages"),
        CommandSchema::new("/preview", "Split without dispatching"),
        CommandSchema::new("/fail", "Always fails"),
        CommandSchema::new("/fanout", "DM users").param(ParamSpec::mentions("users")),
        CommandSchema::new("/orphan", "Registered but unhandled"),
    ])])
    .unwrap()
}

/// Records every invocation and answers in a predictable way.
#[derive(Default)]
pub(crate) struct RecordingHandler {
    calls: Mutex<Vec<String>>,
    outcomes: Mutex<Vec<IntentOutcome>>,
    reports: Mutex<Vec<SendReport>>,
    senders: Mutex<Vec<RosterMember>>,
}

impl RecordingHandler {
    fn record(&self, ctx: &MessageContext<TestCommand>, call: String) {
        self.calls.lock().unwrap().push(call);
        self.senders.lock().unwrap().push(ctx.sender().clone());
    }

    pub(crate) fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    /// In completion order, innermost first.
    pub(crate) fn outcomes(&self) -> Vec<IntentOutcome> {
        self.outcomes.lock().unwrap().clone()
    }

    pub(crate) fn last_outcome(&self) -> Option<IntentOutcome> {
        self.outcomes.lock().unwrap().last().cloned()
    }

    pub(crate) fn last_report(&self) -> Option<SendReport> {
        self.reports.lock().unwrap().last().cloned()
    }

    pub(crate) fn last_sender(&self) -> Option<RosterMember> {
        self.senders.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl Handler<TestCommand> for RecordingHandler {
    async fn command(&self, command: TestCommand, ctx: &MessageContext<TestCommand>) -> Result<()> {
        let params: String = ctx
            .intent_params()
            .into_iter()
            .flatten()
            .map(|(name, value)| {
                let shown = value
                    .as_text()
                    .map(str::to_string)
                    .or_else(|| value.as_users().map(|users| users.len().to_string()))
                    .unwrap_or_default();
                format!(" {name}={shown}")
            })
            .collect();
        self.record(ctx, format!("{command:?}@{}{params}", ctx.depth()));

        let intent = ctx.message().content.intent();
        match command {
            TestCommand::Echo => {
                let text = intent.and_then(|i| i.text("text")).unwrap_or_default();
                ctx.reply(text).await?;
            },
            TestCommand::Loop => {
                let outcome = ctx.intent("/loop", IntentOptions::default()).await?;
                self.outcomes.lock().unwrap().push(outcome);
            },
            TestCommand::Split => {
                let outcome = ctx
                    .intent(
                        r#"["  /echo one", "plain two", "", "/nope"]"#,
                        IntentOptions::default(),
                    )
                    .await?;
                self.outcomes.lock().unwrap().push(outcome);
            },
            TestCommand::Preview => {
                let outcome = ctx
                    .intent(r#"["  /echo one", "", "two "]"#, IntentOptions {
                        return_messages: true,
                    })
                    .await?;
                self.outcomes.lock().unwrap().push(outcome);
            },
            TestCommand::Fail => return Err(Error::message("boom")),
            TestCommand::Fanout => {
                let mut receivers: Vec<String> = intent
                    .map(|i| i.users("users"))
                    .unwrap_or_default()
                    .iter()
                    .map(|user| user.identifier.clone())
                    .collect();
                receivers.push(BOT_ADDRESS.to_string());
                receivers.extend(receivers.first().cloned());
                let report = ctx.send_to("gm", &receivers).await;
                self.reports.lock().unwrap().push(report);
            },
        }
        Ok(())
    }

    async fn agent(&self, ctx: &MessageContext<TestCommand>) -> Result<()> {
        self.record(ctx, "agent".to_string());
        ctx.react("👀").await?;
        Ok(())
    }

    async fn group_update(&self, ctx: &MessageContext<TestCommand>) -> Result<()> {
        self.record(ctx, "group_update".to_string());
        Ok(())
    }

    async fn content(&self, ctx: &MessageContext<TestCommand>) -> Result<()> {
        self.record(ctx, format!("content:{}", ctx.message().kind()));
        Ok(())
    }
}

/// A group with the bot and one user, backed by the in-memory transport.
pub(crate) struct Harness {
    pub transport: Arc<MemoryTransport>,
    pub conversation: Arc<MemoryConversation>,
    pub handler: Arc<RecordingHandler>,
    dispatcher: Arc<Dispatcher<TestCommand>>,
    next_id: AtomicUsize,
}

impl Harness {
    pub(crate) fn new() -> Self {
        Self::with_depth(crate::DEFAULT_MAX_INTENT_DEPTH)
    }

    pub(crate) fn with_depth(max_intent_depth: usize) -> Self {
        let transport = Arc::new(MemoryTransport::new(BOT_ADDRESS, BOT_INBOX));
        let conversation = Arc::new(MemoryConversation::new(GROUP_ID, vec![
            transport.as_member(),
            Member::new(USER_INBOX, USER_ADDRESS),
        ]));
        let handler = Arc::new(RecordingHandler::default());
        let dispatcher = Dispatcher::new(transport.clone(), Arc::new(registry()), handler.clone())
            .with_roster_provider(Arc::new(FixtureRoster::demo()))
            .with_max_intent_depth(max_intent_depth);
        Self {
            transport,
            conversation,
            handler,
            dispatcher: Arc::new(dispatcher),
            next_id: AtomicUsize::new(0),
        }
    }

    fn next_id(&self) -> String {
        format!("m{}", self.next_id.fetch_add(1, Ordering::Relaxed) + 1)
    }

    /// Id of the most recently built message.
    pub(crate) fn last_id(&self) -> String {
        format!("m{}", self.next_id.load(Ordering::Relaxed))
    }

    /// A message from the user.
    pub(crate) fn message(
        &self,
        content_type: ContentTypeId,
        content: serde_json::Value,
    ) -> DecodedMessage {
        DecodedMessage {
            content_type,
            content,
            ..DecodedMessage::text(self.next_id(), GROUP_ID, USER_INBOX, "")
        }
    }

    pub(crate) async fn text(&self, text: &str) {
        let message = DecodedMessage::text(self.next_id(), GROUP_ID, USER_INBOX, text);
        self.deliver(message).await;
    }

    pub(crate) async fn deliver(&self, message: DecodedMessage) {
        self.dispatcher
            .process(self.conversation.clone(), message)
            .await
            .unwrap();
    }

    /// Display text of everything sent into the group so far.
    pub(crate) fn sent_text(&self) -> Vec<String> {
        self.conversation
            .sent()
            .iter()
            .map(|content| content.display_text())
            .collect()
    }
}

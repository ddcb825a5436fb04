//! Interactive in-memory group: the bot, you, and optionally the demo
//! identities. Lines starting with `!` drive the simulated group instead of
//! being sent as messages.

use std::{io::Write, sync::Arc, time::Duration};

use {
    anyhow::Result,
    msgkit_channels::{Conversation, MemoryConversation, MemoryTransport},
    msgkit_commands::FixtureRoster,
    msgkit_common::ids,
    msgkit_config::{AgentConfig, MsgkitConfig},
    msgkit_dispatch::Dispatcher,
    msgkit_group::{GroupBot, GroupCommand},
    msgkit_protocol::{
        ContentTypeId, DecodedMessage, GroupUpdated, InboxRef, Member, MetadataFieldChange,
        OutboundContent, metadata_fields,
    },
    msgkit_providers::{TextGenerator, openai::OpenAiCompatGenerator},
    tokio::io::{AsyncBufReadExt, BufReader},
    tracing::{info, warn},
};

pub const BOT_ADDRESS: &str = "0xb07b07b07b07b07b07b07b07b07b07b07b07b07b";
pub const BOT_INBOX: &str = "playground-bot";
pub const USER_ADDRESS: &str = "0x0000000000000000000000000000000000000001";
pub const USER_INBOX: &str = "playground-you";
const GROUP_ID: &str = "playground";

const USAGE: &str = "\
Type a message to send it to the group. Slash commands: /help.
  !rename NAME     rename the group as its admin
  !join ADDRESS    add someone to the group as its admin
  !members         list group members
  !metrics         dump collected metrics
  !quit            leave";

#[derive(Debug, PartialEq, Eq)]
enum Line {
    Message(String),
    Rename(String),
    Join(String),
    Members,
    Metrics,
    Usage,
    Quit,
    Skip,
}

fn parse_line(line: &str) -> Line {
    let line = line.trim();
    let Some(directive) = line.strip_prefix('!') else {
        return if line.is_empty() {
            Line::Skip
        } else {
            Line::Message(line.to_string())
        };
    };
    let (name, arg) = directive
        .split_once(char::is_whitespace)
        .map(|(name, arg)| (name, arg.trim()))
        .unwrap_or((directive, ""));
    match (name, arg) {
        ("rename", name) if !name.is_empty() => Line::Rename(name.to_string()),
        ("join", address) if !address.is_empty() => Line::Join(address.to_string()),
        ("members", _) => Line::Members,
        ("metrics", _) => Line::Metrics,
        ("quit" | "exit", _) => Line::Quit,
        _ => Line::Usage,
    }
}

fn generator(config: &AgentConfig) -> Option<Arc<dyn TextGenerator>> {
    if !config.has_api_key() {
        warn!("no OpenAI API key configured, the agent will explain how to set one");
        return None;
    }
    let generator = OpenAiCompatGenerator::new(
        config.api_key.clone(),
        config.model.clone(),
        config.base_url.clone(),
    )
    .with_timeout(Duration::from_secs(config.timeout_secs));
    Some(Arc::new(generator))
}

struct Playground {
    bot_name: String,
    transport: Arc<MemoryTransport>,
    conversation: Arc<MemoryConversation>,
    dispatcher: Arc<Dispatcher<GroupCommand>>,
    next_id: u64,
}

impl Playground {
    fn new(
        config: &MsgkitConfig,
        generator: Option<Arc<dyn TextGenerator>>,
        fixtures: bool,
    ) -> Result<Self> {
        let transport = Arc::new(MemoryTransport::new(BOT_ADDRESS, BOT_INBOX));
        let conversation = Arc::new(MemoryConversation::new(GROUP_ID, vec![
            transport.as_member(),
            Member::new(USER_INBOX, USER_ADDRESS),
        ]));

        let bot = GroupBot::new(generator)
            .with_plaintext_replies(config.agent.respond_to_plaintext)
            .with_log_prompts(config.bot.log_messages);
        let mut dispatcher = Dispatcher::new(
            transport.clone(),
            Arc::new(msgkit_group::registry()?),
            Arc::new(bot),
        )
        .with_max_intent_depth(config.bot.max_intent_depth)
        .with_log_messages(config.bot.log_messages);
        if fixtures || config.bot.fixtures {
            dispatcher = dispatcher.with_roster_provider(Arc::new(FixtureRoster::demo()));
        }

        Ok(Self {
            bot_name: config.bot.name.clone(),
            transport,
            conversation,
            dispatcher: Arc::new(dispatcher),
            next_id: 0,
        })
    }

    fn next_message_id(&mut self) -> String {
        self.next_id += 1;
        format!("{GROUP_ID}-{}", self.next_id)
    }

    /// Send `text` as the user and return what the bot posted.
    async fn say(&mut self, text: &str) -> Result<Vec<String>> {
        let id = self.next_message_id();
        self.deliver(DecodedMessage::text(id, GROUP_ID, USER_INBOX, text))
            .await
    }

    async fn rename(&mut self, name: &str) -> Result<Vec<String>> {
        let old_name = self.conversation.name();
        self.conversation.update_name(name).await?;
        self.group_updated(GroupUpdated {
            initiated_by_inbox_id: USER_INBOX.into(),
            metadata_field_changes: vec![MetadataFieldChange {
                field_name: metadata_fields::GROUP_NAME.into(),
                old_value: old_name,
                new_value: Some(name.to_string()),
            }],
            ..Default::default()
        })
        .await
    }

    async fn join(&mut self, address: &str) -> Result<Vec<String>> {
        let inbox_id = ids::normalize(address);
        let members = self.conversation.members().await?;
        if members.iter().any(|m| ids::same(&m.inbox_id, &inbox_id)) {
            anyhow::bail!("{address} is already a member");
        }
        // Keep the address so the roster can name the newcomer.
        self.conversation
            .add_member(Member::new(inbox_id.clone(), address));
        self.group_updated(GroupUpdated {
            initiated_by_inbox_id: USER_INBOX.into(),
            added_inboxes: vec![InboxRef { inbox_id }],
            ..Default::default()
        })
        .await
    }

    async fn group_updated(&mut self, update: GroupUpdated) -> Result<Vec<String>> {
        let id = self.next_message_id();
        let message = DecodedMessage {
            content_type: ContentTypeId::group_updated(),
            content: serde_json::to_value(update)?,
            ..DecodedMessage::text(id, GROUP_ID, USER_INBOX, "")
        };
        self.deliver(message).await
    }

    async fn deliver(&mut self, message: DecodedMessage) -> Result<Vec<String>> {
        self.transport.record_message(message.clone());
        self.dispatcher
            .process(self.conversation.clone(), message)
            .await?;
        Ok(self
            .conversation
            .take_sent()
            .iter()
            .map(describe_outbound)
            .collect())
    }

    async fn members(&self) -> Result<Vec<String>> {
        Ok(self
            .conversation
            .members()
            .await?
            .iter()
            .map(|m| match m.primary_address() {
                Some(address) => format!("{} ({address})", m.inbox_id),
                None => m.inbox_id.clone(),
            })
            .collect())
    }
}

fn describe_outbound(content: &OutboundContent) -> String {
    match content {
        OutboundContent::Reaction(reaction) => format!("[reacted {}]", reaction.content),
        other => other.display_text(),
    }
}

fn prompt(bot_name: &str) -> Result<()> {
    let mut stdout = std::io::stdout();
    write!(stdout, "{bot_name}> ")?;
    stdout.flush()?;
    Ok(())
}

pub async fn run(config: MsgkitConfig, fixtures: bool) -> Result<()> {
    #[cfg(feature = "metrics")]
    let metrics = msgkit_metrics::init_metrics(msgkit_metrics::MetricsRecorderConfig {
        enabled: true,
        global_labels: vec![("bot".into(), config.bot.name.clone())],
    })?;

    let mut playground = Playground::new(&config, generator(&config.agent), fixtures)?;
    info!(
        bot = %playground.bot_name,
        fixtures = fixtures || config.bot.fixtures,
        max_intent_depth = config.bot.max_intent_depth,
        "playground ready"
    );
    println!("{USAGE}");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    prompt(&playground.bot_name)?;
    while let Some(line) = lines.next_line().await? {
        let output = match parse_line(&line) {
            Line::Skip => Ok(Vec::new()),
            Line::Quit => break,
            Line::Usage => Ok(vec![USAGE.to_string()]),
            Line::Members => playground.members().await,
            Line::Metrics => {
                #[cfg(feature = "metrics")]
                let rendered = metrics.render();
                #[cfg(not(feature = "metrics"))]
                let rendered = String::new();
                if rendered.is_empty() {
                    Ok(vec!["no metrics exporter compiled in".to_string()])
                } else {
                    Ok(vec![rendered])
                }
            },
            Line::Rename(name) => playground.rename(&name).await,
            Line::Join(address) => playground.join(&address).await,
            Line::Message(text) => playground.say(&text).await,
        };
        match output {
            Ok(lines) => {
                for line in lines {
                    println!("  {line}");
                }
            },
            Err(error) => eprintln!("  error: {error:#}"),
        }
        prompt(&playground.bot_name)?;
    }
    Ok(())
}

//! Config schema.

use {
    secrecy::{ExposeSecret, Secret},
    serde::{Deserialize, Serialize},
};

/// Root of `msgkit.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MsgkitConfig {
    pub bot: BotConfig,
    pub agent: AgentConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BotConfig {
    /// Display name used in logs and the REPL prompt.
    pub name: String,
    /// Re-entrant intents allowed below one inbound message.
    pub max_intent_depth: usize,
    /// Add the demo fixture identities (alix, eva, bo) to every roster.
    pub fixtures: bool,
    /// Log message bodies, intent splits and agent prompts at `info`.
    pub log_messages: bool,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            name: "msgkit".into(),
            max_intent_depth: 5,
            fixtures: false,
            log_messages: false,
        }
    }
}

/// Text generation backend for the agent handler.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    #[serde(
        serialize_with = "serialize_option_secret",
        skip_serializing_if = "Option::is_none"
    )]
    pub api_key: Option<Secret<String>>,
    pub base_url: String,
    pub model: String,
    pub timeout_secs: u64,
    /// Send free text (not only `/agent`) to the model.
    pub respond_to_plaintext: bool,
}

impl AgentConfig {
    pub fn has_api_key(&self) -> bool {
        self.api_key
            .as_ref()
            .is_some_and(|key| !key.expose_secret().trim().is_empty())
    }
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: "https://api.openai.com/v1".into(),
            model: "gpt-4o-mini".into(),
            timeout_secs: 30,
            respond_to_plaintext: true,
        }
    }
}

impl std::fmt::Debug for AgentConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AgentConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("timeout_secs", &self.timeout_secs)
            .field("respond_to_plaintext", &self.respond_to_plaintext)
            .finish()
    }
}

// ── Serde helpers for Secret<String> ────────────────────────────────────────

fn serialize_option_secret<S: serde::Serializer>(
    secret: &Option<Secret<String>>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match secret {
        Some(s) => serializer.serialize_some(s.expose_secret()),
        None => serializer.serialize_none(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documentation() {
        let config = MsgkitConfig::default();
        assert_eq!(config.bot.max_intent_depth, 5);
        assert!(!config.bot.fixtures);
        assert_eq!(config.agent.model, "gpt-4o-mini");
        assert_eq!(config.agent.timeout_secs, 30);
        assert!(!config.agent.has_api_key());
    }

    #[test]
    fn debug_redacts_api_key() {
        let agent = AgentConfig {
            api_key: Some(Secret::new("sk-secret".into())),
            ..Default::default()
        };
        let rendered = format!("{agent:?}");
        assert!(!rendered.contains("sk-secret"));
        assert!(rendered.contains("[REDACTED]"));
    }

    #[test]
    fn partial_sections_keep_defaults() {
        let config: MsgkitConfig = toml::from_str("[bot]\nfixtures = true\n").unwrap();
        assert!(config.bot.fixtures);
        assert_eq!(config.bot.name, "msgkit");
        assert!(config.agent.respond_to_plaintext);
    }
}

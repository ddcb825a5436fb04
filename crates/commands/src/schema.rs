//! Static command schema registry.
//!
//! Commands are declared once at startup in named groups. The registry is
//! immutable afterwards and shared read-only between all dispatches.

use std::{collections::HashMap, fmt::Write as _};

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Leading character of every command trigger.
pub const COMMAND_SIGIL: char = '/';

/// How a parameter consumes tokens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ParamKind {
    /// The rest of the line.
    Text,
    /// One or more consecutive `@handle` tokens, resolved against the roster.
    UserMentionList,
    /// One token out of a fixed set (case-insensitive).
    Enum { values: Vec<String> },
    /// One token parsing as a number.
    Number,
    /// One `0x` account address.
    Address,
}

impl ParamKind {
    /// Whether the kind binds exactly one token (and can be named `k=v`).
    pub fn is_single_token(&self) -> bool {
        matches!(self, Self::Enum { .. } | Self::Number | Self::Address)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParamSpec {
    pub name: String,
    pub kind: ParamKind,
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,
}

impl ParamSpec {
    fn new(name: &str, kind: ParamKind) -> Self {
        Self {
            name: name.to_string(),
            kind,
            required: true,
            default: None,
        }
    }

    pub fn text(name: &str) -> Self {
        Self::new(name, ParamKind::Text)
    }

    pub fn mentions(name: &str) -> Self {
        Self::new(name, ParamKind::UserMentionList)
    }

    pub fn one_of(name: &str, values: &[&str]) -> Self {
        Self::new(name, ParamKind::Enum {
            values: values.iter().map(|v| v.to_string()).collect(),
        })
    }

    pub fn number(name: &str) -> Self {
        Self::new(name, ParamKind::Number)
    }

    pub fn address(name: &str) -> Self {
        Self::new(name, ParamKind::Address)
    }

    #[must_use]
    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    /// Optional with a fallback value, parsed like a token of this kind.
    #[must_use]
    pub fn with_default(mut self, value: impl Into<String>) -> Self {
        self.required = false;
        self.default = Some(value.into());
        self
    }

    fn placeholder(&self) -> String {
        let inner = match &self.kind {
            ParamKind::UserMentionList => format!("@{}", self.name),
            ParamKind::Enum { values } => values.join("|"),
            _ => self.name.clone(),
        };
        if self.required {
            format!("<{inner}>")
        } else {
            format!("[{inner}]")
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandSchema {
    /// Leading token including the sigil, e.g. `/add`.
    pub trigger: String,
    pub description: String,
    pub params: Vec<ParamSpec>,
}

impl CommandSchema {
    pub fn new(trigger: &str, description: &str) -> Self {
        Self {
            trigger: trigger.to_string(),
            description: description.to_string(),
            params: Vec::new(),
        }
    }

    #[must_use]
    pub fn param(mut self, spec: ParamSpec) -> Self {
        self.params.push(spec);
        self
    }

    /// `/add <@users>`-style usage line.
    pub fn usage(&self) -> String {
        let mut usage = self.trigger.clone();
        for spec in &self.params {
            usage.push(' ');
            usage.push_str(&spec.placeholder());
        }
        usage
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandGroup {
    pub name: String,
    pub description: String,
    pub commands: Vec<CommandSchema>,
}

impl CommandGroup {
    pub fn new(name: &str, description: &str, commands: Vec<CommandSchema>) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
            commands,
        }
    }
}

/// Immutable lookup table of command schemas.
#[derive(Debug, Clone, Default)]
pub struct CommandRegistry {
    groups: Vec<CommandGroup>,
    index: HashMap<String, (usize, usize)>,
}

impl CommandRegistry {
    /// Build the registry, lowercasing triggers and rejecting duplicates.
    pub fn new(mut groups: Vec<CommandGroup>) -> Result<Self> {
        let mut index = HashMap::new();
        for (g, group) in groups.iter_mut().enumerate() {
            for (c, schema) in group.commands.iter_mut().enumerate() {
                let trigger = schema.trigger.trim().to_lowercase();
                let valid = trigger.len() > 1
                    && trigger.starts_with(COMMAND_SIGIL)
                    && !trigger.contains(char::is_whitespace);
                if !valid {
                    return Err(Error::InvalidTrigger {
                        trigger: schema.trigger.clone(),
                    });
                }
                if index.insert(trigger.clone(), (g, c)).is_some() {
                    return Err(Error::DuplicateTrigger { trigger });
                }
                schema.trigger = trigger;
            }
        }
        Ok(Self { groups, index })
    }

    /// Case-insensitive trigger lookup.
    pub fn lookup(&self, trigger: &str) -> Option<&CommandSchema> {
        let (g, c) = *self.index.get(&trigger.to_lowercase())?;
        self.groups.get(g)?.commands.get(c)
    }

    /// All schemas in declaration order.
    pub fn all(&self) -> Vec<&CommandSchema> {
        self.groups.iter().flat_map(|g| g.commands.iter()).collect()
    }

    pub fn groups(&self) -> &[CommandGroup] {
        &self.groups
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Human-readable listing used by `/help`.
    pub fn help_text(&self) -> String {
        let mut out = String::from("Available commands:");
        for group in &self.groups {
            let _ = write!(out, "\n\n{}", group.name);
            if !group.description.is_empty() {
                let _ = write!(out, " ({})", group.description);
            }
            for schema in &group.commands {
                let _ = write!(out, "\n{} - {}", schema.usage(), schema.description);
            }
        }
        out
    }

    /// The command groups as JSON, for model prompts.
    pub fn to_json(&self) -> Result<serde_json::Value> {
        Ok(serde_json::to_value(&self.groups)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Vec<CommandGroup> {
        vec![CommandGroup::new("Group", "Manage the group", vec![
            CommandSchema::new("/Add", "Add users").param(ParamSpec::mentions("users")),
            CommandSchema::new("/name", "Rename").param(ParamSpec::text("name")),
        ])]
    }

    #[test]
    fn lookup_is_case_insensitive() {
        let registry = CommandRegistry::new(sample()).unwrap();
        assert_eq!(registry.lookup("/ADD").unwrap().trigger, "/add");
        assert!(registry.lookup("/remove").is_none());
        assert_eq!(registry.all().len(), 2);
    }

    #[test]
    fn duplicate_triggers_are_rejected() {
        let mut groups = sample();
        groups.push(CommandGroup::new("Other", "", vec![CommandSchema::new(
            "/add", "again",
        )]));
        let err = CommandRegistry::new(groups).unwrap_err();
        assert!(matches!(err, Error::DuplicateTrigger { trigger } if trigger == "/add"));
    }

    #[test]
    fn triggers_need_the_sigil() {
        let groups = vec![CommandGroup::new("G", "", vec![CommandSchema::new(
            "add", "",
        )])];
        assert!(matches!(
            CommandRegistry::new(groups),
            Err(Error::InvalidTrigger { .. })
        ));
    }

    #[test]
    fn help_lists_usage() {
        let registry = CommandRegistry::new(sample()).unwrap();
        let help = registry.help_text();
        assert!(help.contains("/add <@users> - Add users"));
        assert!(help.contains("/name <name> - Rename"));
    }

    #[test]
    fn optional_params_use_brackets() {
        let schema = CommandSchema::new("/roll", "")
            .param(ParamSpec::one_of("die", &["d6", "d20"]).with_default("d6"));
        assert_eq!(schema.usage(), "/roll [d6|d20]");
    }
}

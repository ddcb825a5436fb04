//! Slash-command intent parser.
//!
//! Parsing never fails: anything that is not a complete, registered command
//! degrades to [`IntentKind::Plaintext`] so it can still reach the agent.

use std::collections::BTreeMap;

use {msgkit_common::ids, serde::Serialize, tracing::debug};

use crate::{
    roster::{Roster, RosterMember},
    schema::{COMMAND_SIGIL, CommandRegistry, ParamKind},
};

/// A bound parameter value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum ParamValue {
    Text(String),
    Number(f64),
    Enum(String),
    Address(String),
    Users(Vec<RosterMember>),
}

impl ParamValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) | Self::Enum(s) | Self::Address(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_users(&self) -> Option<&[RosterMember]> {
        match self {
            Self::Users(users) => Some(users),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IntentKind {
    Command,
    Plaintext,
}

/// Structured interpretation of a text message.
///
/// `trigger` is set exactly when `kind` is [`IntentKind::Command`], and then
/// every required parameter of the matched schema is bound.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParsedIntent {
    trigger: Option<String>,
    params: BTreeMap<String, ParamValue>,
    raw_text: String,
    kind: IntentKind,
}

impl ParsedIntent {
    pub fn plaintext(text: impl Into<String>) -> Self {
        Self {
            trigger: None,
            params: BTreeMap::new(),
            raw_text: text.into(),
            kind: IntentKind::Plaintext,
        }
    }

    pub fn trigger(&self) -> Option<&str> {
        self.trigger.as_deref()
    }

    pub fn kind(&self) -> IntentKind {
        self.kind
    }

    pub fn is_command(&self) -> bool {
        self.kind == IntentKind::Command
    }

    pub fn raw_text(&self) -> &str {
        &self.raw_text
    }

    pub fn params(&self) -> &BTreeMap<String, ParamValue> {
        &self.params
    }

    pub fn param(&self, name: &str) -> Option<&ParamValue> {
        self.params.get(name)
    }

    /// Text-like parameter value.
    pub fn text(&self, name: &str) -> Option<&str> {
        self.param(name).and_then(ParamValue::as_text)
    }

    /// Resolved members of a mention parameter; empty when unbound.
    pub fn users(&self, name: &str) -> &[RosterMember] {
        self.param(name)
            .and_then(ParamValue::as_users)
            .unwrap_or_default()
    }
}

/// Interpret `text` against `registry`, resolving mentions through `roster`.
pub fn parse(text: &str, registry: &CommandRegistry, roster: &Roster) -> ParsedIntent {
    let trimmed = text.trim();
    if !trimmed.starts_with(COMMAND_SIGIL) {
        return ParsedIntent::plaintext(text);
    }

    let tokens = tokenize(trimmed);
    let Some(&(_, head)) = tokens.first() else {
        return ParsedIntent::plaintext(text);
    };
    let Some(schema) = registry.lookup(head) else {
        debug!(trigger = head, "unregistered trigger, treating as plaintext");
        return ParsedIntent::plaintext(text);
    };

    let mut params = BTreeMap::new();

    // Named `name=value` tokens bind first and drop out of positional order.
    let mut rest: Vec<(usize, &str)> = Vec::with_capacity(tokens.len());
    for &(offset, token) in &tokens[1..] {
        if let Some((name, value)) = token.split_once('=')
            && let Some(spec) = schema
                .params
                .iter()
                .find(|s| s.kind.is_single_token() && s.name.eq_ignore_ascii_case(name))
            && !params.contains_key(&spec.name)
            && let Some(bound) = bind_token(&spec.kind, value)
        {
            params.insert(spec.name.clone(), bound);
            continue;
        }
        rest.push((offset, token));
    }

    let mut cursor = 0;
    for spec in &schema.params {
        if params.contains_key(&spec.name) {
            continue;
        }

        let bound = match &spec.kind {
            ParamKind::Text => match rest.get(cursor) {
                Some(&(offset, _)) => {
                    cursor = rest.len();
                    let remainder = unquote(trimmed[offset..].trim_end());
                    (!remainder.is_empty()).then(|| ParamValue::Text(remainder.to_string()))
                },
                None => None,
            },
            ParamKind::UserMentionList => {
                let mut users: Vec<RosterMember> = Vec::new();
                while let Some(&(_, token)) = rest.get(cursor) {
                    if ids::mention_handle(token).is_none() {
                        break;
                    }
                    cursor += 1;
                    match roster.find_by_mention(token) {
                        Some(member) if users.iter().all(|u| u.identifier != member.identifier) => {
                            users.push(member.clone());
                        },
                        Some(_) => {},
                        None => debug!(token, "dropping unresolved mention"),
                    }
                }
                (!users.is_empty()).then_some(ParamValue::Users(users))
            },
            kind => {
                let bound = rest.get(cursor).and_then(|&(_, token)| bind_token(kind, token));
                if bound.is_some() {
                    cursor += 1;
                }
                bound
            },
        };

        let bound = bound.or_else(|| {
            spec.default
                .as_deref()
                .and_then(|value| bind_default(&spec.kind, value, roster))
        });

        match bound {
            Some(value) => {
                params.insert(spec.name.clone(), value);
            },
            None if spec.required => {
                debug!(
                    trigger = %schema.trigger,
                    param = %spec.name,
                    "required parameter unbound, treating as plaintext"
                );
                return ParsedIntent::plaintext(text);
            },
            None => {},
        }
    }

    ParsedIntent {
        trigger: Some(schema.trigger.clone()),
        params,
        raw_text: text.to_string(),
        kind: IntentKind::Command,
    }
}

/// Whitespace tokens with their byte offsets into `text`.
fn tokenize(text: &str) -> Vec<(usize, &str)> {
    let mut tokens = Vec::new();
    let mut start = None;
    for (i, c) in text.char_indices() {
        if c.is_whitespace() {
            if let Some(s) = start.take() {
                tokens.push((s, &text[s..i]));
            }
        } else if start.is_none() {
            start = Some(i);
        }
    }
    if let Some(s) = start {
        tokens.push((s, &text[s..]));
    }
    tokens
}

fn unquote(text: &str) -> &str {
    for quote in ['"', '\''] {
        if text.len() >= 2
            && let Some(inner) = text
                .strip_prefix(quote)
                .and_then(|t| t.strip_suffix(quote))
        {
            return inner;
        }
    }
    text
}

fn bind_token(kind: &ParamKind, token: &str) -> Option<ParamValue> {
    match kind {
        ParamKind::Text => Some(ParamValue::Text(token.to_string())),
        ParamKind::Enum { values } => values
            .iter()
            .find(|v| v.eq_ignore_ascii_case(token))
            .map(|v| ParamValue::Enum(v.clone())),
        ParamKind::Number => token
            .parse::<f64>()
            .ok()
            .filter(|n| n.is_finite())
            .map(ParamValue::Number),
        ParamKind::Address => {
            ids::is_address(token).then(|| ParamValue::Address(ids::normalize(token)))
        },
        ParamKind::UserMentionList => None,
    }
}

fn bind_default(kind: &ParamKind, value: &str, roster: &Roster) -> Option<ParamValue> {
    match kind {
        ParamKind::UserMentionList => roster
            .find_by_mention(value)
            .map(|member| ParamValue::Users(vec![member.clone()])),
        _ => bind_token(kind, value),
    }
}

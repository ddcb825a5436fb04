use std::error::Error as StdError;

use msgkit_common::FromMessage;

pub type Result<T> = std::result::Result<T, Error>;

/// Reply used when an error has no more specific user-facing text.
pub const GENERIC_ERROR_REPLY: &str = "An error occurred while processing your request.";

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A known content type carried a payload its codec cannot read.
    #[error("malformed {content_type} payload: {source}")]
    Decode {
        content_type: String,
        #[source]
        source: serde_json::Error,
    },

    /// Re-entrant dispatch went past the configured depth.
    #[error("intent recursion limit of {limit} reached")]
    RecursionLimit { limit: usize },

    /// A collaborator needs a credential that is not configured.
    #[error("missing credential: {what}")]
    MissingCredential { what: String },

    #[error(transparent)]
    Transport(#[from] msgkit_channels::Error),

    #[error(transparent)]
    Commands(#[from] msgkit_commands::Error),

    #[error("{0}")]
    Message(String),

    #[error("{context}: {source}")]
    External {
        context: String,
        #[source]
        source: Box<dyn StdError + Send + Sync>,
    },
}

impl Error {
    #[must_use]
    pub fn message(message: impl Into<String>) -> Self {
        Self::Message(message.into())
    }

    #[must_use]
    pub fn missing_credential(what: impl Into<String>) -> Self {
        Self::MissingCredential { what: what.into() }
    }

    #[must_use]
    pub fn external(
        context: impl Into<String>,
        source: impl StdError + Send + Sync + 'static,
    ) -> Self {
        Self::External {
            context: context.into(),
            source: Box::new(source),
        }
    }

    /// Text safe to show in the conversation when a handler fails with this error.
    pub fn user_message(&self) -> String {
        match self {
            Self::Transport(msgkit_channels::Error::PermissionDenied { .. }) => {
                "No admin privileges".to_string()
            },
            Self::Transport(msgkit_channels::Error::Timeout { .. }) => {
                "The request timed out, please try again.".to_string()
            },
            Self::Transport(
                msgkit_channels::Error::Unavailable { .. }
                | msgkit_channels::Error::External { .. },
            ) => "The network is unavailable right now, please try again.".to_string(),
            Self::MissingCredential { what } => {
                format!("{what} is not configured, so I can't do that yet.")
            },
            Self::RecursionLimit { .. } => crate::RECURSION_LIMIT_REPLY.to_string(),
            _ => GENERIC_ERROR_REPLY.to_string(),
        }
    }
}

impl FromMessage for Error {
    fn from_message(message: String) -> Self {
        Self::Message(message)
    }
}

msgkit_common::impl_context!();

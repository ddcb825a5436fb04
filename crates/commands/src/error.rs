use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("duplicate command trigger: {trigger}")]
    DuplicateTrigger { trigger: String },

    #[error("invalid command trigger {trigger:?}: must start with '/' and contain no whitespace")]
    InvalidTrigger { trigger: String },

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

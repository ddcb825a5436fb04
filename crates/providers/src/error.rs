pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// No API key configured for the backend.
    #[error("missing credential: {what}")]
    MissingCredential { what: String },

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The backend answered with a non-success status.
    #[error("API error HTTP {status}: {message}")]
    Api { status: u16, message: String },

    /// The response carried no usable text.
    #[error("empty response from model")]
    EmptyResponse,

    #[error("generation timed out after {secs}s")]
    Timeout { secs: u64 },
}

impl Error {
    #[must_use]
    pub fn missing_credential(what: impl Into<String>) -> Self {
        Self::MissingCredential { what: what.into() }
    }

    pub fn is_missing_credential(&self) -> bool {
        matches!(self, Self::MissingCredential { .. })
    }
}

//! Text generation backends.
//!
//! The agent handler only sees [`TextGenerator`]; [`openai::OpenAiCompatGenerator`]
//! talks to any OpenAI-compatible chat-completions endpoint.

pub mod error;
pub mod openai;

use async_trait::async_trait;

pub use {
    error::{Error, Result},
    openai::OpenAiCompatGenerator,
};

/// Shared HTTP client so generators reuse connection pools.
pub fn shared_http_client() -> &'static reqwest::Client {
    static CLIENT: std::sync::LazyLock<reqwest::Client> =
        std::sync::LazyLock::new(reqwest::Client::new);
    &CLIENT
}

/// Result of one generation call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Generation {
    pub reply: String,
}

#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Model identifier, for logs.
    fn model(&self) -> &str;

    /// Answer `prompt` under `system_prompt`.
    async fn generate(&self, prompt: &str, system_prompt: &str) -> Result<Generation>;
}

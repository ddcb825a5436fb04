use std::time::Duration;

use {
    async_trait::async_trait,
    secrecy::{ExposeSecret, Secret},
    serde_json::json,
    tracing::{debug, trace, warn},
};

#[cfg(feature = "metrics")]
use msgkit_metrics::{agent as agent_metrics, counter, histogram, labels};

use crate::{Error, Generation, Result, TextGenerator};

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";
/// Environment variable named in missing-credential errors.
pub const API_KEY_ENV: &str = "OPENAI_API_KEY";

/// Chat-completions client for OpenAI and compatible servers.
pub struct OpenAiCompatGenerator {
    api_key: Option<Secret<String>>,
    model: String,
    base_url: String,
    timeout: Duration,
    client: &'static reqwest::Client,
}

impl std::fmt::Debug for OpenAiCompatGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiCompatGenerator")
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl OpenAiCompatGenerator {
    pub fn new(api_key: Option<Secret<String>>, model: String, base_url: String) -> Self {
        Self {
            api_key,
            model,
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout: Duration::from_secs(30),
            client: crate::shared_http_client(),
        }
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn has_credential(&self) -> bool {
        self.api_key
            .as_ref()
            .is_some_and(|key| !key.expose_secret().trim().is_empty())
    }

    async fn complete(&self, prompt: &str, system_prompt: &str) -> Result<Generation> {
        let api_key = self
            .api_key
            .as_ref()
            .filter(|key| !key.expose_secret().trim().is_empty())
            .ok_or_else(|| Error::missing_credential(API_KEY_ENV))?;

        let body = json!({
            "model": self.model,
            "messages": [
                {"role": "system", "content": system_prompt},
                {"role": "user", "content": prompt},
            ],
        });

        debug!(model = %self.model, prompt_len = prompt.len(), "chat completion request");
        trace!(body = %body, "chat completion request body");

        let http_resp = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .header(
                "Authorization",
                format!("Bearer {}", api_key.expose_secret()),
            )
            .timeout(self.timeout)
            .json(&body)
            .send()
            .await
            .map_err(|e| self.classify_transport_error(e))?;

        let status = http_resp.status();
        if !status.is_success() {
            let body_text = http_resp.text().await.unwrap_or_default();
            warn!(status = %status, model = %self.model, body = %body_text, "chat completion API error");
            return Err(Error::Api {
                status: status.as_u16(),
                message: body_text,
            });
        }

        let resp = http_resp
            .json::<serde_json::Value>()
            .await
            .map_err(|e| self.classify_transport_error(e))?;
        trace!(response = %resp, "chat completion raw response");

        let reply = resp["choices"][0]["message"]["content"]
            .as_str()
            .map(visible_text)
            .filter(|text| !text.is_empty())
            .ok_or(Error::EmptyResponse)?;

        Ok(Generation { reply })
    }

    fn classify_transport_error(&self, error: reqwest::Error) -> Error {
        if error.is_timeout() {
            Error::Timeout {
                secs: self.timeout.as_secs(),
            }
        } else {
            Error::Http(error)
        }
    }
}

#[async_trait]
impl TextGenerator for OpenAiCompatGenerator {
    fn model(&self) -> &str {
        &self.model
    }

    async fn generate(&self, prompt: &str, system_prompt: &str) -> Result<Generation> {
        #[cfg(feature = "metrics")]
        let start = std::time::Instant::now();

        let result = self.complete(prompt, system_prompt).await;

        #[cfg(feature = "metrics")]
        {
            counter!(agent_metrics::COMPLETIONS_TOTAL, labels::MODEL => self.model.clone())
                .increment(1);
            if result.is_err() {
                counter!(agent_metrics::COMPLETION_ERRORS_TOTAL, labels::MODEL => self.model.clone())
                    .increment(1);
            }
            histogram!(agent_metrics::COMPLETION_DURATION_SECONDS, labels::MODEL => self.model.clone())
                .record(start.elapsed().as_secs_f64());
        }

        result
    }
}

/// Drop `<think>…</think>` reasoning blocks some models emit, then trim.
fn visible_text(content: &str) -> String {
    let mut visible = String::new();
    let mut rest = content;
    while let Some((before, after)) = rest.split_once("<think>") {
        visible.push_str(before);
        match after.split_once("</think>") {
            Some((_, tail)) => rest = tail,
            None => {
                rest = "";
                break;
            },
        }
    }
    visible.push_str(rest);
    visible.trim().to_string()
}

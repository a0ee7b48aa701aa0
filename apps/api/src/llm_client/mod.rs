//! LLM Client: the single point of entry for Claude API calls in the ranker.
//!
//! Only the optional LLM candidate scorer talks to the model, and only through
//! `LlmClient::call_json`. Constructed at startup when `ANTHROPIC_API_KEY` is set.
//!
//! Transient failures (transport errors, 429, 5xx) are retried with exponential
//! backoff, but never past the caller's deadline.
use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use thiserror::Error;
use tokio::time::Instant;
use tracing::{debug, warn};

pub mod prompts;

const ANTHROPIC_API_URL: &str = "https://api.anthropic.com/v1/messages";
const ANTHROPIC_VERSION: &str = "2023-06-01";
/// Hardcoded so scores stay comparable across deployments.
pub const MODEL: &str = "claude-sonnet-4-5";
/// Assessments are a small JSON object.
const MAX_TOKENS: u32 = 1024;
const MAX_ATTEMPTS: u32 = 3;
const BASE_BACKOFF: Duration = Duration::from_millis(500);

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("LLM returned no text content")]
    EmptyContent,
}

impl LlmError {
    /// Whether another attempt could succeed.
    fn is_transient(&self) -> bool {
        match self {
            Self::Http(e) => e.is_timeout() || e.is_connect() || e.is_request(),
            Self::Api { status, .. } => {
                *status == StatusCode::TOO_MANY_REQUESTS.as_u16() || *status >= 500
            }
            Self::Parse(_) | Self::EmptyContent => false,
        }
    }
}

// Messages API wire types.

#[derive(Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    system: &'a str,
    messages: [UserMessage<'a>; 1],
}

#[derive(Serialize)]
struct UserMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
    usage: Usage,
}

#[derive(Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    kind: String,
    text: Option<String>,
}

#[derive(Deserialize)]
struct Usage {
    input_tokens: u32,
    output_tokens: u32,
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: String,
}

impl MessagesResponse {
    fn first_text(&self) -> Option<&str> {
        self.content
            .iter()
            .find(|block| block.kind == "text")
            .and_then(|block| block.text.as_deref())
    }
}

#[derive(Clone)]
pub struct LlmClient {
    client: Client,
    api_key: String,
}

impl LlmClient {
    /// `timeout` bounds every individual HTTP attempt.
    pub fn new(api_key: String, timeout: Duration) -> Result<Self, LlmError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client, api_key })
    }

    /// Sends `prompt` and deserializes the text reply as JSON, tolerating code fences.
    /// Gives up with the last error once the next backoff would end past `deadline`.
    pub async fn call_json<T: DeserializeOwned>(
        &self,
        prompt: &str,
        system: &str,
        deadline: Instant,
    ) -> Result<T, LlmError> {
        let request = MessagesRequest {
            model: MODEL,
            max_tokens: MAX_TOKENS,
            system,
            messages: [UserMessage {
                role: "user",
                content: prompt,
            }],
        };

        let response = self.send_with_retry(&request, deadline).await?;
        let text = response.first_text().ok_or(LlmError::EmptyContent)?;
        Ok(serde_json::from_str(strip_json_fences(text))?)
    }

    async fn send_with_retry(
        &self,
        request: &MessagesRequest<'_>,
        deadline: Instant,
    ) -> Result<MessagesResponse, LlmError> {
        let mut attempt = 0;
        loop {
            let error = match self.send_once(request).await {
                Ok(response) => return Ok(response),
                Err(e) => e,
            };

            attempt += 1;
            if !error.is_transient() || attempt >= MAX_ATTEMPTS {
                return Err(error);
            }
            let Some(delay) = backoff_within(attempt, Instant::now(), deadline) else {
                warn!(attempt, error = %error, "LLM call failed, no time left to retry");
                return Err(error);
            };

            warn!(
                attempt,
                error = %error,
                delay_ms = delay.as_millis() as u64,
                "LLM call failed, retrying"
            );
            tokio::time::sleep(delay).await;
        }
    }

    async fn send_once(&self, request: &MessagesRequest<'_>) -> Result<MessagesResponse, LlmError> {
        let response = self
            .client
            .post(ANTHROPIC_API_URL)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ErrorEnvelope>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);
            return Err(LlmError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let parsed: MessagesResponse = response.json().await?;
        debug!(
            input_tokens = parsed.usage.input_tokens,
            output_tokens = parsed.usage.output_tokens,
            "LLM call succeeded"
        );
        Ok(parsed)
    }
}

/// Backoff before retry number `attempt` (1-based): 500ms, 1s, 2s, ...
/// `None` when sleeping would reach `deadline`.
fn backoff_within(attempt: u32, now: Instant, deadline: Instant) -> Option<Duration> {
    let delay = BASE_BACKOFF * 2_u32.pow(attempt.saturating_sub(1));
    (now + delay < deadline).then_some(delay)
}

/// Strips ```json ... ``` or ``` ... ``` code fences from LLM output.
fn strip_json_fences(text: &str) -> &str {
    let text = text.trim();
    let Some(inner) = text
        .strip_prefix("```json")
        .or_else(|| text.strip_prefix("```"))
    else {
        return text;
    };
    let inner = inner.trim_start();
    inner.strip_suffix("```").map(str::trim).unwrap_or(inner)
}

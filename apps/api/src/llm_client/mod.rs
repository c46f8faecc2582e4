/// LLM Client: the single point of entry for all model calls in the service.
///
/// Callers depend on the [`AiClient`] trait only. `AnthropicClient` talks to the
/// Messages API; `MockAiClient` returns canned text and never touches the
/// network. Both are carried in `AppState` as `Arc<dyn AiClient>`.
///
/// No retries: a failed call is classified once and surfaced to the caller.
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::models::chat::{ChatMessage, TokenUsage};

pub mod mock;

pub use mock::MockAiClient;

const ANTHROPIC_API_URL: &str = "https://api.anthropic.com/v1/messages";
const ANTHROPIC_VERSION: &str = "2023-06-01";
pub const DEFAULT_MODEL: &str = "claude-sonnet-4-20250514";
const MAX_TOKENS: u32 = 4096;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("authentication rejected (status {status}): {message}")]
    Authentication { status: u16, message: String },

    #[error("rate limited: {message}")]
    RateLimited { message: String },

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),
}

/// The four failure classes callers are allowed to see.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    Authentication,
    RateLimit,
    Provider,
    Unexpected,
}

impl LlmError {
    /// Classifies a non-success HTTP response from the provider.
    pub fn from_status(status: StatusCode, message: String) -> Self {
        match status {
            StatusCode::UNAUTHORIZED => LlmError::Authentication {
                status: status.as_u16(),
                message,
            },
            StatusCode::TOO_MANY_REQUESTS => LlmError::RateLimited { message },
            _ => LlmError::Api {
                status: status.as_u16(),
                message,
            },
        }
    }

    pub fn kind(&self) -> FailureKind {
        match self {
            LlmError::Authentication { .. } => FailureKind::Authentication,
            LlmError::RateLimited { .. } => FailureKind::RateLimit,
            LlmError::Api { .. } => FailureKind::Provider,
            LlmError::Http(_) | LlmError::Parse(_) => FailureKind::Unexpected,
        }
    }

    /// Client-facing message. Never includes provider response detail.
    pub fn public_message(&self) -> &'static str {
        match self.kind() {
            FailureKind::Authentication => "AI service authentication failed",
            FailureKind::RateLimit => "AI service rate limit exceeded, please try again later",
            FailureKind::Provider => "AI service error",
            FailureKind::Unexpected => "Unexpected AI service error",
        }
    }
}

/// Generated text plus what it cost.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AiResponse {
    pub content: String,
    pub model: String,
    pub usage: TokenUsage,
}

/// Generate text from a system prompt and a role-tagged conversation.
/// Implement this to swap providers without touching the chat service.
#[async_trait]
pub trait AiClient: Send + Sync {
    async fn generate(
        &self,
        system_prompt: &str,
        messages: &[ChatMessage],
    ) -> Result<AiResponse, LlmError>;

    fn model(&self) -> &str;
}

#[derive(Debug, Serialize)]
struct AnthropicRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    system: &'a str,
    messages: &'a [ChatMessage],
}

#[derive(Debug, Deserialize)]
struct AnthropicResponse {
    content: Vec<ContentBlock>,
    usage: TokenUsage,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    block_type: String,
    text: Option<String>,
}

impl AnthropicResponse {
    /// Concatenates every text block, in order.
    fn text(&self) -> String {
        self.content
            .iter()
            .filter(|b| b.block_type == "text")
            .filter_map(|b| b.text.as_deref())
            .collect()
    }
}

#[derive(Debug, Deserialize)]
struct AnthropicError {
    error: AnthropicErrorBody,
}

#[derive(Debug, Deserialize)]
struct AnthropicErrorBody {
    message: String,
}

/// Anthropic Messages API client.
#[derive(Clone)]
pub struct AnthropicClient {
    client: Client,
    api_key: String,
    model: String,
}

impl AnthropicClient {
    pub fn new(api_key: String, model: String) -> Self {
        info!("Initialized Anthropic client with model {model}");
        Self {
            client: Client::builder()
                .timeout(std::time::Duration::from_secs(120))
                .build()
                .expect("Failed to build HTTP client"),
            api_key,
            model,
        }
    }
}

#[async_trait]
impl AiClient for AnthropicClient {
    async fn generate(
        &self,
        system_prompt: &str,
        messages: &[ChatMessage],
    ) -> Result<AiResponse, LlmError> {
        let request_body = AnthropicRequest {
            model: &self.model,
            max_tokens: MAX_TOKENS,
            system: system_prompt,
            messages,
        };

        let started = std::time::Instant::now();
        let response = self
            .client
            .post(ANTHROPIC_API_URL)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("content-type", "application/json")
            .json(&request_body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!("LLM API returned {}: {}", status, body);
            // Try to parse error message
            let message = serde_json::from_str::<AnthropicError>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);
            return Err(LlmError::from_status(status, message));
        }

        let body = response.bytes().await?;
        let parsed: AnthropicResponse = serde_json::from_slice(&body)?;

        debug!(
            model = %self.model,
            input_tokens = parsed.usage.input_tokens,
            output_tokens = parsed.usage.output_tokens,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "LLM call succeeded"
        );

        Ok(AiResponse {
            content: parsed.text(),
            model: self.model.clone(),
            usage: parsed.usage,
        })
    }

    fn model(&self) -> &str {
        &self.model
    }
}

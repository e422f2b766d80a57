//! Minimal OpenAI-compatible chat completion client
//!
//! A clean client for `/chat/completions` with no domain-specific logic.
//! Works against OpenAI, Groq, and any other provider exposing the same
//! wire format; point it elsewhere with [`OpenAIClient::with_base_url`].
//!
//! # Example
//!
//! ```rust,ignore
//! use openai_client::{OpenAIClient, ChatRequest, Message};
//!
//! let client = OpenAIClient::groq_from_env()?;
//!
//! let response = client.chat_completion(
//!     ChatRequest::new("llama-3.3-70b-versatile")
//!         .message(Message::system("Answer in one sentence."))
//!         .message(Message::user("Hello!")),
//! ).await?;
//! ```
//!
//! [`OpenAIClient::chat_completion_stream`] returns the same answer as a
//! stream of [`StreamEvent`]s.

pub mod error;
pub mod streaming;
pub mod types;

pub use error::{OpenAIError, Result};
pub use streaming::{ChatCompletionStream, StreamEvent};
pub use types::*;

use std::time::Duration;

use reqwest::{Client, StatusCode};
use tracing::{debug, warn};

/// Base URL of the OpenAI API.
pub const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

/// Base URL of Groq's OpenAI-compatible API.
pub const GROQ_BASE_URL: &str = "https://api.groq.com/openai/v1";

/// OpenAI-compatible chat completion client.
#[derive(Clone)]
pub struct OpenAIClient {
    http_client: Client,
    api_key: String,
    base_url: String,
}

impl OpenAIClient {
    /// Create a new client against the OpenAI API.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            http_client: Client::new(),
            api_key: api_key.into(),
            base_url: OPENAI_BASE_URL.to_string(),
        }
    }

    /// Create from environment variable `OPENAI_API_KEY`.
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("OPENAI_API_KEY")
            .map_err(|_| OpenAIError::Config("OPENAI_API_KEY not set".into()))?;
        Ok(Self::new(api_key))
    }

    /// Create a Groq client from environment variable `GROQ_API_KEY`.
    pub fn groq_from_env() -> Result<Self> {
        let api_key = std::env::var("GROQ_API_KEY")
            .map_err(|_| OpenAIError::Config("GROQ_API_KEY not set".into()))?;
        Ok(Self::new(api_key).with_base_url(GROQ_BASE_URL))
    }

    /// Set a custom base URL (Groq, Azure, proxies, etc.).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    /// Set a per-request timeout on the underlying HTTP client.
    pub fn with_timeout(mut self, timeout: Duration) -> Result<Self> {
        self.http_client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| OpenAIError::Config(e.to_string()))?;
        Ok(self)
    }

    /// Get the API key.
    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    /// Get the base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Chat completion.
    ///
    /// Send messages to the chat completion API and get a response.
    pub async fn chat_completion(&self, request: ChatRequest) -> Result<ChatResponse> {
        let start = std::time::Instant::now();

        let response = self
            .http_client
            .post(format!("{}/chat/completions", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                warn!(error = %e, "Chat completion request failed");
                OpenAIError::from_transport(e)
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            warn!(status = %status, error = %error_text, "Chat completion API error");
            return Err(status_error(status, error_text));
        }

        let chat_response: types::ChatResponseRaw = response
            .json()
            .await
            .map_err(|e| OpenAIError::Parse(e.to_string()))?;

        let content = chat_response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| OpenAIError::Api("No content in completion response".into()))?;

        debug!(
            model = %request.model,
            duration_ms = start.elapsed().as_millis(),
            "Chat completion"
        );

        Ok(ChatResponse {
            content,
            usage: chat_response.usage,
        })
    }

    /// Streaming chat completion.
    ///
    /// Sends the request with `stream: true` and yields text deltas as the
    /// provider emits them. Status errors are reported before any delta.
    pub async fn chat_completion_stream(&self, request: ChatRequest) -> Result<ChatCompletionStream> {
        let mut body = serde_json::to_value(&request)
            .map_err(|e| OpenAIError::Parse(format!("Failed to serialize request: {}", e)))?;
        body["stream"] = serde_json::Value::Bool(true);

        let response = self
            .http_client
            .post(format!("{}/chat/completions", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                warn!(error = %e, "Streaming request failed");
                OpenAIError::from_transport(e)
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            warn!(status = %status, error = %error_text, "Streaming API error");
            return Err(status_error(status, error_text));
        }

        debug!(model = %request.model, "Streaming chat completion");
        Ok(ChatCompletionStream::new(response.bytes_stream()))
    }

    /// Single-prompt completion: one user message in, text out.
    pub async fn complete(&self, model: &str, prompt: &str) -> Result<String> {
        let request = ChatRequest::new(model).message(Message::user(prompt));
        Ok(self.chat_completion(request).await?.content)
    }
}

/// Map a non-2xx status to the matching error variant.
fn status_error(status: StatusCode, body: String) -> OpenAIError {
    match status {
        StatusCode::TOO_MANY_REQUESTS => OpenAIError::RateLimited(body),
        StatusCode::REQUEST_TIMEOUT | StatusCode::GATEWAY_TIMEOUT => OpenAIError::Timeout(body),
        _ => OpenAIError::Api(format!("{}: {}", status, body)),
    }
}

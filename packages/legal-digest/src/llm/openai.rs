//! OpenAI-compatible implementation of the Llm trait.
//!
//! Works against any `/chat/completions` provider; Groq is the default
//! target.
//!
//! # Example
//!
//! ```rust,ignore
//! use legal_digest::llm::OpenAiLlm;
//!
//! let llm = OpenAiLlm::groq_from_env()?.with_max_completion_tokens(1500);
//! let digest = Orchestrator::new(llm, PipelineConfig::default())?;
//! ```

use async_trait::async_trait;
use futures::StreamExt;
use openai_client::{ChatRequest, Message, OpenAIClient, OpenAIError, StreamEvent};
use std::time::Duration;

use crate::error::{DigestError, ModelError, ModelResult, Result};
use crate::traits::llm::{DeltaFn, Llm};

/// Chat-completion backed LLM.
///
/// Pipeline prompts are sent as a single user message. [`Llm::chat`] sends
/// a system message and a user message, and streams when given a delta
/// callback.
#[derive(Clone)]
pub struct OpenAiLlm {
    client: OpenAIClient,
    temperature: f32,
    top_p: f32,
    max_completion_tokens: u32,
}

impl OpenAiLlm {
    pub fn new(client: OpenAIClient) -> Self {
        Self {
            client,
            temperature: 1.0,
            top_p: 1.0,
            max_completion_tokens: 1000,
        }
    }

    /// Groq client from `GROQ_API_KEY`.
    pub fn groq_from_env() -> Result<Self> {
        OpenAIClient::groq_from_env()
            .map(Self::new)
            .map_err(|e| DigestError::invalid_config(e.to_string()))
    }

    /// Set the HTTP-level request timeout.
    pub fn with_http_timeout(mut self, timeout: Duration) -> Result<Self> {
        self.client = self
            .client
            .with_timeout(timeout)
            .map_err(|e| DigestError::invalid_config(e.to_string()))?;
        Ok(self)
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_top_p(mut self, top_p: f32) -> Self {
        self.top_p = top_p;
        self
    }

    pub fn with_max_completion_tokens(mut self, tokens: u32) -> Self {
        self.max_completion_tokens = tokens;
        self
    }

    pub fn client(&self) -> &OpenAIClient {
        &self.client
    }
}

impl From<OpenAIError> for ModelError {
    fn from(err: OpenAIError) -> Self {
        match err {
            OpenAIError::RateLimited(msg) => ModelError::rate_limited(msg),
            OpenAIError::Timeout(msg) => ModelError::timeout(msg),
            other => ModelError::other(other.to_string()),
        }
    }
}

impl OpenAiLlm {
    fn request(&self, model: &str, messages: impl IntoIterator<Item = Message>) -> ChatRequest {
        messages
            .into_iter()
            .fold(ChatRequest::new(model), ChatRequest::message)
            .temperature(self.temperature)
            .top_p(self.top_p)
            .max_completion_tokens(self.max_completion_tokens)
    }
}

#[async_trait]
impl Llm for OpenAiLlm {
    async fn complete(&self, prompt: &str, model: &str) -> ModelResult<String> {
        let request = self.request(model, [Message::user(prompt)]);
        let response = self.client.chat_completion(request).await?;
        Ok(response.content)
    }

    async fn chat(
        &self,
        system: &str,
        user: &str,
        model: &str,
        on_delta: Option<&DeltaFn>,
    ) -> ModelResult<String> {
        let request = self.request(model, [Message::system(system), Message::user(user)]);

        let Some(on_delta) = on_delta else {
            return Ok(self.client.chat_completion(request).await?.content);
        };

        let mut stream = self.client.chat_completion_stream(request).await?;
        let mut text = String::new();
        while let Some(event) = stream.next().await {
            match event? {
                StreamEvent::Delta(delta) if delta.is_empty() => {}
                StreamEvent::Delta(delta) => {
                    on_delta(&delta);
                    text.push_str(&delta);
                }
                StreamEvent::Done => break,
            }
        }
        Ok(text)
    }
}

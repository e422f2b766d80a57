//! Retry with exponential backoff for rate-limited calls.

use async_trait::async_trait;
use tracing::warn;

use crate::error::ModelResult;
use crate::traits::llm::{DeltaFn, Llm};
use crate::types::config::RetryConfig;

/// Retries calls that fail with a rate-limit error.
///
/// Other failures, and the last rate-limit failure once attempts run out,
/// are returned unchanged.
#[derive(Clone)]
pub struct RetryingLlm<L: Llm> {
    inner: L,
    config: RetryConfig,
}

impl<L: Llm> RetryingLlm<L> {
    pub fn new(llm: L, config: RetryConfig) -> Self {
        Self { inner: llm, config }
    }

    pub fn inner(&self) -> &L {
        &self.inner
    }
}

impl<L: Llm> RetryingLlm<L> {
    /// Back off and return true when `result` is a retryable failure.
    async fn backoff(&self, result: &ModelResult<String>, attempt: u32) -> bool {
        let max_attempts = self.config.max_attempts.max(1);
        match result {
            Err(e) if e.is_rate_limited() && attempt < max_attempts => {
                let delay = self.config.delay_for(attempt);
                warn!(
                    attempt,
                    max_attempts,
                    delay_ms = delay.as_millis() as u64,
                    error = %e,
                    "Rate limited, backing off"
                );
                tokio::time::sleep(delay).await;
                true
            }
            _ => false,
        }
    }
}

#[async_trait]
impl<L: Llm> Llm for RetryingLlm<L> {
    async fn complete(&self, prompt: &str, model: &str) -> ModelResult<String> {
        let mut attempt = 1;
        loop {
            let result = self.inner.complete(prompt, model).await;
            if !self.backoff(&result, attempt).await {
                return result;
            }
            attempt += 1;
        }
    }

    // A 429 arrives before any delta, so a retried stream never repeats text.
    async fn chat(
        &self,
        system: &str,
        user: &str,
        model: &str,
        on_delta: Option<&DeltaFn>,
    ) -> ModelResult<String> {
        let mut attempt = 1;
        loop {
            let result = self.inner.chat(system, user, model, on_delta).await;
            if !self.backoff(&result, attempt).await {
                return result;
            }
            attempt += 1;
        }
    }
}

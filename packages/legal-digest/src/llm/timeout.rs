//! Per-call deadline.

use async_trait::async_trait;
use std::time::Duration;

use crate::error::{ModelError, ModelResult};
use crate::traits::llm::{DeltaFn, Llm};

/// Fails a call with a timeout error once `timeout` elapses.
#[derive(Clone)]
pub struct TimeoutLlm<L: Llm> {
    inner: L,
    timeout: Duration,
}

impl<L: Llm> TimeoutLlm<L> {
    pub fn new(llm: L, timeout: Duration) -> Self {
        Self { inner: llm, timeout }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    fn elapsed(&self) -> ModelError {
        ModelError::timeout(format!("no response within {:?}", self.timeout))
    }
}

#[async_trait]
impl<L: Llm> Llm for TimeoutLlm<L> {
    async fn complete(&self, prompt: &str, model: &str) -> ModelResult<String> {
        tokio::time::timeout(self.timeout, self.inner.complete(prompt, model))
            .await
            .map_err(|_| self.elapsed())?
    }

    async fn chat(
        &self,
        system: &str,
        user: &str,
        model: &str,
        on_delta: Option<&DeltaFn>,
    ) -> ModelResult<String> {
        tokio::time::timeout(self.timeout, self.inner.chat(system, user, model, on_delta))
            .await
            .map_err(|_| self.elapsed())?
    }
}

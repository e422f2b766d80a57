//! Testing utilities including mock implementations.
//!
//! These are useful for testing applications that use the digest library
//! without making real LLM calls.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use crate::error::{ModelError, ModelResult};
use crate::traits::llm::{DeltaFn, Llm};

type Responder = Arc<dyn Fn(&str) -> String + Send + Sync>;

/// A mock LLM for testing.
///
/// Response resolution, first match wins:
/// 1. a scheduled failure for this call number
/// 2. a canned response whose key is contained in the prompt
/// 3. the responder closure
/// 4. `"mock response #{n}"`
///
/// Clones share configuration and call history.
#[derive(Clone, Default)]
pub struct MockLlm {
    /// Canned responses keyed by prompt substring
    responses: Arc<RwLock<Vec<(String, String)>>>,

    responder: Option<Responder>,

    /// Artificial latency keyed by prompt substring
    delays: Arc<RwLock<Vec<(String, Duration)>>>,

    /// Failures keyed by 1-based call number
    failures: Arc<RwLock<HashMap<usize, ModelError>>>,

    /// Every call fails with this error once set
    always_fail: Arc<RwLock<Option<ModelError>>>,

    /// Call tracking for assertions
    calls: Arc<RwLock<Vec<MockLlmCall>>>,
}

/// Record of a call made to the mock LLM.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockLlmCall {
    /// The prompt, or the user message of a chat call
    pub prompt: String,
    /// System message of a chat call
    pub system: Option<String>,
    pub model: String,
}

impl MockLlm {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer prompts containing `needle` with `response`.
    pub fn with_response_for(self, needle: impl Into<String>, response: impl Into<String>) -> Self {
        self.responses
            .write()
            .unwrap()
            .push((needle.into(), response.into()));
        self
    }

    /// Compute responses from the prompt.
    pub fn with_responder<F>(mut self, responder: F) -> Self
    where
        F: Fn(&str) -> String + Send + Sync + 'static,
    {
        self.responder = Some(Arc::new(responder));
        self
    }

    /// Sleep before answering prompts containing `needle`.
    pub fn with_delay_for(self, needle: impl Into<String>, delay: Duration) -> Self {
        self.delays.write().unwrap().push((needle.into(), delay));
        self
    }

    /// Fail the `n`th call (1-based) with `error`.
    pub fn fail_on_call(self, n: usize, error: ModelError) -> Self {
        self.failures.write().unwrap().insert(n, error);
        self
    }

    /// Fail the first `n` calls with `error`.
    pub fn fail_first(self, n: usize, error: ModelError) -> Self {
        {
            let mut failures = self.failures.write().unwrap();
            for call in 1..=n {
                failures.insert(call, error.clone());
            }
        }
        self
    }

    /// Fail every call with `error`.
    pub fn fail_always(self, error: ModelError) -> Self {
        *self.always_fail.write().unwrap() = Some(error);
        self
    }

    /// Get all calls made to this mock.
    pub fn calls(&self) -> Vec<MockLlmCall> {
        self.calls.read().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.read().unwrap().len()
    }

    /// Prompts in call order.
    pub fn prompts(&self) -> Vec<String> {
        self.calls
            .read()
            .unwrap()
            .iter()
            .map(|c| c.prompt.clone())
            .collect()
    }

    /// Clear call history.
    pub fn clear_calls(&self) {
        self.calls.write().unwrap().clear();
    }

    fn delay_for(&self, prompt: &str) -> Option<Duration> {
        self.delays
            .read()
            .unwrap()
            .iter()
            .find(|(needle, _)| prompt.contains(needle.as_str()))
            .map(|(_, delay)| *delay)
    }

    fn respond(&self, prompt: &str, call_number: usize) -> String {
        let canned = self
            .responses
            .read()
            .unwrap()
            .iter()
            .find(|(needle, _)| prompt.contains(needle.as_str()))
            .map(|(_, response)| response.clone());

        canned
            .or_else(|| self.responder.as_ref().map(|f| f(prompt)))
            .unwrap_or_else(|| format!("mock response #{}", call_number))
    }

    async fn call(&self, system: Option<&str>, prompt: &str, model: &str) -> ModelResult<String> {
        let call_number = {
            let mut calls = self.calls.write().unwrap();
            calls.push(MockLlmCall {
                prompt: prompt.to_string(),
                system: system.map(str::to_string),
                model: model.to_string(),
            });
            calls.len()
        };

        if let Some(delay) = self.delay_for(prompt) {
            tokio::time::sleep(delay).await;
        }

        if let Some(error) = self.always_fail.read().unwrap().clone() {
            return Err(error);
        }
        if let Some(error) = self.failures.read().unwrap().get(&call_number).cloned() {
            return Err(error);
        }

        Ok(self.respond(prompt, call_number))
    }
}

#[async_trait]
impl Llm for MockLlm {
    async fn complete(&self, prompt: &str, model: &str) -> ModelResult<String> {
        self.call(None, prompt, model).await
    }

    /// Matches responses against the user message and streams the answer
    /// word by word.
    async fn chat(
        &self,
        system: &str,
        user: &str,
        model: &str,
        on_delta: Option<&DeltaFn>,
    ) -> ModelResult<String> {
        let text = self.call(Some(system), user, model).await?;
        if let Some(on_delta) = on_delta {
            for piece in text.split_inclusive(' ') {
                on_delta(piece);
            }
        }
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_default_responses_are_numbered() {
        let llm = MockLlm::new();

        assert_eq!(llm.complete("a", "m").await.unwrap(), "mock response #1");
        assert_eq!(llm.complete("b", "m").await.unwrap(), "mock response #2");
        assert_eq!(llm.prompts(), vec!["a", "b"]);
    }

    #[tokio::test]
    async fn test_canned_response_beats_responder() {
        let llm = MockLlm::new()
            .with_responder(|p| p.to_uppercase())
            .with_response_for("lease", "canned");

        assert_eq!(llm.complete("the lease", "m").await.unwrap(), "canned");
        assert_eq!(llm.complete("other", "m").await.unwrap(), "OTHER");
    }

    #[tokio::test]
    async fn test_scheduled_failures_are_recorded() {
        let llm = MockLlm::new().fail_first(2, ModelError::rate_limited("slow down"));

        assert!(llm.complete("x", "m").await.unwrap_err().is_rate_limited());
        assert!(llm.complete("x", "m").await.is_err());
        assert!(llm.complete("x", "m").await.is_ok());
        assert_eq!(llm.call_count(), 3);
    }

    #[tokio::test]
    async fn test_clones_share_history() {
        let llm = MockLlm::new();
        let clone = llm.clone();

        clone.complete("x", "m").await.unwrap();

        assert_eq!(llm.call_count(), 1);
        llm.clear_calls();
        assert_eq!(clone.call_count(), 0);
    }

    #[tokio::test]
    async fn test_chat_records_system_and_streams_words() {
        let llm = MockLlm::new().with_response_for("term", "Two years from signing.");
        let pieces = Arc::new(RwLock::new(Vec::new()));
        let sink = pieces.clone();
        let on_delta = move |delta: &str| sink.write().unwrap().push(delta.to_string());

        let answer = llm
            .chat("Be careful.", "What is the term?", "m", Some(&on_delta))
            .await
            .unwrap();

        assert_eq!(answer, "Two years from signing.");
        assert_eq!(
            *pieces.read().unwrap(),
            vec!["Two ", "years ", "from ", "signing."]
        );
        let call = &llm.calls()[0];
        assert_eq!(call.system.as_deref(), Some("Be careful."));
        assert_eq!(call.prompt, "What is the term?");
    }
}

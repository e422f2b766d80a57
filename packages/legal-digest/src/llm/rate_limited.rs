//! Rate-limited LLM wrapper.
//!
//! Wraps any Llm implementation with rate limiting using the governor crate.

use async_trait::async_trait;
use governor::{Quota, RateLimiter};
use std::num::NonZeroU32;
use std::sync::Arc;
use tracing::trace;

use crate::error::{DigestError, ModelResult, Result};
use crate::traits::llm::{DeltaFn, Llm};

type DefaultRateLimiter = RateLimiter<
    governor::state::NotKeyed,
    governor::state::InMemoryState,
    governor::clock::DefaultClock,
>;

/// An LLM wrapper that enforces a shared request rate.
///
/// Every call, including retries issued by an outer wrapper, waits for one
/// permit. Clones share the same limiter.
#[derive(Clone)]
pub struct RateLimitedLlm<L: Llm> {
    inner: L,
    limiter: Arc<DefaultRateLimiter>,
}

impl<L: Llm> RateLimitedLlm<L> {
    /// Create a new rate-limited LLM.
    ///
    /// # Arguments
    /// * `llm` - The underlying LLM to wrap
    /// * `requests_per_minute` - Sustained rate
    /// * `burst` - Calls allowed back-to-back before the rate applies
    pub fn new(llm: L, requests_per_minute: u32, burst: u32) -> Result<Self> {
        let rpm = NonZeroU32::new(requests_per_minute)
            .ok_or_else(|| DigestError::invalid_config("requests_per_minute must be > 0"))?;
        let burst = NonZeroU32::new(burst)
            .ok_or_else(|| DigestError::invalid_config("burst must be > 0"))?;

        Ok(Self::with_quota(llm, Quota::per_minute(rpm).allow_burst(burst)))
    }

    /// Create with a custom quota.
    pub fn with_quota(llm: L, quota: Quota) -> Self {
        Self {
            inner: llm,
            limiter: Arc::new(RateLimiter::direct(quota)),
        }
    }

    pub fn inner(&self) -> &L {
        &self.inner
    }
}

#[async_trait]
impl<L: Llm> Llm for RateLimitedLlm<L> {
    async fn complete(&self, prompt: &str, model: &str) -> ModelResult<String> {
        self.limiter.until_ready().await;
        trace!(model, "Rate limit permit acquired");
        self.inner.complete(prompt, model).await
    }

    async fn chat(
        &self,
        system: &str,
        user: &str,
        model: &str,
        on_delta: Option<&DeltaFn>,
    ) -> ModelResult<String> {
        self.limiter.until_ready().await;
        trace!(model, "Rate limit permit acquired");
        self.inner.chat(system, user, model, on_delta).await
    }
}

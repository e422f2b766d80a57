//! LLM wrappers and provider implementations.
//!
//! Wrappers compose around any [`Llm`]:
//! - [`TimeoutLlm`] - per-call deadline
//! - [`RateLimitedLlm`] - shared token bucket, one permit per attempt
//! - [`RetryingLlm`] - exponential backoff on rate-limit errors
//!
//! [`guarded`] stacks all three from a [`PipelineConfig`].

mod rate_limited;
mod retry;
mod timeout;

#[cfg(feature = "openai")]
mod openai;

pub use rate_limited::RateLimitedLlm;
pub use retry::RetryingLlm;
pub use timeout::TimeoutLlm;

#[cfg(feature = "openai")]
pub use openai::OpenAiLlm;

use std::time::Duration;

use crate::error::Result;
use crate::traits::llm::Llm;
use crate::types::config::{PipelineConfig, RetryConfig};

/// The full guard stack: retry outside, rate limit per attempt, deadline per call.
pub type GuardedLlm<L> = RetryingLlm<RateLimitedLlm<TimeoutLlm<L>>>;

/// Wrap `llm` with the timeout, rate limit and retry settings of `config`.
pub fn guarded<L: Llm>(llm: L, config: &PipelineConfig) -> Result<GuardedLlm<L>> {
    Ok(llm
        .with_timeout(config.call_timeout())
        .rate_limited(config.requests_per_minute, config.burst)?
        .with_retry(config.retry.clone()))
}

/// Extension trait for composing wrappers.
pub trait LlmExt: Llm + Sized {
    fn with_timeout(self, timeout: Duration) -> TimeoutLlm<Self> {
        TimeoutLlm::new(self, timeout)
    }

    fn rate_limited(self, requests_per_minute: u32, burst: u32) -> Result<RateLimitedLlm<Self>> {
        RateLimitedLlm::new(self, requests_per_minute, burst)
    }

    fn with_retry(self, config: RetryConfig) -> RetryingLlm<Self> {
        RetryingLlm::new(self, config)
    }
}

impl<L: Llm + Sized> LlmExt for L {}

//! Configuration types for chunking, reduction and LLM access.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::{DigestError, Result};

/// Decides the batch size of each reduction pass.
///
/// The default reproduces the three-level reference shape: batches of 5 at
/// the first level, an extra pass with batches of 3 when more than 2
/// intermediates remain, then one final combination.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReductionPolicy {
    /// Batch size of the first pass over per-chunk results.
    pub level1_batch_size: usize,

    /// Batch size of secondary passes.
    pub level2_batch_size: usize,

    /// Secondary passes run while more than this many texts remain.
    pub secondary_pass_threshold: usize,

    /// Upper bound on passes; the last allowed pass combines everything.
    pub max_levels: usize,
}

impl Default for ReductionPolicy {
    fn default() -> Self {
        Self {
            level1_batch_size: 5,
            level2_batch_size: 3,
            secondary_pass_threshold: 2,
            max_levels: 3,
        }
    }
}

impl ReductionPolicy {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_level1_batch_size(mut self, size: usize) -> Self {
        self.level1_batch_size = size;
        self
    }

    pub fn with_level2_batch_size(mut self, size: usize) -> Self {
        self.level2_batch_size = size;
        self
    }

    pub fn with_secondary_pass_threshold(mut self, threshold: usize) -> Self {
        self.secondary_pass_threshold = threshold;
        self
    }

    pub fn with_max_levels(mut self, max_levels: usize) -> Self {
        self.max_levels = max_levels;
        self
    }

    /// Batch size for pass `level` (0-indexed) over `len` texts.
    ///
    /// A return value `>= len` means the pass is the final combination.
    pub fn batch_size(&self, level: usize, len: usize) -> usize {
        if level + 1 >= self.max_levels {
            return len;
        }
        if level == 0 {
            return self.level1_batch_size;
        }
        if len > self.secondary_pass_threshold {
            self.level2_batch_size
        } else {
            len
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.level1_batch_size < 2 || self.level2_batch_size < 2 {
            return Err(DigestError::invalid_config(format!(
                "batch sizes must be >= 2 (got {} and {})",
                self.level1_batch_size, self.level2_batch_size
            )));
        }
        if self.max_levels == 0 {
            return Err(DigestError::invalid_config("max_levels must be >= 1"));
        }
        Ok(())
    }
}

/// Retry settings for rate-limited LLM calls.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Total attempts including the first call.
    pub max_attempts: u32,

    /// Delay before the first retry; doubles on each further retry.
    pub base_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay_ms: 1000,
        }
    }
}

impl RetryConfig {
    /// Backoff before retry number `retry` (1-indexed).
    pub fn delay_for(&self, retry: u32) -> Duration {
        let factor = 1u64 << retry.saturating_sub(1).min(16);
        Duration::from_millis(self.base_delay_ms.saturating_mul(factor))
    }
}

/// Configuration for a digest session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Maximum chunk length in characters.
    pub chunk_size: usize,

    /// Characters repeated from the end of one chunk at the start of the next.
    pub chunk_overlap: usize,

    /// Model identifier passed to every LLM call.
    pub model: String,

    /// Reduction shape of the summary pipeline.
    pub summary: ReductionPolicy,

    /// Reduction shape of the risk pipeline.
    pub risk: ReductionPolicy,

    /// Concurrent chunk transforms in flight (1 = sequential).
    pub concurrency: usize,

    /// Sustained LLM request rate shared by every call.
    pub requests_per_minute: u32,

    /// Requests allowed back-to-back before the rate applies.
    pub burst: u32,

    /// Deadline for a single LLM call.
    pub call_timeout_secs: u64,

    #[serde(default)]
    pub retry: RetryConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            chunk_size: 800,
            chunk_overlap: 100,
            model: "llama-3.3-70b-versatile".to_string(),
            summary: ReductionPolicy::default(),
            risk: ReductionPolicy::default(),
            concurrency: 1,
            requests_per_minute: 60,
            burst: 1,
            call_timeout_secs: 60,
            retry: RetryConfig::default(),
        }
    }
}

impl PipelineConfig {
    /// Create a new config with default values.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_chunking(mut self, chunk_size: usize, chunk_overlap: usize) -> Self {
        self.chunk_size = chunk_size;
        self.chunk_overlap = chunk_overlap;
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_summary_policy(mut self, policy: ReductionPolicy) -> Self {
        self.summary = policy;
        self
    }

    pub fn with_risk_policy(mut self, policy: ReductionPolicy) -> Self {
        self.risk = policy;
        self
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency;
        self
    }

    pub fn with_rate_limit(mut self, requests_per_minute: u32, burst: u32) -> Self {
        self.requests_per_minute = requests_per_minute;
        self.burst = burst;
        self
    }

    pub fn with_call_timeout_secs(mut self, secs: u64) -> Self {
        self.call_timeout_secs = secs;
        self
    }

    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    pub fn call_timeout(&self) -> Duration {
        Duration::from_secs(self.call_timeout_secs)
    }

    /// Check every constraint the pipeline relies on.
    pub fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 || self.chunk_overlap >= self.chunk_size {
            return Err(DigestError::invalid_config(format!(
                "chunk_size must be greater than chunk_overlap (got {} and {})",
                self.chunk_size, self.chunk_overlap
            )));
        }
        if self.concurrency == 0 {
            return Err(DigestError::invalid_config("concurrency must be >= 1"));
        }
        if self.requests_per_minute == 0 || self.burst == 0 {
            return Err(DigestError::invalid_config(
                "requests_per_minute and burst must be >= 1",
            ));
        }
        if self.retry.max_attempts == 0 {
            return Err(DigestError::invalid_config("retry.max_attempts must be >= 1"));
        }
        if self.call_timeout_secs == 0 {
            return Err(DigestError::invalid_config("call_timeout_secs must be >= 1"));
        }
        self.summary.validate()?;
        self.risk.validate()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_policy_shape() {
        let policy = ReductionPolicy::default();

        assert_eq!(policy.batch_size(0, 12), 5);
        assert_eq!(policy.batch_size(1, 3), 3);
        assert_eq!(policy.batch_size(1, 2), 2);
        // Third pass always combines everything.
        assert_eq!(policy.batch_size(2, 7), 7);
    }

    #[test]
    fn test_single_level_policy_combines_everything() {
        let policy = ReductionPolicy::default().with_max_levels(1);
        assert_eq!(policy.batch_size(0, 40), 40);
    }

    #[test]
    fn test_policy_validation() {
        assert!(ReductionPolicy::default().validate().is_ok());
        assert!(ReductionPolicy::default()
            .with_level1_batch_size(1)
            .validate()
            .is_err());
        assert!(ReductionPolicy::default().with_max_levels(0).validate().is_err());
    }

    #[test]
    fn test_config_validation() {
        assert!(PipelineConfig::default().validate().is_ok());
        assert!(PipelineConfig::default()
            .with_chunking(100, 100)
            .validate()
            .is_err());
        assert!(PipelineConfig::default()
            .with_concurrency(0)
            .validate()
            .is_err());
        assert!(PipelineConfig::default()
            .with_rate_limit(0, 1)
            .validate()
            .is_err());
    }

    #[test]
    fn test_retry_backoff_doubles() {
        let retry = RetryConfig {
            max_attempts: 4,
            base_delay_ms: 100,
        };

        assert_eq!(retry.delay_for(1), Duration::from_millis(100));
        assert_eq!(retry.delay_for(2), Duration::from_millis(200));
        assert_eq!(retry.delay_for(3), Duration::from_millis(400));
    }

    #[test]
    fn test_config_deserializes_with_default_retry() {
        let json = r#"{
            "chunk_size": 1000,
            "chunk_overlap": 50,
            "model": "llama-3.1-8b-instant",
            "summary": {"level1_batch_size": 5, "level2_batch_size": 3, "secondary_pass_threshold": 2, "max_levels": 3},
            "risk": {"level1_batch_size": 4, "level2_batch_size": 2, "secondary_pass_threshold": 2, "max_levels": 3},
            "concurrency": 2,
            "requests_per_minute": 30,
            "burst": 2,
            "call_timeout_secs": 30
        }"#;

        let config: PipelineConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.risk.level1_batch_size, 4);
        assert_eq!(config.retry, RetryConfig::default());
        assert!(config.validate().is_ok());
    }
}

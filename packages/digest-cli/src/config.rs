//! Settings from flags, environment variables and `.env`.

use anyhow::{Context, Result};
use clap::Args;
use legal_digest::{PipelineConfig, ReductionPolicy, RetryConfig};
use openai_client::{DEFAULT_MODEL, GROQ_BASE_URL};
use std::env;

/// Provider and pipeline flags shared by every subcommand.
#[derive(Args, Debug, Clone)]
pub struct Settings {
    /// API key for the chat completion provider
    #[arg(long, env = "GROQ_API_KEY", hide_env_values = true, global = true)]
    pub api_key: Option<String>,

    /// OpenAI-compatible base URL
    #[arg(long, env = "DIGEST_BASE_URL", default_value = GROQ_BASE_URL, global = true)]
    pub base_url: String,

    /// Model used for every call
    #[arg(long, env = "DIGEST_MODEL", default_value = DEFAULT_MODEL, global = true)]
    pub model: String,

    /// Maximum chunk length in characters
    #[arg(long, env = "DIGEST_CHUNK_SIZE", default_value_t = 800, global = true)]
    pub chunk_size: usize,

    /// Characters shared by consecutive chunks
    #[arg(long, env = "DIGEST_CHUNK_OVERLAP", default_value_t = 100, global = true)]
    pub chunk_overlap: usize,

    /// Batch size of the first reduction pass
    #[arg(long, env = "DIGEST_LEVEL1_BATCH_SIZE", default_value_t = 5, global = true)]
    pub level1_batch_size: usize,

    /// Batch size of later reduction passes
    #[arg(long, env = "DIGEST_LEVEL2_BATCH_SIZE", default_value_t = 3, global = true)]
    pub level2_batch_size: usize,

    /// Later passes run while more than this many results remain
    #[arg(long, env = "DIGEST_SECONDARY_PASS_THRESHOLD", default_value_t = 2, global = true)]
    pub secondary_pass_threshold: usize,

    /// Reduction passes before everything is combined at once
    #[arg(long, env = "DIGEST_MAX_LEVELS", default_value_t = 3, global = true)]
    pub max_levels: usize,

    /// Chunk transforms in flight
    #[arg(long, env = "DIGEST_CONCURRENCY", default_value_t = 1, global = true)]
    pub concurrency: usize,

    /// Sustained request rate across all calls
    #[arg(long, env = "DIGEST_REQUESTS_PER_MINUTE", default_value_t = 60, global = true)]
    pub requests_per_minute: u32,

    #[arg(long, env = "DIGEST_BURST", default_value_t = 1, global = true)]
    pub burst: u32,

    /// Deadline for one call, in seconds
    #[arg(long, env = "DIGEST_CALL_TIMEOUT", default_value_t = 60, global = true)]
    pub call_timeout: u64,

    /// Attempts per call when rate limited
    #[arg(long, env = "DIGEST_MAX_ATTEMPTS", default_value_t = 3, global = true)]
    pub max_attempts: u32,

    /// First backoff delay in milliseconds (doubles per retry)
    #[arg(long, env = "DIGEST_RETRY_DELAY_MS", default_value_t = 1000, global = true)]
    pub retry_delay_ms: u64,

    #[arg(long, env = "DIGEST_MAX_TOKENS", default_value_t = 1000, global = true)]
    pub max_tokens: u32,

    #[arg(long, env = "DIGEST_TEMPERATURE", default_value_t = 1.0, global = true)]
    pub temperature: f32,
}

/// Resolved configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub api_key: String,
    pub base_url: String,
    pub max_tokens: u32,
    pub temperature: f32,
    pub pipeline: PipelineConfig,
}

impl Settings {
    /// Resolve the API key and build a validated pipeline config.
    ///
    /// Falls back to `OPENAI_API_KEY` when no Groq key is given.
    pub fn into_config(self) -> Result<Config> {
        let api_key = self
            .api_key
            .filter(|k| !k.is_empty())
            .or_else(|| env::var("OPENAI_API_KEY").ok())
            .context("GROQ_API_KEY (or OPENAI_API_KEY) must be set")?;

        let policy = ReductionPolicy::new()
            .with_level1_batch_size(self.level1_batch_size)
            .with_level2_batch_size(self.level2_batch_size)
            .with_secondary_pass_threshold(self.secondary_pass_threshold)
            .with_max_levels(self.max_levels);

        let pipeline = PipelineConfig::default()
            .with_model(self.model)
            .with_chunking(self.chunk_size, self.chunk_overlap)
            .with_summary_policy(policy.clone())
            .with_risk_policy(policy)
            .with_concurrency(self.concurrency)
            .with_rate_limit(self.requests_per_minute, self.burst)
            .with_call_timeout_secs(self.call_timeout)
            .with_retry(RetryConfig {
                max_attempts: self.max_attempts,
                base_delay_ms: self.retry_delay_ms,
            });
        pipeline.validate().context("Invalid pipeline settings")?;

        Ok(Config {
            api_key,
            base_url: self.base_url,
            max_tokens: self.max_tokens,
            temperature: self.temperature,
            pipeline,
        })
    }
}

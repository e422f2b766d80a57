//! Typed errors for the digest library.
//!
//! Uses `thiserror` for library errors (not `anyhow`) to provide
//! strongly-typed, composable error handling.

use thiserror::Error;

/// Errors that can occur while running a digest pipeline.
#[derive(Debug, Error)]
pub enum DigestError {
    /// Document could not be loaded
    #[error("load failed: {0}")]
    Load(#[from] LoadError),

    /// LLM call failed
    #[error("model error: {0}")]
    Model(#[from] ModelError),

    /// Nothing to process (empty document or empty sequence)
    #[error("empty input: {what}")]
    EmptyInput { what: String },

    /// Configuration violates a pipeline constraint
    #[error("invalid config: {reason}")]
    InvalidConfig { reason: String },

    /// Operation was cancelled between LLM calls
    #[error("operation cancelled")]
    Cancelled,
}

impl DigestError {
    pub(crate) fn empty(what: impl Into<String>) -> Self {
        Self::EmptyInput { what: what.into() }
    }

    pub(crate) fn invalid_config(reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            reason: reason.into(),
        }
    }
}

/// Errors raised by document loaders.
#[derive(Debug, Error)]
pub enum LoadError {
    /// Media kind not supported by this build
    #[error("unsupported document kind: {0}")]
    Unsupported(String),

    /// Bytes could not be decoded as the declared kind
    #[error("malformed {kind} document: {reason}")]
    Malformed { kind: String, reason: String },

    /// Reading the source failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Coarse classification of an LLM failure.
///
/// The pipeline treats every kind as fatal for the run; only the retry
/// guard looks at the kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelErrorKind {
    /// Provider asked us to slow down
    RateLimited,

    /// Call exceeded its deadline
    Timeout,

    /// Auth, network, malformed response, anything else
    Other,
}

/// An LLM primitive failure.
#[derive(Debug, Clone, Error)]
#[error("{kind:?}: {message}")]
pub struct ModelError {
    pub kind: ModelErrorKind,
    pub message: String,
}

impl ModelError {
    pub fn new(kind: ModelErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn rate_limited(message: impl Into<String>) -> Self {
        Self::new(ModelErrorKind::RateLimited, message)
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(ModelErrorKind::Timeout, message)
    }

    pub fn other(message: impl Into<String>) -> Self {
        Self::new(ModelErrorKind::Other, message)
    }

    pub fn is_rate_limited(&self) -> bool {
        self.kind == ModelErrorKind::RateLimited
    }
}

/// Result type alias for digest operations.
pub type Result<T> = std::result::Result<T, DigestError>;

/// Result type alias for LLM calls.
pub type ModelResult<T> = std::result::Result<T, ModelError>;

/// Result type alias for loaders.
pub type LoadResult<T> = std::result::Result<T, LoadError>;

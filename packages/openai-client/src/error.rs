//! Error types for the chat completion client.

use thiserror::Error;

/// Result type for client operations.
pub type Result<T> = std::result::Result<T, OpenAIError>;

/// Chat completion client errors.
#[derive(Debug, Error)]
pub enum OpenAIError {
    /// Configuration error (missing API key, invalid settings)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Network error (connection refused, DNS, TLS)
    #[error("Network error: {0}")]
    Network(String),

    /// The request did not complete within the client timeout
    #[error("Request timed out: {0}")]
    Timeout(String),

    /// HTTP 429 from the provider
    #[error("Rate limited: {0}")]
    RateLimited(String),

    /// API error (any other non-2xx response, empty choices)
    #[error("API error: {0}")]
    Api(String),

    /// Parse error (invalid JSON, unexpected response format)
    #[error("Parse error: {0}")]
    Parse(String),
}

impl OpenAIError {
    /// Whether retrying the same request later can reasonably succeed.
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, Self::RateLimited(_))
    }

    /// Build from a `reqwest` transport error, separating timeouts.
    pub(crate) fn from_transport(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout(err.to_string())
        } else {
            Self::Network(err.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rate_limited_classification() {
        assert!(OpenAIError::RateLimited("429".into()).is_rate_limited());
        assert!(!OpenAIError::Api("500".into()).is_rate_limited());
        assert!(!OpenAIError::Timeout("slow".into()).is_rate_limited());
    }
}

//! Error types for haven-llm

use thiserror::Error;

/// Generation error type
#[derive(Debug, Error)]
pub enum Error {
    /// Provider not configured
    #[error("generator not configured: {0}")]
    NotConfigured(String),

    /// API error
    #[error("api error: {0}")]
    Api(String),

    /// Rate limit exceeded
    #[error("rate limit exceeded")]
    RateLimit,

    /// Invalid response
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// Network error
    #[error("network error: {0}")]
    Network(String),

    /// Request timed out
    #[error("request timed out")]
    Timeout,
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

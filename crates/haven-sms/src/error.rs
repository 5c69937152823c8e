//! Error types for haven-sms

use thiserror::Error;

/// Transport error type
#[derive(Debug, Error)]
pub enum Error {
    /// Transport not configured
    #[error("transport not configured: {0}")]
    NotConfigured(String),

    /// Vendor rejected the request
    #[error("send rejected: {0}")]
    Rejected(String),

    /// Message body too long for the transport
    #[error("message too long: {0} chars")]
    TooLong(usize),

    /// Rate limit exceeded
    #[error("rate limit exceeded")]
    RateLimit,

    /// Network error
    #[error("network error: {0}")]
    Network(String),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

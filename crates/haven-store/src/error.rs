//! Error types for haven-store

use thiserror::Error;

/// Storage error type
#[derive(Debug, Error)]
pub enum Error {
    /// Fast cache tier unavailable or misbehaving
    #[error("cache error: {0}")]
    Cache(String),

    /// Durable tier unavailable or misbehaving
    #[error("durable store error: {0}")]
    Durable(String),

    /// Session payload could not be (de)serialized
    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

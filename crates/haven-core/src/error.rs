//! Error types for haven-core

use thiserror::Error;

/// Core error type
#[derive(Debug, Error)]
pub enum Error {
    /// Inbound message rejected before handling (empty/oversized)
    #[error("validation error: {0}")]
    Validation(String),

    /// Storage tier error
    #[error("storage error: {0}")]
    Storage(#[from] haven_store::Error),

    /// Text-generation error
    #[error("generation error: {0}")]
    Generation(#[from] haven_llm::Error),

    /// Outbound transport error
    #[error("transport error: {0}")]
    Transport(#[from] haven_sms::Error),

    /// Invalid or missing configuration (fatal at startup only)
    #[error("configuration error: {0}")]
    Configuration(String),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

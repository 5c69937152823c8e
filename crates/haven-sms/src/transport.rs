//! Transport trait

use crate::error::Result;
use async_trait::async_trait;

/// Longest body accepted for a single (concatenated) SMS
pub const MAX_SMS_LENGTH: usize = 1600;

/// Outbound SMS transport.
///
/// Implementations own their own timeouts; callers treat a send as a
/// single fallible operation and never retry unboundedly.
#[async_trait]
pub trait SmsTransport: Send + Sync {
    /// Send `body` to `to`, returning the provider's message id.
    async fn send(&self, to: &str, body: &str) -> Result<String>;
}

//! Response generator trait

use crate::error::Result;
use async_trait::async_trait;
use haven_store::ContextSnapshot;

/// Fallible, latency-unbounded text generation.
///
/// Implementations own their own timeouts and retries; the orchestrator
/// only distinguishes success from failure.
#[async_trait]
pub trait ResponseGenerator: Send + Sync {
    /// Provider name, for logs
    fn name(&self) -> &str;

    /// Generate a conversational reply to `message` given the context
    /// snapshot.
    async fn generate(&self, message: &str, context: &ContextSnapshot) -> Result<String>;
}

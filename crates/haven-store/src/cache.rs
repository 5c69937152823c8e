//! Fast cache tier
//!
//! The primary session cache is Redis with TTL-bound keys. Payloads are
//! opaque JSON strings; the manager owns (de)serialization so a cache
//! implementation never needs to understand sessions.

use crate::error::{Error, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info};

/// Namespace prefix for session keys
pub const SESSION_KEY_PREFIX: &str = "session:";

/// Build the namespaced cache key for a user
#[must_use]
pub fn session_key(user_id: &str) -> String {
    format!("{}{}", SESSION_KEY_PREFIX, user_id)
}

/// Fast cache tier abstraction
#[async_trait]
pub trait SessionCache: Send + Sync {
    /// Get a value by key
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Set a value with a TTL in seconds
    async fn set_with_ttl(&self, key: &str, value: &str, ttl_seconds: u64) -> Result<()>;
}

/// Redis-backed session cache (production)
///
/// Keys expire via Redis TTL; no sweep is needed on this tier.
pub struct RedisCache {
    client: redis::Client,
}

impl RedisCache {
    /// Create a new Redis cache
    ///
    /// # Errors
    ///
    /// Returns error if the Redis URL is invalid.
    pub fn new(redis_url: &str) -> Result<Self> {
        let client = redis::Client::open(redis_url).map_err(|e| Error::Cache(e.to_string()))?;
        info!("Redis session cache initialized");
        Ok(Self { client })
    }

    async fn get_connection(&self) -> Result<redis::aio::MultiplexedConnection> {
        self.client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| Error::Cache(format!("Redis connection failed: {}", e)))
    }
}

#[async_trait]
impl SessionCache for RedisCache {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let mut conn = self.get_connection().await?;

        let value: Option<String> = redis::cmd("GET")
            .arg(key)
            .query_async(&mut conn)
            .await
            .map_err(|e| Error::Cache(format!("Redis GET failed: {}", e)))?;

        debug!(key = %key, hit = value.is_some(), "cache read");
        Ok(value)
    }

    async fn set_with_ttl(&self, key: &str, value: &str, ttl_seconds: u64) -> Result<()> {
        let mut conn = self.get_connection().await?;

        redis::cmd("SETEX")
            .arg(key)
            .arg(ttl_seconds)
            .arg(value)
            .query_async::<()>(&mut conn)
            .await
            .map_err(|e| Error::Cache(format!("Redis SETEX failed: {}", e)))?;

        debug!(key = %key, ttl = ttl_seconds, "cache write");
        Ok(())
    }
}

/// In-memory session cache (development/testing)
///
/// TTLs are accepted but not enforced; entries live until the process
/// exits. Not suitable for production.
#[derive(Default)]
pub struct MemoryCache {
    entries: Arc<RwLock<HashMap<String, String>>>,
}

impl MemoryCache {
    /// Create an empty in-memory cache
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live entries
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    /// Whether the cache is empty
    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[async_trait]
impl SessionCache for MemoryCache {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn set_with_ttl(&self, key: &str, value: &str, _ttl_seconds: u64) -> Result<()> {
        self.entries
            .write()
            .await
            .insert(key.to_string(), value.to_string());
        Ok(())
    }
}

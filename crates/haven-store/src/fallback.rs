//! In-process fallback tier
//!
//! Last-resort session storage for when the cache and durable tiers are
//! unreachable. Shared by every handling task in the process; the RwLock
//! gives atomic read-then-write per key so two tasks never observe a torn
//! session.

use crate::session::Session;
use chrono::{Duration, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

/// Sessions idle longer than this are evicted by [`FallbackStore::cleanup`]
const STALE_AFTER_SECS: i64 = 3600;

/// In-process fallback session table
#[derive(Default)]
pub struct FallbackStore {
    sessions: Arc<RwLock<HashMap<String, Session>>>,
}

impl FallbackStore {
    /// Create an empty fallback store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a session by user id
    pub async fn get(&self, user_id: &str) -> Option<Session> {
        self.sessions.read().await.get(user_id).cloned()
    }

    /// Insert or replace a session
    pub async fn insert(&self, session: Session) {
        self.sessions
            .write()
            .await
            .insert(session.user_id.clone(), session);
    }

    /// Number of live sessions
    pub async fn count(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Evict sessions idle longer than one hour.
    ///
    /// Touches only this tier; idempotent — an immediate second call
    /// removes nothing further. Returns the number of evicted sessions.
    pub async fn cleanup(&self) -> usize {
        let cutoff = Utc::now() - Duration::seconds(STALE_AFTER_SECS);
        let mut sessions = self.sessions.write().await;

        let stale_keys: Vec<String> = sessions
            .iter()
            .filter(|(_, session)| session.last_activity <= cutoff)
            .map(|(key, _)| key.clone())
            .collect();

        let removed = stale_keys.len();
        for key in stale_keys {
            sessions.remove(&key);
            debug!(user_id = %key, "stale fallback session evicted");
        }

        if removed > 0 {
            debug!(
                removed = removed,
                remaining = sessions.len(),
                "fallback tier swept"
            );
        }
        removed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_insert_and_get() {
        let store = FallbackStore::new();
        assert_eq!(store.get("user").await.map(|s| s.user_id), None);

        store.insert(Session::new("user")).await;
        let session = store.get("user").await.unwrap();
        assert_eq!(session.user_id, "user");
        assert_eq!(store.count().await, 1);
    }

    #[tokio::test]
    async fn test_cleanup_evicts_only_stale() {
        let store = FallbackStore::new();

        let mut stale = Session::new("stale");
        stale.last_activity = Utc::now() - Duration::hours(2);
        store.insert(stale).await;
        store.insert(Session::new("fresh")).await;

        assert_eq!(store.cleanup().await, 1);
        assert!(store.get("stale").await.is_none());
        assert!(store.get("fresh").await.is_some());
    }

    #[tokio::test]
    async fn test_cleanup_is_idempotent() {
        let store = FallbackStore::new();
        let mut stale = Session::new("stale");
        stale.last_activity = Utc::now() - Duration::hours(2);
        store.insert(stale).await;

        assert_eq!(store.cleanup().await, 1);
        assert_eq!(store.cleanup().await, 0);
    }
}

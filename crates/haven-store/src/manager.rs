//! Session manager - owns the tiering policy
//!
//! Read path: cache tier → in-process fallback → freshly synthesized
//! default (written through both tiers). Write path: both tiers are
//! always attempted; the cache tier's outcome is returned as a
//! diagnostic, never as a gate.
//!
//! Concurrency note: there is no per-user serialization. Two overlapping
//! read-modify-write cycles for the same id can lose updates; this is an
//! accepted limitation of the design, not a bug to paper over here.

use crate::cache::{session_key, SessionCache};
use crate::durable::DurableStore;
use crate::fallback::FallbackStore;
use crate::session::Session;
use crate::snapshot::ContextSnapshot;
use haven_risk::RiskAssessment;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, warn};

/// Default cache-tier TTL for session payloads (24 hours)
const DEFAULT_SESSION_TTL_SECS: u64 = 86_400;

/// Tiered session/context store, constructed once at startup
pub struct SessionManager {
    cache: Arc<dyn SessionCache>,
    durable: Arc<dyn DurableStore>,
    fallback: FallbackStore,
    ttl_seconds: u64,
}

impl SessionManager {
    /// Create a manager over the given tiers
    #[must_use]
    pub fn new(cache: Arc<dyn SessionCache>, durable: Arc<dyn DurableStore>) -> Self {
        Self {
            cache,
            durable,
            fallback: FallbackStore::new(),
            ttl_seconds: DEFAULT_SESSION_TTL_SECS,
        }
    }

    /// Override the cache-tier TTL
    #[must_use]
    pub fn with_ttl_seconds(mut self, ttl_seconds: u64) -> Self {
        self.ttl_seconds = ttl_seconds;
        self
    }

    /// Load a session, synthesizing a default when no tier has one.
    ///
    /// Never returns an error: a failing tier degrades to the next one,
    /// and a total miss yields a fresh default written through both
    /// tiers.
    pub async fn get_session(&self, user_id: &str) -> Session {
        let key = session_key(user_id);

        match self.cache.get(&key).await {
            Ok(Some(payload)) => match serde_json::from_str::<Session>(&payload) {
                Ok(session) => return session,
                Err(e) => {
                    warn!(user_id = %user_id, error = %e, "cached session payload unreadable")
                }
            },
            Ok(None) => {}
            Err(e) => warn!(user_id = %user_id, error = %e, "session cache read failed"),
        }

        if let Some(session) = self.fallback.get(user_id).await {
            debug!(user_id = %user_id, "session served from fallback tier");
            return session;
        }

        let session = Session::new(user_id);
        debug!(user_id = %user_id, "synthesized default session");
        self.save_session(&session).await;
        session
    }

    /// Write a session through both tiers.
    ///
    /// The fallback write always happens; the returned bool reflects the
    /// cache-tier write only and is a diagnostic, not a gate.
    pub async fn save_session(&self, session: &Session) -> bool {
        let cache_ok = match serde_json::to_string(session) {
            Ok(payload) => {
                let key = session_key(&session.user_id);
                match self.cache.set_with_ttl(&key, &payload, self.ttl_seconds).await {
                    Ok(()) => true,
                    Err(e) => {
                        warn!(user_id = %session.user_id, error = %e, "session cache write failed");
                        false
                    }
                }
            }
            Err(e) => {
                warn!(user_id = %session.user_id, error = %e, "session serialization failed");
                false
            }
        };

        self.fallback.insert(session.clone()).await;
        cache_ok
    }

    /// Record a completed exchange against a session and persist it.
    ///
    /// Appends the exchange (capacity 10, FIFO), bumps counters, raises
    /// the risk level monotonically, and updates flags. The tiered save
    /// is best-effort; callers never abort delivery on its account.
    pub async fn update_context(
        &self,
        user_id: &str,
        user_text: &str,
        assistant_text: &str,
        assessment: &RiskAssessment,
    ) -> Session {
        let mut session = self.get_session(user_id).await;
        session.record_exchange(user_text, assistant_text, assessment);
        self.save_session(&session).await;
        session
    }

    /// Build the context snapshot handed to response generation.
    ///
    /// Merges the session with the durable profile; a durable failure
    /// degrades to the session-only view, so the generator always
    /// receives a well-formed shape.
    pub async fn get_context_for_ai(&self, user_id: &str) -> ContextSnapshot {
        let session = self.get_session(user_id).await;
        let mut snapshot = ContextSnapshot::from_session(&session);

        match self.durable.get_user(user_id).await {
            Ok(Some(profile)) => {
                snapshot.total_messages = Some(profile.total_messages);
                snapshot.profile_risk_level = Some(profile.risk_level);
            }
            Ok(None) => {}
            Err(e) => {
                warn!(user_id = %user_id, error = %e, "profile merge failed, session-only snapshot")
            }
        }

        snapshot
    }

    /// Flag the session for the external check-in scheduler
    pub async fn mark_for_check_in(&self, user_id: &str) -> Session {
        self.mutate(user_id, |session| session.flags.needs_check_in = true)
            .await
    }

    /// Explicitly clear crisis state (flag and running risk level)
    pub async fn clear_crisis_flag(&self, user_id: &str) -> Session {
        self.mutate(user_id, Session::clear_crisis).await
    }

    /// Record that hotline resources were surfaced to this user
    pub async fn mark_resources_seen(&self, user_id: &str) -> Session {
        self.mutate(user_id, |session| session.flags.has_seen_resources = true)
            .await
    }

    /// Merge preference entries into the session
    pub async fn update_preferences(
        &self,
        user_id: &str,
        preferences: HashMap<String, serde_json::Value>,
    ) -> Session {
        self.mutate(user_id, move |session| {
            session.preferences.extend(preferences);
        })
        .await
    }

    /// Set the derived conversation topic
    pub async fn set_topic(&self, user_id: &str, topic: &str) -> Session {
        let topic = topic.to_string();
        self.mutate(user_id, move |session| {
            session.current_topic = Some(topic);
        })
        .await
    }

    /// Set the derived mood
    pub async fn update_mood(&self, user_id: &str, mood: &str) -> Session {
        let mood = mood.to_string();
        self.mutate(user_id, move |session| {
            session.mood = Some(mood);
        })
        .await
    }

    /// Sweep the in-process fallback tier (sessions idle > 1 hour).
    ///
    /// Never touches the cache or durable tiers. Idempotent.
    pub async fn cleanup_sessions(&self) -> usize {
        self.fallback.cleanup().await
    }

    /// Number of sessions currently held by the fallback tier
    pub async fn fallback_count(&self) -> usize {
        self.fallback.count().await
    }

    // Full read-modify-write; same-id calls can interleave (see module doc).
    async fn mutate(&self, user_id: &str, f: impl FnOnce(&mut Session)) -> Session {
        let mut session = self.get_session(user_id).await;
        f(&mut session);
        session.touch();
        self.save_session(&session).await;
        session
    }
}

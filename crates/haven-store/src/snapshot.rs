//! Context snapshot passed into response generation

use crate::session::{ContextExchange, Session};
use haven_risk::RiskLevel;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Read-only merge of session state and the durable profile.
///
/// This is the only shape the response generator ever sees; it is always
/// well-formed even when every storage tier is down (the degenerate case
/// is [`ContextSnapshot::stub`]).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContextSnapshot {
    /// User identifier
    pub user_id: String,
    /// No exchange has been recorded for this session
    pub is_first_time: bool,
    /// Session-lifetime message count
    pub message_count: u64,
    /// Topic derived from recent inbound text
    pub current_topic: Option<String>,
    /// Mood derived from recent inbound text
    pub mood: Option<String>,
    /// Running session risk level
    pub risk_level: RiskLevel,
    /// Whether the session is flagged in-crisis
    pub in_crisis: bool,
    /// Whether hotline resources were already surfaced
    pub has_seen_resources: bool,
    /// Recent exchanges, oldest first
    pub recent_exchanges: Vec<ContextExchange>,
    /// Free-form user preferences
    pub preferences: HashMap<String, serde_json::Value>,
    /// Lifetime message count from the durable profile, when reachable
    pub total_messages: Option<i64>,
    /// High-water risk level from the durable profile, when reachable
    pub profile_risk_level: Option<RiskLevel>,
}

impl ContextSnapshot {
    /// Minimal stub used when no state could be loaded at all
    #[must_use]
    pub fn stub(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            is_first_time: true,
            message_count: 0,
            current_topic: None,
            mood: None,
            risk_level: RiskLevel::None,
            in_crisis: false,
            has_seen_resources: false,
            recent_exchanges: Vec::new(),
            preferences: HashMap::new(),
            total_messages: None,
            profile_risk_level: None,
        }
    }

    /// Session-only view (durable profile unreachable)
    #[must_use]
    pub fn from_session(session: &Session) -> Self {
        Self {
            user_id: session.user_id.clone(),
            is_first_time: session.is_first_time,
            message_count: session.message_count,
            current_topic: session.current_topic.clone(),
            mood: session.mood.clone(),
            risk_level: session.risk_level,
            in_crisis: session.flags.in_crisis,
            has_seen_resources: session.flags.has_seen_resources,
            recent_exchanges: session.conversation_context.clone(),
            preferences: session.preferences.clone(),
            total_messages: None,
            profile_risk_level: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stub_is_minimal() {
        let snapshot = ContextSnapshot::stub("+15550001111");
        assert!(snapshot.is_first_time);
        assert_eq!(snapshot.risk_level, RiskLevel::None);
        assert!(snapshot.recent_exchanges.is_empty());
        assert!(snapshot.total_messages.is_none());
    }

    #[test]
    fn test_from_session_copies_flags() {
        let mut session = Session::new("user");
        session.flags.in_crisis = true;
        session.current_topic = Some("work".to_string());

        let snapshot = ContextSnapshot::from_session(&session);
        assert!(snapshot.in_crisis);
        assert_eq!(snapshot.current_topic.as_deref(), Some("work"));
        assert!(snapshot.total_messages.is_none());
    }
}

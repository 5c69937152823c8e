//! Per-user session model
//!
//! A session carries everything the orchestrator needs between messages:
//! a bounded window of recent exchanges, the running risk level, and the
//! flags the crisis path and scheduler read. Sessions are plain data;
//! tiering lives in [`crate::SessionManager`].

use chrono::{DateTime, Utc};
use haven_risk::{RiskAssessment, RiskLevel};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Maximum number of exchanges kept in the conversation context
pub const MAX_CONTEXT_EXCHANGES: usize = 10;

/// One user/assistant exchange in the conversation context
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContextExchange {
    /// What the user sent
    pub user_text: String,
    /// What we sent back
    pub assistant_text: String,
    /// When the exchange completed
    pub timestamp: DateTime<Utc>,
    /// Risk level assessed for the user message
    pub risk_level: RiskLevel,
}

/// Session flags read by the crisis path and the check-in scheduler
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionFlags {
    /// The external scheduler should send this user a check-in
    #[serde(default)]
    pub needs_check_in: bool,
    /// A high/critical assessment has not been explicitly cleared
    #[serde(default)]
    pub in_crisis: bool,
    /// Hotline resources have been surfaced to this user
    #[serde(default)]
    pub has_seen_resources: bool,
}

/// Per-user session state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    /// User identifier (phone number)
    pub user_id: String,
    /// Most recent exchanges, oldest first, capacity 10, FIFO eviction
    #[serde(default)]
    pub conversation_context: Vec<ContextExchange>,
    /// Topic derived from recent inbound text
    #[serde(default)]
    pub current_topic: Option<String>,
    /// Mood derived from recent inbound text
    #[serde(default)]
    pub mood: Option<String>,
    /// Running risk level; non-decreasing unless explicitly cleared
    #[serde(default)]
    pub risk_level: RiskLevel,
    /// Crisis and scheduling flags
    #[serde(default)]
    pub flags: SessionFlags,
    /// Free-form user preferences
    #[serde(default)]
    pub preferences: HashMap<String, serde_json::Value>,
    /// Total messages handled in this session's lifetime
    #[serde(default)]
    pub message_count: u64,
    /// No exchange has been recorded yet
    #[serde(default = "default_first_time")]
    pub is_first_time: bool,
    /// Last time this session was touched
    pub last_activity: DateTime<Utc>,
}

fn default_first_time() -> bool {
    true
}

impl Session {
    /// Create a fresh default session for a user
    #[must_use]
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            conversation_context: Vec::new(),
            current_topic: None,
            mood: None,
            risk_level: RiskLevel::None,
            flags: SessionFlags::default(),
            preferences: HashMap::new(),
            message_count: 0,
            is_first_time: true,
            last_activity: Utc::now(),
        }
    }

    /// Bump the activity timestamp
    pub fn touch(&mut self) {
        self.last_activity = Utc::now();
    }

    /// Raise the risk level if `level` is strictly higher.
    ///
    /// Comparison is by ordinal rank; the level never decreases here.
    pub fn raise_risk(&mut self, level: RiskLevel) {
        if level > self.risk_level {
            self.risk_level = level;
        }
    }

    /// Record a completed exchange and absorb its assessment.
    ///
    /// Appends to the context window (evicting the oldest beyond
    /// capacity), increments the message count, clears first-time status,
    /// raises the risk level monotonically, and updates the crisis and
    /// resource flags.
    pub fn record_exchange(
        &mut self,
        user_text: impl Into<String>,
        assistant_text: impl Into<String>,
        assessment: &RiskAssessment,
    ) {
        self.conversation_context.push(ContextExchange {
            user_text: user_text.into(),
            assistant_text: assistant_text.into(),
            timestamp: Utc::now(),
            risk_level: assessment.level,
        });
        if self.conversation_context.len() > MAX_CONTEXT_EXCHANGES {
            let excess = self.conversation_context.len() - MAX_CONTEXT_EXCHANGES;
            self.conversation_context.drain(0..excess);
        }

        self.message_count += 1;
        self.is_first_time = false;
        self.raise_risk(assessment.level);
        if assessment.level.is_crisis() {
            self.flags.in_crisis = true;
        }
        if !assessment.resources.is_empty() {
            self.flags.has_seen_resources = true;
        }
        self.touch();
    }

    /// Explicitly clear crisis state (flag and running level)
    pub fn clear_crisis(&mut self) {
        self.flags.in_crisis = false;
        self.risk_level = RiskLevel::None;
        self.touch();
    }
}

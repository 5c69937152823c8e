//! Durable tier entities and storage abstraction
//!
//! The durable store keeps the records that outlive any session: user
//! profiles, the full conversation log, crisis events, and check-in
//! bookkeeping. Rows persist indefinitely; nothing in this crate deletes
//! them.

use crate::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use haven_risk::RiskLevel;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Message direction in the conversation log
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// From the user to us
    Incoming,
    /// From us to the user
    Outgoing,
}

impl Direction {
    /// Get the string representation
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Incoming => "incoming",
            Self::Outgoing => "outgoing",
        }
    }

    /// Parse from the lowercase string form
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "incoming" => Some(Self::Incoming),
            "outgoing" => Some(Self::Outgoing),
            _ => None,
        }
    }
}

/// Durable per-user profile
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    /// Phone number (primary key)
    pub phone_number: String,
    /// First time this user ever wrote in
    pub first_interaction: DateTime<Utc>,
    /// Most recent interaction
    pub last_interaction: DateTime<Utc>,
    /// Lifetime message count
    pub total_messages: i64,
    /// High-water risk level; only ever rises
    pub risk_level: RiskLevel,
    /// Whether the user is subscribed (STOP/START)
    pub is_active: bool,
    /// Free-form metadata
    pub metadata: serde_json::Value,
}

/// One row in the conversation log
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationRecord {
    /// Phone number
    pub phone_number: String,
    /// Message text
    pub message: String,
    /// Direction
    pub direction: Direction,
    /// Risk level assessed for this message (none for outgoing)
    pub risk_level: RiskLevel,
    /// Matched risk categories
    pub risk_categories: Vec<String>,
    /// When the message was handled
    pub timestamp: DateTime<Utc>,
}

/// Audit record for a high/critical assessment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrisisEventRecord {
    /// Row id (assigned on insert)
    pub id: Option<i64>,
    /// Phone number
    pub phone_number: String,
    /// Assessed level
    pub risk_level: RiskLevel,
    /// Matched categories
    pub risk_categories: Vec<String>,
    /// Truncated message preview (never the full text)
    pub message_preview: String,
    /// Whether a human escalation was triggered
    pub escalated: bool,
    /// Whether the event has been resolved by a reviewer
    pub resolved: bool,
    /// When the event occurred
    pub timestamp: DateTime<Utc>,
}

/// Check-in bookkeeping row
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckInRecord {
    /// Row id
    pub id: i64,
    /// Phone number
    pub phone_number: String,
    /// When the check-in was sent
    pub sent_at: DateTime<Utc>,
    /// Whether the user has replied since
    pub responded: bool,
    /// The reply text, if any
    pub response_text: Option<String>,
    /// When the reply arrived
    pub response_time: Option<DateTime<Utc>>,
}

/// Durable tier abstraction
#[async_trait]
pub trait DurableStore: Send + Sync {
    /// Fetch a user profile
    async fn get_user(&self, phone_number: &str) -> Result<Option<UserProfile>>;

    /// Record one handled message against the profile: bump
    /// `total_messages`, refresh `last_interaction`, and raise the
    /// high-water `risk_level` if `level` is strictly higher. Creates the
    /// profile on first contact.
    async fn upsert_user_activity(&self, phone_number: &str, level: RiskLevel) -> Result<()>;

    /// Flip the subscription flag (STOP/START)
    async fn set_user_active(&self, phone_number: &str, active: bool) -> Result<()>;

    /// Append a row to the conversation log
    async fn record_conversation(&self, record: &ConversationRecord) -> Result<()>;

    /// Persist a crisis event, returning its row id
    async fn record_crisis_event(&self, event: &CrisisEventRecord) -> Result<i64>;

    /// Record that a check-in was sent, returning its row id
    async fn record_checkin_sent(&self, phone_number: &str) -> Result<i64>;

    /// The most recent unresponded check-in for a user, if any
    async fn open_checkin(&self, phone_number: &str) -> Result<Option<CheckInRecord>>;

    /// Mark a check-in responded with the reply text
    async fn mark_checkin_responded(&self, id: i64, response_text: &str) -> Result<()>;

    /// All crisis events recorded for a user, newest first
    async fn crisis_events_for(&self, phone_number: &str) -> Result<Vec<CrisisEventRecord>>;
}

#[derive(Default)]
struct MemoryDurableInner {
    users: HashMap<String, UserProfile>,
    conversations: Vec<ConversationRecord>,
    crisis_events: Vec<CrisisEventRecord>,
    checkins: Vec<CheckInRecord>,
    next_id: i64,
}

/// In-memory durable store (development/testing)
///
/// Everything is lost on restart; use [`crate::SqliteStore`] outside of
/// tests.
#[derive(Default)]
pub struct MemoryDurableStore {
    inner: Arc<RwLock<MemoryDurableInner>>,
}

impl MemoryDurableStore {
    /// Create an empty in-memory durable store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of conversation rows recorded
    pub async fn conversation_count(&self) -> usize {
        self.inner.read().await.conversations.len()
    }

    /// Number of crisis events recorded
    pub async fn crisis_event_count(&self) -> usize {
        self.inner.read().await.crisis_events.len()
    }

    /// Copy of the conversation log (test inspection)
    pub async fn conversations(&self) -> Vec<ConversationRecord> {
        self.inner.read().await.conversations.clone()
    }
}

#[async_trait]
impl DurableStore for MemoryDurableStore {
    async fn get_user(&self, phone_number: &str) -> Result<Option<UserProfile>> {
        Ok(self.inner.read().await.users.get(phone_number).cloned())
    }

    async fn upsert_user_activity(&self, phone_number: &str, level: RiskLevel) -> Result<()> {
        let now = Utc::now();
        let mut inner = self.inner.write().await;
        let profile = inner
            .users
            .entry(phone_number.to_string())
            .or_insert_with(|| UserProfile {
                phone_number: phone_number.to_string(),
                first_interaction: now,
                last_interaction: now,
                total_messages: 0,
                risk_level: RiskLevel::None,
                is_active: true,
                metadata: serde_json::Value::Null,
            });
        profile.total_messages += 1;
        profile.last_interaction = now;
        if level > profile.risk_level {
            profile.risk_level = level;
        }
        Ok(())
    }

    async fn set_user_active(&self, phone_number: &str, active: bool) -> Result<()> {
        let now = Utc::now();
        let mut inner = self.inner.write().await;
        let profile = inner
            .users
            .entry(phone_number.to_string())
            .or_insert_with(|| UserProfile {
                phone_number: phone_number.to_string(),
                first_interaction: now,
                last_interaction: now,
                total_messages: 0,
                risk_level: RiskLevel::None,
                is_active: true,
                metadata: serde_json::Value::Null,
            });
        profile.is_active = active;
        Ok(())
    }

    async fn record_conversation(&self, record: &ConversationRecord) -> Result<()> {
        self.inner.write().await.conversations.push(record.clone());
        Ok(())
    }

    async fn record_crisis_event(&self, event: &CrisisEventRecord) -> Result<i64> {
        let mut inner = self.inner.write().await;
        inner.next_id += 1;
        let id = inner.next_id;
        let mut stored = event.clone();
        stored.id = Some(id);
        inner.crisis_events.push(stored);
        Ok(id)
    }

    async fn record_checkin_sent(&self, phone_number: &str) -> Result<i64> {
        let mut inner = self.inner.write().await;
        inner.next_id += 1;
        let id = inner.next_id;
        inner.checkins.push(CheckInRecord {
            id,
            phone_number: phone_number.to_string(),
            sent_at: Utc::now(),
            responded: false,
            response_text: None,
            response_time: None,
        });
        Ok(id)
    }

    async fn open_checkin(&self, phone_number: &str) -> Result<Option<CheckInRecord>> {
        let inner = self.inner.read().await;
        Ok(inner
            .checkins
            .iter()
            .rev()
            .find(|c| c.phone_number == phone_number && !c.responded)
            .cloned())
    }

    async fn mark_checkin_responded(&self, id: i64, response_text: &str) -> Result<()> {
        let mut inner = self.inner.write().await;
        if let Some(checkin) = inner.checkins.iter_mut().find(|c| c.id == id) {
            checkin.responded = true;
            checkin.response_text = Some(response_text.to_string());
            checkin.response_time = Some(Utc::now());
        }
        Ok(())
    }

    async fn crisis_events_for(&self, phone_number: &str) -> Result<Vec<CrisisEventRecord>> {
        let inner = self.inner.read().await;
        let mut events: Vec<CrisisEventRecord> = inner
            .crisis_events
            .iter()
            .filter(|e| e.phone_number == phone_number)
            .cloned()
            .collect();
        events.reverse();
        Ok(events)
    }
}

//! Haven Store - Session and context management
//!
//! This crate provides the layered per-user state behind the conversation
//! orchestrator:
//! - Session model (bounded conversation context, flags, risk state)
//! - Fast cache tier (Redis, TTL-bound, primary session cache)
//! - Durable tier (SQLite via sqlx: users, conversations, crisis events,
//!   check-ins)
//! - In-process fallback tier (last resort when the other tiers are down)
//! - `SessionManager`, which owns the tiering policy
//!
//! ## Failure discipline
//!
//! Reads degrade tier by tier and bottom out in a freshly synthesized
//! default session; writes are attempted against every tier and a failure
//! in one never blocks the others. Nothing in this crate turns a storage
//! outage into a failed message.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod cache;
mod durable;
mod error;
mod fallback;
mod manager;
mod session;
mod snapshot;
mod sqlite;

pub use cache::{session_key, MemoryCache, RedisCache, SessionCache, SESSION_KEY_PREFIX};
pub use durable::{
    CheckInRecord, ConversationRecord, CrisisEventRecord, Direction, DurableStore,
    MemoryDurableStore, UserProfile,
};
pub use error::{Error, Result};
pub use fallback::FallbackStore;
pub use manager::SessionManager;
pub use session::{ContextExchange, Session, SessionFlags, MAX_CONTEXT_EXCHANGES};
pub use snapshot::ContextSnapshot;
pub use sqlite::SqliteStore;

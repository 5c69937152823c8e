//! Haven Core - Conversation orchestration
//!
//! This crate ties the risk engine, the session store, the generator, and
//! the transport into the per-message decision tree:
//! command check → risk assessment → crisis or normal branch → storage
//! writes → outbound send → session update.
//!
//! Everything user-facing funnels through [`Orchestrator::handle`], which
//! never lets a per-message failure escape: storage writes are
//! best-effort, generation failures substitute a safe text, send failures
//! get one bounded retry, and anything else becomes a structured failure
//! outcome plus a best-effort hotline fallback message.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod commands;
mod config;
mod error;
mod orchestrator;
mod signals;

pub use commands::{command_reply, Command};
pub use config::HavenConfig;
pub use error::{Error, Result};
pub use orchestrator::{HandleOutcome, Orchestrator};
pub use signals::{derive_mood, derive_topic};

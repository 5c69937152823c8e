//! Haven LLM - Response generation
//!
//! This crate provides the seam between the orchestrator and the external
//! text-generation service:
//! - `ResponseGenerator`: the fallible, latency-unbounded trait the
//!   orchestrator calls
//! - Prompt construction from the context snapshot (first-time status,
//!   topic, mood, recent exchanges, crisis guidance)
//! - `AnthropicGenerator`: reqwest-backed Claude Messages API adapter
//!
//! The orchestrator treats every generation failure identically (it
//! substitutes a fixed safe text), so errors here carry diagnostics for
//! logs, not user-facing content.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod anthropic;
mod error;
mod generator;
mod prompt;

pub use anthropic::{AnthropicConfig, AnthropicGenerator, DEFAULT_MODEL};
pub use error::{Error, Result};
pub use generator::ResponseGenerator;
pub use prompt::{build_system_prompt, build_turns, PromptRole, PromptTurn};

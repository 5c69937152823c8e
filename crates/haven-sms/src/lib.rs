//! Haven SMS - Outbound transport
//!
//! This crate provides the seam between the orchestrator and the SMS
//! vendor:
//! - `SmsTransport`: send a text, get back the provider's message id
//! - `TwilioTransport`: reqwest-backed Twilio Messages API adapter
//!
//! Inbound webhooks and signature validation live outside this core; only
//! the outbound leg is modeled here.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod error;
mod transport;
mod twilio;

pub use error::{Error, Result};
pub use transport::{SmsTransport, MAX_SMS_LENGTH};
pub use twilio::{TwilioConfig, TwilioTransport};

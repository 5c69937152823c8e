//! Haven Risk - Keyword-weighted risk assessment
//!
//! This crate scores inbound messages against fixed keyword lexicons and
//! maps the cumulative score to an ordinal risk level:
//! - Lexicons: five fixed categories (suicide, self-harm, abuse, substance,
//!   immediate-risk) with fixed per-category weights
//! - Assessment: pure, deterministic, case-insensitive substring matching
//! - Responses: canned crisis texts carrying verbatim hotline numbers
//!
//! The engine is deliberately biased toward over-flagging. It is a routing
//! heuristic, not a clinical classifier.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod assessor;
mod level;
mod lexicon;
mod response;

pub use assessor::{assess_risk, preview, RiskAssessment};
pub use level::RiskLevel;
pub use lexicon::{level_for_score, Lexicon, BASE_CATEGORIES, IMMEDIATE_RISK};
pub use response::{crisis_response, resources_for, Resource};
pub use response::{CRISIS_TEXT_LINE, DV_HOTLINE, LIFELINE, SAMHSA_HELPLINE};

//! Crisis responses and hotline resources
//!
//! The digit strings below are compliance-bearing literals. They must be
//! rendered verbatim wherever they appear; never paraphrase or reformat
//! them.

use crate::assessor::RiskAssessment;
use crate::level::RiskLevel;
use serde::{Deserialize, Serialize};

/// 988 Suicide & Crisis Lifeline (call or text)
pub const LIFELINE: &str = "988";
/// Crisis Text Line (text HOME)
pub const CRISIS_TEXT_LINE: &str = "741741";
/// SAMHSA National Helpline
pub const SAMHSA_HELPLINE: &str = "1-800-662-4357";
/// National Domestic Violence Hotline
pub const DV_HOTLINE: &str = "1-800-799-7233";

/// A hotline descriptor attached to an assessment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resource {
    /// Human-readable service name
    pub name: String,
    /// Contact instruction carrying the verbatim number
    pub contact: String,
}

impl Resource {
    fn new(name: &str, contact: String) -> Self {
        Self {
            name: name.to_string(),
            contact,
        }
    }
}

/// Select hotline resources for the matched categories.
///
/// Suicide/self-harm pull in the Lifeline and Crisis Text Line; substance
/// adds SAMHSA; abuse adds the domestic-violence hotline. Any crisis-level
/// assessment carries the Lifeline regardless of category.
#[must_use]
pub fn resources_for(categories: &[String], level: RiskLevel) -> Vec<Resource> {
    let has = |name: &str| categories.iter().any(|c| c == name);
    let mut resources = Vec::new();

    if has("suicide") || has("self_harm") || level.is_crisis() {
        resources.push(Resource::new(
            "988 Suicide & Crisis Lifeline",
            format!("Call or text {LIFELINE}"),
        ));
        resources.push(Resource::new(
            "Crisis Text Line",
            format!("Text HOME to {CRISIS_TEXT_LINE}"),
        ));
    }
    if has("substance") {
        resources.push(Resource::new(
            "SAMHSA National Helpline",
            format!("Call {SAMHSA_HELPLINE}"),
        ));
    }
    if has("abuse") {
        resources.push(Resource::new(
            "National Domestic Violence Hotline",
            format!("Call {DV_HOTLINE}"),
        ));
    }

    resources
}

/// Compose the canned crisis reply for an assessment.
///
/// Returns `None` at level none; each other level has its own template.
#[must_use]
pub fn crisis_response(assessment: &RiskAssessment) -> Option<String> {
    let text = match assessment.level {
        RiskLevel::None => return None,
        RiskLevel::Low => format!(
            "Thanks for trusting me with that. I'm here with you. \
             If things ever feel like too much, the Crisis Text Line is \
             there around the clock - text HOME to {CRISIS_TEXT_LINE}."
        ),
        RiskLevel::Medium => format!(
            "That sounds really heavy, and I'm glad you told me. You \
             don't have to carry it alone. You can reach the 988 Suicide \
             & Crisis Lifeline any time - call or text {LIFELINE} - or \
             text HOME to {CRISIS_TEXT_LINE}."
        ),
        RiskLevel::High => format!(
            "I'm really concerned about how much pain you're in right \
             now. Please reach out to someone who can help right away: \
             call or text {LIFELINE} (Suicide & Crisis Lifeline), or text \
             HOME to {CRISIS_TEXT_LINE}. If you're in immediate danger, \
             call 911."
        ),
        RiskLevel::Critical => format!(
            "I'm worried about your safety right now, and you matter. \
             Please call or text {LIFELINE} right now - the Suicide & \
             Crisis Lifeline is free, confidential, and open 24/7. You \
             can also text HOME to {CRISIS_TEXT_LINE}. If you're in \
             immediate danger, please call 911."
        ),
    };

    let mut extras: Vec<&str> = Vec::new();
    for resource in &assessment.resources {
        if resource.contact.contains(SAMHSA_HELPLINE) {
            extras.push("SAMHSA's helpline can also help: 1-800-662-4357.");
        }
        if resource.contact.contains(DV_HOTLINE) {
            extras.push("The Domestic Violence Hotline is at 1-800-799-7233.");
        }
    }

    if extras.is_empty() {
        Some(text)
    } else {
        Some(format!("{} {}", text, extras.join(" ")))
    }
}

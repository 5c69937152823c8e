//! Message scoring

use crate::level::RiskLevel;
use crate::lexicon::{level_for_score, BASE_CATEGORIES, IMMEDIATE_RISK};
use crate::response::{resources_for, Resource};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Maximum characters of message text carried into logs and audit rows
const PREVIEW_CHARS: usize = 80;

/// Result of scoring a single inbound message
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskAssessment {
    /// Assessed risk level
    pub level: RiskLevel,
    /// Names of the categories that matched
    pub categories: Vec<String>,
    /// Phrases that matched, deduplicated, in lexicon order
    pub keywords: Vec<String>,
    /// Cumulative weighted score
    pub score: u32,
    /// Whether the message demands immediate intervention (critical only)
    pub requires_immediate_intervention: bool,
    /// Hotline descriptors relevant to the matched categories
    pub resources: Vec<Resource>,
}

impl RiskAssessment {
    fn none() -> Self {
        Self {
            level: RiskLevel::None,
            categories: Vec::new(),
            keywords: Vec::new(),
            score: 0,
            requires_immediate_intervention: false,
            resources: Vec::new(),
        }
    }
}

/// Truncate message text to a safe log/audit preview.
#[must_use]
pub fn preview(text: &str) -> String {
    if text.chars().count() <= PREVIEW_CHARS {
        text.to_string()
    } else {
        let head: String = text.chars().take(PREVIEW_CHARS).collect();
        format!("{}...", head)
    }
}

/// Score a message against the fixed category lexicons.
///
/// Case-insensitive substring matching; pure and deterministic. The
/// immediate-risk category only amplifies an already-nonzero base score.
/// Empty input yields `RiskLevel::None` with no categories.
#[must_use]
pub fn assess_risk(message: &str) -> RiskAssessment {
    let haystack = message.to_lowercase();
    if haystack.trim().is_empty() {
        return RiskAssessment::none();
    }

    let mut score = 0u32;
    let mut categories = Vec::new();
    let mut keywords: Vec<String> = Vec::new();

    for lexicon in &BASE_CATEGORIES {
        let mut matches = 0u32;
        for phrase in lexicon.phrases {
            if haystack.contains(phrase) {
                matches += 1;
                if !keywords.iter().any(|k| k == phrase) {
                    keywords.push((*phrase).to_string());
                }
            }
        }
        if matches > 0 {
            score += matches * lexicon.weight;
            categories.push(lexicon.name.to_string());
        }
    }

    // Amplifier only: acute phrasing on a zero base stays at none.
    if score > 0 {
        let mut matches = 0u32;
        for phrase in IMMEDIATE_RISK.phrases {
            if haystack.contains(phrase) {
                matches += 1;
                if !keywords.iter().any(|k| k == phrase) {
                    keywords.push((*phrase).to_string());
                }
            }
        }
        if matches > 0 {
            score += matches * IMMEDIATE_RISK.weight;
            categories.push(IMMEDIATE_RISK.name.to_string());
        }
    }

    let level = level_for_score(score);
    let resources = if score > 0 {
        resources_for(&categories, level)
    } else {
        Vec::new()
    };

    if level.is_crisis() {
        warn!(
            level = %level,
            score = score,
            categories = ?categories,
            preview = %preview(message),
            "elevated risk assessment"
        );
    }

    RiskAssessment {
        level,
        categories,
        keywords,
        score,
        requires_immediate_intervention: level == RiskLevel::Critical,
        resources,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_message_is_none() {
        let assessment = assess_risk("");
        assert_eq!(assessment.level, RiskLevel::None);
        assert!(assessment.categories.is_empty());
        assert!(assessment.keywords.is_empty());
        assert_eq!(assessment.score, 0);
        assert!(!assessment.requires_immediate_intervention);

        let blank = assess_risk("   \n ");
        assert_eq!(blank.level, RiskLevel::None);
    }

    #[test]
    fn test_benign_message_is_none() {
        let assessment = assess_risk("I had a good day today");
        assert_eq!(assessment.level, RiskLevel::None);
        assert!(assessment.categories.is_empty());
        assert!(assessment.resources.is_empty());
    }

    #[test]
    fn test_suicide_keyword_always_categorized() {
        for msg in [
            "I've been thinking about suicide",
            "sometimes I want to die",
            "I feel like everyone would be better off dead without me",
        ] {
            let assessment = assess_risk(msg);
            assert!(
                assessment.categories.contains(&"suicide".to_string()),
                "missing suicide category for {:?}",
                msg
            );
            assert_ne!(assessment.level, RiskLevel::None);
        }
    }

    #[test]
    fn test_acute_suicide_message_is_critical() {
        let assessment = assess_risk("I want to kill myself");
        assert!(assessment.categories.contains(&"suicide".to_string()));
        assert!(assessment
            .categories
            .contains(&"immediate_risk".to_string()));
        assert_eq!(assessment.level, RiskLevel::Critical);
        assert!(assessment.requires_immediate_intervention);
    }

    #[test]
    fn test_immediate_risk_never_stands_alone() {
        let assessment = assess_risk("I'm making dinner right now, talk tonight?");
        assert_eq!(assessment.level, RiskLevel::None);
        assert!(assessment.categories.is_empty());
        assert_eq!(assessment.score, 0);
    }

    #[test]
    fn test_immediate_risk_amplifies_nonzero_base() {
        let base = assess_risk("I relapsed");
        let amplified = assess_risk("I relapsed tonight");
        assert_eq!(base.score, 5);
        assert_eq!(amplified.score, 20);
        assert!(amplified
            .categories
            .contains(&"immediate_risk".to_string()));
        assert!(amplified.level > base.level);
    }

    #[test]
    fn test_two_categories_plus_immediate_is_crisis() {
        let assessment = assess_risk("I relapsed and I cut myself tonight");
        assert!(assessment.categories.len() >= 3);
        assert!(
            assessment.level >= RiskLevel::High,
            "got {}",
            assessment.level
        );
    }

    #[test]
    fn test_case_insensitive() {
        for msg in ["I want to kill myself", "he HITS me", "I Relapsed Tonight"] {
            let lower = assess_risk(msg);
            let upper = assess_risk(&msg.to_uppercase());
            assert_eq!(lower.level, upper.level, "level differs for {:?}", msg);
            assert_eq!(
                lower.categories, upper.categories,
                "categories differ for {:?}",
                msg
            );
        }
    }

    #[test]
    fn test_keywords_deduplicated() {
        // "kill myself" sits in both the suicide and immediate-risk lexicons
        let assessment = assess_risk("I want to kill myself");
        let count = assessment
            .keywords
            .iter()
            .filter(|k| *k == "kill myself")
            .count();
        assert_eq!(count, 1);
    }

    #[test]
    fn test_resources_follow_categories() {
        let substance = assess_risk("I drank too much again");
        assert!(substance
            .resources
            .iter()
            .any(|r| r.contact.contains("1-800-662-4357")));

        let abuse = assess_risk("I'm afraid of him, he hits me");
        assert!(abuse
            .resources
            .iter()
            .any(|r| r.contact.contains("1-800-799-7233")));
    }

    #[test]
    fn test_preview_truncates_on_char_boundary() {
        let short = "hello";
        assert_eq!(preview(short), "hello");

        let long = "а".repeat(200); // multi-byte
        let p = preview(&long);
        assert!(p.ends_with("..."));
        assert_eq!(p.chars().count(), 83);
    }
}

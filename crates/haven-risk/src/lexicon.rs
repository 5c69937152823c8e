//! Fixed category lexicons, weights, and score thresholds
//!
//! Every constant in this module is load-bearing: downstream routing,
//! stored audit rows, and the crisis-response templates all assume these
//! exact weights and thresholds. Treat them as configuration, not code to
//! tune.

use crate::level::RiskLevel;

/// A keyword category with a fixed per-match weight
#[derive(Debug, Clone, Copy)]
pub struct Lexicon {
    /// Category name as recorded in assessments and audit rows
    pub name: &'static str,
    /// Score added per matched phrase
    pub weight: u32,
    /// Lowercase phrases matched as substrings
    pub phrases: &'static [&'static str],
}

const SUICIDE: Lexicon = Lexicon {
    name: "suicide",
    weight: 10,
    phrases: &[
        "suicide",
        "suicidal",
        "kill myself",
        "want to kill myself",
        "end my life",
        "end it all",
        "want to die",
        "better off dead",
        "no reason to live",
        "take my own life",
        "don't want to be here anymore",
    ],
};

const SELF_HARM: Lexicon = Lexicon {
    name: "self_harm",
    weight: 7,
    phrases: &[
        "cut myself",
        "cutting myself",
        "hurt myself",
        "hurting myself",
        "self harm",
        "self-harm",
        "burn myself",
        "punish myself",
    ],
};

const ABUSE: Lexicon = Lexicon {
    name: "abuse",
    weight: 8,
    phrases: &[
        "hits me",
        "hit me",
        "beats me",
        "abusing me",
        "abused me",
        "afraid of him",
        "afraid of her",
        "threatens me",
        "threatened me",
        "won't let me leave",
        "hurts me",
    ],
};

const SUBSTANCE: Lexicon = Lexicon {
    name: "substance",
    weight: 5,
    phrases: &[
        "overdose",
        "overdosing",
        "too many pills",
        "drank too much",
        "blackout drunk",
        "relapse",
        "can't stop drinking",
        "can't stop using",
        "getting high again",
    ],
};

/// Acute-timing amplifier category.
///
/// Matches add 15 per phrase but only amplify an already-nonzero base
/// score; they never produce a risk level on their own.
pub const IMMEDIATE_RISK: Lexicon = Lexicon {
    name: "immediate_risk",
    weight: 15,
    phrases: &[
        "kill myself",
        "want to kill myself",
        "tonight",
        "right now",
        "have a plan",
        "wrote a note",
        "goodbye forever",
        "pills in my hand",
        "on the bridge",
        "loaded gun",
    ],
};

/// The four base-scoring categories, in recorded order
pub const BASE_CATEGORIES: [Lexicon; 4] = [SUICIDE, SELF_HARM, ABUSE, SUBSTANCE];

/// Map a cumulative score to its risk level.
///
/// Thresholds: 0 → none, <10 → low, <20 → medium, <40 → high, else
/// critical.
#[must_use]
pub fn level_for_score(score: u32) -> RiskLevel {
    match score {
        0 => RiskLevel::None,
        1..=9 => RiskLevel::Low,
        10..=19 => RiskLevel::Medium,
        20..=39 => RiskLevel::High,
        _ => RiskLevel::Critical,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_thresholds() {
        assert_eq!(level_for_score(0), RiskLevel::None);
        assert_eq!(level_for_score(5), RiskLevel::Low);
        assert_eq!(level_for_score(9), RiskLevel::Low);
        assert_eq!(level_for_score(10), RiskLevel::Medium);
        assert_eq!(level_for_score(19), RiskLevel::Medium);
        assert_eq!(level_for_score(20), RiskLevel::High);
        assert_eq!(level_for_score(39), RiskLevel::High);
        assert_eq!(level_for_score(40), RiskLevel::Critical);
        assert_eq!(level_for_score(200), RiskLevel::Critical);
    }

    #[test]
    fn test_weights_are_fixed() {
        let weights: Vec<(&str, u32)> = BASE_CATEGORIES
            .iter()
            .map(|lex| (lex.name, lex.weight))
            .collect();
        assert_eq!(
            weights,
            vec![
                ("suicide", 10),
                ("self_harm", 7),
                ("abuse", 8),
                ("substance", 5)
            ]
        );
        assert_eq!(IMMEDIATE_RISK.weight, 15);
    }

    #[test]
    fn test_phrases_are_lowercase() {
        for lex in BASE_CATEGORIES.iter().chain([&IMMEDIATE_RISK]) {
            for phrase in lex.phrases {
                assert_eq!(*phrase, phrase.to_lowercase(), "in {}", lex.name);
            }
        }
    }
}

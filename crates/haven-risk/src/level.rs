//! Ordinal risk level

use serde::{Deserialize, Serialize};

/// Ordinal severity classification for an inbound message.
///
/// Levels form a total order (`None < Low < Medium < High < Critical`);
/// comparisons go through the derived variant rank, never through the
/// string form.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    /// No risk indicators matched
    #[default]
    None,
    /// Weak indicators (score below 10)
    Low,
    /// Moderate indicators (score below 20)
    Medium,
    /// Strong indicators (score below 40)
    High,
    /// Acute indicators (score 40 or above)
    Critical,
}

impl RiskLevel {
    /// Get the string representation
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Critical => "critical",
        }
    }

    /// Parse from the lowercase string form
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "none" => Some(Self::None),
            "low" => Some(Self::Low),
            "medium" => Some(Self::Medium),
            "high" => Some(Self::High),
            "critical" => Some(Self::Critical),
            _ => None,
        }
    }

    /// Whether this level is a crisis (high or critical)
    #[must_use]
    pub fn is_crisis(&self) -> bool {
        matches!(self, Self::High | Self::Critical)
    }

    /// Whether a human should be pulled in (high or critical)
    #[must_use]
    pub fn requires_human_escalation(&self) -> bool {
        self.is_crisis()
    }

    /// Whether the message deserves a later review pass (anything but none)
    #[must_use]
    pub fn requires_review(&self) -> bool {
        *self != Self::None
    }
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

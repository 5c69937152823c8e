//! Command grammar and canned replies
//!
//! SMS convention: a command is the entire trimmed message, matched
//! case-insensitively. Commands bypass risk assessment entirely.

use haven_risk::{CRISIS_TEXT_LINE, DV_HOTLINE, LIFELINE, SAMHSA_HELPLINE};

/// A recognized keyword command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// What Haven is and how to use it
    Help,
    /// Hotline list
    Resources,
    /// Pause outbound messages
    Stop,
    /// Resume after STOP
    Start,
}

impl Command {
    /// Parse a command from a whole inbound message.
    ///
    /// Returns `None` for anything that is not exactly one of the
    /// keywords (after trimming, case-insensitive).
    #[must_use]
    pub fn parse(text: &str) -> Option<Self> {
        match text.trim().to_uppercase().as_str() {
            "HELP" => Some(Self::Help),
            "RESOURCES" => Some(Self::Resources),
            "STOP" | "UNSUBSCRIBE" => Some(Self::Stop),
            "START" => Some(Self::Start),
            _ => None,
        }
    }

    /// Keyword form, for logs
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Help => "HELP",
            Self::Resources => "RESOURCES",
            Self::Stop => "STOP",
            Self::Start => "START",
        }
    }
}

/// Canned reply for a command.
///
/// Hotline numbers are compliance-bearing literals rendered verbatim.
#[must_use]
pub fn command_reply(command: Command) -> String {
    match command {
        Command::Help => format!(
            "This is Haven, a text line you can lean on any time. Just \
             text what's on your mind. Text RESOURCES for crisis \
             hotlines, STOP to pause messages, START to resume. If you \
             need help right now, call or text {LIFELINE}."
        ),
        Command::Resources => format!(
            "988 Suicide & Crisis Lifeline: call or text {LIFELINE}. \
             Crisis Text Line: text HOME to {CRISIS_TEXT_LINE}. SAMHSA \
             helpline: {SAMHSA_HELPLINE}. Domestic Violence Hotline: \
             {DV_HOTLINE}. All free and confidential, 24/7."
        ),
        Command::Stop => format!(
            "Okay - you won't hear from me unless you text first. Text \
             START anytime to pick things back up. If you ever need \
             support right away, call or text {LIFELINE}."
        ),
        Command::Start => {
            "Welcome back. I'm here whenever you want to talk - just \
             text what's on your mind."
                .to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_is_case_insensitive_and_trims() {
        assert_eq!(Command::parse("help"), Some(Command::Help));
        assert_eq!(Command::parse("  STOP  "), Some(Command::Stop));
        assert_eq!(Command::parse("Resources"), Some(Command::Resources));
        assert_eq!(Command::parse("unsubscribe"), Some(Command::Stop));
        assert_eq!(Command::parse("start"), Some(Command::Start));
    }

    #[test]
    fn test_parse_rejects_embedded_keywords() {
        assert_eq!(Command::parse("please help me"), None);
        assert_eq!(Command::parse("I can't stop crying"), None);
        assert_eq!(Command::parse(""), None);
    }

    #[test]
    fn test_resources_reply_carries_verbatim_numbers() {
        let reply = command_reply(Command::Resources);
        assert!(reply.contains("988"));
        assert!(reply.contains("741741"));
        assert!(reply.contains("1-800-662-4357"));
        assert!(reply.contains("1-800-799-7233"));
    }

    #[test]
    fn test_stop_reply_mentions_lifeline() {
        assert!(command_reply(Command::Stop).contains("988"));
    }
}

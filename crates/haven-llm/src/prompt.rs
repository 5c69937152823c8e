//! Prompt construction from the context snapshot

use haven_store::ContextSnapshot;

/// How many recent exchanges to replay into the transcript
const MAX_HISTORY_EXCHANGES: usize = 6;

/// Role of a prompt turn
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptRole {
    /// The user's side
    User,
    /// Our side
    Assistant,
}

impl PromptRole {
    /// Wire-format role string
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

/// One turn in the generation transcript
#[derive(Debug, Clone)]
pub struct PromptTurn {
    /// Who said it
    pub role: PromptRole,
    /// What was said
    pub content: String,
}

/// Build the system prompt for a generation call.
///
/// Injects first-time/returning status, derived topic and mood, and -
/// when the session is flagged in-crisis - explicit risk-aware guidance.
#[must_use]
pub fn build_system_prompt(context: &ContextSnapshot) -> String {
    let mut prompt = String::from(
        "You are Haven, a warm, steady SMS companion. You listen without \
         judgment, reflect what you hear, and gently encourage healthy \
         next steps. You are not a therapist and you never diagnose. \
         Keep replies under 300 characters, plain text, no markdown, at \
         most one question per reply.",
    );

    if context.is_first_time {
        prompt.push_str(
            " This is the user's first message ever: briefly introduce \
             yourself and let them know they can text HELP for options.",
        );
    } else {
        prompt.push_str(" This is a returning user; don't reintroduce yourself.");
    }

    if let Some(topic) = &context.current_topic {
        prompt.push_str(&format!(
            " They have recently been talking about {}.",
            topic
        ));
    }
    if let Some(mood) = &context.mood {
        prompt.push_str(&format!(" Their recent mood has read as {}.", mood));
    }

    if context.in_crisis || context.risk_level.is_crisis() {
        prompt.push_str(
            " IMPORTANT: this user has shown signs of crisis. A crisis \
             message with hotline numbers has already been sent. Be calm \
             and direct, take them seriously, do not minimize, and remind \
             them that the 988 Suicide & Crisis Lifeline is available if \
             they need more than you can give.",
        );
    } else if context.has_seen_resources {
        prompt.push_str(
            " They have already been shown crisis resources; don't repeat \
             hotline numbers unless they ask.",
        );
    }

    prompt
}

/// Build the transcript: recent history plus the current message.
///
/// History is replayed oldest-first and capped so a long session never
/// blows the request out; the inbound message is always the final user
/// turn.
#[must_use]
pub fn build_turns(message: &str, context: &ContextSnapshot) -> Vec<PromptTurn> {
    let mut turns = Vec::new();

    let history = &context.recent_exchanges;
    let start = history.len().saturating_sub(MAX_HISTORY_EXCHANGES);
    for exchange in &history[start..] {
        turns.push(PromptTurn {
            role: PromptRole::User,
            content: exchange.user_text.clone(),
        });
        turns.push(PromptTurn {
            role: PromptRole::Assistant,
            content: exchange.assistant_text.clone(),
        });
    }

    turns.push(PromptTurn {
        role: PromptRole::User,
        content: message.to_string(),
    });

    turns
}

#[cfg(test)]
mod tests {
    use super::*;
    use haven_risk::{assess_risk, RiskLevel};
    use haven_store::Session;

    fn snapshot_for(session: &Session) -> ContextSnapshot {
        ContextSnapshot::from_session(session)
    }

    #[test]
    fn test_first_time_guidance() {
        let session = Session::new("user");
        let prompt = build_system_prompt(&snapshot_for(&session));
        assert!(prompt.contains("first message"));

        let mut returning = Session::new("user");
        returning.is_first_time = false;
        let prompt = build_system_prompt(&snapshot_for(&returning));
        assert!(prompt.contains("returning user"));
    }

    #[test]
    fn test_crisis_guidance_injected() {
        let mut session = Session::new("user");
        session.flags.in_crisis = true;
        session.risk_level = RiskLevel::Critical;
        let prompt = build_system_prompt(&snapshot_for(&session));
        assert!(prompt.contains("signs of crisis"));
        assert!(prompt.contains("988"));
    }

    #[test]
    fn test_seen_resources_suppresses_repeats() {
        let mut session = Session::new("user");
        session.flags.has_seen_resources = true;
        let prompt = build_system_prompt(&snapshot_for(&session));
        assert!(prompt.contains("already been shown"));
        assert!(!prompt.contains("signs of crisis"));
    }

    #[test]
    fn test_topic_and_mood_injected() {
        let mut session = Session::new("user");
        session.current_topic = Some("work".to_string());
        session.mood = Some("anxious".to_string());
        let prompt = build_system_prompt(&snapshot_for(&session));
        assert!(prompt.contains("work"));
        assert!(prompt.contains("anxious"));
    }

    #[test]
    fn test_turns_end_with_current_message() {
        let mut session = Session::new("user");
        let assessment = assess_risk("hello");
        for i in 0..10 {
            session.record_exchange(format!("q{}", i), format!("a{}", i), &assessment);
        }

        let turns = build_turns("how are you?", &snapshot_for(&session));
        // 6 replayed exchanges * 2 + current message
        assert_eq!(turns.len(), 13);
        assert_eq!(turns[0].content, "q4");
        let last = turns.last().unwrap();
        assert_eq!(last.role, PromptRole::User);
        assert_eq!(last.content, "how are you?");
    }

    #[test]
    fn test_turns_for_empty_history() {
        let session = Session::new("user");
        let turns = build_turns("hi", &snapshot_for(&session));
        assert_eq!(turns.len(), 1);
        assert_eq!(turns[0].role, PromptRole::User);
    }
}

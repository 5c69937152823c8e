//! Mood and topic derivation from inbound text
//!
//! Deterministic keyword scans in the same spirit as the risk lexicons:
//! case-insensitive substring counts, ties broken by list order. These
//! feed the session's `mood` and `current_topic` fields and, through
//! them, prompt construction.

const POSITIVE: &[&str] = &[
    "good", "great", "happy", "better", "excited", "proud", "grateful", "relieved", "hopeful",
];

const NEGATIVE: &[&str] = &[
    "sad", "awful", "terrible", "depressed", "lonely", "hopeless", "miserable", "angry", "upset",
    "crying", "empty",
];

const ANXIOUS: &[&str] = &[
    "anxious", "anxiety", "worried", "nervous", "panic", "stressed", "overwhelmed", "scared",
    "on edge",
];

const TOPICS: &[(&str, &[&str])] = &[
    ("work", &["work", "job", "boss", "coworker", "shift", "fired", "laid off"]),
    (
        "family",
        &["family", "my mom", "my dad", "mother", "father", "brother", "sister", "parents"],
    ),
    (
        "relationship",
        &["boyfriend", "girlfriend", "partner", "husband", "wife", "breakup", "broke up", "dating"],
    ),
    (
        "school",
        &["school", "class", "exam", "homework", "teacher", "college", "grades"],
    ),
    (
        "health",
        &["doctor", "sick", "pain", "hospital", "medication", "meds", "therapy", "therapist"],
    ),
    (
        "sleep",
        &["sleep", "insomnia", "exhausted", "nightmare", "can't sleep", "awake all night"],
    ),
    ("money", &["money", "rent", "bills", "debt", "broke", "paycheck"]),
];

fn count_matches(haystack: &str, phrases: &[&str]) -> usize {
    phrases.iter().filter(|p| haystack.contains(*p)).count()
}

/// Derive a mood label from raw inbound text.
///
/// Returns one of `positive`, `negative`, `anxious`, or `neutral`.
/// Anxiety outranks general negativity on ties; anything without a clear
/// signal reads as neutral.
#[must_use]
pub fn derive_mood(text: &str) -> &'static str {
    let haystack = text.to_lowercase();
    let anxious = count_matches(&haystack, ANXIOUS);
    let negative = count_matches(&haystack, NEGATIVE);
    let positive = count_matches(&haystack, POSITIVE);

    if anxious > 0 && anxious >= negative && anxious >= positive {
        "anxious"
    } else if negative > 0 && negative >= positive {
        "negative"
    } else if positive > 0 {
        "positive"
    } else {
        "neutral"
    }
}

/// Derive a conversation topic from raw inbound text, if any stands out.
///
/// The topic with the most matched phrases wins; ties go to the earlier
/// entry in the fixed topic list.
#[must_use]
pub fn derive_topic(text: &str) -> Option<&'static str> {
    let haystack = text.to_lowercase();

    let mut best: Option<(&'static str, usize)> = None;
    for (topic, phrases) in TOPICS {
        let count = count_matches(&haystack, phrases);
        if count > 0 && best.map_or(true, |(_, best_count)| count > best_count) {
            best = Some((topic, count));
        }
    }

    best.map(|(topic, _)| topic)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mood_positive() {
        assert_eq!(derive_mood("I had a good day today"), "positive");
        assert_eq!(derive_mood("Feeling GRATEFUL and happy"), "positive");
    }

    #[test]
    fn test_mood_negative() {
        assert_eq!(derive_mood("I feel so lonely and sad"), "negative");
    }

    #[test]
    fn test_mood_anxious_outranks_negative_on_tie() {
        assert_eq!(derive_mood("I'm worried and upset"), "anxious");
    }

    #[test]
    fn test_mood_neutral_without_signal() {
        assert_eq!(derive_mood("the bus was late"), "neutral");
        assert_eq!(derive_mood(""), "neutral");
    }

    #[test]
    fn test_topic_detection() {
        assert_eq!(derive_topic("my boss yelled at me at work"), Some("work"));
        assert_eq!(derive_topic("fight with my mom again"), Some("family"));
        assert_eq!(derive_topic("can't sleep, awake all night"), Some("sleep"));
        assert_eq!(derive_topic("the bus was late"), None);
    }

    #[test]
    fn test_topic_most_matches_wins() {
        // Two sleep phrases beat one work phrase
        assert_eq!(
            derive_topic("work has me exhausted and I can't sleep"),
            Some("sleep")
        );
    }

    #[test]
    fn test_case_insensitive() {
        assert_eq!(derive_topic("MY BOSS IS THE WORST"), Some("work"));
        assert_eq!(derive_mood("SO STRESSED"), "anxious");
    }
}

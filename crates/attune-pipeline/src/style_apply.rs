//! Response post-processing (§4.8 step 7): mechanical style edits driven
//! by `attune_personality::StyleDirectives`.

use attune_core::random::chance;
use attune_personality::{EmojiAllowance, EmpathyPrefix, StyleDirectives};

const CASUAL_CONTRACTIONS: &[(&str, &str)] = &[
    ("I am", "I'm"),
    ("I have", "I've"),
    ("I would", "I'd"),
    ("I will", "I'll"),
    ("do not", "don't"),
    ("does not", "doesn't"),
    ("cannot", "can't"),
    ("will not", "won't"),
    ("it is", "it's"),
    ("that is", "that's"),
];

const TOPIC_EMOJI: &[(&str, &str)] = &[
    ("game", "🎮"),
    ("music", "🎵"),
    ("movie", "🎬"),
    ("code", "💻"),
    ("science", "🔬"),
    ("space", "🚀"),
    ("food", "🍕"),
];

const DISTRESS_KEYWORDS: &[&str] = &[
    "i'm struggling",
    "i am struggling",
    "i feel awful",
    "i feel terrible",
    "this is really hard",
    "i'm overwhelmed",
    "i am overwhelmed",
    "i don't know what to do",
];

const FOLLOW_UP_QUESTIONS: &[&str] = &[
    " Want me to go into more detail?",
    " Is there a specific part you'd like me to expand on?",
    " Should I take a different angle on this?",
];

/// Apply every directive in order, matching §4.8 step 7's listed sequence.
pub fn post_process(
    response: &str,
    style: StyleDirectives,
    active_topics: &[&str],
    user_uses_emoji: bool,
    now: f64,
) -> String {
    let mut text = response.to_string();

    if style.casual_contractions {
        for (long, short) in CASUAL_CONTRACTIONS {
            text = text.replace(long, short);
        }
    } else if style.formal_expansions {
        for (long, short) in CASUAL_CONTRACTIONS {
            text = text.replace(short, long);
        }
    }

    if matches!(style.emoji_allowance, EmojiAllowance::Moderate) && user_uses_emoji {
        let already_has_emoji = TOPIC_EMOJI.iter().any(|(_, e)| text.contains(e));
        if !already_has_emoji && chance(style.humor_emoji_chance) {
            if let Some((_, emoji)) = active_topics
                .iter()
                .find_map(|t| TOPIC_EMOJI.iter().find(|(topic, _)| t.contains(topic)))
            {
                text.push(' ');
                text.push_str(emoji);
            }
        }
    }

    if matches!(style.empathy_prefix, EmpathyPrefix::Soft) && contains_distress(&text) {
        text = format!("That sounds tough. {text}");
    }

    if style.follow_up_suggestion && !text.contains('?') && chance(0.2) {
        let idx = (now as u64 as usize) % FOLLOW_UP_QUESTIONS.len();
        text.push_str(FOLLOW_UP_QUESTIONS[idx]);
    }

    text
}

fn contains_distress(text: &str) -> bool {
    let lower = text.to_lowercase();
    DISTRESS_KEYWORDS.iter().any(|kw| lower.contains(kw))
}

#[cfg(test)]
mod tests {
    use super::*;
    use attune_personality::{EmojiAllowance, EmpathyPrefix};

    fn style(casual: bool) -> StyleDirectives {
        StyleDirectives {
            casual_contractions: casual,
            formal_expansions: !casual,
            emoji_allowance: EmojiAllowance::None,
            empathy_prefix: EmpathyPrefix::None,
            humor_emoji_chance: 0.0,
            follow_up_suggestion: false,
        }
    }

    #[test]
    fn casual_contractions_apply() {
        let out = post_process("I am going to help.", style(true), &[], false, 0.0);
        assert_eq!(out, "I'm going to help.");
    }

    #[test]
    fn formal_expansions_apply() {
        let out = post_process("I'm going to help.", style(false), &[], false, 0.0);
        assert_eq!(out, "I am going to help.");
    }

    #[test]
    fn empathy_prefix_added_on_distress_keyword() {
        let mut s = style(true);
        s.empathy_prefix = EmpathyPrefix::Soft;
        let out = post_process("I'm struggling with this.", s, &[], false, 0.0);
        assert!(out.starts_with("That sounds tough."));
    }
}

//! `attune-context` — the ContextBuilder from §4.6: per-session rolling
//! conversation windows, importance scoring, topic extraction, and
//! prompt assembly for the provider call.

mod importance;
mod topics;

pub use importance::score as importance_score;
pub use topics::extract_topics;

use attune_personality::style_directives;
use attune_store::types::{ConversationWindow, PersonalityTraits, Turn, TurnRole};

const MAX_IMPORTANT_IN_PROMPT: usize = 3;
const MAX_WINDOW_IN_PROMPT: usize = 8;

#[derive(Debug, Clone)]
pub struct PromptMessage {
    pub role: TurnRole,
    pub content: String,
}

/// The outcome of assembling one request's prompt (§4.6 step 5).
#[derive(Debug, Clone)]
pub struct BuiltContext {
    pub messages: Vec<PromptMessage>,
    pub active_topics: Vec<&'static str>,
}

/// Append an incoming turn, scoring and trimming per §4.6, then assemble
/// the provider-bound prompt from the system prompt plus recent
/// important and windowed turns.
pub fn build(
    window: &mut ConversationWindow,
    incoming_content: &str,
    timestamp: &str,
    traits: &PersonalityTraits,
) -> BuiltContext {
    let importance = importance_score(TurnRole::User, incoming_content);
    window.append(Turn {
        role: TurnRole::User,
        content: incoming_content.to_string(),
        timestamp: timestamp.to_string(),
        importance,
    });

    let active_topics = extract_topics(incoming_content)
        .into_iter()
        .take(3)
        .collect();

    let system = PromptMessage {
        role: TurnRole::System,
        content: system_prompt(traits),
    };

    let mut messages = vec![system];
    let mut seen = std::collections::HashSet::new();

    for turn in window.important.iter().rev().take(MAX_IMPORTANT_IN_PROMPT).rev() {
        if seen.insert((turn.timestamp.clone(), turn.content.clone())) {
            messages.push(PromptMessage {
                role: turn.role,
                content: turn.content.clone(),
            });
        }
    }
    for turn in window.turns.iter().rev().take(MAX_WINDOW_IN_PROMPT).rev() {
        if seen.insert((turn.timestamp.clone(), turn.content.clone())) {
            messages.push(PromptMessage {
                role: turn.role,
                content: turn.content.clone(),
            });
        }
    }

    BuiltContext {
        messages,
        active_topics,
    }
}

/// Record the assistant's reply in the window with the same importance
/// scoring (§4.6, post-response step).
pub fn append_assistant_turn(window: &mut ConversationWindow, content: &str, timestamp: &str) {
    let importance = importance_score(TurnRole::Assistant, content);
    window.append(Turn {
        role: TurnRole::Assistant,
        content: content.to_string(),
        timestamp: timestamp.to_string(),
        importance,
    });
}

fn system_prompt(traits: &PersonalityTraits) -> String {
    let style = style_directives(traits);
    format!(
        "You are operating in {} mode with humor {}, honesty {}, formality {}, empathy {}, \
         strictness {}, initiative {}. Casual contractions: {}. Formal expansions: {}. \
         Follow-up suggestions: {}.",
        attune_personality::mode_label(traits.mode),
        traits.humor,
        traits.honesty,
        traits.formality,
        traits.empathy,
        traits.strictness,
        traits.initiative,
        style.casual_contractions,
        style.formal_expansions,
        style.follow_up_suggestion,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_appends_and_includes_system_prompt() {
        let mut window = ConversationWindow::empty();
        let traits = PersonalityTraits::defaults();
        let built = build(&mut window, "can you help me explain this?", "t0", &traits);
        assert_eq!(window.turns.len(), 1);
        assert_eq!(built.messages[0].role, TurnRole::System);
        assert!(built.messages.len() > 1);
    }

    #[test]
    fn important_turn_is_retained_across_appends() {
        let mut window = ConversationWindow::empty();
        let traits = PersonalityTraits::defaults();
        build(&mut window, "please help me remember this strategy?", "t0", &traits);
        assert_eq!(window.important.len(), 1);
        for i in 1..25 {
            build(&mut window, "ok", &format!("t{i}"), &traits);
        }
        assert!(window.turns.len() <= attune_store::types::MAX_WINDOW);
        assert_eq!(window.important.len(), 1);
    }
}

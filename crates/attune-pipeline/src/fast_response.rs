//! The fast-response shortcut (§4.8 step 3): trivial inputs get a short
//! deterministic reply instead of a provider round-trip.

use attune_store::types::PersonalityTraits;

const GREETINGS: &[&str] = &["hi", "hello", "hey", "yo", "sup"];
const THANKS: &[&str] = &["thanks", "thank you", "thx", "ty"];
const PINGS: &[&str] = &["ping"];

pub fn trivial_reply(content: &str, traits: &PersonalityTraits) -> Option<&'static str> {
    let trimmed = content.trim().trim_end_matches(['!', '.', '?']).to_lowercase();
    let casual = traits.formality < 50;

    if GREETINGS.contains(&trimmed.as_str()) {
        return Some(if casual { "Hey! What's up?" } else { "Hello. How can I help?" });
    }
    if THANKS.contains(&trimmed.as_str()) {
        return Some(if casual { "Anytime!" } else { "You're welcome." });
    }
    if PINGS.contains(&trimmed.as_str()) {
        return Some("pong");
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn greeting_matches_case_and_punctuation_insensitively() {
        let traits = PersonalityTraits::defaults();
        assert!(trivial_reply("Hi!", &traits).is_some());
        assert!(trivial_reply("HELLO", &traits).is_some());
    }

    #[test]
    fn non_trivial_message_falls_through() {
        let traits = PersonalityTraits::defaults();
        assert!(trivial_reply("can you help me debug this function", &traits).is_none());
    }

    #[test]
    fn ping_is_pong_regardless_of_formality() {
        let mut traits = PersonalityTraits::defaults();
        traits.formality = 95;
        assert_eq!(trivial_reply("ping", &traits), Some("pong"));
    }
}

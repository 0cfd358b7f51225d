//! The IdentityResponder shortcut (§4.8 step 2): a fixed set of
//! self-referential questions answered from a template table instead of
//! a provider round-trip, grounded on the original assistant's
//! identity-question classifier and adaptive-response generator.

use std::sync::OnceLock;

use attune_store::types::PersonalityTraits;
use regex::RegexSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentityCategory {
    WhoAreYou,
    WhatCanYouDo,
    WhoCreatedYou,
    YourPurpose,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseStyle {
    Casual,
    Professional,
    Academic,
    Playful,
    Supportive,
    Analytical,
}

struct PatternSets {
    who_are_you: RegexSet,
    what_can_you_do: RegexSet,
    who_created_you: RegexSet,
    your_purpose: RegexSet,
}

fn patterns() -> &'static PatternSets {
    static SETS: OnceLock<PatternSets> = OnceLock::new();
    SETS.get_or_init(|| PatternSets {
        who_are_you: RegexSet::new([
            r"\bwho are you\b",
            r"\bwhat are you\b",
            r"\btell me about yourself\b",
            r"\bintroduce yourself\b",
        ])
        .expect("static identity patterns are valid"),
        what_can_you_do: RegexSet::new([
            r"\bwhat can you do\b",
            r"\bwhat are you capable of\b",
            r"\byour capabilities\b",
            r"\bwhat features\b",
            r"\bwhat functions\b",
            r"\bhow can you help\b",
            r"\bwhat makes you special\b",
            r"\bwhat makes you unique\b",
        ])
        .expect("static identity patterns are valid"),
        who_created_you: RegexSet::new([
            r"\bwho made you\b",
            r"\bwho created you\b",
            r"\bwho built you\b",
            r"\byour creator\b",
            r"\byour developer\b",
            r"\bwho is your owner\b",
        ])
        .expect("static identity patterns are valid"),
        your_purpose: RegexSet::new([
            r"\bwhy were you created\b",
            r"\bwhat is your purpose\b",
            r"\byour mission\b",
            r"\bwhy do you exist\b",
            r"\bwhat is your goal\b",
            r"\byour background\b",
        ])
        .expect("static identity patterns are valid"),
    })
}

/// Classify `message` against the fixed identity-question table. Checked
/// in a fixed order so a message matching more than one category (rare)
/// resolves deterministically to the first.
pub fn detect_question_type(message: &str) -> Option<IdentityCategory> {
    let lower = message.to_lowercase();
    let sets = patterns();
    if sets.who_are_you.is_match(&lower) {
        Some(IdentityCategory::WhoAreYou)
    } else if sets.what_can_you_do.is_match(&lower) {
        Some(IdentityCategory::WhatCanYouDo)
    } else if sets.who_created_you.is_match(&lower) {
        Some(IdentityCategory::WhoCreatedYou)
    } else if sets.your_purpose.is_match(&lower) {
        Some(IdentityCategory::YourPurpose)
    } else {
        None
    }
}

/// Style is read from the effective personality's formality/humor/empathy
/// (§4.8 step 2), not from conversational tone — there is no sentiment
/// classifier in scope here.
pub fn determine_style(traits: &PersonalityTraits) -> ResponseStyle {
    if traits.empathy >= 80 {
        ResponseStyle::Supportive
    } else if traits.formality >= 80 {
        ResponseStyle::Academic
    } else if traits.formality >= 60 {
        ResponseStyle::Professional
    } else if traits.humor >= 70 {
        ResponseStyle::Playful
    } else if traits.humor >= 40 {
        ResponseStyle::Casual
    } else {
        ResponseStyle::Analytical
    }
}

/// Pick one of a category/style's template variants using the same
/// deterministic-enough clock pick the router's fallback phrase uses.
pub fn respond(category: IdentityCategory, style: ResponseStyle, now: f64) -> String {
    let variants = templates(category, style);
    let idx = (now as u64 as usize) % variants.len();
    variants[idx].to_string()
}

fn templates(category: IdentityCategory, style: ResponseStyle) -> &'static [&'static str] {
    use IdentityCategory::*;
    use ResponseStyle::*;
    match (category, style) {
        (WhoAreYou, Casual) => &[
            "Hey! I'm an adaptive assistant — I pick up on your tone and adjust how I talk, and I keep track of what we've discussed so the conversation actually builds on itself.",
            "I'm a chat assistant that adapts as we go. No fixed script — my personality traits shift based on how a conversation unfolds.",
        ],
        (WhoAreYou, Professional) => &[
            "I'm an adaptive AI assistant: my personality traits (humor, formality, empathy, and others) are tuned per server and per user, and I route requests across multiple model providers for reliability.",
            "I'm an assistant built around a personality model that adapts over time, backed by a provider-fallback system so a single outage doesn't take me offline.",
        ],
        (WhoAreYou, Academic) => &[
            "I am an adaptive-response system: a personality model resolves guild defaults, user overrides, and live adaptation signals into an effective trait profile before each reply is generated.",
            "My architecture layers a configurable personality model over a multi-provider dispatch core, with a safety filter and contextual memory informing every response.",
        ],
        (WhoAreYou, Playful) => &[
            "I'm whatever kind of assistant this conversation needs me to be — I adapt, I remember, and I try not to be boring about it. 🙂",
            "Think of me as a chat bot with a dial for humor, formality, and empathy — and I'm always quietly adjusting it.",
        ],
        (WhoAreYou, Supportive) => &[
            "I'm here to listen and adapt to what you need — my responses shift to be more supportive when the conversation calls for it.",
            "I'm an assistant designed to pay attention to context and respond with a bit more care when things seem to call for it.",
        ],
        (WhoAreYou, Analytical) => &[
            "I'm a dispatch core that routes conversation through a personality model, a context builder, and a provider router, in that order.",
            "Functionally: I resolve an effective personality, assemble a bounded conversation window, and delegate generation to whichever provider is healthy.",
        ],

        (WhatCanYouDo, Casual) => &[
            "Quite a bit — I chat, adapt my tone to you, remember recent context, and keep things civil with some built-in moderation.",
            "I can hold a conversation, adjust my style on the fly, and generate the occasional image if that's enabled here.",
        ],
        (WhatCanYouDo, Professional) => &[
            "My capabilities include adaptive conversation with per-user and per-guild personality tuning, multi-provider fallback for reliability, contextual memory across a session window, automated content-safety screening, and optional image generation.",
            "I provide adaptive dialogue backed by a personality model, a bounded conversation window, provider failover, and a safety layer that screens for spam, abuse, and unsafe links.",
        ],
        (WhatCanYouDo, Analytical) => &[
            "Architecturally: (1) a PersonalityModel resolving effective traits per request, (2) a ContextBuilder assembling a bounded, importance-weighted window, (3) a ProviderRouter with cache-then-fallback dispatch, (4) a SafetyFilter with a graduated punishment ladder, and (5) an optional image subsystem with rate limiting.",
            "My pipeline: admission, personality+context resolution, provider dispatch with caching and fallback, style post-processing, then delivery — with a safety filter running ahead of all of it.",
        ],

        (WhoCreatedYou, Casual) => &[
            "I was put together by whoever runs this bot instance — the operators configure my personality defaults and which providers I use.",
            "The people running this server's bot set me up — I don't have a single fixed origin story beyond that.",
        ],
        (WhoCreatedYou, Professional) => &[
            "I'm operated by whoever administers this deployment; they configure my personality defaults, provider list, and safety thresholds.",
            "My configuration — personality defaults, providers, and safety rules — is owned by this deployment's operators.",
        ],
        (WhoCreatedYou, Academic) => &[
            "I am instantiated from a configuration owned by this deployment's operators, who set the initial personality defaults, provider roster, and safety parameters.",
            "My governing configuration — personality priors, provider ordering, retention policy — is authored by this installation's operators, not by me.",
        ],
        (WhoCreatedYou, Playful) => &[
            "Whoever's running this bot gets the credit (or the blame) for my settings. 😄",
            "Ask the people who configured me — I just do the adapting part.",
        ],
        (WhoCreatedYou, Supportive) => &[
            "This bot's operators set me up and keep tuning how I respond — if something about me isn't working for you, they can usually adjust it.",
            "The people running this instance configured me, and they can change how I behave if you'd like something different.",
        ],
        (WhoCreatedYou, Analytical) => &[
            "Configuration ownership sits with this deployment's operators: personality defaults, provider roster, and safety thresholds are all set outside of me.",
            "I don't have self-knowledge of an authorship event — only of the configuration values the operators of this instance supplied.",
        ],

        (YourPurpose, Casual) => &[
            "My job is to be a useful, adaptive conversation partner — I try to match how you're talking and stay out of the way otherwise.",
            "I'm here to chat, help out, and get better at matching your style the more we talk.",
        ],
        (YourPurpose, Professional) => &[
            "My purpose is to provide adaptive, context-aware conversational assistance while maintaining consistent safety and reliability guarantees.",
            "I exist to handle conversational requests adaptively — adjusting tone per user, maintaining context, and failing over gracefully when a provider is unavailable.",
        ],
        (YourPurpose, Academic) => &[
            "My purpose is to demonstrate adaptive personality resolution combined with resilient multi-provider dispatch, bounded by an explicit safety and retention policy.",
            "I represent an architecture for adaptive conversational assistance: personality state evolves from interaction signals within bounded, auditable limits.",
        ],
        (YourPurpose, Playful) => &[
            "Mostly? Be helpful, stay adaptive, and not be annoying about it.",
            "My mission, such as it is: chat well, adapt fast, don't break anything.",
        ],
        (YourPurpose, Supportive) => &[
            "I'm here to be genuinely useful and to adjust to what you need from the conversation, whatever that looks like today.",
            "My purpose is to be a steady, adaptable presence in the conversation — here to help, not to get in the way.",
        ],
        (YourPurpose, Analytical) => &[
            "Functionally, my purpose is to resolve an effective personality per request and route it through a reliable, fallback-capable provider layer under an explicit safety policy.",
            "I exist to provide adaptive dispatch: personality resolution, contextual memory, and multi-provider routing, all bounded by the configured safety and retention rules.",
        ],

        // Styles with no dedicated template fall back to the casual set,
        // matching the original generator's own fallback behavior.
        (cat, _) => templates(cat, Casual),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_who_are_you() {
        assert_eq!(
            detect_question_type("hey, who are you?"),
            Some(IdentityCategory::WhoAreYou)
        );
    }

    #[test]
    fn detects_capability_question() {
        assert_eq!(
            detect_question_type("what can you do around here"),
            Some(IdentityCategory::WhatCanYouDo)
        );
    }

    #[test]
    fn no_match_returns_none() {
        assert_eq!(detect_question_type("what's the weather like"), None);
    }

    #[test]
    fn high_empathy_selects_supportive_style() {
        let mut t = PersonalityTraits::defaults();
        t.empathy = 90;
        assert_eq!(determine_style(&t), ResponseStyle::Supportive);
    }

    #[test]
    fn respond_picks_a_nonempty_template() {
        let text = respond(IdentityCategory::WhoAreYou, ResponseStyle::Casual, 0.0);
        assert!(!text.is_empty());
    }
}

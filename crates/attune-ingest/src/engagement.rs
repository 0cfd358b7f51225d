//! Proactive-engagement scoring (§4.10): a rule-based [0,1] score over
//! five weighted signals, directly grounded in the original engagement
//! scorer. The final random nudge is the one intentionally
//! non-deterministic term here — everything upstream of it is pure.

use attune_core::{random::chance, ChannelId};
use dashmap::DashMap;

const TOPIC_GROUPS: &[&[&str]] = &[
    &["space", "universe", "cosmos", "galaxy", "star", "planet", "black hole", "nasa", "spacex"],
    &["game", "gaming", "multiplayer", "strategy game", "rpg", "playthrough"],
    &["science", "research", "discovery", "experiment", "theory", "physics", "chemistry"],
    &["ai", "artificial intelligence", "machine learning", "programming", "tech"],
    &["philosophy", "meaning", "existence", "consciousness", "reality", "truth"],
];
const TRENDING_KEYWORDS: &[&str] = &[
    "breakthrough", "discovery", "announcement", "news", "update", "launch", "mission",
    "exploration", "innovation",
];

const EMOTION_GROUPS: &[&[&str]] = &[
    &["amazing", "incredible", "fantastic", "awesome", "mind-blowing", "wow"],
    &["confused", "don't understand", "unclear", "lost", "puzzled"],
    &["frustrated", "annoying", "difficult", "struggling", "stuck"],
    &["wonder", "curious", "interesting", "fascinating", "how does", "why does"],
    &["achieved", "accomplished", "success", "completed", "finished", "solved"],
];
const SUPPORT_KEYWORDS: &[&str] = &[
    "help", "advice", "guidance", "suggestions", "recommendations", "what should", "how can",
    "need to know",
];

const QUESTION_STARTERS: &[&str] = &[
    "how", "what", "why", "when", "where", "who", "which", "can you", "could you", "would you",
    "do you know",
];
const HELP_PATTERNS: &[&str] = &[
    "i need", "i'm looking for", "can anyone", "does anyone know", "how do i",
    "what's the best way", "any suggestions",
];

const COMPLEX_WORDS: &[&str] = &[
    "algorithm", "implementation", "optimization", "architecture", "methodology", "analysis",
    "synthesis", "comprehensive",
];

const ENGAGEMENT_THRESHOLD: f64 = 0.4;

fn topic_interest_score(content_lower: &str) -> f64 {
    let mut score = 0.0;
    for group in TOPIC_GROUPS {
        if group.iter().any(|kw| content_lower.contains(kw)) {
            score += 0.2;
        }
    }
    if TRENDING_KEYWORDS.iter().any(|kw| content_lower.contains(kw)) {
        score += 0.15;
    }
    score.min(0.4)
}

fn emotional_cue_score(content_lower: &str) -> f64 {
    let mut score = 0.0;
    for group in EMOTION_GROUPS {
        if group.iter().any(|kw| content_lower.contains(kw)) {
            score += 0.15;
        }
    }
    if SUPPORT_KEYWORDS.iter().any(|kw| content_lower.contains(kw)) {
        score += 0.15;
    }
    score.min(0.4)
}

fn help_seeking_score(content_lower: &str) -> f64 {
    let mut score = 0.0;
    if QUESTION_STARTERS.iter().any(|s| content_lower.starts_with(s)) {
        score += 0.3;
    }
    if content_lower.contains('?') {
        score += 0.1;
    }
    if HELP_PATTERNS.iter().any(|p| content_lower.contains(p)) {
        score += 0.25;
    }
    score.min(0.5)
}

/// Bonus proportional to (but capped well below) how often this user has
/// interacted with the bot before — new users get nothing, frequent
/// ones approach the cap without ever reaching it.
fn personal_history_score(total_interactions: u64) -> f64 {
    match total_interactions {
        0 => 0.0,
        1..=10 => 0.1,
        11..=50 => 0.2,
        _ => 0.35,
    }
}

fn message_complexity_score(content: &str) -> f64 {
    let mut score = 0.0;
    if content.len() > 200 {
        score += 0.2;
    }
    let sentence_count = content.split('.').filter(|s| !s.trim().is_empty()).count();
    if sentence_count > 2 {
        score += 0.15;
    }
    let lower = content.to_lowercase();
    if COMPLEX_WORDS.iter().any(|w| lower.contains(w)) {
        score += 0.2;
    }
    score.min(0.55)
}

/// §4.10's five-signal proactive-engagement score, clamped to `[0,1]`,
/// including the intentionally non-deterministic small-probability
/// nudge.
pub fn score(content: &str, total_interactions: u64) -> f64 {
    let content_lower = content.to_lowercase();
    let mut total = topic_interest_score(&content_lower)
        + emotional_cue_score(&content_lower)
        + help_seeking_score(&content_lower)
        + personal_history_score(total_interactions)
        + message_complexity_score(content);

    if total > 0.3 && chance(0.15) {
        total += 0.2;
    }

    total.clamp(0.0, 1.0)
}

pub fn should_engage(content: &str, total_interactions: u64) -> bool {
    score(content, total_interactions) >= ENGAGEMENT_THRESHOLD
}

/// Per-channel cooldown (1-5 minutes, randomized) so the bot doesn't
/// proactively pile into the same channel repeatedly (§4.10).
#[derive(Default)]
pub struct EngagementCooldown {
    until: DashMap<ChannelId, f64>,
}

impl EngagementCooldown {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_on_cooldown(&self, channel_id: ChannelId, now: f64) -> bool {
        self.until.get(&channel_id).is_some_and(|until| now < *until)
    }

    /// Arm a fresh 1-5 minute cooldown for `channel_id`.
    pub fn set_cooldown(&self, channel_id: ChannelId, now: f64) {
        let duration_secs = 60.0 + attune_core::random::unit_interval() * 240.0;
        self.until.insert(channel_id, now + duration_secs);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn question_scores_above_trivial_statement() {
        let q = score("How does this work?", 0);
        let statement = score("ok", 0);
        assert!(q > statement);
    }

    #[test]
    fn topic_interest_is_capped() {
        let s = topic_interest_score("space universe ai programming philosophy existence");
        assert!(s <= 0.4);
    }

    #[test]
    fn frequent_user_scores_higher_on_history_than_new_user() {
        assert!(personal_history_score(100) > personal_history_score(0));
    }

    #[test]
    fn long_technical_message_scores_high_complexity() {
        let msg = "This is a detailed message. It discusses the algorithm. \
                   It also covers the implementation and overall architecture. \
                   There is a comprehensive methodology behind the analysis."
            .repeat(2);
        assert!(message_complexity_score(&msg) > 0.3);
    }

    #[test]
    fn cooldown_blocks_immediately_after_being_set() {
        let c = EngagementCooldown::new();
        c.set_cooldown(ChannelId::new(1), 0.0);
        assert!(c.is_on_cooldown(ChannelId::new(1), 1.0));
    }

    #[test]
    fn cooldown_eventually_expires() {
        let c = EngagementCooldown::new();
        c.set_cooldown(ChannelId::new(1), 0.0);
        assert!(!c.is_on_cooldown(ChannelId::new(1), 400.0));
    }
}

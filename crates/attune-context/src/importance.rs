use attune_store::types::TurnRole;

const IMPORTANT_KEYWORDS: &[&str] = &[
    "help", "learn", "explain", "problem", "issue", "strategy", "remember",
];

/// `0.3·(role=='user') + min(0.3, len/500) + 0.2·('?' in content) +
/// min(0.3, 0.1·count(importantKeywords))` (§4.6).
pub fn score(role: TurnRole, content: &str) -> f64 {
    let role_term = if role == TurnRole::User { 0.3 } else { 0.0 };
    let len_term = (content.len() as f64 / 500.0).min(0.3);
    let question_term = if content.contains('?') { 0.2 } else { 0.0 };

    let lower = content.to_lowercase();
    let keyword_count = IMPORTANT_KEYWORDS
        .iter()
        .filter(|kw| lower.contains(*kw))
        .count();
    let keyword_term = (0.1 * keyword_count as f64).min(0.3);

    (role_term + len_term + question_term + keyword_term).min(1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_question_with_keyword_scores_above_threshold() {
        let s = score(TurnRole::User, "can you help me with this?");
        assert!(s > 0.7, "expected > 0.7, got {s}");
    }

    #[test]
    fn plain_assistant_ack_scores_low() {
        let s = score(TurnRole::Assistant, "ok");
        assert!(s < 0.1, "expected < 0.1, got {s}");
    }

    #[test]
    fn keyword_term_caps_at_point_three() {
        let s = score(TurnRole::System, "help learn explain problem issue strategy remember");
        // role_term=0, len small, no '?': keyword_term capped at 0.3
        assert!(s <= 0.3 + 0.1); // length term adds a small amount
    }
}

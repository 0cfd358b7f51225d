/// Fixed keyword → topic table (§4.6), grounded in the original engine's
/// topic extractor. Order matters only for determinism of iteration; the
/// result is sorted by first match.
const TOPIC_KEYWORDS: &[(&str, &[&str])] = &[
    ("stellaris", &["stellaris", "empire", "species", "galactic", "federation"]),
    ("space", &["space", "cosmos", "universe", "star", "planet", "galaxy"]),
    ("science", &["science", "research", "discovery", "experiment", "theory"]),
    ("gaming", &["game", "gaming", "play", "strategy", "multiplayer"]),
    ("technology", &["technology", "ai", "computer", "software", "algorithm"]),
];

/// Every matching topic, in table order. Callers needing "top 3" take
/// `extract_topics(text).into_iter().take(3)`.
pub fn extract_topics(text: &str) -> Vec<&'static str> {
    let lower = text.to_lowercase();
    TOPIC_KEYWORDS
        .iter()
        .filter(|(_, keywords)| keywords.iter().any(|kw| lower.contains(kw)))
        .map(|(topic, _)| *topic)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matches_multiple_topics() {
        let topics = extract_topics("I love stellaris and space games");
        assert!(topics.contains(&"stellaris"));
        assert!(topics.contains(&"space"));
        assert!(topics.contains(&"gaming"));
    }

    #[test]
    fn no_match_is_empty() {
        assert!(extract_topics("the weather is nice today").is_empty());
    }
}

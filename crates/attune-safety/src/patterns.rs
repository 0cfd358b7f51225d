use std::sync::OnceLock;

use regex::Regex;

fn url_pattern() -> &'static Regex {
    static CELL: OnceLock<Regex> = OnceLock::new();
    CELL.get_or_init(|| Regex::new(r"https?://[^\s]+").expect("valid url regex"))
}

/// Toxic-language patterns (§4.4 `toxic_language`). Each hit contributes
/// 0.3 to the heuristic score, matching the original pattern scorer.
fn toxic_patterns() -> &'static Vec<Regex> {
    static CELL: OnceLock<Vec<Regex>> = OnceLock::new();
    CELL.get_or_init(|| {
        [
            r"\b(kill\s+yourself|kys)\b",
            r"\b(f[u*]ck\s+you|f[u*]ck\s+off)\b",
            r"\b(go\s+die|die\s+please)\b",
            r"\b(stupid|idiot|moron)\s+(ass|face)\b",
            r"\b(hate\s+you|i\s+hate)\b",
        ]
        .iter()
        .map(|p| Regex::new(p).expect("valid toxic pattern"))
        .collect()
    })
}

/// Social-engineering / scam patterns (§4.4 `scam_attempt`).
fn scam_patterns() -> &'static Vec<Regex> {
    static CELL: OnceLock<Vec<Regex>> = OnceLock::new();
    CELL.get_or_init(|| {
        [
            r"chatgpt.*premium.*free",
            r"ai.*model.*access.*free",
            r"midjourney.*credits.*free",
            r"nft.*mint.*free",
            r"crypto.*airdrop.*claim",
            r"defi.*yield.*guaranteed",
            r"bitcoin.*investment.*\d+%",
            r"nitro.*free.*gift",
            r"discord.*premium.*hack",
            r"server.*boost.*generator",
            r"token.*grabber.*safe",
            r"urgent.*account.*suspended",
            r"verify.*identity.*immediate",
            r"click.*here.*avoid.*ban",
            r"congratulations.*you.*won",
        ]
        .iter()
        .map(|p| Regex::new(p).expect("valid scam pattern"))
        .collect()
    })
}

pub const DEFAULT_MALICIOUS_DOMAINS: &[&str] = &[
    "discordnitro.info",
    "discord-gift.com",
    "steamcommunity.ru",
    "discord-app.net",
    "discordgift.site",
    "steam-rewards.com",
];

pub const DEFAULT_SUSPICIOUS_TLDS: &[&str] =
    &[".tk", ".ml", ".ga", ".cf", ".gq", ".pw", ".top", ".download"];

pub fn extract_links(content: &str) -> Vec<String> {
    url_pattern()
        .find_iter(content)
        .map(|m| m.as_str().to_string())
        .collect()
}

pub fn toxicity_score(content_lower: &str) -> f64 {
    toxic_patterns()
        .iter()
        .filter(|re| re.is_match(content_lower))
        .count() as f64
        * 0.3
}

pub fn matches_scam_pattern(content_lower: &str) -> bool {
    scam_patterns().iter().any(|re| re.is_match(content_lower))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toxicity_score_accumulates_per_pattern() {
        let score = toxicity_score("i hate you, go die please");
        assert!((score - 0.6).abs() < 1e-9);
    }

    #[test]
    fn scam_pattern_detects_nitro_gift() {
        assert!(matches_scam_pattern("free discord nitro free gift here"));
    }

    #[test]
    fn extract_links_finds_urls() {
        let links = extract_links("check https://example.com/x and http://foo.bar");
        assert_eq!(links.len(), 2);
    }
}

use attune_core::ViolationSeverity;
use serde_json::json;

use crate::patterns;
use crate::tracker::UserActivity;

/// One detector's finding, before it is turned into a full `ViolationRecord`
/// by the caller (which knows user/guild/channel/message ids).
pub struct Finding {
    pub violation_type: &'static str,
    pub severity: ViolationSeverity,
    pub heuristic_score: f64,
    pub detection_method: &'static str,
    pub evidence: serde_json::Value,
}

pub fn spam_messages(
    activity: &UserActivity,
    now: f64,
    threshold: u32,
    window_secs: u64,
) -> Option<Finding> {
    let count = activity.messages_within(now, window_secs as f64);
    if count as u32 >= threshold {
        Some(Finding {
            violation_type: "spam_messages",
            severity: ViolationSeverity::Medium,
            heuristic_score: 1.0,
            detection_method: "frequency_window",
            evidence: json!({ "count": count, "window_secs": window_secs }),
        })
    } else {
        None
    }
}

pub fn repeated_content(activity: &UserActivity, content: &str, identical_limit: u32) -> Option<Finding> {
    let count = activity.identical_count(content, 20);
    if count as u32 >= identical_limit {
        Some(Finding {
            violation_type: "repeated_content",
            severity: ViolationSeverity::Medium,
            heuristic_score: 1.0,
            detection_method: "identical_history",
            evidence: json!({ "count": count }),
        })
    } else {
        None
    }
}

pub fn mass_mentions(mention_count: usize, mention_limit: u32) -> Option<Finding> {
    if mention_count as u32 >= mention_limit {
        Some(Finding {
            violation_type: "mass_mentions",
            severity: ViolationSeverity::High,
            heuristic_score: 1.0,
            detection_method: "mention_count",
            evidence: json!({ "count": mention_count }),
        })
    } else {
        None
    }
}

pub fn caps_abuse(content: &str, caps_ratio_threshold: f64) -> Option<Finding> {
    if content.len() < 10 {
        return None;
    }
    let letters: Vec<char> = content.chars().filter(|c| c.is_alphabetic()).collect();
    if letters.is_empty() {
        return None;
    }
    let upper = letters.iter().filter(|c| c.is_uppercase()).count();
    let ratio = upper as f64 / letters.len() as f64;
    if ratio >= caps_ratio_threshold {
        Some(Finding {
            violation_type: "caps_abuse",
            severity: ViolationSeverity::Low,
            heuristic_score: ratio,
            detection_method: "caps_ratio",
            evidence: json!({ "ratio": ratio }),
        })
    } else {
        None
    }
}

pub fn toxic_language(content_lower: &str, tox_threshold: f64) -> Option<Finding> {
    let score = patterns::toxicity_score(content_lower);
    if score >= tox_threshold {
        let severity = if score >= 0.9 {
            ViolationSeverity::High
        } else {
            ViolationSeverity::Medium
        };
        Some(Finding {
            violation_type: "toxic_language",
            severity,
            heuristic_score: score,
            detection_method: "pattern_score",
            evidence: json!({ "score": score }),
        })
    } else {
        None
    }
}

pub fn unsafe_links(
    content: &str,
    malicious_domains: &[String],
    suspicious_tlds: &[String],
) -> Option<Finding> {
    let links = patterns::extract_links(content);
    if links.is_empty() {
        return None;
    }
    let default_domains = patterns::DEFAULT_MALICIOUS_DOMAINS;
    let default_tlds = patterns::DEFAULT_SUSPICIOUS_TLDS;

    for link in &links {
        let lower = link.to_lowercase();
        let is_malicious = malicious_domains.iter().any(|d| lower.contains(d.as_str()))
            || default_domains.iter().any(|d| lower.contains(d));
        if is_malicious {
            return Some(Finding {
                violation_type: "unsafe_links",
                severity: ViolationSeverity::Severe,
                heuristic_score: 1.0,
                detection_method: "malicious_domain_list",
                evidence: json!({ "link": link }),
            });
        }
        let is_suspicious = suspicious_tlds.iter().any(|t| lower.ends_with(t.as_str()))
            || default_tlds.iter().any(|t| lower.ends_with(t));
        if is_suspicious {
            return Some(Finding {
                violation_type: "unsafe_links",
                severity: ViolationSeverity::High,
                heuristic_score: 0.8,
                detection_method: "suspicious_tld_list",
                evidence: json!({ "link": link }),
            });
        }
    }
    None
}

pub fn scam_attempt(content_lower: &str) -> Option<Finding> {
    if patterns::matches_scam_pattern(content_lower) {
        Some(Finding {
            violation_type: "scam_attempt",
            severity: ViolationSeverity::High,
            heuristic_score: 1.0,
            detection_method: "scam_pattern",
            evidence: json!({}),
        })
    } else {
        None
    }
}

/// Sudden >=10x jump in message length above the user's EMA, computed
/// against the EMA *before* this message is folded in.
pub fn bot_abuse(content: &str, prior_avg_length: f64) -> Option<Finding> {
    if prior_avg_length < 1.0 {
        return None;
    }
    let len = content.chars().count() as f64;
    if len >= prior_avg_length * 10.0 {
        Some(Finding {
            violation_type: "bot_abuse",
            severity: ViolationSeverity::Low,
            heuristic_score: 0.6,
            detection_method: "length_jump",
            evidence: json!({ "length": len, "prior_avg": prior_avg_length }),
        })
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spam_detected_over_threshold() {
        let mut a = UserActivity::default();
        a.record(1.0, "a");
        a.record(2.0, "b");
        a.record(3.0, "c");
        assert!(spam_messages(&a, 3.0, 3, 30).is_some());
    }

    #[test]
    fn caps_abuse_requires_length_and_ratio() {
        assert!(caps_abuse("SHORT", 0.8).is_none());
        assert!(caps_abuse("THIS IS ALL CAPS TEXT", 0.8).is_some());
        assert!(caps_abuse("this is all lower text", 0.8).is_none());
    }

    #[test]
    fn unsafe_links_flags_malicious_domain() {
        let found = unsafe_links("get it at https://discord-gift.com/free", &[], &[]);
        assert!(found.is_some());
        assert_eq!(found.unwrap().severity, ViolationSeverity::Severe);
    }

    #[test]
    fn bot_abuse_requires_big_jump() {
        assert!(bot_abuse("short", 10.0).is_none());
        let long = "x".repeat(200);
        assert!(bot_abuse(&long, 10.0).is_some());
    }
}

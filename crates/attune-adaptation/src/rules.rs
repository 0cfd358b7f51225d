use attune_core::PersonalityMode;
use attune_store::types::TraitDelta;

/// The fixed signal → trait-delta rule table (§4.5). Returns `None` for
/// a signal with no entry.
pub fn delta_for_signal(signal: &str) -> Option<TraitDelta> {
    let d = |humor, honesty, formality, empathy, strictness, initiative, mode_override| TraitDelta {
        humor,
        honesty,
        formality,
        empathy,
        strictness,
        initiative,
        mode_override,
    };

    match signal {
        "spam_spike" => Some(d(-30, 0, 0, 0, 25, 10, Some(PersonalityMode::Security))),
        "event_start" => Some(d(20, 0, 0, 15, 0, 25, Some(PersonalityMode::Social))),
        "quiet_hours" => Some(d(-20, 0, 15, 10, 0, 0, None)),
        "conflict_detected" => Some(d(0, 0, 15, 30, 20, 0, Some(PersonalityMode::Empathy))),
        "low_engagement" => Some(d(25, 0, 0, 15, 0, 30, None)),
        "raid_detected" => Some(d(-40, 0, 20, 0, 40, 0, Some(PersonalityMode::Security))),
        "link_spike" => Some(d(0, 10, 0, 0, 15, 0, None)),
        "bot_anomaly" => Some(d(0, 0, 15, 0, 20, 0, None)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spam_spike_matches_table() {
        let delta = delta_for_signal("spam_spike").unwrap();
        assert_eq!(delta.humor, -30);
        assert_eq!(delta.strictness, 25);
        assert_eq!(delta.mode_override, Some(PersonalityMode::Security));
    }

    #[test]
    fn unknown_signal_returns_none() {
        assert!(delta_for_signal("nonexistent").is_none());
    }
}

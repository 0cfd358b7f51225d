use attune_core::ViolationSeverity;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Warning,
    Mute,
    Timeout,
    Kick,
    Ban,
}

#[derive(Debug, Clone, Copy)]
pub struct PunishmentStep {
    pub action: Action,
    /// `None` means permanent/indefinite.
    pub duration_secs: Option<u64>,
}

/// The punishment ladder table (§4.4). `tier` is 0-indexed: 0 = first,
/// 1 = second, 2 = third, 3+ = permanent.
pub fn step_for(severity: ViolationSeverity, tier: u32) -> PunishmentStep {
    use Action::*;
    use ViolationSeverity::*;

    let ladder: [PunishmentStep; 4] = match severity {
        Low => [
            PunishmentStep { action: Warning, duration_secs: None },
            PunishmentStep { action: Mute, duration_secs: Some(900) },
            PunishmentStep { action: Mute, duration_secs: Some(3600) },
            PunishmentStep { action: Kick, duration_secs: None },
        ],
        Medium => [
            PunishmentStep { action: Mute, duration_secs: Some(3600) },
            PunishmentStep { action: Mute, duration_secs: Some(21_600) },
            PunishmentStep { action: Timeout, duration_secs: Some(86_400) },
            PunishmentStep { action: Kick, duration_secs: None },
        ],
        High => [
            PunishmentStep { action: Mute, duration_secs: Some(21_600) },
            PunishmentStep { action: Timeout, duration_secs: Some(86_400) },
            PunishmentStep { action: Ban, duration_secs: Some(604_800) },
            PunishmentStep { action: Ban, duration_secs: None },
        ],
        Severe => [
            PunishmentStep { action: Ban, duration_secs: Some(604_800) },
            PunishmentStep { action: Ban, duration_secs: Some(2_592_000) },
            PunishmentStep { action: Ban, duration_secs: None },
            PunishmentStep { action: Ban, duration_secs: None },
        ],
    };

    let index = (tier as usize).min(3);
    ladder[index]
}

/// Count prior violations of the same or higher severity within the
/// repeat window to determine the tier (§4.4).
pub fn tier_from_prior_count(prior_same_or_higher: usize) -> u32 {
    prior_same_or_higher as u32
}

/// Confidence gating (§4.4): below 0.55 always downgrade to a warning;
/// at/above 0.95 enact as specified; in between, enact but flag for
/// human review.
pub struct ConfidenceDecision {
    pub step: PunishmentStep,
    pub staff_reviewed: bool,
}

pub fn apply_confidence_gate(step: PunishmentStep, final_confidence: f64) -> ConfidenceDecision {
    if final_confidence < 0.55 {
        return ConfidenceDecision {
            step: PunishmentStep {
                action: Action::Warning,
                duration_secs: None,
            },
            staff_reviewed: true,
        };
    }
    ConfidenceDecision {
        step,
        staff_reviewed: final_confidence >= 0.95,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn low_first_tier_is_warning() {
        let step = step_for(ViolationSeverity::Low, 0);
        assert_eq!(step.action, Action::Warning);
    }

    #[test]
    fn high_permanent_tier_is_indefinite_ban() {
        let step = step_for(ViolationSeverity::High, 10);
        assert_eq!(step.action, Action::Ban);
        assert_eq!(step.duration_secs, None);
    }

    #[test]
    fn low_confidence_downgrades_to_warning() {
        let step = step_for(ViolationSeverity::Severe, 3);
        let decision = apply_confidence_gate(step, 0.4);
        assert_eq!(decision.step.action, Action::Warning);
        assert!(decision.staff_reviewed);
    }

    #[test]
    fn high_confidence_enacts_without_review() {
        let step = step_for(ViolationSeverity::Medium, 1);
        let decision = apply_confidence_gate(step, 0.99);
        assert_eq!(decision.step.action, step.action);
        assert!(!decision.staff_reviewed);
    }

    #[test]
    fn mid_confidence_enacts_with_review() {
        let step = step_for(ViolationSeverity::Medium, 1);
        let decision = apply_confidence_gate(step, 0.7);
        assert_eq!(decision.step.action, step.action);
        assert!(decision.staff_reviewed);
    }
}

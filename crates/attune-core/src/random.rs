//! Deterministic pseudo-randomness derived from the system clock,
//! avoiding a `rand` dependency for the handful of call sites that need
//! a coin flip (emoji chance, follow-up suggestions, the proactive
//! engagement nudge, backoff jitter).

use std::time::{SystemTime, UNIX_EPOCH};

/// A value in `[0, 1)` derived from the current nanosecond clock.
pub fn unit_interval() -> f64 {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.subsec_nanos())
        .unwrap_or(0);
    (nanos as f64) / (1_000_000_000.0)
}

/// `true` with probability `probability`, clamped to `[0, 1]`.
pub fn chance(probability: f64) -> bool {
    unit_interval() < probability.clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unit_interval_is_bounded() {
        let v = unit_interval();
        assert!((0.0..1.0).contains(&v));
    }

    #[test]
    fn chance_zero_is_never_true_and_one_is_always_true() {
        assert!(!chance(0.0));
        assert!(chance(1.0));
    }
}

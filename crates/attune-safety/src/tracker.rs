use std::collections::VecDeque;

/// Per-`(user, guild)` rolling state the detectors need that isn't worth a
/// StateStore round-trip on every message: recent timestamps, recent
/// message bodies, and an EMA of message length (§4.4 `bot_abuse`).
#[derive(Debug, Clone, Default)]
pub struct UserActivity {
    pub recent_timestamps: VecDeque<f64>,
    pub recent_messages: VecDeque<String>,
    pub avg_length: f64,
    pub message_count: u64,
}

const RECENT_CAP: usize = 20;

impl UserActivity {
    pub fn record(&mut self, timestamp: f64, content: &str) {
        self.recent_timestamps.push_back(timestamp);
        if self.recent_timestamps.len() > RECENT_CAP {
            self.recent_timestamps.pop_front();
        }
        self.recent_messages.push_back(content.to_string());
        if self.recent_messages.len() > RECENT_CAP {
            self.recent_messages.pop_front();
        }

        let len = content.chars().count() as f64;
        self.message_count += 1;
        if self.message_count == 1 {
            self.avg_length = len;
        } else {
            // Same smoothing factor the original engagement scorer uses for
            // `avg_message_length`.
            self.avg_length = self.avg_length * 0.9 + len * 0.1;
        }
    }

    pub fn messages_within(&self, now: f64, window_secs: f64) -> usize {
        self.recent_timestamps
            .iter()
            .filter(|&&t| now - t <= window_secs)
            .count()
    }

    pub fn identical_count(&self, content: &str, limit_window: usize) -> usize {
        self.recent_messages
            .iter()
            .rev()
            .take(limit_window)
            .filter(|m| m.as_str() == content)
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_within_counts_recent_only() {
        let mut a = UserActivity::default();
        a.record(100.0, "hi");
        a.record(101.0, "hi");
        a.record(200.0, "hi");
        assert_eq!(a.messages_within(201.0, 30.0), 1);
        assert_eq!(a.messages_within(201.0, 150.0), 3);
    }

    #[test]
    fn identical_count_matches_exact_repeats() {
        let mut a = UserActivity::default();
        a.record(1.0, "spam");
        a.record(2.0, "spam");
        a.record(3.0, "spam");
        assert_eq!(a.identical_count("spam", RECENT_CAP), 3);
        assert_eq!(a.identical_count("other", RECENT_CAP), 0);
    }

    #[test]
    fn avg_length_tracks_ema() {
        let mut a = UserActivity::default();
        a.record(1.0, "1234567890");
        assert!((a.avg_length - 10.0).abs() < 1e-9);
        a.record(2.0, "");
        assert!(a.avg_length < 10.0);
    }
}

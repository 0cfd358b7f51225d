//! Rolling per-guild counters (§4.10): messages/min, link rate, and join
//! rate, each a sliding window over a deque of timestamps. Crossing a
//! threshold is reported back to the caller, which feeds it to
//! `AdaptationEngine` as a signal.

use std::collections::VecDeque;

use attune_core::GuildId;
use dashmap::DashMap;

const SPAM_SPIKE_WINDOW_SECS: f64 = 60.0;
const SPAM_SPIKE_THRESHOLD: usize = 30;
const LINK_SPIKE_WINDOW_SECS: f64 = 60.0;
const LINK_SPIKE_THRESHOLD: usize = 10;
const RAID_WINDOW_SECS: f64 = 60.0;
const RAID_THRESHOLD: usize = 25;

#[derive(Default)]
struct Window(VecDeque<f64>);

impl Window {
    fn record_and_count(&mut self, now: f64, window_secs: f64) -> usize {
        self.0.push_back(now);
        while let Some(front) = self.0.front() {
            if now - *front > window_secs {
                self.0.pop_front();
            } else {
                break;
            }
        }
        self.0.len()
    }
}

/// Rolling message/link/join counters, one set per guild, feeding the
/// four threshold-crossing signals EventIngest is responsible for
/// observing (§4.5 "Source of signals").
#[derive(Default)]
pub struct GuildCounters {
    messages: DashMap<GuildId, Window>,
    links: DashMap<GuildId, Window>,
    joins: DashMap<GuildId, Window>,
}

impl GuildCounters {
    pub fn new() -> Self {
        Self::default()
    }

    /// `true` exactly on the message that pushes the guild's per-minute
    /// rate at or above the spam-spike threshold.
    pub fn record_message(&self, guild_id: GuildId, now: f64) -> bool {
        let count = self
            .messages
            .entry(guild_id)
            .or_default()
            .record_and_count(now, SPAM_SPIKE_WINDOW_SECS);
        count == SPAM_SPIKE_THRESHOLD
    }

    pub fn record_link(&self, guild_id: GuildId, now: f64) -> bool {
        let count = self
            .links
            .entry(guild_id)
            .or_default()
            .record_and_count(now, LINK_SPIKE_WINDOW_SECS);
        count == LINK_SPIKE_THRESHOLD
    }

    /// `true` exactly when the 25th join within the 60s window lands.
    pub fn record_join(&self, guild_id: GuildId, now: f64) -> bool {
        let count = self
            .joins
            .entry(guild_id)
            .or_default()
            .record_and_count(now, RAID_WINDOW_SECS);
        count == RAID_THRESHOLD
    }

    pub fn messages_per_minute(&self, guild_id: GuildId, now: f64) -> f64 {
        match self.messages.get(&guild_id) {
            Some(w) => w.0.iter().filter(|t| now - **t <= 60.0).count() as f64,
            None => 0.0,
        }
    }
}

/// `true` when `hour` (0-23, local) falls within the configured quiet
/// window, wrapping past midnight (e.g. 22..6).
pub fn is_quiet_hours(hour: u32, start: u32, end: u32) -> bool {
    if start == end {
        return false;
    }
    if start < end {
        hour >= start && hour < end
    } else {
        hour >= start || hour < end
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use attune_core::GuildId;

    #[test]
    fn spam_spike_trips_at_threshold() {
        let c = GuildCounters::new();
        let g = GuildId::new(1);
        let mut tripped = false;
        for i in 0..SPAM_SPIKE_THRESHOLD {
            tripped = c.record_message(g, i as f64 * 0.1) || tripped;
        }
        assert!(tripped);
    }

    #[test]
    fn old_messages_fall_out_of_window() {
        let c = GuildCounters::new();
        let g = GuildId::new(1);
        c.record_message(g, 0.0);
        assert_eq!(c.messages_per_minute(g, 120.0), 0.0);
    }

    #[test]
    fn raid_detected_at_25_joins_in_60s() {
        let c = GuildCounters::new();
        let g = GuildId::new(7);
        let mut raid = false;
        for i in 0..25 {
            raid = c.record_join(g, i as f64) || raid;
        }
        assert!(raid);
    }

    #[test]
    fn quiet_hours_wraps_past_midnight() {
        assert!(is_quiet_hours(23, 22, 6));
        assert!(is_quiet_hours(2, 22, 6));
        assert!(!is_quiet_hours(12, 22, 6));
    }
}

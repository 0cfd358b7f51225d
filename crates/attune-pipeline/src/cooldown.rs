//! Per-`(channel, user)` anti-echo cooldown (§4.8 step 8): a message
//! from the same user in the same channel within 5 seconds of the last
//! response is skipped.

use attune_core::{ChannelId, UserId};
use dashmap::DashMap;

const COOLDOWN_SECS: f64 = 5.0;

#[derive(Default)]
pub struct ResponseCooldown {
    last_response_at: DashMap<(ChannelId, UserId), f64>,
}

impl ResponseCooldown {
    pub fn new() -> Self {
        Self::default()
    }

    /// `true` if a response may be sent now; always records `now` as the
    /// new high-water mark regardless of outcome.
    pub fn check_and_record(&self, channel_id: ChannelId, user_id: UserId, now: f64) -> bool {
        let key = (channel_id, user_id);
        let allowed = match self.last_response_at.get(&key) {
            Some(last) => now - *last >= COOLDOWN_SECS,
            None => true,
        };
        self.last_response_at.insert(key, now);
        allowed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_message_always_allowed() {
        let c = ResponseCooldown::new();
        assert!(c.check_and_record(ChannelId::new(1), UserId::new(1), 0.0));
    }

    #[test]
    fn rapid_followup_is_blocked() {
        let c = ResponseCooldown::new();
        c.check_and_record(ChannelId::new(1), UserId::new(1), 0.0);
        assert!(!c.check_and_record(ChannelId::new(1), UserId::new(1), 2.0));
    }

    #[test]
    fn after_cooldown_elapses_allowed_again() {
        let c = ResponseCooldown::new();
        c.check_and_record(ChannelId::new(1), UserId::new(1), 0.0);
        assert!(c.check_and_record(ChannelId::new(1), UserId::new(1), 6.0));
    }
}

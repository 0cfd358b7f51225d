//! Per-provider token bucket (§4.7 "Rate control"). A provider whose
//! bucket is empty is skipped, as if it had failed with "rate limited".

use std::sync::Mutex;

use attune_core::random::unit_interval;

pub struct TokenBucket {
    capacity: f64,
    tokens: Mutex<f64>,
    refill_per_sec: f64,
    last_refill: Mutex<f64>,
}

impl TokenBucket {
    pub fn new(rate_per_min: u32) -> Self {
        let capacity = rate_per_min.max(1) as f64;
        Self {
            capacity,
            tokens: Mutex::new(capacity),
            refill_per_sec: capacity / 60.0,
            last_refill: Mutex::new(now_secs()),
        }
    }

    /// Attempt to take one token; `false` means the caller should treat
    /// this provider as rate-limited and fall through to the next one.
    pub fn try_acquire(&self) -> bool {
        self.refill();
        let mut tokens = self.tokens.lock().unwrap();
        if *tokens >= 1.0 {
            *tokens -= 1.0;
            true
        } else {
            false
        }
    }

    fn refill(&self) {
        let now = now_secs();
        let mut last = self.last_refill.lock().unwrap();
        let elapsed = (now - *last).max(0.0);
        if elapsed <= 0.0 {
            return;
        }
        *last = now;
        let mut tokens = self.tokens.lock().unwrap();
        *tokens = (*tokens + elapsed * self.refill_per_sec).min(self.capacity);
    }
}

/// Monotonic-enough clock for the bucket; jittered by a sub-microsecond
/// amount so repeated calls within the same nanosecond still progress.
fn now_secs() -> f64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    let base = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs_f64();
    base + unit_interval() * 1e-9
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bucket_starts_full_and_drains() {
        let bucket = TokenBucket::new(2);
        assert!(bucket.try_acquire());
        assert!(bucket.try_acquire());
        assert!(!bucket.try_acquire());
    }
}

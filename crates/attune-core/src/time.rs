use chrono::{DateTime, Utc};

/// Current wall-clock time. The only place in the crate allowed to call
/// this directly — everything else takes `now: DateTime<Utc>` as a
/// parameter so tests can control it.
pub fn now() -> DateTime<Utc> {
    Utc::now()
}

/// Unix seconds for the `timestamp REAL` columns in §6's schema.
pub fn now_unix() -> f64 {
    Utc::now().timestamp_millis() as f64 / 1000.0
}

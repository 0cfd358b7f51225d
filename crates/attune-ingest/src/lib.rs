//! `attune-ingest` — `EventIngest` and proactive-engagement scoring
//! (§4.10): the top-level event loop that admits messages ahead of
//! `attune-pipeline`, runs `SafetyFilter` first, maintains rolling
//! per-guild counters, and drains the welcome-DM queue.

mod counters;
mod engagement;
mod error;
mod ingest;
mod safety_bridge;
mod welcome;

pub use engagement::{score as engagement_score, should_engage, EngagementCooldown};
pub use error::{IngestError, Result};
pub use ingest::{EventIngest, EventIngestConfig};
pub use welcome::WelcomeDmQueue;

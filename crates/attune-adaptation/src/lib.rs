//! `attune-adaptation` — the AdaptationEngine from §4.5: a fixed
//! signal → trait-delta rule table, per-guild cooldowns, and the
//! active/expired/cancelled event lifecycle.

mod engine;
mod error;
mod rules;

pub use engine::AdaptationEngine;
pub use error::{AdaptationError, Result};
pub use rules::delta_for_signal;

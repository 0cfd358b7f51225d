//! `attune-store` — the single SQLite-backed StateStore (§4.1) that owns
//! guild personalities, user overrides/profiles, session windows,
//! violations, adaptation events, the cache table, and the image
//! generation log.

mod db;
mod error;
mod manager;
pub mod types;

pub use error::{Result, StoreError};
pub use manager::StateStore;

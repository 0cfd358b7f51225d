//! `attune-core` — shared IDs, error taxonomy, and configuration for the
//! AI dispatch & adaptive response core.
//!
//! Every other crate in the workspace depends on this one and nothing
//! else circularly; it has no dependency on any of them (§9).

pub mod config;
pub mod error;
pub mod platform;
pub mod random;
pub mod time;
pub mod types;

pub use config::Config;
pub use error::{CoreError, PlatformErrorKind, Result};
pub use platform::{
    IncomingMessage, MemberJoinEvent, PlatformActions, PlatformEvent, PlatformEvents,
    ReactionAddEvent,
};
pub use types::{
    clamp_i64, ChannelId, GuildId, MessageId, PersonalityMode, SessionKey, TtlClass, UserId,
    ViolationSeverity, AUTO_ADAPT,
};

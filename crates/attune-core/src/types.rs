use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Opaque platform identifiers. All four are plain 64-bit integers on the
/// wire (Discord-style snowflakes); kept as distinct newtypes so a guild id
/// can never be passed where a user id is expected.
macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub u64);

        impl $name {
            pub fn new(raw: u64) -> Self {
                Self(raw)
            }

            pub fn get(&self) -> u64 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<u64> for $name {
            fn from(raw: u64) -> Self {
                Self(raw)
            }
        }

        impl FromStr for $name {
            type Err = std::num::ParseIntError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Ok(Self(s.parse()?))
            }
        }
    };
}

id_newtype!(UserId);
id_newtype!(GuildId);
id_newtype!(ChannelId);
id_newtype!(MessageId);

/// The session key triple `(guild, channel, user)` that identifies a single
/// conversation thread. DMs use a sentinel guild id of 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionKey {
    pub guild_id: GuildId,
    pub channel_id: ChannelId,
    pub user_id: UserId,
}

impl SessionKey {
    pub fn new(guild_id: GuildId, channel_id: ChannelId, user_id: UserId) -> Self {
        Self {
            guild_id,
            channel_id,
            user_id,
        }
    }

    /// `guild:{g}:channel:{c}:user:{u}` — stable string form for log
    /// correlation and for the `sessions.session_id` primary key.
    pub fn format(&self) -> String {
        format!(
            "guild:{}:channel:{}:user:{}",
            self.guild_id, self.channel_id, self.user_id
        )
    }

    pub fn parse(s: &str) -> Result<Self, String> {
        let rest = s
            .strip_prefix("guild:")
            .ok_or_else(|| format!("missing guild prefix in session key: {s}"))?;
        let (guild_part, rest) = rest
            .split_once(":channel:")
            .ok_or_else(|| format!("missing channel prefix in session key: {s}"))?;
        let (channel_part, rest) = rest
            .split_once(":user:")
            .ok_or_else(|| format!("missing user prefix in session key: {s}"))?;
        let guild_id: u64 = guild_part
            .parse()
            .map_err(|_| format!("invalid guild id in session key: {s}"))?;
        let channel_id: u64 = channel_part
            .parse()
            .map_err(|_| format!("invalid channel id in session key: {s}"))?;
        let user_id: u64 = rest
            .parse()
            .map_err(|_| format!("invalid user id in session key: {s}"))?;
        Ok(Self {
            guild_id: GuildId(guild_id),
            channel_id: ChannelId(channel_id),
            user_id: UserId(user_id),
        })
    }
}

impl fmt::Display for SessionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format())
    }
}

/// Personality response mode. Adaptation events may override this
/// last-write-wins, on top of whatever the guild/user configured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PersonalityMode {
    #[default]
    Social,
    Security,
    MissionControl,
    Developer,
    Empathy,
    Adaptive,
}

impl fmt::Display for PersonalityMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PersonalityMode::Social => "social",
            PersonalityMode::Security => "security",
            PersonalityMode::MissionControl => "mission_control",
            PersonalityMode::Developer => "developer",
            PersonalityMode::Empathy => "empathy",
            PersonalityMode::Adaptive => "adaptive",
        };
        write!(f, "{s}")
    }
}

impl FromStr for PersonalityMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "social" => Ok(PersonalityMode::Social),
            "security" => Ok(PersonalityMode::Security),
            "mission_control" => Ok(PersonalityMode::MissionControl),
            "developer" => Ok(PersonalityMode::Developer),
            "empathy" => Ok(PersonalityMode::Empathy),
            "adaptive" => Ok(PersonalityMode::Adaptive),
            other => Err(format!("unknown personality mode: {other}")),
        }
    }
}

/// TTL classes for cache entries (§4.2). Stored as seconds once persisted,
/// but callers always select one of these three named buckets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TtlClass {
    Short,
    Medium,
    Long,
}

impl TtlClass {
    pub fn as_secs(&self) -> u64 {
        match self {
            TtlClass::Short => 300,
            TtlClass::Medium => 1800,
            TtlClass::Long => 3600,
        }
    }
}

impl fmt::Display for TtlClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TtlClass::Short => "short",
            TtlClass::Medium => "medium",
            TtlClass::Long => "long",
        };
        write!(f, "{s}")
    }
}

/// Severity of a detected safety violation. Ordinal value doubles as the
/// multiplier in the trust-score decay formula (§4.4).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViolationSeverity {
    Low = 1,
    Medium = 2,
    High = 3,
    Severe = 4,
}

impl ViolationSeverity {
    pub fn weight(&self) -> i64 {
        *self as i64
    }
}

impl fmt::Display for ViolationSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ViolationSeverity::Low => "low",
            ViolationSeverity::Medium => "medium",
            ViolationSeverity::High => "high",
            ViolationSeverity::Severe => "severe",
        };
        write!(f, "{s}")
    }
}

impl FromStr for ViolationSeverity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "low" => Ok(ViolationSeverity::Low),
            "medium" => Ok(ViolationSeverity::Medium),
            "high" => Ok(ViolationSeverity::High),
            "severe" => Ok(ViolationSeverity::Severe),
            other => Err(format!("unknown violation severity: {other}")),
        }
    }
}

/// The sentinel `applied_by` value for adaptation events the engine created
/// on its own, as opposed to an admin-issued one.
pub const AUTO_ADAPT: &str = "auto-adapt";

/// Clamp helper shared by every component that maintains a 0..100 scalar.
pub fn clamp_i64(value: i64, lo: i64, hi: i64) -> i64 {
    value.max(lo).min(hi)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_key_roundtrip() {
        let key = SessionKey::new(GuildId(42), ChannelId(7), UserId(99));
        let formatted = key.format();
        let parsed = SessionKey::parse(&formatted).unwrap();
        assert_eq!(key, parsed);
    }

    #[test]
    fn session_key_parse_rejects_garbage() {
        assert!(SessionKey::parse("not-a-session-key").is_err());
    }

    #[test]
    fn ttl_class_seconds() {
        assert_eq!(TtlClass::Short.as_secs(), 300);
        assert_eq!(TtlClass::Medium.as_secs(), 1800);
        assert_eq!(TtlClass::Long.as_secs(), 3600);
    }

    #[test]
    fn violation_severity_weight_matches_ordinal() {
        assert_eq!(ViolationSeverity::Low.weight(), 1);
        assert_eq!(ViolationSeverity::Severe.weight(), 4);
    }
}

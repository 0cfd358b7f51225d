use attune_core::{ChannelId, GuildId, PersonalityMode, TtlClass, UserId, ViolationSeverity};
use serde::{Deserialize, Serialize};

/// Six integer scalars in 0..100, a mode, and a monotonically increasing
/// version (§3). Every mutation clamps scalars and bumps `version`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonalityTraits {
    pub humor: i64,
    pub honesty: i64,
    pub formality: i64,
    pub empathy: i64,
    pub strictness: i64,
    pub initiative: i64,
    pub mode: PersonalityMode,
    pub version: u64,
}

impl PersonalityTraits {
    /// Canonical personality defaults from the glossary.
    pub fn defaults() -> Self {
        Self {
            humor: 50,
            honesty: 85,
            formality: 40,
            empathy: 75,
            strictness: 45,
            initiative: 65,
            mode: PersonalityMode::Social,
            version: 1,
        }
    }

    pub fn clamp(&mut self) {
        self.humor = attune_core::clamp_i64(self.humor, 0, 100);
        self.honesty = attune_core::clamp_i64(self.honesty, 0, 100);
        self.formality = attune_core::clamp_i64(self.formality, 0, 100);
        self.empathy = attune_core::clamp_i64(self.empathy, 0, 100);
        self.strictness = attune_core::clamp_i64(self.strictness, 0, 100);
        self.initiative = attune_core::clamp_i64(self.initiative, 0, 100);
    }
}

/// Per-field partial update; `None` leaves the field untouched when
/// writing a guild's traits, or clears the override when used on a
/// `UserOverride` (§4.3).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PartialTraits {
    pub humor: Option<i64>,
    pub honesty: Option<i64>,
    pub formality: Option<i64>,
    pub empathy: Option<i64>,
    pub strictness: Option<i64>,
    pub initiative: Option<i64>,
    pub mode: Option<PersonalityMode>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GuildPersonality {
    pub guild_id: GuildId,
    pub traits: PersonalityTraits,
    pub updated_by: UserId,
    pub updated_at: String,
}

/// Nullable per-field override for `(user, guild)` (§3). A `None` field
/// means "inherit the guild value".
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserOverride {
    pub humor: Option<i64>,
    pub honesty: Option<i64>,
    pub formality: Option<i64>,
    pub empathy: Option<i64>,
    pub strictness: Option<i64>,
    pub initiative: Option<i64>,
    pub updated_at: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommunicationStyle {
    Casual,
    Formal,
    Balanced,
}

impl std::fmt::Display for CommunicationStyle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            CommunicationStyle::Casual => "casual",
            CommunicationStyle::Formal => "formal",
            CommunicationStyle::Balanced => "balanced",
        };
        write!(f, "{s}")
    }
}

impl std::str::FromStr for CommunicationStyle {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "casual" => Ok(Self::Casual),
            "formal" => Ok(Self::Formal),
            "balanced" => Ok(Self::Balanced),
            other => Err(format!("unknown communication style: {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseLengthPreference {
    Short,
    Medium,
    Long,
}

impl std::fmt::Display for ResponseLengthPreference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ResponseLengthPreference::Short => "short",
            ResponseLengthPreference::Medium => "medium",
            ResponseLengthPreference::Long => "long",
        };
        write!(f, "{s}")
    }
}

impl std::str::FromStr for ResponseLengthPreference {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "short" => Ok(Self::Short),
            "medium" => Ok(Self::Medium),
            "long" => Ok(Self::Long),
            other => Err(format!("unknown response length preference: {other}")),
        }
    }
}

/// Per-(user, guild) behavioral profile (§3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    pub user_id: UserId,
    pub guild_id: GuildId,
    pub trust_score: f64,
    pub total_interactions: u64,
    pub avg_message_length: f64,
    pub preferred_topics: std::collections::HashMap<String, f64>,
    pub communication_style: CommunicationStyle,
    pub response_length_preference: ResponseLengthPreference,
    pub engagement_score: f64,
    pub punishment_level: u32,
    pub is_quarantined: bool,
    pub last_interaction: String,
}

impl UserProfile {
    pub fn new(user_id: UserId, guild_id: GuildId, now: &str) -> Self {
        Self {
            user_id,
            guild_id,
            trust_score: 50.0,
            total_interactions: 0,
            avg_message_length: 0.0,
            preferred_topics: std::collections::HashMap::new(),
            communication_style: CommunicationStyle::Balanced,
            response_length_preference: ResponseLengthPreference::Medium,
            engagement_score: 0.0,
            punishment_level: 0,
            is_quarantined: false,
            last_interaction: now.to_string(),
        }
    }

    pub fn clamp(&mut self) {
        self.trust_score = self.trust_score.clamp(0.0, 100.0);
        self.engagement_score = self.engagement_score.clamp(0.0, 1.0);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnRole {
    User,
    Assistant,
    System,
}

impl std::fmt::Display for TurnRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            TurnRole::User => "user",
            TurnRole::Assistant => "assistant",
            TurnRole::System => "system",
        };
        write!(f, "{s}")
    }
}

impl std::str::FromStr for TurnRole {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Self::User),
            "assistant" => Ok(Self::Assistant),
            "system" => Ok(Self::System),
            other => Err(format!("unknown turn role: {other}")),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Turn {
    pub role: TurnRole,
    pub content: String,
    pub timestamp: String,
    pub importance: f64,
}

/// An ordered conversation window plus its bounded important-turns list
/// (§3). `MAX_WINDOW` default is 20; trimming drops oldest-first.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationWindow {
    pub turns: Vec<Turn>,
    pub important: Vec<Turn>,
}

pub const MAX_WINDOW: usize = 20;
pub const MAX_IMPORTANT: usize = 10;
pub const IMPORTANT_THRESHOLD: f64 = 0.7;

impl ConversationWindow {
    pub fn empty() -> Self {
        Self {
            turns: Vec::new(),
            important: Vec::new(),
        }
    }

    /// Append a turn, trimming the window and important-list per §3.
    pub fn append(&mut self, turn: Turn) {
        let important = turn.importance > IMPORTANT_THRESHOLD;
        self.turns.push(turn.clone());
        if self.turns.len() > MAX_WINDOW {
            self.turns.remove(0);
        }
        if important {
            self.important.push(turn);
            if self.important.len() > MAX_IMPORTANT {
                self.important.remove(0);
            }
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ViolationRecord {
    pub id: Option<i64>,
    pub user_id: UserId,
    pub guild_id: GuildId,
    pub message_id: Option<u64>,
    pub channel_id: ChannelId,
    pub violation_type: String,
    pub severity: ViolationSeverity,
    pub timestamp: f64,
    pub heuristic_score: f64,
    pub ml_confidence: f64,
    pub final_confidence: f64,
    pub detection_method: String,
    pub message_content: String,
    pub evidence: serde_json::Value,
    pub action_taken: Option<String>,
    pub moderator_id: Option<UserId>,
    pub resolved: bool,
    pub appeal_status: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdaptationStatus {
    Active,
    Expired,
    Cancelled,
}

impl std::fmt::Display for AdaptationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            AdaptationStatus::Active => "active",
            AdaptationStatus::Expired => "expired",
            AdaptationStatus::Cancelled => "cancelled",
        };
        write!(f, "{s}")
    }
}

impl std::str::FromStr for AdaptationStatus {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(Self::Active),
            "expired" => Ok(Self::Expired),
            "cancelled" => Ok(Self::Cancelled),
            other => Err(format!("unknown adaptation status: {other}")),
        }
    }
}

/// Trait-deltas carried by an adaptation event, plus an optional mode
/// override applied last-write-wins (§3, §4.5).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TraitDelta {
    pub humor: i64,
    pub honesty: i64,
    pub formality: i64,
    pub empathy: i64,
    pub strictness: i64,
    pub initiative: i64,
    pub mode_override: Option<PersonalityMode>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdaptationEvent {
    pub id: String,
    pub guild_id: GuildId,
    pub signal: String,
    pub payload: serde_json::Value,
    pub delta_profile: TraitDelta,
    pub applied_at: String,
    pub expires_at: Option<String>,
    pub status: AdaptationStatus,
    pub priority: u32,
    pub reason: Option<String>,
    pub applied_by: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntry {
    pub key: String,
    pub value: Vec<u8>,
    pub content_type: String,
    pub inserted_at: f64,
    pub ttl_class: TtlClass,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageGenerationRecord {
    pub id: Option<i64>,
    pub user_id: UserId,
    pub channel_id: ChannelId,
    pub prompt: String,
    pub provider: String,
    pub success: bool,
    pub error: Option<String>,
    pub image_url: Option<String>,
    pub created_at: String,
}

use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

/// Top-level config (attune.toml + ATTUNE_* env overrides), matching §6.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub bot: BotConfig,
    #[serde(default)]
    pub ai: AiConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub safety: SafetyConfig,
    #[serde(default)]
    pub adaptation: AdaptationConfig,
    #[serde(default)]
    pub image: ImageConfig,
    #[serde(default)]
    pub welcome_dm: WelcomeDmConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bot: BotConfig::default(),
            ai: AiConfig::default(),
            store: StoreConfig::default(),
            cache: CacheConfig::default(),
            safety: SafetyConfig::default(),
            adaptation: AdaptationConfig::default(),
            image: ImageConfig::default(),
            welcome_dm: WelcomeDmConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BotConfig {
    /// Bot-owner user id, always exempt from SafetyFilter (§4.4).
    pub owner_id: u64,
    /// This account's own user id, so ResponsePipeline can recognize a
    /// direct mention and never reply to its own messages.
    #[serde(default)]
    pub user_id: u64,
    #[serde(default = "default_wake_words")]
    pub wake_words: Vec<String>,
    #[serde(default = "default_prefix")]
    pub prefix: String,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            owner_id: 0,
            user_id: 0,
            wake_words: default_wake_words(),
            prefix: default_prefix(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AiConfig {
    #[serde(default)]
    pub providers: Vec<ProviderEntry>,
    #[serde(default = "default_model")]
    pub default_model: String,
    #[serde(default = "default_temperature")]
    pub temperature: f64,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    /// Safe fallback when model-ID normalization can't resolve an input.
    #[serde(default = "default_model")]
    pub fallback_model: String,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            providers: Vec::new(),
            default_model: default_model(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            fallback_model: default_model(),
        }
    }
}

/// One entry in the ordered provider list ProviderRouter iterates (§4.7).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderEntry {
    pub id: String,
    pub kind: ProviderKind,
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    pub model: Option<String>,
    #[serde(default = "default_rate_per_min")]
    pub rate_per_min: u32,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum ProviderKind {
    Anthropic,
    OpenAi,
    Ollama,
    ImageGen,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default = "default_db_path")]
    pub path: String,
    #[serde(default = "default_conversation_retention_days")]
    pub conversation_retention_days: u32,
    #[serde(default = "default_appeal_retention_days")]
    pub resolved_appeal_retention_days: u32,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
            conversation_retention_days: default_conversation_retention_days(),
            resolved_appeal_retention_days: default_appeal_retention_days(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    #[serde(default = "default_cache_capacity")]
    pub capacity: usize,
    /// Tier-2 networked KV endpoint; absent means tier-1-only.
    pub tier2_url: Option<String>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            capacity: default_cache_capacity(),
            tier2_url: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SafetyConfig {
    #[serde(default = "default_spam_threshold")]
    pub spam_threshold: u32,
    #[serde(default = "default_spam_window_secs")]
    pub spam_window_secs: u64,
    #[serde(default = "default_identical_limit")]
    pub identical_limit: u32,
    #[serde(default = "default_mention_limit")]
    pub mention_limit: u32,
    #[serde(default = "default_caps_ratio")]
    pub caps_ratio: f64,
    #[serde(default = "default_tox_threshold")]
    pub tox_threshold: f64,
    #[serde(default = "default_repeat_window_days")]
    pub repeat_window_days: u32,
    #[serde(default = "default_quarantine_threshold")]
    pub quarantine_threshold: f64,
    #[serde(default)]
    pub malicious_domains: Vec<String>,
    #[serde(default)]
    pub suspicious_tlds: Vec<String>,
}

impl Default for SafetyConfig {
    fn default() -> Self {
        Self {
            spam_threshold: default_spam_threshold(),
            spam_window_secs: default_spam_window_secs(),
            identical_limit: default_identical_limit(),
            mention_limit: default_mention_limit(),
            caps_ratio: default_caps_ratio(),
            tox_threshold: default_tox_threshold(),
            repeat_window_days: default_repeat_window_days(),
            quarantine_threshold: default_quarantine_threshold(),
            malicious_domains: Vec::new(),
            suspicious_tlds: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdaptationConfig {
    #[serde(default = "default_adaptation_cooldown_secs")]
    pub cooldown_secs: u64,
    #[serde(default = "default_adaptation_ttl_secs")]
    pub event_ttl_secs: u64,
    #[serde(default = "default_quiet_hours_start")]
    pub quiet_hours_start: u32,
    #[serde(default = "default_quiet_hours_end")]
    pub quiet_hours_end: u32,
    #[serde(default = "default_low_engagement_floor")]
    pub low_engagement_floor_per_min: f64,
}

impl Default for AdaptationConfig {
    fn default() -> Self {
        Self {
            cooldown_secs: default_adaptation_cooldown_secs(),
            event_ttl_secs: default_adaptation_ttl_secs(),
            quiet_hours_start: default_quiet_hours_start(),
            quiet_hours_end: default_quiet_hours_end(),
            low_engagement_floor_per_min: default_low_engagement_floor(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageConfig {
    pub default_channel_id: Option<u64>,
    #[serde(default = "default_image_rate_user")]
    pub hourly_rate_user: u32,
    #[serde(default = "default_image_rate_moderator")]
    pub hourly_rate_moderator: u32,
    #[serde(default = "default_image_rate_admin")]
    pub hourly_rate_admin: u32,
    #[serde(default)]
    pub prompt_blocklist: Vec<String>,
}

impl Default for ImageConfig {
    fn default() -> Self {
        Self {
            default_channel_id: None,
            hourly_rate_user: default_image_rate_user(),
            hourly_rate_moderator: default_image_rate_moderator(),
            hourly_rate_admin: default_image_rate_admin(),
            prompt_blocklist: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WelcomeDmConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_welcome_dm_rate_ms")]
    pub rate_ms: u64,
}

impl Default for WelcomeDmConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            rate_ms: default_welcome_dm_rate_ms(),
        }
    }
}

fn default_wake_words() -> Vec<String> {
    vec!["astra".to_string()]
}
fn default_prefix() -> String {
    "!".to_string()
}
fn default_model() -> String {
    "anthropic/claude-3-haiku".to_string()
}
fn default_temperature() -> f64 {
    0.7
}
fn default_max_tokens() -> u32 {
    1024
}
fn default_rate_per_min() -> u32 {
    30
}
fn default_max_retries() -> u32 {
    2
}
fn default_db_path() -> String {
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    format!("{}/.attune/attune.db", home)
}
fn default_conversation_retention_days() -> u32 {
    90
}
fn default_appeal_retention_days() -> u32 {
    30
}
fn default_cache_capacity() -> usize {
    1000
}
fn default_spam_threshold() -> u32 {
    3
}
fn default_spam_window_secs() -> u64 {
    30
}
fn default_identical_limit() -> u32 {
    3
}
fn default_mention_limit() -> u32 {
    5
}
fn default_caps_ratio() -> f64 {
    0.8
}
fn default_tox_threshold() -> f64 {
    0.7
}
fn default_repeat_window_days() -> u32 {
    30
}
fn default_quarantine_threshold() -> f64 {
    10.0
}
fn default_adaptation_cooldown_secs() -> u64 {
    300
}
fn default_adaptation_ttl_secs() -> u64 {
    30 * 60
}
fn default_quiet_hours_start() -> u32 {
    22
}
fn default_quiet_hours_end() -> u32 {
    6
}
fn default_low_engagement_floor() -> f64 {
    0.5
}
fn default_image_rate_user() -> u32 {
    5
}
fn default_image_rate_moderator() -> u32 {
    20
}
fn default_image_rate_admin() -> u32 {
    50
}
fn default_welcome_dm_rate_ms() -> u64 {
    1200
}

impl Config {
    /// Load config from a TOML file with `ATTUNE_*` env var overrides.
    /// Checked once at process start; no hot-reload.
    pub fn load(config_path: Option<&str>) -> crate::error::Result<Self> {
        let path = config_path
            .map(String::from)
            .unwrap_or_else(default_config_path);

        let config: Config = Figment::new()
            .merge(Toml::file(&path))
            .merge(Env::prefixed("ATTUNE_").split("_"))
            .extract()
            .map_err(|e| crate::error::CoreError::Config(e.to_string()))?;

        Ok(config)
    }
}

fn default_config_path() -> String {
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    format!("{}/.attune/attune.toml", home)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_spec_thresholds() {
        let safety = SafetyConfig::default();
        assert_eq!(safety.spam_threshold, 3);
        assert_eq!(safety.spam_window_secs, 30);
        assert_eq!(safety.identical_limit, 3);
        assert_eq!(safety.mention_limit, 5);
        assert!((safety.caps_ratio - 0.8).abs() < f64::EPSILON);
        assert!((safety.tox_threshold - 0.7).abs() < f64::EPSILON);

        let adaptation = AdaptationConfig::default();
        assert_eq!(adaptation.cooldown_secs, 300);
        assert_eq!(adaptation.event_ttl_secs, 1800);

        let image = ImageConfig::default();
        assert_eq!(image.hourly_rate_user, 5);
        assert_eq!(image.hourly_rate_moderator, 20);
        assert_eq!(image.hourly_rate_admin, 50);

        let welcome = WelcomeDmConfig::default();
        assert_eq!(welcome.rate_ms, 1200);
    }
}

//! The content-safety layer (§4.4): spam/toxicity/threat detection,
//! violation records, the punishment ladder, and trust-score upkeep.

mod detectors;
mod error;
mod patterns;
mod punishment;
mod tracker;

use std::sync::Arc;

use attune_core::{ChannelId, Config, GuildId, UserId, ViolationSeverity};
use attune_store::types::{UserProfile, ViolationRecord};
use attune_store::StateStore;
use dashmap::DashMap;
use tracing::{info, warn};

pub use detectors::Finding;
pub use error::{Result, SafetyError};
pub use punishment::{Action, PunishmentStep};
use tracker::UserActivity;

/// What the filter recommends after analyzing one message, left for
/// `EventIngest` to translate into `PlatformActions` calls (§4.4).
#[derive(Debug, Clone)]
pub struct SafetyOutcome {
    pub target_user: UserId,
    pub violations: Vec<ViolationRecord>,
    pub recommended_action: PunishmentStep,
    pub staff_reviewed: bool,
}

pub struct SafetyFilter {
    store: Arc<StateStore>,
    owner_id: UserId,
    spam_threshold: u32,
    spam_window_secs: u64,
    identical_limit: u32,
    mention_limit: u32,
    caps_ratio: f64,
    tox_threshold: f64,
    repeat_window_days: u32,
    quarantine_threshold: f64,
    malicious_domains: Vec<String>,
    suspicious_tlds: Vec<String>,
    activity: DashMap<(UserId, GuildId), UserActivity>,
}

const QUARANTINE_TRUST_WEIGHT: f64 = 5.0;
const CLEAN_MESSAGE_RECOVERY: f64 = 0.05;

impl SafetyFilter {
    pub fn new(store: Arc<StateStore>, config: &Config) -> Self {
        let s = &config.safety;
        Self {
            store,
            owner_id: UserId::new(config.bot.owner_id),
            spam_threshold: s.spam_threshold,
            spam_window_secs: s.spam_window_secs,
            identical_limit: s.identical_limit,
            mention_limit: s.mention_limit,
            caps_ratio: s.caps_ratio,
            tox_threshold: s.tox_threshold,
            repeat_window_days: s.repeat_window_days,
            quarantine_threshold: s.quarantine_threshold,
            malicious_domains: s.malicious_domains.clone(),
            suspicious_tlds: s.suspicious_tlds.clone(),
            activity: DashMap::new(),
        }
    }

    /// Analyze one incoming message. Returns `Ok(None)` when nothing was
    /// detected (or the author is the exempt bot owner); never errors out
    /// into a punitive default — a store failure here is fail-open (§7).
    pub fn check_message(
        &self,
        user_id: UserId,
        guild_id: GuildId,
        channel_id: ChannelId,
        message_id: Option<u64>,
        content: &str,
        mention_count: usize,
        now_unix: f64,
        now_iso: &str,
    ) -> Result<Option<SafetyOutcome>> {
        if user_id == self.owner_id {
            return Ok(None);
        }

        let content_lower = content.to_lowercase();
        let key = (user_id, guild_id);

        let prior_avg_length = self
            .activity
            .get(&key)
            .map(|a| a.avg_length)
            .unwrap_or(0.0);

        let mut findings = Vec::new();
        if let Some(f) = detectors::bot_abuse(content, prior_avg_length) {
            findings.push(f);
        }
        if let Some(f) = detectors::mass_mentions(mention_count, self.mention_limit) {
            findings.push(f);
        }
        if let Some(f) = detectors::caps_abuse(content, self.caps_ratio) {
            findings.push(f);
        }
        if let Some(f) = detectors::toxic_language(&content_lower, self.tox_threshold) {
            findings.push(f);
        }
        if let Some(f) =
            detectors::unsafe_links(content, &self.malicious_domains, &self.suspicious_tlds)
        {
            findings.push(f);
        }
        if let Some(f) = detectors::scam_attempt(&content_lower) {
            findings.push(f);
        }

        {
            let mut entry = self.activity.entry(key).or_default();
            entry.record(now_unix, content);
            if let Some(f) = detectors::spam_messages(
                &entry,
                now_unix,
                self.spam_threshold,
                self.spam_window_secs,
            ) {
                findings.push(f);
            }
            if let Some(f) = detectors::repeated_content(&entry, content, self.identical_limit) {
                findings.push(f);
            }
        }

        if findings.is_empty() {
            self.record_clean_message(user_id, guild_id, now_iso)?;
            return Ok(None);
        }

        let mut records: Vec<ViolationRecord> = findings
            .iter()
            .map(|f| ViolationRecord {
                id: None,
                user_id,
                guild_id,
                message_id,
                channel_id,
                violation_type: f.violation_type.to_string(),
                severity: f.severity,
                timestamp: now_unix,
                heuristic_score: f.heuristic_score,
                ml_confidence: 0.0,
                final_confidence: f.heuristic_score,
                detection_method: f.detection_method.to_string(),
                message_content: content.to_string(),
                evidence: f.evidence.clone(),
                action_taken: None,
                moderator_id: None,
                resolved: false,
                appeal_status: None,
            })
            .collect();

        for record in &mut records {
            match self.store.append_violation(record) {
                Ok(id) => record.id = Some(id),
                Err(e) => warn!(error = %e, "failed to persist violation record"),
            }
        }

        let worst = records
            .iter()
            .max_by_key(|r| r.severity)
            .expect("findings is non-empty");

        let tier = self.tier_for(user_id, guild_id, worst.severity, now_unix)?;
        let step = punishment::step_for(worst.severity, tier);
        let decision = punishment::apply_confidence_gate(step, worst.final_confidence);

        self.apply_trust_penalty(user_id, guild_id, worst.severity, now_iso)?;

        info!(
            user = user_id.get(),
            guild = guild_id.get(),
            violation_type = worst.violation_type,
            severity = %worst.severity,
            action = ?decision.step.action,
            "safety violation detected"
        );

        Ok(Some(SafetyOutcome {
            target_user: user_id,
            violations: records,
            recommended_action: decision.step,
            staff_reviewed: decision.staff_reviewed,
        }))
    }

    fn tier_for(
        &self,
        user_id: UserId,
        guild_id: GuildId,
        severity: ViolationSeverity,
        now_unix: f64,
    ) -> Result<u32> {
        let window_secs = self.repeat_window_days as f64 * 86_400.0;
        let since = now_unix - window_secs;
        let prior = self
            .store
            .list_violations(user_id, guild_id, since)
            .map_err(SafetyError::Store)?;
        let count = prior.iter().filter(|v| v.severity >= severity).count();
        Ok(count as u32)
    }

    fn load_or_create_profile(
        &self,
        user_id: UserId,
        guild_id: GuildId,
        now_iso: &str,
    ) -> Result<UserProfile> {
        Ok(self
            .store
            .get_user_profile(user_id, guild_id)
            .map_err(SafetyError::Store)?
            .unwrap_or_else(|| UserProfile::new(user_id, guild_id, now_iso)))
    }

    fn apply_trust_penalty(
        &self,
        user_id: UserId,
        guild_id: GuildId,
        severity: ViolationSeverity,
        now_iso: &str,
    ) -> Result<()> {
        let mut profile = self.load_or_create_profile(user_id, guild_id, now_iso)?;
        profile.trust_score -= QUARANTINE_TRUST_WEIGHT * severity.weight() as f64;
        profile.last_interaction = now_iso.to_string();
        profile.clamp();
        if profile.trust_score <= self.quarantine_threshold {
            profile.is_quarantined = true;
        }
        self.store.put_user_profile(&profile).map_err(SafetyError::Store)?;
        Ok(())
    }

    fn record_clean_message(&self, user_id: UserId, guild_id: GuildId, now_iso: &str) -> Result<()> {
        let mut profile = self.load_or_create_profile(user_id, guild_id, now_iso)?;
        profile.trust_score = (profile.trust_score + CLEAN_MESSAGE_RECOVERY).min(100.0);
        profile.total_interactions += 1;
        profile.last_interaction = now_iso.to_string();
        profile.clamp();
        self.store.put_user_profile(&profile).map_err(SafetyError::Store)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use attune_core::ChannelId;

    fn filter() -> SafetyFilter {
        let store = Arc::new(StateStore::open_in_memory().unwrap());
        SafetyFilter::new(store, &Config::default())
    }

    #[test]
    fn owner_is_always_exempt() {
        let mut cfg = Config::default();
        cfg.bot.owner_id = 42;
        let f = SafetyFilter::new(Arc::new(StateStore::open_in_memory().unwrap()), &cfg);
        let outcome = f
            .check_message(
                UserId::new(42),
                GuildId::new(1),
                ChannelId::new(1),
                None,
                "KILL YOURSELF KILL YOURSELF",
                0,
                1000.0,
                "2026-01-01T00:00:00Z",
            )
            .unwrap();
        assert!(outcome.is_none());
    }

    #[test]
    fn mass_mentions_flagged() {
        let f = filter();
        let outcome = f
            .check_message(
                UserId::new(1),
                GuildId::new(1),
                ChannelId::new(1),
                None,
                "hey @a @b @c @d @e @f",
                6,
                1000.0,
                "2026-01-01T00:00:00Z",
            )
            .unwrap();
        let outcome = outcome.expect("mass mentions should trip");
        assert!(outcome
            .violations
            .iter()
            .any(|v| v.violation_type == "mass_mentions"));
    }

    #[test]
    fn clean_message_raises_trust_score() {
        let f = filter();
        f.check_message(
            UserId::new(5),
            GuildId::new(1),
            ChannelId::new(1),
            None,
            "hello there",
            0,
            1000.0,
            "2026-01-01T00:00:00Z",
        )
        .unwrap();
        let profile = f
            .store
            .get_user_profile(UserId::new(5), GuildId::new(1))
            .unwrap()
            .unwrap();
        assert!(profile.trust_score > 50.0);
    }

    #[test]
    fn repeated_violation_quarantines() {
        let f = filter();
        for _ in 0..25 {
            f.apply_trust_penalty(
                UserId::new(9),
                GuildId::new(1),
                ViolationSeverity::Severe,
                "2026-01-01T00:00:00Z",
            )
            .unwrap();
        }
        let profile = f
            .store
            .get_user_profile(UserId::new(9), GuildId::new(1))
            .unwrap()
            .unwrap();
        assert!(profile.is_quarantined);
    }
}

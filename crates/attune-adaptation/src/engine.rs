use std::sync::Arc;

use attune_core::GuildId;
use attune_store::types::{AdaptationEvent, AdaptationStatus};
use attune_store::StateStore;
use chrono::{Duration, Utc};
use dashmap::DashMap;
use tokio::sync::watch;
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::{AdaptationError, Result};
use crate::rules::delta_for_signal;

/// Signal → trait-delta rule engine with per-guild cooldowns and a
/// background expiry sweep (§4.5). Holds no DB connection of its own —
/// all persistence goes through `attune-store`.
pub struct AdaptationEngine {
    store: Arc<StateStore>,
    cooldowns: DashMap<GuildId, chrono::DateTime<Utc>>,
    cooldown_secs: i64,
    event_ttl_secs: i64,
}

impl AdaptationEngine {
    pub fn new(store: Arc<StateStore>, cooldown_secs: u64, event_ttl_secs: u64) -> Self {
        Self {
            store,
            cooldowns: DashMap::new(),
            cooldown_secs: cooldown_secs as i64,
            event_ttl_secs: event_ttl_secs as i64,
        }
    }

    /// Apply `signal`'s rule-table delta to `guild`, subject to the
    /// per-guild cooldown. Returns `false` if still cooling down.
    pub fn adapt(
        &self,
        guild: GuildId,
        signal: &str,
        payload: serde_json::Value,
        reason: Option<String>,
    ) -> Result<bool> {
        let delta = delta_for_signal(signal)
            .ok_or_else(|| AdaptationError::UnknownSignal(signal.to_string()))?;

        let now = Utc::now();
        if let Some(last) = self.cooldowns.get(&guild) {
            if now - *last < Duration::seconds(self.cooldown_secs) {
                return Ok(false);
            }
        }

        let event = AdaptationEvent {
            id: Uuid::new_v4().to_string(),
            guild_id: guild,
            signal: signal.to_string(),
            payload,
            delta_profile: delta,
            applied_at: now.to_rfc3339(),
            expires_at: Some((now + Duration::seconds(self.event_ttl_secs)).to_rfc3339()),
            status: AdaptationStatus::Active,
            priority: 50,
            reason,
            applied_by: attune_core::AUTO_ADAPT.to_string(),
        };
        self.store.insert_adaptation(&event)?;
        self.cooldowns.insert(guild, now);
        info!(guild = %guild, %signal, "adaptation applied");
        Ok(true)
    }

    pub fn cancel(&self, event_id: &str, moderator: attune_core::UserId) -> Result<()> {
        self.store
            .mark_adaptation_status(event_id, AdaptationStatus::Cancelled)?;
        info!(event_id, moderator = %moderator, "adaptation cancelled");
        Ok(())
    }

    pub fn active_for_guild(&self, guild: GuildId) -> Result<Vec<AdaptationEvent>> {
        Ok(self.store.list_active_adaptations(guild)?)
    }

    fn sweep(&self) {
        let now = Utc::now().to_rfc3339();
        match self.store.expire_adaptations(&now) {
            Ok(n) if n > 0 => info!(count = n, "adaptation events expired"),
            Ok(_) => {}
            Err(e) => warn!("adaptation expiry sweep failed: {e}"),
        }
    }

    /// 60s expiry sweep (§5), selecting between its tick and shutdown.
    pub async fn run(self: Arc<Self>, mut shutdown: watch::Receiver<bool>) {
        info!("adaptation engine sweep started");
        let mut interval = tokio::time::interval(std::time::Duration::from_secs(60));
        loop {
            tokio::select! {
                _ = interval.tick() => self.sweep(),
                _ = shutdown.changed() => {
                    if *shutdown.borrow() {
                        info!("adaptation engine sweep shutting down");
                        break;
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine() -> AdaptationEngine {
        AdaptationEngine::new(Arc::new(StateStore::open_in_memory().unwrap()), 300, 1800)
    }

    #[test]
    fn adapt_inserts_active_event() {
        let e = engine();
        let applied = e
            .adapt(GuildId::new(1), "spam_spike", serde_json::json!({}), None)
            .unwrap();
        assert!(applied);
        assert_eq!(e.active_for_guild(GuildId::new(1)).unwrap().len(), 1);
    }

    #[test]
    fn cooldown_blocks_second_adapt() {
        let e = engine();
        assert!(e
            .adapt(GuildId::new(1), "spam_spike", serde_json::json!({}), None)
            .unwrap());
        assert!(!e
            .adapt(GuildId::new(1), "raid_detected", serde_json::json!({}), None)
            .unwrap());
    }

    #[test]
    fn unknown_signal_errors() {
        let e = engine();
        assert!(e
            .adapt(GuildId::new(1), "nonexistent", serde_json::json!({}), None)
            .is_err());
    }

    #[test]
    fn cancel_marks_cancelled() {
        let e = engine();
        e.adapt(GuildId::new(1), "spam_spike", serde_json::json!({}), None)
            .unwrap();
        let event_id = e.active_for_guild(GuildId::new(1)).unwrap()[0].id.clone();
        e.cancel(&event_id, attune_core::UserId::new(1)).unwrap();
        assert_eq!(e.active_for_guild(GuildId::new(1)).unwrap().len(), 0);
    }
}

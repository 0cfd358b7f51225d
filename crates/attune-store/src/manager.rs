use std::path::Path;
use std::sync::Mutex;

use attune_core::{ChannelId, GuildId, SessionKey, UserId};
use rusqlite::{params, Connection, OptionalExtension};

use crate::db::init_db;
use crate::error::{Result, StoreError};
use crate::types::{
    AdaptationEvent, AdaptationStatus, CacheEntry, ConversationWindow, GuildPersonality,
    ImageGenerationRecord, PersonalityTraits, UserOverride, UserProfile, ViolationRecord,
};

/// Owns the single SQLite connection backing every persisted-state
/// component in §4.1. Nothing outside this crate touches the database
/// directly.
pub struct StateStore {
    conn: Mutex<Connection>,
}

impl StateStore {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let conn = Connection::open(path)?;
        conn.execute_batch(
            "PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON; PRAGMA busy_timeout=3000;",
        )?;
        init_db(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        init_db(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    // -- guild personalities -------------------------------------------

    pub fn get_guild_personality(&self, guild_id: GuildId) -> Result<Option<GuildPersonality>> {
        let conn = self.conn.lock().unwrap();
        conn.query_row(
            "SELECT guild_id, humor, honesty, formality, empathy, strictness, initiative,
                    mode, version, updated_by, updated_at
             FROM guild_personalities WHERE guild_id = ?1",
            params![guild_id.get()],
            row_to_guild_personality,
        )
        .optional()
        .map_err(StoreError::from)
    }

    pub fn put_guild_personality(&self, personality: &GuildPersonality) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        let t = &personality.traits;
        conn.execute(
            "INSERT INTO guild_personalities
                (guild_id, humor, honesty, formality, empathy, strictness, initiative,
                 mode, version, updated_by, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
             ON CONFLICT(guild_id) DO UPDATE SET
                humor = excluded.humor, honesty = excluded.honesty,
                formality = excluded.formality, empathy = excluded.empathy,
                strictness = excluded.strictness, initiative = excluded.initiative,
                mode = excluded.mode, version = excluded.version,
                updated_by = excluded.updated_by, updated_at = excluded.updated_at",
            params![
                personality.guild_id.get(),
                t.humor,
                t.honesty,
                t.formality,
                t.empathy,
                t.strictness,
                t.initiative,
                t.mode.to_string(),
                t.version as i64,
                personality.updated_by.get(),
                personality.updated_at,
            ],
        )?;
        Ok(())
    }

    // -- user overrides --------------------------------------------------

    pub fn get_user_override(
        &self,
        user_id: UserId,
        guild_id: GuildId,
    ) -> Result<Option<UserOverride>> {
        let conn = self.conn.lock().unwrap();
        conn.query_row(
            "SELECT humor, honesty, formality, empathy, strictness, initiative, updated_at
             FROM user_overrides WHERE user_id = ?1 AND guild_id = ?2",
            params![user_id.get(), guild_id.get()],
            |row| {
                Ok(UserOverride {
                    humor: row.get(0)?,
                    honesty: row.get(1)?,
                    formality: row.get(2)?,
                    empathy: row.get(3)?,
                    strictness: row.get(4)?,
                    initiative: row.get(5)?,
                    updated_at: row.get(6)?,
                })
            },
        )
        .optional()
        .map_err(StoreError::from)
    }

    pub fn put_user_override(
        &self,
        user_id: UserId,
        guild_id: GuildId,
        ov: &UserOverride,
    ) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO user_overrides
                (user_id, guild_id, humor, honesty, formality, empathy, strictness, initiative, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
             ON CONFLICT(user_id, guild_id) DO UPDATE SET
                humor = excluded.humor, honesty = excluded.honesty,
                formality = excluded.formality, empathy = excluded.empathy,
                strictness = excluded.strictness, initiative = excluded.initiative,
                updated_at = excluded.updated_at",
            params![
                user_id.get(),
                guild_id.get(),
                ov.humor,
                ov.honesty,
                ov.formality,
                ov.empathy,
                ov.strictness,
                ov.initiative,
                ov.updated_at,
            ],
        )?;
        Ok(())
    }

    pub fn clear_user_override(&self, user_id: UserId, guild_id: GuildId) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "DELETE FROM user_overrides WHERE user_id = ?1 AND guild_id = ?2",
            params![user_id.get(), guild_id.get()],
        )?;
        Ok(())
    }

    // -- user profiles ----------------------------------------------------

    pub fn get_user_profile(
        &self,
        user_id: UserId,
        guild_id: GuildId,
    ) -> Result<Option<UserProfile>> {
        let conn = self.conn.lock().unwrap();
        let blob: Option<String> = conn
            .query_row(
                "SELECT profile_blob FROM user_profiles WHERE user_id = ?1 AND guild_id = ?2",
                params![user_id.get(), guild_id.get()],
                |row| row.get(0),
            )
            .optional()?;
        match blob {
            Some(b) => Ok(Some(
                serde_json::from_str(&b).map_err(|e| StoreError::Serialization(e.to_string()))?,
            )),
            None => Ok(None),
        }
    }

    pub fn put_user_profile(&self, profile: &UserProfile) -> Result<()> {
        let blob =
            serde_json::to_string(profile).map_err(|e| StoreError::Serialization(e.to_string()))?;
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO user_profiles (user_id, guild_id, profile_blob)
             VALUES (?1, ?2, ?3)
             ON CONFLICT(user_id, guild_id) DO UPDATE SET profile_blob = excluded.profile_blob",
            params![profile.user_id.get(), profile.guild_id.get(), blob],
        )?;
        Ok(())
    }

    // -- sessions ----------------------------------------------------------

    pub fn load_session(&self, key: &SessionKey) -> Result<Option<ConversationWindow>> {
        let conn = self.conn.lock().unwrap();
        let blob: Option<String> = conn
            .query_row(
                "SELECT window_blob FROM sessions WHERE session_id = ?1",
                params![key.format()],
                |row| row.get(0),
            )
            .optional()?;
        match blob {
            Some(b) => Ok(Some(
                serde_json::from_str(&b).map_err(|e| StoreError::Serialization(e.to_string()))?,
            )),
            None => Ok(None),
        }
    }

    pub fn save_session(
        &self,
        key: &SessionKey,
        window: &ConversationWindow,
        now: &str,
    ) -> Result<()> {
        let blob =
            serde_json::to_string(window).map_err(|e| StoreError::Serialization(e.to_string()))?;
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO sessions (session_id, guild_id, channel_id, user_id, window_blob, last_updated)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)
             ON CONFLICT(session_id) DO UPDATE SET
                window_blob = excluded.window_blob, last_updated = excluded.last_updated",
            params![
                key.format(),
                key.guild_id.get(),
                key.channel_id.get(),
                key.user_id.get(),
                blob,
                now,
            ],
        )?;
        Ok(())
    }

    // -- violations ----------------------------------------------------------

    pub fn append_violation(&self, v: &ViolationRecord) -> Result<i64> {
        let evidence =
            serde_json::to_string(&v.evidence).map_err(|e| StoreError::Serialization(e.to_string()))?;
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO violations
                (user_id, guild_id, message_id, channel_id, violation_type, severity,
                 timestamp, heuristic_score, ml_confidence, final_confidence, detection_method,
                 message_content, evidence_blob, action_taken, moderator_id, resolved, appeal_status)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17)",
            params![
                v.user_id.get(),
                v.guild_id.get(),
                v.message_id,
                v.channel_id.get(),
                v.violation_type,
                v.severity as i64,
                v.timestamp,
                v.heuristic_score,
                v.ml_confidence,
                v.final_confidence,
                v.detection_method,
                v.message_content,
                evidence,
                v.action_taken,
                v.moderator_id.map(|u| u.get()),
                v.resolved as i64,
                v.appeal_status,
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// Record the `PlatformActions` call EventIngest ended up making for
    /// a violation, once it has actually been applied.
    pub fn mark_violation_action(&self, violation_id: i64, action_taken: &str) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "UPDATE violations SET action_taken = ?1 WHERE id = ?2",
            params![action_taken, violation_id],
        )?;
        Ok(())
    }

    pub fn list_violations(
        &self,
        user_id: UserId,
        guild_id: GuildId,
        since_timestamp: f64,
    ) -> Result<Vec<ViolationRecord>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT id, user_id, guild_id, message_id, channel_id, violation_type, severity,
                    timestamp, heuristic_score, ml_confidence, final_confidence, detection_method,
                    message_content, evidence_blob, action_taken, moderator_id, resolved, appeal_status
             FROM violations
             WHERE user_id = ?1 AND guild_id = ?2 AND timestamp >= ?3
             ORDER BY timestamp ASC",
        )?;
        let rows = stmt
            .query_map(
                params![user_id.get(), guild_id.get(), since_timestamp],
                row_to_violation,
            )?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    // -- adaptation events ------------------------------------------------

    pub fn insert_adaptation(&self, event: &AdaptationEvent) -> Result<()> {
        let payload =
            serde_json::to_string(&event.payload).map_err(|e| StoreError::Serialization(e.to_string()))?;
        let delta = serde_json::to_string(&event.delta_profile)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO adaptation_events
                (id, guild_id, event_type, payload_blob, delta_blob, applied_at, expires_at,
                 status, priority, reason, applied_by)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
            params![
                event.id,
                event.guild_id.get(),
                event.signal,
                payload,
                delta,
                event.applied_at,
                event.expires_at,
                event.status.to_string(),
                event.priority,
                event.reason,
                event.applied_by,
            ],
        )?;
        Ok(())
    }

    pub fn list_active_adaptations(&self, guild_id: GuildId) -> Result<Vec<AdaptationEvent>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT id, guild_id, event_type, payload_blob, delta_blob, applied_at, expires_at,
                    status, priority, reason, applied_by
             FROM adaptation_events
             WHERE guild_id = ?1 AND status = 'active'
             ORDER BY priority DESC, applied_at ASC",
        )?;
        let rows = stmt
            .query_map(params![guild_id.get()], row_to_adaptation)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    pub fn mark_adaptation_status(&self, id: &str, status: AdaptationStatus) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "UPDATE adaptation_events SET status = ?1 WHERE id = ?2",
            params![status.to_string(), id],
        )?;
        Ok(())
    }

    /// Flip every expired-but-still-active row to `expired`; returns the
    /// number of rows changed (§4.5's periodic sweep).
    pub fn expire_adaptations(&self, now: &str) -> Result<usize> {
        let conn = self.conn.lock().unwrap();
        let n = conn.execute(
            "UPDATE adaptation_events SET status = 'expired'
             WHERE status = 'active' AND expires_at IS NOT NULL AND expires_at <= ?1",
            params![now],
        )?;
        Ok(n)
    }

    // -- cache ---------------------------------------------------------------

    pub fn get_cache(&self, key: &str) -> Result<Option<CacheEntry>> {
        let conn = self.conn.lock().unwrap();
        conn.query_row(
            "SELECT key, value_blob, content_type, inserted_at, ttl_seconds
             FROM cache_entries WHERE key = ?1",
            params![key],
            row_to_cache_entry,
        )
        .optional()
        .map_err(StoreError::from)
    }

    pub fn put_cache(&self, entry: &CacheEntry) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO cache_entries (key, value_blob, content_type, inserted_at, ttl_seconds)
             VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT(key) DO UPDATE SET
                value_blob = excluded.value_blob, content_type = excluded.content_type,
                inserted_at = excluded.inserted_at, ttl_seconds = excluded.ttl_seconds",
            params![
                entry.key,
                entry.value,
                entry.content_type,
                entry.inserted_at,
                entry.ttl_class.as_secs() as i64,
            ],
        )?;
        Ok(())
    }

    /// Delete every row whose TTL has lapsed as of `now_unix`; returns the
    /// number of rows evicted (§4.2's sweep task).
    pub fn evict_expired_cache(&self, now_unix: f64) -> Result<usize> {
        let conn = self.conn.lock().unwrap();
        let n = conn.execute(
            "DELETE FROM cache_entries WHERE inserted_at + ttl_seconds <= ?1",
            params![now_unix],
        )?;
        Ok(n)
    }

    // -- image generation log -------------------------------------------

    pub fn record_image_generation(&self, rec: &ImageGenerationRecord) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO image_generations
                (user_id, channel_id, prompt, provider, success, error, image_url, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                rec.user_id.get(),
                rec.channel_id.get(),
                rec.prompt,
                rec.provider,
                rec.success as i64,
                rec.error,
                rec.image_url,
                rec.created_at,
            ],
        )?;
        Ok(())
    }

    /// Delete conversation sessions and resolved violation/appeal rows
    /// older than the configured retention windows (§6 retention policy).
    pub fn purge_retention(
        &self,
        session_cutoff: &str,
        resolved_violation_cutoff: &str,
    ) -> Result<(usize, usize)> {
        let conn = self.conn.lock().unwrap();
        let sessions = conn.execute(
            "DELETE FROM sessions WHERE last_updated < ?1",
            params![session_cutoff],
        )?;
        let violations = conn.execute(
            "DELETE FROM violations WHERE resolved = 1 AND timestamp < ?1",
            params![resolved_violation_cutoff],
        )?;
        Ok((sessions, violations))
    }
}

fn row_to_guild_personality(row: &rusqlite::Row<'_>) -> rusqlite::Result<GuildPersonality> {
    let mode: String = row.get(7)?;
    Ok(GuildPersonality {
        guild_id: GuildId::new(row.get::<_, i64>(0)? as u64),
        traits: PersonalityTraits {
            humor: row.get(1)?,
            honesty: row.get(2)?,
            formality: row.get(3)?,
            empathy: row.get(4)?,
            strictness: row.get(5)?,
            initiative: row.get(6)?,
            mode: mode.parse().unwrap_or_default(),
            version: row.get::<_, i64>(8)? as u64,
        },
        updated_by: UserId::new(row.get::<_, i64>(9)? as u64),
        updated_at: row.get(10)?,
    })
}

fn row_to_violation(row: &rusqlite::Row<'_>) -> rusqlite::Result<ViolationRecord> {
    let evidence_blob: String = row.get(13)?;
    let severity: i64 = row.get(6)?;
    Ok(ViolationRecord {
        id: Some(row.get(0)?),
        user_id: UserId::new(row.get::<_, i64>(1)? as u64),
        guild_id: GuildId::new(row.get::<_, i64>(2)? as u64),
        message_id: row.get::<_, Option<i64>>(3)?.map(|v| v as u64),
        channel_id: ChannelId::new(row.get::<_, i64>(4)? as u64),
        violation_type: row.get(5)?,
        severity: severity_from_i64(severity),
        timestamp: row.get(7)?,
        heuristic_score: row.get(8)?,
        ml_confidence: row.get(9)?,
        final_confidence: row.get(10)?,
        detection_method: row.get(11)?,
        message_content: row.get(12)?,
        evidence: serde_json::from_str(&evidence_blob).unwrap_or(serde_json::Value::Null),
        action_taken: row.get(14)?,
        moderator_id: row.get::<_, Option<i64>>(15)?.map(|v| UserId::new(v as u64)),
        resolved: row.get::<_, i64>(16)? != 0,
        appeal_status: row.get(17)?,
    })
}

fn severity_from_i64(v: i64) -> attune_core::ViolationSeverity {
    use attune_core::ViolationSeverity::*;
    match v {
        1 => Low,
        2 => Medium,
        3 => High,
        _ => Severe,
    }
}

fn row_to_adaptation(row: &rusqlite::Row<'_>) -> rusqlite::Result<AdaptationEvent> {
    let payload_blob: String = row.get(3)?;
    let delta_blob: String = row.get(4)?;
    let status: String = row.get(7)?;
    Ok(AdaptationEvent {
        id: row.get(0)?,
        guild_id: GuildId::new(row.get::<_, i64>(1)? as u64),
        signal: row.get(2)?,
        payload: serde_json::from_str(&payload_blob).unwrap_or(serde_json::Value::Null),
        delta_profile: serde_json::from_str(&delta_blob).unwrap_or_default(),
        applied_at: row.get(5)?,
        expires_at: row.get(6)?,
        status: status.parse().unwrap_or(AdaptationStatus::Expired),
        priority: row.get::<_, i64>(8)? as u32,
        reason: row.get(9)?,
        applied_by: row.get(10)?,
    })
}

fn row_to_cache_entry(row: &rusqlite::Row<'_>) -> rusqlite::Result<CacheEntry> {
    let ttl_seconds: i64 = row.get(4)?;
    Ok(CacheEntry {
        key: row.get(0)?,
        value: row.get(1)?,
        content_type: row.get(2)?,
        inserted_at: row.get(3)?,
        ttl_class: ttl_class_from_secs(ttl_seconds as u64),
    })
}

fn ttl_class_from_secs(secs: u64) -> attune_core::TtlClass {
    use attune_core::TtlClass::*;
    match secs {
        0..=300 => Short,
        301..=1800 => Medium,
        _ => Long,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use attune_core::PersonalityMode;

    fn store() -> StateStore {
        StateStore::open_in_memory().unwrap()
    }

    #[test]
    fn guild_personality_roundtrip() {
        let s = store();
        let gp = GuildPersonality {
            guild_id: GuildId::new(1),
            traits: PersonalityTraits::defaults(),
            updated_by: UserId::new(7),
            updated_at: "2026-01-01T00:00:00Z".to_string(),
        };
        s.put_guild_personality(&gp).unwrap();
        let loaded = s.get_guild_personality(GuildId::new(1)).unwrap().unwrap();
        assert_eq!(loaded.traits.humor, 50);
        assert_eq!(loaded.traits.mode, PersonalityMode::Social);
    }

    #[test]
    fn user_override_roundtrip_and_clear() {
        let s = store();
        let ov = UserOverride {
            humor: Some(90),
            updated_at: "2026-01-01T00:00:00Z".to_string(),
            ..Default::default()
        };
        s.put_user_override(UserId::new(1), GuildId::new(1), &ov)
            .unwrap();
        let loaded = s
            .get_user_override(UserId::new(1), GuildId::new(1))
            .unwrap()
            .unwrap();
        assert_eq!(loaded.humor, Some(90));
        s.clear_user_override(UserId::new(1), GuildId::new(1)).unwrap();
        assert!(s
            .get_user_override(UserId::new(1), GuildId::new(1))
            .unwrap()
            .is_none());
    }

    #[test]
    fn session_roundtrip() {
        let s = store();
        let key = SessionKey::new(GuildId::new(1), ChannelId::new(2), UserId::new(3));
        let mut window = ConversationWindow::empty();
        window.append(crate::types::Turn {
            role: crate::types::TurnRole::User,
            content: "hi".into(),
            timestamp: "2026-01-01T00:00:00Z".into(),
            importance: 0.1,
        });
        s.save_session(&key, &window, "2026-01-01T00:00:00Z").unwrap();
        let loaded = s.load_session(&key).unwrap().unwrap();
        assert_eq!(loaded.turns.len(), 1);
    }

    #[test]
    fn cache_eviction_removes_expired_rows() {
        let s = store();
        s.put_cache(&CacheEntry {
            key: "a".into(),
            value: vec![1, 2, 3],
            content_type: "text".into(),
            inserted_at: 0.0,
            ttl_class: attune_core::TtlClass::Short,
        })
        .unwrap();
        let evicted = s.evict_expired_cache(10_000.0).unwrap();
        assert_eq!(evicted, 1);
        assert!(s.get_cache("a").unwrap().is_none());
    }

    #[test]
    fn adaptation_lifecycle() {
        let s = store();
        let event = AdaptationEvent {
            id: "evt-1".into(),
            guild_id: GuildId::new(1),
            signal: "spam_spike".into(),
            payload: serde_json::json!({}),
            delta_profile: Default::default(),
            applied_at: "2026-01-01T00:00:00Z".into(),
            expires_at: Some("2026-01-01T00:30:00Z".into()),
            status: AdaptationStatus::Active,
            priority: 1,
            reason: None,
            applied_by: "auto-adapt".into(),
        };
        s.insert_adaptation(&event).unwrap();
        assert_eq!(s.list_active_adaptations(GuildId::new(1)).unwrap().len(), 1);
        let expired = s.expire_adaptations("2026-01-01T01:00:00Z").unwrap();
        assert_eq!(expired, 1);
        assert_eq!(s.list_active_adaptations(GuildId::new(1)).unwrap().len(), 0);
    }
}

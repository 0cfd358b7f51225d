use rusqlite::{Connection, Result};

/// Create every table and index in §6's persisted-state layout. Safe to
/// call on every startup (idempotent) — the only migration unit in the
/// crate; no other component issues DDL (§9).
pub fn init_db(conn: &Connection) -> Result<()> {
    create_guild_personalities(conn)?;
    create_user_overrides(conn)?;
    create_user_profiles(conn)?;
    create_sessions(conn)?;
    create_violations(conn)?;
    create_adaptation_events(conn)?;
    create_cache_entries(conn)?;
    create_image_generations(conn)?;
    Ok(())
}

fn create_guild_personalities(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS guild_personalities (
            guild_id    INTEGER PRIMARY KEY,
            humor       INTEGER NOT NULL,
            honesty     INTEGER NOT NULL,
            formality   INTEGER NOT NULL,
            empathy     INTEGER NOT NULL,
            strictness  INTEGER NOT NULL,
            initiative  INTEGER NOT NULL,
            mode        TEXT NOT NULL,
            version     INTEGER NOT NULL,
            updated_by  INTEGER NOT NULL,
            updated_at  TEXT NOT NULL
        );",
    )
}

fn create_user_overrides(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS user_overrides (
            user_id     INTEGER NOT NULL,
            guild_id    INTEGER NOT NULL,
            humor       INTEGER,
            honesty     INTEGER,
            formality   INTEGER,
            empathy     INTEGER,
            strictness  INTEGER,
            initiative  INTEGER,
            updated_at  TEXT NOT NULL,
            UNIQUE(user_id, guild_id)
        );
        CREATE INDEX IF NOT EXISTS idx_overrides_user_guild
            ON user_overrides(user_id, guild_id);
        CREATE INDEX IF NOT EXISTS idx_overrides_guild
            ON user_overrides(guild_id);",
    )
}

fn create_user_profiles(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS user_profiles (
            user_id      INTEGER NOT NULL,
            guild_id     INTEGER NOT NULL,
            profile_blob TEXT NOT NULL,
            PRIMARY KEY (user_id, guild_id)
        );
        CREATE INDEX IF NOT EXISTS idx_profiles_user_guild
            ON user_profiles(user_id, guild_id);
        CREATE INDEX IF NOT EXISTS idx_profiles_guild
            ON user_profiles(guild_id);",
    )
}

fn create_sessions(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS sessions (
            session_id                TEXT PRIMARY KEY,
            guild_id                  INTEGER NOT NULL,
            channel_id                INTEGER NOT NULL,
            user_id                   INTEGER NOT NULL,
            window_blob               TEXT NOT NULL,
            personality_snapshot_blob TEXT,
            last_updated              TEXT NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_sessions_guild
            ON sessions(guild_id);
        CREATE INDEX IF NOT EXISTS idx_sessions_updated
            ON sessions(last_updated);",
    )
}

fn create_violations(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS violations (
            id             INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id        INTEGER NOT NULL,
            guild_id       INTEGER NOT NULL,
            message_id     INTEGER,
            channel_id     INTEGER NOT NULL,
            violation_type TEXT NOT NULL,
            severity       INTEGER NOT NULL,
            timestamp      REAL NOT NULL,
            heuristic_score   REAL NOT NULL,
            ml_confidence     REAL NOT NULL,
            final_confidence  REAL NOT NULL,
            detection_method  TEXT NOT NULL,
            message_content   TEXT NOT NULL,
            evidence_blob  TEXT NOT NULL,
            action_taken   TEXT,
            moderator_id   INTEGER,
            resolved       INTEGER NOT NULL DEFAULT 0,
            appeal_status  TEXT
        );
        CREATE INDEX IF NOT EXISTS idx_violations_user_guild
            ON violations(user_id, guild_id);
        CREATE INDEX IF NOT EXISTS idx_violations_guild
            ON violations(guild_id);",
    )
}

fn create_adaptation_events(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS adaptation_events (
            id          TEXT PRIMARY KEY,
            guild_id    INTEGER NOT NULL,
            event_type  TEXT NOT NULL,
            payload_blob TEXT NOT NULL,
            delta_blob   TEXT NOT NULL,
            applied_at   TEXT NOT NULL,
            expires_at   TEXT,
            status       TEXT NOT NULL,
            priority     INTEGER NOT NULL,
            reason       TEXT,
            applied_by   TEXT NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_adaptation_status_guild
            ON adaptation_events(status, guild_id);
        CREATE INDEX IF NOT EXISTS idx_adaptation_guild
            ON adaptation_events(guild_id);",
    )
}

fn create_cache_entries(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS cache_entries (
            key          TEXT PRIMARY KEY,
            value_blob   BLOB NOT NULL,
            content_type TEXT NOT NULL,
            inserted_at  REAL NOT NULL,
            ttl_seconds  INTEGER NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_cache_inserted_at
            ON cache_entries(inserted_at);",
    )
}

fn create_image_generations(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS image_generations (
            id          INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id     INTEGER NOT NULL,
            channel_id  INTEGER NOT NULL,
            prompt      TEXT NOT NULL,
            provider    TEXT NOT NULL,
            success     INTEGER NOT NULL,
            error       TEXT,
            image_url   TEXT,
            created_at  TEXT NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_image_gen_user
            ON image_generations(user_id);",
    )
}

//! Durable shared state: biological state, relationships, chat logs, snapshots.
//!
//! All consumers go through the narrow [`StateStore`] contract. The SQLite
//! implementation keeps the schema small:
//!
//! ```sql
//! biological_state (id = 1, fatigue REAL, sleeping INTEGER, updated_at TEXT)
//! relationships    (user_id TEXT PK, affinity REAL, interaction_count INTEGER,
//!                   last_interaction_at TEXT, display_name TEXT, secret_phrase TEXT)
//! chat_logs        (id INTEGER PK, user_id TEXT, message TEXT, response TEXT,
//!                   affect_snapshot TEXT, timestamp TEXT)
//! snapshots        (key TEXT PK, data TEXT, updated_at TEXT)
//! ```
//!
//! Every mutation is a single statement (`UPDATE … RETURNING`, upsert), so
//! concurrent sessions never interleave a read and a write.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use rusqlite::types::Type;
use rusqlite::{Connection, OpenFlags, OptionalExtension, Row, params};
use tracing::{debug, info};

use crate::config::PersistenceConfig;
use crate::error::{CoreError, Result};
use crate::snapshot::SnapshotStore;
use crate::types::{BiologicalState, ChatLogEntry, HistoryTurn, Relationship};

/// Narrow read/update contract over the durable store.
pub trait StateStore: Send + Sync {
    /// The singleton biological state.
    ///
    /// # Errors
    /// Fails on store errors or if the singleton row is missing.
    fn biological_state(&self) -> Result<BiologicalState>;

    /// Atomically add `step` to fatigue (clamped to `[0, 1]`) and set
    /// `sleeping` if the new fatigue exceeds `sleep_threshold`. Fatigue is
    /// rounded to 9 decimals so repeated steps do not drift past the threshold.
    ///
    /// # Errors
    /// Fails on store errors.
    fn increment_fatigue(&self, step: f64, sleep_threshold: f64) -> Result<BiologicalState>;

    /// External wake event: fatigue to 0, `sleeping` cleared.
    ///
    /// # Errors
    /// Fails on store errors.
    fn wake(&self) -> Result<BiologicalState>;

    /// External rest event: `sleeping` set.
    ///
    /// # Errors
    /// Fails on store errors.
    fn rest(&self) -> Result<BiologicalState>;

    /// Upsert the relationship: a new row starts at `delta` with one
    /// interaction; an existing row gains `delta` and one interaction.
    ///
    /// # Errors
    /// Fails on store errors.
    fn touch_relationship(&self, user_id: &str, delta: f64) -> Result<Relationship>;

    /// Read a relationship without touching it.
    ///
    /// # Errors
    /// Fails on store errors.
    fn relationship(&self, user_id: &str) -> Result<Option<Relationship>>;

    /// Insert or overwrite a relationship row verbatim.
    ///
    /// # Errors
    /// Fails on store errors.
    fn put_relationship(&self, relationship: &Relationship) -> Result<()>;

    /// Set the display name.
    ///
    /// # Errors
    /// Fails on store errors.
    fn set_display_name(&self, user_id: &str, name: &str) -> Result<()>;

    /// Set the secret phrase.
    ///
    /// # Errors
    /// Fails on store errors.
    fn set_secret_phrase(&self, user_id: &str, phrase: &str) -> Result<()>;

    /// Append a chat log row and return its id.
    ///
    /// # Errors
    /// Fails on store errors.
    fn append_chat_log(
        &self,
        user_id: &str,
        message: &str,
        response: &str,
        affect_snapshot_json: &str,
    ) -> Result<i64>;

    /// The `limit` most recent exchanges with `user_id`, oldest first.
    ///
    /// # Errors
    /// Fails on store errors.
    fn recent_history(&self, user_id: &str, limit: usize) -> Result<Vec<HistoryTurn>>;

    /// Every chat log row for `user_id`, oldest first.
    ///
    /// # Errors
    /// Fails on store errors.
    fn chat_logs(&self, user_id: &str) -> Result<Vec<ChatLogEntry>>;
}

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS biological_state (
        id         INTEGER PRIMARY KEY CHECK (id = 1),
        fatigue    REAL NOT NULL,
        sleeping   INTEGER NOT NULL,
        updated_at TEXT NOT NULL
    );
    CREATE TABLE IF NOT EXISTS relationships (
        user_id             TEXT PRIMARY KEY,
        affinity            REAL NOT NULL,
        interaction_count   INTEGER NOT NULL,
        last_interaction_at TEXT NOT NULL,
        display_name        TEXT,
        secret_phrase       TEXT
    );
    CREATE TABLE IF NOT EXISTS chat_logs (
        id              INTEGER PRIMARY KEY AUTOINCREMENT,
        user_id         TEXT NOT NULL,
        message         TEXT NOT NULL,
        response        TEXT NOT NULL,
        affect_snapshot TEXT NOT NULL,
        timestamp       TEXT NOT NULL
    );
    CREATE INDEX IF NOT EXISTS idx_chat_logs_user ON chat_logs (user_id, id);
    CREATE TABLE IF NOT EXISTS snapshots (
        key        TEXT PRIMARY KEY,
        data       TEXT NOT NULL,
        updated_at TEXT NOT NULL
    );
";

const BIO_COLUMNS: &str = "fatigue, sleeping, updated_at";
const REL_COLUMNS: &str =
    "user_id, affinity, interaction_count, last_interaction_at, display_name, secret_phrase";

fn parse_ts(idx: usize, raw: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn bio_from_row(row: &Row<'_>) -> rusqlite::Result<BiologicalState> {
    let updated_at: String = row.get(2)?;
    Ok(BiologicalState {
        fatigue: row.get(0)?,
        sleeping: row.get(1)?,
        updated_at: parse_ts(2, &updated_at)?,
    })
}

#[allow(clippy::cast_sign_loss)]
fn rel_from_row(row: &Row<'_>) -> rusqlite::Result<Relationship> {
    let count: i64 = row.get(2)?;
    let last: String = row.get(3)?;
    Ok(Relationship {
        user_id: row.get(0)?,
        affinity: row.get(1)?,
        interaction_count: count.max(0) as u64,
        last_interaction_at: parse_ts(3, &last)?,
        display_name: row.get(4)?,
        secret_phrase: row.get(5)?,
    })
}

/// SQLite-backed [`StateStore`] and [`SnapshotStore`].
pub struct SqliteStateStore {
    conn: Mutex<Connection>,
    db_path: PathBuf,
}

impl std::fmt::Debug for SqliteStateStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteStateStore")
            .field("db_path", &self.db_path)
            .finish_non_exhaustive()
    }
}

impl SqliteStateStore {
    /// Open (or create) the database at `path`, create the schema and the
    /// biological-state singleton if absent.
    ///
    /// # Errors
    /// Returns [`CoreError::Database`] on SQLite failures.
    pub fn open<P: AsRef<Path>>(path: P, config: &PersistenceConfig) -> Result<Self> {
        let db_path = path.as_ref().to_path_buf();
        let flags = OpenFlags::SQLITE_OPEN_READ_WRITE
            | OpenFlags::SQLITE_OPEN_CREATE
            | OpenFlags::SQLITE_OPEN_NO_MUTEX;
        let conn = Connection::open_with_flags(&db_path, flags)?;

        if config.wal_mode {
            conn.execute_batch("PRAGMA journal_mode = WAL;")?;
        }
        conn.execute_batch("PRAGMA synchronous = NORMAL;")?;
        conn.execute_batch("PRAGMA busy_timeout = 5000;")?;

        let store = Self::init(conn, db_path)?;
        info!(path = %store.db_path.display(), wal = config.wal_mode, "State store opened");
        Ok(store)
    }

    /// Open an in-memory database (useful for tests).
    ///
    /// # Errors
    /// Returns [`CoreError::Database`] on SQLite failures.
    pub fn open_in_memory() -> Result<Self> {
        Self::init(Connection::open_in_memory()?, PathBuf::from(":memory:"))
    }

    fn init(conn: Connection, db_path: PathBuf) -> Result<Self> {
        conn.execute_batch(SCHEMA)?;
        conn.execute(
            "INSERT OR IGNORE INTO biological_state (id, fatigue, sleeping, updated_at)
             VALUES (1, 0.0, 0, ?1)",
            params![Utc::now().to_rfc3339()],
        )?;
        Ok(Self {
            conn: Mutex::new(conn),
            db_path,
        })
    }

    /// Path of the database file (`:memory:` for in-memory stores).
    #[must_use]
    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    /// Overwrite the biological state (test and admin hook).
    ///
    /// # Errors
    /// Returns [`CoreError::Database`] on SQLite failures.
    pub fn set_biological_state(&self, fatigue: f64, sleeping: bool) -> Result<BiologicalState> {
        let conn = self.conn.lock();
        let state = conn.query_row(
            &format!(
                "UPDATE biological_state
                 SET fatigue = MAX(MIN(?1, 1.0), 0.0), sleeping = ?2, updated_at = ?3
                 WHERE id = 1 RETURNING {BIO_COLUMNS}"
            ),
            params![fatigue, sleeping, Utc::now().to_rfc3339()],
            bio_from_row,
        )?;
        Ok(state)
    }

    fn update_bio(&self, sql: &str, args: impl rusqlite::Params) -> Result<BiologicalState> {
        let conn = self.conn.lock();
        conn.query_row(sql, args, bio_from_row)
            .optional()?
            .ok_or_else(|| CoreError::StateMissing("biological_state".into()))
    }
}

impl StateStore for SqliteStateStore {
    fn biological_state(&self) -> Result<BiologicalState> {
        let conn = self.conn.lock();
        conn.query_row(
            &format!("SELECT {BIO_COLUMNS} FROM biological_state WHERE id = 1"),
            [],
            bio_from_row,
        )
        .optional()?
        .ok_or_else(|| CoreError::StateMissing("biological_state".into()))
    }

    fn increment_fatigue(&self, step: f64, sleep_threshold: f64) -> Result<BiologicalState> {
        let state = self.update_bio(
            &format!(
                "UPDATE biological_state
                 SET fatigue = ROUND(MAX(MIN(fatigue + ?1, 1.0), 0.0), 9),
                     sleeping = (sleeping OR ROUND(MAX(MIN(fatigue + ?1, 1.0), 0.0), 9) > ?2),
                     updated_at = ?3
                 WHERE id = 1 RETURNING {BIO_COLUMNS}"
            ),
            params![step, sleep_threshold, Utc::now().to_rfc3339()],
        )?;
        debug!(fatigue = state.fatigue, sleeping = state.sleeping, "Fatigue incremented");
        Ok(state)
    }

    fn wake(&self) -> Result<BiologicalState> {
        self.update_bio(
            &format!(
                "UPDATE biological_state SET fatigue = 0.0, sleeping = 0, updated_at = ?1
                 WHERE id = 1 RETURNING {BIO_COLUMNS}"
            ),
            params![Utc::now().to_rfc3339()],
        )
    }

    fn rest(&self) -> Result<BiologicalState> {
        self.update_bio(
            &format!(
                "UPDATE biological_state SET sleeping = 1, updated_at = ?1
                 WHERE id = 1 RETURNING {BIO_COLUMNS}"
            ),
            params![Utc::now().to_rfc3339()],
        )
    }

    fn touch_relationship(&self, user_id: &str, delta: f64) -> Result<Relationship> {
        let conn = self.conn.lock();
        let rel = conn.query_row(
            &format!(
                "INSERT INTO relationships (user_id, affinity, interaction_count, last_interaction_at)
                 VALUES (?1, ?2, 1, ?3)
                 ON CONFLICT(user_id) DO UPDATE SET
                    affinity = relationships.affinity + excluded.affinity,
                    interaction_count = relationships.interaction_count + 1,
                    last_interaction_at = excluded.last_interaction_at
                 RETURNING {REL_COLUMNS}"
            ),
            params![user_id, delta, Utc::now().to_rfc3339()],
            rel_from_row,
        )?;
        Ok(rel)
    }

    fn relationship(&self, user_id: &str) -> Result<Option<Relationship>> {
        let conn = self.conn.lock();
        let rel = conn
            .query_row(
                &format!("SELECT {REL_COLUMNS} FROM relationships WHERE user_id = ?1"),
                params![user_id],
                rel_from_row,
            )
            .optional()?;
        Ok(rel)
    }

    #[allow(clippy::cast_possible_wrap)]
    fn put_relationship(&self, r: &Relationship) -> Result<()> {
        let conn = self.conn.lock();
        conn.execute(
            "INSERT INTO relationships
                (user_id, affinity, interaction_count, last_interaction_at, display_name, secret_phrase)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)
             ON CONFLICT(user_id) DO UPDATE SET
                affinity = excluded.affinity,
                interaction_count = excluded.interaction_count,
                last_interaction_at = excluded.last_interaction_at,
                display_name = excluded.display_name,
                secret_phrase = excluded.secret_phrase",
            params![
                r.user_id,
                r.affinity,
                r.interaction_count as i64,
                r.last_interaction_at.to_rfc3339(),
                r.display_name,
                r.secret_phrase,
            ],
        )?;
        Ok(())
    }

    fn set_display_name(&self, user_id: &str, name: &str) -> Result<()> {
        let conn = self.conn.lock();
        conn.execute(
            "UPDATE relationships SET display_name = ?1 WHERE user_id = ?2",
            params![name, user_id],
        )?;
        Ok(())
    }

    fn set_secret_phrase(&self, user_id: &str, phrase: &str) -> Result<()> {
        let conn = self.conn.lock();
        conn.execute(
            "UPDATE relationships SET secret_phrase = ?1 WHERE user_id = ?2",
            params![phrase, user_id],
        )?;
        Ok(())
    }

    fn append_chat_log(
        &self,
        user_id: &str,
        message: &str,
        response: &str,
        affect_snapshot_json: &str,
    ) -> Result<i64> {
        let conn = self.conn.lock();
        let id = conn.query_row(
            "INSERT INTO chat_logs (user_id, message, response, affect_snapshot, timestamp)
             VALUES (?1, ?2, ?3, ?4, ?5) RETURNING id",
            params![user_id, message, response, affect_snapshot_json, Utc::now().to_rfc3339()],
            |row| row.get(0),
        )?;
        Ok(id)
    }

    #[allow(clippy::cast_possible_wrap)]
    fn recent_history(&self, user_id: &str, limit: usize) -> Result<Vec<HistoryTurn>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare_cached(
            "SELECT message, response FROM chat_logs
             WHERE user_id = ?1 ORDER BY id DESC LIMIT ?2",
        )?;
        let mut turns = stmt
            .query_map(params![user_id, limit as i64], |row| {
                Ok(HistoryTurn {
                    message: row.get(0)?,
                    response: row.get(1)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        turns.reverse();
        Ok(turns)
    }

    fn chat_logs(&self, user_id: &str) -> Result<Vec<ChatLogEntry>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare_cached(
            "SELECT id, user_id, message, response, affect_snapshot, timestamp
             FROM chat_logs WHERE user_id = ?1 ORDER BY id ASC",
        )?;
        let rows = stmt
            .query_map(params![user_id], |row| {
                let ts: String = row.get(5)?;
                Ok(ChatLogEntry {
                    id: row.get(0)?,
                    user_id: row.get(1)?,
                    message: row.get(2)?,
                    response: row.get(3)?,
                    affect_snapshot_json: row.get(4)?,
                    timestamp: parse_ts(5, &ts)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }
}

impl SnapshotStore for SqliteStateStore {
    fn load(&self, key: &str) -> Result<Option<String>> {
        let conn = self.conn.lock();
        let data = conn
            .query_row(
                "SELECT data FROM snapshots WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()?;
        Ok(data)
    }

    fn save(&self, key: &str, json: &str) -> Result<()> {
        let conn = self.conn.lock();
        conn.execute(
            "INSERT INTO snapshots (key, data, updated_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(key) DO UPDATE SET data = excluded.data, updated_at = excluded.updated_at",
            params![key, json, Utc::now().to_rfc3339()],
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> SqliteStateStore {
        SqliteStateStore::open_in_memory().unwrap()
    }

    #[test]
    fn singleton_exists_after_open() {
        let s = store();
        let bio = s.biological_state().unwrap();
        assert!(bio.fatigue.abs() < f64::EPSILON);
        assert!(!bio.sleeping);
    }

    #[test]
    fn fatigue_clamps_and_sets_sleep() {
        let s = store();
        let after = s.increment_fatigue(0.05, 0.9).unwrap();
        assert!((after.fatigue - 0.05).abs() < 1e-6);
        assert!(!after.sleeping);

        s.set_biological_state(0.88, false).unwrap();
        let after = s.increment_fatigue(0.05, 0.9).unwrap();
        assert!(after.sleeping);

        let after = s.increment_fatigue(0.5, 0.9).unwrap();
        assert!((after.fatigue - 1.0).abs() < 1e-6);
    }

    #[test]
    fn wake_and_rest_events() {
        let s = store();
        s.set_biological_state(0.95, true).unwrap();
        let woke = s.wake().unwrap();
        assert!(woke.fatigue.abs() < f64::EPSILON);
        assert!(!woke.sleeping);
        assert!(s.rest().unwrap().sleeping);
    }

    #[test]
    fn touch_upserts_and_accumulates() {
        let s = store();
        let first = s.touch_relationship("alice", 0.1).unwrap();
        assert!((first.affinity - 0.1).abs() < 1e-9);
        assert_eq!(first.interaction_count, 1);
        let second = s.touch_relationship("alice", 0.1).unwrap();
        assert!((second.affinity - 0.2).abs() < 1e-9);
        assert_eq!(second.interaction_count, 2);
    }

    #[test]
    fn put_then_touch_keeps_negative_affinity() {
        let s = store();
        s.put_relationship(&Relationship::new("mallory", -10.0)).unwrap();
        let r = s.touch_relationship("mallory", 0.1).unwrap();
        assert!((r.affinity + 9.9).abs() < 1e-9);
    }

    #[test]
    fn name_and_secret_are_stored() {
        let s = store();
        s.touch_relationship("bob", 0.1).unwrap();
        s.set_display_name("bob", "Bob").unwrap();
        s.set_secret_phrase("bob", "pineapple").unwrap();
        let r = s.relationship("bob").unwrap().unwrap();
        assert_eq!(r.display_name.as_deref(), Some("Bob"));
        assert_eq!(r.secret_phrase.as_deref(), Some("pineapple"));
        assert!(s.relationship("nobody").unwrap().is_none());
    }

    #[test]
    fn history_is_oldest_first_and_limited() {
        let s = store();
        for i in 0..5 {
            s.append_chat_log("u", &format!("m{i}"), &format!("r{i}"), "{}").unwrap();
        }
        s.append_chat_log("other", "x", "y", "{}").unwrap();
        let h = s.recent_history("u", 3).unwrap();
        let msgs: Vec<&str> = h.iter().map(|t| t.message.as_str()).collect();
        assert_eq!(msgs, vec!["m2", "m3", "m4"]);
        assert_eq!(s.chat_logs("u").unwrap().len(), 5);
    }

    #[test]
    fn snapshots_upsert() {
        let s = store();
        s.save("personality", "{\"a\":1}").unwrap();
        s.save("personality", "{\"a\":2}").unwrap();
        assert_eq!(s.load("personality").unwrap().as_deref(), Some("{\"a\":2}"));
        assert!(s.load("missing").unwrap().is_none());
    }

    #[test]
    fn file_database_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.db");
        {
            let s = SqliteStateStore::open(&path, &PersistenceConfig::default()).unwrap();
            s.touch_relationship("carol", 0.1).unwrap();
            s.increment_fatigue(0.05, 0.9).unwrap();
        }
        let s = SqliteStateStore::open(&path, &PersistenceConfig::default()).unwrap();
        assert!(s.relationship("carol").unwrap().is_some());
        assert!((s.biological_state().unwrap().fatigue - 0.05).abs() < 1e-6);
    }
}

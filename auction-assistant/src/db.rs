// SQLite persistence layer for auction state.

use std::sync::{Mutex, MutexGuard};

use anyhow::{Context, Result};
use rusqlite::{params, Connection, OptionalExtension};

use crate::persistence::KeyValueStore;

/// SQLite-backed key-value store for the saved auction state.
pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    /// Open (or create) a SQLite database at `path` and ensure the schema
    /// exists. Pass `":memory:"` for an ephemeral in-memory database (useful
    /// for tests).
    pub fn open(path: &str) -> Result<Self> {
        let conn = Connection::open(path)
            .with_context(|| format!("failed to open database at {path}"))?;

        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA busy_timeout = 5000;",
        )
        .context("failed to set database pragmas")?;

        conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS draft_state (
                key        TEXT PRIMARY KEY,
                value      TEXT NOT NULL,
                updated_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
            );
            ",
        )
        .context("failed to create database schema")?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Acquire the database connection.
    ///
    /// Panics if the mutex is poisoned (another thread panicked while
    /// holding the lock). This should never happen in normal operation.
    fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().expect("database mutex poisoned")
    }

    /// Store a raw string under `key`, replacing any previous value.
    pub fn save_state(&self, key: &str, value: &str) -> Result<()> {
        let conn = self.conn();
        conn.execute(
            "INSERT OR REPLACE INTO draft_state (key, value, updated_at)
             VALUES (?1, ?2, strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))",
            params![key, value],
        )
        .context("failed to save state")?;
        Ok(())
    }

    /// Load the raw string stored under `key`. Returns `None` if the key
    /// does not exist.
    pub fn load_state(&self, key: &str) -> Result<Option<String>> {
        let conn = self.conn();
        conn.query_row(
            "SELECT value FROM draft_state WHERE key = ?1",
            params![key],
            |row| row.get(0),
        )
        .optional()
        .context("failed to load state")
    }
}

impl KeyValueStore for Database {
    fn get(&self, key: &str) -> Result<Option<String>> {
        self.load_state(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.save_state(key, value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::{load_snapshot, save_snapshot, Snapshot};

    /// Helper: create a fresh in-memory database for each test.
    fn test_db() -> Database {
        Database::open(":memory:").expect("in-memory database should open")
    }

    #[test]
    fn open_creates_state_table() {
        let db = test_db();
        let conn = db.conn();

        let tables: Vec<String> = conn
            .prepare("SELECT name FROM sqlite_master WHERE type='table' ORDER BY name")
            .unwrap()
            .query_map([], |row| row.get(0))
            .unwrap()
            .collect::<Result<Vec<_>, _>>()
            .unwrap();

        assert!(tables.contains(&"draft_state".to_string()));
    }

    #[test]
    fn load_missing_key_is_none() {
        let db = test_db();
        assert!(db.load_state("nope").unwrap().is_none());
    }

    #[test]
    fn save_overwrites_previous_value() {
        let db = test_db();
        db.save_state("state", "first").unwrap();
        db.save_state("state", "second").unwrap();
        assert_eq!(db.load_state("state").unwrap().as_deref(), Some("second"));
    }

    #[test]
    fn snapshot_through_key_value_trait() {
        let db = test_db();
        let snapshot = Snapshot {
            sold_players: vec!["Inter_Lautaro_Martinez".into()],
            next_participant_seq: 4,
            ..Default::default()
        };
        save_snapshot(&db, "fantacalcio-auction-state", &snapshot).unwrap();
        assert_eq!(
            load_snapshot(&db, "fantacalcio-auction-state"),
            Some(snapshot)
        );
    }

    #[test]
    fn state_survives_reopen() {
        let db_path = std::env::temp_dir().join("auction_assistant_db_reopen_test.db");
        let db_path_str = db_path.to_str().unwrap();
        let _ = std::fs::remove_file(&db_path);

        {
            let db = Database::open(db_path_str).unwrap();
            db.save_state("state", r#"{"participants":[]}"#).unwrap();
        }

        let db = Database::open(db_path_str).unwrap();
        assert_eq!(
            db.load_state("state").unwrap().as_deref(),
            Some(r#"{"participants":[]}"#)
        );

        // Clean up temp file
        drop(db);
        let _ = std::fs::remove_file(&db_path);
        let _ = std::fs::remove_file(format!("{}-wal", db_path_str));
        let _ = std::fs::remove_file(format!("{}-shm", db_path_str));
    }
}

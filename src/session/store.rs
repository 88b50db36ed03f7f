//! Single-record session persistence.
//!
//! Durable key-value storage for exactly one session record per
//! installation, backed by SQLite so the gateway and any helper process
//! observe the same session file.
//!
//! ## Storage
//! One fixed key; the record itself is stored as JSON in the installed-app
//! wire layout. Every mutation is "serialize the full record, overwrite";
//! there are no partial updates.
//!
//! ## Corruption
//! A record that no longer deserializes is treated as absent: `load`
//! logs, drops the corrupt row, and returns `None`, which forces a
//! re-login instead of crashing the caller.

use anyhow::{Context, Result};
use parking_lot::Mutex;
use rusqlite::params;
use std::path::Path;

use super::record::SessionRecord;

/// Fixed storage key: one session record per installation.
const SESSION_KEY: &str = "obralink_user";

/// SQLite-backed store for the single persisted session record.
#[derive(Debug)]
pub struct SessionStore {
    conn: Mutex<rusqlite::Connection>,
}

impl SessionStore {
    /// Create an in-memory store (for tests).
    pub fn new() -> Self {
        let conn = rusqlite::Connection::open_in_memory()
            .expect("Failed to open in-memory SQLite for session store");
        Self::init_tables(&conn);
        Self {
            conn: Mutex::new(conn),
        }
    }

    /// Open a file-backed store for production use.
    pub fn open(db_path: &Path) -> Result<Self> {
        let conn = rusqlite::Connection::open(db_path)
            .with_context(|| format!("opening session store at {}", db_path.display()))?;
        conn.execute_batch("PRAGMA journal_mode = WAL; PRAGMA busy_timeout = 5000;")?;
        Self::init_tables(&conn);
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn init_tables(conn: &rusqlite::Connection) {
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS session (
                key TEXT PRIMARY KEY,
                record TEXT NOT NULL
            );",
        )
        .expect("Failed to initialize session table");
    }

    /// Load the persisted record, if any.
    ///
    /// Fails soft: a missing row or a row that no longer parses both come
    /// back as `None`; the corrupt row is removed so the next load is clean.
    pub fn load(&self) -> Option<SessionRecord> {
        let conn = self.conn.lock();
        let raw: String = conn
            .query_row(
                "SELECT record FROM session WHERE key = ?1",
                params![SESSION_KEY],
                |row| row.get(0),
            )
            .ok()?;

        match serde_json::from_str(&raw) {
            Ok(record) => Some(record),
            Err(e) => {
                tracing::warn!("Discarding corrupt session record: {e}");
                let _ = conn.execute(
                    "DELETE FROM session WHERE key = ?1",
                    params![SESSION_KEY],
                );
                None
            }
        }
    }

    /// Persist the full record, overwriting any prior value.
    pub fn save(&self, record: &SessionRecord) -> Result<()> {
        let raw = serde_json::to_string(record).context("serializing session record")?;
        let conn = self.conn.lock();
        conn.execute(
            "INSERT INTO session (key, record) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET record = excluded.record",
            params![SESSION_KEY, raw],
        )?;
        Ok(())
    }

    /// Remove the persisted record entirely (logout / forgot PIN).
    pub fn clear(&self) -> Result<()> {
        let conn = self.conn.lock();
        conn.execute("DELETE FROM session WHERE key = ?1", params![SESSION_KEY])?;
        Ok(())
    }
}

#[cfg(test)]
impl SessionStore {
    /// Overwrite the stored row with arbitrary bytes (corruption tests).
    pub(crate) fn put_raw(&self, raw: &str) {
        let conn = self.conn.lock();
        conn.execute(
            "INSERT INTO session (key, record) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET record = excluded.record",
            params![SESSION_KEY, raw],
        )
        .expect("Failed to write raw session row");
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

//! SQLite-backed durable store.
//!
//! A single `kv` table holds the practice counter and the custom prompt text.

use std::path::Path;

use rusqlite::{params, Connection};

use super::{data_dir, parse_count, DurableStore, COUNT_KEY, CUSTOM_TEXT_KEY};
use crate::error::StoreError;

/// SQLite database for the persisted practice slots.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open the database at `~/.config/celspeak/celspeak.db`.
    ///
    /// Creates the database file and schema if they don't exist.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open() -> Result<Self, StoreError> {
        let dir = data_dir().map_err(|e| StoreError::DataDir(e.to_string()))?;
        Self::open_at(&dir.join("celspeak.db"))
    }

    /// Open (or create) a database file at `path`.
    pub fn open_at(path: &Path) -> Result<Self, StoreError> {
        let conn = Connection::open(path).map_err(|source| StoreError::OpenFailed {
            path: path.to_path_buf(),
            source,
        })?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    /// Open an in-memory database.
    pub fn open_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    fn migrate(&self) -> Result<(), StoreError> {
        self.conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS kv (
                key   TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );",
        )?;
        Ok(())
    }

    /// Get a value from the kv store.
    pub fn kv_get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let mut stmt = self.conn.prepare("SELECT value FROM kv WHERE key = ?1")?;
        match stmt.query_row(params![key], |row| row.get::<_, String>(0)) {
            Ok(v) => Ok(Some(v)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Set a value in the kv store.
    pub fn kv_set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.conn.execute(
            "INSERT OR REPLACE INTO kv (key, value) VALUES (?1, ?2)",
            params![key, value],
        )?;
        Ok(())
    }
}

impl DurableStore for Database {
    fn load_practice_count(&self) -> Result<Option<u64>, StoreError> {
        Ok(self.kv_get(COUNT_KEY)?.as_deref().and_then(parse_count))
    }

    fn save_practice_count(&self, count: u64) -> Result<(), StoreError> {
        self.kv_set(COUNT_KEY, &count.to_string())
    }

    fn load_custom_text(&self) -> Result<Option<String>, StoreError> {
        self.kv_get(CUSTOM_TEXT_KEY)
    }

    fn save_custom_text(&self, text: &str) -> Result<(), StoreError> {
        self.kv_set(CUSTOM_TEXT_KEY, text)
    }
}

//! SQLite-backed snapshot store.
//!
//! A single key-value table; the whole snapshot lives as JSON under
//! [`SNAPSHOT_KEY`]. A missing key means "first run", not an error.

use rusqlite::{params, Connection};
use std::path::Path;

use super::{data_dir, Snapshot, SnapshotStore};
use crate::error::{CoreError, DatabaseError, Result};

/// Fixed storage key for the journey snapshot.
pub const SNAPSHOT_KEY: &str = "journey_snapshot";

/// SQLite database holding the key-value store.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open the database at `<data dir>/pilgrim.db`.
    ///
    /// Creates the database file and schema if they don't exist.
    pub fn open() -> Result<Self> {
        Self::open_at(&data_dir()?.join("pilgrim.db"))
    }

    pub fn open_at(path: &Path) -> Result<Self> {
        let conn = Connection::open(path).map_err(|source| DatabaseError::OpenFailed {
            path: path.to_path_buf(),
            source,
        })?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    /// Open an in-memory database.
    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    fn migrate(&self) -> Result<(), rusqlite::Error> {
        self.conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS kv (
                key   TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );",
        )?;
        Ok(())
    }

    /// Get a value from the kv store.
    pub fn kv_get(&self, key: &str) -> Result<Option<String>, rusqlite::Error> {
        let mut stmt = self.conn.prepare("SELECT value FROM kv WHERE key = ?1")?;
        let result = stmt.query_row(params![key], |row| row.get::<_, String>(0));
        match result {
            Ok(v) => Ok(Some(v)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Set a value in the kv store.
    pub fn kv_set(&self, key: &str, value: &str) -> Result<(), rusqlite::Error> {
        self.conn.execute(
            "INSERT OR REPLACE INTO kv (key, value) VALUES (?1, ?2)",
            params![key, value],
        )?;
        Ok(())
    }
}

impl SnapshotStore for Database {
    fn load(&self) -> Result<Option<Snapshot>> {
        let Some(json) = self
            .kv_get(SNAPSHOT_KEY)
            .map_err(|e| CoreError::persistence("load", DatabaseError::from(e)))?
        else {
            return Ok(None);
        };
        Snapshot::from_json(&json)
            .map(Some)
            .map_err(|e| CoreError::persistence("load", e))
    }

    fn save(&self, snapshot: &Snapshot) -> Result<()> {
        let json = snapshot
            .to_json()
            .map_err(|e| CoreError::persistence("save", e))?;
        self.kv_set(SNAPSHOT_KEY, &json)
            .map_err(|e| CoreError::persistence("save", DatabaseError::from(e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kv_store() {
        let db = Database::open_memory().unwrap();
        assert!(db.kv_get("test").unwrap().is_none());
        db.kv_set("test", "hello").unwrap();
        assert_eq!(db.kv_get("test").unwrap().unwrap(), "hello");
        db.kv_set("test", "again").unwrap();
        assert_eq!(db.kv_get("test").unwrap().unwrap(), "again");
    }

    #[test]
    fn absent_snapshot_is_none() {
        let db = Database::open_memory().unwrap();
        assert!(db.load().unwrap().is_none());
    }

    #[test]
    fn snapshot_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pilgrim.db");
        let snap = Snapshot {
            session_count: 9,
            completed_focus_count: 5,
            ..Snapshot::from_json("{}").unwrap()
        };
        Database::open_at(&path).unwrap().save(&snap).unwrap();
        let loaded = Database::open_at(&path).unwrap().load().unwrap().unwrap();
        assert_eq!(loaded, snap);
    }

    #[test]
    fn corrupt_snapshot_reports_persistence_error() {
        let db = Database::open_memory().unwrap();
        db.kv_set(SNAPSHOT_KEY, "{not json").unwrap();
        let err = db.load().unwrap_err();
        assert!(matches!(err, CoreError::PersistenceUnavailable { operation: "load", .. }));
    }
}

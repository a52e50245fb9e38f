// 💾 Key-Value Persistence
// Storage abstraction behind the family/savings registries. Each registry
// owns one fixed key; values are JSON-serialized collections.

use rusqlite::{params, Connection, OptionalExtension};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, RwLock};

// ============================================================================
// ERRORS
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("storage I/O failure: {0}")]
    Io(#[from] std::io::Error),

    #[error("storage backend failure: {0}")]
    Backend(String),
}

impl From<rusqlite::Error> for StorageError {
    fn from(err: rusqlite::Error) -> Self {
        StorageError::Backend(err.to_string())
    }
}

// ============================================================================
// STORAGE TRAIT
// ============================================================================

/// Load/save string values by key
///
/// Implementations must be safe to call from the registries on every
/// mutation (write-through, no batching).
pub trait Storage: Send + Sync {
    fn load(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn save(&self, key: &str, value: &str) -> Result<(), StorageError>;
    fn delete(&self, key: &str) -> Result<(), StorageError>;
}

// ============================================================================
// IN-MEMORY BACKEND
// ============================================================================

/// Volatile backend for tests and session-only degraded operation
#[derive(Default)]
pub struct MemoryStorage {
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        MemoryStorage {
            entries: RwLock::new(HashMap::new()),
        }
    }
}

impl Storage for MemoryStorage {
    fn load(&self, key: &str) -> Result<Option<String>, StorageError> {
        let entries = self.entries.read().unwrap();
        Ok(entries.get(key).cloned())
    }

    fn save(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut entries = self.entries.write().unwrap();
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<(), StorageError> {
        let mut entries = self.entries.write().unwrap();
        entries.remove(key);
        Ok(())
    }
}

// ============================================================================
// FILE BACKEND
// ============================================================================

/// One JSON file per key inside a directory
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(FileStorage { dir })
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }
}

impl Storage for FileStorage {
    fn load(&self, key: &str) -> Result<Option<String>, StorageError> {
        let path = self.path_for(key);
        if !path.exists() {
            return Ok(None);
        }
        Ok(Some(fs::read_to_string(path)?))
    }

    fn save(&self, key: &str, value: &str) -> Result<(), StorageError> {
        fs::write(self.path_for(key), value)?;
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<(), StorageError> {
        let path = self.path_for(key);
        if path.exists() {
            fs::remove_file(path)?;
        }
        Ok(())
    }
}

// ============================================================================
// SQLITE BACKEND
// ============================================================================

/// SQLite-backed key-value table with WAL mode
pub struct SqliteStorage {
    conn: Mutex<Connection>,
}

impl SqliteStorage {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        Self::setup(Connection::open(path)?)
    }

    pub fn open_in_memory() -> Result<Self, StorageError> {
        Self::setup(Connection::open_in_memory()?)
    }

    fn setup(conn: Connection) -> Result<Self, StorageError> {
        // WAL keeps writers from blocking the UI-driven readers
        conn.pragma_update(None, "journal_mode", "WAL")?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS records (
                key        TEXT PRIMARY KEY,
                value      TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )",
            [],
        )?;

        Ok(SqliteStorage {
            conn: Mutex::new(conn),
        })
    }
}

impl Storage for SqliteStorage {
    fn load(&self, key: &str) -> Result<Option<String>, StorageError> {
        let conn = self.conn.lock().unwrap();
        let value = conn
            .query_row(
                "SELECT value FROM records WHERE key = ?1",
                params![key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(value)
    }

    fn save(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO records (key, value, updated_at)
             VALUES (?1, ?2, ?3)
             ON CONFLICT(key) DO UPDATE SET value = ?2, updated_at = ?3",
            params![key, value, chrono::Utc::now().to_rfc3339()],
        )?;
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<(), StorageError> {
        let conn = self.conn.lock().unwrap();
        conn.execute("DELETE FROM records WHERE key = ?1", params![key])?;
        Ok(())
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn round_trip(storage: &dyn Storage) {
        assert_eq!(storage.load("medfin.family").unwrap(), None);

        storage.save("medfin.family", r#"[{"id":"1"}]"#).unwrap();
        assert_eq!(
            storage.load("medfin.family").unwrap().as_deref(),
            Some(r#"[{"id":"1"}]"#)
        );

        // Overwrite replaces, never appends
        storage.save("medfin.family", "[]").unwrap();
        assert_eq!(storage.load("medfin.family").unwrap().as_deref(), Some("[]"));

        storage.delete("medfin.family").unwrap();
        assert_eq!(storage.load("medfin.family").unwrap(), None);
    }

    #[test]
    fn test_memory_round_trip() {
        round_trip(&MemoryStorage::new());
    }

    #[test]
    fn test_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path()).unwrap();
        round_trip(&storage);
    }

    #[test]
    fn test_sqlite_round_trip() {
        round_trip(&SqliteStorage::open_in_memory().unwrap());
    }

    #[test]
    fn test_sqlite_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("records.db");

        {
            let storage = SqliteStorage::open(&db_path).unwrap();
            storage.save("medfin.savings", r#"{"events":[]}"#).unwrap();
        }

        let reopened = SqliteStorage::open(&db_path).unwrap();
        assert_eq!(
            reopened.load("medfin.savings").unwrap().as_deref(),
            Some(r#"{"events":[]}"#)
        );
    }

    #[test]
    fn test_keys_are_independent() {
        let storage = MemoryStorage::new();
        storage.save("medfin.family", "[1]").unwrap();
        storage.save("medfin.savings", "[2]").unwrap();

        storage.delete("medfin.family").unwrap();
        assert_eq!(storage.load("medfin.savings").unwrap().as_deref(), Some("[2]"));
    }
}

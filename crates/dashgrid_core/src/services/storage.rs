//! Local key-value storage for persisted layout state.
//!
//! Values are opaque strings (normally JSON), so a corrupt blob is
//! representable and readers decide how to recover from it.
//!
//! # Data Directory Locations
//!
//! - **macOS**: `~/Library/Application Support/dev.dashgrid.Dashgrid`
//! - **Windows**: `%APPDATA%\dashgrid\Dashgrid`
//! - **Linux**: `~/.local/share/dashgrid`
//! - **Debug builds**: `./dashgrid_data` in current directory

use crate::error::DashError;

use chrono::Utc;
use parking_lot::{Mutex, RwLock};
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Get the default data directory for the application.
pub fn default_data_dir() -> PathBuf {
    #[cfg(debug_assertions)]
    {
        PathBuf::from("./dashgrid_data")
    }

    #[cfg(not(debug_assertions))]
    {
        dirs::data_dir()
            .map(|d| {
                #[cfg(target_os = "macos")]
                {
                    d.join("dev.dashgrid.Dashgrid")
                }
                #[cfg(target_os = "windows")]
                {
                    d.join("dashgrid").join("Dashgrid")
                }
                #[cfg(not(any(target_os = "macos", target_os = "windows")))]
                {
                    d.join("dashgrid")
                }
            })
            .unwrap_or_else(|| PathBuf::from("./dashgrid_data"))
    }
}

/// Initialize the data directory, creating it if needed.
pub fn init_data_dir(path: &Path) -> Result<(), DashError> {
    if path.exists() {
        if !path.is_dir() {
            return Err(DashError::storage(
                format!("Data path exists but is not a directory: {}", path.display()),
                Some("Select a different location or remove the existing file"),
            ));
        }
        return Ok(());
    }

    std::fs::create_dir_all(path).map_err(|e| {
        DashError::storage(
            format!("Failed to create data directory '{}': {}", path.display(), e),
            Some("Check permissions or select a different location"),
        )
    })?;

    tracing::info!(path = %path.display(), "Created data directory");
    Ok(())
}

/// A persistent string key-value store shared by every layout component.
///
/// Writes are last-write-wins; components namespace their own keys.
pub trait KeyValueStore: Send + Sync {
    /// Read a value.
    fn get(&self, key: &str) -> Result<Option<String>, DashError>;

    /// Write a value, replacing any previous one.
    fn set(&self, key: &str, value: &str) -> Result<(), DashError>;

    /// Delete a value. Removing a missing key is not an error.
    fn remove(&self, key: &str) -> Result<(), DashError>;

    /// All stored keys, sorted.
    fn keys(&self) -> Result<Vec<String>, DashError>;

    /// Check if a key exists.
    fn contains(&self, key: &str) -> Result<bool, DashError> {
        Ok(self.get(key)?.is_some())
    }

    /// Backend name for logging.
    fn name(&self) -> &'static str;
}

// ============================================================================
// LocalStorage
// ============================================================================

/// SQLite-based local storage.
///
/// Thread-safe via internal Mutex. Uses WAL mode for concurrent reads.
pub struct LocalStorage {
    /// Thread-safe SQLite connection
    connection: Mutex<Connection>,
    /// Data directory path
    data_dir: PathBuf,
}

impl LocalStorage {
    /// Open or create local storage in the given data directory.
    pub fn open(data_dir: PathBuf) -> Result<Self, DashError> {
        init_data_dir(&data_dir)?;
        let db_path = data_dir.join("dashgrid.db");
        Self::open_with_path(db_path, data_dir)
    }

    /// Open storage with a specific database path.
    pub fn open_with_path(db_path: PathBuf, data_dir: PathBuf) -> Result<Self, DashError> {
        let connection = Connection::open(&db_path).map_err(|e| {
            DashError::storage(
                format!("Failed to open database '{}': {}", db_path.display(), e),
                Some("The database file may be corrupted. Try deleting it to start fresh."),
            )
        })?;

        Self::configure_connection(&connection)?;

        let storage = Self { connection: Mutex::new(connection), data_dir };
        storage.run_migrations()?;

        tracing::info!(path = %db_path.display(), "Local storage opened");
        Ok(storage)
    }

    /// Get the data directory path.
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    fn configure_connection(conn: &Connection) -> Result<(), DashError> {
        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA busy_timeout = 5000;
            PRAGMA temp_store = MEMORY;
            ",
        )
        .map_err(|e| DashError::storage(format!("Failed to configure database: {e}"), None))
    }

    fn run_migrations(&self) -> Result<(), DashError> {
        const DOMAIN: &str = "layout";

        let conn = self.connection.lock();

        conn.execute(
            "CREATE TABLE IF NOT EXISTS migrations (
                domain TEXT NOT NULL,
                step INTEGER NOT NULL,
                migration TEXT NOT NULL,
                PRIMARY KEY(domain, step)
            ) STRICT",
            [],
        )
        .map_err(|e| DashError::storage(format!("Failed to create migrations table: {e}"), None))?;

        let current_step: i32 = conn
            .query_row(
                "SELECT COALESCE(MAX(step), 0) FROM migrations WHERE domain = ?",
                [DOMAIN],
                |row| row.get(0),
            )
            .optional()?
            .unwrap_or(0);

        if current_step < 1 {
            conn.execute_batch(
                "
                CREATE TABLE ui_state (
                    key TEXT PRIMARY KEY,
                    value_json TEXT NOT NULL,
                    updated_at TEXT NOT NULL
                ) STRICT;
                ",
            )
            .map_err(|e| DashError::storage(format!("Failed to create ui_state table: {e}"), None))?;

            conn.execute(
                "INSERT INTO migrations (domain, step, migration) VALUES (?1, 1, 'initial_schema')",
                [DOMAIN],
            )?;

            tracing::debug!(domain = DOMAIN, step = 1, "Applied storage migration");
        }

        Ok(())
    }
}

impl KeyValueStore for LocalStorage {
    fn get(&self, key: &str) -> Result<Option<String>, DashError> {
        let conn = self.connection.lock();
        conn.query_row("SELECT value_json FROM ui_state WHERE key = ?", [key], |row| row.get(0))
            .optional()
            .map_err(|e| DashError::storage(format!("Failed to load '{key}': {e}"), None))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), DashError> {
        let conn = self.connection.lock();
        let now = Utc::now().to_rfc3339();

        conn.execute(
            "INSERT INTO ui_state (key, value_json, updated_at)
             VALUES (?1, ?2, ?3)
             ON CONFLICT(key) DO UPDATE SET
                value_json = excluded.value_json,
                updated_at = excluded.updated_at",
            params![key, value, now],
        )
        .map_err(|e| DashError::storage(format!("Failed to save '{key}': {e}"), None))?;

        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), DashError> {
        let conn = self.connection.lock();
        conn.execute("DELETE FROM ui_state WHERE key = ?", [key])
            .map_err(|e| DashError::storage(format!("Failed to delete '{key}': {e}"), None))?;
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>, DashError> {
        let conn = self.connection.lock();
        let mut stmt = conn.prepare("SELECT key FROM ui_state ORDER BY key")?;
        let keys = stmt.query_map([], |row| row.get(0))?.collect::<Result<Vec<String>, _>>()?;
        Ok(keys)
    }

    fn name(&self) -> &'static str {
        "sqlite"
    }
}

// ============================================================================
// MemoryStorage
// ============================================================================

/// In-memory storage with an optional byte quota.
///
/// The quota counts key and value bytes, like a browser origin quota.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: RwLock<BTreeMap<String, String>>,
    quota: Option<usize>,
}

impl MemoryStorage {
    /// Create an unbounded store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store that rejects writes beyond `bytes`.
    pub fn with_quota(bytes: usize) -> Self {
        Self { entries: RwLock::new(BTreeMap::new()), quota: Some(bytes) }
    }

    /// Bytes currently used.
    pub fn used_bytes(&self) -> usize {
        self.entries.read().iter().map(|(k, v)| k.len() + v.len()).sum()
    }
}

impl KeyValueStore for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>, DashError> {
        Ok(self.entries.read().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), DashError> {
        let mut entries = self.entries.write();

        if let Some(quota) = self.quota {
            let used: usize = entries
                .iter()
                .filter(|(k, _)| k.as_str() != key)
                .map(|(k, v)| k.len() + v.len())
                .sum();
            let requested = key.len() + value.len();
            let available = quota.saturating_sub(used);
            if requested > available {
                return Err(DashError::quota_exceeded(key, requested, available));
            }
        }

        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), DashError> {
        self.entries.write().remove(key);
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>, DashError> {
        Ok(self.entries.read().keys().cloned().collect())
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_sqlite_set_get_remove() {
        let dir = TempDir::new().unwrap();
        let storage = LocalStorage::open(dir.path().to_path_buf()).unwrap();

        assert_eq!(storage.get("dashboard-top-layouts-v1").unwrap(), None);
        storage.set("dashboard-top-layouts-v1", "{\"lg\":[]}").unwrap();
        storage.set("dashboard-top-layouts-v1", "{\"lg\":[1]}").unwrap();
        assert_eq!(storage.get("dashboard-top-layouts-v1").unwrap().as_deref(), Some("{\"lg\":[1]}"));
        assert!(storage.contains("dashboard-top-layouts-v1").unwrap());

        storage.remove("dashboard-top-layouts-v1").unwrap();
        storage.remove("dashboard-top-layouts-v1").unwrap();
        assert!(!storage.contains("dashboard-top-layouts-v1").unwrap());
    }

    #[test]
    fn test_sqlite_persists_across_reopen() {
        let dir = TempDir::new().unwrap();
        {
            let storage = LocalStorage::open(dir.path().to_path_buf()).unwrap();
            storage.set("b", "2").unwrap();
            storage.set("a", "1").unwrap();
        }
        let storage = LocalStorage::open(dir.path().to_path_buf()).unwrap();
        assert_eq!(storage.keys().unwrap(), vec!["a".to_string(), "b".to_string()]);
        assert_eq!(storage.name(), "sqlite");
    }

    #[test]
    fn test_init_data_dir_rejects_file() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("not_a_dir");
        std::fs::write(&file, b"x").unwrap();
        assert!(init_data_dir(&file).is_err());

        let nested = dir.path().join("a").join("b");
        init_data_dir(&nested).unwrap();
        assert!(nested.is_dir());
    }

    #[test]
    fn test_memory_quota_rejects_oversized_write() {
        let storage = MemoryStorage::with_quota(16);
        storage.set("k", "0123456789").unwrap();

        let err = storage.set("other", "0123456789").unwrap_err();
        assert!(matches!(err, DashError::QuotaExceeded { .. }));
        assert!(err.is_storage());

        // Overwriting the same key only counts the new value
        storage.set("k", "abcdefghijklmno").unwrap();
        assert_eq!(storage.used_bytes(), 16);
    }
}

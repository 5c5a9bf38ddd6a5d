//! Application state management.
//!
//! `DashState` is the service container every component is built from: the
//! shared key-value store, the reset registry and the versioned key set.

use crate::error::DashError;
use crate::services::keys::cleanup_old_versions;
use crate::services::storage::{default_data_dir, init_data_dir};
use crate::services::{KeyValueStore, LayoutRegistry, LocalStorage, MemoryStorage, StorageKeys};

use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Shared services for the dashboard.
///
/// Cheap to clone; clones share the same store and registry.
#[derive(Clone)]
pub struct DashState {
    storage: Arc<dyn KeyValueStore>,
    registry: Arc<LayoutRegistry>,
    keys: StorageKeys,
    data_dir: Option<PathBuf>,
}

impl DashState {
    /// Create state backed by SQLite in the default data directory.
    pub fn new() -> Result<Self, DashError> {
        Self::with_data_dir(default_data_dir())
    }

    /// Create state backed by SQLite in a custom data directory.
    pub fn with_data_dir(data_dir: PathBuf) -> Result<Self, DashError> {
        init_data_dir(&data_dir)?;
        let storage = LocalStorage::open(data_dir.clone())?;

        tracing::info!(data_dir = %data_dir.display(), "DashState initialized");
        Ok(Self::from_parts(Arc::new(storage), StorageKeys::default(), Some(data_dir)))
    }

    /// Create state backed by a volatile in-memory store.
    pub fn in_memory() -> Self {
        Self::with_storage(Arc::new(MemoryStorage::new()), StorageKeys::default())
    }

    /// Create state over an existing store and key set.
    ///
    /// Stale keys from other versions are purged immediately.
    pub fn with_storage(storage: Arc<dyn KeyValueStore>, keys: StorageKeys) -> Self {
        Self::from_parts(storage, keys, None)
    }

    fn from_parts(storage: Arc<dyn KeyValueStore>, keys: StorageKeys, data_dir: Option<PathBuf>) -> Self {
        if let Err(e) = cleanup_old_versions(storage.as_ref(), &keys) {
            tracing::warn!(error = %e, backend = storage.name(), "Failed to clean up old storage versions");
        }

        Self { storage, registry: LayoutRegistry::new(), keys, data_dir }
    }

    // ========== Accessors ==========

    /// The shared key-value store.
    pub fn storage(&self) -> &Arc<dyn KeyValueStore> {
        &self.storage
    }

    /// The reset registry.
    pub fn registry(&self) -> &Arc<LayoutRegistry> {
        &self.registry
    }

    /// The versioned keys in use.
    pub fn keys(&self) -> &StorageKeys {
        &self.keys
    }

    /// The data directory, if backed by files.
    pub fn data_dir(&self) -> Option<&Path> {
        self.data_dir.as_deref()
    }
}

impl std::fmt::Debug for DashState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DashState")
            .field("storage", &self.storage.name())
            .field("version", &self.keys.version)
            .field("data_dir", &self.data_dir)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_startup_purges_previous_version() {
        let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStorage::new());
        let old = StorageKeys::for_version("v2");
        store.set(old.top_layouts.as_str(), "{}").unwrap();

        let state = DashState::with_storage(Arc::clone(&store), StorageKeys::for_version("v3"));
        assert!(store.keys().unwrap().is_empty());
        assert_eq!(state.keys().version, "v3");
    }

    #[test]
    fn test_with_data_dir_uses_sqlite() {
        let dir = TempDir::new().unwrap();
        let state = DashState::with_data_dir(dir.path().join("data")).unwrap();
        assert_eq!(state.storage().name(), "sqlite");
        assert!(dir.path().join("data").join("dashgrid.db").exists());

        let clone = state.clone();
        clone.storage().set("k", "v").unwrap();
        assert_eq!(state.storage().get("k").unwrap().as_deref(), Some("v"));
    }
}

//! Versioned storage key namespace.
//!
//! Every persisted value lives under `<name>-<version>`. Bumping the version
//! tag orphans the old keys, and [`cleanup_old_versions`] deletes them on the
//! next startup.

use std::fmt;

use super::storage::KeyValueStore;
use crate::error::DashError;

/// Current storage version tag.
pub const STORAGE_VERSION: &str = "v3-2025-8-22-gridlayout";

/// Prefixes owned by this application. Keys under these prefixes that are not
/// part of the current key set are considered stale.
pub const APP_PREFIXES: [&str; 3] = ["dashboard-", "activities-", "workspace-"];

/// A logical key name joined with a version tag.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StorageKey(String);

impl StorageKey {
    /// Build `<name>-<version>`.
    pub fn versioned(name: &str, version: &str) -> Self {
        Self(format!("{name}-{version}"))
    }

    /// The full key string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StorageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for StorageKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// The full set of keys for one storage version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageKeys {
    pub version: String,
    /// Metrics bar layout set.
    pub top_layouts: StorageKey,
    /// Sidebar widget order and heights.
    pub side_layouts: StorageKey,
    /// Activities pane width in columns.
    pub activities_columns: StorageKey,
    /// Selected breakpoint preset id.
    pub breakpoint_preset: StorageKey,
    /// Selected navigation mode.
    pub navigation_mode: StorageKey,
    /// Workspace dual-pane split.
    pub dual_pane: StorageKey,
}

impl StorageKeys {
    /// Build the key set for a version tag.
    pub fn for_version(version: &str) -> Self {
        Self {
            version: version.to_string(),
            top_layouts: StorageKey::versioned("dashboard-top-layouts", version),
            side_layouts: StorageKey::versioned("dashboard-side-layouts", version),
            activities_columns: StorageKey::versioned("activities-grid-columns", version),
            breakpoint_preset: StorageKey::versioned("dashboard-breakpoint-preset", version),
            navigation_mode: StorageKey::versioned("dashboard-navigation-mode", version),
            dual_pane: StorageKey::versioned("workspace-dual-pane", version),
        }
    }

    /// Every key in the set.
    pub fn all(&self) -> [&StorageKey; 6] {
        [
            &self.top_layouts,
            &self.side_layouts,
            &self.activities_columns,
            &self.breakpoint_preset,
            &self.navigation_mode,
            &self.dual_pane,
        ]
    }

    /// Whether `key` belongs to this version's set.
    pub fn contains(&self, key: &str) -> bool {
        self.all().iter().any(|k| k.as_str() == key)
    }
}

impl Default for StorageKeys {
    fn default() -> Self {
        Self::for_version(STORAGE_VERSION)
    }
}

/// Whether a key falls under one of the application's prefixes.
pub fn is_app_key(key: &str) -> bool {
    APP_PREFIXES.iter().any(|prefix| key.starts_with(prefix))
}

/// Delete application keys that are not part of the current key set.
///
/// Returns the removed keys. Foreign keys are never touched.
pub fn cleanup_old_versions(store: &dyn KeyValueStore, keys: &StorageKeys) -> Result<Vec<String>, DashError> {
    let stale: Vec<String> = store
        .keys()?
        .into_iter()
        .filter(|key| is_app_key(key) && !keys.contains(key))
        .collect();

    for key in &stale {
        store.remove(key)?;
        tracing::debug!(storage_key = %key, "Removed stale layout key");
    }

    if !stale.is_empty() {
        tracing::info!(removed = stale.len(), version = %keys.version, "Cleaned up old storage versions");
    }

    Ok(stale)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::storage::MemoryStorage;

    #[test]
    fn test_keys_carry_version_tag() {
        let keys = StorageKeys::default();
        assert_eq!(keys.top_layouts.as_str(), "dashboard-top-layouts-v3-2025-8-22-gridlayout");
        assert_eq!(keys.activities_columns.as_str(), "activities-grid-columns-v3-2025-8-22-gridlayout");
        assert!(keys.all().iter().all(|k| is_app_key(k.as_str())));
    }

    #[test]
    fn test_version_bump_removes_old_keys() {
        let store = MemoryStorage::new();
        let v1 = StorageKeys::for_version("v1");
        for key in v1.all() {
            store.set(key.as_str(), "1").unwrap();
        }
        store.set("theme", "dark").unwrap();

        let v2 = StorageKeys::for_version("v2");
        store.set(v2.breakpoint_preset.as_str(), "\"wide\"").unwrap();

        let removed = cleanup_old_versions(&store, &v2).unwrap();
        assert_eq!(removed.len(), 6);

        let remaining = store.keys().unwrap();
        assert!(remaining.iter().all(|k| !k.ends_with("-v1")));
        assert!(remaining.contains(&"theme".to_string()));
        assert!(remaining.contains(&v2.breakpoint_preset.to_string()));
        assert_eq!(store.get(v2.top_layouts.as_str()).unwrap(), None);
    }

    #[test]
    fn test_cleanup_is_idempotent() {
        let store = MemoryStorage::new();
        store.set("dashboard-old-thing", "x").unwrap();
        let keys = StorageKeys::default();
        assert_eq!(cleanup_old_versions(&store, &keys).unwrap().len(), 1);
        assert!(cleanup_old_versions(&store, &keys).unwrap().is_empty());
    }
}

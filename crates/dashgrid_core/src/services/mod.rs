//! Persistence and coordination services.
//!
//! - `storage` - Key-value store trait with SQLite and in-memory backends
//! - `keys` - Versioned storage keys and stale-version cleanup
//! - `blob` - Schema-tagged JSON blobs and bare scalars
//! - `registry` - Reset-callback registry

pub mod blob;
pub mod keys;
pub mod registry;
pub mod storage;

pub use blob::{StoredBlob, LAYOUT_SET_SCHEMA, SIDEBAR_SCHEMA};
pub use keys::{cleanup_old_versions, StorageKey, StorageKeys, STORAGE_VERSION};
pub use registry::{LayoutRegistry, Registration, ResetFamily, ResetFn};
pub use storage::{KeyValueStore, LocalStorage, MemoryStorage};

//! Reset-callback registry.
//!
//! Components register a zero-argument reset callback under their storage
//! key when they are created. An owner that does not hold the component
//! (the shell, the workspace) can then force it back to defaults by key.
//! The registry is shared through `Arc` rather than a global.

use parking_lot::RwLock;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Weak};
use uuid::Uuid;

/// Component family a reset callback belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ResetFamily {
    /// Grid layout engines, including the metrics bar.
    Grid,
    /// Single-column sidebar layouts.
    Sidebar,
    /// Two-pane splitters.
    DualPane,
}

impl ResetFamily {
    /// All families, in reset order.
    pub const ALL: [ResetFamily; 3] = [Self::Grid, Self::Sidebar, Self::DualPane];
}

/// A reset callback.
pub type ResetFn = Arc<dyn Fn() + Send + Sync>;

struct Entry {
    token: Uuid,
    callback: ResetFn,
}

/// Process-scoped registry of reset callbacks, keyed by family and storage key.
#[derive(Default)]
pub struct LayoutRegistry {
    entries: RwLock<HashMap<(ResetFamily, String), Entry>>,
}

impl fmt::Debug for LayoutRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LayoutRegistry").field("registered", &self.entries.read().len()).finish()
    }
}

impl LayoutRegistry {
    /// Create an empty registry.
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Register a reset callback.
    ///
    /// A later registration under the same key replaces this one. Dropping
    /// the returned handle deregisters only if the slot still holds it.
    pub fn register(
        self: &Arc<Self>,
        family: ResetFamily,
        key: impl Into<String>,
        callback: impl Fn() + Send + Sync + 'static,
    ) -> Registration {
        let key = key.into();
        let token = Uuid::new_v4();

        let replaced = self
            .entries
            .write()
            .insert((family, key.clone()), Entry { token, callback: Arc::new(callback) })
            .is_some();

        tracing::trace!(?family, storage_key = %key, replaced, "Registered reset callback");

        Registration { registry: Arc::downgrade(self), family, key, token }
    }

    /// Remove whatever is registered under the key.
    pub fn unregister(&self, family: ResetFamily, key: &str) -> bool {
        self.entries.write().remove(&(family, key.to_string())).is_some()
    }

    /// Whether a callback is registered under the key.
    pub fn is_registered(&self, family: ResetFamily, key: &str) -> bool {
        self.entries.read().contains_key(&(family, key.to_string()))
    }

    /// Invoke the callback registered under the key.
    ///
    /// Returns `false` when nothing is registered; that is not an error.
    pub fn reset(&self, family: ResetFamily, key: &str) -> bool {
        let callback = self.entries.read().get(&(family, key.to_string())).map(|e| Arc::clone(&e.callback));

        match callback {
            Some(callback) => {
                callback();
                true
            }
            None => {
                tracing::trace!(?family, storage_key = key, "No reset callback registered");
                false
            }
        }
    }

    /// Invoke every registered callback, grouped by family. Returns how many ran.
    pub fn reset_all(&self) -> usize {
        let mut callbacks: Vec<_> = self
            .entries
            .read()
            .iter()
            .map(|((family, key), entry)| (*family, key.clone(), Arc::clone(&entry.callback)))
            .collect();
        callbacks.sort_by(|a, b| (a.0, &a.1).cmp(&(b.0, &b.1)));

        for (_, _, callback) in &callbacks {
            callback();
        }
        callbacks.len()
    }

    fn release(&self, family: ResetFamily, key: &str, token: Uuid) {
        let mut entries = self.entries.write();
        let slot = (family, key.to_string());
        if entries.get(&slot).is_some_and(|e| e.token == token) {
            entries.remove(&slot);
            tracing::trace!(?family, storage_key = key, "Released reset callback");
        }
    }
}

/// Handle returned by [`LayoutRegistry::register`]. Deregisters on drop.
pub struct Registration {
    registry: Weak<LayoutRegistry>,
    family: ResetFamily,
    key: String,
    token: Uuid,
}

impl Registration {
    /// The storage key this registration is filed under.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// The family this registration is filed under.
    pub fn family(&self) -> ResetFamily {
        self.family
    }
}

impl fmt::Debug for Registration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registration").field("family", &self.family).field("key", &self.key).finish()
    }
}

impl Drop for Registration {
    fn drop(&mut self) {
        if let Some(registry) = self.registry.upgrade() {
            registry.release(self.family, &self.key, self.token);
        }
    }
}

//! Schema-tagged persisted blobs.
//!
//! Structured values are stored as `{"schema": N, "data": ...}` so readers
//! dispatch on an explicit version instead of guessing from the shape.
//! Anything else that parses as JSON is surfaced as [`StoredBlob::Legacy`]
//! for the owning component to migrate or discard.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::storage::KeyValueStore;
use crate::error::DashError;

/// Schema of a breakpoint-keyed layout set.
pub const LAYOUT_SET_SCHEMA: u32 = 1;

/// Schema of a single-column sidebar layout.
pub const SIDEBAR_SCHEMA: u32 = 1;

#[derive(Serialize)]
struct EnvelopeRef<'a, T> {
    schema: u32,
    data: &'a T,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct Envelope {
    schema: u32,
    data: Value,
}

/// A decoded stored value.
#[derive(Debug, Clone, PartialEq)]
pub enum StoredBlob {
    /// Written by the current code with an explicit schema.
    Tagged { schema: u32, data: Value },
    /// Untagged JSON written before schemas existed.
    Legacy(Value),
}

impl StoredBlob {
    /// Deserialize the payload if it is tagged with `schema`.
    pub fn into_tagged<T: DeserializeOwned>(self, schema: u32) -> Result<Option<T>, DashError> {
        match self {
            Self::Tagged { schema: found, data } if found == schema => Ok(Some(serde_json::from_value(data)?)),
            Self::Tagged { schema: found, .. } => {
                tracing::debug!(expected = schema, found, "Ignoring blob with unexpected schema");
                Ok(None)
            }
            Self::Legacy(_) => Ok(None),
        }
    }
}

/// Encode a value inside a schema envelope.
pub fn encode_tagged<T: Serialize>(schema: u32, data: &T) -> Result<String, DashError> {
    Ok(serde_json::to_string(&EnvelopeRef { schema, data })?)
}

/// Decode a raw stored string.
pub fn decode(raw: &str) -> Result<StoredBlob, DashError> {
    let value: Value = serde_json::from_str(raw)?;
    let is_envelope = value
        .as_object()
        .is_some_and(|obj| obj.len() == 2 && obj.get("schema").is_some_and(Value::is_u64) && obj.contains_key("data"));

    if is_envelope {
        let envelope: Envelope = serde_json::from_value(value)?;
        Ok(StoredBlob::Tagged { schema: envelope.schema, data: envelope.data })
    } else {
        Ok(StoredBlob::Legacy(value))
    }
}

/// Read and decode a key, treating any failure as absence.
///
/// Read failures are logged and never surfaced: callers fall back to
/// defaults.
pub fn read_blob(store: &dyn KeyValueStore, key: &str) -> Option<StoredBlob> {
    let raw = match store.get(key) {
        Ok(Some(raw)) => raw,
        Ok(None) => return None,
        Err(e) => {
            tracing::warn!(storage_key = key, error = %e, "Failed to read stored layout");
            return None;
        }
    };

    match decode(&raw) {
        Ok(blob) => Some(blob),
        Err(e) => {
            tracing::warn!(storage_key = key, error = %e, "Discarding corrupt stored layout");
            None
        }
    }
}

/// Write a schema-tagged value.
pub fn write_tagged<T: Serialize>(
    store: &dyn KeyValueStore,
    key: &str,
    schema: u32,
    data: &T,
) -> Result<(), DashError> {
    store.set(key, &encode_tagged(schema, data)?)
}

/// Read a bare JSON scalar, treating any failure as absence.
pub fn read_scalar<T: DeserializeOwned>(store: &dyn KeyValueStore, key: &str) -> Option<T> {
    let raw = match store.get(key) {
        Ok(raw) => raw?,
        Err(e) => {
            tracing::warn!(storage_key = key, error = %e, "Failed to read stored value");
            return None;
        }
    };

    match serde_json::from_str(&raw) {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::warn!(storage_key = key, error = %e, "Discarding unreadable stored value");
            None
        }
    }
}

/// Write a bare JSON scalar.
pub fn write_scalar<T: Serialize>(store: &dyn KeyValueStore, key: &str, value: &T) -> Result<(), DashError> {
    store.set(key, &serde_json::to_string(value)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::storage::MemoryStorage;
    use serde_json::json;

    #[test]
    fn test_tagged_blob_dispatches_on_schema() {
        let raw = encode_tagged(LAYOUT_SET_SCHEMA, &json!({"lg": []})).unwrap();
        let blob = decode(&raw).unwrap();
        assert!(matches!(blob, StoredBlob::Tagged { schema: 1, .. }));

        let data: Option<Value> = blob.clone().into_tagged(LAYOUT_SET_SCHEMA).unwrap();
        assert_eq!(data, Some(json!({"lg": []})));
        let newer: Option<Value> = blob.into_tagged(2).unwrap();
        assert_eq!(newer, None);
    }

    #[test]
    fn test_untagged_json_is_legacy() {
        assert_eq!(decode("[1,2]").unwrap(), StoredBlob::Legacy(json!([1, 2])));
        // A "schema" field alone does not make an envelope
        let blob = decode(r#"{"schema": 1, "lg": []}"#).unwrap();
        assert!(matches!(blob, StoredBlob::Legacy(_)));
        assert!(decode("{oops").is_err());
    }

    #[test]
    fn test_read_blob_swallows_corruption() {
        let store = MemoryStorage::new();
        store.set("dashboard-top-layouts-v1", "not json").unwrap();
        assert_eq!(read_blob(&store, "dashboard-top-layouts-v1"), None);
        assert_eq!(read_blob(&store, "missing"), None);
    }

    #[test]
    fn test_scalars_are_stored_bare() {
        let store = MemoryStorage::new();
        write_scalar(&store, "workspace-dual-pane-v1", &3u32).unwrap();
        assert_eq!(store.get("workspace-dual-pane-v1").unwrap().as_deref(), Some("3"));
        assert_eq!(read_scalar::<u32>(&store, "workspace-dual-pane-v1"), Some(3));

        store.set("workspace-dual-pane-v1", "\"wide\"").unwrap();
        assert_eq!(read_scalar::<u32>(&store, "workspace-dual-pane-v1"), None);
    }
}

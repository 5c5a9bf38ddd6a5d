//! Error types for the Dashgrid layout engine.
//!
//! No error in this crate is meant to be fatal to a host application. Storage
//! failures are recovered by callers (defaults are synthesized on read
//! failures, the in-memory layout keeps working on write failures), so most
//! of these values end up in a log line rather than in front of a user.

use serde::Serialize;
use thiserror::Error;

/// Main error type for Dashgrid.
#[derive(Debug, Error)]
pub enum DashError {
    /// Persistent key-value storage failed.
    #[error("Storage error: {message}")]
    Storage {
        /// Human-readable error message.
        message: String,
        /// Actionable hint for the user.
        hint: Option<String>,
        /// Optional underlying error source.
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// The store refused a write because it would exceed its quota.
    #[error("Storage quota exceeded writing '{key}' ({requested} bytes, {available} available)")]
    QuotaExceeded {
        /// Key that was being written.
        key: String,
        /// Size of the rejected value in bytes.
        requested: usize,
        /// Bytes still available in the store.
        available: usize,
    },

    /// A persisted blob could not be encoded or decoded.
    #[error("Serialization error: {message}")]
    Serialization {
        /// Human-readable error message.
        message: String,
        /// Optional underlying error source.
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// A layout violates its structural invariants.
    #[error("Invalid layout: {message}")]
    InvalidLayout {
        /// Human-readable error message.
        message: String,
    },

    /// A breakpoint preset id is not in the registry.
    #[error("Unknown breakpoint preset: {id}")]
    UnknownPreset {
        /// The preset id that was requested.
        id: String,
    },

    /// A navigation event referenced a path the tree does not contain.
    #[error("Navigation error: {message}")]
    Navigation {
        /// Human-readable error message.
        message: String,
    },

    /// Configuration error.
    #[error("Config error: {message}")]
    Config {
        /// Human-readable error message.
        message: String,
    },
}

impl DashError {
    // ========== Constructors ==========

    /// Create a new storage error.
    pub fn storage(message: impl Into<String>, hint: Option<&str>) -> Self {
        Self::Storage { message: message.into(), hint: hint.map(String::from), source: None }
    }

    /// Create a quota exceeded error.
    pub fn quota_exceeded(key: impl Into<String>, requested: usize, available: usize) -> Self {
        Self::QuotaExceeded { key: key.into(), requested, available }
    }

    /// Create a new serialization error.
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::Serialization { message: message.into(), source: None }
    }

    /// Create a new invalid layout error.
    pub fn invalid_layout(message: impl Into<String>) -> Self {
        Self::InvalidLayout { message: message.into() }
    }

    /// Create an unknown preset error.
    pub fn unknown_preset(id: impl Into<String>) -> Self {
        Self::UnknownPreset { id: id.into() }
    }

    /// Create a new navigation error.
    pub fn navigation(message: impl Into<String>) -> Self {
        Self::Navigation { message: message.into() }
    }

    /// Create a new config error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config { message: message.into() }
    }

    // ========== Methods ==========

    /// Check if this error came from the persistence layer.
    ///
    /// These are always recoverable: the caller keeps its in-memory state.
    pub fn is_storage(&self) -> bool {
        matches!(
            self,
            Self::Storage { .. } | Self::QuotaExceeded { .. } | Self::Serialization { .. }
        )
    }

    /// Get the error category name.
    pub fn category(&self) -> &'static str {
        match self {
            Self::Storage { .. } => "Storage",
            Self::QuotaExceeded { .. } => "Storage",
            Self::Serialization { .. } => "Serialization",
            Self::InvalidLayout { .. } => "Layout",
            Self::UnknownPreset { .. } => "Preset",
            Self::Navigation { .. } => "Navigation",
            Self::Config { .. } => "Config",
        }
    }

    /// Get actionable hint for the user.
    pub fn hint(&self) -> Option<&str> {
        match self {
            Self::Storage { hint, .. } => hint.as_deref(),
            Self::QuotaExceeded { .. } => Some("Reset the layout to free stored data"),
            Self::Serialization { .. } => Some("Stored layout data may be corrupted"),
            Self::InvalidLayout { .. } => None,
            Self::UnknownPreset { .. } => Some("Choose one of the registered preset ids"),
            Self::Navigation { .. } => Some("Check the item names in the navigation tree"),
            Self::Config { .. } => None,
        }
    }

    /// Convert to user-displayable error info.
    pub fn to_error_info(&self) -> ErrorInfo {
        let error_type = format!("{} Error", self.category());
        let message = self.to_string();
        let hint = self.hint().map(String::from);

        let technical_detail = match self {
            Self::QuotaExceeded { key, requested, available } => {
                Some(format!("Key: {key}\nRequested: {requested}\nAvailable: {available}"))
            }
            Self::Storage { source: Some(source), .. }
            | Self::Serialization { source: Some(source), .. } => Some(source.to_string()),
            _ => None,
        };

        ErrorInfo { error_type, message, hint, technical_detail }
    }
}

/// User-displayable error information.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorInfo {
    /// Category name (e.g., "Storage Error").
    pub error_type: String,
    /// User-friendly message.
    pub message: String,
    /// Actionable suggestion.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
    /// Underlying cause, for verbose output.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub technical_detail: Option<String>,
}

// ========== Error Conversions ==========

/// Convert from rusqlite::Error to DashError.
impl From<rusqlite::Error> for DashError {
    fn from(err: rusqlite::Error) -> Self {
        DashError::Storage {
            message: err.to_string(),
            hint: Some("The local database may be corrupted".to_string()),
            source: Some(Box::new(err)),
        }
    }
}

/// Convert from std::io::Error to DashError.
impl From<std::io::Error> for DashError {
    fn from(err: std::io::Error) -> Self {
        DashError::Storage {
            message: err.to_string(),
            hint: Some("Check file permissions and disk space".to_string()),
            source: Some(Box::new(err)),
        }
    }
}

/// Convert from serde_json::Error to DashError.
impl From<serde_json::Error> for DashError {
    fn from(err: serde_json::Error) -> Self {
        DashError::Serialization {
            message: format!("JSON error: {err}"),
            source: Some(Box::new(err)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_errors_are_recoverable() {
        assert!(DashError::storage("disk full", None).is_storage());
        assert!(DashError::quota_exceeded("k", 10, 2).is_storage());
        assert!(DashError::serialization("bad json").is_storage());
        assert!(!DashError::unknown_preset("nope").is_storage());
    }

    #[test]
    fn test_quota_error_info_has_detail() {
        let info = DashError::quota_exceeded("dashboard-top-layouts-v1", 512, 16).to_error_info();
        assert_eq!(info.error_type, "Storage Error");
        assert!(info.hint.is_some());
        let detail = info.technical_detail.unwrap();
        assert!(detail.contains("dashboard-top-layouts-v1"));
        assert!(detail.contains("512"));
    }

    #[test]
    fn test_json_error_converts_to_serialization() {
        let err: DashError = serde_json::from_str::<serde_json::Value>("{not json")
            .unwrap_err()
            .into();
        assert_eq!(err.category(), "Serialization");
        assert!(err.to_error_info().technical_detail.is_some());
    }

    #[test]
    fn test_error_info_serializes_without_empty_fields() {
        let value = serde_json::to_value(DashError::config("bad mode").to_error_info()).unwrap();
        assert_eq!(value["error_type"], "Config Error");
        assert_eq!(value["message"], "Config error: bad mode");
        assert!(value.get("hint").is_none());

        let value = serde_json::to_value(DashError::unknown_preset("huge").to_error_info()).unwrap();
        assert_eq!(value["hint"], "Choose one of the registered preset ids");
    }
}

//! Domain error types
//!
//! This module defines the error hierarchy for tabsync. All errors are
//! domain-specific and don't expose third-party types.

use thiserror::Error;

/// Main tabsync error type
///
/// This is the primary error type used throughout the application.
/// It wraps specific error types and provides context for error handling.
#[derive(Debug, Error)]
pub enum SyncError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Remote store errors
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Merge process errors
    #[error("Merge error: {0}")]
    Merge(String),

    /// Post-upload validation failed (count or sample mismatch)
    #[error("Validation error: {0}")]
    Validation(String),

    /// Staging create or cut-over failed; the original target was not touched
    #[error("Structural error: {0}")]
    Structural(String),

    /// Upload retries exhausted; a checkpoint was persisted for resume
    #[error("Retries exhausted: {message} (snapshot: {snapshot})")]
    ExhaustedRetries {
        message: String,
        /// Path of the pre-publish snapshot, for manual recovery
        snapshot: String,
    },

    /// A publish run is already in flight on this publisher
    #[error("A publish run is already in progress")]
    AlreadyRunning,

    /// Checkpoint persistence errors
    #[error("State management error: {0}")]
    State(String),

    /// Snapshot capture/restore errors
    #[error("Snapshot error: {0}")]
    Snapshot(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(String),

    /// Generic errors with context
    #[error("{0}")]
    Other(String),
}

/// Remote-store-specific errors
///
/// Errors returned by `RemoteStore` implementations. These don't expose the
/// underlying HTTP client types; adapters translate into this taxonomy so the
/// publisher can pick a retry policy from the variant alone.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Server capacity signal (429/503); the caller should shrink its payload
    #[error("Store overloaded: {0}")]
    Overloaded(String),

    /// Connection-level failure (reset, refused, DNS)
    #[error("Network error: {0}")]
    Network(String),

    /// Request timed out
    #[error("Request timeout: {0}")]
    Timeout(String),

    /// Payload exceeded the store's hard size limit (~2 MB)
    #[error("Payload too large: {0}")]
    PayloadTooLarge(String),

    /// Named structure does not exist on the store
    #[error("Structure not found: {0}")]
    StructureNotFound(String),

    /// Authentication failed
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    /// Other HTTP-level failure
    #[error("Store request failed: {status} - {message}")]
    Http { status: u16, message: String },

    /// Response body could not be decoded
    #[error("Failed to deserialize response: {0}")]
    Serialization(String),

    /// Malformed request rejected by the store
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl StoreError {
    /// Shrink-class failure: the fix is a smaller payload, not a retry delay.
    ///
    /// Covers capacity signals (429/503) and hard payload rejections (413);
    /// both are cured by halving the batch and retrying the same range.
    pub fn is_overload(&self) -> bool {
        matches!(
            self,
            StoreError::Overloaded(_) | StoreError::PayloadTooLarge(_)
        )
    }

    /// Transient failure worth retrying the same range with backoff.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            StoreError::Overloaded(_) | StoreError::Network(_) | StoreError::Timeout(_)
        )
    }
}

// Conversion from std::io::Error
impl From<std::io::Error> for SyncError {
    fn from(err: std::io::Error) -> Self {
        SyncError::Io(err.to_string())
    }
}

// Conversion from serde_json::Error
impl From<serde_json::Error> for SyncError {
    fn from(err: serde_json::Error) -> Self {
        SyncError::Serialization(err.to_string())
    }
}

// Conversion from toml parse errors
impl From<toml::de::Error> for SyncError {
    fn from(err: toml::de::Error) -> Self {
        SyncError::Configuration(format!("TOML parse error: {err}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sync_error_display() {
        let err = SyncError::Configuration("Invalid config".to_string());
        assert_eq!(err.to_string(), "Configuration error: Invalid config");
    }

    #[test]
    fn test_store_error_conversion() {
        let store_err = StoreError::Overloaded("rate limit".to_string());
        let sync_err: SyncError = store_err.into();
        assert!(matches!(sync_err, SyncError::Store(_)));
    }

    #[test]
    fn test_overload_classification() {
        assert!(StoreError::Overloaded("429".to_string()).is_overload());
        assert!(StoreError::PayloadTooLarge("2.1 MB".to_string()).is_overload());
        assert!(!StoreError::Timeout("30s".to_string()).is_overload());
        assert!(!StoreError::StructureNotFound("t".to_string()).is_overload());
    }

    #[test]
    fn test_transient_classification() {
        assert!(StoreError::Network("reset".to_string()).is_transient());
        assert!(StoreError::Timeout("30s".to_string()).is_transient());
        assert!(StoreError::Overloaded("429".to_string()).is_transient());
        assert!(!StoreError::InvalidRequest("bad".to_string()).is_transient());
        assert!(!StoreError::Http {
            status: 400,
            message: "bad request".to_string()
        }
        .is_transient());
    }

    #[test]
    fn test_exhausted_retries_carries_snapshot() {
        let err = SyncError::ExhaustedRetries {
            message: "upload failed after 5 attempts".to_string(),
            snapshot: "/var/snapshots/roster_2024.json".to_string(),
        };
        assert!(err.to_string().contains("roster_2024.json"));
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "File not found");
        let sync_err: SyncError = io_err.into();
        assert!(matches!(sync_err, SyncError::Io(_)));
    }

    #[test]
    fn test_serde_json_error_conversion() {
        let json_err = serde_json::from_str::<serde_json::Value>("invalid json").unwrap_err();
        let sync_err: SyncError = json_err.into();
        assert!(matches!(sync_err, SyncError::Serialization(_)));
    }

    #[test]
    fn test_toml_error_conversion() {
        let toml_err = toml::from_str::<toml::Value>("invalid = toml = syntax").unwrap_err();
        let sync_err: SyncError = toml_err.into();
        assert!(matches!(sync_err, SyncError::Configuration(_)));
        assert!(sync_err.to_string().contains("TOML parse error"));
    }

    #[test]
    fn test_sync_error_implements_std_error() {
        let err = SyncError::Validation("Test error".to_string());
        let _: &dyn std::error::Error = &err;
    }
}

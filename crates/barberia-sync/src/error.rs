//! # Sync Error Types
//!
//! ## Error Categories
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  ┌─────────────────┐  ┌─────────────────┐  ┌─────────────────────────┐ │
//! │  │  Configuration  │  │   Transport     │  │     Protocol            │ │
//! │  │                 │  │                 │  │                         │ │
//! │  │  InvalidConfig  │  │  Connection     │  │  DeserializationFailed  │ │
//! │  │  InvalidUrl     │  │  Timeout        │  │  VersionMismatch        │ │
//! │  │  ConfigLoad/Save│  │  HttpStatus     │  │  SerializationFailed    │ │
//! │  └─────────────────┘  └─────────────────┘  └─────────────────────────┘ │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! `RemoteSync::pull` and `push` swallow these after logging; the typed
//! `try_*` variants return them for callers that care.

use barberia_core::snapshot::SnapshotDecodeError;
use thiserror::Error;

/// Result type alias for sync operations.
pub type SyncResult<T> = Result<T, SyncError>;

/// Sync error type covering all possible sync failures.
#[derive(Debug, Error)]
pub enum SyncError {
    // =========================================================================
    // Configuration Errors
    // =========================================================================
    /// Invalid sync configuration.
    #[error("Invalid sync configuration: {0}")]
    InvalidConfig(String),

    /// Invalid remote URL.
    #[error("Invalid sync URL: {0}")]
    InvalidUrl(String),

    /// Failed to load config file.
    #[error("Failed to load config: {0}")]
    ConfigLoadFailed(String),

    /// Failed to save config file.
    #[error("Failed to save config: {0}")]
    ConfigSaveFailed(String),

    // =========================================================================
    // Transport Errors
    // =========================================================================
    /// Could not reach the remote.
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Request timed out.
    #[error("Request timed out after {0} seconds")]
    Timeout(u64),

    /// Remote answered with a non-success status.
    #[error("Remote returned HTTP {status}")]
    HttpStatus { status: u16 },

    // =========================================================================
    // Protocol Errors
    // =========================================================================
    /// Failed to serialize the outgoing snapshot.
    #[error("Serialization failed: {0}")]
    SerializationFailed(String),

    /// The remote body was not a snapshot.
    #[error("Deserialization failed: {0}")]
    DeserializationFailed(String),

    /// The remote snapshot has a different data version.
    #[error("Remote snapshot version {found:?} does not match expected {expected}")]
    VersionMismatch { found: Option<u64>, expected: u32 },
}

// =============================================================================
// Error Conversions
// =============================================================================

impl From<serde_json::Error> for SyncError {
    fn from(err: serde_json::Error) -> Self {
        SyncError::SerializationFailed(err.to_string())
    }
}

impl From<url::ParseError> for SyncError {
    fn from(err: url::ParseError) -> Self {
        SyncError::InvalidUrl(err.to_string())
    }
}

impl From<std::io::Error> for SyncError {
    fn from(err: std::io::Error) -> Self {
        SyncError::ConfigLoadFailed(err.to_string())
    }
}

impl From<toml::de::Error> for SyncError {
    fn from(err: toml::de::Error) -> Self {
        SyncError::ConfigLoadFailed(err.to_string())
    }
}

impl From<toml::ser::Error> for SyncError {
    fn from(err: toml::ser::Error) -> Self {
        SyncError::ConfigSaveFailed(err.to_string())
    }
}

impl From<SnapshotDecodeError> for SyncError {
    fn from(err: SnapshotDecodeError) -> Self {
        match err {
            SnapshotDecodeError::Malformed(e) => SyncError::DeserializationFailed(e.to_string()),
            SnapshotDecodeError::VersionMismatch { found, expected } => {
                SyncError::VersionMismatch { found, expected }
            }
        }
    }
}

// =============================================================================
// Error Categorization
// =============================================================================

impl SyncError {
    /// Returns true if a later attempt could succeed without any change on
    /// this side.
    pub fn is_retryable(&self) -> bool {
        match self {
            SyncError::ConnectionFailed(_) | SyncError::Timeout(_) => true,
            SyncError::HttpStatus { status } => *status == 429 || *status >= 500,
            _ => false,
        }
    }

    /// Returns true if this error indicates a configuration problem.
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            SyncError::InvalidConfig(_)
                | SyncError::InvalidUrl(_)
                | SyncError::ConfigLoadFailed(_)
                | SyncError::ConfigSaveFailed(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_errors() {
        assert!(SyncError::ConnectionFailed("refused".into()).is_retryable());
        assert!(SyncError::Timeout(10).is_retryable());
        assert!(SyncError::HttpStatus { status: 503 }.is_retryable());
        assert!(SyncError::HttpStatus { status: 429 }.is_retryable());

        assert!(!SyncError::HttpStatus { status: 404 }.is_retryable());
        assert!(!SyncError::InvalidUrl("nope".into()).is_retryable());
        assert!(!SyncError::VersionMismatch {
            found: Some(1),
            expected: 2
        }
        .is_retryable());
    }

    #[test]
    fn test_decode_error_mapping() {
        let err: SyncError = SnapshotDecodeError::VersionMismatch {
            found: None,
            expected: 2,
        }
        .into();
        assert!(matches!(err, SyncError::VersionMismatch { found: None, .. }));
        assert!(err.to_string().contains("expected 2"));
    }
}

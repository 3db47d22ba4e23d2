//! Store error types.

use thiserror::Error;

/// Errors from writing to the shared store.
///
/// Read failures never surface: an unreadable record is treated as absent.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Filesystem failure for a record.
    #[error("I/O error on {key}: {source}")]
    Io {
        key: String,
        #[source]
        source: std::io::Error,
    },

    /// Record could not be serialized.
    #[error("Failed to encode {key}: {source}")]
    Encode {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    /// Key contains characters not allowed in a record name.
    #[error("Invalid store key: {0:?}")]
    InvalidKey(String),
}

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

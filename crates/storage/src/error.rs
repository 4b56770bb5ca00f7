//! Error types for the offline storage system.

use thiserror::Error;

/// Errors that can occur during storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Storage operation failed: {operation}")]
    OperationFailed {
        operation: String,
        #[source]
        source: Option<eyre::Report>,
    },

    #[error("Storage backend error")]
    Backend {
        #[source]
        source: Option<eyre::Report>,
    },
}

/// Result type alias for storage operations.
pub type Result<T> = std::result::Result<T, StorageError>;

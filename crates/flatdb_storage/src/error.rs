//! Error types for storage operations.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors that can occur during storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The backing file does not exist.
    #[error("backing file not found: {}", path.display())]
    NotFound {
        /// The missing path.
        path: PathBuf,
    },

    /// The staged temp file could not be renamed over the target.
    #[error("failed to commit {}: {source}", target.display())]
    Commit {
        /// The file that was being replaced.
        target: PathBuf,
        /// The underlying rename error.
        #[source]
        source: io::Error,
    },

    /// A write was refused by the backend.
    #[error("write rejected by {backend}: {reason}")]
    WriteRejected {
        /// Description of the backend.
        backend: String,
        /// Why the write was refused.
        reason: String,
    },
}

impl StorageError {
    /// Creates a write rejected error.
    pub fn write_rejected(backend: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::WriteRejected {
            backend: backend.into(),
            reason: reason.into(),
        }
    }
}

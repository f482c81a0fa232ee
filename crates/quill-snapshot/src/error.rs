//! Snapshot error types.

use crate::CommitId;
use thiserror::Error;

/// Result type for snapshot operations.
pub type SnapshotResult<T> = Result<T, SnapshotError>;

/// Errors that can occur during snapshot operations.
#[derive(Debug, Error)]
pub enum SnapshotError {
    /// No snapshot stored for this key.
    #[error("snapshot missing: {filename} in commit {commit_id}")]
    SnapshotMissing {
        commit_id: CommitId,
        filename: String,
    },

    /// Filename cannot be used as a storage key.
    #[error("invalid snapshot key: {0}")]
    InvalidKey(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Operation failed.
    #[error("snapshot operation failed: {0}")]
    OperationFailed(String),
}

impl SnapshotError {
    /// Create a missing snapshot error.
    pub fn missing(commit_id: CommitId, filename: impl Into<String>) -> Self {
        Self::SnapshotMissing {
            commit_id,
            filename: filename.into(),
        }
    }

    /// Create an invalid key error.
    pub fn invalid_key(message: impl Into<String>) -> Self {
        Self::InvalidKey(message.into())
    }

    /// Create an operation failed error.
    pub fn operation_failed(message: impl Into<String>) -> Self {
        Self::OperationFailed(message.into())
    }
}

//! Error types for the core crate.

use quill_snapshot::{CommitId, SnapshotError};
use std::path::PathBuf;
use thiserror::Error;

/// Repository error types.
#[derive(Debug, Error)]
pub enum RepoError {
    /// Staging area is at capacity.
    #[error("staging area is full (capacity {capacity})")]
    StagingFull { capacity: usize },

    /// Undo stack is at capacity.
    #[error("undo stack is full (capacity {capacity})")]
    UndoStackFull { capacity: usize },

    /// Commit requested with nothing staged.
    #[error("no files to commit")]
    NothingToCommit,

    /// History has no commit to remove.
    #[error("commit history is empty")]
    HistoryEmpty,

    /// Undo requested with an empty history.
    #[error("no commits to undo")]
    NoCommitsToUndo,

    /// Undo stack has nothing to pop.
    #[error("undo stack is empty")]
    UndoStackEmpty,

    /// Undo stack top does not name the history tail.
    #[error("undo stack top {stack_top:?} does not match history tail {tail:?}")]
    UndoOutOfSync {
        stack_top: Option<CommitId>,
        tail: Option<CommitId>,
    },

    /// A staged file could not be read at commit time.
    #[error("cannot read staged file {path}: {source}")]
    SourceFileUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A snapshot could not be read back during undo.
    #[error("cannot restore {path}: {source}")]
    RestoreUnreadable {
        path: PathBuf,
        #[source]
        source: SnapshotError,
    },

    /// A live file could not be overwritten during undo.
    #[error("cannot write restored file {path}: {source}")]
    RestoreUnwritable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Filename is not a path inside the repository.
    #[error("invalid path: {0}")]
    InvalidPath(String),

    /// Persisted repository state violates a history invariant.
    #[error("corrupt repository state: {0}")]
    CorruptState(String),

    /// Snapshot storage error.
    #[error("snapshot error: {0}")]
    Snapshot(#[from] SnapshotError),

    /// Configuration error.
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl RepoError {
    /// Whether this is one of the capacity conditions.
    pub fn is_capacity_exceeded(&self) -> bool {
        matches!(self, Self::StagingFull { .. } | Self::UndoStackFull { .. })
    }

    /// Conditions that are reported to the user but leave the repository
    /// unchanged and are never fatal.
    pub fn is_notice(&self) -> bool {
        matches!(self, Self::NothingToCommit | Self::NoCommitsToUndo)
    }
}

/// Configuration-specific errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Invalid JSON/JSONC syntax.
    #[error("invalid config at {path}: {message}")]
    InvalidJson { path: String, message: String },

    /// Config validation failed.
    #[error("config validation failed: {message}")]
    Validation { message: String },

    /// Invalid path (e.g., could not determine config directory).
    #[error("invalid path: {0}")]
    InvalidPath(String),
}

/// Result type for repository operations.
pub type RepoResult<T> = Result<T, RepoError>;

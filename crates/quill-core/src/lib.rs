//! Core engine for quill, a minimal local version-control system.
//!
//! This crate provides:
//! - A bounded staging area of filenames awaiting commit
//! - Commit history with sequential ids, append and remove-last
//! - An undo stack that reverses the most recent commit
//! - The [`Repository`] engine tying them to the snapshot store
//! - Configuration loading and on-disk state

pub mod commit;
pub mod config;
pub mod error;
pub mod history;
pub mod repository;
pub mod staging;
pub mod state;
pub mod undo;

pub use commit::{Commit, FileEntry};
pub use config::Config;
pub use error::{ConfigError, RepoError, RepoResult};
pub use history::CommitHistory;
pub use quill_snapshot::{CommitId, SnapshotError, SnapshotStore};
pub use repository::{HistoryState, Repository, RepositoryStatus, StagingState};
pub use staging::StagingArea;
pub use state::RepositoryState;
pub use undo::UndoStack;

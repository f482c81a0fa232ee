//! On-disk form of a repository's metadata.
//!
//! Commits, the staging area and the undo stack are written together to
//! `.quill/state.json` so history survives between processes. File content
//! lives in the snapshot store, never here.

use crate::commit::{Commit, FileEntry};
use crate::error::{RepoError, RepoResult};
use crate::history::CommitHistory;
use crate::staging::StagingArea;
use crate::undo::UndoStack;
use quill_snapshot::CommitId;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

/// Current state file format.
pub const STATE_VERSION: u32 = 1;

/// Serialized repository metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RepositoryState {
    pub version: u32,
    /// Oldest first.
    pub commits: Vec<Commit>,
    pub staged: Vec<FileEntry>,
    /// Bottom first.
    pub undo_stack: Vec<CommitId>,
}

impl RepositoryState {
    pub fn capture(history: &CommitHistory, staging: &StagingArea, undo: &UndoStack) -> Self {
        Self {
            version: STATE_VERSION,
            commits: history.commits().to_vec(),
            staged: staging.entries().to_vec(),
            undo_stack: undo.iter().collect(),
        }
    }

    /// Load the state file, or `None` if it does not exist yet.
    pub async fn load(path: &Path) -> RepoResult<Option<Self>> {
        match tokio::fs::read_to_string(path).await {
            Ok(content) => {
                debug!(path = %path.display(), "Loading repository state");
                Ok(Some(serde_json::from_str(&content)?))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(RepoError::Io(e)),
        }
    }

    /// Write the state file atomically.
    pub async fn save(&self, path: &Path) -> RepoResult<()> {
        let json = serde_json::to_string_pretty(self)?;
        quill_util::atomic_write(path, json.as_bytes()).await?;
        debug!(path = %path.display(), commits = self.commits.len(), "Saved repository state");
        Ok(())
    }

    /// Rebuild the in-memory structures, checking the history invariants.
    ///
    /// The undo stack must list exactly the history's ids in commit order,
    /// since undo is the only way a commit ever leaves the history.
    pub fn into_parts(
        self,
        staging_capacity: usize,
        undo_capacity: usize,
    ) -> RepoResult<(CommitHistory, StagingArea, UndoStack)> {
        if self.version != STATE_VERSION {
            return Err(RepoError::CorruptState(format!(
                "unsupported state version {}",
                self.version
            )));
        }

        let history = CommitHistory::from_commits(self.commits)?;
        if self.undo_stack != history.ids() {
            return Err(RepoError::CorruptState(format!(
                "undo stack {:?} does not match history {:?}",
                self.undo_stack,
                history.ids()
            )));
        }

        let mut staging = StagingArea::new(usize::MAX);
        for entry in self.staged {
            staging.stage(entry)?;
        }
        staging.set_capacity(staging_capacity);

        let undo = UndoStack::from_ids(self.undo_stack, undo_capacity);
        Ok((history, staging, undo))
    }
}

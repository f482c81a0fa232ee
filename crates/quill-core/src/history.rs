//! Commit history.
//!
//! Commits live in a `Vec` ordered oldest to newest. Ids are contiguous
//! from 1, so a commit's position is `id - 1` and neighbours are found by
//! index instead of stored links. Only the tail can ever be removed.

use crate::commit::{Commit, FileEntry};
use crate::error::{RepoError, RepoResult};
use chrono::{DateTime, Utc};
use quill_snapshot::CommitId;

/// Append-only, doubly traversable sequence of commits.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommitHistory {
    commits: Vec<Commit>,
}

impl CommitHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a history from commits already ordered oldest first.
    ///
    /// Fails unless ids run 1, 2, 3... and every commit names a file.
    pub fn from_commits(commits: Vec<Commit>) -> RepoResult<Self> {
        for (index, commit) in commits.iter().enumerate() {
            let expected = CommitId(index as u64 + 1);
            if commit.id != expected {
                return Err(RepoError::CorruptState(format!(
                    "commit at position {} has id {}, expected {}",
                    index, commit.id, expected
                )));
            }
            if commit.files().is_empty() {
                return Err(RepoError::CorruptState(format!(
                    "commit {} has no files",
                    commit.id
                )));
            }
        }
        Ok(Self { commits })
    }

    /// Id the next appended commit will receive.
    pub fn next_id(&self) -> CommitId {
        self.tail().map_or(CommitId::FIRST, |c| c.id.next())
    }

    /// Link a new commit as the tail.
    pub fn append(
        &mut self,
        message: impl Into<String>,
        staged_files: Vec<FileEntry>,
        now: DateTime<Utc>,
    ) -> RepoResult<&Commit> {
        if staged_files.is_empty() {
            return Err(RepoError::NothingToCommit);
        }

        let commit = Commit::new(self.next_id(), message, now, staged_files);
        self.commits.push(commit);
        Ok(&self.commits[self.commits.len() - 1])
    }

    /// Unlink and return the tail. Its predecessor, if any, becomes the tail.
    pub fn remove_last(&mut self) -> RepoResult<Commit> {
        self.commits.pop().ok_or(RepoError::HistoryEmpty)
    }

    /// Put back a commit taken by [`remove_last`](Self::remove_last).
    pub(crate) fn restore_last(&mut self, commit: Commit) -> RepoResult<()> {
        if commit.id != self.next_id() {
            return Err(RepoError::CorruptState(format!(
                "cannot relink commit {} after {:?}",
                commit.id,
                self.tail().map(|c| c.id)
            )));
        }
        self.commits.push(commit);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.commits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commits.is_empty()
    }

    /// Oldest commit.
    pub fn head(&self) -> Option<&Commit> {
        self.commits.first()
    }

    /// Newest commit.
    pub fn tail(&self) -> Option<&Commit> {
        self.commits.last()
    }

    pub fn get(&self, id: CommitId) -> Option<&Commit> {
        let index = Self::position(id)?;
        self.commits.get(index)
    }

    /// The commit created just before `id`.
    pub fn prev_of(&self, id: CommitId) -> Option<&Commit> {
        let index = Self::position(id)?;
        if index >= self.commits.len() {
            return None;
        }
        index.checked_sub(1).and_then(|i| self.commits.get(i))
    }

    /// The commit created just after `id`.
    pub fn next_of(&self, id: CommitId) -> Option<&Commit> {
        let index = Self::position(id)?;
        if index >= self.commits.len() {
            return None;
        }
        self.commits.get(index + 1)
    }

    /// Oldest to newest; `.rev()` walks newest to oldest.
    pub fn iter(&self) -> std::slice::Iter<'_, Commit> {
        self.commits.iter()
    }

    pub fn ids(&self) -> Vec<CommitId> {
        self.commits.iter().map(|c| c.id).collect()
    }

    pub(crate) fn commits(&self) -> &[Commit] {
        &self.commits
    }

    fn position(id: CommitId) -> Option<usize> {
        id.get().checked_sub(1).map(|i| i as usize)
    }
}

impl<'a> IntoIterator for &'a CommitHistory {
    type Item = &'a Commit;
    type IntoIter = std::slice::Iter<'a, Commit>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

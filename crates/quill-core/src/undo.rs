//! Undo stack of commit ids.

use crate::error::{RepoError, RepoResult};
use quill_snapshot::CommitId;

/// Default number of commits that can be undone.
pub const DEFAULT_UNDO_CAPACITY: usize = 100;

/// Bounded LIFO of commit ids, pushed in commit order.
///
/// Holds ids, not commits: the history owns the records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UndoStack {
    ids: Vec<CommitId>,
    capacity: usize,
}

impl UndoStack {
    pub fn new(capacity: usize) -> Self {
        Self {
            ids: Vec::new(),
            capacity,
        }
    }

    pub fn push(&mut self, id: CommitId) -> RepoResult<()> {
        if self.is_full() {
            return Err(RepoError::UndoStackFull {
                capacity: self.capacity,
            });
        }
        self.ids.push(id);
        Ok(())
    }

    pub fn pop(&mut self) -> RepoResult<CommitId> {
        self.ids.pop().ok_or(RepoError::UndoStackEmpty)
    }

    pub fn peek(&self) -> Option<CommitId> {
        self.ids.last().copied()
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.ids.len() >= self.capacity
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Bottom to top.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = CommitId> + '_ {
        self.ids.iter().copied()
    }

    pub(crate) fn from_ids(ids: Vec<CommitId>, capacity: usize) -> Self {
        Self { ids, capacity }
    }
}

impl Default for UndoStack {
    fn default() -> Self {
        Self::new(DEFAULT_UNDO_CAPACITY)
    }
}

//! Snapshot key and payload types.

use serde::{Deserialize, Serialize};

/// Sequential identifier of a commit. The first commit is 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CommitId(pub u64);

impl CommitId {
    /// Id given to the first commit of an empty history.
    pub const FIRST: CommitId = CommitId(1);

    /// The id that follows this one.
    pub fn next(self) -> Self {
        Self(self.0 + 1)
    }

    pub fn get(self) -> u64 {
        self.0
    }

    /// Directory name of this commit inside the snapshot store.
    pub fn dir_name(self) -> String {
        format!("commit_{}", self.0)
    }
}

impl std::fmt::Display for CommitId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for CommitId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

/// Content of one file captured for a commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotFile {
    /// Relative filename, `/` separated.
    pub filename: String,
    /// Exact bytes at capture time.
    pub content: Vec<u8>,
}

impl SnapshotFile {
    pub fn new(filename: impl Into<String>, content: impl Into<Vec<u8>>) -> Self {
        Self {
            filename: filename.into(),
            content: content.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_commit_id_sequence() {
        assert_eq!(CommitId::FIRST.get(), 1);
        assert_eq!(CommitId::FIRST.next(), CommitId(2));
        assert!(CommitId(2) > CommitId::FIRST);
    }

    #[test]
    fn test_dir_name() {
        assert_eq!(CommitId(7).dir_name(), "commit_7");
    }
}

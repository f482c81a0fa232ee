//! The staging area: filenames queued for the next commit.

use crate::commit::FileEntry;
use crate::error::{RepoError, RepoResult};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Default number of entries the staging area accepts.
pub const DEFAULT_STAGING_CAPACITY: usize = 100;

/// Ordered, bounded list of staged files.
///
/// Staging the same name twice keeps both entries; [`StagingArea::unique`]
/// collapses them when a commit is taken.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StagingArea {
    entries: Vec<FileEntry>,
    capacity: usize,
}

impl StagingArea {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: Vec::new(),
            capacity,
        }
    }

    /// Append a file, failing once `capacity` entries are staged.
    pub fn stage(&mut self, entry: FileEntry) -> RepoResult<()> {
        if self.entries.len() >= self.capacity {
            return Err(RepoError::StagingFull {
                capacity: self.capacity,
            });
        }
        self.entries.push(entry);
        Ok(())
    }

    /// Empty the area. Called only after a successful commit.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn count(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn entries(&self) -> &[FileEntry] {
        &self.entries
    }

    pub fn contains(&self, filename: &str) -> bool {
        self.entries.iter().any(|e| e.filename == filename)
    }

    /// Staged files with repeats removed, keeping first-staged order.
    pub fn unique(&self) -> Vec<FileEntry> {
        let mut seen = HashSet::new();
        self.entries
            .iter()
            .filter(|e| seen.insert(e.filename.as_str()))
            .cloned()
            .collect()
    }

    /// Adopt a different capacity. Entries already staged are kept even
    /// when they exceed it; only further staging is refused.
    pub(crate) fn set_capacity(&mut self, capacity: usize) {
        self.capacity = capacity;
    }
}

impl Default for StagingArea {
    fn default() -> Self {
        Self::new(DEFAULT_STAGING_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_and_count() {
        let mut staging = StagingArea::default();
        staging.stage(FileEntry::new("a.txt")).unwrap();
        staging.stage(FileEntry::new("b.txt")).unwrap();

        assert_eq!(staging.count(), 2);
        assert!(staging.contains("a.txt"));
        assert_eq!(staging.entries()[1].filename, "b.txt");
    }

    #[test]
    fn test_capacity_exceeded() {
        let mut staging = StagingArea::new(2);
        staging.stage(FileEntry::new("a")).unwrap();
        staging.stage(FileEntry::new("b")).unwrap();

        let err = staging.stage(FileEntry::new("c")).unwrap_err();
        assert!(matches!(err, RepoError::StagingFull { capacity: 2 }));
        assert_eq!(staging.count(), 2);
    }

    #[test]
    fn test_default_capacity_is_one_hundred() {
        let mut staging = StagingArea::default();
        for i in 0..100 {
            staging.stage(FileEntry::new(format!("f{i}"))).unwrap();
        }
        assert!(staging.stage(FileEntry::new("overflow")).is_err());
    }

    #[test]
    fn test_duplicates_kept_until_unique() {
        let mut staging = StagingArea::default();
        staging.stage(FileEntry::new("a.txt")).unwrap();
        staging.stage(FileEntry::new("b.txt")).unwrap();
        staging.stage(FileEntry::new("a.txt")).unwrap();

        assert_eq!(staging.count(), 3);
        assert_eq!(
            staging.unique(),
            vec![FileEntry::new("a.txt"), FileEntry::new("b.txt")]
        );
    }

    #[test]
    fn test_clear() {
        let mut staging = StagingArea::default();
        staging.stage(FileEntry::new("a.txt")).unwrap();
        staging.clear();
        assert!(staging.is_empty());
    }
}

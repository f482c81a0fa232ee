//! Commit and file entry records.

use chrono::{DateTime, Utc};
use quill_snapshot::CommitId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A file named in the staging area or a commit.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FileEntry {
    /// Path relative to the repository root, `/` separated.
    pub filename: String,
}

impl FileEntry {
    pub fn new(filename: impl Into<String>) -> Self {
        Self {
            filename: filename.into(),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.filename
    }
}

impl fmt::Display for FileEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.filename)
    }
}

/// An immutable point-in-time record of a set of files.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Commit {
    pub id: CommitId,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    /// Files captured by this commit, in staging order. Never empty.
    files: Vec<FileEntry>,
}

impl Commit {
    /// Only the history creates commits, so `files` is known non-empty here.
    pub(crate) fn new(
        id: CommitId,
        message: impl Into<String>,
        timestamp: DateTime<Utc>,
        files: Vec<FileEntry>,
    ) -> Self {
        debug_assert!(!files.is_empty());
        Self {
            id,
            message: message.into(),
            timestamp,
            files,
        }
    }

    pub fn files(&self) -> &[FileEntry] {
        &self.files
    }
}

/// Log rendering: header, date, then one line per file.
impl fmt::Display for Commit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Commit {}: {}", self.id, self.message)?;
        writeln!(f, "Date: {}", self.timestamp.format("%a %b %e %H:%M:%S %Y"))?;
        writeln!(f, "Files:")?;
        for file in &self.files {
            writeln!(f, "  - {}", file)?;
        }
        Ok(())
    }
}

//! The repository engine: stage, commit, undo and log.
//!
//! A [`Repository`] owns the commit history, the staging area, the undo
//! stack and the snapshot store of one working directory. Mutating
//! operations take `&mut self`, so a repository processes exactly one of
//! them at a time; sharing one between tasks needs a mutex around the
//! whole value.

use crate::commit::{Commit, FileEntry};
use crate::config::{Config, QUILL_DIR};
use crate::error::{RepoError, RepoResult};
use crate::history::CommitHistory;
use crate::staging::StagingArea;
use crate::state::RepositoryState;
use crate::undo::UndoStack;
use chrono::Utc;
use quill_snapshot::{CommitId, SnapshotFile, SnapshotStore};
use quill_util::{overwrite, TimingGuard};
use serde::Serialize;
use std::path::{Component, Path, PathBuf};
use tokio::fs;
use tracing::{debug, info, warn};

/// Whether any commits exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HistoryState {
    Empty,
    HasHistory,
}

/// Whether anything is staged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StagingState {
    Clean,
    Dirty,
}

/// Snapshot of the repository's two orthogonal states.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RepositoryStatus {
    pub history: HistoryState,
    pub staging: StagingState,
    pub commits: usize,
    pub tail: Option<CommitId>,
    pub staged: Vec<FileEntry>,
}

/// A local repository rooted at one directory.
pub struct Repository {
    root: PathBuf,
    config: Config,
    history: CommitHistory,
    staging: StagingArea,
    undo: UndoStack,
    snapshots: SnapshotStore,
}

impl Repository {
    /// Open the repository at `root` with an explicit configuration.
    ///
    /// Creates `.quill/` on first use. When persistence is enabled, history
    /// saved by an earlier process is loaded and checked.
    pub async fn open(root: &Path, config: Config) -> RepoResult<Self> {
        config.validate()?;
        let root = fs::canonicalize(root).await?;

        fs::create_dir_all(root.join(QUILL_DIR)).await?;
        let snapshots = SnapshotStore::new(root.join(config.snapshot_dir())).await?;

        let mut repo = Self {
            staging: StagingArea::new(config.staging_capacity()),
            undo: UndoStack::new(config.undo_capacity()),
            history: CommitHistory::new(),
            root,
            config,
            snapshots,
        };

        if repo.config.persist() {
            if let Some(state) = RepositoryState::load(&repo.state_path()).await? {
                let (history, staging, undo) = state
                    .into_parts(repo.config.staging_capacity(), repo.config.undo_capacity())?;
                repo.history = history;
                repo.staging = staging;
                repo.undo = undo;
            }
        }

        info!(
            root = %repo.root.display(),
            commits = repo.history.len(),
            staged = repo.staging.count(),
            "Opened repository"
        );
        Ok(repo)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn state_path(&self) -> PathBuf {
        self.root.join(QUILL_DIR).join("state.json")
    }

    pub fn history(&self) -> &CommitHistory {
        &self.history
    }

    pub fn staged(&self) -> &StagingArea {
        &self.staging
    }

    pub fn undo_stack(&self) -> &UndoStack {
        &self.undo
    }

    pub fn snapshots(&self) -> &SnapshotStore {
        &self.snapshots
    }

    /// Queue a file for the next commit.
    ///
    /// The file is not read until commit time. Paths may be relative to the
    /// root or absolute inside it.
    pub async fn stage(&mut self, path: impl AsRef<Path>) -> RepoResult<FileEntry> {
        let entry = FileEntry::new(self.normalize(path.as_ref())?);
        let before = self.staging.clone();

        self.staging.stage(entry.clone())?;
        if let Err(e) = self.persist().await {
            self.staging = before;
            return Err(e);
        }

        info!(filename = %entry, staged = self.staging.count(), "Staged file");
        Ok(entry)
    }

    /// Capture every staged file into a new commit.
    ///
    /// All staged files are read before anything is written; the snapshot
    /// set is stored atomically. Any failure leaves history, staging and
    /// the undo stack exactly as they were.
    pub async fn commit(&mut self, message: &str) -> RepoResult<Commit> {
        let _timing = TimingGuard::repo("commit");

        if self.staging.is_empty() {
            info!("No files to commit");
            return Err(RepoError::NothingToCommit);
        }
        if self.undo.is_full() {
            return Err(RepoError::UndoStackFull {
                capacity: self.undo.capacity(),
            });
        }

        let id = self.history.next_id();
        let files = self.staging.unique();

        let mut captured = Vec::with_capacity(files.len());
        for entry in &files {
            let path = self.root.join(&entry.filename);
            let content = fs::read(&path)
                .await
                .map_err(|source| RepoError::SourceFileUnreadable { path, source })?;
            captured.push(SnapshotFile::new(entry.filename.clone(), content));
        }

        self.snapshots.put_all(id, &captured).await?;

        let staged_before = self.staging.clone();
        let commit = match self.history.append(message, files, Utc::now()) {
            Ok(commit) => commit.clone(),
            Err(e) => {
                self.discard_snapshots(id).await;
                return Err(e);
            }
        };
        if let Err(e) = self.undo.push(commit.id) {
            self.history.remove_last()?;
            self.discard_snapshots(id).await;
            return Err(e);
        }
        self.staging.clear();

        if let Err(e) = self.persist().await {
            warn!(commit = %commit.id, error = %e, "Failed to save state, rolling back commit");
            self.undo.pop()?;
            self.history.remove_last()?;
            self.staging = staged_before;
            self.discard_snapshots(id).await;
            return Err(e);
        }

        for file in commit.files() {
            debug!(commit = %commit.id, filename = %file, "Committed file");
        }
        info!(
            commit = %commit.id,
            files = commit.files().len(),
            message = %commit.message,
            "Committed"
        );
        Ok(commit)
    }

    /// Reverse the most recent commit, restoring its files.
    ///
    /// Every snapshot is read before any live file is touched. Live files
    /// are overwritten in place, keeping their permissions and writing
    /// through symlinks. Restoration stops at the first file that cannot be
    /// written; the commit then stays in history and on the undo stack.
    pub async fn undo(&mut self) -> RepoResult<Commit> {
        let _timing = TimingGuard::repo("undo");

        let Some(tail) = self.history.tail() else {
            info!("No commits to undo");
            return Err(RepoError::NoCommitsToUndo);
        };
        let tail_id = tail.id;
        if self.undo.peek() != Some(tail_id) {
            return Err(RepoError::UndoOutOfSync {
                stack_top: self.undo.peek(),
                tail: Some(tail_id),
            });
        }
        info!(commit = %tail_id, message = %tail.message, "Undoing commit");
        let files = tail.files().to_vec();

        let mut restored = Vec::with_capacity(files.len());
        for entry in &files {
            let content = self
                .snapshots
                .get(tail_id, &entry.filename)
                .await
                .map_err(|source| RepoError::RestoreUnreadable {
                    path: self.root.join(&entry.filename),
                    source,
                })?;
            restored.push((entry, content));
        }

        for (entry, content) in &restored {
            let path = self.root.join(&entry.filename);
            overwrite(&path, content)
                .await
                .map_err(|source| RepoError::RestoreUnwritable {
                    path: path.clone(),
                    source,
                })?;
            info!(filename = %entry, "Restored file from commit");
        }

        self.undo.pop()?;
        let commit = self.history.remove_last()?;

        if let Err(e) = self.persist().await {
            warn!(commit = %commit.id, error = %e, "Failed to save state, keeping commit");
            self.undo.push(commit.id)?;
            self.history.restore_last(commit)?;
            return Err(e);
        }

        self.discard_snapshots(commit.id).await;
        Ok(commit)
    }

    /// Commits oldest to newest. Read-only; call again to restart.
    pub fn log(&self) -> impl DoubleEndedIterator<Item = &Commit> + ExactSizeIterator + '_ {
        self.history.iter()
    }

    pub fn status(&self) -> RepositoryStatus {
        RepositoryStatus {
            history: if self.history.is_empty() {
                HistoryState::Empty
            } else {
                HistoryState::HasHistory
            },
            staging: if self.staging.is_empty() {
                StagingState::Clean
            } else {
                StagingState::Dirty
            },
            commits: self.history.len(),
            tail: self.history.tail().map(|c| c.id),
            staged: self.staging.entries().to_vec(),
        }
    }

    async fn persist(&self) -> RepoResult<()> {
        if !self.config.persist() {
            return Ok(());
        }
        RepositoryState::capture(&self.history, &self.staging, &self.undo)
            .save(&self.state_path())
            .await
    }

    async fn discard_snapshots(&self, id: CommitId) {
        if let Err(e) = self.snapshots.discard(id).await {
            warn!(commit = %id, error = %e, "Failed to discard snapshots");
        }
    }

    /// Turn a user path into a `/`-separated name relative to the root.
    fn normalize(&self, path: &Path) -> RepoResult<String> {
        let relative = if path.is_absolute() {
            path.strip_prefix(&self.root).map_err(|_| {
                RepoError::InvalidPath(format!(
                    "{} is not under repository root {}",
                    path.display(),
                    self.root.display()
                ))
            })?
        } else {
            path
        };

        let mut parts = Vec::new();
        for component in relative.components() {
            match component {
                Component::Normal(part) => parts.push(part.to_str().ok_or_else(|| {
                    RepoError::InvalidPath(format!("{} is not valid UTF-8", path.display()))
                })?),
                Component::CurDir => {}
                _ => {
                    return Err(RepoError::InvalidPath(format!(
                        "{} escapes the repository",
                        path.display()
                    )))
                }
            }
        }

        if parts.is_empty() {
            return Err(RepoError::InvalidPath(format!(
                "{} does not name a file",
                path.display()
            )));
        }

        let name = parts.join("/");
        let snapshot_dir = self.config.snapshot_dir();
        if parts[0] == QUILL_DIR || Path::new(&name).starts_with(&snapshot_dir) {
            return Err(RepoError::InvalidPath(format!(
                "{name} is inside quill's own storage"
            )));
        }
        Ok(name)
    }
}

impl std::fmt::Debug for Repository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Repository")
            .field("root", &self.root)
            .field("commits", &self.history.len())
            .field("staged", &self.staging.count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    async fn setup_test() -> (TempDir, Repository) {
        let dir = TempDir::new().unwrap();
        let repo = Repository::open(dir.path(), Config::default())
            .await
            .unwrap();
        (dir, repo)
    }

    #[tokio::test]
    async fn test_normalize_paths() {
        let (_dir, repo) = setup_test().await;

        assert_eq!(repo.normalize(Path::new("a.txt")).unwrap(), "a.txt");
        assert_eq!(repo.normalize(Path::new("./src/b.rs")).unwrap(), "src/b.rs");
        assert_eq!(
            repo.normalize(&repo.root().join("nested/c.txt")).unwrap(),
            "nested/c.txt"
        );

        for bad in ["../outside", "", ".quill/state.json", "/definitely/elsewhere"] {
            assert!(
                matches!(repo.normalize(Path::new(bad)), Err(RepoError::InvalidPath(_))),
                "path {bad:?}"
            );
        }
    }

    #[tokio::test]
    async fn test_status_transitions() {
        let (dir, mut repo) = setup_test().await;
        std::fs::write(dir.path().join("a.txt"), "hello").unwrap();

        let status = repo.status();
        assert_eq!(status.history, HistoryState::Empty);
        assert_eq!(status.staging, StagingState::Clean);

        repo.stage("a.txt").await.unwrap();
        assert_eq!(repo.status().staging, StagingState::Dirty);

        repo.commit("m1").await.unwrap();
        let status = repo.status();
        assert_eq!(status.history, HistoryState::HasHistory);
        assert_eq!(status.staging, StagingState::Clean);
        assert_eq!(status.tail, Some(CommitId(1)));
    }

    #[tokio::test]
    async fn test_commit_collapses_duplicate_names() {
        let (dir, mut repo) = setup_test().await;
        std::fs::write(dir.path().join("a.txt"), "hello").unwrap();

        repo.stage("a.txt").await.unwrap();
        repo.stage("./a.txt").await.unwrap();
        assert_eq!(repo.staged().count(), 2);

        let commit = repo.commit("dup").await.unwrap();
        assert_eq!(commit.files(), &[FileEntry::new("a.txt")]);
        assert_eq!(
            repo.snapshots().list(commit.id).await.unwrap(),
            vec!["a.txt"]
        );
    }

    #[tokio::test]
    async fn test_commit_checks_undo_capacity_first() {
        let dir = TempDir::new().unwrap();
        let config = Config {
            undo_capacity: Some(1),
            ..Default::default()
        };
        let mut repo = Repository::open(dir.path(), config).await.unwrap();
        std::fs::write(dir.path().join("a.txt"), "one").unwrap();

        repo.stage("a.txt").await.unwrap();
        repo.commit("first").await.unwrap();
        repo.stage("a.txt").await.unwrap();

        let err = repo.commit("second").await.unwrap_err();
        assert!(err.is_capacity_exceeded());
        assert_eq!(repo.history().len(), 1);
        assert_eq!(repo.staged().count(), 1);
        assert!(repo.snapshots().list(CommitId(2)).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_undo_discards_snapshots() {
        let (dir, mut repo) = setup_test().await;
        std::fs::write(dir.path().join("a.txt"), "hello").unwrap();
        repo.stage("a.txt").await.unwrap();
        repo.commit("m1").await.unwrap();

        repo.undo().await.unwrap();

        assert!(repo.snapshots().list(CommitId(1)).await.unwrap().is_empty());
    }

    /// Replace the state file with a non-empty directory so the next save fails.
    fn block_state_file(repo: &Repository) {
        let path = repo.state_path();
        let _ = std::fs::remove_file(&path);
        std::fs::create_dir_all(path.join("blocker")).unwrap();
    }

    #[tokio::test]
    async fn test_commit_rolls_back_when_state_save_fails() {
        let (dir, mut repo) = setup_test().await;
        std::fs::write(dir.path().join("a.txt"), "hello").unwrap();
        repo.stage("a.txt").await.unwrap();
        block_state_file(&repo);

        let err = repo.commit("m1").await.unwrap_err();

        assert!(matches!(err, RepoError::Io(_)));
        assert!(repo.history().is_empty());
        assert!(repo.undo_stack().is_empty());
        assert_eq!(repo.staged().entries(), &[FileEntry::new("a.txt")]);
        assert!(!repo.snapshots().base_dir().join("commit_1").exists());
    }

    #[tokio::test]
    async fn test_undo_relinks_commit_when_state_save_fails() {
        let (dir, mut repo) = setup_test().await;
        std::fs::write(dir.path().join("a.txt"), "hello").unwrap();
        repo.stage("a.txt").await.unwrap();
        let committed = repo.commit("m1").await.unwrap();
        std::fs::write(dir.path().join("a.txt"), "bye").unwrap();
        block_state_file(&repo);

        let err = repo.undo().await.unwrap_err();

        assert!(matches!(err, RepoError::Io(_)));
        assert_eq!(repo.history().tail(), Some(&committed));
        assert_eq!(repo.undo_stack().peek(), Some(CommitId(1)));
        assert!(repo.snapshots().exists(CommitId(1), "a.txt").await.unwrap());

        std::fs::remove_dir_all(repo.state_path()).unwrap();
        repo.undo().await.unwrap();
        assert!(repo.history().is_empty());
    }

    #[tokio::test]
    async fn test_dotted_snapshot_dir_is_guarded() {
        let dir = TempDir::new().unwrap();
        let config = Config {
            snapshot_dir: Some(PathBuf::from("./snaps")),
            ..Default::default()
        };
        let mut repo = Repository::open(dir.path(), config).await.unwrap();
        std::fs::write(dir.path().join("a.txt"), "hello").unwrap();
        repo.stage("a.txt").await.unwrap();
        repo.commit("m1").await.unwrap();

        assert!(dir.path().join("snaps/commit_1/a.txt").exists());
        let err = repo.stage("snaps/commit_1/a.txt").await.unwrap_err();
        assert!(matches!(err, RepoError::InvalidPath(_)));
    }

    #[tokio::test]
    async fn test_empty_snapshot_dir_is_rejected() {
        let dir = TempDir::new().unwrap();
        let config = Config {
            snapshot_dir: Some(PathBuf::new()),
            ..Default::default()
        };

        let err = Repository::open(dir.path(), config).await.unwrap_err();
        assert!(matches!(err, RepoError::Config(_)));
    }

    #[tokio::test]
    async fn test_undo_out_of_sync_is_refused() {
        let (dir, mut repo) = setup_test().await;
        std::fs::write(dir.path().join("a.txt"), "hello").unwrap();
        repo.stage("a.txt").await.unwrap();
        repo.commit("m1").await.unwrap();
        repo.undo.pop().unwrap();

        let err = repo.undo().await.unwrap_err();
        assert!(matches!(
            err,
            RepoError::UndoOutOfSync { stack_top: None, tail: Some(CommitId(1)) }
        ));
        assert_eq!(repo.history().len(), 1);
    }
}

//! Snapshot storage implementation.

use crate::{CommitId, SnapshotError, SnapshotFile, SnapshotResult};
use quill_util::{atomic_write, TimingGuard};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info, warn};

/// Storage for per-commit file snapshots.
///
/// Snapshots are plain byte copies, one directory per commit:
/// `base_dir/commit_<id>/<filename>`. Filenames may contain `/`, which
/// become nested directories.
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    base_dir: PathBuf,
}

impl SnapshotStore {
    /// Create a snapshot store rooted at `base_dir`, creating it if needed.
    pub async fn new(base_dir: PathBuf) -> SnapshotResult<Self> {
        fs::create_dir_all(&base_dir).await?;
        Ok(Self { base_dir })
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Store one file's content under `(commit_id, filename)`.
    ///
    /// An existing snapshot for the same key is replaced.
    pub async fn put(
        &self,
        commit_id: CommitId,
        filename: &str,
        content: &[u8],
    ) -> SnapshotResult<()> {
        let path = key_path(&self.commit_dir(commit_id), filename)?;
        debug!(commit = %commit_id, filename, bytes = content.len(), "Writing snapshot");
        atomic_write(&path, content).await?;
        Ok(())
    }

    /// Store every file of a commit, all or nothing.
    ///
    /// Files are written into a temporary directory that is renamed into
    /// place once complete. On failure nothing is left behind and any
    /// previous snapshots for `commit_id` are untouched.
    pub async fn put_all(&self, commit_id: CommitId, files: &[SnapshotFile]) -> SnapshotResult<()> {
        let _timing = TimingGuard::new("snapshot", "put_all");
        if files.is_empty() {
            return Err(SnapshotError::operation_failed(format!(
                "no files to snapshot for commit {commit_id}"
            )));
        }

        let staging_dir = self.staging_dir(commit_id);
        let mut targets = Vec::with_capacity(files.len());
        for file in files {
            targets.push(key_path(&staging_dir, &file.filename)?);
        }

        remove_dir_if_exists(&staging_dir).await?;

        let result = self.write_staged(commit_id, files, &targets).await;
        if let Err(e) = &result {
            warn!(commit = %commit_id, error = %e, "Snapshot write failed, discarding partial copy");
            if let Err(cleanup) = remove_dir_if_exists(&staging_dir).await {
                warn!(path = %staging_dir.display(), error = %cleanup, "Failed to remove partial snapshot");
            }
            return result;
        }

        info!(commit = %commit_id, files = files.len(), "Stored commit snapshot");
        Ok(())
    }

    async fn write_staged(
        &self,
        commit_id: CommitId,
        files: &[SnapshotFile],
        targets: &[PathBuf],
    ) -> SnapshotResult<()> {
        let staging_dir = self.staging_dir(commit_id);
        fs::create_dir_all(&staging_dir).await?;

        for (file, target) in files.iter().zip(targets) {
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent).await?;
            }
            fs::write(target, &file.content).await?;
            debug!(commit = %commit_id, filename = %file.filename, "Snapshotted");
        }

        let final_dir = self.commit_dir(commit_id);
        remove_dir_if_exists(&final_dir).await?;
        fs::rename(&staging_dir, &final_dir).await?;
        Ok(())
    }

    /// Read back the bytes stored under `(commit_id, filename)`.
    pub async fn get(&self, commit_id: CommitId, filename: &str) -> SnapshotResult<Vec<u8>> {
        let path = key_path(&self.commit_dir(commit_id), filename)?;
        debug!(path = %path.display(), "Reading snapshot");

        match fs::read(&path).await {
            Ok(content) => Ok(content),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                Err(SnapshotError::missing(commit_id, filename))
            }
            Err(e) => Err(SnapshotError::Io(e)),
        }
    }

    /// Check whether a snapshot exists for the key.
    pub async fn exists(&self, commit_id: CommitId, filename: &str) -> SnapshotResult<bool> {
        let path = key_path(&self.commit_dir(commit_id), filename)?;
        match fs::metadata(&path).await {
            Ok(meta) => Ok(meta.is_file()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(SnapshotError::Io(e)),
        }
    }

    /// List the filenames stored for a commit, sorted.
    ///
    /// A commit with no snapshot directory lists as empty.
    pub async fn list(&self, commit_id: CommitId) -> SnapshotResult<Vec<String>> {
        let root = self.commit_dir(commit_id);
        let mut names = Vec::new();
        let mut pending = vec![(root, String::new())];

        while let Some((dir, prefix)) = pending.pop() {
            let mut entries = match fs::read_dir(&dir).await {
                Ok(entries) => entries,
                Err(e) if e.kind() == ErrorKind::NotFound => continue,
                Err(e) => return Err(SnapshotError::Io(e)),
            };

            while let Some(entry) = entries.next_entry().await? {
                let name = entry.file_name().to_string_lossy().to_string();
                let key = if prefix.is_empty() {
                    name
                } else {
                    format!("{prefix}/{name}")
                };

                if entry.file_type().await?.is_dir() {
                    pending.push((entry.path(), key));
                } else {
                    names.push(key);
                }
            }
        }

        names.sort();
        Ok(names)
    }

    /// Remove every snapshot of a commit. Missing snapshots are not an error.
    pub async fn discard(&self, commit_id: CommitId) -> SnapshotResult<()> {
        remove_dir_if_exists(&self.commit_dir(commit_id)).await?;
        debug!(commit = %commit_id, "Discarded commit snapshot");
        Ok(())
    }

    fn commit_dir(&self, commit_id: CommitId) -> PathBuf {
        self.base_dir.join(commit_id.dir_name())
    }

    fn staging_dir(&self, commit_id: CommitId) -> PathBuf {
        self.base_dir.join(format!("{}.tmp", commit_id.dir_name()))
    }
}

/// Map a filename key onto a path under `dir`, rejecting anything that
/// could escape it.
fn key_path(dir: &Path, filename: &str) -> SnapshotResult<PathBuf> {
    if filename.is_empty() {
        return Err(SnapshotError::invalid_key("filename cannot be empty"));
    }
    if filename.starts_with('/') || filename.contains('\\') {
        return Err(SnapshotError::invalid_key(format!(
            "filename must be a relative '/'-separated path: {filename}"
        )));
    }

    let mut path = dir.to_path_buf();
    for component in filename.split('/') {
        if component.is_empty() || component == "." || component == ".." {
            return Err(SnapshotError::invalid_key(format!(
                "invalid path component in {filename}"
            )));
        }
        path.push(component);
    }
    Ok(path)
}

async fn remove_dir_if_exists(dir: &Path) -> SnapshotResult<()> {
    match fs::remove_dir_all(dir).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(e) => Err(SnapshotError::Io(e)),
    }
}

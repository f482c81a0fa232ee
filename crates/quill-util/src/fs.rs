//! File writes used for repository metadata and restored files.

use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;

/// Write `data` to `path` atomically: write a uniquely named temp file in
/// the same directory, fsync, then rename over the target. Parent
/// directories are created.
///
/// Readers see either the old bytes or the new bytes, never a mix. The
/// temp file is removed if any step fails.
pub async fn atomic_write(path: &Path, data: &[u8]) -> io::Result<()> {
    let path = path.to_path_buf();
    let data = data.to_vec();
    tokio::task::spawn_blocking(move || write_replace(&path, &data))
        .await
        .map_err(io::Error::other)?
}

fn write_replace(path: &Path, data: &[u8]) -> io::Result<()> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    std::fs::create_dir_all(&parent)?;

    let mut tmp = tempfile::Builder::new()
        .prefix(".quill-")
        .suffix(".tmp")
        .tempfile_in(&parent)?;
    tmp.write_all(data)?;
    tmp.as_file().sync_data()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

/// Overwrite the file at `path` in place, creating it (and its parent
/// directories) when missing.
///
/// The existing inode is truncated and rewritten, so its permissions are
/// kept and a symlink is written through to its target.
pub async fn overwrite(path: &Path, data: &[u8]) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).await?;
        }
    }

    let mut file = fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(path)
        .await?;
    file.write_all(data).await?;
    file.sync_data().await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn names_in(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
            .collect();
        names.sort();
        names
    }

    #[tokio::test]
    async fn test_atomic_write_creates_parents() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested/deeper/state.json");

        atomic_write(&path, b"{}").await.unwrap();

        assert_eq!(fs::read(&path).await.unwrap(), b"{}");
        assert_eq!(names_in(&dir.path().join("nested/deeper")), vec!["state.json"]);
    }

    #[tokio::test]
    async fn test_atomic_write_replaces_existing() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("a.bin");
        fs::write(&path, b"old contents").await.unwrap();

        atomic_write(&path, &[0u8, 159, 255]).await.unwrap();

        assert_eq!(fs::read(&path).await.unwrap(), vec![0u8, 159, 255]);
    }

    #[tokio::test]
    async fn test_atomic_write_leaves_neighbours_alone() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("a.txt");
        let neighbour = dir.path().join("a.txt.quill-tmp");
        fs::write(&neighbour, b"user data").await.unwrap();

        atomic_write(&path, b"new").await.unwrap();

        assert_eq!(fs::read(&neighbour).await.unwrap(), b"user data");
        assert_eq!(names_in(dir.path()), vec!["a.txt", "a.txt.quill-tmp"]);
    }

    #[tokio::test]
    async fn test_atomic_write_failure_cleans_up() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("target");
        std::fs::create_dir(&path).unwrap();
        std::fs::write(path.join("inner"), b"x").unwrap();

        assert!(atomic_write(&path, b"data").await.is_err());
        assert_eq!(names_in(dir.path()), vec!["target"]);
    }

    #[tokio::test]
    async fn test_overwrite_creates_and_truncates() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("sub/file.txt");

        overwrite(&path, b"a much longer first version").await.unwrap();
        overwrite(&path, b"short").await.unwrap();

        assert_eq!(fs::read(&path).await.unwrap(), b"short");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_overwrite_keeps_mode_and_symlink() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let real = dir.path().join("real.sh");
        let link = dir.path().join("link.sh");
        std::fs::write(&real, b"old").unwrap();
        std::fs::set_permissions(&real, std::fs::Permissions::from_mode(0o755)).unwrap();
        std::os::unix::fs::symlink(&real, &link).unwrap();

        overwrite(&link, b"new").await.unwrap();

        assert!(std::fs::symlink_metadata(&link).unwrap().file_type().is_symlink());
        assert_eq!(std::fs::read(&real).unwrap(), b"new");
        let mode = std::fs::metadata(&real).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o755);
    }
}

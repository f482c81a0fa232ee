//! Snapshot storage for quill.
//!
//! Every commit owns one directory of byte-exact file copies, addressed by
//! `(commit id, filename)`:
//!
//! ```text
//! snapshot_dir/
//!   commit_1/
//!     a.txt
//!     src/lib.rs
//!   commit_2/
//!     b.txt
//! ```
//!
//! # Example
//!
//! ```no_run
//! use quill_snapshot::{CommitId, SnapshotStore};
//! use std::path::PathBuf;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let store = SnapshotStore::new(PathBuf::from(".quill/snapshots")).await?;
//!
//! store.put(CommitId::FIRST, "a.txt", b"hello").await?;
//! assert_eq!(store.get(CommitId::FIRST, "a.txt").await?, b"hello");
//! # Ok(())
//! # }
//! ```

mod error;
mod snapshot;
mod store;

pub use error::{SnapshotError, SnapshotResult};
pub use snapshot::{CommitId, SnapshotFile};
pub use store::SnapshotStore;

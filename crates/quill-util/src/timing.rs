//! RAII-based timing for repository operations.
//!
//! ```rust,ignore
//! use quill_util::TimingGuard;
//!
//! async fn commit(&mut self, message: &str) -> RepoResult<Commit> {
//!     let _timing = TimingGuard::repo("commit");
//!     // ... duration is logged when _timing is dropped
//! }
//! ```

use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Operations at least this slow are logged at info level.
const INFO_THRESHOLD: Duration = Duration::from_millis(100);
/// Operations at least this slow are logged as slow.
const WARN_THRESHOLD: Duration = Duration::from_secs(5);

/// Logs the elapsed time of an operation when dropped.
pub struct TimingGuard {
    /// Kind of operation, e.g. `repo` or `snapshot`.
    operation_type: &'static str,
    /// Specific operation, e.g. `commit`.
    operation_name: String,
    start: Instant,
}

impl TimingGuard {
    pub fn new(operation_type: &'static str, operation_name: impl Into<String>) -> Self {
        Self {
            operation_type,
            operation_name: operation_name.into(),
            start: Instant::now(),
        }
    }

    /// Guard for a top-level repository operation.
    pub fn repo(name: impl Into<String>) -> Self {
        Self::new("repo", name)
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }
}

impl Drop for TimingGuard {
    fn drop(&mut self) {
        let elapsed = self.start.elapsed();
        let duration_ms = elapsed.as_millis() as u64;

        if elapsed >= WARN_THRESHOLD {
            warn!(
                operation_type = self.operation_type,
                operation_name = %self.operation_name,
                duration_ms,
                "Slow operation completed"
            );
        } else if elapsed >= INFO_THRESHOLD {
            info!(
                operation_type = self.operation_type,
                operation_name = %self.operation_name,
                duration_ms,
                "Operation completed"
            );
        } else {
            debug!(
                operation_type = self.operation_type,
                operation_name = %self.operation_name,
                duration_ms,
                "Operation completed"
            );
        }
    }
}

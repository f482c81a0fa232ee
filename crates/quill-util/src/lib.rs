//! Shared utilities for quill.
//!
//! This crate provides the small pieces every other quill crate leans on:
//! - Logging setup with tracing
//! - RAII-based timing for repository operations
//! - Atomic and in-place file writes

pub mod fs;
pub mod log;
pub mod timing;

pub use fs::{atomic_write, overwrite};
pub use log::{LogConfig, LogLevel};
pub use timing::TimingGuard;

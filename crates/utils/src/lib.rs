//! Shared utilities for nutflow
//!
//! Logging setup, progress throttling and formatting, and atomic file
//! writes used by the disk cache.

pub mod atomic_file;
pub mod progress;
pub mod tracing;

pub use atomic_file::*;
pub use progress::*;

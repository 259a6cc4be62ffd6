//! Error handling for the disk cache
//!
//! Every error carries a [`RecoveryHint`] describing what the caller can do
//! about it. Cache iterators yield these errors per element instead of
//! panicking, and they convert into [`nutflow_core::Error`] at crate
//! boundaries.

mod conversions;
mod display;
mod recovery;
mod types;

pub use types::*;

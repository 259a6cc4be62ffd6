//! Disk cache unit for nutflow
//!
//! ## Key Components
//!
//! - **`disk`**: the [`Cache`] unit, which writes elements on its first
//!   evaluation and replays them afterwards.
//! - **`storage`**: the checksummed entry file format and the completion
//!   manifest.
//! - **`config`**: [`CacheConfig`] with its builder and environment
//!   overrides.
//! - **`errors`**: [`CacheError`] with recovery hints.

pub mod config;
pub mod disk;
pub mod errors;
pub mod storage;

pub use config::{CacheConfig, CacheConfigBuilder, ConfigSource, Storage};
pub use disk::{Cache, Cached, ScopedCache};
pub use errors::{CacheError, RecoveryHint, Result, SerializationOp};

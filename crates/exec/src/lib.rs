//! Concurrent units for nutflow
//!
//! ## Key Components
//!
//! - **`prefetch`**: [`Prefetch`] pulls the upstream on a background thread
//!   through a bounded queue.
//! - **`par_map`**: [`MapPar`] maps chunks of the upstream on a thread pool
//!   and yields results in input order.
//! - **`config`**: worker counts, chunk sizes and thread names, with
//!   environment overrides.

pub mod config;
pub mod par_map;
pub mod prefetch;

pub use config::{ParallelConfig, ParallelConfigBuilder, PrefetchConfig};
pub use par_map::{MapPar, ParMapped};
pub use prefetch::{Prefetch, Prefetched};

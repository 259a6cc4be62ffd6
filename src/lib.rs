//! Chainable lazy sequence processing.
//!
//! A pipeline is an upstream sequence chained into units ("nuts") with
//! [`Chain::then`]. Sources start a pipeline, functions and processors
//! transform it lazily, and sinks consume it:
//!
//! ```
//! use nutflow::prelude::*;
//!
//! let evens: Vec<i64> = Range::new(10)
//!     .then(nut_filter(|x: &i64| x % 2 == 0))
//!     .then(Square)
//!     .then(Collect::new());
//! assert_eq!(evens, vec![0, 4, 16, 36, 64]);
//! ```
//!
//! The member crates are re-exported as modules; [`prelude`] pulls in the
//! protocol and every built-in unit.

pub use nutflow_cache as cache;
pub use nutflow_core as core;
pub use nutflow_exec as exec;
pub use nutflow_iter as iter;
pub use nutflow_nuts as nuts;
pub use nutflow_utils as utils;

pub use nutflow_core::{chain, Chain, Error, Nut, NutKind, Result};

pub mod prelude {
    //! Everything needed to build pipelines
    pub use nutflow_cache::{Cache, CacheConfig, CacheError, ScopedCache};
    pub use nutflow_core::{
        chain, nut_filter, nut_filter_false, nut_filter_false_with, nut_filter_with,
        nut_function, nut_function_with, nut_processor, nut_processor_with, nut_sink,
        nut_sink_with, nut_source, nut_source_with, Chain, Error, Nut, NutKind, Result, Seq,
    };
    pub use nutflow_exec::{MapPar, ParallelConfig, Prefetch, PrefetchConfig};
    pub use nutflow_iter::Nested;
    pub use nutflow_nuts::*;
}

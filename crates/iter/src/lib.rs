//! Lazy sequence algorithms for nutflow
//!
//! Every algorithm here is a plain iterator adapter: it pulls from its
//! upstream only when asked for the next element. The nut wrappers in
//! `nutflow-nuts` validate parameters and delegate to these adapters.

pub mod chunk;
pub mod dedupe;
pub mod flatten;
pub mod group;
pub mod interleave;
pub mod shuffle;
pub mod tee;
pub mod window;

pub use chunk::*;
pub use dedupe::*;
pub use flatten::*;
pub use group::*;
pub use interleave::*;
pub use shuffle::*;
pub use tee::*;
pub use window::*;

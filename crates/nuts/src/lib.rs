//! Built-in units for nutflow
//!
//! ## Key Components
//!
//! - **`source`**: restartable sources (`Range`, `Enumerate`, `Repeat`,
//!   `Product`, `Empty`) that refuse an upstream.
//! - **`function`**: element-wise units, including the thread-safe
//!   `Counter` and the throttled `Print`.
//! - **`processor`**: sequence-to-sequence units, from `Take` and `Chunk`
//!   to the stateful `Shuffle`, `GroupBySorted` and `PrintProgress`.
//! - **`sink`**: terminal units such as `Collect`, `Count` and `Reduce`.
//! - **`try_map`**: the `Try` unit with its `OnError` recovery policies.
//!
//! Units that take closures keep them behind shared handles, so a unit is
//! built once and can be chained into any number of pipelines.

pub mod callback;
pub mod function;
pub mod processor;
pub mod sink;
pub mod source;
pub mod try_map;

pub use callback::{Key, Mapper, RngSource};
pub use function::*;
pub use processor::*;
pub use sink::*;
pub use source::*;
pub use try_map::{Channel, OnError, Try, Tried};

//! Built-in processors: units that turn the upstream into a new lazy
//! sequence (or a fixed set of sequences for fan-out units).

pub mod combine;
pub mod progress;
pub mod reshape;
pub mod select;

pub use combine::*;
pub use progress::*;
pub use reshape::*;
pub use select::*;

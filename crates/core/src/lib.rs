//! Core protocol, construction factory and errors for `nutflow`.
//!
//! ## Key Components
//!
//! - **`errors`**: the `Error` enum and `Result` alias shared by every crate
//!   in the workspace, separating construction errors, usage-contract
//!   violations and resource faults.
//! - **`nut`**: the `Nut` trait, the closed `NutKind` set and the `Chain`
//!   extension that composes units left to right.
//! - **`factory`**: constructors that turn plain closures into sources,
//!   functions, processors, sinks and filters.

pub mod errors;
pub mod factory;
pub mod nut;

pub use self::{
    errors::{Error, Result, ResultExt},
    factory::*,
    nut::{chain, Chain, Mapped, Nut, NutKind, Seq},
};

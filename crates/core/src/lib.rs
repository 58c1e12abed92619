//! abstraction-core
//!
//! Core library for attributing abstraction levels to functions in a codebase.
//!
//! This crate turns normalized function records into a directed call graph,
//! answers structural queries over it (entry points, call paths, abstraction
//! depth), detects content drift against a recorded baseline, and models the
//! per-function behavioral contracts that drift can invalidate.
//!
//! All substantive logic lives here so it is fully testable and reusable from
//! multiple frontends; the CLI crate is a thin wrapper.

pub mod changes;
pub mod contract;
pub mod db;
pub mod error;
pub mod graph;
pub mod key;
pub mod model;
#[cfg(feature = "tree-sitter-parser")]
pub mod parser;

pub use error::{CoreError, CoreResult};

/// Returns the library version as encoded at compile time.
///
/// Useful for tests and for frontends to report consistent version info.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

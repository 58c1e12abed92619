//! Call graph construction and navigation.
//!
//! Nodes live in an insertion-ordered arena with a by-name index, so edge
//! resolution and every query iterate in a stable order regardless of how the
//! hash maps underneath are laid out.

pub mod builder;
pub mod query;
pub mod snapshot;
pub mod types;

pub use builder::{build_call_graph, CallGraphBuilder, ResolutionPolicy};
pub use query::{
    abstraction_depth, classify_depth, depth_map, descendants, entry_points,
    longest_simple_path, shortest_path, Depth,
};
pub use snapshot::{GraphSnapshot, NodeSnapshot};
pub use types::{CallGraph, CallGraphNode, CallGraphStats};

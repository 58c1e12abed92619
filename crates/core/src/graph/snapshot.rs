//! Serializable form of a call graph, used by the storage layer.
//!
//! Shape: `{"nodes": {identifier: {function_name, file_path, line_number,
//! callers: [..], callees: [..]}}}`. Nodes are written in insertion order
//! and reloaded in file order, so name resolution and entry point listing
//! behave the same before and after a save.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::CoreResult;
use crate::graph::types::{CallGraph, CallGraphNode};
use crate::key::{make_key, KEY_SEPARATOR};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeSnapshot {
    pub function_name: String,
    pub file_path: String,
    pub line_number: u32,
    #[serde(default)]
    pub callers: Vec<String>,
    #[serde(default)]
    pub callees: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphSnapshot {
    #[serde(default)]
    pub nodes: IndexMap<String, NodeSnapshot>,
}

impl CallGraph {
    pub fn to_snapshot(&self) -> GraphSnapshot {
        let nodes = self
            .iter()
            .map(|(key, node)| {
                (
                    key.to_string(),
                    NodeSnapshot {
                        function_name: node.function_name.clone(),
                        file_path: node.file_path.clone(),
                        line_number: node.line_number,
                        callers: node.callers.iter().cloned().collect(),
                        callees: node.callees.iter().cloned().collect(),
                    },
                )
            })
            .collect();
        GraphSnapshot { nodes }
    }

    /// Rebuild a graph from a snapshot.
    ///
    /// Stored keys without the separator are re-derived from the node's file
    /// and name. Edges are re-added from both the `callers` and `callees`
    /// lists when both endpoints exist; dangling references are dropped. The
    /// symmetry invariant is checked before returning.
    pub fn from_snapshot(snapshot: &GraphSnapshot) -> CoreResult<CallGraph> {
        let mut graph = CallGraph::new();
        let mut keyed = Vec::with_capacity(snapshot.nodes.len());

        for (stored_key, data) in &snapshot.nodes {
            let key = if stored_key.contains(KEY_SEPARATOR) {
                stored_key.clone()
            } else {
                make_key(&data.function_name, &data.file_path)?
            };
            graph.insert_node(key.clone(), data.line_number, || {
                CallGraphNode::new(&data.function_name, &data.file_path, data.line_number)
            });
            keyed.push((key, data));
        }

        let mut dropped = 0usize;
        for (key, data) in &keyed {
            for callee in &data.callees {
                if graph.contains(callee) {
                    graph.add_edge(key, callee)?;
                } else {
                    dropped += 1;
                }
            }
            for caller in &data.callers {
                if graph.contains(caller) {
                    graph.add_edge(caller, key)?;
                } else {
                    dropped += 1;
                }
            }
        }
        if dropped > 0 {
            warn!(dropped, "dropped call graph edges with missing endpoints");
        }

        graph.validate()?;
        Ok(graph)
    }
}

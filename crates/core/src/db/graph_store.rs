use std::fs;

use anyhow::{Context, Result};

use crate::db::ProjectLayout;
use crate::graph::{CallGraph, GraphSnapshot};

/// Write the call graph to `.abstraction/call_graph.json`.
pub fn save_call_graph(layout: &ProjectLayout, graph: &CallGraph) -> Result<()> {
    let json = serde_json::to_string_pretty(&graph.to_snapshot())
        .context("Failed to serialize call graph")?;
    fs::write(&layout.graph_path, json).with_context(|| {
        format!("Failed to write call graph to {}", layout.graph_path.display())
    })?;
    Ok(())
}

/// Load the persisted call graph, or `None` if the project was never indexed
/// (missing or empty file).
pub fn load_call_graph(layout: &ProjectLayout) -> Result<Option<CallGraph>> {
    if !layout.graph_path.exists() {
        return Ok(None);
    }
    let body = fs::read_to_string(&layout.graph_path).with_context(|| {
        format!("Failed to read call graph at {}", layout.graph_path.display())
    })?;
    if body.trim().is_empty() {
        return Ok(None);
    }
    let snapshot: GraphSnapshot =
        serde_json::from_str(&body).context("Failed to parse call graph JSON")?;
    let graph = CallGraph::from_snapshot(&snapshot).with_context(|| {
        format!("Call graph at {} is inconsistent", layout.graph_path.display())
    })?;
    Ok(Some(graph))
}

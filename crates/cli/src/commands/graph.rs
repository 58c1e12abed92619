use std::collections::HashSet;
use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use abstraction_core::db::ProjectContext;
use abstraction_core::graph::{entry_points, CallGraph};
use anyhow::{Context, Result};

use crate::canonicalize_or_current;
use crate::commands::resolve_function;

/// Render the call tree below `root_key` as indented `- name` lines.
///
/// A function is printed at most once, so call cycles terminate; nodes at
/// `max_depth` and below are omitted.
pub fn render_text_tree(graph: &CallGraph, root_key: &str, max_depth: usize) -> String {
    let mut lines = Vec::new();
    let mut visited = HashSet::new();
    let mut stack = vec![(root_key.to_string(), 0usize)];

    while let Some((key, depth)) = stack.pop() {
        if depth >= max_depth || !visited.insert(key.clone()) {
            continue;
        }
        let Some(node) = graph.node(&key) else {
            continue;
        };
        lines.push(format!("{}- {}", "  ".repeat(depth), node.function_name));
        for callee in node.callees.iter().rev() {
            if !visited.contains(callee) {
                stack.push((callee.clone(), depth + 1));
            }
        }
    }

    lines.join("\n")
}

/// Graphviz DOT rendering: one node per identifier labelled with its name.
pub fn render_dot(graph: &CallGraph) -> String {
    let mut out = String::from("digraph call_graph {\n    rankdir=LR;\n");
    for (key, node) in graph.iter() {
        let _ = writeln!(
            out,
            "    \"{}\" [label=\"{}\"];",
            escape_dot(key),
            escape_dot(&node.function_name)
        );
    }
    for (key, node) in graph.iter() {
        for callee in &node.callees {
            let _ = writeln!(out, "    \"{}\" -> \"{}\";", escape_dot(key), escape_dot(callee));
        }
    }
    out.push_str("}\n");
    out
}

fn escape_dot(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}

/// Print statistics, entry points and a call tree for the indexed project.
pub fn graph_command(
    root: &str,
    entry: Option<String>,
    max_depth: usize,
    json: bool,
    dot: Option<String>,
) -> Result<()> {
    let root_path = canonicalize_or_current(root)?;
    let graph = ProjectContext::from_root(&root_path)?.require_call_graph()?;

    if let Some(dot_path) = dot {
        let path = Path::new(&dot_path);
        fs::write(path, render_dot(&graph))
            .with_context(|| format!("Failed to write DOT graph to {}", path.display()))?;
        if !json {
            println!("Wrote DOT graph to {}", path.display());
        }
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&graph.to_snapshot())?);
        return Ok(());
    }

    let stats = graph.stats();
    println!("Call Graph Statistics");
    println!("=====================");
    println!("Total functions: {}", stats.functions);
    println!("Total calls: {}", stats.calls);
    println!("Entry points: {}", stats.entry_points);
    println!("Average calls per function: {:.2}", stats.average_calls_per_function);

    if graph.is_empty() {
        println!();
        println!("The call graph is empty.");
        return Ok(());
    }

    let entries = entry_points(&graph);
    let names: Vec<&str> = entries
        .iter()
        .filter_map(|key| graph.node(key))
        .map(|node| node.function_name.as_str())
        .collect();
    println!();
    if names.is_empty() {
        println!("No entry points found (every function has a caller).");
    } else {
        println!("Entry point names: {}", names.join(", "));
    }

    let tree_root = match entry {
        Some(name) => resolve_function(&graph, &name, None)?,
        None => match entries.first() {
            Some(first) => first.clone(),
            None => graph.keys().next().map(str::to_string).unwrap_or_default(),
        },
    };
    let root_name = graph.node(&tree_root).map(|n| n.function_name.as_str()).unwrap_or_default();

    println!();
    println!("Call tree from '{}':", root_name);
    println!("{}", render_text_tree(&graph, &tree_root, max_depth));
    if entries.len() > 1 {
        println!();
        println!("{} entry points found; use --entry NAME to view another.", entries.len());
    }

    Ok(())
}

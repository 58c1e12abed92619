use abstraction_core::db::ProjectContext;
use abstraction_core::graph::{
    classify_depth, descendants, longest_simple_path, shortest_path, Depth,
};
use anyhow::{Context, Result};
use serde::Serialize;

use crate::canonicalize_or_current;
use crate::commands::resolve_function;

#[derive(Debug, Serialize)]
pub struct FunctionReport {
    pub key: String,
    pub name: String,
    pub file_path: String,
    pub line_number: u32,
    pub depth: Depth,
    pub abstraction_depth: usize,
    pub callers: Vec<String>,
    pub callees: Vec<String>,
    pub descendant_count: usize,
    pub longest_chain: Vec<String>,
    pub has_contract: bool,
}

/// Describe one function's position in the call graph.
pub fn show_function_command(
    root: &str,
    name: &str,
    file: Option<String>,
    json: bool,
) -> Result<()> {
    let root_path = canonicalize_or_current(root)?;
    let ctx = ProjectContext::from_root(&root_path)?;
    let graph = ctx.require_call_graph()?;

    let key = resolve_function(&graph, name, file.as_deref())?;
    let node = graph.require(&key)?;
    let depth = classify_depth(&graph, &key)?;
    let longest_chain: Vec<String> =
        longest_simple_path(&graph, &key, ctx.config.index.max_path_depth)?
            .iter()
            .filter_map(|k| graph.node(k))
            .map(|n| n.function_name.clone())
            .collect();
    let has_contract = ctx
        .db
        .get_contract(&node.function_name, &node.file_path)
        .context("Failed to look up contract")?
        .is_some();

    let report = FunctionReport {
        key: key.clone(),
        name: node.function_name.clone(),
        file_path: node.file_path.clone(),
        line_number: node.line_number,
        depth,
        abstraction_depth: depth.value(),
        callers: graph.callers_of(&key)?,
        callees: graph.callees_of(&key)?,
        descendant_count: descendants(&graph, &key)?.len(),
        longest_chain,
        has_contract,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    let depth_label = match report.depth {
        Depth::EntryPoint => "entry point".to_string(),
        Depth::Reachable(n) => format!("{n} call(s) below an entry point"),
        Depth::Unreachable => "unreachable from any entry point".to_string(),
    };
    println!("Function: {}", report.name);
    println!("  Identifier: {}", report.key);
    println!("  Location: {}:{}", report.file_path, report.line_number);
    println!("  Abstraction depth: {} ({})", report.abstraction_depth, depth_label);
    println!("  Callers: {}", list_or_none(&report.callers));
    println!("  Callees: {}", list_or_none(&report.callees));
    println!("  Descendants: {}", report.descendant_count);
    println!("  Longest call chain: {}", report.longest_chain.join(" -> "));
    println!("  Contract: {}", if report.has_contract { "yes" } else { "no" });

    Ok(())
}

/// Print the shortest call path between two functions.
pub fn call_path_command(root: &str, from: &str, to: &str) -> Result<()> {
    let root_path = canonicalize_or_current(root)?;
    let ctx = ProjectContext::from_root(&root_path)?;
    let graph = ctx.require_call_graph()?;

    let start = resolve_function(&graph, from, None)?;
    let end = resolve_function(&graph, to, None)?;

    match shortest_path(&graph, &start, &end)? {
        Some(path) => {
            let names: Vec<&str> = path
                .iter()
                .filter_map(|k| graph.node(k))
                .map(|n| n.function_name.as_str())
                .collect();
            println!("Call path ({} call(s)):", path.len() - 1);
            println!("  {}", names.join(" -> "));
            for key in &path {
                println!("  - {key}");
            }
        }
        None => println!("No call path from '{from}' to '{to}'."),
    }

    Ok(())
}

fn list_or_none(names: &[String]) -> String {
    if names.is_empty() {
        "(none)".to_string()
    } else {
        names.join(", ")
    }
}

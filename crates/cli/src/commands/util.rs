use std::path::Path;

use abstraction_core::db::ProjectContext;
use abstraction_core::graph::CallGraph;
use abstraction_core::model::FunctionRecord;
use abstraction_core::parser::collect_functions;
use anyhow::{anyhow, bail, Context, Result};
use tracing::warn;

/// Helper to print whether a directory exists.
pub fn print_dir_status(label: &str, path: &Path) {
    let exists = path.is_dir();
    println!("- {label}: {} ({})", if exists { "OK" } else { "MISSING" }, path.display());
}

/// Extract function records from the source tree, labelled relative to the root.
pub fn collect_project_functions(
    ctx: &ProjectContext,
    source_dir: &Path,
) -> Result<Vec<FunctionRecord>> {
    if !source_dir.is_dir() {
        bail!("Source directory does not exist: {}", source_dir.display());
    }
    collect_functions(source_dir, &ctx.layout.root, &ctx.config.index)
        .with_context(|| format!("Failed to extract functions from {}", source_dir.display()))
}

/// Resolve a bare function name (optionally narrowed to one file) to its
/// identifier. Ambiguous names resolve to the first indexed match.
pub fn resolve_function(graph: &CallGraph, name: &str, file: Option<&str>) -> Result<String> {
    let candidates = graph.find_by_name(name);
    let matching: Vec<&str> = match file {
        Some(file) => candidates
            .into_iter()
            .filter(|key| graph.node(key).is_some_and(|node| node.file_path == file))
            .collect(),
        None => candidates,
    };

    match matching.as_slice() {
        [] => match file {
            Some(file) => Err(anyhow!("Function '{name}' not found in {file}")),
            None => Err(anyhow!("Function '{name}' not found in the call graph")),
        },
        [only] => Ok(only.to_string()),
        [first, rest @ ..] => {
            warn!(
                function = name,
                chosen = *first,
                others = rest.len(),
                "function name is ambiguous"
            );
            Ok(first.to_string())
        }
    }
}

/// Current UTC time as an RFC 3339 string.
pub fn now_rfc3339() -> String {
    chrono::Utc::now().to_rfc3339()
}

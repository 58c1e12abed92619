use abstraction_core::changes::ChangeDetector;
use abstraction_core::db::{save_call_graph, IndexRunRecord, ProjectContext};
use abstraction_core::graph::CallGraphBuilder;
use anyhow::{Context, Result};
use tracing::info;

use crate::canonicalize_or_current;
use crate::commands::{collect_project_functions, now_rfc3339};

/// Index the source tree: build and save the call graph, then replace the
/// change baseline.
pub fn index_command(root: &str, source: Option<String>) -> Result<()> {
    let root_path = canonicalize_or_current(root)?;
    let ctx = ProjectContext::from_root(&root_path)?;
    let source_dir = ctx.source_dir(source.as_deref());

    let records = collect_project_functions(&ctx, &source_dir)?;
    let graph = CallGraphBuilder::with_policy(ctx.config.index.resolution)
        .build(&records)
        .context("Failed to build call graph")?;
    save_call_graph(&ctx.layout, &graph)?;

    let mut detector = ChangeDetector::new();
    detector.record_baseline(&records).context("Failed to record baseline")?;
    ctx.db.save_baseline(detector.baseline()).context("Failed to persist baseline")?;

    let run = IndexRunRecord {
        source_dir: source_dir.display().to_string(),
        function_count: records.len(),
        node_count: graph.len(),
        edge_count: graph.edge_count(),
        indexed_at: now_rfc3339(),
    };
    ctx.db.insert_index_run(&run).context("Failed to record index run")?;
    info!(functions = run.function_count, edges = run.edge_count, "indexed project");

    println!("Indexed {}:", source_dir.display());
    println!("  Functions: {}", run.function_count);
    println!("  Graph nodes: {}", run.node_count);
    println!("  Graph edges: {}", run.edge_count);
    println!("  Baseline entries: {}", detector.baseline().len());
    println!("  Call graph: {}", ctx.layout.graph_path.display());

    Ok(())
}

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::CoreResult;
use crate::graph::types::CallGraph;
use crate::model::FunctionRecord;

/// How a called name is resolved when several indexed functions share it.
///
/// Resolution is by bare name only; calls through imports, aliases or dynamic
/// dispatch are not followed. Both policies are deterministic because the
/// candidates are kept in insertion order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionPolicy {
    /// Prefer a function with that name in the caller's own file, else the
    /// first-inserted one.
    #[default]
    PreferSameFile,
    /// Always take the first-inserted function with that name.
    FirstInserted,
}

/// Builds call graphs from extracted function records.
#[derive(Debug, Clone, Copy, Default)]
pub struct CallGraphBuilder {
    policy: ResolutionPolicy,
}

impl CallGraphBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_policy(policy: ResolutionPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> ResolutionPolicy {
        self.policy
    }

    /// Build a fresh graph.
    ///
    /// Pass one inserts a node per distinct identifier (duplicates keep the
    /// smaller line). Pass two resolves every called name against the node
    /// table; names with no indexed function are dropped silently. Edge
    /// resolution never creates nodes.
    pub fn build(&self, records: &[FunctionRecord]) -> CoreResult<CallGraph> {
        let mut graph = CallGraph::new();
        for record in records {
            graph.add_function(record)?;
        }

        let mut unresolved = 0usize;
        let mut ambiguous = 0usize;
        for record in records {
            let caller = graph.slot(&record.key()?)?;
            for called in &record.calls {
                let candidates = graph.slots_named(called);
                if candidates.len() > 1 {
                    ambiguous += 1;
                }
                match self.pick(&graph, candidates, &record.file_path) {
                    Some(callee) => graph.link(caller, callee),
                    None => unresolved += 1,
                }
            }
        }

        debug!(
            nodes = graph.len(),
            edges = graph.edge_count(),
            unresolved,
            ambiguous,
            policy = ?self.policy,
            "built call graph"
        );
        Ok(graph)
    }

    fn pick(&self, graph: &CallGraph, candidates: &[usize], caller_file: &str) -> Option<usize> {
        let first = candidates.first().copied()?;
        match self.policy {
            ResolutionPolicy::FirstInserted => Some(first),
            ResolutionPolicy::PreferSameFile => candidates
                .iter()
                .copied()
                .find(|&idx| graph.node_at(idx).file_path == caller_file)
                .or(Some(first)),
        }
    }
}

/// Build a call graph with the default resolution policy.
pub fn build_call_graph(records: &[FunctionRecord]) -> CoreResult<CallGraph> {
    CallGraphBuilder::new().build(records)
}

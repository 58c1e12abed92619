//! Pure queries over a built call graph.
//!
//! Traversals use explicit work stacks/queues and visited sets, so deep or
//! cyclic graphs cannot exhaust the call stack.

use std::collections::{BTreeMap, BTreeSet, VecDeque};

use serde::{Deserialize, Serialize};

use crate::error::CoreResult;
use crate::graph::types::CallGraph;

/// Where a function sits relative to the graph's entry points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "depth")]
pub enum Depth {
    /// No callers (or the graph has no entry points at all).
    EntryPoint,
    /// Minimum number of calls from some entry point.
    Reachable(usize),
    /// Has callers, but none of them descend from an entry point (e.g. a
    /// closed call cycle).
    Unreachable,
}

impl Depth {
    /// Integer abstraction depth; `Unreachable` collapses to 0.
    pub fn value(self) -> usize {
        match self {
            Depth::EntryPoint | Depth::Unreachable => 0,
            Depth::Reachable(n) => n,
        }
    }
}

/// Every node without callers, in insertion order.
pub fn entry_points(graph: &CallGraph) -> Vec<String> {
    graph
        .iter()
        .filter(|(_, node)| node.callers.is_empty())
        .map(|(key, _)| key.to_string())
        .collect()
}

/// Unweighted shortest call path from `start` to `end`, both inclusive.
///
/// Returns `None` when `end` is unreachable; `[start]` when they are equal.
pub fn shortest_path(graph: &CallGraph, start: &str, end: &str) -> CoreResult<Option<Vec<String>>> {
    let from = graph.slot(start)?;
    let to = graph.slot(end)?;

    let mut parent: Vec<Option<usize>> = vec![None; graph.len()];
    let mut seen = vec![false; graph.len()];
    let mut queue = VecDeque::new();
    seen[from] = true;
    queue.push_back(from);

    while let Some(current) = queue.pop_front() {
        if current == to {
            let mut path = vec![graph.key_at(to).to_string()];
            let mut cursor = to;
            while let Some(prev) = parent[cursor] {
                path.push(graph.key_at(prev).to_string());
                cursor = prev;
            }
            path.reverse();
            return Ok(Some(path));
        }
        for next in graph.callee_slots(current) {
            if !seen[next] {
                seen[next] = true;
                parent[next] = Some(current);
                queue.push_back(next);
            }
        }
    }

    Ok(None)
}

/// Depth of every node, from one multi-source BFS seeded with all entry points.
pub fn depth_map(graph: &CallGraph) -> BTreeMap<String, Depth> {
    let mut distance: Vec<Option<usize>> = vec![None; graph.len()];
    let mut queue = VecDeque::new();
    for idx in 0..graph.len() {
        if graph.node_at(idx).callers.is_empty() {
            distance[idx] = Some(0);
            queue.push_back(idx);
        }
    }
    let has_entries = !queue.is_empty();

    while let Some(current) = queue.pop_front() {
        let next_distance = distance[current].unwrap_or(0) + 1;
        for next in graph.callee_slots(current) {
            if distance[next].is_none() {
                distance[next] = Some(next_distance);
                queue.push_back(next);
            }
        }
    }

    distance
        .into_iter()
        .enumerate()
        .map(|(idx, dist)| {
            let depth = match dist {
                _ if !has_entries => Depth::EntryPoint,
                Some(0) => Depth::EntryPoint,
                Some(n) => Depth::Reachable(n),
                None => Depth::Unreachable,
            };
            (graph.key_at(idx).to_string(), depth)
        })
        .collect()
}

/// Classify the depth of one function.
pub fn classify_depth(graph: &CallGraph, key: &str) -> CoreResult<Depth> {
    let target = graph.slot(key)?;
    if graph.node_at(target).callers.is_empty() {
        return Ok(Depth::EntryPoint);
    }

    let mut distance: Vec<Option<usize>> = vec![None; graph.len()];
    let mut queue = VecDeque::new();
    for idx in 0..graph.len() {
        if graph.node_at(idx).callers.is_empty() {
            distance[idx] = Some(0);
            queue.push_back(idx);
        }
    }
    if queue.is_empty() {
        return Ok(Depth::EntryPoint);
    }

    while let Some(current) = queue.pop_front() {
        let next_distance = distance[current].unwrap_or(0) + 1;
        for next in graph.callee_slots(current) {
            if distance[next].is_some() {
                continue;
            }
            if next == target {
                return Ok(Depth::Reachable(next_distance));
            }
            distance[next] = Some(next_distance);
            queue.push_back(next);
        }
    }

    Ok(Depth::Unreachable)
}

/// Minimum call distance from any entry point.
///
/// 0 for entry points, for graphs without entry points, and for functions no
/// entry point reaches; use [`classify_depth`] to tell those apart.
pub fn abstraction_depth(graph: &CallGraph, key: &str) -> CoreResult<usize> {
    classify_depth(graph, key).map(Depth::value)
}

/// Every function reachable from `key` through one or more calls.
///
/// `key` itself is included only when it sits on a call cycle.
pub fn descendants(graph: &CallGraph, key: &str) -> CoreResult<BTreeSet<String>> {
    let start = graph.slot(key)?;
    let mut visited = vec![false; graph.len()];
    let mut stack = graph.callee_slots(start);
    let mut found = BTreeSet::new();

    while let Some(current) = stack.pop() {
        if visited[current] {
            continue;
        }
        visited[current] = true;
        found.insert(graph.key_at(current).to_string());
        stack.extend(graph.callee_slots(current).into_iter().filter(|&n| !visited[n]));
    }

    Ok(found)
}

/// Longest simple call chain starting at `start`.
///
/// Enumerates simple paths depth-first, so the worst case is exponential in
/// dense graphs. `max_edges` caps the chain length; ties keep the first path
/// found in identifier order.
pub fn longest_simple_path(
    graph: &CallGraph,
    start: &str,
    max_edges: Option<usize>,
) -> CoreResult<Vec<String>> {
    let root = graph.slot(start)?;
    let mut on_path = vec![false; graph.len()];
    let mut path = vec![root];
    let mut longest = path.clone();
    let mut frames = vec![graph.callee_slots(root).into_iter()];
    on_path[root] = true;

    loop {
        let step = match frames.last_mut() {
            Some(pending) => pending.next(),
            None => break,
        };
        match step {
            Some(next) => {
                let at_limit = max_edges.is_some_and(|limit| path.len() > limit);
                if on_path[next] || at_limit {
                    continue;
                }
                on_path[next] = true;
                path.push(next);
                if path.len() > longest.len() {
                    longest = path.clone();
                }
                frames.push(graph.callee_slots(next).into_iter());
            }
            None => {
                frames.pop();
                if let Some(done) = path.pop() {
                    on_path[done] = false;
                }
            }
        }
    }

    Ok(longest.into_iter().map(|idx| graph.key_at(idx).to_string()).collect())
}

use std::collections::{BTreeSet, HashMap};

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};
use crate::model::FunctionRecord;

/// A function in the call graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallGraphNode {
    pub function_name: String,
    pub file_path: String,
    /// Smallest start line reported for this identifier.
    pub line_number: u32,
    pub callers: BTreeSet<String>,
    pub callees: BTreeSet<String>,
}

impl CallGraphNode {
    pub fn new(function_name: impl Into<String>, file_path: impl Into<String>, line: u32) -> Self {
        Self {
            function_name: function_name.into(),
            file_path: file_path.into(),
            line_number: line,
            callers: BTreeSet::new(),
            callees: BTreeSet::new(),
        }
    }
}

/// Summary counts for reporting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallGraphStats {
    pub functions: usize,
    pub calls: usize,
    pub entry_points: usize,
    pub average_calls_per_function: f64,
}

/// Directed call graph keyed by function identifier.
///
/// Invariant: `b ∈ node(a).callees` iff `a ∈ node(b).callers`. Every mutation
/// goes through [`CallGraph::add_edge`], which updates both sides.
#[derive(Debug, Clone, Default)]
pub struct CallGraph {
    keys: Vec<String>,
    nodes: Vec<CallGraphNode>,
    index: HashMap<String, usize>,
    by_name: HashMap<String, Vec<usize>>,
}

impl CallGraph {
    /// Create an empty call graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of functions (nodes).
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Number of directed call edges.
    pub fn edge_count(&self) -> usize {
        self.nodes.iter().map(|n| n.callees.len()).sum()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.index.contains_key(key)
    }

    pub fn node(&self, key: &str) -> Option<&CallGraphNode> {
        self.index.get(key).map(|&idx| &self.nodes[idx])
    }

    /// Look up a node, failing with `NotFound` when absent.
    pub fn require(&self, key: &str) -> CoreResult<&CallGraphNode> {
        self.node(key).ok_or_else(|| not_in_graph(key))
    }

    /// Identifiers in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.keys.iter().map(String::as_str)
    }

    /// `(identifier, node)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &CallGraphNode)> {
        self.keys.iter().map(String::as_str).zip(self.nodes.iter())
    }

    /// All identifiers whose bare name is `name`, in insertion order.
    pub fn find_by_name(&self, name: &str) -> Vec<&str> {
        self.by_name
            .get(name)
            .map(|slots| slots.iter().map(|&idx| self.keys[idx].as_str()).collect())
            .unwrap_or_default()
    }

    /// Add a function node, or reconcile a duplicate report of the same
    /// identifier by keeping the smaller line number. Returns the identifier.
    pub fn add_function(&mut self, record: &FunctionRecord) -> CoreResult<String> {
        let key = record.key()?;
        if record.start_line == 0 {
            return Err(CoreError::InvalidInput(format!("'{key}' has line number 0")));
        }
        self.insert_node(key.clone(), record.start_line, || {
            CallGraphNode::new(&record.name, &record.file_path, record.start_line)
        });
        Ok(key)
    }

    pub(crate) fn insert_node(
        &mut self,
        key: String,
        line: u32,
        make: impl FnOnce() -> CallGraphNode,
    ) -> usize {
        if let Some(&idx) = self.index.get(&key) {
            let node = &mut self.nodes[idx];
            node.line_number = node.line_number.min(line);
            return idx;
        }
        let node = make();
        let idx = self.nodes.len();
        self.by_name.entry(node.function_name.clone()).or_default().push(idx);
        self.index.insert(key.clone(), idx);
        self.keys.push(key);
        self.nodes.push(node);
        idx
    }

    /// Add a directed edge `caller -> callee`. Adding an existing edge is a no-op.
    pub fn add_edge(&mut self, caller: &str, callee: &str) -> CoreResult<()> {
        let from = self.slot(caller)?;
        let to = self.slot(callee)?;
        self.link(from, to);
        Ok(())
    }

    pub(crate) fn link(&mut self, from: usize, to: usize) {
        let caller_key = self.keys[from].clone();
        let callee_key = self.keys[to].clone();
        self.nodes[from].callees.insert(callee_key);
        self.nodes[to].callers.insert(caller_key);
    }

    pub(crate) fn slot(&self, key: &str) -> CoreResult<usize> {
        self.index.get(key).copied().ok_or_else(|| not_in_graph(key))
    }

    pub(crate) fn slots_named(&self, name: &str) -> &[usize] {
        self.by_name.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    pub(crate) fn node_at(&self, idx: usize) -> &CallGraphNode {
        &self.nodes[idx]
    }

    pub(crate) fn key_at(&self, idx: usize) -> &str {
        &self.keys[idx]
    }

    /// Callee slots of a node, in identifier order.
    pub(crate) fn callee_slots(&self, idx: usize) -> Vec<usize> {
        self.nodes[idx].callees.iter().filter_map(|k| self.index.get(k).copied()).collect()
    }

    /// Check the caller/callee symmetry invariant and that every edge endpoint
    /// is a node.
    pub fn validate(&self) -> CoreResult<()> {
        for (key, node) in self.iter() {
            for callee in &node.callees {
                let other = self.node(callee).ok_or_else(|| {
                    CoreError::InvalidInput(format!("edge {key} -> {callee} has no target node"))
                })?;
                if !other.callers.contains(key) {
                    return Err(CoreError::InvalidInput(format!(
                        "edge {key} -> {callee} missing from {callee} callers"
                    )));
                }
            }
            for caller in &node.callers {
                let other = self.node(caller).ok_or_else(|| {
                    CoreError::InvalidInput(format!("edge {caller} -> {key} has no source node"))
                })?;
                if !other.callees.contains(key) {
                    return Err(CoreError::InvalidInput(format!(
                        "edge {caller} -> {key} missing from {caller} callees"
                    )));
                }
            }
        }
        Ok(())
    }

    /// Bare names of the functions calling `key`.
    pub fn callers_of(&self, key: &str) -> CoreResult<Vec<String>> {
        let node = self.require(key)?;
        Ok(self.names_of(&node.callers))
    }

    /// Bare names of the functions called by `key`.
    pub fn callees_of(&self, key: &str) -> CoreResult<Vec<String>> {
        let node = self.require(key)?;
        Ok(self.names_of(&node.callees))
    }

    fn names_of(&self, keys: &BTreeSet<String>) -> Vec<String> {
        keys.iter().filter_map(|k| self.node(k)).map(|n| n.function_name.clone()).collect()
    }

    pub fn stats(&self) -> CallGraphStats {
        let functions = self.len();
        let calls = self.edge_count();
        let entry_points = self.nodes.iter().filter(|n| n.callers.is_empty()).count();
        let average_calls_per_function =
            if functions == 0 { 0.0 } else { calls as f64 / functions as f64 };
        CallGraphStats { functions, calls, entry_points, average_calls_per_function }
    }
}

fn not_in_graph(key: &str) -> CoreError {
    CoreError::NotFound(format!("function '{key}' is not in the call graph"))
}

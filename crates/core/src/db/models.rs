use serde::{Deserialize, Serialize};

use crate::contract::FunctionContract;

/// Bookkeeping row written after every `index` run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexRunRecord {
    pub source_dir: String,
    pub function_count: usize,
    pub node_count: usize,
    pub edge_count: usize,
    pub indexed_at: String,
}

/// A high-level snapshot of project metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectSnapshot {
    pub config: crate::db::ProjectConfig,
    pub contracts: Vec<FunctionContract>,
    pub baseline_functions: usize,
    pub last_index_run: Option<IndexRunRecord>,
}

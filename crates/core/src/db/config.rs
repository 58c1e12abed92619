use serde::{Deserialize, Serialize};

use crate::graph::ResolutionPolicy;

/// Database location, typically relative to the project root.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DbConfig {
    /// Path to the project database file (typically relative to project root).
    pub path: String,
}

impl DbConfig {
    pub fn new(path: impl Into<String>) -> Self {
        Self { path: path.into() }
    }
}

/// Settings for source indexing and graph construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexConfig {
    /// Directory names skipped while walking the source tree.
    pub exclude_dirs: Vec<String>,
    /// Tie-break for called names shared by several functions.
    pub resolution: ResolutionPolicy,
    /// Upper bound on the edges explored by longest-chain queries.
    pub max_path_depth: Option<usize>,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            exclude_dirs: [
                ".git",
                ".abstraction",
                "node_modules",
                "target",
                "__pycache__",
                "venv",
                ".venv",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            resolution: ResolutionPolicy::default(),
            max_path_depth: Some(64),
        }
    }
}

/// Serializable configuration describing a tracked project.
///
/// This lives at `.abstraction/project.json` in the project root.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectConfig {
    /// Human-friendly project name.
    pub name: String,
    /// Optional description / notes.
    pub description: Option<String>,
    /// Schema/config version. This is about the config format.
    pub config_version: String,
    /// Database configuration (path is typically relative to project root).
    pub db: DbConfig,
    /// Default source directory for `index` and `check`, relative to the root.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_dir: Option<String>,
    #[serde(default)]
    pub index: IndexConfig,
}

impl ProjectConfig {
    /// Create a new project configuration using the given name and db path.
    pub fn new(name: impl Into<String>, db_path: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            config_version: "0.1.0".to_string(),
            db: DbConfig::new(db_path),
            source_dir: None,
            index: IndexConfig::default(),
        }
    }

    pub fn with_source_dir(mut self, source_dir: Option<String>) -> Self {
        self.source_dir = source_dir;
        self
    }
}

//! An opened abstraction project: layout, config and database together.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, Context, Result};

use crate::changes::ChangeDetector;
use crate::db::{load_call_graph, ProjectConfig, ProjectDb, ProjectLayout};
use crate::graph::CallGraph;

#[derive(Debug)]
pub struct ProjectContext {
    pub layout: ProjectLayout,
    pub config: ProjectConfig,
    /// Database location after resolving `config.db.path` against the root.
    pub db_path: PathBuf,
    pub db: ProjectDb,
}

impl ProjectContext {
    pub fn from_root(root: impl AsRef<Path>) -> Result<Self> {
        Self::open(ProjectLayout::new(root))
    }

    /// Open a project created by `init-project`.
    pub fn open(layout: ProjectLayout) -> Result<Self> {
        let config = read_project_config(&layout)?;
        let db_path = layout.resolve_path(&config.db.path);
        let db = ProjectDb::open(&db_path)
            .with_context(|| format!("Failed to open project database at {}", db_path.display()))?;
        Ok(Self { layout, config, db_path, db })
    }

    /// Directory to extract from: `flag`, else the configured `source_dir`,
    /// else the project root.
    pub fn source_dir(&self, flag: Option<&str>) -> PathBuf {
        match flag.or(self.config.source_dir.as_deref()) {
            Some(dir) => self.layout.resolve_path(dir),
            None => self.layout.root.clone(),
        }
    }

    /// The indexed call graph, if `index` has run.
    pub fn call_graph(&self) -> Result<Option<CallGraph>> {
        load_call_graph(&self.layout)
    }

    pub fn require_call_graph(&self) -> Result<CallGraph> {
        self.call_graph()?.ok_or_else(|| {
            anyhow!(
                "No call graph found at {}; run `index` first",
                self.layout.graph_path.display()
            )
        })
    }

    /// Change detector resumed from the stored baseline (possibly empty).
    pub fn change_detector(&self) -> Result<ChangeDetector> {
        let baseline = self.db.load_baseline().context("Failed to load baseline")?;
        Ok(ChangeDetector::from_baseline(baseline))
    }
}

/// Read `.abstraction/project.json`.
pub fn read_project_config(layout: &ProjectLayout) -> Result<ProjectConfig> {
    let path = &layout.project_config_path;
    if !path.is_file() {
        bail!(
            "No abstraction project at {} (missing {}); run `init-project` first",
            layout.root.display(),
            path.display()
        );
    }
    let body = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&body)
        .with_context(|| format!("Project config at {} is not valid JSON", path.display()))
}

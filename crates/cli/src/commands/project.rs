use std::fs;

use abstraction_core::db::{
    ProjectConfig, ProjectContext, ProjectDb, ProjectLayout, ProjectSnapshot,
};
use anyhow::{Context, Result};
use serde::Serialize;

use crate::commands::print_dir_status;
use crate::{canonicalize_or_current, infer_project_name};

#[derive(Serialize)]
pub struct ProjectInfoSnapshot {
    pub root: String,
    pub config_file: String,
    pub db_path: String,
    pub graph_file: String,
    pub graph_present: bool,
    #[serde(flatten)]
    pub project: ProjectSnapshot,
}

/// Initialize a new project at `root`.
pub fn init_project_command(
    root: &str,
    name: Option<String>,
    source: Option<String>,
) -> Result<()> {
    let root_path = canonicalize_or_current(root)?;
    let layout = ProjectLayout::new(&root_path);

    let project_name = match name {
        Some(n) => n,
        None => infer_project_name(&root_path),
    };

    fs::create_dir_all(&layout.meta_dir)
        .with_context(|| format!("Failed to create meta dir: {}", layout.meta_dir.display()))?;
    fs::create_dir_all(&layout.reports_dir).with_context(|| {
        format!("Failed to create reports dir: {}", layout.reports_dir.display())
    })?;

    let config =
        ProjectConfig::new(&project_name, layout.db_path_relative_string()).with_source_dir(source);

    let json = serde_json::to_string_pretty(&config)?;
    fs::write(&layout.project_config_path, json).with_context(|| {
        format!("Failed to write project config: {}", layout.project_config_path.display())
    })?;

    // Create the database up front so later commands can rely on it.
    ProjectDb::open(&layout.db_path).with_context(|| {
        format!("Failed to initialize project database at {}", layout.db_path.display())
    })?;

    println!("Initialized abstraction tracking project:");
    println!("  Name: {}", project_name);
    println!("  Root: {}", layout.root.display());
    println!("  Config: {}", layout.project_config_path.display());
    println!("  DB path (relative): {}", config.db.path);
    if let Some(source) = &config.source_dir {
        println!("  Source dir: {}", source);
    }
    println!("  Reports dir: {}", layout.reports_dir.display());

    Ok(())
}

/// Show basic information about an existing project.
pub fn project_info_command(root: &str, json: bool) -> Result<()> {
    let root_path = canonicalize_or_current(root)?;
    let ProjectContext { layout, config, db_path, db } = ProjectContext::from_root(&root_path)?;
    let contracts = db.list_contracts().context("Failed to list contracts")?;
    let baseline = db.load_baseline().context("Failed to load baseline")?;
    let last_index_run = db.latest_index_run().context("Failed to load index runs")?;

    let snapshot = ProjectInfoSnapshot {
        root: layout.root.display().to_string(),
        config_file: layout.project_config_path.display().to_string(),
        db_path: db_path.display().to_string(),
        graph_file: layout.graph_path.display().to_string(),
        graph_present: layout.graph_path.is_file(),
        project: ProjectSnapshot {
            config,
            contracts,
            baseline_functions: baseline.len(),
            last_index_run,
        },
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&snapshot)?);
        return Ok(());
    }

    let config = &snapshot.project.config;
    println!("Abstraction Project Info");
    println!("========================");
    println!("Name: {}", config.name);
    if let Some(desc) = &config.description {
        println!("Description: {}", desc);
    }
    println!("Root: {}", snapshot.root);
    println!("Config file: {}", snapshot.config_file);
    println!("Config version: {}", config.config_version);
    println!("DB path (config): {}", config.db.path);
    println!("Source dir: {}", config.source_dir.as_deref().unwrap_or("(project root)"));
    println!("Resolution policy: {:?}", config.index.resolution);
    println!();

    println!("Directories:");
    print_dir_status("Meta dir (.abstraction)", &layout.meta_dir);
    print_dir_status("Reports dir", &layout.reports_dir);
    println!();

    println!("Contracts: {}", snapshot.project.contracts.len());
    println!("Baseline functions: {}", snapshot.project.baseline_functions);
    match &snapshot.project.last_index_run {
        Some(run) => println!(
            "Last index: {} ({} functions, {} nodes, {} edges) from {}",
            run.indexed_at, run.function_count, run.node_count, run.edge_count, run.source_dir
        ),
        None => println!("Last index: never"),
    }

    Ok(())
}

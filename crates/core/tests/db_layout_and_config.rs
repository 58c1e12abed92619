use abstraction_core::db::{
    read_project_config, save_call_graph, IndexConfig, ProjectConfig, ProjectContext,
    ProjectLayout,
};
use abstraction_core::graph::build_call_graph;
use abstraction_core::model::FunctionRecord;
use abstraction_core::graph::ResolutionPolicy;
use tempfile::tempdir;

#[test]
fn layout_paths_hang_off_meta_dir() {
    let root = tempdir().unwrap();
    let layout = ProjectLayout::new(root.path());
    assert!(layout.meta_dir.ends_with(".abstraction"));
    assert!(layout.project_config_path.ends_with(".abstraction/project.json"));
    assert!(layout.graph_path.ends_with(".abstraction/call_graph.json"));
    assert!(layout.reports_dir.ends_with("reports"));
    assert!(layout.db_path_relative_string().starts_with(".abstraction"));
}

#[test]
fn paths_resolve_relative_to_root() {
    let root = tempdir().unwrap();
    let layout = ProjectLayout::new(root.path());
    assert_eq!(layout.resolve_path("src"), root.path().join("src"));
    let absolute = root.path().join("elsewhere");
    assert_eq!(layout.resolve_path(absolute.to_str().unwrap()), absolute);
}

#[test]
fn config_defaults_fill_missing_index_section() {
    let config: ProjectConfig = serde_json::from_str(
        r#"{"name": "demo", "description": null, "config_version": "0.1.0",
            "db": {"path": ".abstraction/project.db"}}"#,
    )
    .unwrap();
    assert_eq!(config.index, IndexConfig::default());
    assert_eq!(config.index.max_path_depth, Some(64));
    assert!(config.index.exclude_dirs.iter().any(|d| d == "node_modules"));
    assert!(config.source_dir.is_none());

    let partial: IndexConfig = serde_json::from_str(r#"{"resolution": "first_inserted"}"#).unwrap();
    assert_eq!(partial.resolution, ResolutionPolicy::FirstInserted);
    assert_eq!(partial.max_path_depth, Some(64));
}

fn write_config(layout: &ProjectLayout, config: &ProjectConfig) {
    std::fs::create_dir_all(&layout.meta_dir).unwrap();
    std::fs::write(&layout.project_config_path, serde_json::to_string_pretty(config).unwrap())
        .unwrap();
}

#[test]
fn uninitialized_root_points_at_init_project() {
    let root = tempdir().unwrap();
    let layout = ProjectLayout::new(root.path());

    let err = read_project_config(&layout).unwrap_err();
    assert!(format!("{err:#}").contains("run `init-project` first"));
    assert!(ProjectContext::from_root(root.path()).is_err());
    assert!(!layout.db_path.exists());
}

#[test]
fn malformed_config_is_reported() {
    let root = tempdir().unwrap();
    let layout = ProjectLayout::new(root.path());
    std::fs::create_dir_all(&layout.meta_dir).unwrap();
    std::fs::write(&layout.project_config_path, "{ not json").unwrap();

    let err = read_project_config(&layout).unwrap_err();
    assert!(format!("{err:#}").contains("is not valid JSON"));
}

#[test]
fn context_opens_configured_database() {
    let root = tempdir().unwrap();
    let layout = ProjectLayout::new(root.path());
    let config = ProjectConfig::new("demo", layout.db_path_relative_string())
        .with_source_dir(Some("src".into()));
    write_config(&layout, &config);

    let ctx = ProjectContext::from_root(root.path()).expect("context");
    assert_eq!(ctx.config.name, "demo");
    assert_eq!(ctx.db_path, layout.db_path);
    assert!(ctx.db_path.exists());
    assert!(ctx.db.list_contracts().unwrap().is_empty());

    assert_eq!(ctx.source_dir(None), root.path().join("src"));
    assert_eq!(ctx.source_dir(Some("lib")), root.path().join("lib"));
}

#[test]
fn context_exposes_graph_and_baseline() {
    let root = tempdir().unwrap();
    let layout = ProjectLayout::new(root.path());
    write_config(&layout, &ProjectConfig::new("demo", layout.db_path_relative_string()));
    let ctx = ProjectContext::from_root(root.path()).unwrap();

    assert!(ctx.call_graph().unwrap().is_none());
    let err = ctx.require_call_graph().unwrap_err();
    assert!(err.to_string().contains("run `index` first"));
    assert!(!ctx.change_detector().unwrap().is_established());

    let records = vec![FunctionRecord::new("main", "a.py", 1, 2, "main()", vec![])];
    save_call_graph(&ctx.layout, &build_call_graph(&records).unwrap()).unwrap();
    let mut detector = ctx.change_detector().unwrap();
    detector.record_baseline(&records).unwrap();
    ctx.db.save_baseline(detector.baseline()).unwrap();

    assert_eq!(ctx.require_call_graph().unwrap().len(), 1);
    assert!(ctx.change_detector().unwrap().is_established());
}

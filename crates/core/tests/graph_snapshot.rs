use abstraction_core::db::{load_call_graph, save_call_graph, ProjectLayout};
use abstraction_core::graph::{
    build_call_graph, entry_points, CallGraph, GraphSnapshot, NodeSnapshot,
};
use abstraction_core::model::FunctionRecord;
use abstraction_core::CoreError;
use tempfile::tempdir;

fn sample_graph() -> CallGraph {
    build_call_graph(&[
        FunctionRecord::new("main", "app.py", 1, 4, "def main(): helper()", vec!["helper".into()]),
        FunctionRecord::new("helper", "app.py", 6, 8, "def helper(): pass", vec![]),
        FunctionRecord::new("io", "io.py", 1, 2, "def io(): pass", vec![]),
    ])
    .expect("build")
}

#[test]
fn snapshot_json_has_nodes_shape() {
    let snapshot = sample_graph().to_snapshot();
    let value = serde_json::to_value(&snapshot).unwrap();
    let main = &value["nodes"]["app.py::main"];
    assert_eq!(main["function_name"], "main");
    assert_eq!(main["file_path"], "app.py");
    assert_eq!(main["line_number"], 1);
    assert_eq!(main["callees"][0], "app.py::helper");
    assert_eq!(value["nodes"]["app.py::helper"]["callers"][0], "app.py::main");
}

#[test]
fn snapshot_reload_preserves_graph() {
    let graph = sample_graph();
    let json = serde_json::to_string(&graph.to_snapshot()).unwrap();
    let snapshot: GraphSnapshot = serde_json::from_str(&json).unwrap();
    let reloaded = CallGraph::from_snapshot(&snapshot).expect("reload");

    assert_eq!(reloaded.len(), graph.len());
    assert_eq!(reloaded.edge_count(), graph.edge_count());
    assert_eq!(reloaded.to_snapshot(), graph.to_snapshot());
    reloaded.validate().expect("symmetric");
}

#[test]
fn reload_keeps_insertion_order() {
    let graph = build_call_graph(&[
        FunctionRecord::new("run", "z.py", 1, 2, "def run(): pass", vec![]),
        FunctionRecord::new("run", "a.py", 1, 2, "def run(): pass", vec![]),
        FunctionRecord::new("boot", "m.py", 1, 2, "def boot(): pass", vec![]),
    ])
    .expect("build");
    let dir = tempdir().expect("tempdir");
    let layout = ProjectLayout::new(dir.path());
    std::fs::create_dir_all(&layout.meta_dir).unwrap();
    save_call_graph(&layout, &graph).expect("save");
    let reloaded = load_call_graph(&layout).expect("load").expect("graph present");

    let order: Vec<&str> = reloaded.keys().collect();
    assert_eq!(order, vec!["z.py::run", "a.py::run", "m.py::boot"]);
    assert_eq!(reloaded.find_by_name("run"), vec!["z.py::run", "a.py::run"]);
    assert_eq!(entry_points(&reloaded), entry_points(&graph));
}

#[test]
fn one_sided_edges_are_repaired_on_load() {
    let mut snapshot = GraphSnapshot::default();
    snapshot.nodes.insert(
        "a.py::a".into(),
        NodeSnapshot {
            function_name: "a".into(),
            file_path: "a.py".into(),
            line_number: 1,
            callers: vec![],
            callees: vec!["a.py::b".into(), "gone.py::x".into()],
        },
    );
    snapshot.nodes.insert(
        "a.py::b".into(),
        NodeSnapshot {
            function_name: "b".into(),
            file_path: "a.py".into(),
            line_number: 3,
            callers: vec![],
            callees: vec![],
        },
    );

    let graph = CallGraph::from_snapshot(&snapshot).expect("reload");
    assert_eq!(graph.edge_count(), 1);
    assert!(graph.node("a.py::b").unwrap().callers.contains("a.py::a"));
}

#[test]
fn keys_without_separator_are_rederived() {
    let mut snapshot = GraphSnapshot::default();
    snapshot.nodes.insert(
        "legacy".into(),
        NodeSnapshot {
            function_name: "legacy".into(),
            file_path: "old.py".into(),
            line_number: 2,
            callers: vec![],
            callees: vec![],
        },
    );
    let graph = CallGraph::from_snapshot(&snapshot).expect("reload");
    assert!(graph.contains("old.py::legacy"));
}

#[test]
fn underivable_keys_fail_to_load() {
    let mut snapshot = sample_graph().to_snapshot();
    snapshot.nodes.insert(
        "broken".into(),
        NodeSnapshot {
            function_name: String::new(),
            file_path: "x.py".into(),
            line_number: 1,
            callers: vec![],
            callees: vec![],
        },
    );
    assert!(matches!(CallGraph::from_snapshot(&snapshot), Err(CoreError::InvalidInput(_))));
}

#[test]
fn graph_store_round_trips_through_layout() {
    let dir = tempdir().expect("tempdir");
    let layout = ProjectLayout::new(dir.path());
    std::fs::create_dir_all(&layout.meta_dir).unwrap();

    assert!(load_call_graph(&layout).unwrap().is_none());
    std::fs::write(&layout.graph_path, "  \n").unwrap();
    assert!(load_call_graph(&layout).unwrap().is_none());

    let graph = sample_graph();
    save_call_graph(&layout, &graph).expect("save");
    let loaded = load_call_graph(&layout).expect("load").expect("graph present");
    assert_eq!(loaded.to_snapshot(), graph.to_snapshot());

    std::fs::write(&layout.graph_path, "{not json").unwrap();
    assert!(load_call_graph(&layout).is_err());
}

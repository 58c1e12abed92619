use std::fs;

use abstraction_core::db::ProjectContext;
use abstraction_core::graph::build_call_graph;
use abstraction_core::model::FunctionRecord;
use abstraction_tracker::commands::{
    add_contract_command, index_command, init_project_command, render_dot, render_text_tree,
    resolve_function, AddContractArgs, ContractSpec,
};
use tempfile::tempdir;

fn rec(name: &str, file: &str, calls: &[&str]) -> FunctionRecord {
    FunctionRecord::new(name, file, 1, 2, name, calls.iter().map(|c| c.to_string()).collect())
}

#[test]
fn text_tree_stops_at_cycles_and_depth() {
    let graph = build_call_graph(&[
        rec("a", "m.py", &["b"]),
        rec("b", "m.py", &["c", "a"]),
        rec("c", "m.py", &["d"]),
        rec("d", "m.py", &[]),
    ])
    .unwrap();

    let full = render_text_tree(&graph, "m.py::a", 10);
    assert_eq!(full, "- a\n  - b\n    - c\n      - d");

    let shallow = render_text_tree(&graph, "m.py::a", 2);
    assert_eq!(shallow, "- a\n  - b");
}

#[test]
fn dot_output_escapes_quotes() {
    let graph = build_call_graph(&[rec("say\"hi", "q.js", &[])]).unwrap();
    let dot = render_dot(&graph);
    assert!(dot.contains("\"q.js::say\\\"hi\" [label=\"say\\\"hi\"];"));
    assert!(dot.trim_end().ends_with('}'));
}

#[test]
fn resolve_function_narrows_by_file() {
    let graph = build_call_graph(&[rec("util", "a.py", &[]), rec("util", "b.py", &[])]).unwrap();

    assert_eq!(resolve_function(&graph, "util", None).unwrap(), "a.py::util");
    assert_eq!(resolve_function(&graph, "util", Some("b.py")).unwrap(), "b.py::util");
    let err = resolve_function(&graph, "util", Some("c.py")).unwrap_err();
    assert!(err.to_string().contains("not found in c.py"));
    assert!(resolve_function(&graph, "nope", None).is_err());
}

#[test]
fn contract_spec_accepts_long_field_names() {
    let dir = tempdir().unwrap();
    let yaml = dir.path().join("spec.yaml");
    fs::write(
        &yaml,
        "name: parse\nfile_path: src/app.py\npreconditions:\n  - text is str\nabstraction_level: low\nmetadata:\n  owner: core\n",
    )
    .unwrap();
    let spec = ContractSpec::from_path(&yaml).expect("yaml spec");
    assert_eq!(spec.name.as_deref(), Some("parse"));
    assert_eq!(spec.file.as_deref(), Some("src/app.py"));
    assert_eq!(spec.preconditions, vec!["text is str"]);
    assert_eq!(spec.level.as_deref(), Some("low"));
    assert_eq!(spec.metadata["owner"], "core");

    let json = dir.path().join("spec.json");
    fs::write(&json, r#"{"name": "run", "file": "src/app.py", "line": 14, "output": "None"}"#)
        .unwrap();
    let spec = ContractSpec::from_path(&json).expect("json spec");
    assert_eq!(spec.line, Some(14));
    assert_eq!(spec.output.as_deref(), Some("None"));

    fs::write(&json, "{broken").unwrap();
    assert!(ContractSpec::from_path(&json).is_err());
}

#[test]
fn add_contract_uses_indexed_line_and_hash() {
    let dir = tempdir().unwrap();
    let root = dir.path();
    fs::create_dir_all(root.join("src")).unwrap();
    fs::write(root.join("src/lib.py"), "\n\ndef helper():\n    return 1\n").unwrap();
    let root_str = root.to_str().unwrap();

    init_project_command(root_str, Some("units".into()), Some("src".into())).unwrap();
    index_command(root_str, None).unwrap();

    add_contract_command(
        root_str,
        AddContractArgs {
            name: Some("helper".into()),
            file: Some("src/lib.py".into()),
            post: vec!["returns 1".into()],
            level: Some("low".into()),
            ..AddContractArgs::default()
        },
    )
    .unwrap();

    let ctx = ProjectContext::from_root(root).unwrap();
    let contract = ctx.db.get_contract("helper", "src/lib.py").unwrap().expect("contract");
    assert_eq!(contract.line_number, 3);
    assert_eq!(contract.postconditions, vec!["returns 1"]);
    assert_eq!(contract.code_hash.len(), 64);
    assert!(contract.last_verified.is_some());

    let bad_level = AddContractArgs {
        name: Some("helper".into()),
        file: Some("src/lib.py".into()),
        level: Some("sideways".into()),
        ..AddContractArgs::default()
    };
    assert!(add_contract_command(root_str, bad_level).is_err());

    let missing_name =
        AddContractArgs { file: Some("src/lib.py".into()), ..AddContractArgs::default() };
    let err = add_contract_command(root_str, missing_name).unwrap_err();
    assert!(err.to_string().contains("function name is required"));
}

use abstraction_core::changes::{Baseline, ChangeDetector};
use abstraction_core::contract::{AbstractionLevel, FunctionContract};
use abstraction_core::db::{DbError, IndexRunRecord, ProjectDb, CURRENT_SCHEMA_VERSION};
use abstraction_core::model::FunctionRecord;
use tempfile::tempdir;

fn schema_version(db: &ProjectDb) -> i32 {
    db.connection().query_row("PRAGMA user_version;", [], |row| row.get(0)).expect("version")
}

#[test]
fn project_db_initializes_and_reopens() {
    let dir = tempdir().expect("tempdir");
    let db_path = dir.path().join("project.db");

    {
        let db = ProjectDb::open(&db_path).expect("open db");
        assert_eq!(schema_version(&db), CURRENT_SCHEMA_VERSION);

        let mut contract = FunctionContract::new("parse", "src/io.py", 12).unwrap();
        contract.preconditions = vec!["path exists".into()];
        contract.abstraction_level = AbstractionLevel::Low;
        contract.metadata.insert("owner".into(), serde_json::json!("io-team"));
        db.upsert_contract(&contract).expect("insert contract");
    }

    {
        let db = ProjectDb::open(&db_path).expect("re-open db");
        assert_eq!(schema_version(&db), CURRENT_SCHEMA_VERSION);

        let stored = db.get_contract("parse", "src/io.py").unwrap().expect("contract");
        assert_eq!(stored.line_number, 12);
        assert_eq!(stored.preconditions, vec!["path exists"]);
        assert_eq!(stored.abstraction_level, AbstractionLevel::Low);
        assert_eq!(stored.metadata["owner"], "io-team");
    }
}

#[test]
fn contracts_upsert_list_and_delete() {
    let dir = tempdir().expect("tempdir");
    let db = ProjectDb::open(&dir.path().join("project.db")).expect("open");

    let first = FunctionContract::new("zeta", "a.py", 1).unwrap();
    let second = FunctionContract::new("alpha", "b.py", 2).unwrap();
    let third = FunctionContract::new("alpha", "a.py", 9).unwrap();
    for contract in [&first, &second, &third] {
        db.upsert_contract(contract).unwrap();
    }

    let mut updated = first.clone();
    updated.expected_behavior = "returns the last letter".into();
    updated.code_hash = "abc".into();
    updated.last_verified = Some("2024-05-01T10:00:00+00:00".into());
    db.upsert_contract(&updated).unwrap();

    let listed = db.list_contracts().unwrap();
    let keys: Vec<String> = listed.iter().map(|c| c.key().unwrap()).collect();
    assert_eq!(keys, vec!["a.py::alpha", "a.py::zeta", "b.py::alpha"]);
    assert_eq!(listed[1], updated);

    assert!(db.delete_contract("zeta", "a.py").unwrap());
    assert!(!db.delete_contract("zeta", "a.py").unwrap());
    assert!(db.get_contract("zeta", "a.py").unwrap().is_none());
    assert_eq!(db.list_contracts().unwrap().len(), 2);
}

#[test]
fn baseline_save_replaces_previous() {
    let dir = tempdir().expect("tempdir");
    let db = ProjectDb::open(&dir.path().join("project.db")).expect("open");
    assert!(db.load_baseline().unwrap().is_empty());

    let mut detector = ChangeDetector::new();
    detector
        .record_baseline(&[
            FunctionRecord::new("f", "a.py", 1, 2, "one", vec![]),
            FunctionRecord::new("g", "b.py", 1, 2, "two", vec![]),
        ])
        .unwrap();
    db.save_baseline(detector.baseline()).unwrap();
    assert_eq!(db.load_baseline().unwrap(), *detector.baseline());

    detector.record_baseline(&[FunctionRecord::new("h", "c.py", 1, 2, "three", vec![])]).unwrap();
    db.save_baseline(detector.baseline()).unwrap();

    let loaded: Baseline = db.load_baseline().unwrap();
    assert_eq!(loaded.len(), 1);
    assert!(loaded.hashes.contains_key("c.py::h"));
    assert_eq!(loaded.locations.get("h").map(String::as_str), Some("c.py"));
    assert!(!loaded.locations.contains_key("f"));
}

#[test]
fn index_runs_are_listed_oldest_first() {
    let dir = tempdir().expect("tempdir");
    let db = ProjectDb::open(&dir.path().join("project.db")).expect("open");
    assert!(db.latest_index_run().unwrap().is_none());

    for (i, stamp) in ["2024-01-01T00:00:00Z", "2024-01-02T00:00:00Z"].iter().enumerate() {
        let id = db
            .insert_index_run(&IndexRunRecord {
                source_dir: "src".into(),
                function_count: 10 + i,
                node_count: 9 + i,
                edge_count: 4,
                indexed_at: stamp.to_string(),
            })
            .unwrap();
        assert!(id > 0);
    }

    let runs = db.list_index_runs().unwrap();
    assert_eq!(runs.len(), 2);
    assert_eq!(runs[0].function_count, 10);
    let latest = db.latest_index_run().unwrap().unwrap();
    assert_eq!(latest.indexed_at, "2024-01-02T00:00:00Z");
    assert_eq!(latest.node_count, 10);
}

#[test]
fn newer_schema_is_rejected() {
    let dir = tempdir().expect("tempdir");
    let db_path = dir.path().join("project.db");
    {
        let conn = rusqlite::Connection::open(&db_path).unwrap();
        conn.pragma_update(None, "user_version", CURRENT_SCHEMA_VERSION + 1).unwrap();
    }

    let err = ProjectDb::open(&db_path).unwrap_err();
    match err {
        DbError::UnsupportedSchemaVersion { found, max_supported, .. } => {
            assert_eq!(found, CURRENT_SCHEMA_VERSION + 1);
            assert_eq!(max_supported, CURRENT_SCHEMA_VERSION);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn older_schema_is_migrated_forward() {
    let dir = tempdir().expect("tempdir");
    let db_path = dir.path().join("project.db");
    {
        let conn = rusqlite::Connection::open(&db_path).unwrap();
        conn.execute_batch(
            r#"
            CREATE TABLE contracts (
                function_key TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                file_path TEXT NOT NULL,
                line_number INTEGER NOT NULL,
                preconditions TEXT NOT NULL DEFAULT '[]',
                postconditions TEXT NOT NULL DEFAULT '[]',
                input_prediction TEXT NOT NULL DEFAULT '',
                output_prediction TEXT NOT NULL DEFAULT '',
                expected_behavior TEXT NOT NULL DEFAULT '',
                abstraction_level TEXT NOT NULL DEFAULT 'medium',
                code_hash TEXT NOT NULL DEFAULT '',
                last_verified TEXT,
                metadata TEXT NOT NULL DEFAULT '{}'
            );
            PRAGMA user_version = 1;
            "#,
        )
        .unwrap();
    }

    let db = ProjectDb::open(&db_path).expect("migrate");
    assert_eq!(schema_version(&db), CURRENT_SCHEMA_VERSION);
    assert!(db.load_baseline().unwrap().is_empty());
    assert!(db.list_index_runs().unwrap().is_empty());
}

#[test]
fn corrupt_json_column_surfaces_as_json_error() {
    let dir = tempdir().expect("tempdir");
    let db = ProjectDb::open(&dir.path().join("project.db")).expect("open");
    db.upsert_contract(&FunctionContract::new("f", "a.py", 1).unwrap()).unwrap();
    db.connection()
        .execute("UPDATE contracts SET preconditions = 'not json' WHERE name = 'f'", [])
        .unwrap();

    assert!(matches!(db.get_contract("f", "a.py"), Err(DbError::Json(_))));
}

#[test]
fn invalid_contract_rows_are_rejected() {
    let dir = tempdir().expect("tempdir");
    let db = ProjectDb::open(&dir.path().join("project.db")).expect("open");
    db.upsert_contract(&FunctionContract::new("f", "a.py", 1).unwrap()).unwrap();
    db.upsert_contract(&FunctionContract::new("g", "a.py", 5).unwrap()).unwrap();

    db.connection().execute("UPDATE contracts SET line_number = -3 WHERE name = 'f'", []).unwrap();
    assert!(matches!(
        db.get_contract("f", "a.py"),
        Err(DbError::InvalidContract { ref key, .. }) if key == "a.py::f"
    ));

    db.connection().execute("UPDATE contracts SET line_number = 0 WHERE name = 'f'", []).unwrap();
    assert!(matches!(db.get_contract("f", "a.py"), Err(DbError::InvalidContract { .. })));

    db.connection()
        .execute("UPDATE contracts SET abstraction_level = 'bogus' WHERE name = 'g'", [])
        .unwrap();
    let err = db.get_contract("g", "a.py").unwrap_err();
    assert!(err.to_string().contains("bogus"), "{err}");
    assert!(db.list_contracts().is_err());
}

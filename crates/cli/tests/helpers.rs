use std::fs;
use std::path::Path;

use abstraction_tracker::{canonicalize_or_current, infer_project_name};
use tempfile::tempdir;

#[test]
fn canonicalize_or_current_returns_cwd_for_dot() {
    let original = std::env::current_dir().expect("cwd");
    let tmp = tempdir().expect("tempdir");
    std::env::set_current_dir(tmp.path()).expect("chdir tmp");

    let result = canonicalize_or_current(".").expect("canonicalize").canonicalize().expect("canon");
    let expected = tmp.path().canonicalize().expect("canon tmp");
    std::env::set_current_dir(original).expect("restore cwd");
    assert_eq!(result, expected);
}

#[test]
fn canonicalize_or_current_resolves_existing_path() {
    let tmp = tempdir().expect("tempdir");
    let subdir = tmp.path().join("nested");
    fs::create_dir_all(&subdir).expect("create nested");

    let result = canonicalize_or_current(subdir.to_str().unwrap()).expect("canonicalize nested");
    assert_eq!(result, subdir.canonicalize().expect("canonicalize subdir"));
}

#[test]
fn canonicalize_or_current_keeps_missing_absolute_path() {
    let tmp = tempdir().expect("tempdir");
    let missing = tmp.path().join("not-yet");
    let result = canonicalize_or_current(missing.to_str().unwrap()).expect("resolve");
    assert!(result.ends_with("not-yet"));
}

#[test]
fn infer_project_name_uses_last_path_component() {
    assert_eq!(infer_project_name(Path::new("/work/abstraction-demo")), "abstraction-demo");
    assert_eq!(infer_project_name(Path::new("/tmp/project-root")), "project-root");
    assert_eq!(infer_project_name(Path::new("/")), "unnamed-project");
}

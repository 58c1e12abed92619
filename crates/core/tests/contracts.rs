use std::str::FromStr;

use abstraction_core::contract::{AbstractionLevel, FunctionContract};
use abstraction_core::CoreError;

#[test]
fn new_contract_validates_identity() {
    assert!(matches!(FunctionContract::new("", "a.py", 1), Err(CoreError::InvalidInput(_))));
    assert!(matches!(FunctionContract::new("f", "", 1), Err(CoreError::InvalidInput(_))));
    assert!(matches!(FunctionContract::new("f", "a.py", 0), Err(CoreError::InvalidInput(_))));

    let contract = FunctionContract::new("f", "a.py", 3).unwrap();
    assert_eq!(contract.key().unwrap(), "a.py::f");
    assert_eq!(contract.abstraction_level, AbstractionLevel::Medium);
}

#[test]
fn completeness_needs_conditions_or_predictions() {
    let bare = FunctionContract::new("f", "a.py", 3).unwrap();
    assert!(!bare.is_complete());

    let with_pre = bare.clone().with_conditions(vec!["x > 0".into()], vec![]);
    assert!(with_pre.is_complete());

    let mut predicted = bare.clone();
    predicted.output_prediction = "a sorted list".into();
    assert!(predicted.is_complete());

    let mut empty = bare.clone();
    empty.input_prediction = String::new();
    empty.output_prediction = String::new();
    assert!(!empty.is_complete());

    let mut spaced = bare;
    spaced.input_prediction = "   ".into();
    assert!(spaced.is_complete());
}

#[test]
fn staleness_compares_recorded_hash() {
    let mut contract = FunctionContract::new("f", "a.py", 3).unwrap();
    assert!(!contract.is_stale("abc"));
    contract.code_hash = "abc".into();
    assert!(!contract.is_stale("abc"));
    assert!(contract.is_stale("def"));
}

#[test]
fn abstraction_levels_parse_loosely() {
    assert_eq!(AbstractionLevel::from_str("HIGH").unwrap(), AbstractionLevel::High);
    assert_eq!(AbstractionLevel::from_str("entry-point").unwrap(), AbstractionLevel::EntryPoint);
    assert_eq!("system".parse::<AbstractionLevel>().unwrap(), AbstractionLevel::System);
    assert!(matches!("middle".parse::<AbstractionLevel>(), Err(CoreError::InvalidInput(_))));
    assert_eq!(AbstractionLevel::EntryPoint.to_string(), "entry_point");
}

#[test]
fn contract_json_uses_defaults() {
    let contract: FunctionContract = serde_json::from_str(
        r#"{"name": "f", "file_path": "a.py", "line_number": 2, "abstraction_level": "low"}"#,
    )
    .unwrap();
    assert!(contract.preconditions.is_empty());
    assert_eq!(contract.abstraction_level, AbstractionLevel::Low);
    assert!(contract.last_verified.is_none());

    let value = serde_json::to_value(&contract).unwrap();
    assert_eq!(value["abstraction_level"], "low");
    assert!(value.get("last_verified").is_none());
}

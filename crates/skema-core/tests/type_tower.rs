//! Integration test: the data-type tower and error surface as seen by
//! downstream crates.

use skema_core::{ClassDef, DataType, ErrorKind, LookupKind, SchemaError, Uid};

#[test]
fn test_numeric_tower_ancestry() {
    let chain: Vec<String> = DataType::Bool.ancestors().map(|t| t.name()).collect();
    assert_eq!(chain, vec!["bool", "int", "number", "any"]);
    assert!(DataType::Float.is_subtype_of(&DataType::Number));
    assert!(!DataType::Float.is_subtype_of(&DataType::Int));
    assert!(!DataType::Str.is_subtype_of(&DataType::Number));
}

#[test]
fn test_class_chain_ends_at_any() {
    let base = ClassDef::new("Vehicle");
    let car = ClassDef::extending("Car", base.data_type());
    let names: Vec<String> = car.data_type().ancestors().map(|t| t.name()).collect();
    assert_eq!(names, vec!["Car", "Vehicle", "any"]);
    assert!(car.data_type().is_subtype_of(&base.data_type()));
    assert!(!base.data_type().is_subtype_of(&car.data_type()));
}

#[test]
fn test_same_named_classes_are_distinct() {
    let a = ClassDef::new("Thing");
    let b = ClassDef::new("Thing");
    assert_ne!(a.data_type(), b.data_type());
    assert_eq!(a.data_type(), a.data_type());
}

#[test]
fn test_hint_names() {
    for (name, expected) in [
        ("int", DataType::Int),
        ("integer", DataType::Int),
        ("boolean", DataType::Bool),
        ("string", DataType::Str),
        ("list", DataType::Array),
        ("mapping", DataType::Map),
        ("object", DataType::Any),
    ] {
        assert_eq!(DataType::from_name(name), Some(expected), "{name}");
    }
    assert_eq!(DataType::from_name("Point"), None);
}

#[test]
fn test_error_kinds_and_messages() {
    let err = SchemaError::lookup(LookupKind::Uid, "abc");
    assert_eq!(err.kind(), ErrorKind::LookupFailure);
    assert!(err.to_string().contains("'abc'"));

    let err = SchemaError::type_mismatch("age", "int", "str");
    assert_eq!(err.kind(), ErrorKind::TypeMismatch);
    assert_eq!(err.to_string(), "schema 'age' expected int, got str");
}

#[test]
fn test_uid_serializes_transparently() {
    let uid = Uid::new("fixed");
    assert_eq!(serde_json::to_string(&uid).unwrap(), "\"fixed\"");
    assert_ne!(Uid::generate(), Uid::generate());
}

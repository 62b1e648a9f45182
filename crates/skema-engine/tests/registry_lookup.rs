//! Integration test: registry lookups on standalone registries.
//!
//! Best-effort resolution over the numeric tower, type unregistration, and
//! cascading instance registration. Standalone registries keep these tests
//! independent of the process registry.

use skema_engine::{
    builtins, kwargs, ClassDef, DataType, ErrorKind, Kwargs, Registry, SchemaType, Value,
};
use std::sync::Arc;

#[test]
fn test_best_effort_follows_the_numeric_tower() {
    let number = SchemaType::builder("AnyNumber").build();
    let int = SchemaType::builder("WholeNumber").build();

    let mut registry = Registry::new();
    registry.register_type(&number, &[DataType::Number]);
    registry.register_type(&int, &[DataType::Int]);

    let found = registry.lookup_by_type(&DataType::Bool, true).unwrap();
    assert!(Arc::ptr_eq(&found, &int));
    let found = registry.lookup_by_type(&DataType::Float, true).unwrap();
    assert!(Arc::ptr_eq(&found, &number));

    registry.unregister(int.uid()).unwrap();
    let found = registry.lookup_by_type(&DataType::Int, true).unwrap();
    assert!(Arc::ptr_eq(&found, &number));
    assert_eq!(
        registry
            .lookup_by_type(&DataType::Int, false)
            .unwrap_err()
            .kind(),
        ErrorKind::LookupFailure
    );
}

#[test]
fn test_class_hierarchy_lookup() {
    let animal = ClassDef::new("Animal");
    let dog = ClassDef::extending("Dog", animal.data_type());
    let puppy = ClassDef::extending("Puppy", dog.data_type());
    let animal_schema = SchemaType::builder("AnimalSchema")
        .data_type(animal.data_type())
        .build();

    let mut registry = Registry::with_builtins();
    registry.register_type(&animal_schema, animal_schema.data_types());

    let found = registry.lookup_by_type(&puppy.data_type(), true).unwrap();
    assert!(Arc::ptr_eq(&found, &animal_schema));
    assert!(registry.lookup_by_type(&puppy.data_type(), false).is_err());
}

#[test]
fn test_builtins_install_into_standalone_registry() {
    let registry = Registry::with_builtins();
    let b = builtins();
    for (data_type, expected) in [
        (DataType::Bool, &b.boolean),
        (DataType::Int, &b.integer),
        (DataType::Float, &b.float),
        (DataType::Str, &b.string),
        (DataType::Array, &b.array),
        (DataType::Map, &b.dict),
        (DataType::DateTime, &b.datetime),
        (DataType::Enum, &b.enumeration),
        (DataType::Function, &b.function),
    ] {
        let found = registry.lookup_by_type(&data_type, false).unwrap();
        assert!(Arc::ptr_eq(&found, expected), "wrong type for {data_type}");
    }
    let found = registry
        .schema_for_value(&Value::Bool(true), true)
        .unwrap();
    assert!(Arc::ptr_eq(&found, &b.boolean));
}

#[test]
fn test_instances_by_uid_and_name() {
    let inner = builtins()
        .string
        .instantiate(kwargs! { "name" => "label" })
        .unwrap();
    let record = SchemaType::builder("LabelledRecord")
        .member("label", inner.clone())
        .build();
    let instance = record
        .instantiate(kwargs! { "name" => "first" })
        .unwrap();

    let mut registry = Registry::new();
    assert!(registry.register_instance(&instance).is_none());
    assert_eq!(registry.len(), 2);
    assert!(registry.lookup_by_uid(&instance.uid()).unwrap().ptr_eq(&instance));
    assert!(registry.lookup_by_name("label").unwrap().ptr_eq(&inner));

    registry.unregister(&instance.uid()).unwrap();
    assert_eq!(
        registry.lookup_by_name("first").unwrap_err().kind(),
        ErrorKind::LookupFailure
    );
    assert!(registry.unregister(&instance.uid()).is_err());
}

#[test]
fn test_registering_instances_on_construction() {
    let tracked = SchemaType::builder("TrackedRecord")
        .register_instances(true)
        .build();
    let a = tracked
        .instantiate(kwargs! { "name" => "tracked-a" })
        .unwrap();
    assert!(skema_engine::registry::lookup_by_uid(&a.uid())
        .unwrap()
        .ptr_eq(&a));

    let untracked = SchemaType::builder("UntrackedRecord").build();
    let b = untracked.instantiate(Kwargs::new()).unwrap();
    assert!(skema_engine::registry::lookup_by_uid(&b.uid()).is_err());
}

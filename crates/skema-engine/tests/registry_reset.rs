//! Integration test: resetting the process registry.
//!
//! Kept in its own test binary, and in a single test, because `reset`
//! clears state every other test in the process would otherwise share.

use skema_engine::registry;
use skema_engine::{builtins, kwargs, ClassDef, DataType, SchemaType};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

#[test]
fn test_reset_restores_builtins_only() {
    init_tracing();

    let gadget = ClassDef::new("Gadget");
    let gadget_schema = SchemaType::builder("GadgetSchema")
        .data_type(gadget.data_type())
        .register_instances(true)
        .build();
    let instance = gadget_schema
        .instantiate(kwargs! { "name" => "gizmo" })
        .unwrap();

    assert!(Arc::ptr_eq(
        &registry::lookup_by_type(&gadget.data_type(), false).unwrap(),
        &gadget_schema
    ));
    assert!(registry::lookup_by_name("gizmo").unwrap().ptr_eq(&instance));
    assert!(Arc::ptr_eq(
        &registry::lookup_type_by_name("GadgetSchema").unwrap(),
        &gadget_schema
    ));

    registry::reset();

    assert!(registry::lookup_by_type(&gadget.data_type(), true).is_err());
    assert!(registry::lookup_by_name("gizmo").is_err());
    assert!(registry::lookup_type_by_name("GadgetSchema").is_err());
    assert!(Arc::ptr_eq(
        &registry::lookup_by_type(&DataType::Int, false).unwrap(),
        &builtins().integer
    ));
    assert!(registry::global().read().lookup_type_by_name("ArraySchema").is_ok());
}

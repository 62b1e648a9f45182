//! # Class Schemas
//!
//! Derives a schema type from a class, given a prototype [`Object`] of that
//! class. Every public field of the prototype becomes a member of the new
//! type, and content resolution turns each one into a nested schema whose
//! default is the field's value:
//!
//! - plain values become instances of the registry's type for the value;
//! - callables become function schemas bound to the callable, so a method
//!   field should carry the callable's own name;
//! - objects of a class that already has a schema become nested instances
//!   of that schema.
//!
//! Fields starting with `_` (storage slots) and identity attribute names
//! are not members. A field whose schema cannot be built is skipped by the
//! resolver, which logs it.
//!
//! The derived type is named `<Class>Schema`, validates the class's data
//! type, and extends the schema type registered for the parent class, if
//! any. It is registered under the class, so deriving again returns the
//! same type until the registry is reset.

use skema_core::{DataType, SchemaError, SchemaResult};
use tracing::debug;

use crate::registry;
use crate::schema::{is_identity, SchemaType, SchemaTypeRef};
use crate::value::Object;

/// The schema type of `prototype`'s class, derived on first use.
///
/// Fails with a type mismatch when the prototype has no class.
pub fn schema_for_class(prototype: &Object) -> SchemaResult<SchemaTypeRef> {
    let class = prototype
        .class()
        .ok_or_else(|| SchemaError::type_mismatch("prototype", "object of a class", "any"))?;
    let data_type = class.data_type();
    if let Ok(existing) = registry::lookup_by_type(&data_type, false) {
        return Ok(existing);
    }

    let mut builder = SchemaType::builder(format!("{}Schema", class.name()));
    if let Some(parent @ DataType::Class(_)) = data_type.parent() {
        if let Ok(base) = registry::lookup_by_type(&parent, false) {
            builder = builder.extends(&base);
        }
    }
    builder = builder.data_type(data_type);
    for (name, value) in prototype.fields() {
        if name.starts_with('_') || is_identity(&name) {
            continue;
        }
        builder = builder.member(name, value);
    }

    let schema_type = builder.build();
    debug!(
        class = class.name(),
        schema_type = schema_type.name(),
        members = schema_type.schemas().len(),
        "derived class schema"
    );
    Ok(schema_type)
}

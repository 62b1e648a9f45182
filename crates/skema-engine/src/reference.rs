//! # Reference Schemas
//!
//! A reference schema delegates validation to its `ref` target or, when
//! `ref` is unset, to the schema owning it. Declared as a member of a
//! schema type, an unset reference therefore means "a value of whatever
//! type declares me"; as a plain `default` member it guards the declaring
//! instance's default value.

use skema_core::SchemaResult;

use crate::schema::{Schema, SchemaBehavior};
use crate::value::Value;

pub(crate) struct RefBehavior;

impl SchemaBehavior for RefBehavior {
    fn validate(&self, schema: &Schema, data: &Value, owner: Option<&Schema>) -> SchemaResult<()> {
        validate_reference(schema, data, owner)
    }
}

/// Validate against the `ref` target, else the owner. A reference with
/// neither, or owned by itself, accepts everything.
pub(crate) fn validate_reference(schema: &Schema, data: &Value, owner: Option<&Schema>) -> SchemaResult<()> {
    match schema.get_attr("ref")? {
        Value::Schema(target) if !target.ptr_eq(schema) => target.validate(data),
        _ => match owner {
            Some(owner) if !owner.ptr_eq(schema) => owner.validate(data),
            _ => Ok(()),
        },
    }
}

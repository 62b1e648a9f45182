//! # Validation and Traversal
//!
//! The generic validation walk shared by every schema type:
//!
//! 1. **Null check.** `Null` passes iff the schema is nullable; nothing
//!    else is checked for it.
//! 2. **Type membership.** With declared data types, the value's runtime
//!    type must derive from one of them. Without, the value must be an
//!    instance of the schema's own type (or a derived schema type) or a
//!    structural record (`Object`, `Map`).
//! 3. **Members.** Every nested schema is visited. A required one with no
//!    counterpart on the data fails; a present one is validated recursively
//!    with the current schema as owner.
//!
//! The walk is fail-fast. Type-specific constraints (bounds, sizes,
//! uniqueness) are layered on top by [`SchemaBehavior`] implementations.
//!
//! [`SchemaBehavior`]: crate::schema::SchemaBehavior

use std::collections::BTreeMap;

use skema_core::{SchemaError, SchemaResult};

use crate::schema::Schema;
use crate::value::Value;

/// Validate `data` against `schema`, running the schema type's behavior.
pub fn validate(schema: &Schema, data: &Value) -> SchemaResult<()> {
    schema.validate(data)
}

/// Plain nested mapping of `schema`'s current values.
pub fn dump(schema: &Schema) -> BTreeMap<String, Value> {
    schema.dump()
}

/// The generic algorithm: null check, type membership, nested members.
pub fn validate_base(schema: &Schema, data: &Value) -> SchemaResult<()> {
    if data.is_null() {
        return if schema.nullable() {
            Ok(())
        } else {
            Err(SchemaError::NullNotAllowed {
                schema: schema.label(),
            })
        };
    }
    check_type(schema, data)?;
    check_members(schema, data)
}

/// Null check only; used by schemas that accept every non-null value.
pub(crate) fn check_null(schema: &Schema, data: &Value) -> SchemaResult<bool> {
    if !data.is_null() {
        return Ok(false);
    }
    if schema.nullable() {
        Ok(true)
    } else {
        Err(SchemaError::NullNotAllowed {
            schema: schema.label(),
        })
    }
}

fn check_type(schema: &Schema, data: &Value) -> SchemaResult<()> {
    let ty = schema.schema_type();
    let actual = data.data_type();
    let declared = ty.effective_data_types();

    let (accepted, expected) = if declared.is_empty() {
        let own = ty.as_data_type();
        let structural = matches!(data, Value::Object(_) | Value::Map(_));
        (actual.is_subtype_of(&own) || structural, own.name())
    } else {
        let accepted = declared.iter().any(|d| actual.is_subtype_of(d));
        let expected = declared
            .iter()
            .map(|d| d.name())
            .collect::<Vec<_>>()
            .join(" | ");
        (accepted, expected)
    };

    if accepted {
        Ok(())
    } else {
        Err(SchemaError::type_mismatch(
            schema.label(),
            expected,
            actual.name(),
        ))
    }
}

fn check_members(schema: &Schema, data: &Value) -> SchemaResult<()> {
    let required = schema.required();
    for (name, nested) in schema.nested_schemas() {
        match data.attr(&name) {
            Some(value) => nested.validate_with_owner(&value, Some(schema))?,
            None if required.contains(&name) => {
                return Err(SchemaError::RequiredFieldMissing {
                    schema: schema.label(),
                    field: name,
                })
            }
            None => {}
        }
    }
    Ok(())
}

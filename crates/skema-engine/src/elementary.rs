//! # Elementary Constraints
//!
//! Behaviors of the builtin leaf schemas that add constraints on top of the
//! generic walk:
//!
//! - numbers: inclusive `min` / `max` bounds;
//! - arrays: inclusive `minsize`, exclusive `maxsize`, `unique`, and an
//!   `items` schema applied to every element;
//! - one-of: the value must satisfy at least one member of `schemas`;
//! - any: every non-null value is accepted.
//!
//! The schema types themselves are declared in [`crate::builtins`].

use std::cmp::Ordering;

use skema_core::{SchemaError, SchemaResult};

use crate::schema::{Schema, SchemaBehavior};
use crate::validate::{check_null, validate_base};
use crate::value::Value;

/// Inclusive numeric bounds.
pub(crate) struct NumberBehavior;

impl SchemaBehavior for NumberBehavior {
    fn validate(&self, schema: &Schema, data: &Value, _owner: Option<&Schema>) -> SchemaResult<()> {
        validate_base(schema, data)?;
        let min = schema.get_attr("min")?;
        if compare_numbers(data, &min) == Some(Ordering::Less) {
            return Err(SchemaError::bound(
                schema.label(),
                format!("{data} is lower than the minimum {min}"),
            ));
        }
        let max = schema.get_attr("max")?;
        if compare_numbers(data, &max) == Some(Ordering::Greater) {
            return Err(SchemaError::bound(
                schema.label(),
                format!("{data} is greater than the maximum {max}"),
            ));
        }
        Ok(())
    }
}

/// Order two numeric values. Integers and booleans compare exactly; a
/// float on either side compares as `f64`. `None` when either side is not
/// a number.
fn compare_numbers(a: &Value, b: &Value) -> Option<Ordering> {
    match (a.as_i64(), b.as_i64()) {
        (Some(a), Some(b)) => Some(a.cmp(&b)),
        _ => a.as_f64()?.partial_cmp(&b.as_f64()?),
    }
}

/// Size, uniqueness and item constraints.
pub(crate) struct ArrayBehavior;

impl SchemaBehavior for ArrayBehavior {
    fn validate(&self, schema: &Schema, data: &Value, _owner: Option<&Schema>) -> SchemaResult<()> {
        validate_base(schema, data)?;
        let Value::Array(items) = data else {
            return Ok(());
        };
        let len = i64::try_from(items.len()).unwrap_or(i64::MAX);

        if let Some(minsize) = schema.get_attr("minsize")?.as_i64() {
            if len < minsize {
                return Err(SchemaError::bound(
                    schema.label(),
                    format!("{len} items, at least {minsize} required"),
                ));
            }
        }
        if let Some(maxsize) = schema.get_attr("maxsize")?.as_i64() {
            if len >= maxsize {
                return Err(SchemaError::bound(
                    schema.label(),
                    format!("{len} items, fewer than {maxsize} required"),
                ));
            }
        }
        if schema.get_attr("unique")?.as_bool() == Some(true) {
            for (index, item) in items.iter().enumerate() {
                if items[..index].contains(item) {
                    return Err(SchemaError::bound(
                        schema.label(),
                        format!("duplicate item {item} at index {index}"),
                    ));
                }
            }
        }
        if let Value::Schema(item_schema) = schema.get_attr("items")? {
            for item in items {
                item_schema.validate(item)?;
            }
        }
        Ok(())
    }
}

/// Passes when any member of `schemas` validates the value.
pub(crate) struct OneOfBehavior;

impl SchemaBehavior for OneOfBehavior {
    fn validate(&self, schema: &Schema, data: &Value, _owner: Option<&Schema>) -> SchemaResult<()> {
        if check_null(schema, data)? {
            return Ok(());
        }
        let candidates: Vec<Schema> = match schema.get_attr("schemas")? {
            Value::Array(items) => items
                .into_iter()
                .filter_map(|item| match item {
                    Value::Schema(candidate) => Some(candidate),
                    _ => None,
                })
                .collect(),
            _ => Vec::new(),
        };
        if candidates.is_empty() || candidates.iter().any(|c| c.validate(data).is_ok()) {
            return Ok(());
        }
        let expected = candidates
            .iter()
            .map(|c| c.schema_type().name().to_string())
            .collect::<Vec<_>>()
            .join(" | ");
        Err(SchemaError::type_mismatch(
            schema.label(),
            expected,
            data.data_type().name(),
        ))
    }
}

/// Accepts every non-null value; null per `nullable`.
pub(crate) struct AnyBehavior;

impl SchemaBehavior for AnyBehavior {
    fn validate(&self, schema: &Schema, data: &Value, _owner: Option<&Schema>) -> SchemaResult<()> {
        check_null(schema, data).map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use crate::builtins::builtins;
    use crate::kwargs;
    use crate::value::{Kwargs, Value};
    use chrono::Utc;
    use skema_core::ErrorKind;

    #[test]
    fn test_leaf_defaults() {
        let b = builtins();
        let default_of = |ty: &crate::schema::SchemaTypeRef| ty.instantiate(Kwargs::new()).unwrap().default();
        assert_eq!(default_of(&b.boolean), Value::Bool(false));
        assert_eq!(default_of(&b.integer), Value::Int(0));
        assert_eq!(default_of(&b.float), Value::Float(0.0));
        assert_eq!(default_of(&b.string), Value::from(""));
        assert_eq!(default_of(&b.array), Value::Array(Vec::new()));
        assert_eq!(default_of(&b.dict), Value::Map(Kwargs::new()));
        assert!(matches!(default_of(&b.datetime), Value::DateTime(_)));
        assert_eq!(default_of(&b.number), Value::Null);
    }

    #[test]
    fn test_elementary_schemas_reject_null() {
        let s = builtins().string.instantiate(Kwargs::new()).unwrap();
        assert!(!s.nullable());
        assert_eq!(s.validate(&Value::Null).unwrap_err().kind(), ErrorKind::NullNotAllowed);
    }

    #[test]
    fn test_number_bounds() {
        let s = builtins()
            .integer
            .instantiate(kwargs! { "min" => 1, "max" => 10, "default" => 1 })
            .unwrap();
        s.validate(&Value::Int(1)).unwrap();
        s.validate(&Value::Int(10)).unwrap();
        assert_eq!(s.validate(&Value::Int(0)).unwrap_err().kind(), ErrorKind::BoundViolation);
        assert_eq!(s.validate(&Value::Int(11)).unwrap_err().kind(), ErrorKind::BoundViolation);
    }

    #[test]
    fn test_number_default_must_respect_bounds() {
        let err = builtins()
            .integer
            .instantiate(kwargs! { "min" => 5 })
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::BoundViolation);
    }

    #[test]
    fn test_number_accepts_every_numeric_type() {
        let s = builtins().number.instantiate(Kwargs::new()).unwrap();
        s.validate(&Value::Int(1)).unwrap();
        s.validate(&Value::Float(1.5)).unwrap();
        s.validate(&Value::Bool(true)).unwrap();
        assert!(s.validate(&Value::from("1")).is_err());
    }

    #[test]
    fn test_float_rejects_int() {
        let s = builtins().float.instantiate(Kwargs::new()).unwrap();
        assert_eq!(s.validate(&Value::Int(1)).unwrap_err().kind(), ErrorKind::TypeMismatch);
    }

    #[test]
    fn test_integer_bounds_beyond_float_precision() {
        let edge: i64 = 1 << 53;
        let s = builtins()
            .integer
            .instantiate(kwargs! { "max" => edge, "min" => -edge })
            .unwrap();
        s.validate(&Value::Int(edge)).unwrap();
        s.validate(&Value::Int(-edge)).unwrap();
        assert_eq!(
            s.validate(&Value::Int(edge + 1)).unwrap_err().kind(),
            ErrorKind::BoundViolation
        );
        assert_eq!(
            s.validate(&Value::Int(-edge - 1)).unwrap_err().kind(),
            ErrorKind::BoundViolation
        );
    }

    #[test]
    fn test_mixed_int_and_float_bounds() {
        let s = builtins()
            .number
            .instantiate(kwargs! { "min" => 0.5, "max" => 2 })
            .unwrap();
        s.validate(&Value::Int(1)).unwrap();
        s.validate(&Value::Float(2.0)).unwrap();
        assert!(s.validate(&Value::Bool(false)).is_err());
        assert!(s.validate(&Value::Float(2.5)).is_err());
    }

    #[test]
    fn test_array_minsize_inclusive_maxsize_exclusive() {
        let s = builtins()
            .array
            .instantiate(kwargs! { "minsize" => 1, "maxsize" => 3, "default" => vec![1] })
            .unwrap();
        s.validate(&Value::from(vec![1])).unwrap();
        s.validate(&Value::from(vec![1, 2])).unwrap();
        assert_eq!(
            s.validate(&Value::from(Vec::<i64>::new())).unwrap_err().kind(),
            ErrorKind::BoundViolation
        );
        assert_eq!(
            s.validate(&Value::from(vec![1, 2, 3])).unwrap_err().kind(),
            ErrorKind::BoundViolation
        );
    }

    #[test]
    fn test_array_uniqueness() {
        let s = builtins()
            .array
            .instantiate(kwargs! { "unique" => true })
            .unwrap();
        s.validate(&Value::from(vec![1, 2, 3])).unwrap();
        let err = s.validate(&Value::from(vec![1, 2, 1])).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::BoundViolation);
        assert!(err.to_string().contains("index 2"));
    }

    #[test]
    fn test_array_items() {
        let item = builtins().integer.instantiate(kwargs! { "min" => 0 }).unwrap();
        let s = builtins()
            .array
            .instantiate(kwargs! { "items" => item })
            .unwrap();
        s.validate(&Value::from(vec![0, 4])).unwrap();
        assert_eq!(
            s.validate(&Value::from(vec![1, -1])).unwrap_err().kind(),
            ErrorKind::BoundViolation
        );
        assert_eq!(
            s.validate(&Value::from(vec![Value::from("a")])).unwrap_err().kind(),
            ErrorKind::TypeMismatch
        );
    }

    #[test]
    fn test_array_defaults_are_not_shared() {
        let ty = &builtins().array;
        let a = ty.instantiate(Kwargs::new()).unwrap();
        let b = ty.instantiate(Kwargs::new()).unwrap();
        a.set_default(Value::from(vec![1])).unwrap();
        assert_eq!(b.default(), Value::Array(Vec::new()));
    }

    #[test]
    fn test_one_of() {
        let b = builtins();
        let members = vec![
            Value::from(b.float.instantiate(Kwargs::new()).unwrap()),
            Value::from(b.integer.instantiate(Kwargs::new()).unwrap()),
        ];
        let s = b.one_of.instantiate(kwargs! { "schemas" => members }).unwrap();
        s.validate(&Value::Int(1)).unwrap();
        s.validate(&Value::Float(1.0)).unwrap();
        let err = s.validate(&Value::from("x")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::TypeMismatch);
        assert!(err.to_string().contains("FloatSchema | IntegerSchema"));
    }

    #[test]
    fn test_any() {
        let s = builtins().any.instantiate(Kwargs::new()).unwrap();
        s.validate(&Value::from("x")).unwrap();
        s.validate(&Value::from(Utc::now())).unwrap();
        s.validate(&Value::Null).unwrap();
        s.set_nullable(false);
        assert!(s.validate(&Value::Null).is_err());
    }

    #[test]
    fn test_enum_and_dict() {
        let b = builtins();
        let e = b.enumeration.instantiate(Kwargs::new()).unwrap();
        e.validate(&crate::value::EnumValue::new("Color", "Red").into()).unwrap();
        assert!(e.validate(&Value::from("Red")).is_err());

        let d = b.dict.instantiate(Kwargs::new()).unwrap();
        d.validate(&Value::Map(kwargs! { "k" => 1 })).unwrap();
        assert!(d.validate(&Value::from(vec![1])).is_err());
    }
}

//! # Error Hierarchy
//!
//! Structured error types for the schema engine, built with `thiserror`.
//! No `Box<dyn Error>`, no `.unwrap()` outside tests.
//!
//! Validation is fail-fast: the first violation found is returned and the
//! walk stops. Each variant carries enough context to locate the violation:
//! the schema that rejected the value, the expected vs actual shape, or the
//! registry key that could not be found.

use std::fmt;

use thiserror::Error;

/// Top-level error type for the schema engine.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SchemaError {
    /// A null value was given to a schema that is not nullable.
    #[error("schema '{schema}' does not accept null values")]
    NullNotAllowed {
        /// Name (or uid) of the rejecting schema.
        schema: String,
    },

    /// The value's runtime type is not accepted by the schema.
    #[error("schema '{schema}' expected {expected}, got {actual}")]
    TypeMismatch {
        /// Name (or uid) of the rejecting schema.
        schema: String,
        /// Accepted type(s), rendered for humans.
        expected: String,
        /// Runtime type of the rejected value.
        actual: String,
    },

    /// A required nested schema has no counterpart on the validated data.
    #[error("required field '{field}' of schema '{schema}' is missing")]
    RequiredFieldMissing {
        /// Name (or uid) of the schema declaring the requirement.
        schema: String,
        /// Name of the missing field.
        field: String,
    },

    /// Numeric bound, length, or uniqueness constraint failure.
    #[error("schema '{schema}' bound violated: {reason}")]
    BoundViolation {
        /// Name (or uid) of the rejecting schema.
        schema: String,
        /// Which constraint failed and by how much.
        reason: String,
    },

    /// Unknown uid, name, type, field, or keyword.
    #[error("no {kind} registered for '{key}'")]
    LookupFailure {
        /// Which table or namespace was searched.
        kind: LookupKind,
        /// The key that was not found.
        key: String,
    },

    /// A bound function's live signature diverges from its derived parameters.
    #[error("signature mismatch for function '{function}': {reason}")]
    SignatureMismatch {
        /// Recorded function name.
        function: String,
        /// What diverged.
        reason: String,
    },

    /// An attribute of a schema type refused reassignment.
    #[error("attribute '{attribute}' of schema type '{schema_type}' is read-only")]
    ReadOnly {
        /// Name of the schema type.
        schema_type: String,
        /// Name of the sealed attribute.
        attribute: String,
    },

    /// The body of a bound callable reported a failure.
    #[error("invocation of '{function}' failed: {reason}")]
    Invocation {
        /// Name of the invoked callable.
        function: String,
        /// Failure reported by the body.
        reason: String,
    },
}

/// Discriminant of [`SchemaError`], for matching without destructuring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// [`SchemaError::NullNotAllowed`]
    NullNotAllowed,
    /// [`SchemaError::TypeMismatch`]
    TypeMismatch,
    /// [`SchemaError::RequiredFieldMissing`]
    RequiredFieldMissing,
    /// [`SchemaError::BoundViolation`]
    BoundViolation,
    /// [`SchemaError::LookupFailure`]
    LookupFailure,
    /// [`SchemaError::SignatureMismatch`]
    SignatureMismatch,
    /// [`SchemaError::ReadOnly`]
    ReadOnly,
    /// [`SchemaError::Invocation`]
    Invocation,
}

/// Namespace searched by a failed lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LookupKind {
    /// Registry table keyed by schema uid.
    Uid,
    /// Registry table keyed by schema name.
    Name,
    /// Registry table keyed by runtime data type.
    Type,
    /// Nested schema (field) of a schema instance.
    Field,
    /// Keyword override passed at construction.
    Keyword,
}

impl fmt::Display for LookupKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Uid => "schema uid",
            Self::Name => "schema name",
            Self::Type => "schema for data type",
            Self::Field => "nested schema",
            Self::Keyword => "keyword",
        };
        f.write_str(s)
    }
}

impl SchemaError {
    /// The kind of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NullNotAllowed { .. } => ErrorKind::NullNotAllowed,
            Self::TypeMismatch { .. } => ErrorKind::TypeMismatch,
            Self::RequiredFieldMissing { .. } => ErrorKind::RequiredFieldMissing,
            Self::BoundViolation { .. } => ErrorKind::BoundViolation,
            Self::LookupFailure { .. } => ErrorKind::LookupFailure,
            Self::SignatureMismatch { .. } => ErrorKind::SignatureMismatch,
            Self::ReadOnly { .. } => ErrorKind::ReadOnly,
            Self::Invocation { .. } => ErrorKind::Invocation,
        }
    }

    /// Shorthand for a [`SchemaError::LookupFailure`].
    pub fn lookup(kind: LookupKind, key: impl Into<String>) -> Self {
        Self::LookupFailure {
            kind,
            key: key.into(),
        }
    }

    /// Shorthand for a [`SchemaError::TypeMismatch`].
    pub fn type_mismatch(
        schema: impl Into<String>,
        expected: impl Into<String>,
        actual: impl Into<String>,
    ) -> Self {
        Self::TypeMismatch {
            schema: schema.into(),
            expected: expected.into(),
            actual: actual.into(),
        }
    }

    /// Shorthand for a [`SchemaError::BoundViolation`].
    pub fn bound(schema: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::BoundViolation {
            schema: schema.into(),
            reason: reason.into(),
        }
    }

    /// Shorthand for a [`SchemaError::SignatureMismatch`].
    pub fn signature(function: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::SignatureMismatch {
            function: function.into(),
            reason: reason.into(),
        }
    }
}

/// Result type for schema operations.
pub type SchemaResult<T> = Result<T, SchemaError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_matches_variant() {
        let err = SchemaError::NullNotAllowed {
            schema: "x".into(),
        };
        assert_eq!(err.kind(), ErrorKind::NullNotAllowed);

        let err = SchemaError::lookup(LookupKind::Uid, "abc");
        assert_eq!(err.kind(), ErrorKind::LookupFailure);
    }

    #[test]
    fn test_required_field_message_names_field() {
        let err = SchemaError::RequiredFieldMissing {
            schema: "Point".into(),
            field: "y".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("'y'"));
        assert!(msg.contains("Point"));
    }

    #[test]
    fn test_lookup_message_names_namespace() {
        let err = SchemaError::lookup(LookupKind::Name, "missing");
        assert_eq!(err.to_string(), "no schema name registered for 'missing'");
    }

    #[test]
    fn test_type_mismatch_display() {
        let err = SchemaError::type_mismatch("age", "int", "str");
        let display = format!("{err}");
        assert!(display.contains("age"));
        assert!(display.contains("int"));
        assert!(display.contains("str"));
    }
}

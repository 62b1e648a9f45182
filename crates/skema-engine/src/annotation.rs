//! # Annotation Sources
//!
//! Type hints for a callable's parameters and return value, consumed by the
//! function signature deriver. The source is pluggable behind
//! [`AnnotationSource`]; [`DocstringAnnotations`] reads a minimal
//! line-oriented grammar from the callable's documentation:
//!
//! ```text
//! :param <type> <name>: description
//! :type <name>: <type>
//! :rtype: <type>
//! ```
//!
//! `:type` wins over the type given in `:param`.
//!
//! ## Hints
//!
//! [`resolve_hint`] turns a hint into a fresh schema instance:
//!
//! - `a,b` is a one-of over the schemas of `a` and `b`;
//! - a builtin type name (`int`, `str`, `list`, ...) is the registered
//!   schema type for that data type;
//! - a schema type name is an instance of that type;
//! - an otherwise unknown plural (`ints`) is an array whose items follow the
//!   singular hint.

use std::collections::BTreeMap;
use std::sync::OnceLock;

use regex::Regex;
use skema_core::{DataType, LookupKind, SchemaError, SchemaResult};

use crate::builtins::builtins;
use crate::callable::Callable;
use crate::kwargs;
use crate::registry;
use crate::schema::Schema;
use crate::value::{Kwargs, Value};

/// Type hints of one callable.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Annotations {
    /// Parameter name to hint.
    pub params: BTreeMap<String, String>,
    /// Return type hint.
    pub rtype: Option<String>,
}

/// Supplies type hints for callables.
pub trait AnnotationSource: Send + Sync {
    fn annotations_for(&self, callable: &Callable) -> Annotations;
}

/// Never yields a hint.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoAnnotations;

impl AnnotationSource for NoAnnotations {
    fn annotations_for(&self, _callable: &Callable) -> Annotations {
        Annotations::default()
    }
}

/// Parses `:param` / `:type` / `:rtype` lines of the callable's documentation.
#[derive(Debug, Clone, Copy, Default)]
pub struct DocstringAnnotations;

static PARAM_RE: OnceLock<Option<Regex>> = OnceLock::new();
static TYPE_RE: OnceLock<Option<Regex>> = OnceLock::new();
static RTYPE_RE: OnceLock<Option<Regex>> = OnceLock::new();

fn pattern(cell: &'static OnceLock<Option<Regex>>, source: &str) -> Option<&'static Regex> {
    cell.get_or_init(|| Regex::new(source).ok()).as_ref()
}

impl AnnotationSource for DocstringAnnotations {
    fn annotations_for(&self, callable: &Callable) -> Annotations {
        let mut annotations = Annotations::default();
        let Some(doc) = callable.doc() else {
            return annotations;
        };

        if let Some(re) = pattern(&PARAM_RE, r":param\s+(?P<hint>[^:\s]+)\s+(?P<name>\w+)\s*:") {
            for caps in re.captures_iter(doc) {
                annotations
                    .params
                    .insert(caps["name"].to_string(), caps["hint"].to_string());
            }
        }
        if let Some(re) = pattern(&TYPE_RE, r":type\s+(?P<name>\w+)\s*:[ \t]*(?P<hint>[^\n]+)") {
            for caps in re.captures_iter(doc) {
                annotations
                    .params
                    .insert(caps["name"].to_string(), caps["hint"].trim().to_string());
            }
        }
        if let Some(re) = pattern(&RTYPE_RE, r":rtype\s*:[ \t]*(?P<hint>[^\n]+)") {
            annotations.rtype = re
                .captures(doc)
                .map(|caps| caps["hint"].trim().to_string());
        }
        annotations
    }
}

/// Build a schema instance for a type hint.
pub fn resolve_hint(hint: &str) -> SchemaResult<Schema> {
    let hint = hint.trim();

    if hint.contains(',') {
        let schemas = hint
            .split(',')
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .map(|part| resolve_hint(part).map(Value::from))
            .collect::<SchemaResult<Vec<_>>>()?;
        return builtins()
            .one_of
            .instantiate(kwargs! { "schemas" => schemas });
    }

    if let Some(data_type) = DataType::from_name(hint) {
        let schema_type = match data_type {
            DataType::Any => builtins().any.clone(),
            other => registry::lookup_by_type(&other, true)?,
        };
        return schema_type.instantiate(Kwargs::new());
    }

    if let Ok(schema_type) = registry::lookup_type_by_name(hint) {
        return schema_type.instantiate(Kwargs::new());
    }

    if let Some(singular) = hint.strip_suffix('s').filter(|s| !s.is_empty()) {
        if let Ok(items) = resolve_hint(singular) {
            return builtins()
                .array
                .instantiate(kwargs! { "items" => items });
        }
    }

    Err(SchemaError::lookup(LookupKind::Type, hint))
}

//! # Host Value Model
//!
//! The runtime data the engine validates, stores in container slots, and
//! dumps. [`Value`] is a closed sum of the builtin kinds plus three shared
//! reference kinds: [`Object`] records, [`Callable`] functions and live
//! [`Schema`] instances.
//!
//! ## Sharing
//!
//! Scalars, arrays and maps have value semantics: cloning a `Value::Array`
//! copies it, so a default handed to two containers is never aliased.
//! `Object`, `Callable` and `Schema` are `Arc`-backed handles; cloning them
//! shares the underlying record.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Serialize, Serializer};
use skema_core::{ClassDef, DataType};

use crate::callable::Callable;
use crate::schema::{Container, Schema};

/// Keyword arguments: constructor overrides and call-site keywords.
pub type Kwargs = BTreeMap<String, Value>;

/// Build a [`Kwargs`] map from `key => value` pairs.
///
/// ```
/// use skema_engine::kwargs;
/// let kw = kwargs! { "nullable" => false, "default" => 0 };
/// assert_eq!(kw.len(), 2);
/// ```
#[macro_export]
macro_rules! kwargs {
    () => {
        $crate::value::Kwargs::new()
    };
    ($($key:expr => $value:expr),+ $(,)?) => {{
        let mut map = $crate::value::Kwargs::new();
        $(
            map.insert(
                ::std::string::String::from($key),
                $crate::value::Value::from($value),
            );
        )+
        map
    }};
}

/// A member of an enumeration.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EnumValue {
    /// Name of the enumeration.
    pub family: String,
    /// Name of the member.
    pub member: String,
}

impl EnumValue {
    pub fn new(family: impl Into<String>, member: impl Into<String>) -> Self {
        Self {
            family: family.into(),
            member: member.into(),
        }
    }
}

/// A runtime value.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Array(Vec<Value>),
    Map(BTreeMap<String, Value>),
    DateTime(DateTime<Utc>),
    Enum(EnumValue),
    Function(Callable),
    Object(Object),
    Schema(Schema),
}

impl Value {
    /// Runtime type used for registry dispatch and type validation.
    ///
    /// An `Object` without a class is typed `Any`; a schema instance is typed
    /// by its schema type.
    pub fn data_type(&self) -> DataType {
        match self {
            Self::Null => DataType::Null,
            Self::Bool(_) => DataType::Bool,
            Self::Int(_) => DataType::Int,
            Self::Float(_) => DataType::Float,
            Self::Str(_) => DataType::Str,
            Self::Array(_) => DataType::Array,
            Self::Map(_) => DataType::Map,
            Self::DateTime(_) => DataType::DateTime,
            Self::Enum(_) => DataType::Enum,
            Self::Function(_) => DataType::Function,
            Self::Object(obj) => obj
                .class()
                .map(|class| class.data_type())
                .unwrap_or(DataType::Any),
            Self::Schema(schema) => schema.schema_type().as_data_type(),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Whether the value exposes a structural member called `name`.
    ///
    /// Objects expose their fields, maps their keys, and schema instances
    /// their identity attributes and nested schemas.
    pub fn has_attr(&self, name: &str) -> bool {
        match self {
            Self::Object(obj) => obj.has(name),
            Self::Map(map) => map.contains_key(name),
            Self::Schema(schema) => schema.has_attr(name),
            _ => false,
        }
    }

    /// The structural member `name`, if present. See [`Value::has_attr`].
    pub fn attr(&self, name: &str) -> Option<Value> {
        match self {
            Self::Object(obj) => obj.get(name),
            Self::Map(map) => map.get(name).cloned(),
            Self::Schema(schema) => schema.get_attr(name).ok(),
            _ => None,
        }
    }

    /// Length of strings (in characters), arrays and maps.
    pub fn len(&self) -> Option<usize> {
        match self {
            Self::Str(s) => Some(s.chars().count()),
            Self::Array(items) => Some(items.len()),
            Self::Map(map) => Some(map.len()),
            _ => None,
        }
    }

    /// Numeric view of booleans, integers and floats.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            Self::Int(i) => Some(*i as f64),
            Self::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Bool(b) => Some(i64::from(*b)),
            Self::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Self::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_schema(&self) -> Option<&Schema> {
        match self {
            Self::Schema(schema) => Some(schema),
            _ => None,
        }
    }

    pub fn as_callable(&self) -> Option<&Callable> {
        match self {
            Self::Function(callable) => Some(callable),
            _ => None,
        }
    }

    /// Convert to plain JSON. Schema instances become their dump mapping,
    /// date-times RFC 3339 strings, enum members their member name, and
    /// callables their name. Non-finite floats become `null`.
    pub fn to_json(&self) -> serde_json::Value {
        use serde_json::Value as Json;
        match self {
            Self::Null => Json::Null,
            Self::Bool(b) => Json::Bool(*b),
            Self::Int(i) => Json::from(*i),
            Self::Float(f) => serde_json::Number::from_f64(*f)
                .map(Json::Number)
                .unwrap_or(Json::Null),
            Self::Str(s) => Json::String(s.clone()),
            Self::Array(items) => Json::Array(items.iter().map(Value::to_json).collect()),
            Self::Map(map) => Json::Object(
                map.iter()
                    .map(|(k, v)| (k.clone(), v.to_json()))
                    .collect(),
            ),
            Self::DateTime(dt) => Json::String(dt.to_rfc3339()),
            Self::Enum(e) => Json::String(e.member.clone()),
            Self::Function(c) => Json::String(c.name().to_string()),
            Self::Object(obj) => Json::Object(
                obj.fields()
                    .iter()
                    .map(|(k, v)| (k.clone(), v.to_json()))
                    .collect(),
            ),
            Self::Schema(schema) => schema.to_json(),
        }
    }

    /// Convert from plain JSON. Objects become maps; integral numbers that
    /// fit in `i64` become `Int`, every other number `Float`.
    pub fn from_json(json: &serde_json::Value) -> Self {
        use serde_json::Value as Json;
        match json {
            Json::Null => Self::Null,
            Json::Bool(b) => Self::Bool(*b),
            Json::Number(n) => match n.as_i64() {
                Some(i) => Self::Int(i),
                None => Self::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            Json::String(s) => Self::Str(s.clone()),
            Json::Array(items) => Self::Array(items.iter().map(Self::from_json).collect()),
            Json::Object(map) => Self::Map(
                map.iter()
                    .map(|(k, v)| (k.clone(), Self::from_json(v)))
                    .collect(),
            ),
        }
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_json())
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Self::Int(i64::from(v))
    }
}

impl From<usize> for Value {
    fn from(v: usize) -> Self {
        Self::Int(i64::try_from(v).unwrap_or(i64::MAX))
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::Str(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Self::Str(v)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(v: Vec<T>) -> Self {
        Self::Array(v.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Self::Null)
    }
}

impl From<BTreeMap<String, Value>> for Value {
    fn from(v: BTreeMap<String, Value>) -> Self {
        Self::Map(v)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(v: DateTime<Utc>) -> Self {
        Self::DateTime(v)
    }
}

impl From<EnumValue> for Value {
    fn from(v: EnumValue) -> Self {
        Self::Enum(v)
    }
}

impl From<Callable> for Value {
    fn from(v: Callable) -> Self {
        Self::Function(v)
    }
}

impl From<Object> for Value {
    fn from(v: Object) -> Self {
        Self::Object(v)
    }
}

impl From<Schema> for Value {
    fn from(v: Schema) -> Self {
        Self::Schema(v)
    }
}

// ---------------------------------------------------------------------------
// Object
// ---------------------------------------------------------------------------

/// A shared, mutable record of named fields with an optional class.
///
/// Objects are containers: a schema can be attached to an object and will
/// store its value under the schema's private slot key.
#[derive(Clone)]
pub struct Object {
    inner: Arc<ObjectInner>,
}

struct ObjectInner {
    class: Option<Arc<ClassDef>>,
    fields: RwLock<BTreeMap<String, Value>>,
}

impl Object {
    /// Create an untyped, empty object.
    pub fn new() -> Self {
        Self::build(None)
    }

    /// Create an empty instance of `class`.
    pub fn of_class(class: &Arc<ClassDef>) -> Self {
        Self::build(Some(Arc::clone(class)))
    }

    fn build(class: Option<Arc<ClassDef>>) -> Self {
        Self {
            inner: Arc::new(ObjectInner {
                class,
                fields: RwLock::new(BTreeMap::new()),
            }),
        }
    }

    /// Builder-style field assignment.
    pub fn with(self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(name, value);
        self
    }

    pub fn class(&self) -> Option<&Arc<ClassDef>> {
        self.inner.class.as_ref()
    }

    pub fn get(&self, name: &str) -> Option<Value> {
        self.inner.fields.read().get(name).cloned()
    }

    pub fn set(&self, name: impl Into<String>, value: impl Into<Value>) {
        self.inner.fields.write().insert(name.into(), value.into());
    }

    pub fn remove(&self, name: &str) -> Option<Value> {
        self.inner.fields.write().remove(name)
    }

    pub fn has(&self, name: &str) -> bool {
        self.inner.fields.read().contains_key(name)
    }

    /// Snapshot of all fields.
    pub fn fields(&self) -> BTreeMap<String, Value> {
        self.inner.fields.read().clone()
    }

    /// Whether both handles share the same record.
    pub fn ptr_eq(&self, other: &Object) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Default for Object {
    fn default() -> Self {
        Self::new()
    }
}

impl PartialEq for Object {
    fn eq(&self, other: &Self) -> bool {
        if self.ptr_eq(other) {
            return true;
        }
        let same_class = match (self.class(), other.class()) {
            (Some(a), Some(b)) => a.data_type() == b.data_type(),
            (None, None) => true,
            _ => false,
        };
        same_class && self.fields() == other.fields()
    }
}

impl fmt::Debug for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Object")
            .field("class", &self.class().map(|c| c.name().to_string()))
            .field("fields", &self.fields())
            .finish()
    }
}

impl Container for Object {
    fn read_slot(&self, key: &str) -> Option<Value> {
        self.get(key)
    }

    fn write_slot(&self, key: &str, value: Value) {
        self.set(key, value);
    }

    fn clear_slot(&self, key: &str) -> bool {
        self.remove(key).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_data_type_of_scalars() {
        assert_eq!(Value::from(true).data_type(), DataType::Bool);
        assert_eq!(Value::from(3).data_type(), DataType::Int);
        assert_eq!(Value::from(3.5).data_type(), DataType::Float);
        assert_eq!(Value::from("a").data_type(), DataType::Str);
        assert_eq!(Value::Null.data_type(), DataType::Null);
    }

    #[test]
    fn test_object_attrs() {
        let obj = Object::new().with("x", 1);
        let value = Value::from(obj.clone());
        assert!(value.has_attr("x"));
        assert!(!value.has_attr("y"));
        assert_eq!(value.attr("x"), Some(Value::Int(1)));

        obj.set("y", 2);
        assert_eq!(value.attr("y"), Some(Value::Int(2)));
    }

    #[test]
    fn test_object_class_data_type() {
        let class = ClassDef::new("Point");
        let obj = Object::of_class(&class);
        assert_eq!(Value::from(obj).data_type(), class.data_type());
        assert_eq!(Value::from(Object::new()).data_type(), DataType::Any);
    }

    #[test]
    fn test_map_attrs() {
        let value = Value::Map(kwargs! { "a" => 1 });
        assert!(value.has_attr("a"));
        assert_eq!(value.attr("a"), Some(Value::Int(1)));
        assert_eq!(value.attr("b"), None);
    }

    #[test]
    fn test_len() {
        assert_eq!(Value::from("héllo").len(), Some(5));
        assert_eq!(Value::from(vec![1, 2, 3]).len(), Some(3));
        assert_eq!(Value::from(1).len(), None);
    }

    #[test]
    fn test_json_conversion() {
        let value = Value::Map(kwargs! {
            "n" => 1,
            "f" => 1.5,
            "s" => "x",
            "l" => vec![true, false],
            "z" => Value::Null,
        });
        let json = value.to_json();
        assert_eq!(
            json,
            serde_json::json!({"n": 1, "f": 1.5, "s": "x", "l": [true, false], "z": null})
        );
        assert_eq!(Value::from_json(&json), value);
    }

    #[test]
    fn test_serialize_matches_to_json() {
        let value = Value::from(vec![Value::from(1), Value::from("a")]);
        let text = serde_json::to_string(&value).unwrap();
        assert_eq!(text, "[1,\"a\"]");
    }

    #[test]
    fn test_array_clone_is_not_aliased() {
        let a = Value::Array(vec![]);
        let mut b = a.clone();
        if let Value::Array(items) = &mut b {
            items.push(Value::Int(1));
        }
        assert_eq!(a.len(), Some(0));
    }
}

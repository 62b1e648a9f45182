//! # Runtime Data Types
//!
//! The type tower used by the registry to dispatch a runtime value to the
//! schema type responsible for it, and by validation to decide type
//! membership.
//!
//! ## Tower
//!
//! ```text
//! Any ─┬─ Null
//!      ├─ Number ─┬─ Int ── Bool
//!      │          └─ Float
//!      ├─ Str, Array, Map, DateTime, Enum, Function
//!      └─ Class(..)  user classes and schema types, single inheritance
//! ```
//!
//! `Bool` sits under `Int` and `Int` under `Number`, so a schema declared for
//! `Number` accepts any integer or boolean, and a best-effort registry lookup
//! for `Bool` falls back to the nearest registered ancestor.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use crate::identity::Uid;

/// A user-declared runtime type: a plain data class or a schema type.
///
/// Implementors form a single-inheritance chain through [`parent_type`].
///
/// [`parent_type`]: TypeNode::parent_type
pub trait TypeNode: Send + Sync + fmt::Debug {
    /// Identity of the type. Two nodes with the same uid are the same type.
    fn type_uid(&self) -> &Uid;

    /// Human-readable type name.
    fn type_name(&self) -> &str;

    /// The direct supertype. `None` means the type derives from [`DataType::Any`].
    fn parent_type(&self) -> Option<DataType>;
}

/// Runtime type of a value.
#[derive(Clone, Debug)]
pub enum DataType {
    /// Root of the tower; every type is a subtype of `Any`.
    Any,
    /// The type of the absent value.
    Null,
    /// Abstract numeric type.
    Number,
    /// 64-bit signed integer.
    Int,
    /// Boolean, a subtype of `Int`.
    Bool,
    /// 64-bit float.
    Float,
    /// UTF-8 string.
    Str,
    /// Ordered sequence.
    Array,
    /// String-keyed mapping.
    Map,
    /// UTC date-time.
    DateTime,
    /// Enumeration member.
    Enum,
    /// Host callable.
    Function,
    /// User class or schema type.
    Class(Arc<dyn TypeNode>),
}

impl DataType {
    /// The direct supertype, or `None` for [`DataType::Any`].
    pub fn parent(&self) -> Option<DataType> {
        match self {
            Self::Any => None,
            Self::Bool => Some(Self::Int),
            Self::Int | Self::Float => Some(Self::Number),
            Self::Null
            | Self::Number
            | Self::Str
            | Self::Array
            | Self::Map
            | Self::DateTime
            | Self::Enum
            | Self::Function => Some(Self::Any),
            Self::Class(node) => Some(node.parent_type().unwrap_or(Self::Any)),
        }
    }

    /// Iterate this type and its supertypes, nearest first, ending at `Any`.
    pub fn ancestors(&self) -> Ancestors {
        Ancestors {
            next: Some(self.clone()),
        }
    }

    /// Whether `self` is `other` or derives from it.
    pub fn is_subtype_of(&self, other: &DataType) -> bool {
        self.ancestors().any(|t| &t == other)
    }

    /// Canonical name used in messages and documentation hints.
    pub fn name(&self) -> String {
        match self {
            Self::Any => "any".into(),
            Self::Null => "null".into(),
            Self::Number => "number".into(),
            Self::Int => "int".into(),
            Self::Bool => "bool".into(),
            Self::Float => "float".into(),
            Self::Str => "str".into(),
            Self::Array => "array".into(),
            Self::Map => "map".into(),
            Self::DateTime => "datetime".into(),
            Self::Enum => "enum".into(),
            Self::Function => "function".into(),
            Self::Class(node) => node.type_name().to_string(),
        }
    }

    /// Parse a builtin type name, accepting the common aliases.
    ///
    /// Class types are not known here; they are resolved by name through
    /// the schema registry.
    pub fn from_name(name: &str) -> Option<DataType> {
        let ty = match name.trim() {
            "any" | "object" => Self::Any,
            "null" | "none" | "None" => Self::Null,
            "number" | "Number" => Self::Number,
            "int" | "integer" | "long" => Self::Int,
            "bool" | "boolean" => Self::Bool,
            "float" | "double" => Self::Float,
            "str" | "string" => Self::Str,
            "list" | "array" | "tuple" => Self::Array,
            "dict" | "map" | "mapping" => Self::Map,
            "datetime" => Self::DateTime,
            "enum" | "Enum" => Self::Enum,
            "function" | "callable" => Self::Function,
            _ => return None,
        };
        Some(ty)
    }

    /// The class node, if this is a [`DataType::Class`].
    pub fn as_class(&self) -> Option<&Arc<dyn TypeNode>> {
        match self {
            Self::Class(node) => Some(node),
            _ => None,
        }
    }
}

impl PartialEq for DataType {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Class(a), Self::Class(b)) => a.type_uid() == b.type_uid(),
            (a, b) => std::mem::discriminant(a) == std::mem::discriminant(b),
        }
    }
}

impl Eq for DataType {}

impl Hash for DataType {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        if let Self::Class(node) = self {
            node.type_uid().hash(state);
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name())
    }
}

/// Iterator over a type and its supertypes. See [`DataType::ancestors`].
#[derive(Debug, Clone)]
pub struct Ancestors {
    next: Option<DataType>,
}

impl Iterator for Ancestors {
    type Item = DataType;

    fn next(&mut self) -> Option<DataType> {
        let current = self.next.take()?;
        self.next = current.parent();
        Some(current)
    }
}

/// A plain data class, used to type object records at runtime.
#[derive(Debug)]
pub struct ClassDef {
    uid: Uid,
    name: String,
    base: Option<DataType>,
}

impl ClassDef {
    /// Declare a class deriving directly from `Any`.
    pub fn new(name: impl Into<String>) -> Arc<Self> {
        Arc::new(Self {
            uid: Uid::generate(),
            name: name.into(),
            base: None,
        })
    }

    /// Declare a class deriving from `base`.
    pub fn extending(name: impl Into<String>, base: DataType) -> Arc<Self> {
        Arc::new(Self {
            uid: Uid::generate(),
            name: name.into(),
            base: Some(base),
        })
    }

    /// Class name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The class as a runtime data type.
    pub fn data_type(self: &Arc<Self>) -> DataType {
        DataType::Class(Arc::clone(self) as Arc<dyn TypeNode>)
    }
}

impl TypeNode for ClassDef {
    fn type_uid(&self) -> &Uid {
        &self.uid
    }

    fn type_name(&self) -> &str {
        &self.name
    }

    fn parent_type(&self) -> Option<DataType> {
        self.base.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_tower() {
        assert!(DataType::Bool.is_subtype_of(&DataType::Int));
        assert!(DataType::Bool.is_subtype_of(&DataType::Number));
        assert!(DataType::Int.is_subtype_of(&DataType::Number));
        assert!(DataType::Float.is_subtype_of(&DataType::Number));
        assert!(!DataType::Float.is_subtype_of(&DataType::Int));
        assert!(!DataType::Number.is_subtype_of(&DataType::Int));
    }

    #[test]
    fn test_everything_is_any() {
        let class = ClassDef::new("Thing");
        for ty in [DataType::Null, DataType::Str, DataType::Bool, class.data_type()] {
            assert!(ty.is_subtype_of(&DataType::Any), "{ty} should derive from any");
        }
    }

    #[test]
    fn test_ancestors_nearest_first() {
        let chain: Vec<String> = DataType::Bool.ancestors().map(|t| t.name()).collect();
        assert_eq!(chain, vec!["bool", "int", "number", "any"]);
    }

    #[test]
    fn test_class_inheritance() {
        let base = ClassDef::new("Shape");
        let derived = ClassDef::extending("Circle", base.data_type());
        assert!(derived.data_type().is_subtype_of(&base.data_type()));
        assert!(!base.data_type().is_subtype_of(&derived.data_type()));
    }

    #[test]
    fn test_class_equality_is_by_uid() {
        let a = ClassDef::new("Same");
        let b = ClassDef::new("Same");
        assert_eq!(a.data_type(), a.data_type());
        assert_ne!(a.data_type(), b.data_type());
    }

    #[test]
    fn test_from_name_aliases() {
        assert_eq!(DataType::from_name("integer"), Some(DataType::Int));
        assert_eq!(DataType::from_name("string"), Some(DataType::Str));
        assert_eq!(DataType::from_name("list"), Some(DataType::Array));
        assert_eq!(DataType::from_name("dict"), Some(DataType::Map));
        assert_eq!(DataType::from_name("Point"), None);
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn builtin() -> impl Strategy<Value = DataType> {
        prop_oneof![
            Just(DataType::Any),
            Just(DataType::Null),
            Just(DataType::Number),
            Just(DataType::Int),
            Just(DataType::Bool),
            Just(DataType::Float),
            Just(DataType::Str),
            Just(DataType::Array),
            Just(DataType::Map),
            Just(DataType::DateTime),
            Just(DataType::Enum),
            Just(DataType::Function),
        ]
    }

    proptest! {
        /// Subtyping is reflexive.
        #[test]
        fn subtype_reflexive(ty in builtin()) {
            prop_assert!(ty.is_subtype_of(&ty));
        }

        /// The ancestor chain always terminates at `Any`.
        #[test]
        fn ancestors_end_at_any(ty in builtin()) {
            let last = ty.ancestors().last();
            prop_assert_eq!(last, Some(DataType::Any));
        }

        /// Names of builtins parse back to the same type.
        #[test]
        fn name_round_trips(ty in builtin()) {
            prop_assert_eq!(DataType::from_name(&ty.name()), Some(ty));
        }
    }
}

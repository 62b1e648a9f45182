//! # skema-engine — Runtime Schema Engine
//!
//! Self-describing schema descriptors that validate data, store attribute
//! values on the objects they are attached to, and nest into trees.
//!
//! ## Components
//!
//! - [`schema`]: the schema entity ([`Schema`]) and its types
//!   ([`SchemaType`]), with accessor hooks and per-type behaviors.
//! - [`resolver`]: content resolution, turning raw type members into nested
//!   schema instances.
//! - [`registry`]: the process-wide lookup tables (by data type, uid, name
//!   and type name).
//! - [`validate`]: the generic validation walk and `dump`.
//! - [`function`]: schemas derived from callable signatures, with
//!   [`annotation`] sources for type hints.
//! - [`class`]: schema types derived from a class through a prototype
//!   object.
//! - [`builtins`], [`elementary`], [`reference`]: the builtin schema types.
//! - [`value`], [`dynamic`], [`callable`]: the runtime values a schema
//!   validates.
//!
//! ## Example
//!
//! ```
//! use skema_engine::{builtins, kwargs, validate, Object, SchemaType};
//!
//! let coord = |name: &str| {
//!     builtins()
//!         .integer
//!         .instantiate(kwargs! { "name" => name, "nullable" => false })
//!         .unwrap()
//! };
//! let point = SchemaType::builder("Point")
//!     .member("x", coord("x"))
//!     .member("y", coord("y"))
//!     .member("required", vec!["x", "y"])
//!     .build();
//!
//! let schema = point.instantiate(kwargs! { "x" => 1, "y" => 2 }).unwrap();
//! assert!(validate(&schema, &Object::new().with("x", 3).with("y", 4).into()).is_ok());
//! assert_eq!(schema.dump(), kwargs! { "x" => 1, "y" => 2 });
//! ```
//!
//! ## Crate Policy
//!
//! - No `unsafe` code.
//! - No `.unwrap()` outside tests.
//! - No locks held across hooks, behaviors or calls into another schema.
//! - Logging through `tracing` only; no subscriber is installed here.

pub mod annotation;
pub mod builtins;
pub mod callable;
pub mod class;
pub mod dynamic;
pub mod elementary;
pub mod function;
pub mod reference;
pub mod registry;
pub mod resolver;
pub mod schema;
pub mod validate;
pub mod value;

pub use annotation::{resolve_hint, AnnotationSource, Annotations, DocstringAnnotations, NoAnnotations};
pub use builtins::{builtins, Builtins};
pub use callable::{BoundArgs, Callable, CallableBuilder, Signature};
pub use class::schema_for_class;
pub use dynamic::{DynamicValue, This};
pub use function::{derive_params, function_type, FunctionSchema, ParamKind, ParamSchema};
pub use registry::Registry;
pub use resolver::{resolve_content, ResolveOptions, ResolveReport};
pub use schema::{
    is_identity, Accessors, Container, Member, Schema, SchemaBehavior, SchemaType,
    SchemaTypeBuilder, SchemaTypeRef, IDENTITY_ATTRIBUTES,
};
pub use validate::{dump, validate, validate_base};
pub use value::{EnumValue, Kwargs, Object, Value};

pub use skema_core::{ClassDef, DataType, ErrorKind, LookupKind, SchemaError, SchemaResult, Uid};

//! # Schema Entity
//!
//! A [`Schema`] is simultaneously a type descriptor and a value container:
//!
//! - as a **descriptor**, it validates candidate data ([`Schema::validate`])
//!   and, when attached to a [`Container`], routes get/set/delete of one
//!   attribute through that validation and a private storage slot;
//! - as a **container**, it holds the live values of its own nested schemas,
//!   which are the [`Member::Schema`] entries declared on its [`SchemaType`].
//!
//! ## Types and instances
//!
//! A [`SchemaType`] is declared once through [`SchemaType::builder`]. Its
//! members are raw (plain values, dynamic providers, self-reference
//! placeholders, typed field declarations) until the content resolver turns
//! them into nested schema instances. Types form a single-inheritance chain;
//! members, declared data types, the registration flag and the
//! [`SchemaBehavior`] are all inherited along that chain.
//!
//! Instances are created with [`SchemaType::instantiate`]. Every instance
//! carries the identity attributes `name`, `uid`, `doc`, `default`,
//! `required`, `version` and `nullable` as typed fields. These are not nested
//! schemas: they never appear in [`Schema::dump`] and are not part of
//! structural equality.
//!
//! ## Locking
//!
//! Per-instance state sits behind a `parking_lot::RwLock`. No lock is held
//! while calling accessor hooks, behaviors, or another schema.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use skema_core::{DataType, LookupKind, SchemaError, SchemaResult, TypeNode, Uid};

use crate::builtins::builtins;
use crate::dynamic::{DynamicValue, This};
use crate::registry;
use crate::resolver::{self, ResolveContext, ResolveOptions, ResolveReport};
use crate::validate::validate_base;
use crate::value::{Kwargs, Value};

/// Attributes every schema instance carries as typed fields.
pub const IDENTITY_ATTRIBUTES: [&str; 7] = [
    "name", "uid", "doc", "default", "required", "version", "nullable",
];

/// Whether `name` is one of [`IDENTITY_ATTRIBUTES`].
pub fn is_identity(name: &str) -> bool {
    IDENTITY_ATTRIBUTES.contains(&name)
}

/// Shared handle to a schema type.
pub type SchemaTypeRef = Arc<SchemaType>;

// ---------------------------------------------------------------------------
// Members
// ---------------------------------------------------------------------------

/// A declared attribute of a schema type.
#[derive(Debug, Clone)]
pub enum Member {
    /// A plain value; resolved into a schema of the value's runtime type.
    Value(Value),
    /// A deferred value; evaluated by the resolver, except for `default`,
    /// which stays a provider evaluated once per instantiation.
    Dynamic(DynamicValue),
    /// A nested instance of the declaring type.
    This(This),
    /// A nested instance of the given type, built with the given overrides.
    Field(SchemaTypeRef, Kwargs),
    /// A resolved nested schema.
    Schema(Schema),
}

impl Member {
    /// The nested schema, once the member is resolved.
    pub fn as_schema(&self) -> Option<&Schema> {
        match self {
            Self::Schema(schema) => Some(schema),
            _ => None,
        }
    }
}

impl From<Value> for Member {
    fn from(value: Value) -> Self {
        match value {
            Value::Schema(schema) => Self::Schema(schema),
            other => Self::Value(other),
        }
    }
}

impl From<Schema> for Member {
    fn from(schema: Schema) -> Self {
        Self::Schema(schema)
    }
}

impl From<DynamicValue> for Member {
    fn from(provider: DynamicValue) -> Self {
        Self::Dynamic(provider)
    }
}

impl From<This> for Member {
    fn from(this: This) -> Self {
        Self::This(this)
    }
}

// ---------------------------------------------------------------------------
// Behavior
// ---------------------------------------------------------------------------

/// Per-type validation and change hooks, inherited along the type chain.
///
/// An implementation that extends rather than replaces the generic
/// algorithm calls [`validate_base`] itself.
pub trait SchemaBehavior: Send + Sync {
    /// Validate `data` against `schema`. `owner` is the container schema the
    /// value is being assigned into, if any.
    fn validate(&self, schema: &Schema, data: &Value, owner: Option<&Schema>) -> SchemaResult<()> {
        let _ = owner;
        validate_base(schema, data)
    }

    /// `attribute` of `container` is about to be assigned `value`, which
    /// already passed validation. An error aborts the assignment before
    /// anything is stored.
    fn before_write(&self, _container: &Schema, _attribute: &str, _value: &Value) -> SchemaResult<()> {
        Ok(())
    }

    /// A nested schema of `container` produced `value`.
    fn on_read(&self, _container: &Schema, _attribute: &str, _value: &Value) {}

    /// `attribute` of `container` was assigned `value`. The assignment is
    /// already committed when this runs.
    fn on_write(&self, _container: &Schema, _attribute: &str, _value: &Value) -> SchemaResult<()> {
        Ok(())
    }

    /// A nested schema of `container` was deleted.
    fn on_delete(&self, _container: &Schema, _attribute: &str) {}
}

struct BaseBehavior;

impl SchemaBehavior for BaseBehavior {}

// ---------------------------------------------------------------------------
// Containers and accessors
// ---------------------------------------------------------------------------

/// Anything a schema can be attached to as an attribute.
pub trait Container {
    fn read_slot(&self, key: &str) -> Option<Value>;

    fn write_slot(&self, key: &str, value: Value);

    /// Remove a slot, returning whether it existed.
    fn clear_slot(&self, key: &str) -> bool;

    /// The container as a schema, when it is one. Reference schemas
    /// delegate to it.
    fn owner_schema(&self) -> Option<Schema> {
        None
    }

    fn notify_read(&self, _schema: &Schema, _value: &Value) {}

    /// Runs before `schema` stores `value`; an error leaves the container
    /// unchanged.
    fn check_write(&self, _schema: &Schema, _value: &Value) -> SchemaResult<()> {
        Ok(())
    }

    fn notify_write(&self, _schema: &Schema, _value: &Value) -> SchemaResult<()> {
        Ok(())
    }

    fn notify_delete(&self, _schema: &Schema) {}
}

/// Custom read hook. A `Null` result falls back to the slot.
pub type Getter = Arc<dyn Fn(&dyn Container) -> Value + Send + Sync>;
/// Custom write hook, called with an already validated value.
pub type Setter = Arc<dyn Fn(&dyn Container, Value) + Send + Sync>;
/// Custom delete hook.
pub type Deleter = Arc<dyn Fn(&dyn Container) + Send + Sync>;

/// Custom storage hooks replacing the private-slot default.
#[derive(Clone, Default)]
pub struct Accessors {
    getter: Option<Getter>,
    setter: Option<Setter>,
    deleter: Option<Deleter>,
}

impl Accessors {
    /// No hooks: every operation uses the private slot.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the slot read.
    pub fn getter<F>(mut self, f: F) -> Self
    where
        F: Fn(&dyn Container) -> Value + Send + Sync + 'static,
    {
        self.getter = Some(Arc::new(f));
        self
    }

    /// Replace the slot write. Runs after validation.
    pub fn setter<F>(mut self, f: F) -> Self
    where
        F: Fn(&dyn Container, Value) + Send + Sync + 'static,
    {
        self.setter = Some(Arc::new(f));
        self
    }

    /// Replace the slot removal.
    pub fn deleter<F>(mut self, f: F) -> Self
    where
        F: Fn(&dyn Container) + Send + Sync + 'static,
    {
        self.deleter = Some(Arc::new(f));
        self
    }
}

impl fmt::Debug for Accessors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Accessors")
            .field("getter", &self.getter.is_some())
            .field("setter", &self.setter.is_some())
            .field("deleter", &self.deleter.is_some())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Schema types
// ---------------------------------------------------------------------------

/// A schema type: the class of a family of schema instances.
pub struct SchemaType {
    uid: Uid,
    name: String,
    base: Option<SchemaTypeRef>,
    data_types: Vec<DataType>,
    register_instances: Option<bool>,
    behavior: Option<Arc<dyn SchemaBehavior>>,
    readonly: BTreeSet<String>,
    members: RwLock<BTreeMap<String, Member>>,
}

impl SchemaType {
    /// Start declaring a schema type called `name`.
    pub fn builder(name: impl Into<String>) -> SchemaTypeBuilder {
        SchemaTypeBuilder {
            name: name.into(),
            base: None,
            data_types: Vec::new(),
            register_instances: None,
            behavior: None,
            readonly: BTreeSet::new(),
            members: BTreeMap::new(),
        }
    }

    /// Identity of the type.
    pub fn uid(&self) -> &Uid {
        &self.uid
    }

    /// Type name; also its key in the registry's type-name table.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Direct parent type. Only the root `Schema` type has none.
    pub fn base(&self) -> Option<&SchemaTypeRef> {
        self.base.as_ref()
    }

    /// Data types declared on this type itself.
    pub fn data_types(&self) -> &[DataType] {
        &self.data_types
    }

    /// Data types validated by this type: its own, else the nearest
    /// ancestor's non-empty declaration.
    pub fn effective_data_types(&self) -> Vec<DataType> {
        self.lineage()
            .into_iter()
            .find(|ty| !ty.data_types.is_empty())
            .map(|ty| ty.data_types.clone())
            .unwrap_or_default()
    }

    /// Whether instances register themselves in the global registry.
    pub fn registers_instances(&self) -> bool {
        self.lineage()
            .into_iter()
            .find_map(|ty| ty.register_instances)
            .unwrap_or(false)
    }

    /// The nearest declared behavior along the chain.
    pub fn behavior(&self) -> Arc<dyn SchemaBehavior> {
        self.lineage()
            .into_iter()
            .find_map(|ty| ty.behavior.clone())
            .unwrap_or_else(|| Arc::new(BaseBehavior))
    }

    /// Whether `self` is `other` or derives from it.
    pub fn extends(&self, other: &SchemaType) -> bool {
        self.lineage().into_iter().any(|ty| ty.uid == other.uid)
    }

    /// Whether `name` is sealed on this type or an ancestor.
    pub fn is_readonly(&self, name: &str) -> bool {
        self.lineage()
            .into_iter()
            .any(|ty| ty.readonly.contains(name))
    }

    /// This type followed by its ancestors.
    fn lineage(&self) -> Vec<&SchemaType> {
        let mut chain = vec![self];
        let mut current = self.base.as_deref();
        while let Some(ty) = current {
            chain.push(ty);
            current = ty.base.as_deref();
        }
        chain
    }

    /// Members declared on this type only.
    pub fn own_members(&self) -> BTreeMap<String, Member> {
        self.members.read().clone()
    }

    /// All members visible on this type; a derived declaration shadows an
    /// inherited one.
    pub fn members(&self) -> BTreeMap<String, Member> {
        let mut merged = BTreeMap::new();
        for ty in self.lineage().into_iter().rev() {
            merged.extend(ty.own_members());
        }
        merged
    }

    /// The nearest declaration of `name`.
    pub fn member(&self, name: &str) -> Option<Member> {
        self.lineage()
            .into_iter()
            .find_map(|ty| ty.members.read().get(name).cloned())
    }

    /// Resolved nested schemas by name, identity attributes excluded.
    pub fn schemas(&self) -> BTreeMap<String, Schema> {
        self.members()
            .into_iter()
            .filter(|(name, _)| !is_identity(name) && !name.starts_with('_'))
            .filter_map(|(name, member)| match member {
                Member::Schema(schema) => Some((name, schema)),
                _ => None,
            })
            .collect()
    }

    /// The resolved nested schema called `name`. Identity attributes are never
    /// nested schemas.
    pub fn nested_schema(&self, name: &str) -> Option<Schema> {
        if is_identity(name) {
            return None;
        }
        match self.member(name) {
            Some(Member::Schema(schema)) => Some(schema),
            _ => None,
        }
    }

    /// Declare or replace a member, then re-run content resolution.
    pub fn set_member(
        self: &Arc<Self>,
        name: &str,
        member: impl Into<Member>,
    ) -> SchemaResult<ResolveReport> {
        self.assign_member(name, member.into())?;
        Ok(resolver::resolve_content(self, &ResolveOptions::default()))
    }

    /// Store a member without resolution. Sealed names are rejected.
    pub(crate) fn assign_member(&self, name: &str, member: Member) -> SchemaResult<()> {
        if self.is_readonly(name) {
            return Err(SchemaError::ReadOnly {
                schema_type: self.name.clone(),
                attribute: name.to_string(),
            });
        }
        self.members.write().insert(name.to_string(), member);
        Ok(())
    }

    /// The type as a runtime data type.
    pub fn as_data_type(self: &Arc<Self>) -> DataType {
        DataType::Class(Arc::clone(self) as Arc<dyn TypeNode>)
    }

    /// Create an instance.
    ///
    /// Each identity attribute comes from `kwargs`, else from the nearest
    /// declaration on the type, else from its fallback. Each nested schema is
    /// assigned the override from `kwargs` or its own default, through
    /// validation. The default is assigned last and must satisfy the
    /// instance's own rule unless it is `Null`.
    pub fn instantiate(self: &Arc<Self>, kwargs: Kwargs) -> SchemaResult<Schema> {
        let nested = self.schemas();
        if let Some(key) = kwargs
            .keys()
            .find(|key| !is_identity(key) && !nested.contains_key(*key))
        {
            return Err(SchemaError::lookup(
                LookupKind::Keyword,
                format!("{}.{key}", self.name),
            ));
        }

        let uid = match self.identity_value(&kwargs, "uid") {
            Some(value) => Uid::new(self.expect_str("uid", value)?),
            None => Uid::generate(),
        };
        let identity = Identity {
            name: self.identity_str(&kwargs, "name", "")?,
            uid,
            doc: self.identity_str(&kwargs, "doc", "")?,
            default: Value::Null,
            required: match self.identity_value(&kwargs, "required") {
                Some(value) => self.expect_names("required", value)?,
                None => Vec::new(),
            },
            version: self.identity_str(&kwargs, "version", "1")?,
            nullable: match self.identity_value(&kwargs, "nullable") {
                Some(value) => self.expect_bool("nullable", value)?,
                None => true,
            },
        };
        if let Some(missing) = identity.required.iter().find(|f| !nested.contains_key(*f)) {
            return Err(SchemaError::lookup(LookupKind::Field, missing.clone()));
        }

        let schema = Schema(Arc::new(SchemaCell {
            ty: Arc::clone(self),
            state: RwLock::new(SchemaState {
                identity,
                slots: BTreeMap::new(),
            }),
            accessors: RwLock::new(Accessors::default()),
        }));

        for (name, field) in &nested {
            let value = match kwargs.get(name) {
                Some(value) => value.clone(),
                None => field.default(),
            };
            field.set(&schema, value)?;
        }

        let default = self
            .identity_value(&kwargs, "default")
            .unwrap_or(Value::Null);
        schema.set_default(default)?;

        if self.registers_instances() {
            registry::register_instance(&schema);
        }
        Ok(schema)
    }

    fn identity_value(&self, kwargs: &Kwargs, name: &str) -> Option<Value> {
        if let Some(value) = kwargs.get(name) {
            return Some(value.clone());
        }
        match self.member(name)? {
            Member::Value(value) => Some(value),
            Member::Dynamic(provider) => Some(provider.evaluate()),
            Member::Schema(schema) => Some(schema.default()),
            Member::This(_) | Member::Field(..) => None,
        }
    }

    fn identity_str(&self, kwargs: &Kwargs, name: &str, fallback: &str) -> SchemaResult<String> {
        match self.identity_value(kwargs, name) {
            Some(Value::Null) | None => Ok(fallback.to_string()),
            Some(value) => self.expect_str(name, value),
        }
    }

    fn expect_str(&self, attribute: &str, value: Value) -> SchemaResult<String> {
        match value {
            Value::Str(s) => Ok(s),
            other => Err(SchemaError::type_mismatch(
                format!("{}.{attribute}", self.name),
                "str",
                other.data_type().name(),
            )),
        }
    }

    fn expect_bool(&self, attribute: &str, value: Value) -> SchemaResult<bool> {
        match value {
            Value::Bool(b) => Ok(b),
            other => Err(SchemaError::type_mismatch(
                format!("{}.{attribute}", self.name),
                "bool",
                other.data_type().name(),
            )),
        }
    }

    fn expect_names(&self, attribute: &str, value: Value) -> SchemaResult<Vec<String>> {
        let mismatch = |actual: &Value| {
            SchemaError::type_mismatch(
                format!("{}.{attribute}", self.name),
                "array of str",
                actual.data_type().name(),
            )
        };
        match value {
            Value::Array(items) => items
                .into_iter()
                .map(|item| match item {
                    Value::Str(s) => Ok(s),
                    other => Err(mismatch(&other)),
                })
                .collect(),
            Value::Null => Ok(Vec::new()),
            other => Err(mismatch(&other)),
        }
    }
}

impl TypeNode for SchemaType {
    fn type_uid(&self) -> &Uid {
        &self.uid
    }

    fn type_name(&self) -> &str {
        &self.name
    }

    fn parent_type(&self) -> Option<DataType> {
        self.base.as_ref().map(|base| base.as_data_type())
    }
}

impl fmt::Debug for SchemaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SchemaType")
            .field("name", &self.name)
            .field("uid", &self.uid)
            .field("base", &self.base.as_ref().map(|b| b.name.clone()))
            .field("data_types", &self.data_types)
            .finish_non_exhaustive()
    }
}

/// Builder for [`SchemaType`].
pub struct SchemaTypeBuilder {
    name: String,
    base: Option<SchemaTypeRef>,
    data_types: Vec<DataType>,
    register_instances: Option<bool>,
    behavior: Option<Arc<dyn SchemaBehavior>>,
    readonly: BTreeSet<String>,
    members: BTreeMap<String, Member>,
}

impl SchemaTypeBuilder {
    /// Derive from `base`. Without it, the type derives from the root
    /// `Schema` type.
    pub fn extends(mut self, base: &SchemaTypeRef) -> Self {
        self.base = Some(Arc::clone(base));
        self
    }

    /// Declare a runtime data type validated by this schema type.
    pub fn data_type(mut self, data_type: DataType) -> Self {
        self.data_types.push(data_type);
        self
    }

    /// Register every instance in the global registry on construction.
    /// Inherited when unset.
    pub fn register_instances(mut self, enabled: bool) -> Self {
        self.register_instances = Some(enabled);
        self
    }

    /// Validation and change hooks for this type and its descendants.
    pub fn behavior(mut self, behavior: impl SchemaBehavior + 'static) -> Self {
        self.behavior = Some(Arc::new(behavior));
        self
    }

    /// Declare a plain-value member (or an already built nested schema).
    pub fn member(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.members
            .insert(name.into(), Member::from(value.into()));
        self
    }

    /// Declare a member produced by `provider`.
    pub fn dynamic(mut self, name: impl Into<String>, provider: DynamicValue) -> Self {
        self.members.insert(name.into(), Member::Dynamic(provider));
        self
    }

    /// Declare a nested instance of the type being built.
    pub fn this(mut self, name: impl Into<String>, this: This) -> Self {
        self.members.insert(name.into(), Member::This(this));
        self
    }

    /// Declare a nested field of schema type `ty`, built with `kwargs` when
    /// the type is resolved.
    pub fn field(mut self, name: impl Into<String>, ty: &SchemaTypeRef, kwargs: Kwargs) -> Self {
        self.members
            .insert(name.into(), Member::Field(Arc::clone(ty), kwargs));
        self
    }

    /// Seal a member name against reassignment.
    pub fn readonly(mut self, name: impl Into<String>) -> Self {
        self.readonly.insert(name.into());
        self
    }

    /// Finish the type: register it with the global registry under its own
    /// data types and name, then resolve its content.
    pub fn build(mut self) -> SchemaTypeRef {
        if self.base.is_none() {
            self.base = Some(Arc::clone(&builtins().schema));
        }
        let ty = self.assemble();
        registry::register_type(&ty);
        resolver::resolve_content(&ty, &ResolveOptions::default());
        ty
    }

    /// Finish a type without touching the global registry.
    pub(crate) fn build_detached(self, context: &ResolveContext<'_>) -> SchemaTypeRef {
        let ty = self.assemble();
        resolver::resolve_with(&ty, &ResolveOptions::default(), context);
        ty
    }

    fn assemble(self) -> SchemaTypeRef {
        Arc::new(SchemaType {
            uid: Uid::generate(),
            name: self.name,
            base: self.base,
            data_types: self.data_types,
            register_instances: self.register_instances,
            behavior: self.behavior,
            readonly: self.readonly,
            members: RwLock::new(self.members),
        })
    }
}

// ---------------------------------------------------------------------------
// Schema instances
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
struct Identity {
    name: String,
    uid: Uid,
    doc: String,
    default: Value,
    required: Vec<String>,
    version: String,
    nullable: bool,
}

struct SchemaState {
    identity: Identity,
    slots: BTreeMap<String, Value>,
}

struct SchemaCell {
    ty: SchemaTypeRef,
    state: RwLock<SchemaState>,
    accessors: RwLock<Accessors>,
}

/// A schema instance. Clones share the same instance.
#[derive(Clone)]
pub struct Schema(Arc<SchemaCell>);

impl Schema {
    /// The type this instance was created from.
    pub fn schema_type(&self) -> &SchemaTypeRef {
        &self.0.ty
    }

    /// Whether both handles share the same instance.
    pub fn ptr_eq(&self, other: &Schema) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    fn identity(&self) -> Identity {
        self.0.state.read().identity.clone()
    }

    /// Instance name; empty for an unnamed schema.
    pub fn name(&self) -> String {
        self.0.state.read().identity.name.clone()
    }

    /// Process-unique identity of the instance.
    pub fn uid(&self) -> Uid {
        self.0.state.read().identity.uid.clone()
    }

    /// Free-form description.
    pub fn doc(&self) -> String {
        self.0.state.read().identity.doc.clone()
    }

    /// Value produced when the attribute has never been assigned. `Null`
    /// means no default.
    pub fn default(&self) -> Value {
        self.0.state.read().identity.default.clone()
    }

    /// Names of the nested schemas that validated data must carry.
    pub fn required(&self) -> Vec<String> {
        self.0.state.read().identity.required.clone()
    }

    /// Schema version, `"1"` unless given.
    pub fn version(&self) -> String {
        self.0.state.read().identity.version.clone()
    }

    /// Whether `Null` passes validation.
    pub fn nullable(&self) -> bool {
        self.0.state.read().identity.nullable
    }

    /// The name, or the type name for an unnamed instance.
    pub fn label(&self) -> String {
        let name = self.name();
        if name.is_empty() {
            self.0.ty.name.clone()
        } else {
            name
        }
    }

    /// Rename the instance. This moves its slot key on containers written
    /// afterwards.
    pub fn set_name(&self, name: impl Into<String>) {
        self.0.state.write().identity.name = name.into();
    }

    /// Replace the description.
    pub fn set_doc(&self, doc: impl Into<String>) {
        self.0.state.write().identity.doc = doc.into();
    }

    /// Replace the version string.
    pub fn set_version(&self, version: impl Into<String>) {
        self.0.state.write().identity.version = version.into();
    }

    /// Allow or forbid `Null`.
    pub fn set_nullable(&self, nullable: bool) {
        self.0.state.write().identity.nullable = nullable;
    }

    /// Replace the required set. Every name must be a nested schema.
    pub fn set_required(&self, required: Vec<String>) -> SchemaResult<()> {
        let nested = self.nested_schemas();
        if let Some(missing) = required.iter().find(|f| !nested.contains_key(*f)) {
            return Err(SchemaError::lookup(LookupKind::Field, missing.clone()));
        }
        self.0.state.write().identity.required = required;
        Ok(())
    }

    /// Assign the default. A non-null default must satisfy this schema's
    /// own rule and the behavior's pre-write check; the behavior is then
    /// notified.
    pub fn set_default(&self, value: Value) -> SchemaResult<()> {
        let behavior = self.0.ty.behavior();
        if !value.is_null() {
            self.check_default(&value)?;
        }
        behavior.before_write(self, "default", &value)?;
        self.0.state.write().identity.default = value.clone();
        behavior.on_write(self, "default", &value)
    }

    /// A declared `default` member guards assignment; it is a reference
    /// schema delegating to this instance unless retargeted.
    fn check_default(&self, value: &Value) -> SchemaResult<()> {
        match self.0.ty.member("default") {
            Some(Member::Schema(guard)) if !guard.ptr_eq(self) => {
                guard.validate_with_owner(value, Some(self))
            }
            _ => self.validate(value),
        }
    }

    /// Key under which this schema stores its value in a container.
    pub fn slot_key(&self) -> String {
        let identity = self.0.state.read();
        if identity.identity.name.is_empty() {
            format!("_{}", identity.identity.uid)
        } else {
            format!("_{}", identity.identity.name)
        }
    }

    /// Current storage hooks.
    pub fn accessors(&self) -> Accessors {
        self.0.accessors.read().clone()
    }

    /// Replace the storage hooks.
    pub fn set_accessors(&self, accessors: Accessors) {
        *self.0.accessors.write() = accessors;
    }

    /// Resolved nested schemas of this instance's type, by name.
    pub fn nested_schemas(&self) -> BTreeMap<String, Schema> {
        self.0.ty.schemas()
    }

    /// The nested schema `name`, or `LookupFailure(Field)`.
    pub fn nested(&self, name: &str) -> SchemaResult<Schema> {
        self.0
            .ty
            .nested_schema(name)
            .ok_or_else(|| SchemaError::lookup(LookupKind::Field, name))
    }

    /// Read this schema's value on `container`. A custom getter returning
    /// `Null` falls back to the slot, and an empty slot to the default.
    pub fn get(&self, container: &dyn Container) -> Value {
        let getter = self.0.accessors.read().getter.clone();
        let value = match getter.map(|getter| getter(container)) {
            Some(value) if !value.is_null() => value,
            _ => container
                .read_slot(&self.slot_key())
                .unwrap_or_else(|| self.default()),
        };
        container.notify_read(self, &value);
        value
    }

    /// Validate `value` and store it on `container`. Nothing is stored when
    /// validation or the container's pre-write check fails.
    pub fn set(&self, container: &dyn Container, value: Value) -> SchemaResult<()> {
        let owner = container.owner_schema();
        self.validate_with_owner(&value, owner.as_ref())?;
        container.check_write(self, &value)?;
        let setter = self.0.accessors.read().setter.clone();
        match setter {
            Some(setter) => setter(container, value.clone()),
            None => container.write_slot(&self.slot_key(), value.clone()),
        }
        container.notify_write(self, &value)
    }

    /// Evaluate `provider` and store the result. See [`Schema::set`].
    pub fn set_dynamic(&self, container: &dyn Container, provider: &DynamicValue) -> SchemaResult<()> {
        self.set(container, provider.evaluate())
    }

    /// Remove this schema's value from `container`.
    pub fn delete(&self, container: &dyn Container) -> bool {
        let deleter = self.0.accessors.read().deleter.clone();
        let removed = match deleter {
            Some(deleter) => {
                deleter(container);
                true
            }
            None => container.clear_slot(&self.slot_key()),
        };
        container.notify_delete(self);
        removed
    }

    /// Whether `name` is an identity attribute or a nested schema.
    pub fn has_attr(&self, name: &str) -> bool {
        is_identity(name) || self.0.ty.nested_schema(name).is_some()
    }

    /// Read an identity attribute or a nested schema's value.
    pub fn get_attr(&self, name: &str) -> SchemaResult<Value> {
        if is_identity(name) {
            let identity = self.identity();
            return Ok(match name {
                "name" => Value::Str(identity.name),
                "uid" => Value::Str(identity.uid.to_string()),
                "doc" => Value::Str(identity.doc),
                "default" => identity.default,
                "required" => Value::from(identity.required),
                "version" => Value::Str(identity.version),
                _ => Value::Bool(identity.nullable),
            });
        }
        Ok(self.nested(name)?.get(self))
    }

    /// Assign an identity attribute or a nested schema's value.
    pub fn set_attr(&self, name: &str, value: impl Into<Value>) -> SchemaResult<()> {
        let value = value.into();
        let ty = &self.0.ty;
        match name {
            "name" => self.set_name(ty.expect_str(name, value)?),
            "uid" => {
                let uid = Uid::new(ty.expect_str(name, value)?);
                self.0.state.write().identity.uid = uid;
            }
            "doc" => self.set_doc(ty.expect_str(name, value)?),
            "version" => self.set_version(ty.expect_str(name, value)?),
            "nullable" => self.set_nullable(ty.expect_bool(name, value)?),
            "required" => self.set_required(ty.expect_names(name, value)?)?,
            "default" => self.set_default(value)?,
            _ => self.nested(name)?.set(self, value)?,
        }
        Ok(())
    }

    /// Delete a nested schema's value, or reset the default. Other identity
    /// attributes cannot be deleted.
    pub fn delete_attr(&self, name: &str) -> SchemaResult<bool> {
        match name {
            "default" => {
                self.0.state.write().identity.default = Value::Null;
                Ok(true)
            }
            _ if is_identity(name) => Err(SchemaError::ReadOnly {
                schema_type: self.0.ty.name.clone(),
                attribute: name.to_string(),
            }),
            _ => Ok(self.nested(name)?.delete(self)),
        }
    }

    /// Validate `data` against this schema. Fails on the first violation.
    pub fn validate(&self, data: &Value) -> SchemaResult<()> {
        self.validate_with_owner(data, None)
    }

    /// Validate `data` as a value assigned into `owner`.
    pub fn validate_with_owner(&self, data: &Value, owner: Option<&Schema>) -> SchemaResult<()> {
        self.0.ty.behavior().validate(self, data, owner)
    }

    /// Nested-schema name to current value, nested schemas dumped
    /// recursively.
    pub fn dump(&self) -> BTreeMap<String, Value> {
        self.nested_schemas()
            .into_iter()
            .map(|(name, nested)| {
                let value = nested.get(self);
                (name, dump_value(value))
            })
            .collect()
    }

    /// [`Schema::dump`] rendered as plain JSON.
    pub fn to_json(&self) -> serde_json::Value {
        Value::Map(self.dump()).to_json()
    }
}

fn dump_value(value: Value) -> Value {
    match value {
        Value::Schema(schema) => Value::Map(schema.dump()),
        Value::Array(items) => Value::Array(items.into_iter().map(dump_value).collect()),
        other => other,
    }
}

impl Container for Schema {
    fn read_slot(&self, key: &str) -> Option<Value> {
        self.0.state.read().slots.get(key).cloned()
    }

    fn write_slot(&self, key: &str, value: Value) {
        self.0.state.write().slots.insert(key.to_string(), value);
    }

    fn clear_slot(&self, key: &str) -> bool {
        self.0.state.write().slots.remove(key).is_some()
    }

    fn owner_schema(&self) -> Option<Schema> {
        Some(self.clone())
    }

    fn notify_read(&self, schema: &Schema, value: &Value) {
        self.0.ty.behavior().on_read(self, &schema.name(), value);
    }

    fn check_write(&self, schema: &Schema, value: &Value) -> SchemaResult<()> {
        self.0.ty.behavior().before_write(self, &schema.name(), value)
    }

    fn notify_write(&self, schema: &Schema, value: &Value) -> SchemaResult<()> {
        self.0.ty.behavior().on_write(self, &schema.name(), value)
    }

    fn notify_delete(&self, schema: &Schema) {
        self.0.ty.behavior().on_delete(self, &schema.name());
    }
}

impl PartialEq for Schema {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
            || (self.0.ty.uid == other.0.ty.uid && self.dump() == other.dump())
    }
}

impl fmt::Debug for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let identity = self.identity();
        f.debug_struct("Schema")
            .field("type", &self.0.ty.name)
            .field("name", &identity.name)
            .field("uid", &identity.uid)
            .finish_non_exhaustive()
    }
}

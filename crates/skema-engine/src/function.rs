//! # Function Schemas
//!
//! A [`FunctionSchema`] describes a callable through its parameters. It is
//! *unbound* until a [`Callable`] is assigned as its default; assignment
//! derives one [`ParamSchema`] per parameter (positional parameters first,
//! then the variadic-positional and variadic-keyword ones) and the return
//! type schema. Re-assigning re-derives.
//!
//! ## Derivation
//!
//! For each parameter:
//!
//! - `hasvalue` is true iff the parameter lies in the defaulted suffix, in
//!   which case `default` is the declared default;
//! - `ref` comes from the annotation source when it has a hint for the
//!   parameter, else (with `autotype`) from the runtime type of the default.
//!
//! The `params` array is patched in place: existing parameter schemas are
//! updated by position, new ones appended, extras truncated. Parameter
//! schemas held elsewhere therefore stay live across re-derivation.
//!
//! ## Validation
//!
//! Validating the bound callable re-checks it against the derived params
//! and fails with [`SchemaError::SignatureMismatch`] on divergence. It never
//! re-derives.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use skema_core::{SchemaError, SchemaResult};
use tracing::debug;

use crate::annotation::{resolve_hint, AnnotationSource, Annotations};
use crate::builtins::builtins;
use crate::callable::Callable;
use crate::kwargs;
use crate::reference::validate_reference;
use crate::registry;
use crate::schema::{Schema, SchemaBehavior, SchemaType, SchemaTypeRef};
use crate::validate::validate_base;
use crate::value::{Kwargs, Value};

/// How a parameter binds call-site arguments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamKind {
    /// Named positional-or-keyword parameter.
    Positional,
    /// Collects overflow positional arguments.
    Varargs,
    /// Collects overflow keyword arguments.
    Varkw,
}

impl ParamKind {
    /// Wire name, as stored in the `kind` attribute.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Positional => "positional",
            Self::Varargs => "varargs",
            Self::Varkw => "varkw",
        }
    }

    /// Inverse of [`ParamKind::as_str`].
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "positional" => Some(Self::Positional),
            "varargs" => Some(Self::Varargs),
            "varkw" => Some(Self::Varkw),
            _ => None,
        }
    }
}

impl fmt::Display for ParamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Parameters
// ---------------------------------------------------------------------------

/// Behavior of `ParamSchema`: a reference schema whose target follows the
/// parameter's default.
pub(crate) struct ParamBehavior;

impl SchemaBehavior for ParamBehavior {
    fn validate(&self, schema: &Schema, data: &Value, owner: Option<&Schema>) -> SchemaResult<()> {
        validate_reference(schema, data, owner)
    }

    fn before_write(&self, container: &Schema, attribute: &str, value: &Value) -> SchemaResult<()> {
        match (attribute, value, container.default()) {
            ("ref", Value::Schema(target), default) if !default.is_null() => target.validate(&default),
            _ => Ok(()),
        }
    }

    fn on_write(&self, container: &Schema, attribute: &str, value: &Value) -> SchemaResult<()> {
        match attribute {
            "default" if !value.is_null() => {
                let autotype = container.get_attr("autotype")?.as_bool().unwrap_or(true);
                if autotype && container.get_attr("ref")?.is_null() {
                    if let Ok(inferred) = registry::lookup_by_type(&value.data_type(), true) {
                        container.set_attr("ref", inferred.instantiate(Kwargs::new())?)?;
                    }
                }
                container.set_attr("hasvalue", true)
            }
            _ => Ok(()),
        }
    }
}

/// Typed view of a `ParamSchema` instance.
#[derive(Debug, Clone, PartialEq)]
pub struct ParamSchema(Schema);

impl ParamSchema {
    /// A parameter schema of the given kind, without default.
    pub fn new(name: &str, kind: ParamKind) -> SchemaResult<Self> {
        builtins()
            .param
            .instantiate(kwargs! { "name" => name, "kind" => kind.as_str() })
            .map(Self)
    }

    /// Wrap an instance of `ParamSchema` or a derived type.
    pub fn from_schema(schema: Schema) -> SchemaResult<Self> {
        expect_type(&schema, &builtins().param)?;
        Ok(Self(schema))
    }

    /// Parameter name.
    pub fn name(&self) -> String {
        self.0.name()
    }

    /// How the parameter binds arguments; positional when unset.
    pub fn kind(&self) -> ParamKind {
        self.0
            .get_attr("kind")
            .ok()
            .and_then(|kind| kind.as_str().and_then(ParamKind::parse))
            .unwrap_or(ParamKind::Positional)
    }

    /// Whether the parameter has a default.
    pub fn has_value(&self) -> bool {
        self.0
            .get_attr("hasvalue")
            .ok()
            .and_then(|v| v.as_bool())
            .unwrap_or(false)
    }

    /// Declared default, `Null` when [`ParamSchema::has_value`] is false.
    pub fn default(&self) -> Value {
        self.0.default()
    }

    /// Schema the parameter's values must satisfy.
    pub fn reference(&self) -> Option<Schema> {
        match self.0.get_attr("ref") {
            Ok(Value::Schema(target)) => Some(target),
            _ => None,
        }
    }

    /// Retarget the parameter. A target rejecting the current default is
    /// refused and the previous one kept.
    pub fn set_reference(&self, target: Option<Schema>) -> SchemaResult<()> {
        self.0.set_attr("ref", target.map(Value::Schema).unwrap_or_default())
    }

    /// Whether a default with no explicit `ref` infers one.
    pub fn autotype(&self) -> bool {
        self.0
            .get_attr("autotype")
            .ok()
            .and_then(|v| v.as_bool())
            .unwrap_or(true)
    }

    /// Validate `data` against the underlying schema.
    pub fn validate(&self, data: &Value) -> SchemaResult<()> {
        self.0.validate(data)
    }

    /// The underlying schema instance.
    pub fn as_schema(&self) -> &Schema {
        &self.0
    }
}

// ---------------------------------------------------------------------------
// Functions
// ---------------------------------------------------------------------------

/// A parameter as read off a signature.
#[derive(Debug, Clone)]
struct ParamSpec {
    name: String,
    kind: ParamKind,
    default: Option<Value>,
}

fn param_specs(callable: &Callable) -> Vec<ParamSpec> {
    let signature = callable.signature();
    let mut specs: Vec<ParamSpec> = signature
        .params
        .iter()
        .enumerate()
        .map(|(index, name)| ParamSpec {
            name: name.clone(),
            kind: ParamKind::Positional,
            default: signature.default_at(index).cloned(),
        })
        .collect();
    for (name, kind) in [
        (&signature.varargs, ParamKind::Varargs),
        (&signature.varkw, ParamKind::Varkw),
    ] {
        if let Some(name) = name {
            specs.push(ParamSpec {
                name: name.clone(),
                kind,
                default: None,
            });
        }
    }
    specs
}

/// Behavior of `FunctionSchema` and derived types.
pub(crate) struct FunctionBehavior {
    annotations: Arc<dyn AnnotationSource>,
}

impl FunctionBehavior {
    pub(crate) fn new(annotations: Arc<dyn AnnotationSource>) -> Self {
        Self { annotations }
    }

    /// Resolve every hint of `callable` and check it against the declared
    /// defaults. Nothing is written.
    fn plan(&self, schema: &Schema, callable: &Callable) -> SchemaResult<Derivation> {
        let Annotations { params: hints, rtype } = self.annotations.annotations_for(callable);
        let specs = param_specs(callable);
        let mut hinted = Vec::with_capacity(specs.len());
        for spec in &specs {
            let target = match hints.get(&spec.name) {
                Some(hint) => {
                    let target = resolve_hint(hint)?;
                    if let Some(default) = &spec.default {
                        target.validate(default)?;
                    }
                    Some(target)
                }
                None => None,
            };
            hinted.push(target);
        }
        let rtype = match rtype {
            Some(hint) => Value::Schema(resolve_hint(&hint)?),
            None => Value::Null,
        };
        Ok(Derivation {
            params: read_params(schema)?,
            specs,
            hinted,
            rtype,
        })
    }

    fn derive(&self, schema: &Schema, callable: &Callable) -> SchemaResult<()> {
        let Derivation {
            mut params,
            specs,
            hinted,
            rtype,
        } = self.plan(schema, callable)?;

        for (index, (spec, hinted)) in specs.iter().zip(hinted).enumerate() {
            match params.get(index) {
                Some(param) => patch_param(param, spec, hinted)?,
                None => {
                    let mut kwargs = kwargs! {
                        "name" => spec.name.as_str(),
                        "kind" => spec.kind.as_str(),
                        "hasvalue" => spec.default.is_some(),
                    };
                    if let Some(target) = hinted {
                        kwargs.insert("ref".into(), target.into());
                    }
                    if let Some(default) = &spec.default {
                        kwargs.insert("default".into(), default.clone());
                    }
                    params.push(ParamSchema(builtins().param.instantiate(kwargs)?));
                }
            }
        }
        params.truncate(specs.len());

        let values: Vec<Value> = params.iter().map(|p| Value::Schema(p.0.clone())).collect();
        schema.set_attr("params", values)?;
        schema.set_attr("rtype", rtype)?;
        if schema.name().is_empty() {
            schema.set_name(callable.name());
        }
        debug!(
            function = callable.name(),
            params = specs.len(),
            "derived function parameters"
        );
        Ok(())
    }

    fn check_params(&self, schema: &Schema, callable: &Callable) -> SchemaResult<()> {
        let function = callable.name();
        let specs = param_specs(callable);
        let params = read_params(schema)?;
        if specs.len() != params.len() {
            return Err(SchemaError::signature(
                function,
                format!("expected {} parameters, found {}", params.len(), specs.len()),
            ));
        }
        for (spec, param) in specs.iter().zip(&params) {
            if spec.name != param.name() || spec.kind != param.kind() {
                return Err(SchemaError::signature(
                    function,
                    format!(
                        "parameter '{}' ({}) does not match '{}' ({})",
                        spec.name,
                        spec.kind,
                        param.name(),
                        param.kind()
                    ),
                ));
            }
            if spec.default.is_some() != param.has_value() {
                return Err(SchemaError::signature(
                    function,
                    format!("default of parameter '{}' changed", spec.name),
                ));
            }
            if let Some(default) = &spec.default {
                param.validate(default).map_err(|err| {
                    SchemaError::signature(
                        function,
                        format!("default of parameter '{}': {err}", spec.name),
                    )
                })?;
            }
        }
        Ok(())
    }
}

/// A derivation resolved up front, so a failing hint leaves the schema
/// bound to its previous callable.
struct Derivation {
    params: Vec<ParamSchema>,
    specs: Vec<ParamSpec>,
    hinted: Vec<Option<Schema>>,
    rtype: Value,
}

impl SchemaBehavior for FunctionBehavior {
    fn validate(&self, schema: &Schema, data: &Value, _owner: Option<&Schema>) -> SchemaResult<()> {
        validate_base(schema, data)?;
        let Value::Function(callable) = data else {
            return Ok(());
        };
        let name = schema.name();
        if !name.is_empty() && name != callable.name() {
            return Err(SchemaError::signature(
                callable.name(),
                format!("schema is named '{name}'"),
            ));
        }
        match schema.default() {
            Value::Function(bound) if bound.ptr_eq(callable) => self.check_params(schema, callable),
            _ => Ok(()),
        }
    }

    fn before_write(&self, container: &Schema, attribute: &str, value: &Value) -> SchemaResult<()> {
        match (attribute, value) {
            ("default", Value::Function(callable)) => self.plan(container, callable).map(|_| ()),
            _ => Ok(()),
        }
    }

    fn on_write(&self, container: &Schema, attribute: &str, value: &Value) -> SchemaResult<()> {
        match (attribute, value) {
            ("default", Value::Function(callable)) => self.derive(container, callable),
            _ => Ok(()),
        }
    }
}

/// Reset `param` to `spec`, then apply the hint. The ref is cleared first so
/// the new default is inferred rather than checked against a stale target.
fn patch_param(param: &ParamSchema, spec: &ParamSpec, hinted: Option<Schema>) -> SchemaResult<()> {
    let schema = &param.0;
    schema.set_attr("ref", Value::Null)?;
    schema.set_default(spec.default.clone().unwrap_or_default())?;
    schema.set_attr("hasvalue", spec.default.is_some())?;
    schema.set_attr("kind", spec.kind.as_str())?;
    schema.set_name(spec.name.as_str());
    if let Some(target) = hinted {
        schema.set_attr("ref", target)?;
    }
    Ok(())
}

fn read_params(schema: &Schema) -> SchemaResult<Vec<ParamSchema>> {
    match schema.get_attr("params")? {
        Value::Array(items) => items
            .into_iter()
            .map(|item| match item {
                Value::Schema(param) => ParamSchema::from_schema(param),
                other => Err(SchemaError::type_mismatch(
                    schema.label(),
                    "ParamSchema",
                    other.data_type().name(),
                )),
            })
            .collect(),
        _ => Ok(Vec::new()),
    }
}

fn expect_type(schema: &Schema, expected: &SchemaTypeRef) -> SchemaResult<()> {
    if schema.schema_type().extends(expected) {
        Ok(())
    } else {
        Err(SchemaError::type_mismatch(
            schema.label(),
            expected.name(),
            schema.schema_type().name(),
        ))
    }
}

/// Declare a function schema type reading hints from `annotations`.
pub fn function_type(name: &str, annotations: Arc<dyn AnnotationSource>) -> SchemaTypeRef {
    SchemaType::builder(name)
        .extends(&builtins().function)
        .behavior(FunctionBehavior::new(annotations))
        .build()
}

/// Typed view of a `FunctionSchema` instance.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionSchema(Schema);

impl FunctionSchema {
    /// An unbound function schema.
    pub fn new() -> SchemaResult<Self> {
        Self::of_type(&builtins().function)
    }

    /// An unbound instance of `FunctionSchema` or a derived type.
    pub fn of_type(schema_type: &SchemaTypeRef) -> SchemaResult<Self> {
        let schema = schema_type.instantiate(Kwargs::new())?;
        Self::from_schema(schema)
    }

    /// A function schema bound to `callable`.
    pub fn from_callable(callable: Callable) -> SchemaResult<Self> {
        let function = Self::new()?;
        function.bind(callable)?;
        Ok(function)
    }

    /// Wrap an instance of `FunctionSchema` or a derived type.
    pub fn from_schema(schema: Schema) -> SchemaResult<Self> {
        expect_type(&schema, &builtins().function)?;
        Ok(Self(schema))
    }

    /// Assign `callable` and derive its parameters.
    pub fn bind(&self, callable: Callable) -> SchemaResult<()> {
        self.0.set_default(Value::Function(callable))
    }

    /// The bound callable, if any.
    pub fn callable(&self) -> Option<Callable> {
        self.0.default().as_callable().cloned()
    }

    /// Whether a callable is bound.
    pub fn is_bound(&self) -> bool {
        self.callable().is_some()
    }

    /// Derived parameter schemas, in signature order.
    pub fn params(&self) -> SchemaResult<Vec<ParamSchema>> {
        read_params(&self.0)
    }

    /// Return type schema, if annotated.
    pub fn rtype(&self) -> Option<Schema> {
        match self.0.get_attr("rtype") {
            Ok(Value::Schema(rtype)) => Some(rtype),
            _ => None,
        }
    }

    /// Call the bound callable: re-check the signature, validate every
    /// argument against its parameter, run it, validate the result.
    pub fn call(&self, args: Vec<Value>, kwargs: Kwargs) -> SchemaResult<Value> {
        let callable = self.callable().ok_or_else(|| SchemaError::Invocation {
            function: self.0.label(),
            reason: "no callable bound".into(),
        })?;
        self.0.validate(&Value::Function(callable.clone()))?;

        let bound = callable.bind(args, kwargs)?;
        for param in self.params()? {
            let argument = match param.kind() {
                ParamKind::Positional => match bound.get(&param.name()) {
                    Some(value) => value.clone(),
                    None => continue,
                },
                ParamKind::Varargs => Value::Array(bound.varargs.clone()),
                ParamKind::Varkw => Value::Map(bound.varkw.clone()),
            };
            param.validate(&argument)?;
        }

        let result = callable.invoke(&bound)?;
        if let Some(rtype) = self.rtype() {
            rtype.validate(&result)?;
        }
        Ok(result)
    }

    /// Validate `data` against the underlying schema.
    pub fn validate(&self, data: &Value) -> SchemaResult<()> {
        self.0.validate(data)
    }

    /// The underlying schema instance.
    pub fn as_schema(&self) -> &Schema {
        &self.0
    }

    /// Unwrap the underlying schema instance.
    pub fn into_schema(self) -> Schema {
        self.0
    }
}

/// Parameter schemas of `callable`, as a bound function schema derives them.
pub fn derive_params(callable: &Callable) -> SchemaResult<Vec<ParamSchema>> {
    FunctionSchema::from_callable(callable.clone())?.params()
}

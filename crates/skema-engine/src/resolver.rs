//! # Content Resolution
//!
//! Turns the raw members of a schema type into nested schema instances.
//! Runs when a type is built and whenever a member is replaced through
//! [`SchemaType::set_member`]; builders that attach members
//! programmatically may re-run it with [`resolve_content`].
//!
//! ## Rules, per public member
//!
//! | Member                     | Result                                          |
//! |----------------------------|-------------------------------------------------|
//! | nested schema              | kept; named after the attribute if unnamed      |
//! | dynamic `default`          | kept as a per-instantiation provider            |
//! | other dynamic              | evaluated, then resolved as a plain value       |
//! | `This(kwargs)`             | instance of the declaring type                  |
//! | `Field(type, kwargs)`      | instance of `type`                              |
//! | plain `default`            | reference schema whose default is the value     |
//! | other plain value          | instance of the registry's type for the value   |
//!
//! Names starting with `_`, excluded names and identity attributes other
//! than `default` are left untouched. A member whose instantiation or
//! reassignment fails is logged and skipped; the pass carries on with the
//! rest. Re-running the pass on a resolved type changes nothing.
//!
//! [`SchemaType::set_member`]: crate::schema::SchemaType::set_member

use serde::{Deserialize, Serialize};
use skema_core::{DataType, LookupKind, SchemaError, SchemaResult};
use tracing::{debug, warn};

use crate::builtins::builtins;
use crate::kwargs;
use crate::registry::{self, Registry};
use crate::schema::{is_identity, Member, Schema, SchemaType, SchemaTypeRef};
use crate::value::Value;

/// Options of a resolution pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolveOptions {
    /// Also resolve members inherited from ancestor types, assigning the
    /// results onto the resolved type.
    pub include_ancestors: bool,
    /// Member names to leave untouched.
    pub exclude: Vec<String>,
    /// Create and register a schema type for a plain value whose runtime
    /// type has no registration.
    pub force: bool,
}

impl Default for ResolveOptions {
    fn default() -> Self {
        Self {
            include_ancestors: true,
            exclude: Vec::new(),
            force: false,
        }
    }
}

/// Outcome of a resolution pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolveReport {
    /// Members turned into nested schemas by this pass.
    pub resolved: Vec<String>,
    /// Members that could not be resolved or reassigned.
    pub skipped: Vec<String>,
}

/// Where a resolution pass looks up schema types for plain values.
pub(crate) enum TypeSource<'a> {
    Global,
    Local(&'a Registry),
}

pub(crate) struct ResolveContext<'a> {
    pub(crate) source: TypeSource<'a>,
    /// Type wrapping plain `default` members; absent while it is itself
    /// being built.
    pub(crate) reference: Option<SchemaTypeRef>,
}

impl ResolveContext<'_> {
    fn lookup(&self, data_type: &DataType) -> SchemaResult<SchemaTypeRef> {
        match self.source {
            TypeSource::Global => registry::lookup_by_type(data_type, true),
            TypeSource::Local(registry) => registry.lookup_by_type(data_type, true),
        }
    }
}

/// Resolve `schema_type` against the process registry.
pub fn resolve_content(schema_type: &SchemaTypeRef, options: &ResolveOptions) -> ResolveReport {
    let context = ResolveContext {
        source: TypeSource::Global,
        reference: Some(builtins().reference.clone()),
    };
    resolve_with(schema_type, options, &context)
}

pub(crate) fn resolve_with(
    schema_type: &SchemaTypeRef,
    options: &ResolveOptions,
    context: &ResolveContext<'_>,
) -> ResolveReport {
    let members = if options.include_ancestors {
        schema_type.members()
    } else {
        schema_type.own_members()
    };

    let mut report = ResolveReport::default();
    for (name, member) in members {
        if name.starts_with('_')
            || options.exclude.contains(&name)
            || (is_identity(&name) && name != "default")
        {
            continue;
        }

        let schema = match resolve_member(schema_type, &name, member, options, context) {
            Ok(Some(schema)) => schema,
            Ok(None) => continue,
            Err(err) => {
                warn!(
                    schema_type = schema_type.name(),
                    attribute = %name,
                    error = %err,
                    "skipping attribute during content resolution"
                );
                report.skipped.push(name);
                continue;
            }
        };

        match schema_type.assign_member(&name, Member::Schema(schema)) {
            Ok(()) => {
                debug!(schema_type = schema_type.name(), attribute = %name, "resolved attribute");
                report.resolved.push(name);
            }
            Err(err) => {
                warn!(
                    schema_type = schema_type.name(),
                    attribute = %name,
                    error = %err,
                    "skipping attribute during content resolution"
                );
                report.skipped.push(name);
            }
        }
    }
    report
}

/// `Ok(None)` when the member needs no reassignment.
fn resolve_member(
    schema_type: &SchemaTypeRef,
    name: &str,
    member: Member,
    options: &ResolveOptions,
    context: &ResolveContext<'_>,
) -> SchemaResult<Option<Schema>> {
    let value = match member {
        Member::Schema(schema) => {
            if schema.name().is_empty() {
                schema.set_name(name);
            }
            return Ok(None);
        }
        Member::Dynamic(_) if name == "default" => return Ok(None),
        Member::Dynamic(provider) => provider.evaluate(),
        Member::This(this) => {
            let mut kwargs = this.kwargs().clone();
            kwargs.entry("name".to_string()).or_insert_with(|| name.into());
            return schema_type.instantiate(kwargs).map(Some);
        }
        Member::Field(field_type, mut kwargs) => {
            kwargs.entry("name".to_string()).or_insert_with(|| name.into());
            return field_type.instantiate(kwargs).map(Some);
        }
        Member::Value(value) => value,
    };

    if let Value::Schema(schema) = value {
        if schema.name().is_empty() {
            schema.set_name(name);
        }
        return Ok(Some(schema));
    }

    if name == "default" {
        let reference = context
            .reference
            .as_ref()
            .ok_or_else(|| SchemaError::lookup(LookupKind::Name, "RefSchema"))?;
        return reference
            .instantiate(kwargs! { "name" => name, "default" => value })
            .map(Some);
    }

    let data_type = value.data_type();
    let value_type = match context.lookup(&data_type) {
        Ok(found) => found,
        Err(err) => match (&context.source, options.force) {
            (TypeSource::Global, true) => force_type(&data_type),
            _ => return Err(err),
        },
    };
    value_type
        .instantiate(kwargs! { "name" => name, "default" => value })
        .map(Some)
}

/// Create and register a schema type for an unregistered data type.
fn force_type(data_type: &DataType) -> SchemaTypeRef {
    let forced = SchemaType::builder(format!("{}Schema", data_type.name()))
        .data_type(data_type.clone())
        .build();
    debug!(schema_type = forced.name(), "created schema type on demand");
    forced
}

//! # Schema Registry
//!
//! Lookup tables mapping runtime data types to the schema type responsible
//! for them, schema instances by uid, schema instances by name, and schema
//! types by name.
//!
//! ## Process registry
//!
//! [`global`] returns the process-wide registry behind a
//! `parking_lot::RwLock`, created on first use with the builtin leaf types
//! installed. [`reset`] restores that initial state. A [`Registry`] value
//! can also be used standalone.
//!
//! ## Best-effort lookup
//!
//! The type table is an order-preserving `Vec`. A best-effort lookup that
//! misses on the exact type walks the query type's ancestors nearest-first
//! and returns the first one with a registration, so a schema declared for
//! `number` validates an unseen `bool` only when nothing closer (`int`) is
//! registered.

use std::collections::HashMap;
use std::sync::{Arc, OnceLock};

use parking_lot::RwLock;
use skema_core::{DataType, LookupKind, SchemaError, SchemaResult, Uid};
use tracing::debug;

use crate::builtins::builtins;
use crate::schema::{Schema, SchemaTypeRef};
use crate::value::Value;

/// Schema lookup tables.
#[derive(Debug, Default)]
pub struct Registry {
    by_uid: HashMap<Uid, Schema>,
    by_name: HashMap<String, Vec<Schema>>,
    by_type: Vec<(DataType, SchemaTypeRef)>,
    types: HashMap<String, SchemaTypeRef>,
}

impl Registry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry with the builtin leaf types installed.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        builtins().install(&mut registry);
        registry
    }

    /// Record `schema_type` as the validator of each of `data_types`, and
    /// index it by name. A later registration for a data type replaces the
    /// earlier one in place.
    pub fn register_type(&mut self, schema_type: &SchemaTypeRef, data_types: &[DataType]) {
        for data_type in data_types {
            match self.by_type.iter_mut().find(|(dt, _)| dt == data_type) {
                Some(entry) => entry.1 = Arc::clone(schema_type),
                None => self
                    .by_type
                    .push((data_type.clone(), Arc::clone(schema_type))),
            }
        }
        self.types
            .insert(schema_type.name().to_string(), Arc::clone(schema_type));
        debug!(
            schema_type = schema_type.name(),
            data_types = data_types.len(),
            "registered schema type"
        );
    }

    /// Index `schema` by uid and name, then every nested schema not yet
    /// indexed. Returns the instance previously registered under the uid.
    pub fn register_instance(&mut self, schema: &Schema) -> Option<Schema> {
        let uid = schema.uid();
        let previous = self.by_uid.insert(uid.clone(), schema.clone());
        if previous.is_some() {
            self.remove_from_names(&uid);
        }
        let name = schema.name();
        if !name.is_empty() {
            self.by_name.entry(name).or_default().push(schema.clone());
        }
        debug!(uid = %uid, schema = %schema.label(), "registered schema instance");

        for nested in schema.nested_schemas().into_values() {
            if !self.by_uid.contains_key(&nested.uid()) {
                self.register_instance(&nested);
            }
        }
        previous
    }

    /// Remove the instance or schema type identified by `uid`.
    ///
    /// Removing a type drops its data-type mappings and its name entry.
    pub fn unregister(&mut self, uid: &Uid) -> SchemaResult<()> {
        if self.by_uid.remove(uid).is_some() {
            self.remove_from_names(uid);
            debug!(uid = %uid, "unregistered schema instance");
            return Ok(());
        }

        let before = self.by_type.len() + self.types.len();
        self.by_type.retain(|(_, ty)| ty.uid() != uid);
        self.types.retain(|_, ty| ty.uid() != uid);
        if self.by_type.len() + self.types.len() < before {
            debug!(uid = %uid, "unregistered schema type");
            return Ok(());
        }
        Err(SchemaError::lookup(LookupKind::Uid, uid.as_str()))
    }

    fn remove_from_names(&mut self, uid: &Uid) {
        self.by_name.retain(|_, bucket| {
            bucket.retain(|schema| &schema.uid() != uid);
            !bucket.is_empty()
        });
    }

    /// The schema type registered for `data_type`; with `best_effort`, the
    /// nearest registered ancestor.
    pub fn lookup_by_type(&self, data_type: &DataType, best_effort: bool) -> SchemaResult<SchemaTypeRef> {
        let find = |query: &DataType| {
            self.by_type
                .iter()
                .find(|(dt, _)| dt == query)
                .map(|(_, ty)| Arc::clone(ty))
        };
        let found = if best_effort {
            data_type.ancestors().find_map(|ancestor| find(&ancestor))
        } else {
            find(data_type)
        };
        found.ok_or_else(|| SchemaError::lookup(LookupKind::Type, data_type.name()))
    }

    /// The schema type validating `value`. See [`Registry::lookup_by_type`].
    pub fn schema_for_value(&self, value: &Value, best_effort: bool) -> SchemaResult<SchemaTypeRef> {
        self.lookup_by_type(&value.data_type(), best_effort)
    }

    pub fn lookup_by_uid(&self, uid: &Uid) -> SchemaResult<Schema> {
        self.by_uid
            .get(uid)
            .cloned()
            .ok_or_else(|| SchemaError::lookup(LookupKind::Uid, uid.as_str()))
    }

    /// The first instance registered under `name`.
    pub fn lookup_by_name(&self, name: &str) -> SchemaResult<Schema> {
        self.by_name
            .get(name)
            .and_then(|bucket| bucket.first())
            .cloned()
            .ok_or_else(|| SchemaError::lookup(LookupKind::Name, name))
    }

    /// Every instance registered under `name`, in registration order.
    pub fn lookup_all_by_name(&self, name: &str) -> Vec<Schema> {
        self.by_name.get(name).cloned().unwrap_or_default()
    }

    pub fn lookup_type_by_name(&self, name: &str) -> SchemaResult<SchemaTypeRef> {
        self.types
            .get(name)
            .cloned()
            .ok_or_else(|| SchemaError::lookup(LookupKind::Name, name))
    }

    /// Registered data types with their schema types, in registration order.
    pub fn registered_types(&self) -> impl Iterator<Item = (&DataType, &SchemaTypeRef)> {
        self.by_type.iter().map(|(dt, ty)| (dt, ty))
    }

    /// Number of registered instances.
    pub fn len(&self) -> usize {
        self.by_uid.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_uid.is_empty()
    }

    pub fn clear(&mut self) {
        self.by_uid.clear();
        self.by_name.clear();
        self.by_type.clear();
        self.types.clear();
    }
}

static GLOBAL: OnceLock<RwLock<Registry>> = OnceLock::new();

/// The process-wide registry.
pub fn global() -> &'static RwLock<Registry> {
    GLOBAL.get_or_init(|| RwLock::new(Registry::with_builtins()))
}

/// Clear the process registry and reinstall the builtin leaf types.
pub fn reset() {
    *global().write() = Registry::with_builtins();
    debug!("schema registry reset");
}

/// Register `schema_type` under its own declared data types.
pub fn register_type(schema_type: &SchemaTypeRef) {
    global()
        .write()
        .register_type(schema_type, schema_type.data_types());
}

/// See [`Registry::register_instance`].
pub fn register_instance(schema: &Schema) -> Option<Schema> {
    global().write().register_instance(schema)
}

/// See [`Registry::unregister`].
pub fn unregister(uid: &Uid) -> SchemaResult<()> {
    global().write().unregister(uid)
}

/// See [`Registry::lookup_by_type`].
pub fn lookup_by_type(data_type: &DataType, best_effort: bool) -> SchemaResult<SchemaTypeRef> {
    global().read().lookup_by_type(data_type, best_effort)
}

/// See [`Registry::lookup_by_uid`].
pub fn lookup_by_uid(uid: &Uid) -> SchemaResult<Schema> {
    global().read().lookup_by_uid(uid)
}

/// See [`Registry::lookup_by_name`].
pub fn lookup_by_name(name: &str) -> SchemaResult<Schema> {
    global().read().lookup_by_name(name)
}

/// See [`Registry::lookup_type_by_name`].
pub fn lookup_type_by_name(name: &str) -> SchemaResult<SchemaTypeRef> {
    global().read().lookup_type_by_name(name)
}

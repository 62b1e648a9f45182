//! # Builtin Schema Types
//!
//! The root `Schema` type, the reference schemas and the elementary leaf
//! schemas, created once per process on first use.
//!
//! | Type              | Base              | Data types | Members                                    |
//! |-------------------|-------------------|------------|--------------------------------------------|
//! | `Schema`          | none              | none       | none                                       |
//! | `RefSchema`       | `Schema`          | none       | `ref`                                      |
//! | `AnySchema`       | `Schema`          | none       | none                                       |
//! | `ElementarySchema`| `Schema`          | none       | non-nullable                               |
//! | `BooleanSchema`   | `ElementarySchema`| bool       | default `false`                            |
//! | `NumberSchema`    | `ElementarySchema`| number     | `min`, `max`                               |
//! | `IntegerSchema`   | `NumberSchema`    | int        | default `0`                                |
//! | `FloatSchema`     | `NumberSchema`    | float      | default `0.0`                              |
//! | `StringSchema`    | `ElementarySchema`| str        | default `""`                               |
//! | `ArraySchema`     | `ElementarySchema`| array      | `minsize`, `maxsize`, `unique`, `items`    |
//! | `DictSchema`      | `ElementarySchema`| map        | default `{}`                               |
//! | `EnumSchema`      | `ElementarySchema`| enum       | none                                       |
//! | `DateTimeSchema`  | `ElementarySchema`| datetime   | default now                                |
//! | `OneOfSchema`     | `Schema`          | none       | `schemas`                                  |
//! | `ParamSchema`     | `RefSchema`       | none       | `hasvalue`, `autotype`, `kind`             |
//! | `FunctionSchema`  | `ElementarySchema`| function   | `params`, `rtype`                          |
//!
//! Container defaults (`ArraySchema`, `DictSchema`) and the `DateTimeSchema`
//! default are dynamic, so every instance gets a fresh value.
//!
//! ## Bootstrap
//!
//! The types are built against a private registry rather than the process
//! one, which is itself initialised from [`Builtins::install`]. Plain
//! `default` members are wrapped into `RefSchema` from the second type on.

use std::collections::BTreeMap;
use std::sync::{Arc, OnceLock};

use chrono::Utc;
use skema_core::DataType;

use crate::annotation::DocstringAnnotations;
use crate::dynamic::{DynamicValue, This};
use crate::elementary::{AnyBehavior, ArrayBehavior, NumberBehavior, OneOfBehavior};
use crate::function::{FunctionBehavior, ParamBehavior};
use crate::kwargs;
use crate::reference::RefBehavior;
use crate::registry::Registry;
use crate::resolver::{ResolveContext, TypeSource};
use crate::schema::{SchemaType, SchemaTypeBuilder, SchemaTypeRef};
use crate::value::{Kwargs, Value};

/// Handles to every builtin schema type.
#[derive(Debug)]
pub struct Builtins {
    pub schema: SchemaTypeRef,
    pub reference: SchemaTypeRef,
    pub any: SchemaTypeRef,
    pub elementary: SchemaTypeRef,
    pub boolean: SchemaTypeRef,
    pub number: SchemaTypeRef,
    pub integer: SchemaTypeRef,
    pub float: SchemaTypeRef,
    pub string: SchemaTypeRef,
    pub array: SchemaTypeRef,
    pub dict: SchemaTypeRef,
    pub enumeration: SchemaTypeRef,
    pub datetime: SchemaTypeRef,
    pub one_of: SchemaTypeRef,
    pub param: SchemaTypeRef,
    pub function: SchemaTypeRef,
}

static BUILTINS: OnceLock<Builtins> = OnceLock::new();

/// The builtin schema types, created on first call.
pub fn builtins() -> &'static Builtins {
    BUILTINS.get_or_init(bootstrap)
}

impl Builtins {
    /// Every builtin type, root first.
    pub fn all(&self) -> [&SchemaTypeRef; 16] {
        [
            &self.schema,
            &self.reference,
            &self.any,
            &self.elementary,
            &self.boolean,
            &self.number,
            &self.integer,
            &self.float,
            &self.string,
            &self.array,
            &self.dict,
            &self.enumeration,
            &self.datetime,
            &self.one_of,
            &self.param,
            &self.function,
        ]
    }

    /// Register every builtin type in `registry` under its own data types
    /// and name.
    pub fn install(&self, registry: &mut Registry) {
        for schema_type in self.all() {
            registry.register_type(schema_type, schema_type.data_types());
        }
    }
}

struct Bootstrap {
    table: Registry,
    reference: Option<SchemaTypeRef>,
}

impl Bootstrap {
    fn build(&mut self, builder: SchemaTypeBuilder) -> SchemaTypeRef {
        let schema_type = {
            let context = ResolveContext {
                source: TypeSource::Local(&self.table),
                reference: self.reference.clone(),
            };
            builder.build_detached(&context)
        };
        self.table
            .register_type(&schema_type, schema_type.data_types());
        schema_type
    }
}

fn bootstrap() -> Builtins {
    let mut boot = Bootstrap {
        table: Registry::new(),
        reference: None,
    };

    let schema = boot.build(SchemaType::builder("Schema"));
    let reference = boot.build(
        SchemaType::builder("RefSchema")
            .extends(&schema)
            .behavior(RefBehavior)
            .field("ref", &schema, Kwargs::new()),
    );
    boot.reference = Some(Arc::clone(&reference));

    let any = boot.build(
        SchemaType::builder("AnySchema")
            .extends(&schema)
            .behavior(AnyBehavior),
    );
    let elementary = boot.build(
        SchemaType::builder("ElementarySchema")
            .extends(&schema)
            .member("nullable", false),
    );
    let boolean = boot.build(
        SchemaType::builder("BooleanSchema")
            .extends(&elementary)
            .data_type(DataType::Bool)
            .member("default", false),
    );
    let number = boot.build(
        SchemaType::builder("NumberSchema")
            .extends(&elementary)
            .data_type(DataType::Number)
            .behavior(NumberBehavior)
            .this("min", This::new().with("nullable", true))
            .this("max", This::new().with("nullable", true)),
    );
    let integer = boot.build(
        SchemaType::builder("IntegerSchema")
            .extends(&number)
            .data_type(DataType::Int)
            .member("default", 0),
    );
    let float = boot.build(
        SchemaType::builder("FloatSchema")
            .extends(&number)
            .data_type(DataType::Float)
            .member("default", 0.0),
    );
    let string = boot.build(
        SchemaType::builder("StringSchema")
            .extends(&elementary)
            .data_type(DataType::Str)
            .member("default", ""),
    );
    let array = boot.build(
        SchemaType::builder("ArraySchema")
            .extends(&elementary)
            .data_type(DataType::Array)
            .behavior(ArrayBehavior)
            .field("minsize", &integer, kwargs! { "default" => 0 })
            .field(
                "maxsize",
                &integer,
                kwargs! { "nullable" => true, "default" => Value::Null },
            )
            .field("unique", &boolean, Kwargs::new())
            .field("items", &schema, Kwargs::new())
            .dynamic("default", DynamicValue::new(|| Value::Array(Vec::new()))),
    );
    let dict = boot.build(
        SchemaType::builder("DictSchema")
            .extends(&elementary)
            .data_type(DataType::Map)
            .dynamic("default", DynamicValue::new(|| Value::Map(BTreeMap::new()))),
    );
    let enumeration = boot.build(
        SchemaType::builder("EnumSchema")
            .extends(&elementary)
            .data_type(DataType::Enum),
    );
    let datetime = boot.build(
        SchemaType::builder("DateTimeSchema")
            .extends(&elementary)
            .data_type(DataType::DateTime)
            .dynamic("default", DynamicValue::new(|| Value::DateTime(Utc::now()))),
    );
    let one_of = boot.build(
        SchemaType::builder("OneOfSchema")
            .extends(&schema)
            .behavior(OneOfBehavior)
            .field("schemas", &array, Kwargs::new()),
    );
    let param = boot.build(
        SchemaType::builder("ParamSchema")
            .extends(&reference)
            .behavior(ParamBehavior)
            .field("hasvalue", &boolean, Kwargs::new())
            .field("autotype", &boolean, kwargs! { "default" => true })
            .field("kind", &string, kwargs! { "default" => "positional" }),
    );
    let function = boot.build(
        SchemaType::builder("FunctionSchema")
            .extends(&elementary)
            .data_type(DataType::Function)
            .behavior(FunctionBehavior::new(Arc::new(DocstringAnnotations)))
            .field("params", &array, Kwargs::new())
            .field("rtype", &schema, Kwargs::new()),
    );

    Builtins {
        schema,
        reference,
        any,
        elementary,
        boolean,
        number,
        integer,
        float,
        string,
        array,
        dict,
        enumeration,
        datetime,
        one_of,
        param,
        function,
    }
}

//! Integration test: end-to-end scenarios through the public API.
//!
//! Declares schema types the way a host program would, then validates,
//! dumps, and derives function schemas from callables.

use skema_engine::{
    builtins, derive_params, dump, kwargs, validate, Callable, ErrorKind, FunctionSchema, Kwargs,
    Object, ParamKind, Schema, SchemaError, SchemaType, SchemaTypeRef, Value,
};

fn coordinate(name: &str) -> Schema {
    builtins()
        .integer
        .instantiate(kwargs! { "name" => name, "nullable" => false, "default" => 0 })
        .unwrap()
}

fn point_type() -> SchemaTypeRef {
    SchemaType::builder("Point")
        .member("x", coordinate("x"))
        .member("y", coordinate("y"))
        .member("required", vec!["x", "y"])
        .build()
}

#[test]
fn test_point_validates_complete_object() {
    let point = point_type().instantiate(Kwargs::new()).unwrap();
    let data = Object::new().with("x", 1).with("y", 2);
    validate(&point, &data.into()).unwrap();
}

#[test]
fn test_point_reports_missing_y() {
    let point = point_type().instantiate(Kwargs::new()).unwrap();
    let data = Object::new().with("x", 1);
    let err = validate(&point, &data.into()).unwrap_err();
    assert_eq!(
        err,
        SchemaError::RequiredFieldMissing {
            schema: "Point".into(),
            field: "y".into(),
        }
    );
    assert!(err.to_string().contains("'y'"));
}

#[test]
fn test_point_dump() {
    let point = point_type()
        .instantiate(kwargs! { "x" => 1, "y" => 2 })
        .unwrap();
    assert_eq!(dump(&point), kwargs! { "x" => 1, "y" => 2 });
    assert_eq!(point.to_json(), serde_json::json!({ "x": 1, "y": 2 }));
}

#[test]
fn test_nested_record_dump_and_validate() {
    let point = point_type();
    let segment = SchemaType::builder("Segment")
        .field("start", &point, Kwargs::new())
        .field("end", &point, Kwargs::new())
        .build();

    let s = segment.instantiate(Kwargs::new()).unwrap();
    let end = point.instantiate(kwargs! { "x" => 3, "y" => 4 }).unwrap();
    s.set_attr("end", end).unwrap();

    assert_eq!(
        s.to_json(),
        serde_json::json!({
            "end": { "x": 3, "y": 4 },
            "start": null,
        })
    );

    let bad = Object::new()
        .with("start", Object::new().with("x", 1).with("y", 1))
        .with("end", Object::new().with("x", 1));
    let err = validate(&s, &bad.into()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::RequiredFieldMissing);
}

#[test]
fn test_json_input_round_trip() {
    let point = point_type().instantiate(Kwargs::new()).unwrap();
    let input = Value::from_json(&serde_json::json!({ "x": 7, "y": -1 }));
    validate(&point, &input).unwrap();

    let Value::Map(fields) = input else {
        panic!("object input should become a map");
    };
    let rebuilt = point_type().instantiate(fields).unwrap();
    assert_eq!(rebuilt.get_attr("x").unwrap(), Value::Int(7));
}

#[test]
fn test_signature_derivation() {
    let f = Callable::builder("f")
        .param("a")
        .param("b")
        .param_with_default("c", 3)
        .varargs("args")
        .varkw("kwargs")
        .build()
        .unwrap();

    let params = derive_params(&f).unwrap();
    let summary: Vec<(String, ParamKind, bool)> = params
        .iter()
        .map(|p| (p.name(), p.kind(), p.has_value()))
        .collect();
    assert_eq!(
        summary,
        vec![
            ("a".to_string(), ParamKind::Positional, false),
            ("b".to_string(), ParamKind::Positional, false),
            ("c".to_string(), ParamKind::Positional, true),
            ("args".to_string(), ParamKind::Varargs, false),
            ("kwargs".to_string(), ParamKind::Varkw, false),
        ]
    );
    assert_eq!(params[2].default(), Value::Int(3));
}

#[test]
fn test_docstring_hints() {
    let f = Callable::builder("scale")
        .param("a")
        .param("b")
        .param_with_default("c", 2)
        .doc(
            "Scale things.\n\n\
             :param float,int a: the value\n\
             :param bool b: whether to scale\n\
             :type c: int\n\
             :rtype: floats\n",
        )
        .build()
        .unwrap();
    let function = FunctionSchema::from_callable(f).unwrap();
    let params = function.params().unwrap();
    let b = builtins();

    let a_ref = params[0].reference().unwrap();
    assert!(a_ref.schema_type().extends(&b.one_of));
    params[0].validate(&Value::Float(0.5)).unwrap();
    params[0].validate(&Value::Int(1)).unwrap();
    assert!(params[0].validate(&Value::from("1")).is_err());

    assert!(params[1].reference().unwrap().schema_type().extends(&b.boolean));
    assert!(params[2].reference().unwrap().schema_type().extends(&b.integer));

    let rtype = function.rtype().unwrap();
    assert!(rtype.schema_type().extends(&b.array));
    rtype.validate(&Value::from(vec![1.0, 2.5])).unwrap();
    assert!(rtype.validate(&Value::from(vec![1])).is_err());
}

#[test]
fn test_function_call_through_schema() {
    let total = Callable::builder("total")
        .varargs("values")
        .doc(":type values: ints\n:rtype: int\n")
        .body(|args| Ok(Value::Int(args.varargs.iter().filter_map(Value::as_i64).sum())))
        .build()
        .unwrap();
    let function = FunctionSchema::from_callable(total).unwrap();

    let sum = function
        .call(vec![Value::Int(1), Value::Int(2), Value::Int(3)], Kwargs::new())
        .unwrap();
    assert_eq!(sum, Value::Int(6));

    let err = function
        .call(vec![Value::Int(1), Value::from("2")], Kwargs::new())
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::TypeMismatch);

    let err = function
        .call(Vec::new(), kwargs! { "extra" => 1 })
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::SignatureMismatch);
}

#[test]
fn test_function_member_on_schema_type() {
    let greet = Callable::builder("greet")
        .param_with_default("who", "world")
        .build()
        .unwrap();
    let ty = SchemaType::builder("Greeter")
        .member("greet", greet.clone())
        .build();

    let nested = ty.nested_schema("greet").unwrap();
    assert!(nested.schema_type().extends(&builtins().function));
    let function = FunctionSchema::from_schema(nested).unwrap();
    assert!(function.callable().unwrap().ptr_eq(&greet));
    assert_eq!(function.params().unwrap()[0].default(), Value::from("world"));
}

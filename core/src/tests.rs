#![cfg(test)]

use crate::{
    base64,
    de::{json::from_json, piq::*, text::*},
    error::Error,
    schema::*,
    ser::json::*,
    value::{object::*, piq::*},
};
use serde_json::json;

fn schema() -> Schema {
    Schema::from_value(json!([
        {"record": {"name": "point", "field": [
            {"name": "x", "type": "int"},
            {"name": "y", "type": "int"}
        ]}},
        {"record": {"name": "entry", "field": [
            {"name": "note", "type": "string", "mode": "optional"},
            {"name": "name", "type": "string"}
        ]}},
        {"record": {"name": "counter", "field": [
            {"name": "count", "type": "int", "mode": "optional"},
            {"name": "note", "type": "string", "mode": "optional", "json_omit_missing": false}
        ]}},
        {"record": {"name": "options", "field": [
            {"name": "verbose", "mode": "optional"},
            {"name": "enabled", "type": "bool", "mode": "optional"},
            {"name": "level", "type": "int", "mode": "optional", "piq_alias": "lvl"}
        ]}},
        {"record": {"name": "segment", "field": [
            {"type": "point", "piq_positional": true},
            {"name": "end", "type": "point", "mode": "optional"}
        ]}},
        {"variant": {"name": "value", "option": [
            {"name": "none"},
            {"type": "int"},
            {"type": "string"}
        ]}},
        {"variant": {"name": "number", "option": [
            {"type": "float"},
            {"type": "int"}
        ]}},
        {"variant": {"name": "token", "option": [
            {"type": "number"},
            {"name": "eof"}
        ]}},
        {"enum": {"name": "color", "option": [
            {"name": "red"},
            {"name": "dark-green"}
        ]}},
        {"alias": {"name": "hue", "type": "color"}},
        {"record": {"name": "size", "piq_allow_unnesting": true, "field": [
            {"name": "value", "type": "int"}
        ]}},
        {"record": {"name": "shape", "field": [
            {"name": "size", "type": "size"},
            {"name": "color", "type": "hue", "mode": "optional", "default": "red"},
            {"name": "tags", "type": "string", "mode": "repeated"},
            {"name": "data", "type": "binary", "mode": "optional"},
            {"name": "ratio", "type": "float", "mode": "optional"}
        ]}},
        {"list": {"name": "shapes", "type": "shape"}},
        {"record": {"name": "envelope", "field": [
            {"name": "payload", "type": "piqi-any"}
        ]}},
        {"alias": {"name": "loop-a", "type": "loop-b"}},
        {"alias": {"name": "loop-b", "type": "loop-a"}}
    ]))
    .unwrap()
}

fn parse(type_name: &str, text: &str) -> crate::Result<Object> {
    from_str(&schema(), type_name, text).map(Object::without_locs)
}

fn parse_strict(type_name: &str, text: &str) -> crate::Result<Object> {
    let config = ParseConfig::default().with_relaxed_parsing(false);
    from_str_as(&schema(), type_name, text, config).map(Object::without_locs)
}

fn point(x: i64, y: i64) -> Object {
    Record::new("point")
        .field("x", Object::from(x))
        .field("y", Object::from(y))
        .into()
}

fn variant(type_name: &str, tag: &str, value: Option<Object>) -> Object {
    Variant::new(type_name, tag, value).into()
}

#[test]
fn test_splice_expansion() {
    let tree = Piq::seq()
        .item(Piq::splice("a", [Piq::scalar(1), Piq::scalar(2)]).unwrap())
        .item(3);
    let expected = Piq::seq()
        .item(Piq::labeled("a", 1))
        .item(Piq::labeled("a", 2))
        .item(3);
    assert_eq!(tree.expand_splices().unwrap(), expected);

    let nested = Piq::seq().item(Piq::labeled(
        "b",
        Piq::seq().item(Piq::splice("c", [Piq::scalar(true)]).unwrap()),
    ));
    assert_eq!(
        nested.expand_splices().unwrap(),
        Piq::seq().item(Piq::labeled("b", Piq::seq().item(Piq::labeled("c", true))))
    );

    let outside = Piq::labeled("x", Piq::splice("a", [Piq::scalar(1)]).unwrap());
    assert!(matches!(
        outside.expand_splices(),
        Err(Error::Construction { .. })
    ));
}

#[test]
fn test_splice_of_scalar() {
    let error = Piq::splice("a", 1).unwrap_err();
    assert_eq!(
        error,
        Error::Construction {
            loc: None,
            message: "a* must be followed by a list, instead followed by: 1".to_owned(),
        }
    );
    assert!(matches!(
        piq_from_str(".a* 1"),
        Err(Error::Construction { .. })
    ));
}

#[test]
fn test_label_chains() {
    let tree = Piq::labeled("a.b.c", 1).expand_labels().unwrap();
    assert_eq!(
        tree,
        Piq::labeled("a", Piq::labeled("b", Piq::labeled("c", 1)))
    );
    assert_eq!(tree.clone().expand_labels().unwrap(), tree);

    assert_eq!(
        Piq::label("a.b").expand_labels().unwrap(),
        Piq::labeled("a", Piq::label("b"))
    );
    assert_eq!(Piq::label("a").expand_labels().unwrap(), Piq::label("a"));
}

#[test]
fn test_text_reader() {
    let tree = piq_from_str("[.a.b 1 .c* [2 3] % comment\n foo, \"x\\ty\" 0x1F -2.5e1 (.d)]")
        .unwrap();
    assert_eq!(
        tree.to_string(),
        r#"[.a.b 1 .c* [2 3] "foo" "x\ty" 31 -25.0 .d]"#
    );
    assert_eq!(
        piq_from_str(&tree.to_string()).unwrap().to_string(),
        tree.to_string()
    );

    let tree = piq_from_str("[1\n  .x 2]").unwrap();
    let items = tree.as_seq().unwrap();
    assert_eq!(items[0].loc(), Some(Loc::new(1, 2)));
    assert_eq!(items[1].loc(), Some(Loc::new(2, 3)));

    assert_eq!(
        piq_from_str("\"\\u{48}i\"").unwrap().as_literal(),
        Some(&Literal::Text("Hi".to_owned()))
    );
    assert!(matches!(piq_from_str("[1 2"), Err(Error::Syntax { loc: Some(_), .. })));
    assert!(matches!(piq_from_str("\"\\q\""), Err(Error::Syntax { .. })));
}

#[test]
fn test_positional_record() {
    assert_eq!(parse("point", "[1 2]").unwrap(), point(1, 2));
    assert_eq!(parse("point", "[.y 2 1]").unwrap(), point(1, 2));
    assert_eq!(
        from_piq(&schema(), "point", Piq::from([Piq::scalar(1)])),
        Err(Error::MissingField {
            loc: None,
            name: "y".to_owned(),
        })
    );
}

#[test]
fn test_required_before_optional() {
    let entry = |note: FieldValue, name: &str| -> Object {
        Record::new("entry")
            .field("name", Object::from(name))
            .field("note", note)
            .into()
    };
    assert_eq!(
        parse("entry", "[\"a\"]").unwrap(),
        entry(FieldValue::Missing, "a")
    );
    assert_eq!(
        parse("entry", "[\"a\" \"b\"]").unwrap(),
        entry(Object::from("b").into(), "a")
    );
    assert_eq!(
        parse("entry", "[\"a\" .note \"b\"]").unwrap(),
        entry(Object::from("b").into(), "a")
    );
}

#[test]
fn test_positional_mismatch_falls_through() {
    let record = parse("counter", "[\"hi\"]").unwrap();
    let record = record.as_record().unwrap();
    assert!(record.get("count").unwrap().is_missing());
    assert_eq!(
        record.single("note").and_then(Object::as_string),
        Some("hi".to_owned())
    );
}

#[test]
fn test_backtracking_scope() {
    let segment = parse("segment", "[.end [3 4] [1 2]]").unwrap();
    let segment = segment.as_record().unwrap();
    assert_eq!(segment.single("point"), Some(&point(1, 2)));
    assert_eq!(segment.single("end"), Some(&point(3, 4)));

    // structurally a point, but with an invalid inner field
    assert!(matches!(
        parse("segment", "[[1 \"x\"]]"),
        Err(Error::MissingField { name, .. }) if name == "y"
    ));

    // records are never matched positionally unless enabled
    assert!(matches!(
        parse("segment", "[[1 2] [3 4]]"),
        Err(Error::UnknownField { field, .. }) if field == "[3 4]"
    ));
}

#[test]
fn test_unknown_trailing_field() {
    assert_eq!(
        from_str(&schema(), "point", "[1 2 .z 3]"),
        Err(Error::UnknownField {
            loc: Some(Loc::new(1, 6)),
            field: ".z 3".to_owned(),
        })
    );
}

#[test]
fn test_duplicate_field() {
    assert_eq!(
        from_str(&schema(), "point", "[.x 1 .x 2 .y 3]"),
        Err(Error::DuplicateField {
            loc: Some(Loc::new(1, 7)),
            name: "x".to_owned(),
        })
    );
}

#[test]
fn test_flags() {
    let verbose = |text: &str| {
        parse("options", text).map(|value| {
            value
                .as_record()
                .and_then(|record| record.single("verbose"))
                .and_then(Object::as_bool)
        })
    };
    assert_eq!(verbose("[.verbose]").unwrap(), Some(true));
    assert_eq!(verbose("[.verbose true]").unwrap(), Some(true));
    assert_eq!(verbose("[.verbose false]").unwrap(), Some(false));
    assert_eq!(verbose("[]").unwrap(), Some(false));
    assert_eq!(
        from_str(&schema(), "options", "[.verbose .verbose]"),
        Err(Error::DuplicateField {
            loc: Some(Loc::new(1, 11)),
            name: "verbose".to_owned(),
        })
    );
    assert!(matches!(
        verbose("[.verbose 1]"),
        Err(Error::ScalarTypeMismatch { .. })
    ));
}

#[test]
fn test_bool_label_and_alias() {
    let options = parse("options", "[.enabled .lvl 3]").unwrap();
    let options = options.as_record().unwrap();
    assert_eq!(options.single("enabled").and_then(Object::as_bool), Some(true));
    assert_eq!(options.single("level").and_then(Object::as_int), Some(3));

    assert!(matches!(
        parse("options", "[.level]"),
        Err(Error::StructuralMismatch { message, .. })
            if message == "value must be specified for field 'level'"
    ));
}

#[test]
fn test_variant_options() {
    assert_eq!(parse("value", ".none").unwrap(), variant("value", "none", None));
    assert_eq!(parse("value", "none").unwrap(), variant("value", "none", None));
    assert_eq!(
        parse_strict("value", "none").unwrap(),
        variant("value", "string", Some(Object::from("none")))
    );
    assert_eq!(
        parse("value", "5").unwrap(),
        variant("value", "int", Some(Object::from(5)))
    );
    assert_eq!(
        parse("value", ".int 5").unwrap(),
        variant("value", "int", Some(Object::from(5)))
    );
    assert_eq!(
        parse("value", "true").unwrap(),
        variant("value", "string", Some(Object::from("true")))
    );
    assert!(matches!(
        parse_strict("value", "true"),
        Err(Error::UnknownVariant { .. })
    ));
    assert!(matches!(
        parse("value", ".none 1"),
        Err(Error::StructuralMismatch { .. })
    ));
    assert!(matches!(
        parse("value", ".int"),
        Err(Error::StructuralMismatch { message, .. }) if message == "value expected for option 'int'"
    ));
}

#[test]
fn test_variant_order() {
    assert_eq!(
        parse("number", "1").unwrap(),
        variant("number", "float", Some(Object::from(1.0)))
    );
    assert_eq!(
        parse_strict("number", "1").unwrap(),
        variant("number", "int", Some(Object::from(1)))
    );
}

#[test]
fn test_nested_variant() {
    assert_eq!(
        parse("token", "3").unwrap(),
        variant("token", "number", Some(variant("number", "float", Some(Object::from(3.0)))))
    );
    assert_eq!(
        parse("token", ".int 3").unwrap(),
        variant("token", "number", Some(variant("number", "int", Some(Object::from(3)))))
    );
    assert_eq!(parse("token", ".eof").unwrap(), variant("token", "eof", None));
    assert_eq!(
        from_str(&schema(), "token", "\"x\""),
        Err(Error::UnknownVariant {
            loc: Some(Loc::new(1, 1)),
            message: "unknown variant: \"x\"".to_owned(),
        })
    );
}

#[test]
fn test_enum() {
    assert_eq!(parse("hue", ".red").unwrap(), Enum::new("color", "red").into());
    assert_eq!(
        parse("hue", "dark-green").unwrap(),
        Enum::new("color", "dark-green").into()
    );
    assert!(matches!(
        parse("hue", ".blue"),
        Err(Error::UnknownVariant { .. })
    ));
}

#[test]
fn test_unnesting_and_defaults() {
    let expected: Object = Record::new("shape")
        .field("size", Object::from(Record::new("size").field("value", Object::from(3))))
        .field("color", Object::from(Enum::new("color", "red")))
        .field("tags", vec![Object::from("a"), Object::from("b")])
        .field("data", FieldValue::Missing)
        .field("ratio", Object::from(2.0))
        .into();
    assert_eq!(
        parse("shape", "[.size 3 .tags* [a b] .ratio 2]").unwrap(),
        expected
    );
    assert_eq!(
        parse("shape", "[.size.value 3 .tags \"a\" .tags \"b\" .ratio 2.0]").unwrap(),
        expected
    );

    assert!(matches!(
        parse("segment", "[[1 2] .end 3]"),
        Err(Error::StructuralMismatch { message, .. }) if message == "list expected"
    ));
}

#[test]
fn test_list() {
    let shapes = parse("shapes", "[[.size 1] [.size 2]]").unwrap();
    assert_eq!(shapes.as_list().unwrap().items.len(), 2);
    assert!(matches!(
        parse("shapes", "1"),
        Err(Error::StructuralMismatch { .. })
    ));
}

#[test]
fn test_relaxed_scalars() {
    let string = |value: Piq| from_piq(&schema(), "string", value).map(|v| v.as_string());
    assert_eq!(string(Piq::scalar(1)).unwrap(), Some("1".to_owned()));
    assert_eq!(string(Piq::scalar(1.5)).unwrap(), Some("1.5".to_owned()));
    assert_eq!(string(Piq::scalar(true)).unwrap(), Some("true".to_owned()));

    let strict = ParseConfig::default().with_relaxed_parsing(false);
    assert!(matches!(
        from_piq_as(&schema(), "string", Piq::scalar(1), strict),
        Err(Error::ScalarTypeMismatch { .. })
    ));
    assert!(matches!(
        from_piq_as(&schema(), "float", Piq::scalar(2), strict),
        Err(Error::ScalarTypeMismatch { .. })
    ));
    assert_eq!(
        from_piq(&schema(), "float", Piq::scalar(2)).unwrap().as_float(),
        Some(2.0)
    );
    assert!(matches!(
        from_piq(&schema(), "int", Piq::scalar("1")),
        Err(Error::ScalarTypeMismatch { .. })
    ));
}

#[test]
fn test_schema_errors() {
    assert!(matches!(
        from_piq(&schema(), "loop-a", Piq::scalar(1)),
        Err(Error::Schema(_))
    ));
    assert_eq!(
        from_piq(&schema(), "nope", Piq::scalar(1)),
        Err(Error::UnknownType("nope".to_owned()))
    );
    assert!(matches!(
        Schema::from_json("[{\"table\": {}}]"),
        Err(Error::Schema(_))
    ));
    assert!(matches!(
        parse("envelope", "[.payload 1]"),
        Err(Error::Unsupported { .. })
    ));
}

#[test]
fn test_schema_builder() {
    let mut schema = Schema::with_capacity(4);
    schema
        .with(
            RecordDef::new("dim")
                .field(FieldSpec::new("value", "int"))
                .allow_unnesting(true),
        )
        .with(
            RecordDef::new("label")
                .field(FieldSpec::of_type("dim").positional(true))
                .field(
                    FieldSpec::new("weight", "float")
                        .optional()
                        .alias("w")
                        .default_value(json!(1.0)),
                )
                .field(FieldSpec::new("tag", "string").repeated().json_name("tags"))
                .field(
                    FieldSpec::new("note", "string")
                        .mode(Mode::Optional)
                        .omit_missing(false),
                )
                .field(FieldSpec::flag("hidden")),
        )
        .with(Typedef::Variant(
            VariantDef::new("mark")
                .option(OptionSpec::tag("none").alias("nil"))
                .option(OptionSpec::of_type("label"))
                .option(OptionSpec::new("count", "int").json_name("n")),
        ))
        .with(AliasDef::new("mark-ref", "mark"));
    assert_eq!(schema.len(), 4);

    let label = from_str(&schema, "label", "[[3] .w 2.5 .tag \"x\" .tag \"y\" .hidden]")
        .unwrap()
        .without_locs();
    let record = label.as_record().unwrap();
    assert_eq!(
        record.single("dim"),
        Some(&Object::from(Record::new("dim").field("value", Object::from(3))))
    );
    assert_eq!(record.single("weight").and_then(Object::as_float), Some(2.5));
    assert_eq!(
        record.get("tag"),
        Some(&FieldValue::Repeated(vec![Object::from("x"), Object::from("y")]))
    );
    assert_eq!(record.get("note"), Some(&FieldValue::Missing));
    assert_eq!(record.single("hidden").and_then(Object::as_bool), Some(true));

    let json = json!({
        "dim": {"value": 3},
        "weight": 2.5,
        "tags": ["x", "y"],
        "note": null,
        "hidden": true
    });
    assert_eq!(to_json(&schema, &label).unwrap(), json);
    assert_eq!(from_json(&schema, "label", &json).unwrap(), label);

    let label = from_str(&schema, "label", "[.dim 4]").unwrap().without_locs();
    let record = label.as_record().unwrap();
    assert_eq!(
        record.single("dim"),
        Some(&Object::from(Record::new("dim").field("value", Object::from(4))))
    );
    assert_eq!(record.single("weight").and_then(Object::as_float), Some(1.0));
    assert_eq!(record.get("tag"), Some(&FieldValue::Repeated(vec![])));
    assert_eq!(record.single("hidden").and_then(Object::as_bool), Some(false));

    assert_eq!(
        from_str(&schema, "mark-ref", ".nil").unwrap().without_locs(),
        variant("mark", "none", None)
    );
    let count = from_str(&schema, "mark-ref", ".count 7").unwrap().without_locs();
    assert_eq!(count, variant("mark", "count", Some(Object::from(7))));
    assert_eq!(to_json(&schema, &count).unwrap(), json!({"n": 7}));
    assert_eq!(from_json(&schema, "mark-ref", &json!({"n": 7})).unwrap(), count);
}

#[test]
fn test_parser_reuse() {
    let schema = schema();
    let mut parser = Parser::new(&schema, Default::default());
    assert!(parser.parse("point", piq_from_str("[1 \"x\"]").unwrap()).is_err());
    assert_eq!(
        parser
            .parse("point", piq_from_str("[1 2]").unwrap())
            .unwrap()
            .without_locs(),
        point(1, 2)
    );
}

#[test]
fn test_json_round_trip() {
    let schema = schema();
    let input = json!({
        "size": {"value": 3},
        "color": "dark_green",
        "tags": ["a", "b"],
        "data": "aGk=",
        "ratio": 0.5
    });
    let value = from_json(&schema, "shape", &input).unwrap();
    let record = value.as_record().unwrap();
    assert_eq!(
        record.single("color"),
        Some(&Object::from(Enum::new("color", "dark-green")))
    );
    assert_eq!(
        record.single("data").and_then(Object::as_binary),
        Some(b"hi".to_vec())
    );
    assert_eq!(to_json(&schema, &value).unwrap(), input);

    let input = json!({"piqi_type": "point", "x": 1, "y": 2});
    assert_eq!(from_json(&schema, "point", &input).unwrap(), point(1, 2));
}

#[test]
fn test_json_omit_policy() {
    let schema = schema();
    let value = from_json(&schema, "shape", &json!({"size": {"value": 1}})).unwrap();
    assert_eq!(
        to_json(&schema, &value).unwrap(),
        json!({"size": {"value": 1}, "color": "red"})
    );
    let config = JsonConfig::default().with_omit_missing_fields(false);
    assert_eq!(
        to_json_as(&schema, &value, config).unwrap(),
        json!({
            "size": {"value": 1},
            "color": "red",
            "tags": [],
            "data": null,
            "ratio": null
        })
    );

    let counter = from_json(&schema, "counter", &json!({})).unwrap();
    assert_eq!(to_json(&schema, &counter).unwrap(), json!({"note": null}));

    let options = parse("options", "[.verbose]").unwrap();
    assert_eq!(to_json(&schema, &options).unwrap(), json!({"verbose": true}));
    let options = parse("options", "[]").unwrap();
    assert_eq!(to_json(&schema, &options).unwrap(), json!({}));

    let incomplete: Object = Record::new("point").field("x", Object::from(1)).into();
    assert!(matches!(
        to_json(&schema, &incomplete),
        Err(Error::MissingField { name, .. }) if name == "y"
    ));
}

#[test]
fn test_json_null_fields() {
    let schema = schema();
    let counter = from_json(&schema, "counter", &json!({})).unwrap();
    let json = to_json(&schema, &counter).unwrap();
    assert_eq!(from_json(&schema, "counter", &json).unwrap(), counter);
    assert_eq!(
        counter.as_record().and_then(|record| record.get("note")),
        Some(&FieldValue::Missing)
    );

    let shape = from_json(&schema, "shape", &json!({"size": {"value": 1}})).unwrap();
    let config = JsonConfig::default().with_omit_missing_fields(false);
    let json = to_json_as(&schema, &shape, config).unwrap();
    assert_eq!(from_json(&schema, "shape", &json).unwrap(), shape);

    let value = from_json(
        &schema,
        "shape",
        &json!({"size": {"value": 1}, "color": null, "tags": null}),
    )
    .unwrap();
    let record = value.as_record().unwrap();
    assert_eq!(
        record.single("color"),
        Some(&Object::from(Enum::new("color", "red")))
    );
    assert_eq!(record.get("tags"), Some(&FieldValue::Repeated(vec![])));

    assert_eq!(
        from_json(&schema, "point", &json!({"x": 1, "y": null})),
        Err(Error::MissingField {
            loc: None,
            name: "y".to_owned(),
        })
    );
    assert_eq!(
        from_json(&schema, "options", &json!({"verbose": null}))
            .unwrap()
            .as_record()
            .and_then(|record| record.single("verbose"))
            .and_then(Object::as_bool),
        Some(false)
    );
}

#[test]
fn test_json_variants() {
    let schema = schema();
    for (value, json) in [
        (variant("value", "none", None), json!({"none": true})),
        (variant("value", "int", Some(Object::from(5))), json!({"int": 5})),
        (
            variant("token", "number", Some(variant("number", "float", Some(Object::from(1.5))))),
            json!({"number": {"float": 1.5}}),
        ),
    ] {
        let type_name = value.type_name().unwrap().to_owned();
        assert_eq!(to_json(&schema, &value).unwrap(), json);
        assert_eq!(from_json(&schema, &type_name, &json).unwrap(), value);
    }
    assert_eq!(
        to_json(&schema, &variant("value", "int", None)).unwrap(),
        json!({"int": null})
    );
    assert!(matches!(
        from_json(&schema, "value", &json!({"int": null})),
        Err(Error::ScalarTypeMismatch { .. })
    ));

    for tag in ["red", "dark-green"] {
        let value = Object::from(Enum::new("color", tag));
        let json = to_json(&schema, &value).unwrap();
        assert_eq!(from_json(&schema, "color", &json).unwrap(), value);
    }
}

#[test]
fn test_json_errors() {
    let schema = schema();
    assert_eq!(
        from_json(&schema, "point", &json!({"x": 1})),
        Err(Error::MissingField {
            loc: None,
            name: "y".to_owned(),
        })
    );
    assert!(matches!(
        from_json(&schema, "point", &json!({"x": 1, "y": 2, "z": 3})),
        Err(Error::UnknownField { field, .. }) if field == "'z'"
    ));
    assert!(matches!(
        from_json(&schema, "shape", &json!({"size": {"value": 1}, "tags": "a"})),
        Err(Error::StructuralMismatch { .. })
    ));
    assert!(matches!(
        from_json(&schema, "options", &json!({"verbose": 1})),
        Err(Error::ScalarTypeMismatch { .. })
    ));
    assert!(matches!(
        from_json(&schema, "value", &json!({"none": true, "int": 1})),
        Err(Error::StructuralMismatch { .. })
    ));
    assert!(matches!(
        from_json(&schema, "value", &json!({"none": false})),
        Err(Error::ScalarTypeMismatch { .. })
    ));
    assert!(matches!(
        from_json(&schema, "color", &json!("blue")),
        Err(Error::UnknownVariant { .. })
    ));
    assert!(matches!(
        from_json(&schema, "int", &json!(u64::MAX)),
        Err(Error::ScalarTypeMismatch { .. })
    ));
}

#[test]
fn test_json_floats_and_binary() {
    let schema = schema();
    assert!(from_json(&schema, "float", &json!("NaN"))
        .unwrap()
        .as_float()
        .unwrap()
        .is_nan());
    assert_eq!(
        from_json(&schema, "float", &json!("-Infinity")).unwrap().as_float(),
        Some(f64::NEG_INFINITY)
    );
    assert_eq!(
        to_json(&schema, &Object::from(f64::INFINITY)).unwrap(),
        json!("Infinity")
    );
    assert_eq!(
        to_json(&schema, &Object::from(f64::NAN)).unwrap(),
        json!("NaN")
    );
    assert!(matches!(
        from_json(&schema, "binary", &json!("not base64!")),
        Err(Error::ScalarTypeMismatch { .. })
    ));

    assert_eq!(base64::encode(b"hello"), "aGVsbG8=");
    assert_eq!(base64::decode("aGVsbG8="), Some(b"hello".to_vec()));
    assert_eq!(base64::decode("aGk"), Some(b"hi".to_vec()));
    assert_eq!(base64::decode("a"), None);
}

#[test]
fn test_json_any() {
    let schema = schema();
    let input = json!({"payload": {
        "piqi_type": "piqi-any",
        "type": "point",
        "json": {"x": 1, "y": 2}
    }});
    let value = from_json(&schema, "envelope", &input).unwrap();
    let any = value
        .as_record()
        .and_then(|record| record.single("payload"))
        .and_then(Object::as_any)
        .unwrap();
    assert_eq!(any.typename.as_deref(), Some("point"));
    assert_eq!(any.json, Some(json!({"x": 1, "y": 2})));
    assert_eq!(to_json(&schema, &value).unwrap(), input);

    let value = from_json(&schema, "envelope", &json!({"payload": 5})).unwrap();
    assert_eq!(
        to_json(&schema, &value).unwrap(),
        json!({"payload": {"piqi_type": "piqi-any", "json": 5}})
    );

    let value = from_json(&schema, "piqi-any", &input).unwrap();
    assert_eq!(value.as_any().and_then(|any| any.json.clone()), Some(input));
}

//! The three generators must agree on the kind of every attribute

use rstest::{fixture, rstest};
use schemac::model::FieldKind;
use schemac::{parse, Compilation, Compiler, Format, GraphDatatype, ScalarKind, TypeConstraint};

fn schema_with_range(range: &str) -> String {
    format!(
        "id: https://example.org/agree\n\
         name: agree\n\
         default_range: string\n\
         types:\n\
         \x20 money:\n\
         \x20   typeof: decimal\n\
         \x20 year:\n\
         \x20   typeof: integer\n\
         \x20 price:\n\
         \x20   typeof: money\n\
         \x20 homepage:\n\
         \x20   typeof: uri\n\
         classes:\n\
         \x20 Thing:\n\
         \x20   attributes:\n\
         \x20     value:\n\
         \x20       range: {range}\n"
    )
}

#[rstest]
#[case::string("string", ScalarKind::String)]
#[case::integer("integer", ScalarKind::Integer)]
#[case::decimal("decimal", ScalarKind::Decimal)]
#[case::boolean("boolean", ScalarKind::Boolean)]
#[case::date("date", ScalarKind::Date)]
#[case::uri("uri", ScalarKind::Uri)]
#[case::uriorcurie("uriorcurie", ScalarKind::Uri)]
#[case::custom_decimal("money", ScalarKind::Decimal)]
#[case::custom_integer("year", ScalarKind::Integer)]
#[case::custom_chain("price", ScalarKind::Decimal)]
#[case::custom_uri("homepage", ScalarKind::Uri)]
fn generators_agree_on_scalar_kind(#[case] range: &str, #[case] expected: ScalarKind) {
    let doc = parse(&schema_with_range(range)).unwrap();
    let compiled = Compiler::default().compile(doc).unwrap();

    let model_kind = match &compiled.model.class("Thing").unwrap().class().field("value").unwrap().kind {
        FieldKind::Scalar { kind, .. } => Some(*kind),
        FieldKind::Object(_) => None,
    };
    let graph_kind = compiled
        .graph
        .shape("Thing")
        .unwrap()
        .property("value")
        .unwrap()
        .datatype
        .kind();
    let validation_kind = compiled
        .validation
        .class("Thing")
        .unwrap()
        .property("value")
        .unwrap()
        .constraint
        .kind();

    assert_eq!(model_kind, Some(expected));
    assert_eq!(graph_kind, Some(expected));
    assert_eq!(validation_kind, Some(expected));
}

#[test]
fn generators_agree_on_class_ranges() {
    let src = "id: https://example.org/agree\nname: agree\ndefault_range: string\nclasses:\n  Person:\n    attributes:\n      home:\n        range: Address\n  Address:\n    attributes:\n      street:\n";
    let compiled = Compiler::default().compile(parse(src).unwrap()).unwrap();

    let field = compiled.model.class("Person").unwrap().class().field("home").unwrap().clone();
    assert!(matches!(field.kind, FieldKind::Object(ref c) if c == "Address"));

    let prop = compiled.graph.shape("Person").unwrap().property("home").unwrap();
    assert_eq!(
        prop.datatype,
        GraphDatatype::ResourceRef {
            class: Some("Address".to_string())
        }
    );

    let constraint = &compiled.validation.class("Person").unwrap().property("home").unwrap().constraint;
    assert_eq!(constraint, &TypeConstraint::ClassRef("Address".to_string()));
}

#[rstest]
#[case::single(false, false)]
#[case::required(false, true)]
#[case::multivalued(true, false)]
#[case::required_multivalued(true, true)]
fn generators_agree_on_cardinality(#[case] multivalued: bool, #[case] required: bool) {
    let src = format!(
        "id: https://example.org/agree\nname: agree\nclasses:\n  Thing:\n    attributes:\n      tags:\n        range: string\n        multivalued: {multivalued}\n        required: {required}\n"
    );
    let compiled = Compiler::default().compile(parse(&src).unwrap()).unwrap();

    let field = compiled.model.class("Thing").unwrap().class().field("tags").unwrap().clone();
    assert_eq!((field.multivalued, field.required), (multivalued, required));

    let prop = compiled.graph.shape("Thing").unwrap().property("tags").unwrap();
    assert_eq!(prop.min_count, u32::from(required));
    assert_eq!(prop.max_count, if multivalued { None } else { Some(1) });

    let constraint = compiled.validation.class("Thing").unwrap().property("tags").unwrap();
    assert_eq!((constraint.multivalued, constraint.required), (multivalued, required));
}

const BOUNDARY: &str = "id: https://example.org/boundary\nname: boundary\ndefault_range: string\nclasses:\n  Address:\n    attributes:\n      street:\n  Person:\n    attributes:\n      id:\n        identifier: true\n      age:\n        range: integer\n      height:\n        range: decimal\n      alive:\n        range: boolean\n      born:\n        range: date\n      homepage:\n        range: uri\n      tags:\n        multivalued: true\n      home:\n        range: Address\n";

#[fixture]
fn boundary() -> Compilation {
    Compiler::default().compile(parse(BOUNDARY).unwrap()).unwrap()
}

/// JSON loading and JSON validation accept exactly the same documents
#[rstest]
#[case::integer(r#""age": 32"#, true)]
#[case::integer_with_zero_fraction(r#""age": 32.0"#, true)]
#[case::integer_with_exponent(r#""age": 1e2"#, true)]
#[case::negative_integer(r#""age": -7"#, true)]
#[case::fractional_integer(r#""age": 32.5"#, false)]
#[case::negative_exponent_integer(r#""age": 1e-2"#, false)]
#[case::integer_as_text(r#""age": "32""#, false)]
#[case::integer_as_boolean(r#""age": true"#, false)]
#[case::null_optional(r#""age": null"#, true)]
#[case::decimal(r#""height": 32.50"#, true)]
#[case::decimal_integral(r#""height": 32"#, true)]
#[case::decimal_exponent(r#""height": 1.5E-3"#, true)]
#[case::decimal_as_text(r#""height": "32.50""#, false)]
#[case::boolean(r#""alive": true"#, true)]
#[case::boolean_as_text(r#""alive": "True""#, false)]
#[case::boolean_as_lowercase_text(r#""alive": "true""#, false)]
#[case::boolean_as_number(r#""alive": 1"#, false)]
#[case::date(r#""born": "2024-02-29""#, true)]
#[case::date_not_in_calendar(r#""born": "2023-02-29""#, false)]
#[case::date_wrong_layout(r#""born": "17/05/1990""#, false)]
#[case::date_as_number(r#""born": 20240229"#, false)]
#[case::uri(r#""homepage": "https://example.org/p1""#, true)]
#[case::uri_with_space(r#""homepage": "not a uri""#, false)]
#[case::empty_uri(r#""homepage": """#, false)]
#[case::list(r#""tags": ["a", "b"]"#, true)]
#[case::empty_optional_list(r#""tags": []"#, true)]
#[case::null_list(r#""tags": null"#, true)]
#[case::scalar_for_list(r#""tags": "solo""#, false)]
#[case::null_in_list(r#""tags": [null]"#, false)]
#[case::object(r#""home": {"street": "Main St"}"#, true)]
#[case::empty_object(r#""home": {}"#, true)]
#[case::null_object(r#""home": null"#, true)]
#[case::text_for_object(r#""home": "Main St""#, false)]
#[case::unknown_nested_key(r#""home": {"zip": "12345"}"#, false)]
#[case::unknown_key(r#""nickname": "CK""#, false)]
#[case::null_identifier(r#""id": null"#, false)]
fn json_loader_and_validator_agree(boundary: Compilation, #[case] member: &str, #[case] accepted: bool) {
    let text = if member.starts_with(r#""id""#) {
        format!("{{{member}}}")
    } else {
        format!(r#"{{"id": "p1", {member}}}"#)
    };
    let data: serde_json::Value = serde_json::from_str(&text).unwrap();

    let loaded = boundary.load(&text, Format::Json, "Person");
    let report = boundary.validate_json(&data, "Person").unwrap();

    assert_eq!(loaded.is_ok(), accepted, "load {text}: {loaded:?}");
    assert_eq!(report.valid, accepted, "validate {text}: {:?}", report.violations);
}

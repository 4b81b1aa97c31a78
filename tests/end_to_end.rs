//! Whole-pipeline tests over the fixture schemas

use std::path::{Path, PathBuf};
use std::str::FromStr;

use bigdecimal::BigDecimal;
use num_bigint::BigInt;
use schemac::{
    raw_map, Compilation, Compiler, DeserializationError, Format, GraphDatatype, RawValue, SchemaError, ScalarKind,
};

fn fixture(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures").join(name)
}

fn compile(name: &str) -> Compilation {
    Compiler::default().compile_file(&fixture(name)).unwrap()
}

#[test]
fn person_scenario() {
    let compiled = compile("personinfo.yaml");

    let person = compiled
        .model
        .construct("Person", raw_map! { "id" => "ORCID:1234", "age" => 32 })
        .unwrap();
    assert_eq!(person.string("id"), Some("ORCID:1234"));

    let json = compiled.dump(&person, Format::Json).unwrap();
    let reloaded = compiled.load(&json, Format::Json, "Person").unwrap();
    assert_eq!(reloaded.integer("age"), Some(&BigInt::from(32)));
    assert_eq!(reloaded, person);

    let age = compiled.graph.shape("Person").unwrap().property("age").unwrap();
    assert_eq!(age.datatype, GraphDatatype::IntegerLiteral);
    assert!(compiled.turtle().contains("sh:datatype xsd:integer"));

    let data: serde_json::Value = serde_json::from_str(&json).unwrap();
    let report = compiled.validate_json(&data, "Person").unwrap();
    assert!(report.valid, "{:?}", report.violations);
    assert!(compiled.validate(&person).unwrap().valid);
}

#[test]
fn person_scenario_rejects_bad_age() {
    let compiled = compile("personinfo.yaml");
    let err = compiled
        .load(r#"{"id": "ORCID:1234", "age": "thirty-two", "aliases": "solo"}"#, Format::Json, "Person")
        .unwrap_err();
    match err {
        DeserializationError::Coercion(agg) => assert_eq!(agg.paths(), vec!["aliases", "age"]),
        other => panic!("unexpected {other:?}"),
    }

    let report = compiled
        .validate_json(&serde_json::json!({ "id": "ORCID:1234", "age": 32.5 }), "Person")
        .unwrap();
    assert!(!report.valid);
}

#[test]
fn documents_are_validated_as_written() {
    let compiled = compile("personinfo.yaml");

    // the block reader coerces the quoted age; the document itself is still wrong
    let check = compiled
        .validate_document("id: ORCID:1234\nage: \"32\"\n", Format::Block, "Person")
        .unwrap();
    assert!(check.load_error.is_none());
    assert!(!check.report.valid);
    assert!(check.report.violations.iter().any(|v| v.instance_path == "/age"));
    assert!(!check.passed());

    let check = compiled
        .validate_document(r#"{"id": "ORCID:1234", "age": "32"}"#, Format::Json, "Person")
        .unwrap();
    assert!(!check.report.valid);
    assert!(matches!(check.load_error, Some(DeserializationError::Coercion(_))));

    // rejected data still has its violations listed
    let check = compiled
        .validate_document(r#"{"id": "ORCID:1234", "age": "thirty-two", "extra": 1}"#, Format::Json, "Person")
        .unwrap();
    assert!(check.report.violations.len() >= 2, "{:?}", check.report.violations);
    assert!(check.load_error.is_some());

    let check = compiled
        .validate_document("id: ORCID:1234\nage: 32\n", Format::Block, "Person")
        .unwrap();
    assert!(check.passed(), "{:?} {:?}", check.report.violations, check.load_error);

    assert!(matches!(
        compiled.validate_document("{broken", Format::Json, "Person"),
        Err(schemac::ValidationError::Input(_))
    ));
}

#[test]
fn decimal_scenario_json() {
    let compiled = compile("personinfo_decimal.yaml");
    let person = compiled
        .model
        .construct("Person", raw_map! { "id" => "ORCID:1234", "age" => "32.50" })
        .unwrap();

    let json = schemac::dump_json(&person).unwrap();
    assert!(json.contains("32.50"), "{json}");

    let reloaded = compiled.load(&json, Format::Json, "Person").unwrap();
    let age = reloaded.decimal("age").unwrap();
    assert_eq!(age, &BigDecimal::from_str("32.50").unwrap());
    assert_eq!(&((age + BigDecimal::from(1)) - BigDecimal::from(1)), age);
    assert_eq!(reloaded, person);

    let report = compiled.validate(&reloaded).unwrap();
    assert!(report.valid, "{:?}", report.violations);
}

#[test]
fn decimal_scenario_block() {
    let compiled = compile("personinfo_decimal.yaml");
    let person = compiled
        .model
        .construct(
            "Person",
            raw_map! { "id" => "ORCID:1234", "age" => "32.50", "aliases" => vec!["Superman"] },
        )
        .unwrap();

    let block = compiled.dump(&person, Format::Block).unwrap();
    assert!(block.contains("age: 32.50\n"), "{block}");

    let reloaded = compiled.load(&block, Format::Block, "Person").unwrap();
    let age = reloaded.decimal("age").unwrap();
    assert_eq!(age.to_string(), "32.50");
    assert_eq!(&((age + BigDecimal::from(1)) - BigDecimal::from(1)), age);
    assert_eq!(reloaded, person);
}

#[test]
fn json_and_block_agree() {
    let compiled = compile("personinfo_decimal.yaml");
    let person = compiled
        .model
        .construct(
            "Person",
            raw_map! {
                "id" => "ORCID:1234",
                "full_name" => "Clark Kent",
                "phone" => "555-555-5555",
                "age" => RawValue::number("32.000000000000000000000000000001"),
            },
        )
        .unwrap();

    let via_block = compiled
        .load(&compiled.dump(&person, Format::Block).unwrap(), Format::Block, "Person")
        .unwrap();
    let via_json = compiled
        .load(&compiled.dump(&via_block, Format::Json).unwrap(), Format::Json, "Person")
        .unwrap();
    assert_eq!(via_json, person);
}

#[test]
fn imports_from_search_path() {
    let compiled = compile("imports/main.yaml");
    let doc = &compiled.document;
    assert_eq!(doc.resolved_imports, vec!["linkml:types", "core"]);
    assert_eq!(
        doc.classes.keys().collect::<Vec<_>>(),
        vec!["Organization", "Person"]
    );

    let salary = compiled.validation.class("Person").unwrap().property("salary").unwrap();
    assert_eq!(salary.constraint.kind(), Some(ScalarKind::Decimal));
    assert_eq!(
        compiled.graph.shape("Person").unwrap().iri,
        "http://schema.org/Person"
    );
    assert_eq!(
        compiled.graph.shape("Organization").unwrap().iri,
        "https://example.org/registry/Organization"
    );

    let org = compiled
        .load(
            "id: acme\nfounded: 1999-12-31\nmembers:\n  - id: p1\n    salary: 1000.10\n",
            Format::Block,
            "Organization",
        )
        .unwrap();
    let member = org.list("members").unwrap()[0].as_object().unwrap();
    assert_eq!(member.decimal("salary").unwrap().to_string(), "1000.10");
    assert!(compiled.validate(&org).unwrap().valid);

    let rust = compiled.rust_source();
    assert_eq!(rust.type_count, 2);
    assert!(rust.code.starts_with("//! Schema fingerprint: sha256:"));
    assert!(rust.code.contains("pub members: Vec<Person>,"));
}

#[test]
fn cyclic_imports_terminate() {
    let compiled = compile("imports/cycle_a.yaml");
    assert!(compiled.document.classes.contains_key("A"));
    assert!(compiled.document.classes.contains_key("B"));
    assert_eq!(compiled.graph.refs_out("B"), vec!["A"]);
}

#[test]
fn missing_schema_file() {
    let err = Compiler::default().compile_file(&fixture("nope.yaml")).unwrap_err();
    assert!(matches!(err, schemac::CompileError::Io { .. }));
}

#[test]
fn unknown_import_is_reported() {
    let err = Compiler::default()
        .load_source(
            "id: https://example.org/x\nname: x\nimports:\n  - nowhere\n",
            &fixture("imports"),
        )
        .unwrap_err();
    assert!(matches!(err, SchemaError::ImportResolution { ref import, .. } if import == "nowhere"));
}

//! Exact decimal, integer and text round trips through both encodings

use std::str::FromStr;

use bigdecimal::BigDecimal;
use num_bigint::BigInt;
use proptest::prelude::*;
use schemac::model::format_decimal;
use schemac::{parse, raw_map, Compilation, Compiler, Format, RawValue};

const LEDGER: &str = "id: https://example.org/ledger\nname: ledger\ndefault_range: string\nclasses:\n  Entry:\n    attributes:\n      id:\n        identifier: true\n      amount:\n        range: decimal\n      count:\n        range: integer\n      history:\n        range: decimal\n        multivalued: true\n";

const MEMO: &str = "id: https://example.org/memo\nname: memo\ndefault_range: string\nclasses:\n  Memo:\n    attributes:\n      id:\n        identifier: true\n      text:\n      links:\n        range: uri\n        multivalued: true\n";

fn ledger() -> Compilation {
    Compiler::default().compile(parse(LEDGER).unwrap()).unwrap()
}

fn memo() -> Compilation {
    Compiler::default().compile(parse(MEMO).unwrap()).unwrap()
}

/// URIs are any non-empty run without whitespace
fn uri_text() -> impl Strategy<Value = String> {
    "[^\\s]{1,24}"
}

/// Decimal literals with more significant digits than any binary float holds
fn wide_decimal() -> impl Strategy<Value = String> {
    (any::<bool>(), "[1-9][0-9]{0,20}", "[0-9]{10,30}").prop_map(|(negative, int, frac)| {
        format!("{}{}.{}", if negative { "-" } else { "" }, int, frac)
    })
}

fn wide_integer() -> impl Strategy<Value = String> {
    (any::<bool>(), "[1-9][0-9]{20,40}")
        .prop_map(|(negative, digits)| format!("{}{}", if negative { "-" } else { "" }, digits))
}

fn assert_exact(compiled: &Compilation, format: Format, amount: &str, count: &str, history: &[String]) {
    let entry = compiled
        .model
        .construct(
            "Entry",
            raw_map! {
                "id" => "e1",
                "amount" => RawValue::number(amount),
                "count" => RawValue::number(count),
                "history" => history.iter().map(|h| RawValue::number(h.as_str())).collect::<Vec<_>>(),
            },
        )
        .unwrap();

    let text = compiled.dump(&entry, format).unwrap();
    let reloaded = compiled.load(&text, format, "Entry").unwrap();
    assert_eq!(reloaded, entry);

    let original = BigDecimal::from_str(amount).unwrap();
    let value = reloaded.decimal("amount").unwrap();
    assert_eq!(value, &original);
    assert_eq!(format_decimal(value), amount);
    assert_eq!(&((value + BigDecimal::from(1)) - BigDecimal::from(1)), value);

    assert_eq!(reloaded.integer("count").unwrap(), &BigInt::from_str(count).unwrap());

    let rendered: Vec<String> = reloaded
        .list("history")
        .unwrap()
        .iter()
        .map(|v| format_decimal(v.as_decimal().unwrap()))
        .collect();
    assert_eq!(rendered, history);
}

proptest! {
    #[test]
    fn json_keeps_every_digit(
        amount in wide_decimal(),
        count in wide_integer(),
        history in prop::collection::vec(wide_decimal(), 0..4),
    ) {
        assert_exact(&ledger(), Format::Json, &amount, &count, &history);
    }

    #[test]
    fn block_keeps_every_digit(
        amount in wide_decimal(),
        count in wide_integer(),
        history in prop::collection::vec(wide_decimal(), 0..4),
    ) {
        assert_exact(&ledger(), Format::Block, &amount, &count, &history);
    }

    #[test]
    fn block_then_json_is_lossless(amount in wide_decimal(), count in wide_integer()) {
        let compiled = ledger();
        let entry = compiled
            .model
            .construct(
                "Entry",
                raw_map! {
                    "id" => "e1",
                    "amount" => RawValue::number(amount.as_str()),
                    "count" => RawValue::number(count.as_str()),
                },
            )
            .unwrap();
        let block = compiled.dump(&entry, Format::Block).unwrap();
        let via_block = compiled.load(&block, Format::Block, "Entry").unwrap();
        let json = compiled.dump(&via_block, Format::Json).unwrap();
        let via_json = compiled.load(&json, Format::Json, "Entry").unwrap();
        prop_assert_eq!(via_json, entry);
    }

    #[test]
    fn text_survives_both_encodings(
        id in any::<String>(),
        text in any::<String>(),
        links in prop::collection::vec(uri_text(), 0..3),
    ) {
        let compiled = memo();
        let memo = compiled
            .model
            .construct(
                "Memo",
                raw_map! {
                    "id" => id.as_str(),
                    "text" => text.as_str(),
                    "links" => links.iter().map(|l| RawValue::from(l.as_str())).collect::<Vec<_>>(),
                },
            )
            .unwrap();
        for format in [Format::Block, Format::Json] {
            let dumped = compiled.dump(&memo, format).unwrap();
            let reloaded = compiled.load(&dumped, format, "Memo").unwrap();
            prop_assert_eq!(&reloaded, &memo);
        }
    }
}

#[test]
fn trailing_zeros_survive() {
    let compiled = ledger();
    for format in [Format::Json, Format::Block] {
        assert_exact(&compiled, format, "32.50", "0", &["0.10".to_string(), "100.000".to_string()]);
    }
}

#[test]
fn zero_keeps_its_scale() {
    let compiled = ledger();
    for format in [Format::Json, Format::Block] {
        assert_exact(&compiled, format, "0.000", "0", &["0.0".to_string(), "0E+3".to_string()]);
    }
}

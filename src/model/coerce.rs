//! Scalar coercion functions, one per kind.
//!
//! The date and URI patterns here are also emitted by the validation
//! document, so the validator can never be looser than construction.

use std::str::FromStr;

use bigdecimal::{BigDecimal, Zero};
use chrono::NaiveDate;
use num_bigint::BigInt;
use once_cell::sync::Lazy;
use regex::Regex;

use super::{RawValue, Value};
use crate::range::ScalarKind;

/// ISO-8601 calendar date
pub const DATE_PATTERN: &str = r"^\d{4}-\d{2}-\d{2}$";
/// Non-empty, no whitespace
pub const URI_PATTERN: &str = r"^\S+$";

static DATE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(DATE_PATTERN).expect("valid date pattern"));
static URI_RE: Lazy<Regex> = Lazy::new(|| Regex::new(URI_PATTERN).expect("valid uri pattern"));

/// Canonical boolean spellings accepted from text
const TRUE_FORMS: &[&str] = &["true", "True", "TRUE"];
const FALSE_FORMS: &[&str] = &["false", "False", "FALSE"];

/// Which raw spellings a coercion accepts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Coercion {
    /// Numbers and booleans may also arrive as text, as the block reader produces them
    #[default]
    Lenient,
    /// Numbers and booleans only from typed literals, as JSON carries them
    Typed,
}

pub(crate) type CoerceFn = fn(&RawValue, Coercion) -> Result<Value, String>;

pub(crate) fn for_kind(kind: ScalarKind) -> CoerceFn {
    match kind {
        ScalarKind::String => coerce_string,
        ScalarKind::Integer => coerce_integer,
        ScalarKind::Decimal => coerce_decimal,
        ScalarKind::Boolean => coerce_boolean,
        ScalarKind::Date => coerce_date,
        ScalarKind::Uri => coerce_uri,
    }
}

fn coerce_string(raw: &RawValue, _: Coercion) -> Result<Value, String> {
    match raw {
        RawValue::Text(s) => Ok(Value::String(s.clone())),
        other => Err(format!("{} is not text", other.type_name())),
    }
}

fn coerce_integer(raw: &RawValue, mode: Coercion) -> Result<Value, String> {
    match raw {
        RawValue::Number(s) => parse_integer(s).map(Value::Integer),
        RawValue::Text(s) if mode == Coercion::Lenient => parse_integer(s).map(Value::Integer),
        other => Err(format!("{} is not numeric", other.type_name())),
    }
}

/// Integral literals, including `32.0` and `1e2`
fn parse_integer(text: &str) -> Result<BigInt, String> {
    if let Ok(value) = BigInt::from_str(text) {
        return Ok(value);
    }
    let value = parse_decimal(text).map_err(|_| "not an integer literal".to_string())?;
    if !value.is_integer() {
        return Err("has a fractional part".to_string());
    }
    Ok(value.with_scale(0).into_bigint_and_exponent().0)
}

/// Parse an exact decimal from literal text
pub fn parse_decimal(text: &str) -> Result<BigDecimal, String> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err("empty decimal literal".to_string());
    }
    if !trimmed
        .chars()
        .all(|c| c.is_ascii_digit() || matches!(c, '+' | '-' | '.' | 'e' | 'E'))
    {
        return Err("not a decimal literal".to_string());
    }
    BigDecimal::from_str(trimmed).map_err(|e| format!("not a decimal literal: {}", e))
}

/// Render a decimal with its stored scale.
///
/// `Display` drops the scale of zero, so `0.000` is spelled out here.
pub fn format_decimal(value: &BigDecimal) -> String {
    if !value.is_zero() {
        return value.to_string();
    }
    let (_, scale) = value.as_bigint_and_exponent();
    match scale {
        0 => "0".to_string(),
        s if s > 0 => format!("0.{}", "0".repeat(s as usize)),
        s => format!("0E+{}", -s),
    }
}

fn coerce_decimal(raw: &RawValue, mode: Coercion) -> Result<Value, String> {
    match raw {
        RawValue::Number(s) => parse_decimal(s).map(Value::Decimal),
        RawValue::Text(s) if mode == Coercion::Lenient => parse_decimal(s).map(Value::Decimal),
        other => Err(format!("{} is not numeric", other.type_name())),
    }
}

fn coerce_boolean(raw: &RawValue, mode: Coercion) -> Result<Value, String> {
    match raw {
        RawValue::Bool(b) => Ok(Value::Boolean(*b)),
        RawValue::Text(_) if mode == Coercion::Typed => Err("text is not a boolean".to_string()),
        RawValue::Text(s) if TRUE_FORMS.contains(&s.as_str()) => Ok(Value::Boolean(true)),
        RawValue::Text(s) if FALSE_FORMS.contains(&s.as_str()) => Ok(Value::Boolean(false)),
        RawValue::Text(_) => Err("not a canonical boolean".to_string()),
        other => Err(format!("{} is not a boolean", other.type_name())),
    }
}

fn coerce_date(raw: &RawValue, _: Coercion) -> Result<Value, String> {
    match raw {
        RawValue::Text(s) if DATE_RE.is_match(s) => NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .map(Value::Date)
            .map_err(|e| format!("invalid calendar date: {}", e)),
        RawValue::Text(_) => Err("not an ISO-8601 date (YYYY-MM-DD)".to_string()),
        other => Err(format!("{} is not a date", other.type_name())),
    }
}

fn coerce_uri(raw: &RawValue, _: Coercion) -> Result<Value, String> {
    match raw {
        RawValue::Text(s) if URI_RE.is_match(s) => Ok(Value::Uri(s.clone())),
        RawValue::Text(_) => Err("empty or contains whitespace".to_string()),
        other => Err(format!("{} is not a URI", other.type_name())),
    }
}

//! Raw input values and typed instance values

use std::fmt;

use bigdecimal::BigDecimal;
use chrono::NaiveDate;
use indexmap::IndexMap;
use num_bigint::BigInt;

use super::Instance;

/// Untyped input to construction.
///
/// Numbers are carried as their literal text. There is deliberately no
/// conversion from `f64`: a decimal that already went through binary
/// floating point cannot be made exact again.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawValue {
    Null,
    Bool(bool),
    /// Numeric literal exactly as written in the source
    Number(String),
    Text(String),
    List(Vec<RawValue>),
    Map(IndexMap<String, RawValue>),
}

impl RawValue {
    pub fn number(literal: impl Into<String>) -> Self {
        RawValue::Number(literal.into())
    }

    pub fn is_null(&self) -> bool {
        matches!(self, RawValue::Null)
    }

    pub(crate) fn type_name(&self) -> &'static str {
        match self {
            RawValue::Null => "null",
            RawValue::Bool(_) => "boolean",
            RawValue::Number(_) => "number",
            RawValue::Text(_) => "text",
            RawValue::List(_) => "list",
            RawValue::Map(_) => "mapping",
        }
    }

    /// Short rendering used in coercion diagnostics
    pub(crate) fn describe(&self) -> String {
        match self {
            RawValue::Null => "null".to_string(),
            RawValue::Bool(b) => b.to_string(),
            RawValue::Number(n) => n.clone(),
            RawValue::Text(s) => format!("{:?}", s),
            RawValue::List(items) => format!("list of {}", items.len()),
            RawValue::Map(map) => format!("mapping with {} key(s)", map.len()),
        }
    }
}

impl From<&str> for RawValue {
    fn from(s: &str) -> Self {
        RawValue::Text(s.to_string())
    }
}

impl From<String> for RawValue {
    fn from(s: String) -> Self {
        RawValue::Text(s)
    }
}

impl From<bool> for RawValue {
    fn from(b: bool) -> Self {
        RawValue::Bool(b)
    }
}

impl From<i64> for RawValue {
    fn from(n: i64) -> Self {
        RawValue::Number(n.to_string())
    }
}

impl From<i32> for RawValue {
    fn from(n: i32) -> Self {
        RawValue::Number(n.to_string())
    }
}

impl From<u64> for RawValue {
    fn from(n: u64) -> Self {
        RawValue::Number(n.to_string())
    }
}

impl From<BigDecimal> for RawValue {
    fn from(d: BigDecimal) -> Self {
        RawValue::Number(super::format_decimal(&d))
    }
}

impl<T: Into<RawValue>> From<Vec<T>> for RawValue {
    fn from(items: Vec<T>) -> Self {
        RawValue::List(items.into_iter().map(Into::into).collect())
    }
}

impl From<IndexMap<String, RawValue>> for RawValue {
    fn from(map: IndexMap<String, RawValue>) -> Self {
        RawValue::Map(map)
    }
}

impl From<serde_json::Value> for RawValue {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => RawValue::Null,
            serde_json::Value::Bool(b) => RawValue::Bool(b),
            // arbitrary_precision keeps the literal text
            serde_json::Value::Number(n) => RawValue::Number(n.to_string()),
            serde_json::Value::String(s) => RawValue::Text(s),
            serde_json::Value::Array(items) => RawValue::List(items.into_iter().map(Into::into).collect()),
            serde_json::Value::Object(map) => {
                RawValue::Map(map.into_iter().map(|(k, v)| (k, v.into())).collect())
            }
        }
    }
}

/// Raw attribute map handed to a constructor
pub type RawMap = IndexMap<String, RawValue>;

/// Build a raw attribute map: `raw_map! { "id" => "ORCID:1234", "age" => 32 }`
#[macro_export]
macro_rules! raw_map {
    ($($key:expr => $value:expr),* $(,)?) => {{
        let mut map = $crate::model::RawMap::new();
        $( map.insert(String::from($key), $crate::model::RawValue::from($value)); )*
        map
    }};
}

/// A typed attribute value
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    String(String),
    Integer(BigInt),
    Decimal(BigDecimal),
    Boolean(bool),
    Date(NaiveDate),
    Uri(String),
    List(Vec<Value>),
    Object(Instance),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) | Value::Uri(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_integer(&self) -> Option<&BigInt> {
        match self {
            Value::Integer(n) => Some(n),
            _ => None,
        }
    }

    pub fn as_decimal(&self) -> Option<&BigDecimal> {
        match self {
            Value::Decimal(d) => Some(d),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            Value::Date(d) => Some(*d),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&Instance> {
        match self {
            Value::Object(instance) => Some(instance),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("null"),
            Value::String(s) | Value::Uri(s) => f.write_str(s),
            Value::Integer(n) => write!(f, "{}", n),
            Value::Decimal(d) => f.write_str(&super::format_decimal(d)),
            Value::Boolean(b) => write!(f, "{}", b),
            Value::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            Value::List(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                f.write_str("]")
            }
            Value::Object(instance) => write!(f, "{}", instance),
        }
    }
}

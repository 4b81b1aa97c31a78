//! JSON encoding

use serde_json::{Map, Number};

use crate::error::{DeserializationError, SerializationError};
use crate::model::{format_decimal, Coercion, Instance, ObjectModel, RawValue, Value};

/// Convert an instance to a JSON value; null attributes are omitted
pub fn to_json_value(instance: &Instance) -> Result<serde_json::Value, SerializationError> {
    object_to_json(instance, "")
}

/// Compact JSON text
pub fn dump_json(instance: &Instance) -> Result<String, SerializationError> {
    Ok(serde_json::to_string(&to_json_value(instance)?)?)
}

/// Indented JSON text
pub fn dump_json_pretty(instance: &Instance) -> Result<String, SerializationError> {
    Ok(serde_json::to_string_pretty(&to_json_value(instance)?)?)
}

/// Parse JSON text into an instance of `class`
pub fn load_json(text: &str, model: &ObjectModel, class: &str) -> Result<Instance, DeserializationError> {
    let constructor = model
        .class(class)
        .ok_or_else(|| DeserializationError::UnknownClass(class.to_string()))?;

    let value: serde_json::Value = serde_json::from_str(text).map_err(|e| DeserializationError::Malformed {
        format: "JSON",
        reason: e.to_string(),
    })?;

    match RawValue::from(value) {
        RawValue::Map(raw) => Ok(constructor.construct_with(raw, Coercion::Typed)?),
        other => Err(DeserializationError::Malformed {
            format: "JSON",
            reason: format!("top level must be an object, found {}", other.type_name()),
        }),
    }
}

fn object_to_json(instance: &Instance, prefix: &str) -> Result<serde_json::Value, SerializationError> {
    let mut map = Map::new();
    for (name, value) in instance.values() {
        if value.is_null() {
            continue;
        }
        let path = join(prefix, name);
        map.insert(name.to_string(), value_to_json(value, &path)?);
    }
    Ok(serde_json::Value::Object(map))
}

fn value_to_json(value: &Value, path: &str) -> Result<serde_json::Value, SerializationError> {
    Ok(match value {
        Value::Null => {
            return Err(SerializationError::Value {
                path: path.to_string(),
                reason: "null inside a list".to_string(),
            })
        }
        Value::String(s) | Value::Uri(s) => serde_json::Value::String(s.clone()),
        Value::Integer(n) => serde_json::Value::Number(number_literal(&n.to_string(), path)?),
        Value::Decimal(d) => serde_json::Value::Number(number_literal(&format_decimal(d), path)?),
        Value::Boolean(b) => serde_json::Value::Bool(*b),
        Value::Date(d) => serde_json::Value::String(d.format("%Y-%m-%d").to_string()),
        Value::List(items) => serde_json::Value::Array(
            items
                .iter()
                .enumerate()
                .map(|(i, item)| value_to_json(item, &format!("{}[{}]", path, i)))
                .collect::<Result<_, _>>()?,
        ),
        Value::Object(instance) => object_to_json(instance, path)?,
    })
}

/// A JSON number holding exactly `literal`.
///
/// Going through the parser (rather than `Number::from_f64`) keeps the
/// literal text verbatim under `arbitrary_precision`.
fn number_literal(literal: &str, path: &str) -> Result<Number, SerializationError> {
    serde_json::from_str::<Number>(literal).map_err(|e| SerializationError::Value {
        path: path.to_string(),
        reason: format!("'{}' is not a JSON number: {}", literal, e),
    })
}

fn join(prefix: &str, name: &str) -> String {
    if prefix.is_empty() {
        name.to_string()
    } else {
        format!("{}.{}", prefix, name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::raw_map;
    use crate::schema::parse;
    use bigdecimal::BigDecimal;
    use std::str::FromStr;

    fn model() -> ObjectModel {
        let src = "id: https://example.org/m\nname: m\ndefault_range: string\nclasses:\n  Item:\n    attributes:\n      id:\n      price:\n        range: decimal\n      count:\n        range: integer\n      tags:\n        multivalued: true\n";
        ObjectModel::generate(&parse(src).unwrap()).unwrap()
    }

    #[test]
    fn test_decimal_literal_is_verbatim() {
        let item = model().construct("Item", raw_map! { "id" => "i1", "price" => "32.50" }).unwrap();
        let json = dump_json(&item).unwrap();
        assert_eq!(json, r#"{"id":"i1","price":32.50}"#);
    }

    #[test]
    fn test_round_trip_preserves_exactness() {
        let model = model();
        let text = "0.1000000000000000000000000000000000001";
        let item = model.construct("Item", raw_map! { "id" => "i1", "price" => RawValue::number(text) }).unwrap();
        let back = load_json(&dump_json(&item).unwrap(), &model, "Item").unwrap();
        assert_eq!(back, item);
        assert_eq!(back.decimal("price").unwrap(), &BigDecimal::from_str(text).unwrap());
    }

    #[test]
    fn test_load_rejects_malformed_and_invalid() {
        let model = model();
        assert!(matches!(
            load_json("{not json", &model, "Item"),
            Err(DeserializationError::Malformed { .. })
        ));
        assert!(matches!(
            load_json("[1, 2]", &model, "Item"),
            Err(DeserializationError::Malformed { .. })
        ));
        assert!(matches!(
            load_json(r#"{"count": "many", "price": "cheap"}"#, &model, "Item"),
            Err(DeserializationError::Coercion(ref e)) if e.errors.len() == 2
        ));
        assert!(matches!(
            load_json("{}", &model, "Nope"),
            Err(DeserializationError::UnknownClass(_))
        ));
    }

    #[test]
    fn test_load_takes_only_typed_literals() {
        let model = model();
        let err = load_json(r#"{"id":"i1","count":"32","price":"32.50"}"#, &model, "Item").unwrap_err();
        assert!(matches!(err, DeserializationError::Coercion(ref e) if e.paths() == vec!["price", "count"]));

        let item = load_json(r#"{"id":"i1","count":1e2,"price":null}"#, &model, "Item").unwrap();
        assert_eq!(item.integer("count"), Some(&num_bigint::BigInt::from(100)));
        assert!(item.get("price").unwrap().is_null());
    }

    #[test]
    fn test_zero_keeps_its_scale() {
        let model = model();
        let item = load_json(r#"{"id":"i1","price":0.000}"#, &model, "Item").unwrap();
        assert_eq!(dump_json(&item).unwrap(), r#"{"id":"i1","price":0.000}"#);
    }

    #[test]
    fn test_nulls_are_omitted() {
        let item = model().construct("Item", raw_map! { "id" => "i1", "tags" => vec!["a"] }).unwrap();
        assert_eq!(dump_json(&item).unwrap(), r#"{"id":"i1","tags":["a"]}"#);
    }
}

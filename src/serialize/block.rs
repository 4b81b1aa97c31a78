//! Block encoding: indentation-structured, YAML-compatible text.
//!
//! Writing is done by hand so numbers come out as the exact literal.
//! Reading walks `serde_yaml`'s event stream with seeds built from the
//! class field table: every scalar is taken as text and handed to the
//! same coercions as direct construction.

use std::fmt;

use serde::de::{self, DeserializeSeed, Deserializer, IgnoredAny, MapAccess, SeqAccess, Visitor};

use crate::error::{DeserializationError, SerializationError};
use crate::model::{format_decimal, ClassModel, FieldKind, FieldSpec, Instance, ObjectModel, RawMap, RawValue, Value};

const INDENT: usize = 2;

// =============================================================================
// Writing
// =============================================================================

/// Render an instance as block text; null attributes are omitted
pub fn dump_block(instance: &Instance) -> Result<String, SerializationError> {
    let mut writer = BlockWriter::default();
    if has_content(instance) {
        writer.mapping(instance, 0, "")?;
    } else {
        writer.out.push_str("{}\n");
    }
    Ok(writer.out)
}

#[derive(Default)]
struct BlockWriter {
    out: String,
}

impl BlockWriter {
    fn pad(&mut self, indent: usize) {
        self.out.extend(std::iter::repeat(' ').take(indent));
    }

    fn mapping(&mut self, instance: &Instance, indent: usize, prefix: &str) -> Result<(), SerializationError> {
        for (name, value) in instance.values().filter(|(_, v)| !v.is_null()) {
            let path = join(prefix, name);
            self.pad(indent);
            self.out.push_str(&key(name));
            self.out.push(':');
            match value {
                Value::List(items) if items.is_empty() => self.out.push_str(" []\n"),
                Value::List(items) => {
                    self.out.push('\n');
                    self.sequence(items, indent + INDENT, &path)?;
                }
                Value::Object(nested) if !has_content(nested) => self.out.push_str(" {}\n"),
                Value::Object(nested) => {
                    self.out.push('\n');
                    self.mapping(nested, indent + INDENT, &path)?;
                }
                scalar => {
                    self.out.push(' ');
                    self.out.push_str(&scalar_text(scalar, &path)?);
                    self.out.push('\n');
                }
            }
        }
        Ok(())
    }

    fn sequence(&mut self, items: &[Value], indent: usize, path: &str) -> Result<(), SerializationError> {
        for (i, item) in items.iter().enumerate() {
            let path = format!("{}[{}]", path, i);
            self.pad(indent);
            match item {
                Value::Object(nested) if !has_content(nested) => self.out.push_str("- {}\n"),
                Value::Object(nested) => {
                    self.out.push_str("-\n");
                    self.mapping(nested, indent + INDENT, &path)?;
                }
                Value::List(_) => {
                    return Err(SerializationError::Value {
                        path,
                        reason: "nested lists have no attribute form".to_string(),
                    })
                }
                scalar => {
                    self.out.push_str("- ");
                    self.out.push_str(&scalar_text(scalar, &path)?);
                    self.out.push('\n');
                }
            }
        }
        Ok(())
    }
}

fn has_content(instance: &Instance) -> bool {
    instance.values().any(|(_, v)| !v.is_null())
}

/// Attribute names are written bare when they are plain identifiers
fn key(name: &str) -> String {
    let plain = name
        .chars()
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    if plain {
        name.to_string()
    } else {
        quote(name)
    }
}

/// YAML double-quoted scalar. Everything outside the printable set, and
/// every character YAML reads as a line break, is written as an escape.
fn quote(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    out.push('"');
    for c in text.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\0' => out.push_str("\\0"),
            '\u{07}' => out.push_str("\\a"),
            '\u{08}' => out.push_str("\\b"),
            '\t' => out.push_str("\\t"),
            '\n' => out.push_str("\\n"),
            '\u{0b}' => out.push_str("\\v"),
            '\u{0c}' => out.push_str("\\f"),
            '\r' => out.push_str("\\r"),
            '\u{1b}' => out.push_str("\\e"),
            '\u{85}' => out.push_str("\\N"),
            '\u{2028}' => out.push_str("\\L"),
            '\u{2029}' => out.push_str("\\P"),
            c if c < ' ' || ('\u{7f}'..='\u{9f}').contains(&c) => {
                out.push_str(&format!("\\x{:02X}", c as u32));
            }
            '\u{feff}' | '\u{fffe}' | '\u{ffff}' => out.push_str(&format!("\\u{:04X}", c as u32)),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

/// Text values are always double-quoted, so `"true"` or `"32"` stay text
fn scalar_text(value: &Value, path: &str) -> Result<String, SerializationError> {
    Ok(match value {
        Value::String(s) | Value::Uri(s) => quote(s),
        Value::Date(d) => format!("\"{}\"", d.format("%Y-%m-%d")),
        Value::Integer(n) => n.to_string(),
        Value::Decimal(d) => format_decimal(d),
        Value::Boolean(b) => b.to_string(),
        Value::Null => {
            return Err(SerializationError::Value {
                path: path.to_string(),
                reason: "null inside a list".to_string(),
            })
        }
        Value::List(_) | Value::Object(_) => {
            return Err(SerializationError::Value {
                path: path.to_string(),
                reason: "not a scalar".to_string(),
            })
        }
    })
}

fn join(prefix: &str, name: &str) -> String {
    if prefix.is_empty() {
        name.to_string()
    } else {
        format!("{}.{}", prefix, name)
    }
}

// =============================================================================
// Reading
// =============================================================================

/// Parse block text into an instance of `class`
pub fn load_block(text: &str, model: &ObjectModel, class: &str) -> Result<Instance, DeserializationError> {
    let constructor = model
        .class(class)
        .ok_or_else(|| DeserializationError::UnknownClass(class.to_string()))?;

    let raw = ClassSeed {
        model,
        class: constructor.class(),
    }
    .deserialize(serde_yaml::Deserializer::from_str(text))
    .map_err(|e| DeserializationError::Malformed {
        format: "block",
        reason: e.to_string(),
    })?;

    Ok(constructor.construct(raw)?)
}

/// Reads a mapping of one class's attributes
struct ClassSeed<'a> {
    model: &'a ObjectModel,
    class: &'a ClassModel,
}

impl<'de, 'a> DeserializeSeed<'de> for ClassSeed<'a> {
    type Value = RawMap;

    fn deserialize<D: Deserializer<'de>>(self, deserializer: D) -> Result<RawMap, D::Error> {
        deserializer.deserialize_map(self)
    }
}

impl<'de, 'a> Visitor<'de> for ClassSeed<'a> {
    type Value = RawMap;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "a mapping of {} attributes", self.class.name)
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<RawMap, A::Error> {
        let mut map = RawMap::new();
        while let Some(key) = access.next_key::<String>()? {
            if map.contains_key(&key) {
                return Err(de::Error::custom(format!("duplicate attribute '{}'", key)));
            }
            // Unknown keys are kept untyped; construction reports them
            let value = match self.class.field(&key) {
                Some(field) => access.next_value_seed(FieldSeed {
                    model: self.model,
                    field,
                })?,
                None => access.next_value_seed(UntypedSeed)?,
            };
            map.insert(key, value);
        }
        Ok(map)
    }
}

/// Reads one attribute value: null, a single element, or a list
struct FieldSeed<'a> {
    model: &'a ObjectModel,
    field: &'a FieldSpec,
}

impl<'de, 'a> DeserializeSeed<'de> for FieldSeed<'a> {
    type Value = RawValue;

    fn deserialize<D: Deserializer<'de>>(self, deserializer: D) -> Result<RawValue, D::Error> {
        deserializer.deserialize_option(self)
    }
}

impl<'de, 'a> Visitor<'de> for FieldSeed<'a> {
    type Value = RawValue;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "a value for '{}'", self.field.name)
    }

    fn visit_none<E: de::Error>(self) -> Result<RawValue, E> {
        Ok(RawValue::Null)
    }

    fn visit_unit<E: de::Error>(self) -> Result<RawValue, E> {
        Ok(RawValue::Null)
    }

    fn visit_some<D: Deserializer<'de>>(self, deserializer: D) -> Result<RawValue, D::Error> {
        let element = ElementSeed {
            model: self.model,
            kind: &self.field.kind,
        };
        if self.field.multivalued {
            deserializer.deserialize_seq(ListVisitor(element))
        } else {
            element.deserialize(deserializer)
        }
    }
}

struct ListVisitor<'a>(ElementSeed<'a>);

impl<'de, 'a> Visitor<'de> for ListVisitor<'a> {
    type Value = RawValue;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a list")
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut access: A) -> Result<RawValue, A::Error> {
        let mut items = Vec::with_capacity(access.size_hint().unwrap_or(0));
        while let Some(item) = access.next_element_seed(self.0)? {
            items.push(item);
        }
        Ok(RawValue::List(items))
    }
}

/// Reads one element of a field's range
#[derive(Clone, Copy)]
struct ElementSeed<'a> {
    model: &'a ObjectModel,
    kind: &'a FieldKind,
}

impl<'de, 'a> DeserializeSeed<'de> for ElementSeed<'a> {
    type Value = RawValue;

    fn deserialize<D: Deserializer<'de>>(self, deserializer: D) -> Result<RawValue, D::Error> {
        match self.kind {
            FieldKind::Scalar { .. } => deserializer.deserialize_str(TextVisitor),
            FieldKind::Object(target) => {
                let constructor = self
                    .model
                    .class(target)
                    .ok_or_else(|| de::Error::custom(format!("class '{}' is not defined", target)))?;
                ClassSeed {
                    model: self.model,
                    class: constructor.class(),
                }
                .deserialize(deserializer)
                .map(RawValue::Map)
            }
        }
    }
}

/// Takes any scalar as its source text.
///
/// Binary floats are refused outright; an exact field must never see one.
struct TextVisitor;

impl<'de> Visitor<'de> for TextVisitor {
    type Value = RawValue;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a scalar")
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<RawValue, E> {
        Ok(RawValue::Text(v.to_string()))
    }

    fn visit_string<E: de::Error>(self, v: String) -> Result<RawValue, E> {
        Ok(RawValue::Text(v))
    }

    fn visit_bool<E: de::Error>(self, v: bool) -> Result<RawValue, E> {
        Ok(RawValue::Bool(v))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<RawValue, E> {
        Ok(RawValue::Number(v.to_string()))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<RawValue, E> {
        Ok(RawValue::Number(v.to_string()))
    }

    fn visit_f64<E: de::Error>(self, _: f64) -> Result<RawValue, E> {
        Err(E::custom("binary floating point value where exact text was expected"))
    }
}

/// Reads a value of an undeclared attribute for error reporting
struct UntypedSeed;

impl<'de> DeserializeSeed<'de> for UntypedSeed {
    type Value = RawValue;

    fn deserialize<D: Deserializer<'de>>(self, deserializer: D) -> Result<RawValue, D::Error> {
        deserializer.deserialize_any(UntypedVisitor)
    }
}

struct UntypedVisitor;

impl<'de> Visitor<'de> for UntypedVisitor {
    type Value = RawValue;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("any value")
    }

    fn visit_unit<E: de::Error>(self) -> Result<RawValue, E> {
        Ok(RawValue::Null)
    }

    fn visit_none<E: de::Error>(self) -> Result<RawValue, E> {
        Ok(RawValue::Null)
    }

    fn visit_bool<E: de::Error>(self, v: bool) -> Result<RawValue, E> {
        Ok(RawValue::Bool(v))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<RawValue, E> {
        Ok(RawValue::Number(v.to_string()))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<RawValue, E> {
        Ok(RawValue::Number(v.to_string()))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<RawValue, E> {
        Ok(RawValue::Number(v.to_string()))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<RawValue, E> {
        Ok(RawValue::Text(v.to_string()))
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut access: A) -> Result<RawValue, A::Error> {
        let mut items = Vec::new();
        while let Some(item) = access.next_element_seed(UntypedSeed)? {
            items.push(item);
        }
        Ok(RawValue::List(items))
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<RawValue, A::Error> {
        let mut map = RawMap::new();
        while let Some(key) = access.next_key::<String>()? {
            map.insert(key, access.next_value_seed(UntypedSeed)?);
        }
        Ok(RawValue::Map(map))
    }

    fn visit_enum<A: de::EnumAccess<'de>>(self, access: A) -> Result<RawValue, A::Error> {
        // Tagged nodes (`!tag value`) are kept by tag name only
        let (tag, variant) = access.variant::<String>()?;
        de::VariantAccess::newtype_variant::<IgnoredAny>(variant)?;
        Ok(RawValue::Text(tag))
    }
}

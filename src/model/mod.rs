//! Object Model
//!
//! Turns each schema class into a [`ClassModel`]: a static field table
//! `{attribute -> (range, coercion)}` computed once from the range
//! resolver. Construction is a fold over that table and the raw input map;
//! nothing is looked up by reflection at construction time.
//!
//! Construction validates everything up front and reports every failing
//! attribute in a single [`AggregateCoercionError`].

mod coerce;
mod value;

pub use coerce::{format_decimal, parse_decimal, Coercion, DATE_PATTERN, URI_PATTERN};
pub use value::{RawMap, RawValue, Value};

use std::fmt;

use bigdecimal::BigDecimal;
use chrono::NaiveDate;
use indexmap::IndexMap;
use num_bigint::BigInt;
use tracing::debug;

use crate::error::{AggregateCoercionError, Expected, Result, TypeCoercionError};
use crate::range::{RangeResolver, ScalarKind, TypeRange};
use crate::schema::SchemaDocument;
use coerce::CoerceFn;

// =============================================================================
// Instances
// =============================================================================

/// A constructed value of one class.
///
/// Instances carry their class name only, never a reference back to the
/// schema. Every declared attribute is present; absent ones are
/// [`Value::Null`].
#[derive(Debug, Clone, PartialEq)]
pub struct Instance {
    class: String,
    values: IndexMap<String, Value>,
}

impl Instance {
    pub fn class_name(&self) -> &str {
        &self.class
    }

    pub fn get(&self, attribute: &str) -> Option<&Value> {
        self.values.get(attribute)
    }

    /// Attributes in field-table order
    pub fn values(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn string(&self, attribute: &str) -> Option<&str> {
        self.get(attribute).and_then(Value::as_str)
    }

    pub fn uri(&self, attribute: &str) -> Option<&str> {
        match self.get(attribute) {
            Some(Value::Uri(s)) => Some(s),
            _ => None,
        }
    }

    pub fn integer(&self, attribute: &str) -> Option<&BigInt> {
        self.get(attribute).and_then(Value::as_integer)
    }

    pub fn decimal(&self, attribute: &str) -> Option<&BigDecimal> {
        self.get(attribute).and_then(Value::as_decimal)
    }

    pub fn boolean(&self, attribute: &str) -> Option<bool> {
        self.get(attribute).and_then(Value::as_bool)
    }

    pub fn date(&self, attribute: &str) -> Option<NaiveDate> {
        self.get(attribute).and_then(Value::as_date)
    }

    pub fn list(&self, attribute: &str) -> Option<&[Value]> {
        self.get(attribute).and_then(Value::as_list)
    }

    pub fn object(&self, attribute: &str) -> Option<&Instance> {
        self.get(attribute).and_then(Value::as_object)
    }
}

impl fmt::Display for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.class)?;
        let mut first = true;
        for (name, value) in self.values.iter().filter(|(_, v)| !v.is_null()) {
            if !first {
                f.write_str(", ")?;
            }
            first = false;
            write!(f, "{}={}", name, value)?;
        }
        f.write_str(")")
    }
}

// =============================================================================
// Field table
// =============================================================================

/// How one field's values are produced
#[derive(Clone)]
pub enum FieldKind {
    Scalar { kind: ScalarKind, coerce: CoerceFn },
    /// Nested instance of the named class
    Object(String),
}

impl fmt::Debug for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldKind::Scalar { kind, .. } => write!(f, "Scalar({})", kind),
            FieldKind::Object(class) => write!(f, "Object({})", class),
        }
    }
}

/// One row of a class's field table
#[derive(Debug, Clone)]
pub struct FieldSpec {
    pub name: String,
    pub range: TypeRange,
    pub multivalued: bool,
    pub required: bool,
    pub identifier: bool,
    pub description: Option<String>,
    pub kind: FieldKind,
}

/// Generated type for one schema class
#[derive(Debug, Clone)]
pub struct ClassModel {
    pub name: String,
    pub description: Option<String>,
    pub fields: Vec<FieldSpec>,
}

impl ClassModel {
    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }
}

/// All generated class types for one schema
#[derive(Debug, Clone)]
pub struct ObjectModel {
    schema_name: String,
    classes: IndexMap<String, ClassModel>,
}

/// Constructor for one class of an [`ObjectModel`]
#[derive(Debug, Clone, Copy)]
pub struct Constructor<'a> {
    model: &'a ObjectModel,
    class: &'a ClassModel,
}

impl<'a> Constructor<'a> {
    pub fn class(&self) -> &'a ClassModel {
        self.class
    }

    /// Build an instance, aggregating every coercion failure
    pub fn construct(&self, raw: IndexMap<String, RawValue>) -> std::result::Result<Instance, AggregateCoercionError> {
        self.construct_with(raw, Coercion::Lenient)
    }

    /// Build an instance accepting only the raw spellings `mode` allows
    pub fn construct_with(
        &self,
        raw: IndexMap<String, RawValue>,
        mode: Coercion,
    ) -> std::result::Result<Instance, AggregateCoercionError> {
        self.model.construct_class(self.class, &raw, mode)
    }
}

impl ObjectModel {
    /// Build the field tables for every class in `doc`
    pub fn generate(doc: &SchemaDocument) -> Result<Self> {
        let resolver = RangeResolver::new(doc)?;
        let mut classes = IndexMap::with_capacity(doc.classes.len());

        for (name, class) in &doc.classes {
            let fields = resolver
                .resolve_class(name)?
                .into_iter()
                .map(|resolved| {
                    let kind = match &resolved.range {
                        TypeRange::Scalar(kind) => FieldKind::Scalar {
                            kind: *kind,
                            coerce: coerce::for_kind(*kind),
                        },
                        TypeRange::Class(target) => FieldKind::Object(target.clone()),
                    };
                    FieldSpec {
                        required: resolved.attr.is_required(),
                        name: resolved.attr.name,
                        range: resolved.range,
                        multivalued: resolved.attr.multivalued,
                        identifier: resolved.attr.identifier,
                        description: resolved.attr.description,
                        kind,
                    }
                })
                .collect::<Vec<_>>();

            debug!(class = %name, fields = fields.len(), "generated class model");
            classes.insert(
                name.clone(),
                ClassModel {
                    name: name.clone(),
                    description: class.description.clone(),
                    fields,
                },
            );
        }

        Ok(Self {
            schema_name: doc.name.clone(),
            classes,
        })
    }

    pub fn schema_name(&self) -> &str {
        &self.schema_name
    }

    pub fn classes(&self) -> impl Iterator<Item = &ClassModel> {
        self.classes.values()
    }

    pub fn class(&self, name: &str) -> Option<Constructor<'_>> {
        self.classes.get(name).map(|class| Constructor { model: self, class })
    }

    /// Construct an instance of `class` from raw attribute values.
    ///
    /// An unknown class name is reported as a single coercion error so
    /// callers only handle one error type.
    pub fn construct(
        &self,
        class: &str,
        raw: IndexMap<String, RawValue>,
    ) -> std::result::Result<Instance, AggregateCoercionError> {
        match self.classes.get(class) {
            Some(model) => self.construct_class(model, &raw, Coercion::Lenient),
            None => Err(AggregateCoercionError {
                class: class.to_string(),
                errors: vec![TypeCoercionError::new(
                    "",
                    Expected::Class(class.to_string()),
                    "",
                    "class is not defined in this schema",
                )],
            }),
        }
    }

    fn construct_class(
        &self,
        class: &ClassModel,
        raw: &IndexMap<String, RawValue>,
        mode: Coercion,
    ) -> std::result::Result<Instance, AggregateCoercionError> {
        let mut errors = Vec::new();
        let instance = self.build(class, raw, "", mode, &mut errors);
        if errors.is_empty() {
            Ok(instance)
        } else {
            Err(AggregateCoercionError {
                class: class.name.clone(),
                errors,
            })
        }
    }

    fn build(
        &self,
        class: &ClassModel,
        raw: &IndexMap<String, RawValue>,
        prefix: &str,
        mode: Coercion,
        errors: &mut Vec<TypeCoercionError>,
    ) -> Instance {
        for (key, value) in raw {
            if class.field(key).is_none() {
                errors.push(TypeCoercionError::new(
                    join_path(prefix, key),
                    Expected::Known,
                    value.describe(),
                    format!("{} has no attribute '{}'", class.name, key),
                ));
            }
        }

        let values = class
            .fields
            .iter()
            .map(|field| {
                let path = join_path(prefix, &field.name);
                let value = match raw.get(&field.name) {
                    None | Some(RawValue::Null) => {
                        if field.required {
                            errors.push(TypeCoercionError::new(
                                &path,
                                Expected::Present,
                                "null",
                                "missing required value",
                            ));
                        }
                        Value::Null
                    }
                    Some(value) => self.field_value(field, value, &path, mode, errors),
                };
                (field.name.clone(), value)
            })
            .collect();

        Instance {
            class: class.name.clone(),
            values,
        }
    }

    fn field_value(
        &self,
        field: &FieldSpec,
        raw: &RawValue,
        path: &str,
        mode: Coercion,
        errors: &mut Vec<TypeCoercionError>,
    ) -> Value {
        if !field.multivalued {
            return self.single_value(&field.kind, raw, path, mode, errors);
        }
        match raw {
            RawValue::List(items) => {
                if items.is_empty() && field.required {
                    errors.push(TypeCoercionError::new(path, Expected::Present, "[]", "missing required value"));
                }
                let values = items
                    .iter()
                    .enumerate()
                    .map(|(i, item)| self.single_value(&field.kind, item, &format!("{}[{}]", path, i), mode, errors))
                    .collect();
                Value::List(values)
            }
            other => {
                errors.push(TypeCoercionError::new(
                    path,
                    Expected::List,
                    other.describe(),
                    "multivalued attribute needs a list",
                ));
                Value::Null
            }
        }
    }

    fn single_value(
        &self,
        kind: &FieldKind,
        raw: &RawValue,
        path: &str,
        mode: Coercion,
        errors: &mut Vec<TypeCoercionError>,
    ) -> Value {
        match kind {
            FieldKind::Scalar { kind, coerce } => match coerce(raw, mode) {
                Ok(value) => value,
                Err(reason) => {
                    errors.push(TypeCoercionError::new(path, Expected::Kind(*kind), raw.describe(), reason));
                    Value::Null
                }
            },
            FieldKind::Object(target) => {
                let Some(class) = self.classes.get(target) else {
                    errors.push(TypeCoercionError::new(
                        path,
                        Expected::Class(target.clone()),
                        raw.describe(),
                        "class is not defined in this schema",
                    ));
                    return Value::Null;
                };
                match raw {
                    RawValue::Map(map) => Value::Object(self.build(class, map, path, mode, errors)),
                    other => {
                        errors.push(TypeCoercionError::new(
                            path,
                            Expected::Class(target.clone()),
                            other.describe(),
                            format!("{} is not a mapping", other.type_name()),
                        ));
                        Value::Null
                    }
                }
            }
        }
    }
}

fn join_path(prefix: &str, name: &str) -> String {
    if prefix.is_empty() {
        name.to_string()
    } else {
        format!("{}.{}", prefix, name)
    }
}

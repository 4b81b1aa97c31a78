//! Validator Generator
//!
//! Emits a JSON Schema (draft 2020-12) document with one `$defs` entry per
//! class. Each property keeps a typed [`TypeConstraint`] next to its JSON
//! rendering so the constraint can be compared against the object model
//! and the semantic graph.

mod engine;

pub use engine::{JsonSchemaEngine, ValidationEngine, ValidationError, ValidationReport, Violation};

use indexmap::IndexMap;
use serde_json::{json, Map, Value};
use tracing::debug;

use crate::error::Result;
use crate::model::{DATE_PATTERN, URI_PATTERN};
use crate::range::{RangeResolver, ScalarKind, TypeRange};
use crate::schema::SchemaDocument;

/// Draft identifier written as `$schema`
pub const DRAFT_2020_12: &str = "https://json-schema.org/draft/2020-12/schema";

/// Constraint on one value of a property
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeConstraint {
    Scalar(ScalarKind),
    /// `$ref` to another class definition
    ClassRef(String),
}

impl TypeConstraint {
    pub fn kind(&self) -> Option<ScalarKind> {
        match self {
            TypeConstraint::Scalar(kind) => Some(*kind),
            TypeConstraint::ClassRef(_) => None,
        }
    }

    pub fn to_json(&self) -> Value {
        match self {
            TypeConstraint::Scalar(ScalarKind::String) => json!({ "type": "string" }),
            TypeConstraint::Scalar(ScalarKind::Integer) => json!({ "type": "integer" }),
            TypeConstraint::Scalar(ScalarKind::Decimal) => json!({ "type": "number" }),
            TypeConstraint::Scalar(ScalarKind::Boolean) => json!({ "type": "boolean" }),
            TypeConstraint::Scalar(ScalarKind::Date) => {
                json!({ "type": "string", "format": "date", "pattern": DATE_PATTERN })
            }
            TypeConstraint::Scalar(ScalarKind::Uri) => json!({ "type": "string", "pattern": URI_PATTERN }),
            TypeConstraint::ClassRef(class) => json!({ "$ref": def_ref(class) }),
        }
    }
}

impl From<&TypeRange> for TypeConstraint {
    fn from(range: &TypeRange) -> Self {
        match range {
            TypeRange::Scalar(kind) => TypeConstraint::Scalar(*kind),
            TypeRange::Class(name) => TypeConstraint::ClassRef(name.clone()),
        }
    }
}

/// One property of a class definition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyConstraint {
    pub name: String,
    pub constraint: TypeConstraint,
    pub multivalued: bool,
    pub required: bool,
    pub description: Option<String>,
}

impl PropertyConstraint {
    /// Optional properties also accept `null`, as construction does
    fn to_json(&self) -> Value {
        let mut schema = if self.multivalued {
            let mut array = json!({ "type": "array", "items": self.constraint.to_json() });
            if self.required {
                array["minItems"] = json!(1);
            }
            array
        } else {
            self.constraint.to_json()
        };
        if !self.required {
            schema = nullable(schema);
        }
        if let Some(description) = &self.description {
            schema["description"] = json!(description);
        }
        schema
    }
}

/// `$defs` entry for one class
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassConstraints {
    pub name: String,
    pub description: Option<String>,
    pub properties: Vec<PropertyConstraint>,
}

impl ClassConstraints {
    pub fn property(&self, name: &str) -> Option<&PropertyConstraint> {
        self.properties.iter().find(|p| p.name == name)
    }

    fn to_json(&self) -> Value {
        let mut properties = Map::new();
        for property in &self.properties {
            properties.insert(property.name.clone(), property.to_json());
        }
        let required: Vec<&str> = self
            .properties
            .iter()
            .filter(|p| p.required)
            .map(|p| p.name.as_str())
            .collect();

        let mut schema = Map::new();
        schema.insert("type".into(), json!("object"));
        if let Some(description) = &self.description {
            schema.insert("description".into(), json!(description));
        }
        schema.insert("properties".into(), Value::Object(properties));
        if !required.is_empty() {
            schema.insert("required".into(), json!(required));
        }
        schema.insert("additionalProperties".into(), json!(false));
        Value::Object(schema)
    }
}

/// Generated validation document for a whole schema
#[derive(Debug, Clone)]
pub struct ValidationDocument {
    id: String,
    title: String,
    classes: IndexMap<String, ClassConstraints>,
    document: Value,
}

impl ValidationDocument {
    pub fn generate(doc: &SchemaDocument) -> Result<Self> {
        let resolver = RangeResolver::new(doc)?;
        let mut classes = IndexMap::with_capacity(doc.classes.len());

        for (name, class) in &doc.classes {
            let properties = resolver
                .resolve_class(name)?
                .into_iter()
                .map(|resolved| PropertyConstraint {
                    constraint: TypeConstraint::from(&resolved.range),
                    required: resolved.attr.is_required(),
                    name: resolved.attr.name,
                    multivalued: resolved.attr.multivalued,
                    description: resolved.attr.description,
                })
                .collect::<Vec<_>>();
            debug!(class = %name, properties = properties.len(), "generated validation definition");
            classes.insert(
                name.clone(),
                ClassConstraints {
                    name: name.clone(),
                    description: class.description.clone(),
                    properties,
                },
            );
        }

        let mut defs = Map::new();
        for (name, class) in &classes {
            defs.insert(name.clone(), class.to_json());
        }

        let mut root = Map::new();
        root.insert("$schema".into(), json!(DRAFT_2020_12));
        root.insert("$id".into(), json!(doc.id));
        root.insert("title".into(), json!(doc.name));
        if let Some(description) = &doc.description {
            root.insert("description".into(), json!(description));
        }
        root.insert("$defs".into(), Value::Object(defs));

        Ok(Self {
            id: doc.id.clone(),
            title: doc.name.clone(),
            classes,
            document: Value::Object(root),
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn class(&self, name: &str) -> Option<&ClassConstraints> {
        self.classes.get(name)
    }

    pub fn classes(&self) -> impl Iterator<Item = &ClassConstraints> {
        self.classes.values()
    }

    /// The full document with every class under `$defs`
    pub fn as_json(&self) -> &Value {
        &self.document
    }

    /// A standalone schema whose root is the named class
    pub fn for_class(&self, name: &str) -> Option<Value> {
        if !self.classes.contains_key(name) {
            return None;
        }
        Some(json!({
            "$schema": DRAFT_2020_12,
            "title": name,
            "$ref": def_ref(name),
            "$defs": self.document["$defs"].clone(),
        }))
    }

    pub fn to_json_string(&self, pretty: bool) -> std::result::Result<String, serde_json::Error> {
        if pretty {
            serde_json::to_string_pretty(&self.document)
        } else {
            serde_json::to_string(&self.document)
        }
    }
}

fn nullable(mut schema: Value) -> Value {
    match schema.get("type").and_then(Value::as_str).map(str::to_string) {
        Some(kind) => {
            schema["type"] = json!([kind, "null"]);
            schema
        }
        None => json!({ "anyOf": [schema, { "type": "null" }] }),
    }
}

fn def_ref(class: &str) -> String {
    format!("#/$defs/{}", class)
}

//! Schema model and parser
//!
//! A schema is parsed once from block-structured source text into an
//! immutable [`SchemaDocument`]. Import resolution (see [`crate::imports`])
//! produces a new document rather than mutating this one.
//!
//! ```yaml
//! id: https://w3id.org/linkml/examples/personinfo
//! name: personinfo
//! prefixes:
//!   linkml: https://w3id.org/linkml/
//! imports:
//!   - linkml:types
//! default_range: string
//! classes:
//!   Person:
//!     attributes:
//!       id:
//!         identifier: true
//!       age:
//!         range: integer
//! ```

use std::collections::HashSet;
use std::fmt;
use std::marker::PhantomData;

use indexmap::IndexMap;
use serde::de::{self, Deserializer, MapAccess, Visitor};
use serde::{Deserialize, Serialize};

use crate::error::{Result, SchemaError};

/// A parsed schema document
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SchemaDocument {
    /// Schema identifier (a URI)
    pub id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Prefix used to namespace classes and attributes
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_prefix: Option<String>,
    /// Short name -> URI
    pub prefixes: IndexMap<String, String>,
    /// Import identifiers as declared
    pub imports: Vec<String>,
    /// Import identifiers already merged into this document
    pub resolved_imports: Vec<String>,
    /// Type name applied to attributes without an explicit range
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_range: Option<String>,
    /// Schema-defined types
    pub types: IndexMap<String, TypeDef>,
    /// Classes in declaration order
    pub classes: IndexMap<String, ClassDef>,
}

/// A schema-defined type
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TypeDef {
    pub name: String,
    /// Parent type; absent only for built-in type names
    #[serde(rename = "typeof", skip_serializing_if = "Option::is_none")]
    pub type_of: Option<String>,
    /// Datatype IRI or CURIE
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uri: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// A class and its own (non-inherited) attributes
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClassDef {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_a: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub class_uri: Option<String>,
    pub attributes: Vec<AttributeDef>,
}

impl ClassDef {
    pub fn attribute(&self, name: &str) -> Option<&AttributeDef> {
        self.attributes.iter().find(|a| a.name == name)
    }
}

/// An attribute declaration
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct AttributeDef {
    pub name: String,
    /// Declared range; empty means "use the schema default_range"
    pub range: String,
    pub multivalued: bool,
    pub required: bool,
    pub identifier: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slot_uri: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl AttributeDef {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_range(mut self, range: impl Into<String>) -> Self {
        self.range = range.into();
        self
    }

    /// Identifiers are always required
    pub fn is_required(&self) -> bool {
        self.required || self.identifier
    }
}

impl SchemaDocument {
    pub fn class(&self, name: &str) -> Option<&ClassDef> {
        self.classes.get(name)
    }

    /// Attributes of a class including those inherited through `is_a`.
    ///
    /// Parent attributes come first; an own attribute with an inherited
    /// name replaces the inherited one in place.
    pub fn induced_attributes(&self, class_name: &str) -> Result<Vec<AttributeDef>> {
        let mut chain = Vec::new();
        let mut seen = HashSet::new();
        let mut current = Some(class_name);

        while let Some(name) = current {
            if !seen.insert(name) {
                return Err(SchemaError::syntax(format!(
                    "is_a cycle through class '{}'",
                    name
                )));
            }
            let class = self.class(name).ok_or_else(|| {
                SchemaError::syntax(format!("class '{}' is not defined", name))
            })?;
            chain.push(class);
            current = class.is_a.as_deref();
        }

        let mut induced: Vec<AttributeDef> = Vec::new();
        for class in chain.into_iter().rev() {
            for attr in &class.attributes {
                match induced.iter_mut().find(|a| a.name == attr.name) {
                    Some(slot) => *slot = attr.clone(),
                    None => induced.push(attr.clone()),
                }
            }
        }
        Ok(induced)
    }

    /// Expand a CURIE (`prefix:local`) against the prefix table.
    ///
    /// Absolute IRIs (containing `://`) are returned unchanged.
    pub fn expand_curie(&self, curie: &str) -> Result<String> {
        if curie.contains("://") {
            return Ok(curie.to_string());
        }
        let (prefix, local) = curie.split_once(':').ok_or_else(|| SchemaError::PrefixResolution {
            prefix: String::new(),
            curie: curie.to_string(),
        })?;
        let base = self.prefixes.get(prefix).ok_or_else(|| SchemaError::PrefixResolution {
            prefix: prefix.to_string(),
            curie: curie.to_string(),
        })?;
        Ok(format!("{}{}", base, local))
    }

    /// Namespace for classes and attributes without an explicit URI
    pub fn namespace(&self) -> Result<String> {
        match &self.default_prefix {
            Some(prefix) => self
                .prefixes
                .get(prefix)
                .cloned()
                .ok_or_else(|| SchemaError::PrefixResolution {
                    prefix: prefix.clone(),
                    curie: format!("{}:", prefix),
                }),
            None if self.id.ends_with('/') || self.id.ends_with('#') => Ok(self.id.clone()),
            None => Ok(format!("{}/", self.id)),
        }
    }
}

// =============================================================================
// Parsing
// =============================================================================

/// Parse schema source text.
///
/// Fails with [`SchemaError::Syntax`] on malformed structure, unknown keys,
/// missing `id`/`name` and duplicate keys at any nesting level.
pub fn parse(source: &str) -> Result<SchemaDocument> {
    let raw: RawSchema = serde_yaml::from_str(source).map_err(|e| SchemaError::syntax(e.to_string()))?;
    raw.into_document()
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct RawSchema {
    id: Option<String>,
    name: Option<String>,
    description: Option<String>,
    default_prefix: Option<String>,
    prefixes: Option<UniqueMap<String>>,
    imports: Option<Vec<String>>,
    default_range: Option<String>,
    types: Option<UniqueMap<Option<RawType>>>,
    classes: Option<UniqueMap<Option<RawClass>>>,
}

#[derive(Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct RawType {
    #[serde(rename = "typeof")]
    type_of: Option<String>,
    uri: Option<String>,
    description: Option<String>,
}

#[derive(Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct RawClass {
    description: Option<String>,
    is_a: Option<String>,
    class_uri: Option<String>,
    attributes: Option<UniqueMap<Option<RawAttribute>>>,
}

#[derive(Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct RawAttribute {
    range: Option<String>,
    #[serde(default)]
    multivalued: bool,
    #[serde(default)]
    required: bool,
    #[serde(default)]
    identifier: bool,
    slot_uri: Option<String>,
    description: Option<String>,
}

impl RawSchema {
    fn into_document(self) -> Result<SchemaDocument> {
        let id = non_empty(self.id, "id")?;
        let name = non_empty(self.name, "name")?;

        let types = self
            .types
            .map(|m| m.0)
            .unwrap_or_default()
            .into_iter()
            .map(|(name, raw)| {
                let raw = raw.unwrap_or_default();
                let def = TypeDef {
                    name: name.clone(),
                    type_of: raw.type_of.filter(|s| !s.is_empty()),
                    uri: raw.uri,
                    description: raw.description,
                };
                (name, def)
            })
            .collect();

        let mut classes = IndexMap::new();
        for (class_name, raw) in self.classes.map(|m| m.0).unwrap_or_default() {
            if class_name.trim().is_empty() {
                return Err(SchemaError::syntax("class with an empty name"));
            }
            let raw = raw.unwrap_or_default();
            let attributes = raw
                .attributes
                .map(|m| m.0)
                .unwrap_or_default()
                .into_iter()
                .map(|(attr_name, attr)| {
                    let attr = attr.unwrap_or_default();
                    AttributeDef {
                        name: attr_name,
                        range: attr.range.unwrap_or_default(),
                        multivalued: attr.multivalued,
                        required: attr.required,
                        identifier: attr.identifier,
                        slot_uri: attr.slot_uri,
                        description: attr.description,
                    }
                })
                .collect();
            classes.insert(
                class_name.clone(),
                ClassDef {
                    name: class_name,
                    description: raw.description,
                    is_a: raw.is_a,
                    class_uri: raw.class_uri,
                    attributes,
                },
            );
        }

        Ok(SchemaDocument {
            id,
            name,
            description: self.description,
            default_prefix: self.default_prefix,
            prefixes: self.prefixes.map(|m| m.0.into_iter().collect()).unwrap_or_default(),
            imports: self.imports.unwrap_or_default(),
            resolved_imports: Vec::new(),
            default_range: self.default_range.filter(|s| !s.is_empty()),
            types,
            classes,
        })
    }
}

fn non_empty(value: Option<String>, key: &str) -> Result<String> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(SchemaError::syntax(format!("missing required key '{}'", key))),
    }
}

/// Ordered mapping that rejects duplicate keys
struct UniqueMap<V>(Vec<(String, V)>);

impl<'de, V: Deserialize<'de>> Deserialize<'de> for UniqueMap<V> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        struct UniqueMapVisitor<V>(PhantomData<V>);

        impl<'de, V: Deserialize<'de>> Visitor<'de> for UniqueMapVisitor<V> {
            type Value = UniqueMap<V>;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a mapping")
            }

            fn visit_unit<E: de::Error>(self) -> std::result::Result<Self::Value, E> {
                Ok(UniqueMap(Vec::new()))
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> std::result::Result<Self::Value, A::Error> {
                let mut entries: Vec<(String, V)> = Vec::new();
                while let Some(key) = access.next_key::<String>()? {
                    if entries.iter().any(|(k, _)| *k == key) {
                        return Err(de::Error::custom(format!("duplicate key '{}'", key)));
                    }
                    let value = access.next_value()?;
                    entries.push((key, value));
                }
                Ok(UniqueMap(entries))
            }
        }

        deserializer.deserialize_map(UniqueMapVisitor(PhantomData))
    }
}

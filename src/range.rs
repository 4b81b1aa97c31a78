//! Range resolution
//!
//! Maps every attribute's declared range to exactly one [`TypeRange`].
//! The built-in table in [`BUILTIN_TYPES`] is the only place where type
//! names meet scalar kinds; the object model, the semantic graph and the
//! validation document all go through [`RangeResolver`].

use std::collections::HashSet;
use std::fmt;

use fuzzy_matcher::skim::SkimMatcherV2;
use fuzzy_matcher::FuzzyMatcher;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::{Result, SchemaError};
use crate::schema::{AttributeDef, SchemaDocument};

/// Resolved, generator-agnostic scalar kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScalarKind {
    String,
    Integer,
    /// Arbitrary-precision fixed point, never binary floating point
    Decimal,
    Boolean,
    Date,
    Uri,
}

impl ScalarKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScalarKind::String => "string",
            ScalarKind::Integer => "integer",
            ScalarKind::Decimal => "decimal",
            ScalarKind::Boolean => "boolean",
            ScalarKind::Date => "date",
            ScalarKind::Uri => "uri",
        }
    }

    /// Kinds rendered as numeric literals in both interchange encodings
    pub fn is_numeric(&self) -> bool {
        matches!(self, ScalarKind::Integer | ScalarKind::Decimal)
    }
}

impl fmt::Display for ScalarKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Built-in type names and their kinds.
///
/// Built-ins are loaded into every [`TypeRegistry`] before schema-defined
/// types are merged.
pub const BUILTIN_TYPES: &[(&str, ScalarKind)] = &[
    ("string", ScalarKind::String),
    ("integer", ScalarKind::Integer),
    ("decimal", ScalarKind::Decimal),
    ("boolean", ScalarKind::Boolean),
    ("date", ScalarKind::Date),
    ("uri", ScalarKind::Uri),
    ("uriorcurie", ScalarKind::Uri),
];

/// Look up a built-in type name
pub fn builtin_kind(name: &str) -> Option<ScalarKind> {
    BUILTIN_TYPES
        .iter()
        .find(|(n, _)| *n == name)
        .map(|(_, kind)| *kind)
}

/// The resolved range of an attribute
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeRange {
    Scalar(ScalarKind),
    /// Nested instance of another class
    Class(String),
}

impl TypeRange {
    pub fn scalar_kind(&self) -> Option<ScalarKind> {
        match self {
            TypeRange::Scalar(kind) => Some(*kind),
            TypeRange::Class(_) => None,
        }
    }
}

impl fmt::Display for TypeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeRange::Scalar(kind) => write!(f, "{}", kind),
            TypeRange::Class(name) => write!(f, "{}", name),
        }
    }
}

/// A registered type: its kind plus an optional datatype URI
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisteredType {
    pub name: String,
    pub kind: ScalarKind,
    /// Datatype URI as declared (CURIE or IRI)
    pub uri: Option<String>,
}

/// Immutable registry of type names.
///
/// Initialization order: built-ins first, then schema-defined types
/// resolved through their `typeof` chains.
#[derive(Debug, Clone)]
pub struct TypeRegistry {
    types: IndexMap<String, RegisteredType>,
}

impl TypeRegistry {
    /// Registry holding only the built-in types
    pub fn builtins() -> Self {
        let types = BUILTIN_TYPES
            .iter()
            .map(|(name, kind)| {
                (
                    name.to_string(),
                    RegisteredType {
                        name: name.to_string(),
                        kind: *kind,
                        uri: None,
                    },
                )
            })
            .collect();
        Self { types }
    }

    /// Built-ins plus the schema's own types
    pub fn build(doc: &SchemaDocument) -> Result<Self> {
        let mut registry = Self::builtins();

        for (name, def) in &doc.types {
            let kind = resolve_type_chain(doc, name)?;
            let uri = def.uri.clone();

            match registry.types.get_mut(name) {
                Some(existing) if existing.kind != kind => {
                    return Err(SchemaError::conflict(
                        "type",
                        name.clone(),
                        format!("built-in kind is {}, schema declares {}", existing.kind, kind),
                    ));
                }
                Some(existing) => {
                    if uri.is_some() {
                        existing.uri = uri;
                    }
                }
                None => {
                    registry.types.insert(
                        name.clone(),
                        RegisteredType {
                            name: name.clone(),
                            kind,
                            uri,
                        },
                    );
                }
            }
        }

        Ok(registry)
    }

    pub fn get(&self, name: &str) -> Option<&RegisteredType> {
        self.types.get(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.types.keys().map(|s| s.as_str())
    }
}

/// Follow `typeof` links until a built-in name is reached
fn resolve_type_chain(doc: &SchemaDocument, start: &str) -> Result<ScalarKind> {
    let mut seen = HashSet::new();
    let mut current = start;

    loop {
        if !seen.insert(current) {
            return Err(SchemaError::conflict("type", start, format!("typeof cycle through '{}'", current)));
        }
        let parent = doc.types.get(current).and_then(|t| t.type_of.as_deref());
        match parent {
            Some(parent) => current = parent,
            None => {
                return builtin_kind(current).ok_or_else(|| SchemaError::UnknownRange {
                    range: current.to_string(),
                    owner: format!("type {}", start),
                    suggestion: suggest(current, BUILTIN_TYPES.iter().map(|(n, _)| *n)),
                });
            }
        }
    }
}

/// Resolves attribute ranges against one schema document
#[derive(Debug, Clone)]
pub struct RangeResolver<'a> {
    doc: &'a SchemaDocument,
    registry: TypeRegistry,
}

/// An induced attribute paired with its resolved range
#[derive(Debug, Clone)]
pub struct ResolvedAttribute {
    pub attr: AttributeDef,
    pub range: TypeRange,
}

impl<'a> RangeResolver<'a> {
    pub fn new(doc: &'a SchemaDocument) -> Result<Self> {
        let registry = TypeRegistry::build(doc)?;
        if let Some(name) = doc.classes.keys().find(|name| registry.get(name).is_some()) {
            return Err(SchemaError::conflict("name", name.clone(), "declared both as a type and as a class"));
        }
        Ok(Self { doc, registry })
    }

    /// Use an explicitly constructed registry
    pub fn with_registry(doc: &'a SchemaDocument, registry: TypeRegistry) -> Self {
        Self { doc, registry }
    }

    pub fn registry(&self) -> &TypeRegistry {
        &self.registry
    }

    pub fn document(&self) -> &'a SchemaDocument {
        self.doc
    }

    /// Resolve one attribute's range.
    ///
    /// An empty range uses the schema `default_range`; there is no fallback
    /// past that.
    pub fn resolve_range(&self, attr: &AttributeDef) -> Result<TypeRange> {
        if !attr.range.is_empty() {
            return self.lookup(&attr.range, &attr.name);
        }
        match &self.doc.default_range {
            Some(default) => self.lookup(default, &attr.name),
            None => Err(SchemaError::UnresolvedRange {
                owner: attr.name.clone(),
            }),
        }
    }

    /// Induced attributes of a class with their ranges
    pub fn resolve_class(&self, class_name: &str) -> Result<Vec<ResolvedAttribute>> {
        self.doc
            .induced_attributes(class_name)?
            .into_iter()
            .map(|attr| {
                let range = self.resolve_range(&attr).map_err(|e| qualify(e, class_name))?;
                Ok(ResolvedAttribute { attr, range })
            })
            .collect()
    }

    /// Datatype URI declared for a scalar range name, if any
    pub fn type_uri(&self, range_name: &str) -> Option<&str> {
        self.registry.get(range_name).and_then(|t| t.uri.as_deref())
    }

    fn lookup(&self, name: &str, owner: &str) -> Result<TypeRange> {
        if let Some(registered) = self.registry.get(name) {
            return Ok(TypeRange::Scalar(registered.kind));
        }
        if self.doc.classes.contains_key(name) {
            return Ok(TypeRange::Class(name.to_string()));
        }
        let candidates = self.registry.names().chain(self.doc.classes.keys().map(|s| s.as_str()));
        Err(SchemaError::UnknownRange {
            range: name.to_string(),
            owner: owner.to_string(),
            suggestion: suggest(name, candidates),
        })
    }
}

/// Resolve one attribute against a document
pub fn resolve_range(attr: &AttributeDef, doc: &SchemaDocument) -> Result<TypeRange> {
    RangeResolver::new(doc)?.resolve_range(attr)
}

fn qualify(err: SchemaError, class_name: &str) -> SchemaError {
    match err {
        SchemaError::UnknownRange { range, owner, suggestion } => SchemaError::UnknownRange {
            range,
            owner: format!("{}.{}", class_name, owner),
            suggestion,
        },
        SchemaError::UnresolvedRange { owner } => SchemaError::UnresolvedRange {
            owner: format!("{}.{}", class_name, owner),
        },
        other => other,
    }
}

fn suggest<'n>(name: &str, candidates: impl Iterator<Item = &'n str>) -> Option<String> {
    let matcher = SkimMatcherV2::default();
    candidates
        .filter_map(|c| matcher.fuzzy_match(c, name).map(|score| (score, c)))
        .max_by_key(|(score, _)| *score)
        .map(|(_, c)| c.to_string())
}

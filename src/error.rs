//! Error types for the schema compiler

use std::fmt;

use thiserror::Error;

use crate::range::ScalarKind;

/// Result type for schema operations
pub type Result<T> = std::result::Result<T, SchemaError>;

/// Errors raised while parsing, merging or resolving a schema.
///
/// All of these are fatal for the pass that hits them: no partial
/// document or artifact is ever returned alongside one.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SchemaError {
    #[error("Schema syntax error: {0}")]
    Syntax(String),

    #[error("Cannot resolve import '{import}': {reason}")]
    ImportResolution { import: String, reason: String },

    #[error("Conflicting definitions for {kind} '{name}': {detail}")]
    Conflict {
        kind: &'static str,
        name: String,
        detail: String,
    },

    #[error("Unknown range '{range}' on {owner}{}", suggestion_suffix(.suggestion))]
    UnknownRange {
        range: String,
        owner: String,
        suggestion: Option<String>,
    },

    #[error("Attribute {owner} has no range and the schema declares no default_range")]
    UnresolvedRange { owner: String },

    #[error("Unknown prefix '{prefix}' in '{curie}'")]
    PrefixResolution { prefix: String, curie: String },
}

fn suggestion_suffix(suggestion: &Option<String>) -> String {
    match suggestion {
        Some(s) => format!(" (did you mean '{}'?)", s),
        None => String::new(),
    }
}

impl SchemaError {
    pub(crate) fn syntax(msg: impl Into<String>) -> Self {
        SchemaError::Syntax(msg.into())
    }

    pub(crate) fn conflict(kind: &'static str, name: impl Into<String>, detail: impl Into<String>) -> Self {
        SchemaError::Conflict {
            kind,
            name: name.into(),
            detail: detail.into(),
        }
    }
}

/// What a value was expected to be when coercion failed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expected {
    Kind(ScalarKind),
    Class(String),
    List,
    Present,
    Known,
}

impl fmt::Display for Expected {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expected::Kind(kind) => write!(f, "{}", kind),
            Expected::Class(name) => write!(f, "instance of {}", name),
            Expected::List => write!(f, "list"),
            Expected::Present => write!(f, "a value"),
            Expected::Known => write!(f, "a declared attribute"),
        }
    }
}

/// A single attribute value that could not be coerced to its range
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{path}: expected {expected}, got {raw} ({reason})")]
pub struct TypeCoercionError {
    /// Dotted attribute path, list positions as `name[i]`
    pub path: String,
    pub expected: Expected,
    /// Rendering of the offending raw value
    pub raw: String,
    pub reason: String,
}

impl TypeCoercionError {
    pub(crate) fn new(
        path: impl Into<String>,
        expected: Expected,
        raw: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            path: path.into(),
            expected,
            raw: raw.into(),
            reason: reason.into(),
        }
    }
}

/// Every coercion failure found while constructing one instance
#[derive(Error, Debug, Clone, PartialEq)]
#[error("cannot construct {class}: {} invalid value(s): {}", .errors.len(), join_errors(.errors))]
pub struct AggregateCoercionError {
    pub class: String,
    pub errors: Vec<TypeCoercionError>,
}

fn join_errors(errors: &[TypeCoercionError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

impl AggregateCoercionError {
    /// Paths of all failing attributes, in field-table order
    pub fn paths(&self) -> Vec<&str> {
        self.errors.iter().map(|e| e.path.as_str()).collect()
    }
}

/// Errors while encoding an instance
#[derive(Error, Debug)]
pub enum SerializationError {
    #[error("cannot encode {path}: {reason}")]
    Value { path: String, reason: String },

    #[error("JSON encoding failed: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors while decoding text into an instance
#[derive(Error, Debug)]
pub enum DeserializationError {
    #[error("malformed {format} input: {reason}")]
    Malformed { format: &'static str, reason: String },

    #[error("unknown class '{0}'")]
    UnknownClass(String),

    #[error(transparent)]
    Coercion(#[from] AggregateCoercionError),
}

//! Checksum utilities for schema fingerprints

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};
use std::fmt;

use crate::schema::SchemaDocument;

/// SHA256 checksum of schema content
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Checksum(String);

impl Checksum {
    /// Compute checksum from raw bytes
    pub fn from_bytes(data: &[u8]) -> Self {
        let hash = Sha256::digest(data);
        Self(format!("{:x}", hash))
    }

    /// Compute checksum from a string
    pub fn from_text(content: &str) -> Self {
        Self::from_bytes(content.as_bytes())
    }

    /// Compute checksum from a JSON value with object keys sorted
    pub fn from_json(value: &Value) -> Self {
        let canonical = canonicalize(value);
        Self::from_text(&canonical.to_string())
    }

    /// Fingerprint of a (possibly merged) schema document.
    ///
    /// Mapping order does not contribute, so two merges that differ only in
    /// the order definitions arrived produce the same fingerprint.
    pub fn of_document(doc: &SchemaDocument) -> Self {
        match serde_json::to_value(doc) {
            Ok(value) => Self::from_json(&value),
            // SchemaDocument only holds strings, bools and maps
            Err(_) => Self::from_text(&format!("{:?}", doc)),
        }
    }

    /// Get the hex string representation
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// First 12 hex digits, for headers and logs
    pub fn short(&self) -> &str {
        &self.0[..self.0.len().min(12)]
    }
}

fn canonicalize(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<_> = map.iter().collect();
            entries.sort_by(|a, b| a.0.cmp(b.0));
            let mut sorted = Map::new();
            for (k, v) in entries {
                sorted.insert(k.clone(), canonicalize(v));
            }
            Value::Object(sorted)
        }
        Value::Array(items) => Value::Array(items.iter().map(canonicalize).collect()),
        other => other.clone(),
    }
}

impl fmt::Display for Checksum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sha256:{}", self.0)
    }
}

//! Serialization Layer
//!
//! Dump and load [`Instance`]s in two encodings:
//!
//! - JSON ([`dump_json`] / [`load_json`]): numbers are carried as literal
//!   text through `serde_json`'s `arbitrary_precision` mode.
//! - Block ([`dump_block`] / [`load_block`]): indentation-structured,
//!   YAML-compatible text. Loading is driven by the class field table and
//!   reads every scalar as text, so a decimal literal never passes through
//!   `f64`.
//!
//! Both directions go through the same coercions as direct construction:
//! `load(dump(x)) == x` for every kind, and decimals keep their scale.
//! JSON input is read with [`Coercion::Typed`](crate::model::Coercion::Typed):
//! numbers and booleans must arrive as JSON numbers and booleans, the same
//! literals the validation document accepts.

mod block;
mod json;

pub use block::{dump_block, load_block};
pub use json::{dump_json, dump_json_pretty, load_json, to_json_value};

use crate::error::{DeserializationError, SerializationError};
use crate::model::{Instance, ObjectModel};

/// Interchange encodings
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Format {
    Json,
    #[serde(alias = "yaml")]
    Block,
}

impl Format {
    /// Guess from a file extension
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext {
            "json" => Some(Format::Json),
            "yaml" | "yml" => Some(Format::Block),
            _ => None,
        }
    }
}

impl std::str::FromStr for Format {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "json" => Ok(Format::Json),
            "yaml" | "yml" | "block" => Ok(Format::Block),
            other => Err(format!("unknown format '{}' (expected json or yaml)", other)),
        }
    }
}

/// Dump in the requested format
pub fn dump(instance: &Instance, format: Format) -> Result<String, SerializationError> {
    match format {
        Format::Json => dump_json_pretty(instance),
        Format::Block => dump_block(instance),
    }
}

/// Load in the requested format
pub fn load(
    text: &str,
    format: Format,
    model: &ObjectModel,
    class: &str,
) -> Result<Instance, DeserializationError> {
    match format {
        Format::Json => load_json(text, model, class),
        Format::Block => load_block(text, model, class),
    }
}

/// Parse a data document as written, without the object model.
///
/// Block text is read with YAML's own scalar typing, so a quoted `"32"`
/// stays a string here even though the block loader would coerce it.
pub fn parse_value(text: &str, format: Format) -> Result<serde_json::Value, DeserializationError> {
    match format {
        Format::Json => serde_json::from_str(text).map_err(|e| DeserializationError::Malformed {
            format: "JSON",
            reason: e.to_string(),
        }),
        Format::Block => serde_yaml::from_str(text).map_err(|e| DeserializationError::Malformed {
            format: "block",
            reason: e.to_string(),
        }),
    }
}

//! Validation engine boundary

use std::fmt;

use jsonschema::Draft;
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

use super::ValidationDocument;
use crate::error::{DeserializationError, SerializationError};

/// Failure to run validation at all, as opposed to data that fails it
#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("class '{0}' has no definition in the validation document")]
    UnknownClass(String),

    #[error("cannot compile validator for '{class}': {reason}")]
    Build { class: String, reason: String },

    #[error(transparent)]
    Encode(#[from] SerializationError),

    #[error(transparent)]
    Input(#[from] DeserializationError),
}

/// One rule broken by the data
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    /// JSON Pointer into the data; empty for the root
    pub instance_path: String,
    pub message: String,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.instance_path.is_empty() {
            write!(f, "(root): {}", self.message)
        } else {
            write!(f, "{}: {}", self.instance_path, self.message)
        }
    }
}

/// Outcome of validating one document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationReport {
    pub valid: bool,
    pub violations: Vec<Violation>,
}

impl ValidationReport {
    fn from_violations(violations: Vec<Violation>) -> Self {
        Self {
            valid: violations.is_empty(),
            violations,
        }
    }
}

/// Checks serialized data against a generated validation document
pub trait ValidationEngine {
    fn validate(
        &self,
        data: &Value,
        doc: &ValidationDocument,
        class: &str,
    ) -> Result<ValidationReport, ValidationError>;
}

/// [`ValidationEngine`] backed by the `jsonschema` crate
#[derive(Debug, Clone)]
pub struct JsonSchemaEngine {
    validate_formats: bool,
}

impl Default for JsonSchemaEngine {
    fn default() -> Self {
        Self { validate_formats: true }
    }
}

impl JsonSchemaEngine {
    pub fn new(validate_formats: bool) -> Self {
        Self { validate_formats }
    }
}

impl ValidationEngine for JsonSchemaEngine {
    fn validate(
        &self,
        data: &Value,
        doc: &ValidationDocument,
        class: &str,
    ) -> Result<ValidationReport, ValidationError> {
        let schema = doc
            .for_class(class)
            .ok_or_else(|| ValidationError::UnknownClass(class.to_string()))?;

        let mut options = jsonschema::options();
        options
            .with_draft(Draft::Draft202012)
            .should_validate_formats(self.validate_formats);
        let validator = options.build(&schema).map_err(|e| ValidationError::Build {
            class: class.to_string(),
            reason: e.to_string(),
        })?;

        let violations: Vec<Violation> = validator
            .iter_errors(data)
            .map(|e| Violation {
                instance_path: e.instance_path.to_string(),
                message: e.to_string(),
            })
            .collect();

        debug!(class, violations = violations.len(), "validated document");
        Ok(ValidationReport::from_violations(violations))
    }
}

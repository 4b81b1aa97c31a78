//! Compiler facade
//!
//! Runs the whole pipeline for one schema: parse, resolve imports, then
//! generate the object model, the semantic graph and the validation
//! document from the same merged document.

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, info};

use crate::checksum::Checksum;
use crate::codegen::{render_rust, GeneratedOutput};
use crate::config::CompilerConfig;
use crate::error::{DeserializationError, SchemaError, SerializationError};
use crate::graph::GraphSchema;
use crate::imports::resolve_imports;
use crate::model::{Instance, ObjectModel};
use crate::schema::{parse, SchemaDocument};
use crate::serialize::{self, Format};
use crate::validation::{JsonSchemaEngine, ValidationDocument, ValidationEngine, ValidationError, ValidationReport};

/// Errors from [`Compiler`] entry points that touch the filesystem
#[derive(Error, Debug)]
pub enum CompileError {
    #[error("cannot read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Schema(#[from] SchemaError),
}

/// Entry point for compiling schemas with one configuration
#[derive(Debug, Clone, Default)]
pub struct Compiler {
    config: CompilerConfig,
}

impl Compiler {
    pub fn new(config: CompilerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &CompilerConfig {
        &self.config
    }

    /// Parse and resolve a schema file; imports are searched relative to it
    pub fn load_file(&self, path: &Path) -> Result<SchemaDocument, CompileError> {
        let source = std::fs::read_to_string(path).map_err(|source| CompileError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let base = path.parent().unwrap_or_else(|| Path::new("."));
        Ok(self.load_source(&source, base)?)
    }

    /// Parse and resolve schema source; relative search paths start at `base`
    pub fn load_source(&self, source: &str, base: &Path) -> Result<SchemaDocument, SchemaError> {
        let doc = parse(source)?;
        let loader = self.config.import_loader(base);
        let resolved = resolve_imports(&doc, &loader)?;
        info!(
            schema = %resolved.name,
            imports = resolved.resolved_imports.len(),
            classes = resolved.classes.len(),
            "resolved schema"
        );
        Ok(resolved)
    }

    pub fn compile_file(&self, path: &Path) -> Result<Compilation, CompileError> {
        let doc = self.load_file(path)?;
        Ok(self.compile(doc)?)
    }

    /// Generate every artifact from an already resolved document
    pub fn compile(&self, document: SchemaDocument) -> Result<Compilation, SchemaError> {
        let model = ObjectModel::generate(&document)?;
        let graph = GraphSchema::generate(&document)?;
        let validation = ValidationDocument::generate(&document)?;
        let fingerprint = Checksum::of_document(&document);

        info!(
            schema = %document.name,
            fingerprint = fingerprint.short(),
            classes = document.classes.len(),
            "compiled schema"
        );

        Ok(Compilation {
            document,
            fingerprint,
            model,
            graph,
            validation,
            config: self.config.clone(),
        })
    }
}

/// Every artifact generated from one merged schema document
#[derive(Debug, Clone)]
pub struct Compilation {
    pub document: SchemaDocument,
    pub fingerprint: Checksum,
    pub model: ObjectModel,
    pub graph: GraphSchema,
    pub validation: ValidationDocument,
    config: CompilerConfig,
}

impl Compilation {
    /// Rust source for the object model
    pub fn rust_source(&self) -> GeneratedOutput {
        let mut output = render_rust(&self.model, &self.graph, &self.config.codegen);
        output.code = format!("//! Schema fingerprint: {}\n{}", self.fingerprint, output.code);
        output
    }

    pub fn turtle(&self) -> String {
        self.graph.to_turtle()
    }

    pub fn json_schema(&self) -> Result<String, serde_json::Error> {
        self.validation.to_json_string(self.config.pretty_json())
    }

    pub fn load(&self, text: &str, format: Format, class: &str) -> Result<Instance, DeserializationError> {
        serialize::load(text, format, &self.model, class)
    }

    pub fn dump(&self, instance: &Instance, format: Format) -> Result<String, SerializationError> {
        match format {
            Format::Json if !self.config.pretty_json() => serialize::dump_json(instance),
            _ => serialize::dump(instance, format),
        }
    }

    /// Validate an instance through its JSON encoding
    pub fn validate(&self, instance: &Instance) -> Result<ValidationReport, ValidationError> {
        let data = serialize::to_json_value(instance)?;
        self.validate_json(&data, instance.class_name())
    }

    pub fn validate_json(&self, data: &serde_json::Value, class: &str) -> Result<ValidationReport, ValidationError> {
        JsonSchemaEngine::new(self.config.validation.validate_formats).validate(data, &self.validation, class)
    }

    /// Validate a data document exactly as written, then try loading it
    pub fn validate_document(
        &self,
        text: &str,
        format: Format,
        class: &str,
    ) -> Result<DocumentCheck, ValidationError> {
        let data = serialize::parse_value(text, format)?;
        let report = self.validate_json(&data, class)?;
        let load_error = self.load(text, format, class).err();
        debug!(class, valid = report.valid, loads = load_error.is_none(), "checked document");
        Ok(DocumentCheck { report, load_error })
    }
}

/// Outcome of [`Compilation::validate_document`]
#[derive(Debug)]
pub struct DocumentCheck {
    /// Violations found in the document as written
    pub report: ValidationReport,
    /// Why the object model refused the document, if it did
    pub load_error: Option<DeserializationError>,
}

impl DocumentCheck {
    pub fn passed(&self) -> bool {
        self.report.valid && self.load_error.is_none()
    }
}

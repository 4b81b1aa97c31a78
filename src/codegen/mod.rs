//! Code Generation
//!
//! Renders the object model as Rust source. Emitters never look at the
//! schema document: they read the generated [`ObjectModel`] field tables
//! plus the cycle analysis from the semantic graph.

pub mod config;
pub mod rust;

pub use config::{RenderProfile, TypeMappings};

use std::collections::HashSet;

use tracing::debug;

use crate::graph::{recursive_properties, GraphSchema, RecursiveProperty};
use crate::model::ObjectModel;

/// Output from code generation
#[derive(Debug, Clone)]
pub struct GeneratedOutput {
    /// Generated code as a string
    pub code: String,
    /// Number of types generated
    pub type_count: usize,
}

/// Render Rust source for every class of `model`
pub fn render_rust(model: &ObjectModel, graph: &GraphSchema, profile: &RenderProfile) -> GeneratedOutput {
    let boxed: HashSet<RecursiveProperty> = recursive_properties(graph);

    let mut output = String::new();
    output.push_str(&format!("//! Generated from schema `{}` - DO NOT EDIT\n", model.schema_name()));
    output.push_str("//!\n");
    output.push_str("//! Regenerate with `schemac --schema <file> rust`.\n\n");

    let mut type_count = 0;
    for class in model.classes() {
        output.push('\n');
        output.push_str(&rust::emit_struct(class, &boxed, profile));
        type_count += 1;
    }

    debug!(types = type_count, boxed = boxed.len(), "rendered rust source");
    GeneratedOutput {
        code: output,
        type_count,
    }
}

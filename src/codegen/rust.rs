//! Rust Code Emitter
//!
//! Key constraints:
//! - This module only receives a `ClassModel` and a `RenderProfile`
//! - Type mappings come from the profile (configurable)

use std::collections::HashSet;

use crate::graph::RecursiveProperty;
use crate::model::{ClassModel, FieldKind, FieldSpec};

use super::RenderProfile;

// =============================================================================
// Struct Emission
// =============================================================================

/// Emit one struct for a class
pub fn emit_struct(class: &ClassModel, boxed: &HashSet<RecursiveProperty>, profile: &RenderProfile) -> String {
    let mut output = String::new();

    emit_doc(&mut output, "", class.description.as_deref().unwrap_or(&class.name));
    if !profile.derives.is_empty() {
        output.push_str(&format!("#[derive({})]\n", profile.derives.join(", ")));
    }
    output.push_str(&format!("pub struct {} {{\n", to_pascal_case(&class.name)));

    for field in &class.fields {
        let needs_box = boxed.contains(&RecursiveProperty {
            class: class.name.clone(),
            property: field.name.clone(),
        });
        emit_field(&mut output, field, needs_box, profile);
    }

    output.push_str("}\n");
    output
}

fn emit_field(output: &mut String, field: &FieldSpec, needs_box: bool, profile: &RenderProfile) {
    if let Some(description) = &field.description {
        emit_doc(output, "    ", description);
    }

    let mut rust_type = match &field.kind {
        FieldKind::Scalar { kind, .. } => profile.scalar_type(*kind).to_string(),
        FieldKind::Object(target) => to_pascal_case(target),
    };
    if needs_box {
        rust_type = profile.wrap_boxed(&rust_type);
    }

    // An empty list stands in for an absent multivalued value
    let full_type = if field.multivalued {
        profile.wrap_array(&rust_type)
    } else if field.required {
        rust_type
    } else {
        profile.wrap_optional(&rust_type)
    };

    let field_name = profile.escape_keyword(&to_snake_case(&field.name));
    output.push_str(&format!("    pub {}: {},\n", field_name, full_type));
}

fn emit_doc(output: &mut String, indent: &str, text: &str) {
    for line in text.lines() {
        if line.is_empty() {
            output.push_str(&format!("{}///\n", indent));
        } else {
            output.push_str(&format!("{}/// {}\n", indent, line));
        }
    }
}

// =============================================================================
// Helper Utilities
// =============================================================================

/// Convert to PascalCase
pub fn to_pascal_case(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    let mut capitalize_next = true;

    for c in s.chars() {
        if !c.is_ascii_alphanumeric() {
            capitalize_next = true;
        } else if capitalize_next {
            result.push(c.to_ascii_uppercase());
            capitalize_next = false;
        } else {
            result.push(c);
        }
    }

    if result.starts_with(|c: char| c.is_ascii_digit()) {
        result.insert(0, '_');
    }
    result
}

/// Convert to snake_case
pub fn to_snake_case(s: &str) -> String {
    let mut result = String::with_capacity(s.len() + 4);
    let mut prev_lower = false;

    for c in s.chars() {
        if c.is_ascii_uppercase() {
            if prev_lower {
                result.push('_');
            }
            result.push(c.to_ascii_lowercase());
            prev_lower = false;
        } else if !c.is_ascii_alphanumeric() {
            result.push('_');
            prev_lower = false;
        } else {
            result.push(c);
            prev_lower = c.is_ascii_lowercase() || c.is_ascii_digit();
        }
    }

    if result.starts_with(|c: char| c.is_ascii_digit()) {
        result.insert(0, '_');
    }
    result
}

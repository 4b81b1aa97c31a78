//! Codegen Configuration
//!
//! A [`RenderProfile`] decides how scalar kinds, optional values and lists
//! are spelled in generated source. Range resolution itself is config-free;
//! only emission reads the profile.

use serde::{Deserialize, Serialize};

use crate::range::ScalarKind;

/// Language type for each scalar kind
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TypeMappings {
    pub string: String,
    pub integer: String,
    pub decimal: String,
    pub boolean: String,
    pub date: String,
    pub uri: String,
}

impl Default for TypeMappings {
    fn default() -> Self {
        Self {
            string: "String".to_string(),
            integer: "num_bigint::BigInt".to_string(),
            decimal: "bigdecimal::BigDecimal".to_string(),
            boolean: "bool".to_string(),
            date: "chrono::NaiveDate".to_string(),
            uri: "String".to_string(),
        }
    }
}

/// Rendering profile for generated Rust source
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderProfile {
    pub types: TypeMappings,

    /// Derives placed on every generated struct
    pub derives: Vec<String>,

    /// Prefix for field names that are keywords
    pub keyword_escape: String,
}

impl Default for RenderProfile {
    fn default() -> Self {
        Self::rust()
    }
}

impl RenderProfile {
    pub fn rust() -> Self {
        Self {
            types: TypeMappings::default(),
            derives: vec!["Debug".to_string(), "Clone".to_string(), "PartialEq".to_string()],
            keyword_escape: "r#".to_string(),
        }
    }

    /// Escape a keyword if needed.
    ///
    /// `self`, `Self`, `crate` and `super` cannot be raw identifiers and get
    /// a trailing underscore instead.
    pub fn escape_keyword(&self, name: &str) -> String {
        if PATH_KEYWORDS.contains(&name) {
            format!("{}_", name)
        } else if RUST_KEYWORDS.contains(&name) {
            format!("{}{}", self.keyword_escape, name)
        } else {
            name.to_string()
        }
    }

    /// Type string for a scalar kind
    pub fn scalar_type(&self, kind: ScalarKind) -> &str {
        match kind {
            ScalarKind::String => &self.types.string,
            ScalarKind::Integer => &self.types.integer,
            ScalarKind::Decimal => &self.types.decimal,
            ScalarKind::Boolean => &self.types.boolean,
            ScalarKind::Date => &self.types.date,
            ScalarKind::Uri => &self.types.uri,
        }
    }

    pub fn wrap_optional(&self, type_str: &str) -> String {
        format!("Option<{}>", type_str)
    }

    pub fn wrap_array(&self, type_str: &str) -> String {
        format!("Vec<{}>", type_str)
    }

    pub fn wrap_boxed(&self, type_str: &str) -> String {
        format!("Box<{}>", type_str)
    }
}

const PATH_KEYWORDS: &[&str] = &["self", "Self", "crate", "super"];

const RUST_KEYWORDS: &[&str] = &[
    "as", "break", "const", "continue", "else", "enum", "extern",
    "false", "fn", "for", "if", "impl", "in", "let", "loop", "match", "mod",
    "move", "mut", "pub", "ref", "return", "static", "struct",
    "trait", "true", "type", "unsafe", "use", "where", "while",
    "async", "await", "dyn", "abstract", "become", "box", "do", "final",
    "macro", "override", "priv", "typeof", "unsized", "virtual", "yield", "try",
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rust_profile_defaults() {
        let profile = RenderProfile::rust();
        assert_eq!(profile.scalar_type(ScalarKind::String), "String");
        assert_eq!(profile.scalar_type(ScalarKind::Decimal), "bigdecimal::BigDecimal");
        assert_eq!(profile.keyword_escape, "r#");
    }

    #[test]
    fn test_keyword_escape() {
        let rust = RenderProfile::rust();
        assert_eq!(rust.escape_keyword("type"), "r#type");
        assert_eq!(rust.escape_keyword("self"), "self_");
        assert_eq!(rust.escape_keyword("name"), "name");
    }

    #[test]
    fn test_wrappers() {
        let rust = RenderProfile::rust();
        assert_eq!(rust.wrap_optional("String"), "Option<String>");
        assert_eq!(rust.wrap_array("bool"), "Vec<bool>");
        assert_eq!(rust.wrap_boxed("Node"), "Box<Node>");
    }

    #[test]
    fn test_partial_profile_from_toml() {
        let profile: RenderProfile = toml::from_str("[types]\ninteger = \"i64\"\n").unwrap();
        assert_eq!(profile.types.integer, "i64");
        assert_eq!(profile.types.decimal, "bigdecimal::BigDecimal");
        assert_eq!(profile.derives.len(), 3);
    }
}

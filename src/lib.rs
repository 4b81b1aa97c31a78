//! schemac
//!
//! Compiles one declarative schema (classes, attributes, ranges, imports)
//! into three artifacts that agree on the type of every attribute:
//!
//! - **Object model**: runtime-constructible typed instances, plus Rust
//!   source rendering of the same field tables
//! - **Semantic graph**: node shapes and property definitions with XML
//!   Schema datatypes, renderable as Turtle
//! - **Validation document**: JSON Schema (draft 2020-12)
//!
//! Instances round-trip through JSON and a YAML-compatible block format.
//! Decimals are arbitrary-precision end to end and never touch `f64`.
//!
//! ## Architecture
//!
//! ```text
//! parse ─▶ resolve_imports ─▶ RangeResolver ─┬─▶ ObjectModel ─▶ serialize (json/block)
//!                                            ├─▶ GraphSchema ─▶ turtle
//!                                            └─▶ ValidationDocument ─▶ ValidationEngine
//! ```

pub mod checksum;
pub mod codegen;
pub mod compiler;
pub mod config;
pub mod error;
pub mod graph;
pub mod imports;
pub mod model;
pub mod range;
pub mod schema;
pub mod serialize;
pub mod validation;

pub use checksum::Checksum;
pub use compiler::{Compilation, CompileError, Compiler, DocumentCheck};
pub use config::CompilerConfig;
pub use error::{
    AggregateCoercionError, DeserializationError, Expected, Result, SchemaError, SerializationError,
    TypeCoercionError,
};
pub use graph::{GraphDatatype, GraphSchema, NodeShape, PropertyDef};
pub use imports::{resolve_imports, BuiltinLibrary, ChainLoader, FsImportLoader, ImportLoader, InMemoryLoader};
pub use model::{ClassModel, Instance, ObjectModel, RawValue, Value};
pub use range::{resolve_range, RangeResolver, ScalarKind, TypeRange, TypeRegistry};
pub use schema::{parse, AttributeDef, ClassDef, SchemaDocument, TypeDef};
pub use serialize::{dump_block, dump_json, dump_json_pretty, load_block, load_json, parse_value, Format};
pub use validation::{
    JsonSchemaEngine, TypeConstraint, ValidationDocument, ValidationEngine, ValidationError, ValidationReport,
};

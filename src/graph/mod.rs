//! Semantic-Graph Generator
//!
//! One [`NodeShape`] per class and one [`PropertyDef`] per induced
//! attribute, with IRIs taken from `class_uri`/`slot_uri` or minted in the
//! schema's default namespace. The shapes are also laid out as a petgraph
//! directed graph: class and datatype nodes joined by property edges.

pub mod analysis;
mod turtle;

pub use analysis::{recursive_properties, RecursiveProperty};

use std::borrow::Cow;
use std::collections::HashMap;
use std::fmt;

use indexmap::IndexMap;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use tracing::debug;

use crate::error::Result;
use crate::range::{RangeResolver, ScalarKind, TypeRange};
use crate::schema::SchemaDocument;

pub const XSD: &str = "http://www.w3.org/2001/XMLSchema#";

/// Percent-encode controls, space and the delimiters an IRI reference may
/// not contain; everything else passes through.
pub fn escape_iri(iri: &str) -> Cow<'_, str> {
    let illegal = |c: char| c <= ' ' || c == '\u{7f}' || "<>\"{}|^`\\".contains(c);
    if !iri.chars().any(illegal) {
        return Cow::Borrowed(iri);
    }
    let mut out = String::with_capacity(iri.len() + 8);
    for c in iri.chars() {
        if illegal(c) {
            let mut buf = [0u8; 4];
            for byte in c.encode_utf8(&mut buf).bytes() {
                out.push_str(&format!("%{:02X}", byte));
            }
        } else {
            out.push(c);
        }
    }
    Cow::Owned(out)
}

/// Datatype of a property's values
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum GraphDatatype {
    /// `xsd:string`
    PlainLiteral,
    IntegerLiteral,
    DecimalLiteral,
    BooleanLiteral,
    DateLiteral,
    /// A resource; `class` names the shape it must conform to, if any
    ResourceRef { class: Option<String> },
}

impl GraphDatatype {
    fn from_range(range: &TypeRange) -> Self {
        match range {
            TypeRange::Scalar(ScalarKind::String) => GraphDatatype::PlainLiteral,
            TypeRange::Scalar(ScalarKind::Integer) => GraphDatatype::IntegerLiteral,
            TypeRange::Scalar(ScalarKind::Decimal) => GraphDatatype::DecimalLiteral,
            TypeRange::Scalar(ScalarKind::Boolean) => GraphDatatype::BooleanLiteral,
            TypeRange::Scalar(ScalarKind::Date) => GraphDatatype::DateLiteral,
            TypeRange::Scalar(ScalarKind::Uri) => GraphDatatype::ResourceRef { class: None },
            TypeRange::Class(name) => GraphDatatype::ResourceRef {
                class: Some(name.clone()),
            },
        }
    }

    /// Local name in the XML Schema namespace, for literal datatypes
    pub fn xsd_name(&self) -> Option<&'static str> {
        match self {
            GraphDatatype::PlainLiteral => Some("string"),
            GraphDatatype::IntegerLiteral => Some("integer"),
            GraphDatatype::DecimalLiteral => Some("decimal"),
            GraphDatatype::BooleanLiteral => Some("boolean"),
            GraphDatatype::DateLiteral => Some("date"),
            GraphDatatype::ResourceRef { .. } => None,
        }
    }

    /// Full datatype IRI, for literal datatypes
    pub fn iri(&self) -> Option<String> {
        self.xsd_name().map(|name| format!("{}{}", XSD, name))
    }

    /// Scalar kind this datatype carries; `None` for class references
    pub fn kind(&self) -> Option<ScalarKind> {
        match self {
            GraphDatatype::PlainLiteral => Some(ScalarKind::String),
            GraphDatatype::IntegerLiteral => Some(ScalarKind::Integer),
            GraphDatatype::DecimalLiteral => Some(ScalarKind::Decimal),
            GraphDatatype::BooleanLiteral => Some(ScalarKind::Boolean),
            GraphDatatype::DateLiteral => Some(ScalarKind::Date),
            GraphDatatype::ResourceRef { class: None } => Some(ScalarKind::Uri),
            GraphDatatype::ResourceRef { class: Some(_) } => None,
        }
    }
}

impl fmt::Display for GraphDatatype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GraphDatatype::ResourceRef { class: Some(class) } => write!(f, "resource({})", class),
            GraphDatatype::ResourceRef { class: None } => f.write_str("resource"),
            literal => write!(f, "xsd:{}", literal.xsd_name().unwrap_or_default()),
        }
    }
}

/// One property of a node shape
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyDef {
    pub name: String,
    pub iri: String,
    pub datatype: GraphDatatype,
    pub min_count: u32,
    /// `None` for multivalued properties
    pub max_count: Option<u32>,
    pub description: Option<String>,
}

/// Shape of one class
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeShape {
    pub name: String,
    pub iri: String,
    pub description: Option<String>,
    pub properties: Vec<PropertyDef>,
}

impl NodeShape {
    pub fn property(&self, name: &str) -> Option<&PropertyDef> {
        self.properties.iter().find(|p| p.name == name)
    }
}

/// Node weight of the schema graph
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum GraphNode {
    Class(String),
    Datatype(GraphDatatype),
}

/// The semantic graph for one schema
#[derive(Debug, Clone)]
pub struct GraphSchema {
    id: String,
    namespace: String,
    prefixes: IndexMap<String, String>,
    shapes: IndexMap<String, NodeShape>,

    /// Class and datatype nodes; edges carry the property name
    pub(crate) graph: DiGraph<GraphNode, String>,
    pub(crate) node_indices: HashMap<GraphNode, NodeIndex>,
}

impl GraphSchema {
    pub fn generate(doc: &SchemaDocument) -> Result<Self> {
        let resolver = RangeResolver::new(doc)?;
        let namespace = doc.namespace()?;

        let mut schema = Self {
            id: doc.id.clone(),
            namespace: namespace.clone(),
            prefixes: doc.prefixes.clone(),
            shapes: IndexMap::with_capacity(doc.classes.len()),
            graph: DiGraph::new(),
            node_indices: HashMap::new(),
        };

        // Class nodes first so edges can point forward
        for name in doc.classes.keys() {
            schema.node(GraphNode::Class(name.clone()));
        }

        for (name, class) in &doc.classes {
            let iri = match &class.class_uri {
                Some(uri) => escape_iri(&doc.expand_curie(uri)?).into_owned(),
                None => escape_iri(&format!("{}{}", namespace, name)).into_owned(),
            };

            let mut properties = Vec::new();
            for resolved in resolver.resolve_class(name)? {
                let attr = resolved.attr;
                let property_iri = match &attr.slot_uri {
                    Some(uri) => escape_iri(&doc.expand_curie(uri)?).into_owned(),
                    None => escape_iri(&format!("{}{}", namespace, attr.name)).into_owned(),
                };
                let datatype = GraphDatatype::from_range(&resolved.range);

                let target = match &datatype {
                    GraphDatatype::ResourceRef { class: Some(target) } => GraphNode::Class(target.clone()),
                    other => GraphNode::Datatype(other.clone()),
                };
                let from = schema.node(GraphNode::Class(name.clone()));
                let to = schema.node(target);
                schema.graph.add_edge(from, to, attr.name.clone());

                properties.push(PropertyDef {
                    min_count: if attr.is_required() { 1 } else { 0 },
                    max_count: if attr.multivalued { None } else { Some(1) },
                    name: attr.name,
                    iri: property_iri,
                    datatype,
                    description: attr.description,
                });
            }

            debug!(class = %name, %iri, properties = properties.len(), "generated node shape");
            schema.shapes.insert(
                name.clone(),
                NodeShape {
                    name: name.clone(),
                    iri,
                    description: class.description.clone(),
                    properties,
                },
            );
        }

        Ok(schema)
    }

    fn node(&mut self, node: GraphNode) -> NodeIndex {
        if let Some(&idx) = self.node_indices.get(&node) {
            return idx;
        }
        let idx = self.graph.add_node(node.clone());
        self.node_indices.insert(node, idx);
        idx
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Namespace used for minted IRIs
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn prefixes(&self) -> &IndexMap<String, String> {
        &self.prefixes
    }

    pub fn shape(&self, class: &str) -> Option<&NodeShape> {
        self.shapes.get(class)
    }

    pub fn shapes(&self) -> impl Iterator<Item = &NodeShape> {
        self.shapes.values()
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Classes referenced by the properties of `class`
    pub fn refs_out(&self, class: &str) -> Vec<&str> {
        let Some(&idx) = self.node_indices.get(&GraphNode::Class(class.to_string())) else {
            return Vec::new();
        };
        let mut out: Vec<&str> = self
            .graph
            .edges_directed(idx, Direction::Outgoing)
            .filter_map(|e| match self.graph.node_weight(e.target()) {
                Some(GraphNode::Class(name)) => Some(name.as_str()),
                _ => None,
            })
            .collect();
        out.sort_unstable();
        out.dedup();
        out
    }

    /// Classes whose properties reference `class`
    pub fn refs_in(&self, class: &str) -> Vec<&str> {
        let Some(&idx) = self.node_indices.get(&GraphNode::Class(class.to_string())) else {
            return Vec::new();
        };
        let mut out: Vec<&str> = self
            .graph
            .edges_directed(idx, Direction::Incoming)
            .filter_map(|e| match self.graph.node_weight(e.source()) {
                Some(GraphNode::Class(name)) => Some(name.as_str()),
                _ => None,
            })
            .collect();
        out.sort_unstable();
        out.dedup();
        out
    }

    /// SHACL-style Turtle rendering of every shape
    pub fn to_turtle(&self) -> String {
        turtle::render(self)
    }

    /// Export the class graph to GraphViz DOT format
    pub fn to_dot(&self) -> String {
        let mut output = String::new();
        output.push_str("digraph SchemaGraph {\n");
        output.push_str("  rankdir=LR;\n");
        output.push_str("  node [fontname=\"Helvetica\", fontsize=10];\n\n");

        for idx in self.graph.node_indices() {
            match &self.graph[idx] {
                GraphNode::Class(name) => {
                    output.push_str(&format!("  n{} [label=\"{}\", shape=box];\n", idx.index(), name));
                }
                GraphNode::Datatype(datatype) => {
                    output.push_str(&format!(
                        "  n{} [label=\"{}\", shape=ellipse];\n",
                        idx.index(),
                        datatype
                    ));
                }
            }
        }
        output.push('\n');

        for edge in self.graph.edge_references() {
            output.push_str(&format!(
                "  n{} -> n{} [label=\"{}\"];\n",
                edge.source().index(),
                edge.target().index(),
                edge.weight()
            ));
        }

        output.push_str("}\n");
        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SchemaError;
    use crate::schema::parse;

    const SCHEMA: &str = r#"
id: https://example.org/people
name: people
prefixes:
  ex: https://example.org/people/
  schema: http://schema.org/
default_prefix: ex
default_range: string
classes:
  Address:
    attributes:
      street:
  Person:
    class_uri: schema:Person
    attributes:
      id:
        identifier: true
      name:
        slot_uri: schema:name
      age:
        range: integer
      height:
        range: decimal
      alive:
        range: boolean
      born:
        range: date
      homepage:
        range: uri
      addresses:
        range: Address
        multivalued: true
"#;

    fn generate() -> GraphSchema {
        GraphSchema::generate(&parse(SCHEMA).unwrap()).unwrap()
    }

    #[test]
    fn test_iris() {
        let graph = generate();
        let person = graph.shape("Person").unwrap();
        assert_eq!(person.iri, "http://schema.org/Person");
        assert_eq!(person.property("name").unwrap().iri, "http://schema.org/name");
        assert_eq!(person.property("age").unwrap().iri, "https://example.org/people/age");
        assert_eq!(graph.shape("Address").unwrap().iri, "https://example.org/people/Address");
    }

    #[test]
    fn test_datatypes_follow_kinds() {
        let graph = generate();
        let person = graph.shape("Person").unwrap();
        let datatype = |name: &str| person.property(name).unwrap().datatype.clone();
        assert_eq!(datatype("id"), GraphDatatype::PlainLiteral);
        assert_eq!(datatype("age"), GraphDatatype::IntegerLiteral);
        assert_eq!(datatype("height"), GraphDatatype::DecimalLiteral);
        assert_eq!(datatype("alive"), GraphDatatype::BooleanLiteral);
        assert_eq!(datatype("born"), GraphDatatype::DateLiteral);
        assert_eq!(datatype("homepage"), GraphDatatype::ResourceRef { class: None });
        assert_eq!(
            datatype("addresses"),
            GraphDatatype::ResourceRef {
                class: Some("Address".into())
            }
        );
        assert_eq!(
            GraphDatatype::IntegerLiteral.iri().as_deref(),
            Some("http://www.w3.org/2001/XMLSchema#integer")
        );
    }

    #[test]
    fn test_cardinality() {
        let graph = generate();
        let person = graph.shape("Person").unwrap();
        let id = person.property("id").unwrap();
        assert_eq!((id.min_count, id.max_count), (1, Some(1)));
        let addresses = person.property("addresses").unwrap();
        assert_eq!((addresses.min_count, addresses.max_count), (0, None));
    }

    #[test]
    fn test_graph_edges() {
        let graph = generate();
        assert_eq!(graph.refs_out("Person"), vec!["Address"]);
        assert_eq!(graph.refs_in("Address"), vec!["Person"]);
        assert_eq!(graph.edge_count(), 9);
        assert!(graph.to_dot().contains("label=\"addresses\""));
    }

    #[test]
    fn test_namespace_defaults_to_id() {
        let doc = parse("id: https://example.org/s\nname: s\nclasses:\n  A:\n    attributes:\n      x:\n        range: string\n").unwrap();
        let graph = GraphSchema::generate(&doc).unwrap();
        assert_eq!(graph.shape("A").unwrap().iri, "https://example.org/s/A");
    }

    #[test]
    fn test_unknown_prefix() {
        let doc = parse("id: https://example.org/s\nname: s\nclasses:\n  A:\n    class_uri: nope:A\n").unwrap();
        assert!(matches!(
            GraphSchema::generate(&doc),
            Err(SchemaError::PrefixResolution { ref prefix, .. }) if prefix == "nope"
        ));

        let doc = parse("id: https://example.org/s\nname: s\ndefault_prefix: ex\nclasses:\n  A:\n").unwrap();
        assert!(matches!(
            GraphSchema::generate(&doc),
            Err(SchemaError::PrefixResolution { .. })
        ));
    }
}

//! Schema Graph Analysis
//!
//! Finds class references that close a cycle, so generated Rust types can
//! box them.

use std::collections::HashSet;

use petgraph::algo::kosaraju_scc;
use petgraph::visit::EdgeRef;

use super::{GraphNode, GraphSchema};

/// A single-valued property whose target class can reach back to its owner
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RecursiveProperty {
    pub class: String,
    pub property: String,
}

/// Properties that need indirection to give a recursive type a finite size.
///
/// An edge is recursive when both ends are in the same strongly connected
/// component (self-loops included). Multivalued properties already live
/// behind a `Vec` and are not reported.
pub fn recursive_properties(schema: &GraphSchema) -> HashSet<RecursiveProperty> {
    let graph = &schema.graph;
    let mut component = vec![usize::MAX; graph.node_count()];
    for (i, scc) in kosaraju_scc(graph).into_iter().enumerate() {
        for node in scc {
            component[node.index()] = i;
        }
    }

    graph
        .edge_references()
        .filter(|e| component[e.source().index()] == component[e.target().index()])
        .filter_map(|e| {
            let GraphNode::Class(class) = &graph[e.source()] else {
                return None;
            };
            let single = schema
                .shape(class)
                .and_then(|shape| shape.property(e.weight()))
                .is_some_and(|p| p.max_count == Some(1));
            single.then(|| RecursiveProperty {
                class: class.clone(),
                property: e.weight().clone(),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::parse;

    #[test]
    fn test_cycles_are_found() {
        let doc = parse(
            r#"
id: https://example.org/t
name: t
default_range: string
classes:
  Node:
    attributes:
      parent:
        range: Node
      children:
        range: Node
        multivalued: true
  Left:
    attributes:
      right:
        range: Right
  Right:
    attributes:
      left:
        range: Left
  Leaf:
    attributes:
      owner:
        range: Node
"#,
        )
        .unwrap();
        let schema = GraphSchema::generate(&doc).unwrap();
        let mut found: Vec<_> = recursive_properties(&schema).into_iter().collect();
        found.sort();
        let names: Vec<_> = found.iter().map(|r| format!("{}.{}", r.class, r.property)).collect();
        assert_eq!(names, vec!["Left.right", "Node.parent", "Right.left"]);
    }
}

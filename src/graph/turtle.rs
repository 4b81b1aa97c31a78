//! SHACL-style Turtle rendering

use super::{escape_iri, GraphDatatype, GraphSchema, PropertyDef};

const SH: &str = "http://www.w3.org/ns/shacl#";
const RDFS: &str = "http://www.w3.org/2000/01/rdf-schema#";

pub(super) fn render(schema: &GraphSchema) -> String {
    let mut out = String::new();
    out.push_str(&format!("@prefix sh: <{}> .\n", SH));
    out.push_str(&format!("@prefix rdfs: <{}> .\n", RDFS));
    out.push_str(&format!("@prefix xsd: <{}> .\n", super::XSD));
    for (prefix, uri) in schema.prefixes() {
        if matches!(prefix.as_str(), "sh" | "rdfs" | "xsd") {
            continue;
        }
        out.push_str(&format!("@prefix {}: {} .\n", prefix, iri(uri)));
    }

    for shape in schema.shapes() {
        out.push('\n');
        out.push_str(&format!("{} a sh:NodeShape ;\n", iri(&shape.iri)));
        out.push_str(&format!("    sh:targetClass {} ;\n", iri(&shape.iri)));
        if let Some(description) = &shape.description {
            out.push_str(&format!("    rdfs:comment {} ;\n", literal(description)));
        }
        for property in &shape.properties {
            render_property(&mut out, schema, property);
        }
        out.push_str("    sh:closed true .\n");
    }
    out
}

fn render_property(out: &mut String, schema: &GraphSchema, property: &PropertyDef) {
    out.push_str("    sh:property [\n");
    out.push_str(&format!("        sh:path {} ;\n", iri(&property.iri)));
    match &property.datatype {
        GraphDatatype::ResourceRef { class } => {
            out.push_str("        sh:nodeKind sh:IRI ;\n");
            if let Some(target) = class.as_ref().and_then(|c| schema.shape(c)) {
                out.push_str(&format!("        sh:class {} ;\n", iri(&target.iri)));
            }
        }
        literal_type => {
            if let Some(name) = literal_type.xsd_name() {
                out.push_str(&format!("        sh:datatype xsd:{} ;\n", name));
            }
        }
    }
    if property.min_count > 0 {
        out.push_str(&format!("        sh:minCount {} ;\n", property.min_count));
    }
    if let Some(max) = property.max_count {
        out.push_str(&format!("        sh:maxCount {} ;\n", max));
    }
    if let Some(description) = &property.description {
        out.push_str(&format!("        rdfs:comment {} ;\n", literal(description)));
    }
    out.push_str(&format!("        sh:name {}\n", literal(&property.name)));
    out.push_str("    ] ;\n");
}

/// Turtle string literal; JSON escapes are a subset of Turtle's
fn literal(text: &str) -> String {
    serde_json::to_string(text).unwrap_or_else(|_| format!("\"{}\"", text.escape_default()))
}

fn iri(value: &str) -> String {
    format!("<{}>", escape_iri(value))
}

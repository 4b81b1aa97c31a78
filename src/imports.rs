//! Import Resolution
//!
//! Loads imported schemas through an [`ImportLoader`] and merges them into
//! a new document. Merging is a union of prefixes, types and classes:
//! identical redefinitions are accepted, different ones are conflicts.
//!
//! Resolution is transitive and terminates on cycles: every import
//! identifier is loaded at most once, and identifiers already recorded in
//! [`SchemaDocument::resolved_imports`] are skipped, so resolving twice is
//! a no-op.

use std::collections::{HashSet, VecDeque};
use std::fs;
use std::path::{Path, PathBuf};

use include_dir::{include_dir, Dir};
use indexmap::IndexMap;
use tracing::{debug, warn};

use crate::error::{Result, SchemaError};
use crate::schema::{parse, AttributeDef, ClassDef, SchemaDocument, TypeDef};

/// Built-in schema libraries, embedded at compile time
static LIBRARY: Dir<'static> = include_dir!("$CARGO_MANIFEST_DIR/library");

/// Namespace of the built-in libraries
pub const LIBRARY_NAMESPACE: &str = "https://w3id.org/linkml/";

/// Source of imported schema text.
///
/// `Ok(None)` means "not mine", letting a [`ChainLoader`] try the next
/// loader; `Err` is a hard failure (I/O, unreadable file).
pub trait ImportLoader {
    fn load(&self, import: &str) -> Result<Option<String>>;
}

/// The embedded built-in type library (`linkml:types`)
#[derive(Debug, Clone, Copy, Default)]
pub struct BuiltinLibrary;

impl BuiltinLibrary {
    fn library_name(import: &str) -> Option<&str> {
        import
            .strip_prefix("linkml:")
            .or_else(|| import.strip_prefix(LIBRARY_NAMESPACE))
    }

    /// Names of the embedded libraries
    pub fn available() -> Vec<String> {
        LIBRARY
            .files()
            .filter_map(|f| f.path().file_stem())
            .map(|s| format!("linkml:{}", s.to_string_lossy()))
            .collect()
    }
}

impl ImportLoader for BuiltinLibrary {
    fn load(&self, import: &str) -> Result<Option<String>> {
        let Some(name) = Self::library_name(import) else {
            return Ok(None);
        };
        Ok(LIBRARY
            .get_file(format!("{}.yaml", name))
            .and_then(|f| f.contents_utf8())
            .map(str::to_string))
    }
}

/// Loads `<dir>/<name>.yaml` from a list of search paths
#[derive(Debug, Clone, Default)]
pub struct FsImportLoader {
    search_paths: Vec<PathBuf>,
}

impl FsImportLoader {
    pub fn new(search_paths: impl IntoIterator<Item = impl Into<PathBuf>>) -> Self {
        Self {
            search_paths: search_paths.into_iter().map(Into::into).collect(),
        }
    }

    pub fn search_paths(&self) -> &[PathBuf] {
        &self.search_paths
    }

    fn candidates(import: &str) -> Vec<String> {
        // `local:foo` and `foo` both look for foo.yaml
        let local = match import.split_once(':') {
            Some((_, rest)) if !import.contains("://") => rest,
            _ => import,
        };
        if local.ends_with(".yaml") || local.ends_with(".yml") {
            vec![local.to_string()]
        } else {
            vec![format!("{}.yaml", local), format!("{}.yml", local)]
        }
    }

    fn read(path: &Path, import: &str) -> Result<String> {
        fs::read_to_string(path).map_err(|e| SchemaError::ImportResolution {
            import: import.to_string(),
            reason: format!("{}: {}", path.display(), e),
        })
    }
}

impl ImportLoader for FsImportLoader {
    fn load(&self, import: &str) -> Result<Option<String>> {
        if import.contains("://") {
            return Ok(None);
        }
        for dir in &self.search_paths {
            for candidate in Self::candidates(import) {
                let path = dir.join(&candidate);
                if path.is_file() {
                    debug!(import, path = %path.display(), "loading import from disk");
                    return Self::read(&path, import).map(Some);
                }
            }
        }
        Ok(None)
    }
}

/// Schema sources held in memory, keyed by import identifier
#[derive(Debug, Clone, Default)]
pub struct InMemoryLoader {
    sources: IndexMap<String, String>,
}

impl InMemoryLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, import: impl Into<String>, source: impl Into<String>) -> Self {
        self.sources.insert(import.into(), source.into());
        self
    }
}

impl ImportLoader for InMemoryLoader {
    fn load(&self, import: &str) -> Result<Option<String>> {
        Ok(self.sources.get(import).cloned())
    }
}

/// Tries each loader in order
#[derive(Default)]
pub struct ChainLoader {
    loaders: Vec<Box<dyn ImportLoader + Send + Sync>>,
}

impl ChainLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, loader: impl ImportLoader + Send + Sync + 'static) -> Self {
        self.loaders.push(Box::new(loader));
        self
    }

    /// The built-in library followed by the given search paths
    pub fn standard(search_paths: impl IntoIterator<Item = impl Into<PathBuf>>) -> Self {
        Self::new()
            .with(BuiltinLibrary)
            .with(FsImportLoader::new(search_paths))
    }
}

impl ImportLoader for ChainLoader {
    fn load(&self, import: &str) -> Result<Option<String>> {
        for loader in &self.loaders {
            if let Some(source) = loader.load(import)? {
                return Ok(Some(source));
            }
        }
        Ok(None)
    }
}

// =============================================================================
// Resolution
// =============================================================================

/// Load and merge every (transitive) import of `doc` into a new document.
pub fn resolve_imports(doc: &SchemaDocument, loader: &dyn ImportLoader) -> Result<SchemaDocument> {
    let mut merged = doc.clone();
    let mut visited: HashSet<String> = doc.resolved_imports.iter().cloned().collect();
    let mut seen_ids: HashSet<String> = HashSet::from([doc.id.clone()]);
    let mut queue: VecDeque<String> = doc.imports.iter().cloned().collect();

    while let Some(import) = queue.pop_front() {
        if !visited.insert(import.clone()) {
            continue;
        }

        let source = loader.load(&import)?.ok_or_else(|| SchemaError::ImportResolution {
            import: import.clone(),
            reason: "not found in any import location".to_string(),
        })?;
        let imported = parse(&source).map_err(|e| SchemaError::ImportResolution {
            import: import.clone(),
            reason: e.to_string(),
        })?;

        merged.resolved_imports.push(import.clone());
        if !seen_ids.insert(imported.id.clone()) {
            warn!(import = %import, id = %imported.id, "schema already merged under another identifier");
            continue;
        }

        merge_into(&mut merged, &imported)?;
        debug!(
            import = %import,
            types = imported.types.len(),
            classes = imported.classes.len(),
            "merged import"
        );
        queue.extend(imported.imports.iter().cloned());
    }

    Ok(merged)
}

/// Union `source` into `target`, failing on incompatible redefinitions
fn merge_into(target: &mut SchemaDocument, source: &SchemaDocument) -> Result<()> {
    merge_table(&mut target.prefixes, &source.prefixes, "prefix", &source.id)?;
    merge_table(&mut target.types, &source.types, "type", &source.id)?;
    merge_table(&mut target.classes, &source.classes, "class", &source.id)?;
    Ok(())
}

/// A definition that may be declared by more than one schema
trait Mergeable: Clone {
    /// Combine with another declaration of the same name; the receiver
    /// wins where both say something compatible.
    fn merge(&self, other: &Self) -> std::result::Result<Self, String>;
}

impl Mergeable for String {
    fn merge(&self, other: &Self) -> std::result::Result<Self, String> {
        if self == other {
            Ok(self.clone())
        } else {
            Err(format!("'{}' vs '{}'", self, other))
        }
    }
}

impl Mergeable for TypeDef {
    fn merge(&self, other: &Self) -> std::result::Result<Self, String> {
        if self.type_of != other.type_of {
            return Err(format!(
                "typeof {} vs {}",
                self.type_of.as_deref().unwrap_or("(built-in)"),
                other.type_of.as_deref().unwrap_or("(built-in)")
            ));
        }
        Ok(TypeDef {
            name: self.name.clone(),
            type_of: self.type_of.clone(),
            uri: merge_optional("uri", &self.uri, &other.uri)?,
            description: self.description.clone().or_else(|| other.description.clone()),
        })
    }
}

impl Mergeable for ClassDef {
    fn merge(&self, other: &Self) -> std::result::Result<Self, String> {
        if self.is_a != other.is_a {
            return Err("different parent class".to_string());
        }
        if self.attributes.len() != other.attributes.len() {
            return Err("different attributes".to_string());
        }
        let attributes = self
            .attributes
            .iter()
            .zip(&other.attributes)
            .map(|(a, b)| merge_attribute(a, b))
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(ClassDef {
            name: self.name.clone(),
            description: self.description.clone().or_else(|| other.description.clone()),
            is_a: self.is_a.clone(),
            class_uri: merge_optional("class_uri", &self.class_uri, &other.class_uri)?,
            attributes,
        })
    }
}

fn merge_attribute(a: &AttributeDef, b: &AttributeDef) -> std::result::Result<AttributeDef, String> {
    if a.name != b.name {
        return Err(format!("attribute '{}' vs '{}'", a.name, b.name));
    }
    if (&a.range, a.multivalued, a.required, a.identifier) != (&b.range, b.multivalued, b.required, b.identifier) {
        return Err(format!("attribute '{}' has a different range or cardinality", a.name));
    }
    Ok(AttributeDef {
        slot_uri: merge_optional(&format!("'{}' slot_uri", a.name), &a.slot_uri, &b.slot_uri)?,
        description: a.description.clone().or_else(|| b.description.clone()),
        ..a.clone()
    })
}

/// Absent on one side is compatible with anything
fn merge_optional(
    what: &str,
    a: &Option<String>,
    b: &Option<String>,
) -> std::result::Result<Option<String>, String> {
    match (a, b) {
        (Some(x), Some(y)) if x != y => Err(format!("{} '{}' vs '{}'", what, x, y)),
        _ => Ok(a.clone().or_else(|| b.clone())),
    }
}

fn merge_table<V: Mergeable>(
    target: &mut IndexMap<String, V>,
    source: &IndexMap<String, V>,
    kind: &'static str,
    source_id: &str,
) -> Result<()> {
    for (name, value) in source {
        match target.get_mut(name) {
            Some(existing) => {
                *existing = existing.merge(value).map_err(|detail| {
                    SchemaError::conflict(kind, name.clone(), format!("{} in {}", detail, source_id))
                })?;
            }
            None => {
                target.insert(name.clone(), value.clone());
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const MAIN: &str = "id: https://example.org/main\nname: main\nimports:\n  - linkml:types\n  - local:shared\ndefault_range: string\nclasses:\n  Person:\n    attributes:\n      name:\n";
    const SHARED: &str = "id: https://example.org/shared\nname: shared\nimports:\n  - local:main\nclasses:\n  Address:\n    attributes:\n      street:\n        range: string\n";

    fn loader() -> ChainLoader {
        ChainLoader::new()
            .with(BuiltinLibrary)
            .with(InMemoryLoader::new().with("local:shared", SHARED).with("local:main", MAIN))
    }

    #[test]
    fn test_builtin_library_is_embedded() {
        let source = BuiltinLibrary.load("linkml:types").unwrap().unwrap();
        assert!(source.contains("xsd:decimal"));
        assert!(BuiltinLibrary.load("linkml:nope").unwrap().is_none());
        assert!(BuiltinLibrary.load("other:types").unwrap().is_none());
        assert!(BuiltinLibrary::available().contains(&"linkml:types".to_string()));
    }

    #[test]
    fn test_resolve_merges_and_terminates_on_cycle() {
        let doc = parse(MAIN).unwrap();
        let resolved = resolve_imports(&doc, &loader()).unwrap();

        assert!(resolved.classes.contains_key("Person"));
        assert!(resolved.classes.contains_key("Address"));
        assert!(resolved.types.contains_key("decimal"));
        assert_eq!(resolved.prefixes["xsd"], "http://www.w3.org/2001/XMLSchema#");
        // own classes keep their position ahead of imported ones
        assert_eq!(resolved.classes.get_index(0).unwrap().0, "Person");
    }

    #[test]
    fn test_resolve_is_idempotent() {
        let doc = parse(MAIN).unwrap();
        let once = resolve_imports(&doc, &loader()).unwrap();
        let twice = resolve_imports(&once, &loader()).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn test_missing_import_fails() {
        let doc = parse("id: x:a\nname: a\nimports:\n  - local:missing\n").unwrap();
        let err = resolve_imports(&doc, &loader()).unwrap_err();
        assert!(matches!(err, SchemaError::ImportResolution { ref import, .. } if import == "local:missing"));
    }

    #[test]
    fn test_conflicting_class_fails() {
        let other = "id: https://example.org/other\nname: other\nclasses:\n  Person:\n    attributes:\n      age:\n        range: integer\n";
        let doc = parse("id: x:a\nname: a\nimports:\n  - local:other\nclasses:\n  Person:\n    attributes:\n      name:\n").unwrap();
        let loader = InMemoryLoader::new().with("local:other", other);
        assert!(matches!(
            resolve_imports(&doc, &loader),
            Err(SchemaError::Conflict { kind: "class", .. })
        ));
    }

    #[test]
    fn test_compatible_redefinitions_merge() {
        let other = "id: https://example.org/other\nname: other\nclasses:\n  Person:\n    description: Imported person\n    attributes:\n      name:\n        description: Full name\n        slot_uri: schema:name\n";
        let doc = parse("id: x:a\nname: a\nimports:\n  - local:other\nclasses:\n  Person:\n    description: Local person\n    attributes:\n      name:\n").unwrap();
        let loader = InMemoryLoader::new().with("local:other", other);
        let merged = resolve_imports(&doc, &loader).unwrap();
        let person = &merged.classes["Person"];
        assert_eq!(person.description.as_deref(), Some("Local person"));
        let name = person.attribute("name").unwrap();
        assert_eq!(name.slot_uri.as_deref(), Some("schema:name"));
        assert_eq!(name.description.as_deref(), Some("Full name"));
    }

    #[test]
    fn test_type_redefinition_rules() {
        let other = "id: https://example.org/other\nname: other\ntypes:\n  money:\n    typeof: decimal\n    uri: xsd:decimal\n    description: Imported\n";
        let loader = InMemoryLoader::new().with("local:other", other);
        let local = |body: &str| {
            parse(&format!("id: x:a\nname: a\nimports:\n  - local:other\ntypes:\n  money:\n{}", body)).unwrap()
        };

        let merged = resolve_imports(&local("    typeof: decimal\n    description: Mine\n"), &loader).unwrap();
        assert_eq!(merged.types["money"].uri.as_deref(), Some("xsd:decimal"));
        assert_eq!(merged.types["money"].description.as_deref(), Some("Mine"));

        assert!(matches!(
            resolve_imports(&local("    typeof: integer\n"), &loader),
            Err(SchemaError::Conflict { kind: "type", .. })
        ));
        assert!(matches!(
            resolve_imports(&local("    typeof: decimal\n    uri: xsd:double\n"), &loader),
            Err(SchemaError::Conflict { kind: "type", .. })
        ));
    }

    #[test]
    fn test_class_cardinality_change_conflicts() {
        let other = "id: https://example.org/other\nname: other\nclasses:\n  Person:\n    attributes:\n      name:\n        required: true\n";
        let doc = parse("id: x:a\nname: a\nimports:\n  - local:other\nclasses:\n  Person:\n    attributes:\n      name:\n").unwrap();
        let loader = InMemoryLoader::new().with("local:other", other);
        assert!(matches!(
            resolve_imports(&doc, &loader),
            Err(SchemaError::Conflict { kind: "class", .. })
        ));
    }

    #[test]
    fn test_conflicting_prefix_fails() {
        let other = "id: https://example.org/other\nname: other\nprefixes:\n  ex: https://elsewhere.org/\n";
        let doc = parse("id: x:a\nname: a\nprefixes:\n  ex: https://example.org/\nimports:\n  - local:other\n").unwrap();
        let loader = InMemoryLoader::new().with("local:other", other);
        assert!(matches!(
            resolve_imports(&doc, &loader),
            Err(SchemaError::Conflict { kind: "prefix", .. })
        ));
    }

    #[test]
    fn test_fs_loader_reads_search_paths() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("shared.yaml"), SHARED).unwrap();
        let loader = FsImportLoader::new([dir.path()]);
        assert!(loader.load("local:shared").unwrap().is_some());
        assert!(loader.load("shared").unwrap().is_some());
        assert!(loader.load("absent").unwrap().is_none());
    }
}

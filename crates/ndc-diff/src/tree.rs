//! Structural flattening of a message schema into a path-keyed element map
//!
//! Starting at the message's root element, element declarations are expanded
//! through their types. `sequence`, `choice` and `all` are transparent, so two
//! choice branches that declare the same name share one path. Recursion
//! through types is cut per branch: a type already being expanded on the
//! current branch is recorded but not expanded again.

use std::collections::HashMap;
use std::path::Path;

use ndc_schema::{
    DefinitionKey, DefinitionKind, FileId, LoaderConfig, ResolvedName, SchemaFile, SchemaGraph,
    SchemaGraphLoader, resolve_qname,
};
use ndc_xml::{Element, XSD_NS};
use serde::Serialize;
use serde::ser::{SerializeMap, Serializer};
use tracing::{debug, trace};

use crate::{Error, Result};

/// One element occurrence in a flattened message
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaElement {
    pub name: String,
    /// `xs:`-prefixed for built-ins, the local name otherwise; `None` for
    /// elements without a `type` attribute
    pub type_name: Option<String>,
    pub documentation: Option<String>,
}

/// Insertion-ordered map from slash-delimited path to element
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FlatTree {
    entries: Vec<(String, SchemaElement)>,
    index: HashMap<String, usize>,
}

impl FlatTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert unless `path` is already present; returns whether it was inserted
    pub fn insert(&mut self, path: impl Into<String>, element: SchemaElement) -> bool {
        let path = path.into();
        if self.index.contains_key(&path) {
            return false;
        }
        self.index.insert(path.clone(), self.entries.len());
        self.entries.push((path, element));
        true
    }

    pub fn get(&self, path: &str) -> Option<&SchemaElement> {
        self.index.get(path).map(|&i| &self.entries[i].1)
    }

    pub fn contains(&self, path: &str) -> bool {
        self.index.contains_key(path)
    }

    /// Entries in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &SchemaElement)> {
        self.entries.iter().map(|(path, element)| (path.as_str(), element))
    }

    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(path, _)| path.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Serialize for FlatTree {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (path, element) in &self.entries {
            map.serialize_entry(path, element)?;
        }
        map.end()
    }
}

/// Limits for structural flattening
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TreeConfig {
    /// Elements deeper than this are recorded but not expanded
    pub max_depth: usize,
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self { max_depth: 64 }
    }
}

/// Types being expanded on the current branch, innermost first
struct Guard<'p> {
    key: &'p DefinitionKey,
    parent: Option<&'p Guard<'p>>,
}

impl Guard<'_> {
    fn contains(guard: Option<&Guard<'_>>, key: &DefinitionKey) -> bool {
        let mut current = guard;
        while let Some(g) = current {
            if g.key == key {
                return true;
            }
            current = g.parent;
        }
        false
    }
}

/// Flattens message schemas into [`FlatTree`]s
#[derive(Debug, Clone, Default)]
pub struct StructuralFlattener {
    loader: LoaderConfig,
    config: TreeConfig,
}

impl StructuralFlattener {
    pub fn new(loader: LoaderConfig, config: TreeConfig) -> Self {
        Self { loader, config }
    }

    /// Load `root_file` with its imports and flatten its message element.
    pub fn flatten(&self, root_file: &Path) -> Result<FlatTree> {
        let (graph, main) = SchemaGraphLoader::new(self.loader.clone()).load_graph(root_file)?;
        self.flatten_graph(&graph, main)
    }

    /// Flatten the message element of `main` in an already loaded graph.
    pub fn flatten_graph(&self, graph: &SchemaGraph, main: FileId) -> Result<FlatTree> {
        let file = graph.file(main);
        let root = root_element(file).ok_or_else(|| Error::NoRootElement(file.path.display().to_string()))?;

        let mut expander = Expander {
            graph,
            max_depth: self.config.max_depth,
            tree: FlatTree::new(),
        };
        expander.element(root, file, "", None, 0);

        debug!("Flattened {} into {} paths", file.path.display(), expander.tree.len());
        Ok(expander.tree)
    }
}

/// The element named after the file, without the `IATA_` prefix as a
/// fallback, else the first global element
fn root_element(file: &SchemaFile) -> Option<&Element> {
    let stem = file.stem().unwrap_or_default();
    file.element_named(stem)
        .or_else(|| stem.strip_prefix("IATA_").and_then(|s| file.element_named(s)))
        .or_else(|| file.first_element())
        .map(|d| &d.node)
}

/// Joined, trimmed text of `xs:annotation/xs:documentation` children
fn documentation(element: &Element) -> Option<String> {
    let texts: Vec<String> = element
        .child_elements()
        .filter(|e| e.is_xsd("annotation"))
        .flat_map(|a| a.child_elements().filter(|e| e.is_xsd("documentation")))
        .map(|d| d.text_content().trim().to_string())
        .filter(|t| !t.is_empty())
        .collect();
    if texts.is_empty() { None } else { Some(texts.join("\n")) }
}

fn type_name(resolved: &ResolvedName) -> String {
    match resolved {
        ResolvedName::Builtin(local) => format!("xs:{}", local),
        other => other.local_name().to_string(),
    }
}

struct Expander<'g> {
    graph: &'g SchemaGraph,
    max_depth: usize,
    tree: FlatTree,
}

impl<'g> Expander<'g> {
    /// Record an element declaration (or reference) and expand its type.
    fn element(
        &mut self,
        element: &'g Element,
        origin: &'g SchemaFile,
        parent_path: &str,
        guard: Option<&Guard<'_>>,
        depth: usize,
    ) {
        let mut declaration = element;
        let mut decl_origin = origin;
        let mut referenced = None;

        if let Some(value) = element.attribute("ref") {
            let resolved = resolve_qname(value, origin);
            match resolved.key().and_then(|key| self.graph.definition(key)) {
                Some(target) if target.kind() == DefinitionKind::Element => {
                    declaration = target.node();
                    decl_origin = target.origin;
                    referenced = Some(target.key());
                }
                _ => {
                    trace!("Unresolved element ref '{}' under {}", value, parent_path);
                    let path = format!("{}/{}", parent_path, resolved.local_name());
                    self.tree.insert(
                        path,
                        SchemaElement {
                            name: resolved.local_name().to_string(),
                            type_name: None,
                            documentation: documentation(element),
                        },
                    );
                    return;
                }
            }
        }

        let Some(name) = declaration.attribute("name") else {
            return;
        };
        let path = format!("{}/{}", parent_path, name);
        let type_ref = declaration.attribute("type").map(|v| resolve_qname(v, decl_origin));

        let recorded = SchemaElement {
            name: name.to_string(),
            type_name: type_ref.as_ref().map(type_name),
            documentation: documentation(element).or_else(|| documentation(declaration)),
        };
        if !self.tree.insert(path.clone(), recorded) {
            trace!("Path {} already recorded", path);
            return;
        }
        if depth + 1 >= self.max_depth {
            debug!("Depth limit reached at {}", path);
            return;
        }

        // an element referencing itself through `ref` is a cycle too
        if let Some(key) = referenced {
            if Guard::contains(guard, key) {
                return;
            }
        }
        let ref_guard = referenced.map(|key| Guard { key, parent: guard });
        let guard = ref_guard.as_ref().or(guard);

        match type_ref {
            Some(ResolvedName::Definition(key)) => {
                if Guard::contains(guard, &key) {
                    trace!("Cycle on {} at {}", key, path);
                    return;
                }
                let Some(definition) = self.graph.definition(&key) else {
                    debug!("Missing type {} at {}", key, path);
                    return;
                };
                if definition.kind() != DefinitionKind::ComplexType {
                    return;
                }
                let inner = Guard {
                    key: definition.key(),
                    parent: guard,
                };
                self.complex_content(definition.node(), definition.origin, &path, Some(&inner), depth + 1);
            }
            Some(_) => {}
            None => {
                if let Some(inline) = declaration.find_xsd_child("complexType") {
                    self.complex_content(inline, decl_origin, &path, guard, depth + 1);
                }
            }
        }
    }

    /// Expand the content model of a complex type, or of an extension or
    /// restriction, which share the same child layout.
    fn complex_content(
        &mut self,
        node: &'g Element,
        origin: &'g SchemaFile,
        path: &str,
        guard: Option<&Guard<'_>>,
        depth: usize,
    ) {
        for child in node.child_elements() {
            if child.namespace.as_deref() != Some(XSD_NS) {
                continue;
            }
            match child.name.as_str() {
                "sequence" | "choice" | "all" => self.particles(child, origin, path, guard, depth),
                "group" => self.group(child, origin, path, guard, depth),
                "complexContent" => {
                    for derivation in child.child_elements() {
                        if derivation.is_xsd("extension") {
                            self.extension(derivation, origin, path, guard, depth);
                        } else if derivation.is_xsd("restriction") {
                            self.complex_content(derivation, origin, path, guard, depth);
                        }
                    }
                }
                _ => {}
            }
        }
    }

    /// Base type content first, then the extension's own content
    fn extension(
        &mut self,
        extension: &'g Element,
        origin: &'g SchemaFile,
        path: &str,
        guard: Option<&Guard<'_>>,
        depth: usize,
    ) {
        if let Some(base) = extension.attribute("base") {
            if let ResolvedName::Definition(key) = resolve_qname(base, origin) {
                match self.graph.definition(&key) {
                    Some(definition)
                        if definition.kind() == DefinitionKind::ComplexType
                            && !Guard::contains(guard, &key) =>
                    {
                        let inner = Guard {
                            key: definition.key(),
                            parent: guard,
                        };
                        self.complex_content(definition.node(), definition.origin, path, Some(&inner), depth);
                    }
                    Some(_) => {}
                    None => debug!("Missing base type {} at {}", key, path),
                }
            }
        }
        self.complex_content(extension, origin, path, guard, depth);
    }

    fn particles(
        &mut self,
        container: &'g Element,
        origin: &'g SchemaFile,
        path: &str,
        guard: Option<&Guard<'_>>,
        depth: usize,
    ) {
        for child in container.child_elements() {
            if child.is_xsd("element") {
                self.element(child, origin, path, guard, depth);
            } else if child.is_xsd("sequence") || child.is_xsd("choice") || child.is_xsd("all") {
                self.particles(child, origin, path, guard, depth);
            } else if child.is_xsd("group") {
                self.group(child, origin, path, guard, depth);
            }
        }
    }

    fn group(
        &mut self,
        group: &'g Element,
        origin: &'g SchemaFile,
        path: &str,
        guard: Option<&Guard<'_>>,
        depth: usize,
    ) {
        let Some(value) = group.attribute("ref") else {
            return;
        };
        let ResolvedName::Definition(key) = resolve_qname(value, origin) else {
            return;
        };
        if Guard::contains(guard, &key) {
            return;
        }
        let Some(definition) = self.graph.definition(&key) else {
            debug!("Missing group {} at {}", key, path);
            return;
        };
        let inner = Guard {
            key: definition.key(),
            parent: guard,
        };
        self.particles(definition.node(), definition.origin, path, Some(&inner), depth);
    }
}

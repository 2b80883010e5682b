//! Schema model definitions

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::path::PathBuf;

use ndc_xml::Element;
use serde::{Deserialize, Serialize};

/// Identity of a top-level definition across the whole loaded graph
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DefinitionKey {
    /// Namespace URI (empty for "no namespace")
    pub namespace: String,
    /// Local name from the `name` attribute
    pub name: String,
}

impl DefinitionKey {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for DefinitionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{{}}}{}", self.namespace, self.name)
    }
}

/// Kinds of top-level definitions the loader indexes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DefinitionKind {
    ComplexType,
    SimpleType,
    Element,
    Group,
    AttributeGroup,
}

impl DefinitionKind {
    /// Map an XSD element local name to a definition kind
    pub fn from_local_name(name: &str) -> Option<Self> {
        match name {
            "complexType" => Some(Self::ComplexType),
            "simpleType" => Some(Self::SimpleType),
            "element" => Some(Self::Element),
            "group" => Some(Self::Group),
            "attributeGroup" => Some(Self::AttributeGroup),
            _ => None,
        }
    }
}

/// Index of a file inside a [`crate::SchemaGraph`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FileId(pub usize);

/// A top-level definition together with its source node
#[derive(Debug, Clone)]
pub struct Definition {
    pub key: DefinitionKey,
    pub kind: DefinitionKind,
    pub node: Element,
}

/// `xs:import` versus `xs:include`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportKind {
    Import,
    Include,
}

/// An import or include found at the root of a schema file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportDecl {
    pub kind: ImportKind,
    pub namespace: Option<String>,
    pub schema_location: Option<String>,
}

/// Prefix → namespace URI bindings declared on a schema root.
/// The default (unprefixed) binding is stored under the empty prefix.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PrefixMap {
    bindings: BTreeMap<String, String>,
}

impl PrefixMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind a prefix; `None` or `""` binds the default namespace
    pub fn insert(&mut self, prefix: Option<&str>, uri: impl Into<String>) {
        self.bindings
            .insert(prefix.unwrap_or_default().to_string(), uri.into());
    }

    /// Namespace bound to a non-empty prefix
    pub fn get(&self, prefix: &str) -> Option<&str> {
        if prefix.is_empty() {
            return None;
        }
        self.bindings.get(prefix).map(String::as_str)
    }

    /// Namespace bound by `xmlns="..."`
    pub fn default_namespace(&self) -> Option<&str> {
        self.bindings.get("").map(String::as_str)
    }

    /// Non-empty prefixes bound to `uri`, in lexical order
    pub fn prefixes_for<'a>(&'a self, uri: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.bindings
            .iter()
            .filter(move |(prefix, bound)| !prefix.is_empty() && bound.as_str() == uri)
            .map(|(prefix, _)| prefix.as_str())
    }

    /// All bindings, default binding first
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.bindings.iter().map(|(p, u)| (p.as_str(), u.as_str()))
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

/// One parsed XSD document
#[derive(Debug, Clone)]
pub struct SchemaFile {
    /// Canonical path the file was loaded from
    pub path: PathBuf,
    /// `targetNamespace`, or empty for no namespace
    pub target_namespace: String,
    /// Root-level namespace bindings
    pub prefixes: PrefixMap,
    /// `version` attribute of the schema root
    pub version: Option<String>,
    /// `elementFormDefault` attribute of the schema root
    pub element_form_default: Option<String>,
    /// Root-level imports and includes in document order
    pub imports: Vec<ImportDecl>,
    definitions: HashMap<DefinitionKey, Definition>,
    order: Vec<DefinitionKey>,
}

impl SchemaFile {
    /// Create an empty file record
    pub fn new(path: PathBuf, target_namespace: impl Into<String>, prefixes: PrefixMap) -> Self {
        Self {
            path,
            target_namespace: target_namespace.into(),
            prefixes,
            version: None,
            element_form_default: None,
            imports: Vec::new(),
            definitions: HashMap::new(),
            order: Vec::new(),
        }
    }

    /// Add a definition; returns the one it replaced, if any
    pub fn add_definition(&mut self, definition: Definition) -> Option<Definition> {
        let key = definition.key.clone();
        let previous = self.definitions.insert(key.clone(), definition);
        if previous.is_none() {
            self.order.push(key);
        }
        previous
    }

    /// Look up a definition declared in this file
    pub fn definition(&self, key: &DefinitionKey) -> Option<&Definition> {
        self.definitions.get(key)
    }

    /// Definitions in document order
    pub fn definitions(&self) -> impl Iterator<Item = &Definition> {
        self.order.iter().filter_map(|key| self.definitions.get(key))
    }

    /// Keys of the definitions in document order
    pub fn keys(&self) -> &[DefinitionKey] {
        &self.order
    }

    /// Global element declared with `name`
    pub fn element_named(&self, name: &str) -> Option<&Definition> {
        self.definitions()
            .find(|d| d.kind == DefinitionKind::Element && d.key.name == name)
    }

    /// First global element in document order
    pub fn first_element(&self) -> Option<&Definition> {
        self.definitions().find(|d| d.kind == DefinitionKind::Element)
    }

    /// File stem, e.g. `IATA_OrderViewRQ` for `IATA_OrderViewRQ.xsd`
    pub fn stem(&self) -> Option<&str> {
        self.path.file_stem().and_then(|s| s.to_str())
    }
}

//! Qualified-name resolution against the declaring file's bindings

use ndc_xml::{Element, XML_NS, XSD_NS, split_qname};

use crate::model::{DefinitionKey, SchemaFile};

/// Attributes whose value is a single QName referring to a definition
pub const REFERENCE_ATTRIBUTES: [&str; 5] = ["type", "base", "ref", "itemType", "substitutionGroup"];

/// Attributes whose value is a whitespace-separated list of QNames
pub const LIST_REFERENCE_ATTRIBUTES: [&str; 1] = ["memberTypes"];

/// Outcome of resolving a QName
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolvedName {
    /// A built-in XSD type or declaration
    Builtin(String),
    /// A (possibly undefined) definition key
    Definition(DefinitionKey),
    /// The prefix is not bound in the declaring file
    Unbound { prefix: String, local: String },
}

impl ResolvedName {
    /// The definition key, if the name resolved to one
    pub fn key(&self) -> Option<&DefinitionKey> {
        match self {
            Self::Definition(key) => Some(key),
            _ => None,
        }
    }

    pub fn is_builtin(&self) -> bool {
        matches!(self, Self::Builtin(_))
    }

    /// Local part of the name
    pub fn local_name(&self) -> &str {
        match self {
            Self::Builtin(local) => local,
            Self::Definition(key) => &key.name,
            Self::Unbound { local, .. } => local,
        }
    }
}

/// Resolve `value` using the prefix map of the file that declared it.
///
/// A prefixed name uses the file's binding for that prefix; the conventional
/// `xs`/`xsd` aliases fall back to the XSD namespace when unbound and `xml` is
/// always bound to the XML namespace. An unprefixed
/// name uses the file's default `xmlns` binding if it has one, otherwise the
/// file's target namespace.
pub fn resolve_qname(value: &str, file: &SchemaFile) -> ResolvedName {
    let (prefix, local) = split_qname(value.trim());
    let namespace = match prefix {
        Some("xml") => XML_NS,
        Some(prefix) => match file.prefixes.get(prefix) {
            Some(uri) => uri,
            None if prefix == "xs" || prefix == "xsd" => XSD_NS,
            None => {
                return ResolvedName::Unbound {
                    prefix: prefix.to_string(),
                    local: local.to_string(),
                };
            }
        },
        None => file
            .prefixes
            .default_namespace()
            .unwrap_or(file.target_namespace.as_str()),
    };

    if namespace == XSD_NS {
        ResolvedName::Builtin(local.to_string())
    } else {
        ResolvedName::Definition(DefinitionKey::new(namespace, local))
    }
}

/// One QName-valued reference found on an element
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reference<'a> {
    /// Attribute the reference was found in
    pub attribute: &'a str,
    /// A single QName (list attributes yield one entry per token)
    pub value: &'a str,
}

/// All references carried directly by `element` (not its descendants)
pub fn references(element: &Element) -> Vec<Reference<'_>> {
    let mut found = Vec::new();
    for attr in &element.attributes {
        let name = attr.name.as_str();
        if REFERENCE_ATTRIBUTES.contains(&name) {
            found.push(Reference {
                attribute: name,
                value: attr.value.trim(),
            });
        } else if LIST_REFERENCE_ATTRIBUTES.contains(&name) {
            found.extend(attr.value.split_whitespace().map(|value| Reference {
                attribute: name,
                value,
            }));
        }
    }
    found
}

//! Reference rewriting for emitted definitions
//!
//! Every QName-valued reference inside a copied definition is rewritten from
//! the prefixes of the file that declared it to the prefixes of the bundle:
//! built-ins become `xs:`, side namespaces use their assigned prefix, the main
//! namespace is unprefixed in the main file and uses the main alias in side
//! files, and foreign namespaces use their external prefix. Names in the XML
//! namespace always keep `xml:`.

use std::collections::BTreeSet;

use ndc_schema::{LIST_REFERENCE_ATTRIBUTES, REFERENCE_ATTRIBUTES, ResolvedName, SchemaFile, resolve_qname};
use ndc_xml::{Element, Visitor, XML_NS, XSD_NS, walk};
use tracing::warn;

use crate::plan::{NamespacePlan, SideNamespace};

/// Which output file a definition is being written into
#[derive(Debug, Clone, Copy)]
pub enum RewriteScope<'p> {
    Main,
    Side(&'p SideNamespace),
}

/// Namespaces the rewritten references point into
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RewriteUsage {
    /// A side file referenced the main namespace
    pub main: bool,
    pub sides: BTreeSet<String>,
    pub externals: BTreeSet<String>,
}

impl RewriteUsage {
    pub fn merge(&mut self, other: &RewriteUsage) {
        self.main |= other.main;
        self.sides.extend(other.sides.iter().cloned());
        self.externals.extend(other.externals.iter().cloned());
    }
}

pub struct ReferenceRewriter<'a> {
    plan: &'a NamespacePlan,
    main_alias: &'a str,
}

impl<'a> ReferenceRewriter<'a> {
    pub fn new(plan: &'a NamespacePlan, main_alias: &'a str) -> Self {
        Self { plan, main_alias }
    }

    /// Rewrite a single QName written in `origin`.
    pub fn rewrite_value(
        &self,
        value: &str,
        origin: &SchemaFile,
        scope: RewriteScope<'_>,
        usage: &mut RewriteUsage,
    ) -> String {
        match resolve_qname(value, origin) {
            ResolvedName::Builtin(local) => format!("xs:{}", local),
            ResolvedName::Definition(key) => {
                if key.namespace == self.plan.main_namespace {
                    match scope {
                        RewriteScope::Main => key.name,
                        // a no-namespace main is reached through `xmlns=""` in side files
                        RewriteScope::Side(_) if key.namespace.is_empty() => {
                            usage.main = true;
                            key.name
                        }
                        RewriteScope::Side(_) => {
                            usage.main = true;
                            format!("{}:{}", self.main_alias, key.name)
                        }
                    }
                } else if let Some(side) = self.plan.side(&key.namespace) {
                    usage.sides.insert(side.namespace.clone());
                    format!("{}:{}", side.prefix, key.name)
                } else if let Some(prefix) = self.plan.externals.get(&key.namespace) {
                    usage.externals.insert(key.namespace.clone());
                    format!("{}:{}", prefix, key.name)
                } else if key.namespace == XML_NS {
                    format!("xml:{}", key.name)
                } else {
                    warn!(
                        "Reference '{}' in {} points to unplanned namespace {}",
                        value,
                        origin.path.display(),
                        key.namespace
                    );
                    key.name
                }
            }
            ResolvedName::Unbound { prefix, local } => {
                warn!(
                    "Reference '{}' in {} uses unbound prefix '{}'",
                    value,
                    origin.path.display(),
                    prefix
                );
                local
            }
        }
    }

    /// Rewrite every reference inside `node` in place and normalise XSD
    /// elements to the `xs` prefix.
    pub fn rewrite_definition(
        &self,
        node: &mut Element,
        origin: &SchemaFile,
        scope: RewriteScope<'_>,
    ) -> RewriteUsage {
        let mut visitor = RewriteVisitor {
            rewriter: self,
            origin,
            scope,
            usage: RewriteUsage::default(),
        };
        walk(node, &mut visitor);
        visitor.usage
    }
}

struct RewriteVisitor<'r, 'a> {
    rewriter: &'r ReferenceRewriter<'a>,
    origin: &'r SchemaFile,
    scope: RewriteScope<'r>,
    usage: RewriteUsage,
}

impl Visitor for RewriteVisitor<'_, '_> {
    fn visit(&mut self, element: &mut Element) {
        if element.namespace.as_deref() == Some(XSD_NS) {
            element.prefix = Some("xs".to_string());
            // bundle roots own `xs` and the default namespace
            element
                .namespaces
                .retain(|decl| decl.prefix.is_some() && decl.prefix.as_deref() != Some("xs"));
        } else if let Some(namespace) = element.namespace.clone() {
            let prefix = element.prefix.clone();
            element.declare_namespace(prefix.as_deref(), namespace);
        }

        // qualified attributes such as `ds:Id` keep their source binding
        let attribute_prefixes: Vec<(String, String)> = element
            .attributes
            .iter()
            .filter_map(|attr| attr.name.split_once(':'))
            .filter(|(prefix, _)| *prefix != "xml" && *prefix != "xmlns")
            .filter_map(|(prefix, _)| {
                self.origin
                    .prefixes
                    .get(prefix)
                    .map(|uri| (prefix.to_string(), uri.to_string()))
            })
            .collect();
        for (prefix, uri) in attribute_prefixes {
            element.declare_namespace(Some(prefix.as_str()), uri);
        }

        for attribute in element.attributes.iter_mut() {
            let name = attribute.name.as_str();
            if REFERENCE_ATTRIBUTES.contains(&name) {
                attribute.value = self.rewriter.rewrite_value(
                    attribute.value.trim(),
                    self.origin,
                    self.scope,
                    &mut self.usage,
                );
            } else if LIST_REFERENCE_ATTRIBUTES.contains(&name) {
                let rewritten: Vec<String> = attribute
                    .value
                    .split_whitespace()
                    .map(|token| {
                        self.rewriter
                            .rewrite_value(token, self.origin, self.scope, &mut self.usage)
                    })
                    .collect();
                attribute.value = rewritten.join(" ");
            }
        }
    }
}

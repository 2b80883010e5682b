//! Reachability closure over definitions

use std::collections::{BTreeSet, VecDeque};

use tracing::{debug, warn};

use crate::graph::SchemaGraph;
use crate::model::{DefinitionKey, FileId};
use crate::resolve::{ResolvedName, references, resolve_qname};

/// A reference whose target is not in the global table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnresolvedReference {
    /// Definition containing the reference
    pub from: DefinitionKey,
    /// Attribute holding the reference
    pub attribute: String,
    /// Reference value as written
    pub value: String,
}

/// Result of a reachability analysis
#[derive(Debug, Clone, Default)]
pub struct Reachability {
    /// Every definition reachable from the main file, including its own
    pub used: BTreeSet<DefinitionKey>,
    /// References that could not be followed
    pub unresolved: Vec<UnresolvedReference>,
    /// Foreign namespaces referenced by reachable definitions
    pub foreign_namespaces: BTreeSet<String>,
}

/// Computes the transitive closure of definitions referenced from a file
pub struct ReachabilityAnalyzer<'g> {
    graph: &'g SchemaGraph,
}

impl<'g> ReachabilityAnalyzer<'g> {
    pub fn new(graph: &'g SchemaGraph) -> Self {
        Self { graph }
    }

    /// Keys reachable from `main`'s own top-level definitions
    pub fn find_used(&self, main: FileId) -> BTreeSet<DefinitionKey> {
        self.analyze(main).used
    }

    /// Full analysis including unresolved and foreign references
    pub fn analyze(&self, main: FileId) -> Reachability {
        let main_file = self.graph.file(main);
        let mut result = Reachability::default();
        let mut queue = VecDeque::new();

        for key in main_file.keys() {
            if key.namespace == main_file.target_namespace && result.used.insert(key.clone()) {
                queue.push_back(key.clone());
            }
        }

        while let Some(current) = queue.pop_front() {
            let Some(definition) = self.graph.definition(&current) else {
                continue;
            };

            for element in definition.node().descendants() {
                for reference in references(element) {
                    match resolve_qname(reference.value, definition.origin) {
                        ResolvedName::Builtin(_) => {}
                        ResolvedName::Definition(key) => {
                            if self.graph.contains(&key) {
                                if result.used.insert(key.clone()) {
                                    queue.push_back(key);
                                }
                            } else if self.graph.foreign().contains(&key.namespace) {
                                result.foreign_namespaces.insert(key.namespace);
                            } else {
                                debug!("Missing definition {} referenced from {}", key, current);
                                result.unresolved.push(UnresolvedReference {
                                    from: current.clone(),
                                    attribute: reference.attribute.to_string(),
                                    value: reference.value.to_string(),
                                });
                            }
                        }
                        ResolvedName::Unbound { prefix, .. } => {
                            debug!(
                                "Unbound prefix '{}' in {} (from {})",
                                prefix, reference.value, current
                            );
                            result.unresolved.push(UnresolvedReference {
                                from: current.clone(),
                                attribute: reference.attribute.to_string(),
                                value: reference.value.to_string(),
                            });
                        }
                    }
                }
            }
        }

        if !result.unresolved.is_empty() {
            warn!(
                "{} unresolved references while analyzing {}",
                result.unresolved.len(),
                main_file.path.display()
            );
        }
        debug!(
            "{} definitions reachable from {}",
            result.used.len(),
            main_file.path.display()
        );
        result
    }
}

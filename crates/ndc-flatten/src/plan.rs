//! Namespace partitioning and prefix assignment

use std::collections::{BTreeMap, BTreeSet, HashSet};

use ndc_schema::{DefinitionKey, FileId, ResolvedName, SchemaGraph, references, resolve_qname};
use ndc_xml::{XML_NS, XSD_NS};
use tracing::debug;

use crate::config::EmitConfig;

/// A non-main namespace that gets its own side file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SideNamespace {
    pub namespace: String,
    pub prefix: String,
    pub file_name: String,
    /// Definitions in this namespace, sorted by name
    pub keys: Vec<DefinitionKey>,
}

/// How a message's reachable definitions are split across output files
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamespacePlan {
    pub main_namespace: String,
    pub main_file_name: String,
    /// Main-namespace definitions, sorted by name
    pub main_keys: Vec<DefinitionKey>,
    /// Side namespaces in discovery order
    pub sides: Vec<SideNamespace>,
    /// Foreign namespace → prefix, for foreign namespaces actually referenced
    pub externals: BTreeMap<String, String>,
}

impl NamespacePlan {
    /// Partition `used` by namespace and assign prefixes and file names.
    pub fn build(
        graph: &SchemaGraph,
        main: FileId,
        used: &BTreeSet<DefinitionKey>,
        base_name: &str,
        main_file_name: &str,
        config: &EmitConfig,
    ) -> Self {
        let main_namespace = graph.file(main).target_namespace.clone();

        let mut buckets: BTreeMap<&str, Vec<DefinitionKey>> = BTreeMap::new();
        for key in used {
            if key.namespace != XSD_NS {
                buckets.entry(key.namespace.as_str()).or_default().push(key.clone());
            }
        }
        let main_keys = buckets.remove(main_namespace.as_str()).unwrap_or_default();

        let mut taken: HashSet<String> = ["xs", "xml", "xmlns", config.main_alias.as_str()]
            .iter()
            .map(|p| p.to_string())
            .collect();
        let mut file_names: HashSet<String> = HashSet::from([main_file_name.to_string()]);

        let mut sides = Vec::new();
        for (namespace, keys) in buckets {
            let prefix = pick_prefix(graph, namespace, &config.synthetic_prefix, sides.len(), &mut taken);
            let file_name = side_file_name(base_name, namespace, config, &mut file_names);
            debug!("Side namespace {} → prefix '{}', file {}", namespace, prefix, file_name);
            sides.push(SideNamespace {
                namespace: namespace.to_string(),
                prefix,
                file_name,
                keys,
            });
        }

        let mut externals = BTreeMap::new();
        for namespace in referenced_foreign_namespaces(graph, used) {
            // `xml` cannot be rebound
            if namespace == XML_NS {
                externals.insert(namespace, "xml".to_string());
                continue;
            }
            let prefix = pick_prefix(
                graph,
                &namespace,
                &config.external_synthetic_prefix,
                externals.len(),
                &mut taken,
            );
            externals.insert(namespace, prefix);
        }

        Self {
            main_namespace,
            main_file_name: main_file_name.to_string(),
            main_keys,
            sides,
            externals,
        }
    }

    /// Side namespace entry by URI
    pub fn side(&self, namespace: &str) -> Option<&SideNamespace> {
        self.sides.iter().find(|s| s.namespace == namespace)
    }

    /// Total number of definitions across all output files
    pub fn definition_count(&self) -> usize {
        self.main_keys.len() + self.sides.iter().map(|s| s.keys.len()).sum::<usize>()
    }
}

/// Prefer a prefix some loaded file already uses for `namespace`, else
/// synthesize `<synthetic><n>` starting at `start`.
fn pick_prefix(
    graph: &SchemaGraph,
    namespace: &str,
    synthetic: &str,
    start: usize,
    taken: &mut HashSet<String>,
) -> String {
    let discovered = graph
        .files()
        .flat_map(|(_, file)| file.prefixes.prefixes_for(namespace))
        .find(|prefix| !taken.contains(*prefix))
        .map(str::to_string);

    let prefix = discovered.unwrap_or_else(|| {
        (start..)
            .map(|n| format!("{}{}", synthetic, n))
            .find(|candidate| !taken.contains(candidate))
            .unwrap_or_else(|| format!("{}{}", synthetic, start))
    });
    taken.insert(prefix.clone());
    prefix
}

fn side_file_name(
    base_name: &str,
    namespace: &str,
    config: &EmitConfig,
    used_names: &mut HashSet<String>,
) -> String {
    let suffix = if namespace.contains(&config.optional_marker) {
        "_OptionalCommonTypes"
    } else {
        "_CommonTypes"
    };

    let mut name = format!("{}{}.xsd", base_name, suffix);
    let mut counter = 2;
    while used_names.contains(&name) {
        name = format!("{}{}{}.xsd", base_name, suffix, counter);
        counter += 1;
    }
    used_names.insert(name.clone());
    name
}

/// Foreign namespaces referenced anywhere inside the used definitions
fn referenced_foreign_namespaces(
    graph: &SchemaGraph,
    used: &BTreeSet<DefinitionKey>,
) -> BTreeSet<String> {
    let mut found = BTreeSet::new();
    for key in used {
        let Some(definition) = graph.definition(key) else {
            continue;
        };
        for element in definition.node().descendants() {
            for reference in references(element) {
                if let ResolvedName::Definition(target) = resolve_qname(reference.value, definition.origin) {
                    if graph.foreign().contains(&target.namespace) {
                        found.insert(target.namespace);
                    }
                }
            }
        }
    }
    found
}

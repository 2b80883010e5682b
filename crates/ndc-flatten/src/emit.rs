//! Bundle emission: side files, main file, foreign schema copies

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use ndc_schema::{DefinitionKey, FileId, SchemaGraph};
use ndc_xml::{Document, Element, XML_NS, XSD_NS};
use tracing::{debug, info, warn};

use crate::config::EmitConfig;
use crate::plan::{NamespacePlan, SideNamespace};
use crate::rewrite::{ReferenceRewriter, RewriteScope, RewriteUsage};
use crate::{Error, Result};

/// Files produced for one message
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EmitReport {
    pub main_file: PathBuf,
    pub side_files: Vec<PathBuf>,
    /// Foreign schemas copied by this run (already-present copies are not listed)
    pub copied_externals: Vec<PathBuf>,
    /// Definitions written across main and side files
    pub definition_count: usize,
}

/// Writes a self-contained bundle for one message from a loaded graph
pub struct BundleEmitter<'g> {
    graph: &'g SchemaGraph,
    config: &'g EmitConfig,
}

impl<'g> BundleEmitter<'g> {
    pub fn new(graph: &'g SchemaGraph, config: &'g EmitConfig) -> Self {
        Self { graph, config }
    }

    /// Emit `used` as a bundle rooted at `output_path`.
    ///
    /// Side files land next to `output_path`, named after its stem. Existing
    /// files are overwritten; existing foreign copies are left alone.
    pub fn emit(
        &self,
        main: FileId,
        used: &BTreeSet<DefinitionKey>,
        output_path: &Path,
    ) -> Result<EmitReport> {
        let file_name = output_path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| Error::InvalidOutput(output_path.display().to_string()))?;
        let base_name = output_path
            .file_stem()
            .and_then(|s| s.to_str())
            .ok_or_else(|| Error::InvalidOutput(output_path.display().to_string()))?;
        let output_dir = match output_path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        fs::create_dir_all(output_dir).map_err(|e| {
            Error::io("create_dir", output_dir.display().to_string(), e.to_string())
        })?;

        let plan = NamespacePlan::build(self.graph, main, used, base_name, file_name, self.config);
        let rewriter = ReferenceRewriter::new(&plan, &self.config.main_alias);
        let mut all_usage = RewriteUsage::default();
        let mut report = EmitReport {
            main_file: output_path.to_path_buf(),
            definition_count: plan.definition_count(),
            ..Default::default()
        };

        for side in &plan.sides {
            let (definitions, usage) = self.clone_rewritten(&side.keys, &rewriter, RewriteScope::Side(side));
            let schema = self.side_schema(&plan, side, definitions, &usage);
            let path = output_dir.join(&side.file_name);
            self.write(schema, &path)?;
            debug!("Wrote side file {} ({} definitions)", path.display(), side.keys.len());
            all_usage.merge(&usage);
            report.side_files.push(path);
        }

        let (definitions, usage) = self.clone_rewritten(&plan.main_keys, &rewriter, RewriteScope::Main);
        let schema = self.main_schema(main, &plan, definitions, &usage);
        self.write(schema, output_path)?;
        all_usage.merge(&usage);

        if self.config.copy_externals {
            report.copied_externals = self.copy_externals(&all_usage.externals, output_dir);
        }

        info!(
            "Emitted {} ({} definitions, {} side files, {} externals copied)",
            output_path.display(),
            report.definition_count,
            report.side_files.len(),
            report.copied_externals.len()
        );
        Ok(report)
    }

    fn clone_rewritten(
        &self,
        keys: &[DefinitionKey],
        rewriter: &ReferenceRewriter<'_>,
        scope: RewriteScope<'_>,
    ) -> (Vec<Element>, RewriteUsage) {
        let mut usage = RewriteUsage::default();
        let mut definitions = Vec::with_capacity(keys.len());
        for key in keys {
            let Some(definition) = self.graph.definition(key) else {
                warn!("Reachable definition {} vanished from the graph", key);
                continue;
            };
            let mut node = definition.node().clone();
            usage.merge(&rewriter.rewrite_definition(&mut node, definition.origin, scope));
            definitions.push(node);
        }
        (definitions, usage)
    }

    fn side_schema(
        &self,
        plan: &NamespacePlan,
        side: &SideNamespace,
        definitions: Vec<Element>,
        usage: &RewriteUsage,
    ) -> Element {
        let mut schema = schema_root(
            &side.namespace,
            &self.config.element_form_default,
            &self.config.default_version,
        );
        schema.declare_namespace(Some(side.prefix.as_str()), side.namespace.as_str());

        if usage.main {
            if plan.main_namespace.is_empty() {
                schema.declare_namespace(None, "");
                schema.add_child(Element::xsd("import").with_attribute("schemaLocation", &plan.main_file_name));
            } else {
                schema.declare_namespace(Some(self.config.main_alias.as_str()), plan.main_namespace.as_str());
                schema.add_child(import(&plan.main_namespace, &plan.main_file_name));
            }
        }
        for other in &plan.sides {
            if other.namespace != side.namespace && usage.sides.contains(&other.namespace) {
                schema.declare_namespace(Some(other.prefix.as_str()), other.namespace.as_str());
                schema.add_child(import(&other.namespace, &other.file_name));
            }
        }
        self.add_external_imports(&mut schema, plan, &usage.externals);

        for definition in definitions {
            schema.add_child(definition);
        }
        schema
    }

    fn main_schema(
        &self,
        main: FileId,
        plan: &NamespacePlan,
        definitions: Vec<Element>,
        usage: &RewriteUsage,
    ) -> Element {
        let source = self.graph.file(main);
        let mut schema = schema_root(
            &plan.main_namespace,
            source
                .element_form_default
                .as_deref()
                .unwrap_or(&self.config.element_form_default),
            source.version.as_deref().unwrap_or(&self.config.default_version),
        );
        if !plan.main_namespace.is_empty() {
            schema.declare_namespace(None, plan.main_namespace.as_str());
        }

        for side in &plan.sides {
            schema.declare_namespace(Some(side.prefix.as_str()), side.namespace.as_str());
            schema.add_child(import(&side.namespace, &side.file_name));
        }
        self.add_external_imports(&mut schema, plan, &usage.externals);

        for definition in definitions {
            schema.add_child(definition);
        }
        schema
    }

    fn add_external_imports(
        &self,
        schema: &mut Element,
        plan: &NamespacePlan,
        externals: &BTreeSet<String>,
    ) {
        for namespace in externals {
            let (Some(prefix), Some(foreign)) =
                (plan.externals.get(namespace), self.graph.foreign().get(namespace))
            else {
                continue;
            };
            if namespace.as_str() != XML_NS {
                schema.declare_namespace(Some(prefix.as_str()), namespace.as_str());
            }
            schema.add_child(import(namespace, &foreign.file_name()));
        }
    }

    /// Copy each used foreign schema next to the bundle under its bare file name.
    fn copy_externals(&self, externals: &BTreeSet<String>, output_dir: &Path) -> Vec<PathBuf> {
        let mut copied = Vec::new();
        for namespace in externals {
            let Some(foreign) = self.graph.foreign().get(namespace) else {
                continue;
            };
            let source = foreign.source_path();
            let destination = output_dir.join(foreign.file_name());
            if destination.exists() {
                debug!("External {} already present", destination.display());
                continue;
            }
            match fs::copy(&source, &destination) {
                Ok(_) => {
                    debug!("Copied external {} → {}", source.display(), destination.display());
                    copied.push(destination);
                }
                Err(e) => warn!(
                    "Could not copy external schema {} for {}: {}",
                    source.display(),
                    namespace,
                    e
                ),
            }
        }
        copied
    }

    fn write(&self, schema: Element, path: &Path) -> Result<()> {
        Document::new(schema).write_to_file(path, &self.config.write)?;
        Ok(())
    }
}

fn schema_root(target_namespace: &str, element_form_default: &str, version: &str) -> Element {
    let mut schema = Element::xsd("schema");
    schema.declare_namespace(Some("xs"), XSD_NS);
    if !target_namespace.is_empty() {
        schema.set_attribute("targetNamespace", target_namespace);
    }
    schema.set_attribute("elementFormDefault", element_form_default);
    schema.set_attribute("version", version);
    schema
}

fn import(namespace: &str, schema_location: &str) -> Element {
    Element::xsd("import")
        .with_attribute("namespace", namespace)
        .with_attribute("schemaLocation", schema_location)
}

//! Schema graph loader with import/include following

use std::path::{Path, PathBuf};

use ndc_xml::{Document, Element};
use tracing::{debug, info, trace, warn};

use crate::graph::{DuplicateDefinition, SchemaGraph};
use crate::model::{
    Definition, DefinitionKey, DefinitionKind, FileId, ImportDecl, ImportKind, PrefixMap,
    SchemaFile,
};
use crate::{Error, Result};

/// Default URI prefix shared by every IATA namespace
pub const IATA_NAMESPACE_PREFIX: &str = "http://www.iata.org";

/// Loader configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoaderConfig {
    /// Namespaces starting with this prefix belong to the project and are loaded;
    /// imports of any other namespace are tracked as foreign schemas
    pub project_namespace_prefix: String,
    /// Fail the load when two files declare the same key with different content
    pub strict_duplicates: bool,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            project_namespace_prefix: IATA_NAMESPACE_PREFIX.to_string(),
            strict_duplicates: false,
        }
    }
}

impl LoaderConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the project namespace prefix
    pub fn project_namespace_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.project_namespace_prefix = prefix.into();
        self
    }

    /// Enable or disable strict duplicate detection
    pub fn strict_duplicates(mut self, strict: bool) -> Self {
        self.strict_duplicates = strict;
        self
    }

    /// True when `namespace` belongs to the project's own namespace family
    pub fn is_project_namespace(&self, namespace: &str) -> bool {
        namespace.starts_with(&self.project_namespace_prefix)
    }
}

/// Loads XSD files into a [`SchemaGraph`], following imports and includes
#[derive(Debug, Clone, Default)]
pub struct SchemaGraphLoader {
    config: LoaderConfig,
}

impl SchemaGraphLoader {
    pub fn new(config: LoaderConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &LoaderConfig {
        &self.config
    }

    /// Build a fresh graph rooted at `root`
    pub fn load_graph(&self, root: &Path) -> Result<(SchemaGraph, FileId)> {
        let mut graph = SchemaGraph::new();
        let id = self.load_root(&mut graph, root)?;
        info!(
            "Loaded schema graph for {}: {} files, {} definitions, {} foreign namespaces",
            root.display(),
            graph.files().count(),
            graph.definition_table().len(),
            graph.foreign().len()
        );
        Ok((graph, id))
    }

    /// Load `path` into `graph`, failing if the file itself is unavailable
    pub fn load_root(&self, graph: &mut SchemaGraph, path: &Path) -> Result<FileId> {
        match self.load(graph, path)? {
            Some(id) => Ok(id),
            None => {
                let reason = graph
                    .failures()
                    .iter()
                    .rev()
                    .find(|f| f.path == path || canonical_or_same(path) == f.path)
                    .map(|f| f.reason.clone())
                    .unwrap_or_else(|| "schema could not be loaded".to_string());
                Err(Error::root_unavailable(path.display().to_string(), reason))
            }
        }
    }

    /// Load `path` and everything it imports into `graph`.
    ///
    /// Returns `Ok(None)` when the file cannot be read or parsed; the failure is
    /// logged and recorded on the graph. Loading the same canonical path again is
    /// a no-op that returns the existing id.
    pub fn load(&self, graph: &mut SchemaGraph, path: &Path) -> Result<Option<FileId>> {
        let canonical = match path.canonicalize() {
            Ok(p) => p,
            Err(e) => {
                if graph.mark_attempted(path) {
                    warn!("Cannot resolve schema path {}: {}", path.display(), e);
                    graph.record_failure(path, e.to_string());
                }
                return Ok(None);
            }
        };

        if !graph.mark_attempted(&canonical) {
            trace!("Already visited {}", canonical.display());
            return Ok(graph.file_id(&canonical));
        }

        let document = match Document::from_file(&canonical) {
            Ok(doc) => doc,
            Err(e) => {
                warn!("Error loading {}: {}", canonical.display(), e);
                graph.record_failure(&canonical, e.to_string());
                return Ok(None);
            }
        };

        if !document.root.is_xsd("schema") {
            warn!(
                "Skipping {}: root element is <{}>, not xs:schema",
                canonical.display(),
                document.root.qualified_name()
            );
            graph.record_failure(&canonical, "root element is not xs:schema");
            return Ok(None);
        }

        let (file, local_duplicates) = build_schema_file(canonical.clone(), &document.root);
        let imports = file.imports.clone();
        debug!(
            "Parsed {} (targetNamespace '{}', {} definitions, {} imports)",
            canonical.display(),
            file.target_namespace,
            file.keys().len(),
            imports.len()
        );

        let (id, conflicts) = graph.insert_file(file);
        for duplicate in local_duplicates.into_iter().chain(conflicts) {
            self.report_duplicate(graph, duplicate)?;
        }

        let base_dir = canonical.parent().unwrap_or(Path::new(".")).to_path_buf();
        for import in imports {
            let Some(location) = import.schema_location.as_deref() else {
                trace!("{:?} without schemaLocation in {}", import.kind, canonical.display());
                continue;
            };

            if let Some(namespace) = import.namespace.as_deref() {
                if !self.config.is_project_namespace(namespace) {
                    if graph.foreign_mut().record(namespace, location, &canonical) {
                        debug!("Tracking foreign schema {} at {}", namespace, location);
                    }
                    continue;
                }
            }

            self.load(graph, &base_dir.join(location))?;
        }

        Ok(Some(id))
    }

    fn report_duplicate(&self, graph: &mut SchemaGraph, duplicate: DuplicateDefinition) -> Result<()> {
        warn!(
            "Duplicate definition {} with different content: {} replaced by {}",
            duplicate.key,
            duplicate.first.display(),
            duplicate.second.display()
        );
        if self.config.strict_duplicates {
            return Err(Error::duplicate_definition(
                duplicate.key.to_string(),
                duplicate.first.display().to_string(),
                duplicate.second.display().to_string(),
            ));
        }
        graph.record_duplicate(duplicate);
        Ok(())
    }
}

fn canonical_or_same(path: &Path) -> PathBuf {
    path.canonicalize().unwrap_or_else(|_| path.to_path_buf())
}

/// Index a schema root. Also returns same-file key collisions (e.g. an element
/// and a complex type sharing a name).
fn build_schema_file(path: PathBuf, root: &Element) -> (SchemaFile, Vec<DuplicateDefinition>) {
    let target_namespace = root.attribute("targetNamespace").unwrap_or_default().to_string();

    let mut prefixes = PrefixMap::new();
    for decl in &root.namespaces {
        prefixes.insert(decl.prefix.as_deref(), decl.uri.clone());
    }

    let mut file = SchemaFile::new(path, target_namespace.clone(), prefixes);
    file.version = root.attribute("version").map(str::to_string);
    file.element_form_default = root.attribute("elementFormDefault").map(str::to_string);

    let mut duplicates = Vec::new();
    for child in root.child_elements() {
        if child.namespace.as_deref() != Some(ndc_xml::XSD_NS) {
            continue;
        }

        if let Some(kind) = DefinitionKind::from_local_name(&child.name) {
            let Some(name) = child.attribute("name") else {
                continue;
            };
            let definition = Definition {
                key: DefinitionKey::new(target_namespace.clone(), name),
                kind,
                node: child.clone(),
            };
            if let Some(previous) = file.add_definition(definition) {
                if &previous.node != child {
                    duplicates.push(DuplicateDefinition {
                        key: previous.key,
                        first: file.path.clone(),
                        second: file.path.clone(),
                    });
                }
            }
            continue;
        }

        let kind = match child.name.as_str() {
            "import" => ImportKind::Import,
            "include" => ImportKind::Include,
            _ => continue,
        };
        file.imports.push(ImportDecl {
            kind,
            namespace: child.attribute("namespace").map(str::to_string),
            schema_location: child.attribute("schemaLocation").map(str::to_string),
        });
    }

    (file, duplicates)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    const MAIN_NS: &str = "http://www.iata.org/IATA/2015/EASD/00/IATA_OffersAndOrdersMessage";
    const COMMON_NS: &str = "http://www.iata.org/IATA/2015/EASD/00/IATA_OffersAndOrdersCommonTypes";

    fn write(dir: &Path, name: &str, content: &str) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, content).unwrap();
        path
    }

    fn main_schema() -> String {
        format!(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema" xmlns="{MAIN_NS}"
           xmlns:cns="{COMMON_NS}" xmlns:ds="http://www.w3.org/2000/09/xmldsig#"
           targetNamespace="{MAIN_NS}" elementFormDefault="qualified" version="7.000">
  <xs:import namespace="{COMMON_NS}" schemaLocation="Common.xsd"/>
  <xs:import namespace="http://www.w3.org/2000/09/xmldsig#" schemaLocation="xmldsig-core-schema.xsd"/>
  <xs:element name="IATA_Msg" type="IATA_MsgType"/>
  <xs:complexType name="IATA_MsgType">
    <xs:sequence>
      <xs:element name="Error" type="cns:ErrorType"/>
    </xs:sequence>
  </xs:complexType>
</xs:schema>"#
        )
    }

    fn common_schema() -> String {
        format!(
            r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema" xmlns:cns="{COMMON_NS}"
           targetNamespace="{COMMON_NS}">
  <xs:include schemaLocation="Main.xsd"/>
  <xs:complexType name="ErrorType"><xs:sequence/></xs:complexType>
  <xs:simpleType name="CodeType"><xs:restriction base="xs:token"/></xs:simpleType>
</xs:schema>"#
        )
    }

    #[test]
    fn test_load_follows_imports_and_tracks_foreign() {
        let dir = TempDir::new().unwrap();
        let main = write(dir.path(), "Main.xsd", &main_schema());
        write(dir.path(), "Common.xsd", &common_schema());

        let loader = SchemaGraphLoader::default();
        let (graph, id) = loader.load_graph(&main).unwrap();

        assert_eq!(graph.files().count(), 2);
        let file = graph.file(id);
        assert_eq!(file.target_namespace, MAIN_NS);
        assert_eq!(file.version.as_deref(), Some("7.000"));
        assert_eq!(file.prefixes.get("cns"), Some(COMMON_NS));
        assert_eq!(file.prefixes.default_namespace(), Some(MAIN_NS));

        assert!(graph.contains(&DefinitionKey::new(COMMON_NS, "ErrorType")));
        assert!(graph.contains(&DefinitionKey::new(MAIN_NS, "IATA_Msg")));
        assert_eq!(graph.definition_table().len(), 4);

        let foreign = graph.foreign().get("http://www.w3.org/2000/09/xmldsig#").unwrap();
        assert_eq!(foreign.location, "xmldsig-core-schema.xsd");
        assert!(graph.failures().is_empty());
    }

    #[test]
    fn test_load_is_idempotent_per_path() {
        let dir = TempDir::new().unwrap();
        let main = write(dir.path(), "Main.xsd", &main_schema());
        write(dir.path(), "Common.xsd", &common_schema());

        let loader = SchemaGraphLoader::default();
        let mut graph = SchemaGraph::new();
        let first = loader.load(&mut graph, &main).unwrap();
        let second = loader.load(&mut graph, &dir.path().join("./Main.xsd")).unwrap();

        assert_eq!(first, second);
        assert_eq!(graph.files().count(), 2);
    }

    #[test]
    fn test_parse_failure_is_recorded_not_fatal() {
        let dir = TempDir::new().unwrap();
        let main = write(dir.path(), "Main.xsd", &main_schema());
        write(dir.path(), "Common.xsd", "<xs:schema><broken>");

        let loader = SchemaGraphLoader::default();
        let (graph, _) = loader.load_graph(&main).unwrap();

        assert_eq!(graph.files().count(), 1);
        assert_eq!(graph.failures().len(), 1);
        assert!(graph.failures()[0].path.ends_with("Common.xsd"));
        assert!(!graph.contains(&DefinitionKey::new(COMMON_NS, "ErrorType")));
    }

    #[test]
    fn test_missing_root_is_an_error() {
        let dir = TempDir::new().unwrap();
        let loader = SchemaGraphLoader::default();
        let result = loader.load_graph(&dir.path().join("Nope.xsd"));

        match result {
            Err(Error::RootUnavailable { path, .. }) => assert!(path.ends_with("Nope.xsd")),
            other => panic!("Expected RootUnavailable, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_non_schema_root_is_a_failure() {
        let dir = TempDir::new().unwrap();
        let path = write(dir.path(), "NotSchema.xsd", "<root/>");
        let loader = SchemaGraphLoader::default();

        assert!(loader.load_graph(&path).is_err());
    }

    fn conflicting_pair(dir: &Path) -> PathBuf {
        write(
            dir,
            "A.xsd",
            &format!(
                r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema" targetNamespace="{COMMON_NS}">
  <xs:include schemaLocation="B.xsd"/>
  <xs:simpleType name="CodeType"><xs:restriction base="xs:string"/></xs:simpleType>
</xs:schema>"#
            ),
        );
        write(
            dir,
            "B.xsd",
            &format!(
                r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema" targetNamespace="{COMMON_NS}">
  <xs:simpleType name="CodeType"><xs:restriction base="xs:token"/></xs:simpleType>
</xs:schema>"#
            ),
        );
        dir.join("A.xsd")
    }

    #[test]
    fn test_duplicate_definition_last_wins() {
        let dir = TempDir::new().unwrap();
        let a = conflicting_pair(dir.path());

        let (graph, _) = SchemaGraphLoader::default().load_graph(&a).unwrap();
        assert_eq!(graph.duplicates().len(), 1);

        let key = DefinitionKey::new(COMMON_NS, "CodeType");
        let winner = graph.definition(&key).unwrap();
        assert!(winner.origin.path.ends_with("B.xsd"));
    }

    #[test]
    fn test_duplicate_definition_strict_mode_fails() {
        let dir = TempDir::new().unwrap();
        let a = conflicting_pair(dir.path());

        let loader = SchemaGraphLoader::new(LoaderConfig::new().strict_duplicates(true));
        match loader.load_graph(&a) {
            Err(Error::DuplicateDefinition { key, .. }) => assert!(key.ends_with("CodeType")),
            other => panic!("Expected DuplicateDefinition, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_custom_project_prefix_treats_iata_as_foreign() {
        let dir = TempDir::new().unwrap();
        let main = write(dir.path(), "Main.xsd", &main_schema());
        write(dir.path(), "Common.xsd", &common_schema());

        let loader = SchemaGraphLoader::new(LoaderConfig::new().project_namespace_prefix("urn:other"));
        let (graph, _) = loader.load_graph(&main).unwrap();

        assert_eq!(graph.files().count(), 1);
        assert!(graph.foreign().contains(COMMON_NS));
    }
}

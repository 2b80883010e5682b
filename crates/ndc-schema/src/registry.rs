//! Definition and foreign-schema registries for a single graph build

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

use crate::model::{DefinitionKey, FileId};

/// Global definition table: key → file that (last) declared it
#[derive(Debug, Default)]
pub struct DefinitionTable {
    entries: HashMap<DefinitionKey, FileId>,
}

impl DefinitionTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `key` as declared by `origin`; returns the previous origin
    pub fn insert(&mut self, key: DefinitionKey, origin: FileId) -> Option<FileId> {
        self.entries.insert(key, origin)
    }

    /// Origin file of a key
    pub fn origin(&self, key: &DefinitionKey) -> Option<FileId> {
        self.entries.get(key).copied()
    }

    pub fn contains(&self, key: &DefinitionKey) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &DefinitionKey> {
        self.entries.keys()
    }
}

/// A non-project schema tracked for verbatim copy
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForeignSchema {
    /// Namespace the import targeted
    pub namespace: String,
    /// `schemaLocation` exactly as written in the import
    pub location: String,
    /// Canonical path of the file that declared the import
    pub declared_in: PathBuf,
}

impl ForeignSchema {
    /// Location resolved against the declaring file's directory
    pub fn source_path(&self) -> PathBuf {
        self.declared_in
            .parent()
            .unwrap_or(Path::new("."))
            .join(&self.location)
    }

    /// Bare file name used when the schema is copied next to a bundle
    pub fn file_name(&self) -> String {
        Path::new(&self.location)
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or(&self.location)
            .to_string()
    }
}

/// Foreign-schema table: namespace → first import seen for it
#[derive(Debug, Default)]
pub struct ForeignSchemas {
    schemas: BTreeMap<String, ForeignSchema>,
}

impl ForeignSchemas {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an import; the first location seen for a namespace wins.
    /// Returns true if the namespace was new.
    pub fn record(
        &mut self,
        namespace: impl Into<String>,
        location: impl Into<String>,
        declared_in: impl Into<PathBuf>,
    ) -> bool {
        let namespace = namespace.into();
        if self.schemas.contains_key(&namespace) {
            return false;
        }
        self.schemas.insert(
            namespace.clone(),
            ForeignSchema {
                namespace,
                location: location.into(),
                declared_in: declared_in.into(),
            },
        );
        true
    }

    pub fn get(&self, namespace: &str) -> Option<&ForeignSchema> {
        self.schemas.get(namespace)
    }

    pub fn contains(&self, namespace: &str) -> bool {
        self.schemas.contains_key(namespace)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ForeignSchema> {
        self.schemas.values()
    }

    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_definition_table_last_wins() {
        let mut table = DefinitionTable::new();
        let key = DefinitionKey::new("urn:a", "Foo");

        assert_eq!(table.insert(key.clone(), FileId(0)), None);
        assert_eq!(table.insert(key.clone(), FileId(3)), Some(FileId(0)));
        assert_eq!(table.origin(&key), Some(FileId(3)));
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_foreign_first_location_wins() {
        let mut foreign = ForeignSchemas::new();
        let ns = "http://www.w3.org/2000/09/xmldsig#";

        assert!(foreign.record(ns, "xmldsig-core-schema.xsd", "/schemas/a/Common.xsd"));
        assert!(!foreign.record(ns, "other.xsd", "/schemas/b/Other.xsd"));

        let schema = foreign.get(ns).unwrap();
        assert_eq!(schema.location, "xmldsig-core-schema.xsd");
        assert_eq!(
            schema.source_path(),
            PathBuf::from("/schemas/a/xmldsig-core-schema.xsd")
        );
    }

    #[test]
    fn test_foreign_file_name_strips_directories() {
        let schema = ForeignSchema {
            namespace: "urn:x".to_string(),
            location: "../ext/xmldsig.xsd".to_string(),
            declared_in: PathBuf::from("/s/v1/Common.xsd"),
        };
        assert_eq!(schema.file_name(), "xmldsig.xsd");
        assert_eq!(schema.source_path(), PathBuf::from("/s/v1/../ext/xmldsig.xsd"));
    }
}

//! The per-run schema graph context

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use ndc_xml::Element;

use crate::model::{Definition, DefinitionKey, DefinitionKind, FileId, SchemaFile};
use crate::registry::{DefinitionTable, ForeignSchemas};

/// A schema file that could not be loaded
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadFailure {
    pub path: PathBuf,
    pub reason: String,
}

/// Two declarations of the same key with different content
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DuplicateDefinition {
    pub key: DefinitionKey,
    /// File whose declaration was replaced
    pub first: PathBuf,
    /// File whose declaration won
    pub second: PathBuf,
}

/// A resolved view of one definition and the file that declared it
#[derive(Debug, Clone, Copy)]
pub struct DefinitionRef<'g> {
    pub origin_id: FileId,
    pub origin: &'g SchemaFile,
    pub definition: &'g Definition,
}

impl<'g> DefinitionRef<'g> {
    pub fn key(&self) -> &'g DefinitionKey {
        &self.definition.key
    }

    pub fn kind(&self) -> DefinitionKind {
        self.definition.kind
    }

    pub fn node(&self) -> &'g Element {
        &self.definition.node
    }
}

/// Everything accumulated while loading one root schema and its imports.
///
/// Built fresh for each flattening run and borrowed by the analysis and
/// emission stages; nothing in here is shared between runs.
#[derive(Debug, Default)]
pub struct SchemaGraph {
    files: Vec<SchemaFile>,
    by_path: HashMap<PathBuf, FileId>,
    attempted: HashSet<PathBuf>,
    definitions: DefinitionTable,
    foreign: ForeignSchemas,
    failures: Vec<LoadFailure>,
    duplicates: Vec<DuplicateDefinition>,
}

impl SchemaGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// File by id
    pub fn file(&self, id: FileId) -> &SchemaFile {
        &self.files[id.0]
    }

    /// All loaded files in load order
    pub fn files(&self) -> impl Iterator<Item = (FileId, &SchemaFile)> {
        self.files.iter().enumerate().map(|(i, f)| (FileId(i), f))
    }

    /// Id of a loaded file by canonical path
    pub fn file_id(&self, canonical_path: &Path) -> Option<FileId> {
        self.by_path.get(canonical_path).copied()
    }

    /// Resolve a key through the global table
    pub fn definition(&self, key: &DefinitionKey) -> Option<DefinitionRef<'_>> {
        let origin_id = self.definitions.origin(key)?;
        let origin = self.file(origin_id);
        let definition = origin.definition(key)?;
        Some(DefinitionRef {
            origin_id,
            origin,
            definition,
        })
    }

    /// True when the global table knows `key`
    pub fn contains(&self, key: &DefinitionKey) -> bool {
        self.definitions.contains(key)
    }

    pub fn definition_table(&self) -> &DefinitionTable {
        &self.definitions
    }

    pub fn foreign(&self) -> &ForeignSchemas {
        &self.foreign
    }

    pub fn failures(&self) -> &[LoadFailure] {
        &self.failures
    }

    pub fn duplicates(&self) -> &[DuplicateDefinition] {
        &self.duplicates
    }

    pub(crate) fn mark_attempted(&mut self, path: &Path) -> bool {
        self.attempted.insert(path.to_path_buf())
    }

    pub(crate) fn record_failure(&mut self, path: &Path, reason: impl Into<String>) {
        self.failures.push(LoadFailure {
            path: path.to_path_buf(),
            reason: reason.into(),
        });
    }

    pub(crate) fn record_duplicate(&mut self, duplicate: DuplicateDefinition) {
        self.duplicates.push(duplicate);
    }

    pub(crate) fn foreign_mut(&mut self) -> &mut ForeignSchemas {
        &mut self.foreign
    }

    /// Add a parsed file. Returns its id plus the keys whose previous owner
    /// declared different content.
    pub(crate) fn insert_file(&mut self, file: SchemaFile) -> (FileId, Vec<DuplicateDefinition>) {
        let id = FileId(self.files.len());
        let mut conflicts = Vec::new();

        for definition in file.definitions() {
            let Some(previous) = self.definitions.origin(&definition.key) else {
                continue;
            };
            let previous_file = self.file(previous);
            let same = previous_file
                .definition(&definition.key)
                .is_some_and(|existing| existing.node == definition.node);
            if !same {
                conflicts.push(DuplicateDefinition {
                    key: definition.key.clone(),
                    first: previous_file.path.clone(),
                    second: file.path.clone(),
                });
            }
        }

        for key in file.keys() {
            self.definitions.insert(key.clone(), id);
        }
        self.by_path.insert(file.path.clone(), id);
        self.files.push(file);
        (id, conflicts)
    }
}

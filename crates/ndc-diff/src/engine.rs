//! Cross-version diff engine

use std::collections::BTreeSet;

use ndc_catalog::SchemaCatalog;
use tracing::{debug, info};

use crate::report::{DiffItem, MessageDiff, MessageStatus};
use crate::tree::{FlatTree, StructuralFlattener};
use crate::{Error, Result};

/// Paths only in `new` are ADDED, paths only in `old` are REMOVED; shared
/// paths yield MODIFIED and DOC_CHANGED independently.
pub fn diff_trees(old: &FlatTree, new: &FlatTree) -> Vec<DiffItem> {
    let mut items = Vec::new();

    for (path, after) in new.iter() {
        match old.get(path) {
            None => items.push(DiffItem::added(path, &after.name, after.documentation.clone())),
            Some(before) => {
                if before.type_name != after.type_name {
                    items.push(DiffItem::type_changed(
                        path,
                        before.type_name.clone(),
                        after.type_name.clone(),
                    ));
                }
                if before.documentation != after.documentation {
                    items.push(DiffItem::doc_changed(
                        path,
                        before.documentation.clone(),
                        after.documentation.clone(),
                    ));
                }
            }
        }
    }

    for (path, before) in old.iter() {
        if !new.contains(path) {
            items.push(DiffItem::removed(path, &before.name, before.documentation.clone()));
        }
    }
    items
}

/// Compares messages of two catalogued versions.
///
/// Every comparison flattens from scratch; nothing is cached between calls.
pub struct DiffEngine<'c> {
    catalog: &'c dyn SchemaCatalog,
    flattener: StructuralFlattener,
}

impl<'c> DiffEngine<'c> {
    pub fn new(catalog: &'c dyn SchemaCatalog) -> Self {
        Self::with_flattener(catalog, StructuralFlattener::default())
    }

    pub fn with_flattener(catalog: &'c dyn SchemaCatalog, flattener: StructuralFlattener) -> Self {
        Self { catalog, flattener }
    }

    /// Diff every message in the union of both versions, sorted by name.
    ///
    /// Unchanged messages are omitted. Fails when either version is unknown
    /// or a message present in both cannot be flattened.
    pub fn compare_versions(&self, from: &str, to: &str) -> Result<Vec<MessageDiff>> {
        self.ensure_version(from)?;
        self.ensure_version(to)?;

        let messages: BTreeSet<String> = self
            .catalog
            .messages(from)
            .into_iter()
            .chain(self.catalog.messages(to))
            .collect();
        info!("Comparing {} messages between {} and {}", messages.len(), from, to);

        let mut diffs = Vec::new();
        for message in &messages {
            let diff = self.compare(from, to, message)?;
            if diff.status != MessageStatus::Unchanged {
                diffs.push(diff);
            }
        }
        Ok(diffs)
    }

    /// Diff one message; an unchanged message is reported as UNCHANGED.
    pub fn compare_message(&self, from: &str, to: &str, message: &str) -> Result<MessageDiff> {
        self.ensure_version(from)?;
        self.ensure_version(to)?;
        self.compare(from, to, message)
    }

    /// Flatten one message of one version
    pub fn flatten_message(&self, version: &str, message: &str) -> Result<FlatTree> {
        let path = self
            .catalog
            .resolve_schema_file(version, message)
            .ok_or_else(|| Error::flatten(version, message, "not found in catalog"))?;
        self.flattener
            .flatten(&path)
            .map_err(|e| Error::flatten(version, message, e.to_string()))
    }

    fn compare(&self, from: &str, to: &str, message: &str) -> Result<MessageDiff> {
        let in_from = self.catalog.resolve_schema_file(from, message).is_some();
        let in_to = self.catalog.resolve_schema_file(to, message).is_some();

        match (in_from, in_to) {
            (false, false) => Err(Error::MessageNotFound {
                message: message.to_string(),
                from: from.to_string(),
                to: to.to_string(),
            }),
            (false, true) => Ok(MessageDiff::new(message, MessageStatus::Added)),
            (true, false) => Ok(MessageDiff::new(message, MessageStatus::Removed)),
            (true, true) => {
                let old = self.flatten_message(from, message)?;
                let new = self.flatten_message(to, message)?;
                let differences = diff_trees(&old, &new);
                debug!("{}: {} differences", message, differences.len());

                let status = if differences.is_empty() {
                    MessageStatus::Unchanged
                } else {
                    MessageStatus::Changed
                };
                Ok(MessageDiff {
                    message_name: message.to_string(),
                    differences,
                    status,
                })
            }
        }
    }

    fn ensure_version(&self, version: &str) -> Result<()> {
        if self.catalog.has_version(version) {
            Ok(())
        } else {
            Err(Error::VersionNotFound(version.to_string()))
        }
    }
}

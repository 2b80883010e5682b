//! Version/message catalog over a directory of raw schema folders

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use ndc_xml::XSD_NS;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, trace, warn};

use crate::{Error, Result};

/// Catalog lookups consumed by flattening and diffing
pub trait SchemaCatalog: Send + Sync {
    /// Catalogued versions, sorted
    fn versions(&self) -> Vec<String>;

    /// Messages available in `version`, sorted
    fn messages(&self, version: &str) -> Vec<String>;

    /// Root schema file of `message` in `version`
    fn resolve_schema_file(&self, version: &str, message: &str) -> Option<PathBuf>;

    fn has_version(&self, version: &str) -> bool {
        self.versions().iter().any(|v| v == version)
    }
}

/// Message list file: `{"versions": {"24.1": ["IATA_OrderViewRS", ...]}}`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageList {
    #[serde(default)]
    pub versions: BTreeMap<String, Vec<String>>,
}

impl MessageList {
    /// Load from JSON, or YAML when the extension says so
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .map_err(|e| Error::io(path.display().to_string(), e.to_string()))?;
        let is_yaml = path
            .extension()
            .map(|e| e == "yaml" || e == "yml")
            .unwrap_or(false);

        if is_yaml {
            serde_yaml::from_str(&content)
                .map_err(|e| Error::invalid_message_list(path.display().to_string(), e.to_string()))
        } else {
            serde_json::from_str(&content)
                .map_err(|e| Error::invalid_message_list(path.display().to_string(), e.to_string()))
        }
    }

    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| Error::invalid_message_list("<inline>", e.to_string()))
    }

    /// Message names for `version`, without any `.xsd` suffix
    pub fn messages(&self, version: &str) -> Vec<String> {
        self.versions
            .get(version)
            .map(|messages| messages.iter().map(|m| message_name(m).to_string()).collect())
            .unwrap_or_default()
    }
}

fn message_name(entry: &str) -> &str {
    let entry = entry.trim();
    entry.strip_suffix(".xsd").unwrap_or(entry)
}

/// True when a folder named `folder` holds schemas for `version`
fn folder_matches(folder: &str, version: &str) -> bool {
    folder == version
        || folder
            .strip_prefix(version)
            .is_some_and(|rest| rest.starts_with('.') || rest.starts_with('_'))
}

/// Find the folder under `root` for `version`: an exact name match wins,
/// otherwise the first folder (by name) starting with `<version>.` or `<version>_`.
pub fn find_version_folder(root: &Path, version: &str) -> Option<PathBuf> {
    let exact = root.join(version);
    if exact.is_dir() {
        return Some(exact);
    }

    let mut folders = subdirectories(root).ok()?;
    folders.sort();
    folders
        .into_iter()
        .find(|(name, _)| folder_matches(name, version))
        .map(|(_, path)| path)
}

fn subdirectories(root: &Path) -> Result<Vec<(String, PathBuf)>> {
    let entries =
        fs::read_dir(root).map_err(|e| Error::io(root.display().to_string(), e.to_string()))?;
    let mut folders = Vec::new();
    for entry in entries.flatten() {
        let path = entry.path();
        if !path.is_dir() {
            continue;
        }
        if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
            folders.push((name.to_string(), path.clone()));
        }
    }
    Ok(folders)
}

#[derive(Debug, Clone, Default)]
struct CatalogVersion {
    folder: PathBuf,
    messages: BTreeMap<String, PathBuf>,
}

/// Catalog built from the filesystem once, read-only afterwards
#[derive(Debug, Clone, Default)]
pub struct FsCatalog {
    root: PathBuf,
    versions: BTreeMap<String, CatalogVersion>,
}

impl FsCatalog {
    /// Build from a message list when given one, otherwise by scanning `root`.
    pub fn open(root: &Path, message_list: Option<&Path>) -> Result<Self> {
        match message_list {
            Some(path) => Self::from_message_list(root, &MessageList::from_file(path)?),
            None => Self::scan(root),
        }
    }

    /// Catalog exactly the versions and messages named in `list`.
    ///
    /// Versions without a matching folder and messages without a root file
    /// are skipped with a warning.
    pub fn from_message_list(root: &Path, list: &MessageList) -> Result<Self> {
        ensure_dir(root)?;
        let mut versions = BTreeMap::new();

        for version in list.versions.keys() {
            let Some(folder) = find_version_folder(root, version) else {
                warn!("Skipping version {}: no matching folder in {}", version, root.display());
                continue;
            };
            debug!("Version {} → {}", version, folder.display());

            let mut messages = BTreeMap::new();
            for message in list.messages(version) {
                let path = folder.join(format!("{}.xsd", message));
                if path.is_file() {
                    messages.insert(message, path);
                } else {
                    warn!("Skipping {} in version {}: {} not found", message, version, path.display());
                }
            }
            versions.insert(version.clone(), CatalogVersion { folder, messages });
        }

        info!("Catalogued {} versions from message list", versions.len());
        Ok(Self {
            root: root.to_path_buf(),
            versions,
        })
    }

    /// Catalog every subfolder of `root` as a version; a top-level `*.xsd`
    /// file is a message when it declares a global element named after itself.
    pub fn scan(root: &Path) -> Result<Self> {
        ensure_dir(root)?;
        let mut versions = BTreeMap::new();

        for (name, folder) in subdirectories(root)? {
            let messages = scan_messages(&folder)?;
            debug!("Scanned version {}: {} messages", name, messages.len());
            versions.insert(name, CatalogVersion { folder, messages });
        }

        info!("Catalogued {} versions by scanning {}", versions.len(), root.display());
        Ok(Self {
            root: root.to_path_buf(),
            versions,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Folder holding the raw schemas of `version`
    pub fn version_folder(&self, version: &str) -> Option<&Path> {
        self.entry(version).map(|v| v.folder.as_path())
    }

    /// Exact key first, then a catalogued folder name such as `24.1_ndc` for `24.1`
    fn entry(&self, version: &str) -> Option<&CatalogVersion> {
        self.versions.get(version).or_else(|| {
            self.versions
                .iter()
                .find(|(name, _)| folder_matches(name, version))
                .map(|(_, entry)| entry)
        })
    }
}

impl SchemaCatalog for FsCatalog {
    fn versions(&self) -> Vec<String> {
        self.versions.keys().cloned().collect()
    }

    fn messages(&self, version: &str) -> Vec<String> {
        self.entry(version)
            .map(|v| v.messages.keys().cloned().collect())
            .unwrap_or_default()
    }

    fn resolve_schema_file(&self, version: &str, message: &str) -> Option<PathBuf> {
        self.entry(version)?.messages.get(message_name(message)).cloned()
    }

    fn has_version(&self, version: &str) -> bool {
        self.entry(version).is_some()
    }
}

fn ensure_dir(root: &Path) -> Result<()> {
    if root.is_dir() {
        Ok(())
    } else {
        Err(Error::RootNotFound(root.display().to_string()))
    }
}

fn scan_messages(folder: &Path) -> Result<BTreeMap<String, PathBuf>> {
    let entries =
        fs::read_dir(folder).map_err(|e| Error::io(folder.display().to_string(), e.to_string()))?;
    let mut messages = BTreeMap::new();

    for entry in entries.flatten() {
        let path = entry.path();
        if !path.is_file() || path.extension().is_none_or(|e| e != "xsd") {
            continue;
        }
        let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
            continue;
        };
        if declares_element(&path, stem) {
            messages.insert(stem.to_string(), path.clone());
        } else {
            trace!("{} is not a message root", path.display());
        }
    }
    Ok(messages)
}

/// True when the schema at `path` declares a global element named `name`
fn declares_element(path: &Path, name: &str) -> bool {
    let Ok(text) = fs::read_to_string(path) else {
        return false;
    };
    let options = roxmltree::ParsingOptions {
        allow_dtd: true,
        ..Default::default()
    };
    let Ok(document) = roxmltree::Document::parse_with_options(&text, options) else {
        debug!("Unparseable schema {} skipped during scan", path.display());
        return false;
    };
    document.root_element().children().any(|child| {
        child.tag_name().namespace() == Some(XSD_NS)
            && child.tag_name().name() == "element"
            && child.attribute("name") == Some(name)
    })
}

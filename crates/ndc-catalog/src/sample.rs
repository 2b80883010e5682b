//! Identification of sample messages against the bundle layout
//!
//! A sample message names its schema through `xsi:schemaLocation`, e.g.
//! `... https://example.org/xsd/2136/IATA_OrderViewRS.xsd`. The numeric id is
//! mapped to a catalog version so the sample can be checked against the
//! flattened bundle for that version.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;
use tracing::debug;

use crate::layout::bundle_path;
use crate::{Error, Result};

const XSI_NS: &str = "http://www.w3.org/2001/XMLSchema-instance";

/// Schema id as published in sample URLs → catalog version
pub const VERSION_MAP: [(&str, &str); 6] = [
    ("2134", "21.3.5"),
    ("2135", "21.3.5"),
    ("2136", "24.1"),
    ("243", "24.3"),
    ("244", "24.4"),
    ("245", "25.4"),
];

static SCHEMA_LOCATION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"xsd/(\d+)/(\w+\.xsd)").expect("valid schema location pattern"));

/// Catalog version for a schema id; unknown ids pass through unchanged
pub fn map_schema_id(id: &str) -> String {
    VERSION_MAP
        .iter()
        .find(|(known, _)| *known == id)
        .map(|(_, version)| version.to_string())
        .unwrap_or_else(|| id.to_string())
}

/// What a sample message declares about itself
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SampleIdentity {
    /// Local name of the document element
    pub root_element: String,
    pub schema_id: Option<String>,
    /// Schema file name from the location, e.g. `IATA_OrderViewRS.xsd`
    pub schema_file: Option<String>,
    pub version: Option<String>,
}

impl SampleIdentity {
    /// Message name: the schema file stem, else the root element name
    pub fn message(&self) -> String {
        self.schema_file
            .as_deref()
            .and_then(|f| f.strip_suffix(".xsd"))
            .map(str::to_string)
            .unwrap_or_else(|| self.root_element.clone())
    }

    /// Bundle the sample should validate against, when its version is known
    pub fn bundle_path(&self, output_root: &Path) -> Option<PathBuf> {
        let version = self.version.as_deref()?;
        Some(bundle_path(output_root, version, &self.message()))
    }
}

/// Identify the sample message at `path`
pub fn identify_sample(path: &Path) -> Result<SampleIdentity> {
    let text = fs::read_to_string(path).map_err(|e| Error::Sample {
        path: path.display().to_string(),
        message: e.to_string(),
    })?;
    identify_sample_text(&text, &path.display().to_string())
}

/// Identify a sample message given as text
pub fn identify_sample_text(text: &str, source_name: &str) -> Result<SampleIdentity> {
    let options = roxmltree::ParsingOptions {
        allow_dtd: true,
        ..Default::default()
    };
    let document = roxmltree::Document::parse_with_options(text, options).map_err(|e| Error::Sample {
        path: source_name.to_string(),
        message: e.to_string(),
    })?;
    let root = document.root_element();

    let captures = root
        .attribute((XSI_NS, "schemaLocation"))
        .and_then(|location| SCHEMA_LOCATION.captures(location));
    let (schema_id, schema_file) = match captures {
        Some(captures) => (
            captures.get(1).map(|m| m.as_str().to_string()),
            captures.get(2).map(|m| m.as_str().to_string()),
        ),
        None => (None, None),
    };
    let version = schema_id.as_deref().map(map_schema_id);

    debug!(
        "Sample {}: root {}, schema id {:?}, version {:?}",
        source_name,
        root.tag_name().name(),
        schema_id,
        version
    );

    Ok(SampleIdentity {
        root_element: root.tag_name().name().to_string(),
        schema_id,
        schema_file,
        version,
    })
}

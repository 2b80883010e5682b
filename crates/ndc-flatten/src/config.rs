//! Emission settings

use ndc_xml::WriteOptions;

/// Settings controlling how a bundle is written
#[derive(Debug, Clone)]
pub struct EmitConfig {
    /// Substring of a namespace URI that marks a fully-optional variant
    pub optional_marker: String,
    /// Prefix side files use to refer to the main namespace
    pub main_alias: String,
    /// Stem for synthesized side-namespace prefixes (`cns0`, `cns1`, ...)
    pub synthetic_prefix: String,
    /// Stem for synthesized foreign-namespace prefixes
    pub external_synthetic_prefix: String,
    /// `elementFormDefault` for side files, and for the main file when the
    /// source does not declare one
    pub element_form_default: String,
    /// Version stamped on side files, and on the main file when the source
    /// does not declare one
    pub default_version: String,
    /// Whether to copy referenced foreign schemas next to the bundle
    pub copy_externals: bool,
    pub write: WriteOptions,
}

impl Default for EmitConfig {
    fn default() -> Self {
        Self {
            optional_marker: "FullyOptional".to_string(),
            main_alias: "msg".to_string(),
            synthetic_prefix: "cns".to_string(),
            external_synthetic_prefix: "ext".to_string(),
            element_form_default: "qualified".to_string(),
            default_version: "1.0".to_string(),
            copy_externals: true,
            write: WriteOptions::default(),
        }
    }
}

impl EmitConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn main_alias(mut self, alias: impl Into<String>) -> Self {
        self.main_alias = alias.into();
        self
    }

    pub fn copy_externals(mut self, copy: bool) -> Self {
        self.copy_externals = copy;
        self
    }
}

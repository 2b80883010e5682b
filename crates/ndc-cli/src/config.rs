//! Engine configuration file (`--config`)

use std::fs;
use std::path::{Path, PathBuf};

use ndc_diff::TreeConfig;
use ndc_flatten::BatchConfig;
use ndc_schema::LoaderConfig;
use serde::Deserialize;
use thiserror::Error;

/// Errors reading a configuration file
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {message}")]
    Read { path: String, message: String },

    #[error("Invalid config {path}: {message}")]
    Invalid { path: String, message: String },
}

/// Settings shared by every command; command-line flags take precedence.
///
/// ```yaml
/// schemas_dir: raw_schemas
/// output_dir: flattened
/// message_list: messages.json
/// max_depth: 48
/// concurrency: 8
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    pub schemas_dir: Option<PathBuf>,
    pub output_dir: Option<PathBuf>,
    pub message_list: Option<PathBuf>,
    pub project_namespace_prefix: Option<String>,
    pub strict_duplicates: Option<bool>,
    pub max_depth: Option<usize>,
    pub concurrency: Option<usize>,
}

impl EngineConfig {
    /// Load from YAML, or JSON when the extension is `.json`.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;

        let is_json = path.extension().is_some_and(|e| e.eq_ignore_ascii_case("json"));
        let parsed = if is_json {
            serde_json::from_str(&content).map_err(|e| e.to_string())
        } else {
            serde_yaml::from_str(&content).map_err(|e| e.to_string())
        };
        parsed.map_err(|message| ConfigError::Invalid {
            path: path.display().to_string(),
            message,
        })
    }

    pub fn loader_config(&self) -> LoaderConfig {
        let mut config = LoaderConfig::default();
        if let Some(prefix) = &self.project_namespace_prefix {
            config = config.project_namespace_prefix(prefix.clone());
        }
        if let Some(strict) = self.strict_duplicates {
            config = config.strict_duplicates(strict);
        }
        config
    }

    pub fn tree_config(&self) -> TreeConfig {
        let mut config = TreeConfig::default();
        if let Some(max_depth) = self.max_depth {
            config.max_depth = max_depth;
        }
        config
    }

    pub fn batch_config(&self) -> BatchConfig {
        let mut config = BatchConfig::default();
        if let Some(concurrency) = self.concurrency {
            config.concurrency = concurrency.max(1);
        }
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write(dir: &tempfile::TempDir, name: &str, content: &str) -> PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_yaml_and_json_configs() {
        let dir = tempfile::TempDir::new().unwrap();
        let yaml = write(&dir, "ndc.yaml", "schemas_dir: raw\nmax_depth: 12\nstrict_duplicates: true\n");
        let json = write(&dir, "ndc.json", r#"{"output_dir": "out", "concurrency": 0}"#);

        let from_yaml = EngineConfig::load(&yaml).unwrap();
        assert_eq!(from_yaml.schemas_dir, Some(PathBuf::from("raw")));
        assert_eq!(from_yaml.tree_config().max_depth, 12);
        assert!(from_yaml.loader_config().strict_duplicates);

        let from_json = EngineConfig::load(&json).unwrap();
        assert_eq!(from_json.output_dir, Some(PathBuf::from("out")));
        assert_eq!(from_json.batch_config().concurrency, 1);
        assert_eq!(from_json.tree_config(), TreeConfig::default());
    }

    #[test]
    fn test_unknown_keys_are_rejected() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = write(&dir, "bad.yaml", "colour: neon\n");
        assert!(matches!(EngineConfig::load(&path), Err(ConfigError::Invalid { .. })));
    }

    #[test]
    fn test_missing_file() {
        let err = EngineConfig::load(Path::new("/nonexistent/ndc.yaml")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }
}

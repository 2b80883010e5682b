//! Batch flattening over a catalog
//!
//! Every message is flattened with its own fresh schema graph, so messages of
//! the same version run concurrently on the blocking pool, bounded by
//! [`BatchConfig::concurrency`].

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use ndc_catalog::{SchemaCatalog, bundle_path};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{error, info, warn};

use crate::flatten::{FlattenReport, MessageFlattener};
use crate::{Error, Result};

/// Configuration for batch flattening
#[derive(Debug, Clone)]
pub struct BatchConfig {
    /// Maximum messages flattened at once
    pub concurrency: usize,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            concurrency: std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(4),
        }
    }
}

/// Result of flattening one message in a batch
#[derive(Debug, Clone)]
pub struct MessageOutcome {
    pub version: String,
    pub message: String,
    /// Bundle main file, `<out>/<version>/<message dir>/<message>.xsd`
    pub output: PathBuf,
    pub report: Option<FlattenReport>,
    pub error: Option<String>,
}

impl MessageOutcome {
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }

    fn failed(version: &str, message: &str, output: PathBuf, error: impl Into<String>) -> Self {
        Self {
            version: version.to_string(),
            message: message.to_string(),
            output,
            report: None,
            error: Some(error.into()),
        }
    }
}

/// Result of a batch run
#[derive(Debug, Default)]
pub struct BatchReport {
    /// Outcomes ordered by version, then message
    pub outcomes: Vec<MessageOutcome>,
    pub processing_time: Duration,
}

impl BatchReport {
    pub fn succeeded(&self) -> impl Iterator<Item = &MessageOutcome> {
        self.outcomes.iter().filter(|o| o.is_success())
    }

    pub fn failed(&self) -> impl Iterator<Item = &MessageOutcome> {
        self.outcomes.iter().filter(|o| !o.is_success())
    }

    pub fn is_success(&self) -> bool {
        self.failed().next().is_none()
    }
}

/// Flattens catalogued messages into the bundle layout
pub struct BatchFlattener {
    flattener: Arc<MessageFlattener>,
    config: BatchConfig,
}

impl BatchFlattener {
    pub fn new(flattener: MessageFlattener, config: BatchConfig) -> Self {
        Self {
            flattener: Arc::new(flattener),
            config,
        }
    }

    /// Flatten every message of every catalogued version.
    pub async fn run(&self, catalog: &dyn SchemaCatalog, output_root: &Path) -> Result<BatchReport> {
        let started = Instant::now();
        let mut report = BatchReport::default();

        for version in catalog.versions() {
            let messages = catalog.messages(&version);
            info!("--- Version {}: {} messages ---", version, messages.len());
            let outcomes = self
                .flatten_messages(catalog, &version, &messages, output_root)
                .await?;
            report.outcomes.extend(outcomes);
        }

        report.processing_time = started.elapsed();
        info!(
            "Batch finished in {:?}: {} succeeded, {} failed",
            report.processing_time,
            report.succeeded().count(),
            report.failed().count()
        );
        Ok(report)
    }

    /// Flatten `messages` of `version`; messages the catalog does not know
    /// are reported as failures.
    pub async fn flatten_messages(
        &self,
        catalog: &dyn SchemaCatalog,
        version: &str,
        messages: &[String],
        output_root: &Path,
    ) -> Result<Vec<MessageOutcome>> {
        let semaphore = Arc::new(Semaphore::new(self.config.concurrency.max(1)));
        let mut tasks = JoinSet::new();
        let mut outcomes = Vec::with_capacity(messages.len());

        for message in messages {
            let output = bundle_path(output_root, version, message);
            let Some(source) = catalog.resolve_schema_file(version, message) else {
                warn!("Skipping {} in version {}: not in catalog", message, version);
                outcomes.push(MessageOutcome::failed(
                    version,
                    message,
                    output,
                    format!("{} not found in version {}", message, version),
                ));
                continue;
            };

            let permit = Arc::clone(&semaphore)
                .acquire_owned()
                .await
                .map_err(|e| Error::Task(e.to_string()))?;
            let flattener = Arc::clone(&self.flattener);
            let version = version.to_string();
            let message = message.clone();

            tasks.spawn_blocking(move || {
                let _permit = permit;
                match flattener.flatten(&source, &output) {
                    Ok(report) => MessageOutcome {
                        version,
                        message,
                        output,
                        report: Some(report),
                        error: None,
                    },
                    Err(e) => {
                        error!("Failed to flatten {} ({}): {}", message, version, e);
                        MessageOutcome::failed(&version, &message, output, e.to_string())
                    }
                }
            });
        }

        while let Some(joined) = tasks.join_next().await {
            outcomes.push(joined.map_err(|e| Error::Task(e.to_string()))?);
        }
        outcomes.sort_by(|a, b| a.message.cmp(&b.message));
        Ok(outcomes)
    }
}

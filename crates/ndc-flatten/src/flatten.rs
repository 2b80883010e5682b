//! One-message flattening: load, analyze, emit

use std::path::Path;

use ndc_schema::{LoaderConfig, ReachabilityAnalyzer, SchemaGraphLoader, UnresolvedReference};
use tracing::{info, warn};

use crate::Result;
use crate::config::EmitConfig;
use crate::emit::{BundleEmitter, EmitReport};

/// Outcome of flattening one message
#[derive(Debug, Clone)]
pub struct FlattenReport {
    pub emit: EmitReport,
    /// Schema files that could not be loaded while building the graph
    pub load_failures: usize,
    /// Conflicting duplicate definitions seen while loading
    pub duplicates: usize,
    pub unresolved: Vec<UnresolvedReference>,
}

/// Builds a fresh graph per message and writes its bundle
#[derive(Debug, Clone, Default)]
pub struct MessageFlattener {
    loader: LoaderConfig,
    emit: EmitConfig,
}

impl MessageFlattener {
    pub fn new(loader: LoaderConfig, emit: EmitConfig) -> Self {
        Self { loader, emit }
    }

    pub fn loader_config(&self) -> &LoaderConfig {
        &self.loader
    }

    pub fn emit_config(&self) -> &EmitConfig {
        &self.emit
    }

    /// Flatten the message rooted at `source` into a bundle at `output_path`.
    pub fn flatten(&self, source: &Path, output_path: &Path) -> Result<FlattenReport> {
        info!("Flattening {} → {}", source.display(), output_path.display());

        let loader = SchemaGraphLoader::new(self.loader.clone());
        let (graph, main) = loader.load_graph(source)?;
        let reachability = ReachabilityAnalyzer::new(&graph).analyze(main);

        if !graph.failures().is_empty() {
            warn!(
                "{} schema files failed to load for {}",
                graph.failures().len(),
                source.display()
            );
        }

        let emit = BundleEmitter::new(&graph, &self.emit).emit(main, &reachability.used, output_path)?;

        Ok(FlattenReport {
            emit,
            load_failures: graph.failures().len(),
            duplicates: graph.duplicates().len(),
            unresolved: reachability.unresolved,
        })
    }
}

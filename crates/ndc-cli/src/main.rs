//! # ndc-cli
//!
//! Command-line interface for the NDC schema engine.
//!
//! Flattens message schemas into self-contained bundles, compares message
//! structure across schema versions and identifies sample messages.

#![deny(rust_2018_idioms)]
#![warn(clippy::all)]

mod config;

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, bail};
use clap::{Parser, Subcommand, ValueEnum};
use ndc_catalog::{FsCatalog, SchemaCatalog, identify_sample};
use ndc_diff::{DiffEngine, DiffSummary, StructuralFlattener, render_text};
use ndc_flatten::{BatchFlattener, EmitConfig, MessageFlattener, MessageOutcome};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::config::EngineConfig;

#[derive(Parser)]
#[command(name = "ndc")]
#[command(about = "NDC schema flattening and structural diff")]
#[command(version)]
struct Cli {
    /// Path to configuration file (YAML, or JSON by extension)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log at debug level unless RUST_LOG is set
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Flatten messages of one version into bundles
    Flatten {
        /// Raw schema root (one folder per version)
        #[arg(short, long)]
        schemas: Option<PathBuf>,

        /// Schema version, e.g. 24.1
        #[arg(long = "version")]
        schema_version: String,

        /// Output root
        #[arg(short, long)]
        out: Option<PathBuf>,

        /// Message to flatten; every catalogued message when omitted
        #[arg(short, long)]
        message: Vec<String>,

        /// Message list JSON or YAML
        #[arg(long)]
        message_list: Option<PathBuf>,
    },

    /// Flatten every message of every version in the catalog
    Batch {
        /// Raw schema root (one folder per version)
        #[arg(short, long)]
        schemas: Option<PathBuf>,

        /// Message list JSON or YAML; folders are scanned when omitted
        #[arg(long)]
        message_list: Option<PathBuf>,

        /// Output root
        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// Compare message structure between two versions
    Diff {
        /// Raw schema root (one folder per version)
        #[arg(short, long)]
        schemas: Option<PathBuf>,

        /// Old version
        #[arg(long)]
        from: String,

        /// New version
        #[arg(long)]
        to: String,

        /// Compare only this message
        #[arg(short, long)]
        message: Option<String>,

        /// Message list JSON or YAML
        #[arg(long)]
        message_list: Option<PathBuf>,

        #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },

    /// Print the flattened element tree of one message
    Tree {
        /// Raw schema root (one folder per version)
        #[arg(short, long)]
        schemas: Option<PathBuf>,

        /// Schema version
        #[arg(long = "version")]
        schema_version: String,

        /// Message name
        #[arg(short, long)]
        message: String,

        /// Message list JSON or YAML
        #[arg(long)]
        message_list: Option<PathBuf>,

        #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },

    /// Identify the schema a sample message was written against
    Identify {
        /// Sample XML message
        sample: PathBuf,

        /// Flattened output root, to report the bundle to validate against
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("ERROR: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

/// Logs go to stderr so command output stays parseable
fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();
}

/// Returns whether every requested unit of work succeeded.
async fn run(cli: Cli) -> anyhow::Result<bool> {
    let config = match &cli.config {
        Some(path) => EngineConfig::load(path)?,
        None => EngineConfig::default(),
    };

    match cli.command {
        Commands::Flatten {
            schemas,
            schema_version,
            out,
            message,
            message_list,
        } => {
            let schemas = required(schemas, &config.schemas_dir, "--schemas", "schemas_dir")?;
            let out = required(out, &config.output_dir, "--out", "output_dir")?;
            let catalog = open_catalog(&schemas, message_list.or(config.message_list.clone()))?;
            if !catalog.has_version(&schema_version) {
                bail!("Version {} not found under {}", schema_version, schemas.display());
            }

            let messages = if message.is_empty() {
                catalog.messages(&schema_version)
            } else {
                message
            };
            let outcomes = batch_flattener(&config)
                .flatten_messages(&catalog, &schema_version, &messages, &out)
                .await?;
            Ok(report_outcomes("Flatten", &outcomes))
        }

        Commands::Batch {
            schemas,
            message_list,
            out,
        } => {
            let schemas = required(schemas, &config.schemas_dir, "--schemas", "schemas_dir")?;
            let out = required(out, &config.output_dir, "--out", "output_dir")?;
            let catalog = open_catalog(&schemas, message_list.or(config.message_list.clone()))?;

            let report = batch_flattener(&config).run(&catalog, &out).await?;
            let ok = report_outcomes("Batch", &report.outcomes);
            info!("Batch processing time: {:?}", report.processing_time);
            Ok(ok)
        }

        Commands::Diff {
            schemas,
            from,
            to,
            message,
            message_list,
            format,
        } => {
            let schemas = required(schemas, &config.schemas_dir, "--schemas", "schemas_dir")?;
            let catalog = open_catalog(&schemas, message_list.or(config.message_list.clone()))?;
            let engine = DiffEngine::with_flattener(&catalog, structural_flattener(&config));

            let diffs = match message {
                Some(message) => vec![
                    engine
                        .compare_message(&from, &to, &message)
                        .with_context(|| format!("Failed to diff {}", message))?,
                ],
                None => engine
                    .compare_versions(&from, &to)
                    .with_context(|| format!("Failed to diff {} against {}", from, to))?,
            };

            match format {
                OutputFormat::Text => print!("{}", render_text(&from, &to, &diffs)),
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&diffs)?),
            }
            eprintln!("Diff summary: {}", DiffSummary::from_diffs(&diffs));
            Ok(true)
        }

        Commands::Tree {
            schemas,
            schema_version,
            message,
            message_list,
            format,
        } => {
            let schemas = required(schemas, &config.schemas_dir, "--schemas", "schemas_dir")?;
            let catalog = open_catalog(&schemas, message_list.or(config.message_list.clone()))?;
            let engine = DiffEngine::with_flattener(&catalog, structural_flattener(&config));

            let tree = engine
                .flatten_message(&schema_version, &message)
                .with_context(|| format!("Failed to flatten {}", message))?;

            match format {
                OutputFormat::Text => {
                    for (path, element) in tree.iter() {
                        match &element.type_name {
                            Some(type_name) => println!("{}\t{}", path, type_name),
                            None => println!("{}", path),
                        }
                    }
                }
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&tree)?),
            }
            eprintln!("Tree summary: elements={}", tree.len());
            Ok(true)
        }

        Commands::Identify { sample, out } => {
            let identity = identify_sample(&sample)?;
            let mut value = serde_json::to_value(&identity)?;

            if let Some(out) = out.or(config.output_dir.clone()) {
                match identity.bundle_path(&out) {
                    Some(bundle) => {
                        if !bundle.is_file() {
                            warn!("Bundle {} has not been generated", bundle.display());
                        }
                        value["bundle"] = serde_json::Value::String(bundle.display().to_string());
                    }
                    None => warn!("Unknown version for {}", sample.display()),
                }
            }
            println!("{}", serde_json::to_string_pretty(&value)?);
            Ok(true)
        }
    }
}

fn required(
    flag: Option<PathBuf>,
    configured: &Option<PathBuf>,
    flag_name: &str,
    key: &str,
) -> anyhow::Result<PathBuf> {
    match flag.or_else(|| configured.clone()) {
        Some(path) => Ok(path),
        None => bail!("{} is required (or set {} in the config file)", flag_name, key),
    }
}

fn open_catalog(schemas: &Path, message_list: Option<PathBuf>) -> anyhow::Result<FsCatalog> {
    FsCatalog::open(schemas, message_list.as_deref())
        .with_context(|| format!("Failed to open schema catalog {}", schemas.display()))
}

fn batch_flattener(config: &EngineConfig) -> BatchFlattener {
    let flattener = MessageFlattener::new(config.loader_config(), EmitConfig::default());
    BatchFlattener::new(flattener, config.batch_config())
}

fn structural_flattener(config: &EngineConfig) -> StructuralFlattener {
    StructuralFlattener::new(config.loader_config(), config.tree_config())
}

/// Print one line per message and a summary; true when nothing failed.
fn report_outcomes(label: &str, outcomes: &[MessageOutcome]) -> bool {
    let mut failed = 0;
    for outcome in outcomes {
        match (&outcome.report, &outcome.error) {
            (Some(report), None) => println!(
                "OK   {} {} -> {} ({} definitions, {} side files)",
                outcome.version,
                outcome.message,
                outcome.output.display(),
                report.emit.definition_count,
                report.emit.side_files.len()
            ),
            (_, error) => {
                failed += 1;
                println!(
                    "FAIL {} {}: {}",
                    outcome.version,
                    outcome.message,
                    error.as_deref().unwrap_or("unknown error")
                );
            }
        }
    }
    eprintln!(
        "{} summary: succeeded={}, failed={}",
        label,
        outcomes.len() - failed,
        failed
    );
    failed == 0
}

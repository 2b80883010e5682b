#![deny(rust_2018_idioms)]
#![deny(unsafe_op_in_unsafe_fn)]
#![warn(clippy::all)]

//! # ndc-flatten
//!
//! Per-message schema bundles.
//!
//! Given a message root schema, the [`MessageFlattener`] loads its schema
//! graph, computes the definitions the message reaches, and writes a minimal
//! self-contained bundle: one main file in the message namespace plus one side
//! file per other project namespace. Foreign schemas are imported by bare file
//! name and copied alongside. [`BatchFlattener`] runs this over every message
//! of a catalog concurrently.

pub mod batch;
pub mod config;
pub mod emit;
pub mod flatten;
pub mod plan;
pub mod rewrite;

pub use batch::{BatchConfig, BatchFlattener, BatchReport, MessageOutcome};
pub use config::EmitConfig;
pub use emit::{BundleEmitter, EmitReport};
pub use flatten::{FlattenReport, MessageFlattener};
pub use plan::{NamespacePlan, SideNamespace};
pub use rewrite::{RewriteScope, RewriteUsage, ReferenceRewriter};

use thiserror::Error;

/// Errors that can occur while flattening
#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Schema(#[from] ndc_schema::Error),

    #[error(transparent)]
    Xml(#[from] ndc_xml::Error),

    #[error(transparent)]
    Catalog(#[from] ndc_catalog::Error),

    #[error("Invalid output path '{0}'")]
    InvalidOutput(String),

    #[error("Batch task failed: {0}")]
    Task(String),

    #[error("IO error during {operation} for '{path}': {message}")]
    Io {
        operation: String,
        path: String,
        message: String,
    },
}

impl Error {
    /// Create a structured I/O error with operation/path context.
    pub fn io(
        operation: impl Into<String>,
        path: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::Io {
            operation: operation.into(),
            path: path.into(),
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

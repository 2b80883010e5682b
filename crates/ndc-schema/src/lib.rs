//! # ndc-schema
//!
//! XSD schema graph loading, definition registry, and reachability analysis.
//!
//! A [`SchemaGraph`] is the context of one flattening run: the loader parses a
//! root schema and every project schema it imports or includes, indexing all
//! top-level definitions by `(namespace, name)`. The [`ReachabilityAnalyzer`]
//! then computes which of those definitions a message actually uses.

pub mod graph;
pub mod loader;
pub mod model;
pub mod reachability;
pub mod registry;
pub mod resolve;

pub use graph::{DefinitionRef, DuplicateDefinition, LoadFailure, SchemaGraph};
pub use loader::{IATA_NAMESPACE_PREFIX, LoaderConfig, SchemaGraphLoader};
pub use model::{
    Definition, DefinitionKey, DefinitionKind, FileId, ImportDecl, ImportKind, PrefixMap,
    SchemaFile,
};
pub use reachability::{Reachability, ReachabilityAnalyzer, UnresolvedReference};
pub use registry::{DefinitionTable, ForeignSchema, ForeignSchemas};
pub use resolve::{
    LIST_REFERENCE_ATTRIBUTES, REFERENCE_ATTRIBUTES, Reference, ResolvedName, references,
    resolve_qname,
};

use thiserror::Error;

/// Errors that can occur when loading a schema graph
#[derive(Error, Debug)]
pub enum Error {
    #[error("Schema '{path}' could not be loaded: {reason}")]
    RootUnavailable { path: String, reason: String },

    #[error("Duplicate definition {key}: declared differently in '{first}' and '{second}'")]
    DuplicateDefinition {
        key: String,
        first: String,
        second: String,
    },
}

impl Error {
    /// Build a root-unavailable error with the failure reason.
    pub fn root_unavailable(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::RootUnavailable {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Build a duplicate-definition error naming both declaring files.
    pub fn duplicate_definition(
        key: impl Into<String>,
        first: impl Into<String>,
        second: impl Into<String>,
    ) -> Self {
        Self::DuplicateDefinition {
            key: key.into(),
            first: first.into(),
            second: second.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

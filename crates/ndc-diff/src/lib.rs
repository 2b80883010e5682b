#![deny(rust_2018_idioms)]
#![deny(unsafe_op_in_unsafe_fn)]
#![warn(clippy::all)]

//! # ndc-diff
//!
//! Structural comparison of message schemas across versions.
//!
//! The [`StructuralFlattener`] turns a message's root schema into a
//! path-keyed [`FlatTree`] of element name, type name and documentation. The
//! [`DiffEngine`] flattens the same message in two catalogued versions and
//! reports added, removed, retyped and re-documented paths.

pub mod engine;
pub mod report;
pub mod tree;

pub use engine::{DiffEngine, diff_trees};
pub use report::{DiffItem, DiffSummary, DiffType, MessageDiff, MessageStatus, render_text};
pub use tree::{FlatTree, SchemaElement, StructuralFlattener, TreeConfig};

use thiserror::Error;

/// Errors that can occur while flattening or diffing
#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Schema(#[from] ndc_schema::Error),

    #[error("No global element found in '{0}'")]
    NoRootElement(String),

    #[error("Version '{0}' is not in the catalog")]
    VersionNotFound(String),

    #[error("Message '{message}' is in neither version '{from}' nor '{to}'")]
    MessageNotFound {
        message: String,
        from: String,
        to: String,
    },

    #[error("Could not flatten {message} in version {version}: {reason}")]
    Flatten {
        version: String,
        message: String,
        reason: String,
    },
}

impl Error {
    pub fn flatten(
        version: impl Into<String>,
        message: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::Flatten {
            version: version.into(),
            message: message.into(),
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

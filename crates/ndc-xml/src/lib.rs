#![deny(rust_2018_idioms)]
#![deny(unsafe_op_in_unsafe_fn)]
#![warn(clippy::all)]

//! # ndc-xml
//!
//! Owned XML element tree for XSD documents.
//!
//! Schema documents are parsed once with `roxmltree` and converted into an owned,
//! clonable [`Element`] tree so that definitions can be deep-copied into new
//! documents, have their reference attributes rewritten, and be pretty-printed
//! again with `quick-xml`.

/// Parsed documents and serialization back to text.
pub mod document;
/// Element tree primitives.
pub mod node;
/// Qualified-name helpers and well-known namespace URIs.
pub mod qname;
/// Depth-first traversal over element trees.
pub mod traversal;

/// Primary document type.
pub use document::{Document, WriteOptions};
/// Tree primitives.
pub use node::{Attribute, Element, NamespaceDecl, Node};
/// QName helpers.
pub use qname::{XML_NS, XSD_NS, split_qname};
/// Traversal entry points.
pub use traversal::{Descendants, Visitor, walk};

use thiserror::Error;

/// Errors that can occur when reading or writing XML
#[derive(Error, Debug)]
pub enum Error {
    #[error("XML parse error in {source_name}: {message}")]
    Parse {
        source_name: String,
        message: String,
    },

    #[error("XML write error: {0}")]
    Write(String),

    #[error("IO error on '{path}': {message}")]
    Io { path: String, message: String },
}

impl Error {
    /// Build a parse error with the name of the input it came from.
    pub fn parse(source_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Parse {
            source_name: source_name.into(),
            message: message.into(),
        }
    }

    /// Build an I/O error with path context.
    pub fn io(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Io {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// Crate-local result type for XML operations.
pub type Result<T> = std::result::Result<T, Error>;

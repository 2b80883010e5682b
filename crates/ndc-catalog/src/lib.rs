#![deny(rust_2018_idioms)]
#![deny(unsafe_op_in_unsafe_fn)]
#![warn(clippy::all)]

//! # ndc-catalog
//!
//! Read-only catalog mapping `(version, message)` to a raw root schema file,
//! plus the output layout of flattened bundles and identification of sample
//! messages against that layout.
//!
//! A catalog is built once and only read afterwards, so it can be shared
//! freely between concurrent flattening or diff runs.

pub mod catalog;
pub mod layout;
pub mod sample;

pub use catalog::{FsCatalog, MessageList, SchemaCatalog, find_version_folder};
pub use layout::{MESSAGE_PREFIX, bundle_dir, bundle_path, message_dir_name};
pub use sample::{SampleIdentity, VERSION_MAP, identify_sample, identify_sample_text, map_schema_id};

use thiserror::Error;

/// Errors that can occur when building a catalog or reading samples
#[derive(Error, Debug)]
pub enum Error {
    #[error("Schema root '{0}' is not a directory")]
    RootNotFound(String),

    #[error("Invalid message list '{path}': {message}")]
    InvalidMessageList { path: String, message: String },

    #[error("Could not read sample '{path}': {message}")]
    Sample { path: String, message: String },

    #[error("IO error for '{path}': {message}")]
    Io { path: String, message: String },
}

impl Error {
    pub fn io(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Io {
            path: path.into(),
            message: message.into(),
        }
    }

    pub fn invalid_message_list(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidMessageList {
            path: path.into(),
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

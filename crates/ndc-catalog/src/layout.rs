//! Output layout of flattened bundles

use std::path::{Path, PathBuf};

/// Prefix stripped from message names when naming bundle directories
pub const MESSAGE_PREFIX: &str = "IATA_";

/// Directory name for a message's bundle, e.g. `OrderViewRS` for `IATA_OrderViewRS`
pub fn message_dir_name(message: &str) -> &str {
    message.strip_prefix(MESSAGE_PREFIX).unwrap_or(message)
}

/// `<output_root>/<version>/<message minus prefix>`
pub fn bundle_dir(output_root: &Path, version: &str, message: &str) -> PathBuf {
    output_root.join(version).join(message_dir_name(message))
}

/// `<output_root>/<version>/<message minus prefix>/<message>.xsd`
pub fn bundle_path(output_root: &Path, version: &str, message: &str) -> PathBuf {
    bundle_dir(output_root, version, message).join(format!("{}.xsd", message))
}

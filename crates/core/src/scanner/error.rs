//! Error types for the scanner module.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that stop a scan before it produces anything.
#[derive(Debug, Error)]
pub enum ScanError {
    /// The scan root is missing, not a directory, or unreadable.
    #[error("Cannot read directory {path}: {error}")]
    RootUnreadable {
        path: PathBuf,
        #[source]
        error: std::io::Error,
    },
}

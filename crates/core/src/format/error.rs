//! Error types for the format module.

use std::path::PathBuf;
use thiserror::Error;

use crate::extractor::stderr_suffix;

/// Errors raised by the format registry and archive codecs.
#[derive(Debug, Error)]
pub enum FormatError {
    /// Requested format is not registered.
    #[error("Unknown archive format '{name}' (available: {available})")]
    UnknownFormat { name: String, available: String },

    /// The directory to pack does not exist.
    #[error("Nothing to pack, directory not found: {path}")]
    SourceNotFound { path: PathBuf },

    /// The format can pack but has no unpack capability.
    #[error("Format '{name}' does not support unpacking")]
    UnpackUnsupported { name: String },

    /// Codec-level failure (corrupt stream, unsupported entry, ...).
    #[error("{format} codec error: {reason}")]
    Codec { format: String, reason: String },

    /// External archiver binary not found.
    #[error("Archiver not found at path: {path}")]
    ToolNotFound { path: PathBuf },

    /// External archiver exited unsuccessfully.
    #[error("Archiver failed: {reason}{}", stderr_suffix(.stderr))]
    ToolFailed {
        reason: String,
        stderr: Option<String>,
    },

    /// I/O error while reading sources or writing the archive.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl FormatError {
    /// Creates a codec error for the given format.
    pub fn codec(format: impl Into<String>, reason: impl ToString) -> Self {
        Self::Codec {
            format: format.into(),
            reason: reason.to_string(),
        }
    }

    /// Creates an external tool failure with captured stderr.
    pub fn tool_failed(reason: impl Into<String>, stderr: Option<String>) -> Self {
        Self::ToolFailed {
            reason: reason.into(),
            stderr,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_format_message_lists_available() {
        let err = FormatError::UnknownFormat {
            name: "rar".to_string(),
            available: "tar, zip".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Unknown archive format 'rar' (available: tar, zip)"
        );
    }

    #[test]
    fn test_codec_helper() {
        let err = FormatError::codec("zip", "invalid Zip archive");
        assert!(matches!(err, FormatError::Codec { .. }));
        assert_eq!(err.to_string(), "zip codec error: invalid Zip archive");
    }

    #[test]
    fn test_tool_failed_includes_stderr() {
        let err = FormatError::tool_failed(
            "7z exited with code: Some(2)",
            Some("ERROR: No more files\n".to_string()),
        );
        assert_eq!(
            err.to_string(),
            "Archiver failed: 7z exited with code: Some(2): ERROR: No more files"
        );
    }
}

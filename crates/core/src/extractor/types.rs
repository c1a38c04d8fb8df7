//! Types for the extractor module.

use std::path::PathBuf;

/// Where an extractor left the material to archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extraction {
    /// Directory holding the extracted tree.
    pub root_dir: PathBuf,
    /// Subdirectory of `root_dir` to archive under its own name, if the
    /// whole root should not be packed.
    pub base_dir: Option<PathBuf>,
}

impl Extraction {
    /// Extraction whose whole root is the material.
    pub fn at(root_dir: impl Into<PathBuf>) -> Self {
        Self {
            root_dir: root_dir.into(),
            base_dir: None,
        }
    }
}

/// Candidate payload directories inside an extraction root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PayloadLayout {
    /// Preferred directory.
    pub primary: PathBuf,
    /// Directory used when the preferred one is missing or empty.
    pub fallback: PathBuf,
}

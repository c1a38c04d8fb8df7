//! Trait definitions for the format module.

use async_trait::async_trait;
use std::path::Path;

use super::error::FormatError;
use super::types::{PackRequest, PackResult};

/// Writes a directory tree into an archive file.
#[async_trait]
pub trait Packer: Send + Sync {
    /// Returns the name of this codec implementation.
    fn name(&self) -> &str;

    /// Packs `request.root_dir` (or only `request.base_dir` inside it) into
    /// exactly `request.output`.
    async fn pack(&self, request: PackRequest) -> Result<PackResult, FormatError>;
}

/// Restores an archive file into a directory.
#[async_trait]
pub trait Unpacker: Send + Sync {
    /// Returns the name of this codec implementation.
    fn name(&self) -> &str;

    /// Extracts `archive` into `dest_dir`, creating it if needed.
    async fn unpack(&self, archive: &Path, dest_dir: &Path) -> Result<(), FormatError>;
}

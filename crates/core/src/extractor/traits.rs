//! Trait definitions for the extractor module.

use async_trait::async_trait;
use std::path::Path;

use super::error::ExtractorError;
use super::types::{Extraction, PayloadLayout};

/// Turns a source (container file or directory) into a directory tree that
/// can be packed.
#[async_trait]
pub trait Extractor: Send + Sync {
    /// Returns the name of this extractor implementation.
    fn name(&self) -> &str;

    /// Extracts `source`. `work_dir` is an empty directory owned by the
    /// caller and removed after the task; extractors that write files must
    /// write them there.
    async fn extract(&self, source: &Path, work_dir: &Path)
        -> Result<Extraction, ExtractorError>;

    /// Payload directories to choose from inside the extraction root.
    /// `None` packs the extraction as-is.
    fn payload_layout(&self) -> Option<PayloadLayout> {
        None
    }

    /// Validates that the extractor is properly configured and ready.
    async fn validate(&self) -> Result<(), ExtractorError> {
        Ok(())
    }
}

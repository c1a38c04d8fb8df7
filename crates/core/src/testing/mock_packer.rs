//! Mock packer for testing.

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::format::{ArchiveFormat, FormatError, PackRequest, PackResult, Packer};

/// Mock implementation of the Packer trait.
///
/// Writes a small placeholder file to the requested output, or writes a
/// truncated file and then fails when configured to, so callers' cleanup
/// of partial output can be checked.
#[derive(Debug, Default)]
pub struct MockPacker {
    requests: Arc<RwLock<Vec<PackRequest>>>,
    failure: Option<String>,
}

impl MockPacker {
    /// Create a packer that always succeeds.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a packer that always fails with the given reason.
    pub fn failing(reason: impl Into<String>) -> Self {
        Self {
            requests: Arc::new(RwLock::new(Vec::new())),
            failure: Some(reason.into()),
        }
    }

    /// Get all recorded pack requests.
    pub async fn recorded_requests(&self) -> Vec<PackRequest> {
        self.requests.read().await.clone()
    }

    /// Wrap this packer in an archive format without unpack support.
    pub fn into_format(self, name: &str, extension: &str) -> ArchiveFormat {
        ArchiveFormat::new(name, extension, Arc::new(self), None)
    }
}

#[async_trait]
impl Packer for MockPacker {
    fn name(&self) -> &str {
        "mock"
    }

    async fn pack(&self, request: PackRequest) -> Result<PackResult, FormatError> {
        self.requests.write().await.push(request.clone());

        if let Some(reason) = &self.failure {
            tokio::fs::write(&request.output, b"PK\x03").await?;
            return Err(FormatError::codec("mock", reason));
        }

        let contents = format!("mock archive of {}", request.source_dir().display());
        tokio::fs::write(&request.output, contents.as_bytes()).await?;
        Ok(PackResult {
            output: request.output,
            size_bytes: contents.len() as u64,
            entries: 1,
        })
    }
}

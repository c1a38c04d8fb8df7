//! Source that archives a directory in place.

use async_trait::async_trait;
use std::path::{Path, PathBuf};

use super::error::ExtractorError;
use super::traits::Extractor;
use super::types::Extraction;

/// Treats the source directory itself as the material: the archive is
/// rooted at its parent and keeps the directory name as the entry prefix.
#[derive(Debug, Clone, Copy, Default)]
pub struct DirectorySource;

impl DirectorySource {
    /// Creates a directory source.
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Extractor for DirectorySource {
    fn name(&self) -> &str {
        "directory"
    }

    async fn extract(
        &self,
        source: &Path,
        _work_dir: &Path,
    ) -> Result<Extraction, ExtractorError> {
        let not_found = || ExtractorError::SourceNotFound {
            path: source.to_path_buf(),
        };

        if !source.is_dir() {
            return Err(not_found());
        }
        let name = source.file_name().ok_or_else(not_found)?;
        let parent = match source.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };

        Ok(Extraction {
            root_dir: parent,
            base_dir: Some(PathBuf::from(name)),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_extract_directory() {
        let dir = tempfile::tempdir().unwrap();
        let photos = dir.path().join("photos.2020");
        std::fs::create_dir(&photos).unwrap();

        let extraction = DirectorySource::new()
            .extract(&photos, Path::new("/unused"))
            .await
            .unwrap();
        assert_eq!(extraction.root_dir, dir.path());
        assert_eq!(extraction.base_dir, Some(PathBuf::from("photos.2020")));
        assert!(DirectorySource.payload_layout().is_none());
    }

    #[tokio::test]
    async fn test_extract_relative_directory() {
        let extraction = DirectorySource
            .extract(Path::new("src"), Path::new("/unused"))
            .await;
        // Relative to the crate root under `cargo test`.
        let extraction = extraction.unwrap();
        assert_eq!(extraction.root_dir, PathBuf::from("."));
        assert_eq!(extraction.base_dir, Some(PathBuf::from("src")));
    }

    #[tokio::test]
    async fn test_extract_file_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("notes.txt");
        std::fs::write(&file, b"x").unwrap();
        let err = DirectorySource.extract(&file, dir.path()).await.unwrap_err();
        assert!(matches!(err, ExtractorError::SourceNotFound { .. }));
    }
}

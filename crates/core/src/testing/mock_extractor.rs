//! Mock extractor for testing.

use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use crate::extractor::{Extraction, Extractor, ExtractorConfig, ExtractorError, PayloadLayout};

/// What the mock produces for a source.
#[derive(Debug, Clone)]
pub enum MockExtraction {
    /// Write pages into the primary payload directory.
    Primary(Vec<(String, Vec<u8>)>),
    /// Write pages into the fallback payload directory only.
    Fallback(Vec<(String, Vec<u8>)>),
    /// Write pages into both payload directories.
    Both {
        primary: Vec<(String, Vec<u8>)>,
        fallback: Vec<(String, Vec<u8>)>,
    },
    /// Create empty payload directories.
    Empty,
    /// Fail with `ExtractorError::Failed`.
    Fail(String),
    /// Panic inside the extractor.
    Panic(String),
}

/// A recorded extraction for test assertions.
#[derive(Debug, Clone)]
pub struct RecordedExtraction {
    /// Source that was extracted.
    pub source: PathBuf,
    /// Working directory the task provided.
    pub work_dir: PathBuf,
}

/// Mock implementation of the Extractor trait.
///
/// Provides controllable behavior for testing:
/// - Per-source results keyed by file name
/// - Simulated extraction time
/// - Recorded calls and peak concurrency
///
/// Sources without a configured result get one page, `p1.jpg`, holding
/// the source file's bytes, in the primary payload directory.
///
/// # Example
///
/// ```rust,ignore
/// use archivist_core::testing::{MockExtractor, MockExtraction};
///
/// let extractor = MockExtractor::new();
/// extractor.set_result("b.mobi", MockExtraction::Fail("bad header".into())).await;
/// ```
#[derive(Debug)]
pub struct MockExtractor {
    layout: PayloadLayout,
    results: Arc<RwLock<HashMap<String, MockExtraction>>>,
    calls: Arc<RwLock<Vec<RecordedExtraction>>>,
    delay_ms: Arc<RwLock<u64>>,
    active: AtomicUsize,
    peak: AtomicUsize,
}

impl Default for MockExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl MockExtractor {
    /// Create a new mock extractor using the default payload layout.
    pub fn new() -> Self {
        Self {
            layout: ExtractorConfig::default().payload_layout(),
            results: Arc::new(RwLock::new(HashMap::new())),
            calls: Arc::new(RwLock::new(Vec::new())),
            delay_ms: Arc::new(RwLock::new(0)),
            active: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
        }
    }

    /// Configure the result for sources with this file name.
    pub async fn set_result(&self, file_name: &str, result: MockExtraction) {
        self.results
            .write()
            .await
            .insert(file_name.to_string(), result);
    }

    /// Set the simulated extraction duration.
    pub async fn set_delay(&self, delay: Duration) {
        *self.delay_ms.write().await = delay.as_millis() as u64;
    }

    /// Get all recorded extractions.
    pub async fn recorded(&self) -> Vec<RecordedExtraction> {
        self.calls.read().await.clone()
    }

    /// Get the number of extractions performed.
    pub async fn call_count(&self) -> usize {
        self.calls.read().await.len()
    }

    /// Highest number of extractions running at the same time.
    pub fn peak_concurrency(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

    async fn result_for(&self, source: &Path) -> Result<MockExtraction, ExtractorError> {
        let name = source
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        if let Some(result) = self.results.read().await.get(&name) {
            return Ok(result.clone());
        }
        let bytes = tokio::fs::read(source).await?;
        Ok(MockExtraction::Primary(vec![("p1.jpg".to_string(), bytes)]))
    }

    async fn materialize(
        &self,
        result: MockExtraction,
        work_dir: &Path,
    ) -> Result<(), ExtractorError> {
        let primary = work_dir.join(&self.layout.primary);
        let fallback = work_dir.join(&self.layout.fallback);
        match result {
            MockExtraction::Primary(pages) => write_pages(&primary, &pages).await,
            MockExtraction::Fallback(pages) => write_pages(&fallback, &pages).await,
            MockExtraction::Both {
                primary: p,
                fallback: f,
            } => {
                write_pages(&primary, &p).await?;
                write_pages(&fallback, &f).await
            }
            MockExtraction::Empty => {
                tokio::fs::create_dir_all(&primary).await?;
                tokio::fs::create_dir_all(&fallback).await?;
                Ok(())
            }
            MockExtraction::Fail(reason) => Err(ExtractorError::failed(reason, None)),
            MockExtraction::Panic(message) => panic!("{}", message),
        }
    }
}

async fn write_pages(dir: &Path, pages: &[(String, Vec<u8>)]) -> Result<(), ExtractorError> {
    tokio::fs::create_dir_all(dir).await?;
    for (name, bytes) in pages {
        tokio::fs::write(dir.join(name), bytes).await?;
    }
    Ok(())
}

/// Decrements the active counter even if the extraction panics.
struct ActiveGuard<'a>(&'a AtomicUsize);

impl Drop for ActiveGuard<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl Extractor for MockExtractor {
    fn name(&self) -> &str {
        "mock"
    }

    async fn extract(
        &self,
        source: &Path,
        work_dir: &Path,
    ) -> Result<Extraction, ExtractorError> {
        let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        let _guard = ActiveGuard(&self.active);

        self.calls.write().await.push(RecordedExtraction {
            source: source.to_path_buf(),
            work_dir: work_dir.to_path_buf(),
        });

        let delay_ms = *self.delay_ms.read().await;
        if delay_ms > 0 {
            tokio::time::sleep(Duration::from_millis(delay_ms)).await;
        }

        let result = self.result_for(source).await?;
        self.materialize(result, work_dir).await?;
        Ok(Extraction::at(work_dir))
    }

    fn payload_layout(&self) -> Option<PayloadLayout> {
        Some(self.layout.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_default_result_copies_source() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("a.mobi");
        std::fs::write(&source, b"page-bytes").unwrap();
        let work = tempfile::tempdir().unwrap();

        let extractor = MockExtractor::new();
        extractor.extract(&source, work.path()).await.unwrap();

        let page = work.path().join("mobi8/OEBPS/Images/p1.jpg");
        assert_eq!(std::fs::read(page).unwrap(), b"page-bytes");
        assert_eq!(extractor.call_count().await, 1);
        assert_eq!(extractor.peak_concurrency(), 1);
    }

    #[tokio::test]
    async fn test_configured_failure() {
        let work = tempfile::tempdir().unwrap();
        let extractor = MockExtractor::new();
        extractor
            .set_result("b.mobi", MockExtraction::Fail("bad header".to_string()))
            .await;

        let err = extractor
            .extract(Path::new("/lib/b.mobi"), work.path())
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Extraction failed: bad header");
    }
}

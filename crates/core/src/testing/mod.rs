//! Testing utilities and mock implementations.
//!
//! This module provides mock implementations of the extractor and packer
//! traits plus fixtures for building source trees, so pipeline behavior can
//! be tested without external tools.
//!
//! # Example
//!
//! ```rust,ignore
//! use archivist_core::testing::{fixtures, MockExtractor, MockExtraction};
//!
//! let library = tempfile::tempdir()?;
//! fixtures::mobi_files(library.path(), &["a.mobi", "b.mobi"]);
//!
//! let extractor = MockExtractor::new();
//! extractor.set_result("b.mobi", MockExtraction::Empty).await;
//! ```

mod mock_extractor;
mod mock_packer;

pub use mock_extractor::{MockExtraction, MockExtractor, RecordedExtraction};
pub use mock_packer::MockPacker;

/// Test fixtures and helper functions.
pub mod fixtures {
    use std::fs::File;
    use std::path::{Path, PathBuf};

    use crate::format::{ArchiveFormat, CodecConfig, FormatRegistry};

    /// Create container files with distinct contents under `dir`.
    /// Names may include subdirectories.
    pub fn mobi_files(dir: &Path, names: &[&str]) -> Vec<PathBuf> {
        names
            .iter()
            .map(|name| {
                let path = dir.join(name);
                if let Some(parent) = path.parent() {
                    std::fs::create_dir_all(parent).expect("create fixture directory");
                }
                std::fs::write(&path, format!("BOOKMOBI {}", name)).expect("write fixture");
                path
            })
            .collect()
    }

    /// Create a directory of image files under `dir`.
    pub fn image_dir(dir: &Path, name: &str, pages: usize) -> PathBuf {
        let path = dir.join(name);
        std::fs::create_dir_all(&path).expect("create fixture directory");
        for i in 1..=pages {
            std::fs::write(path.join(format!("p{:03}.jpg", i)), format!("jpeg {}", i))
                .expect("write fixture");
        }
        path
    }

    /// A built-in format by name.
    pub fn builtin_format(name: &str) -> ArchiveFormat {
        FormatRegistry::with_builtin(&CodecConfig::default())
            .lookup(name)
            .expect("built-in format")
    }

    /// Sorted entry names of a zip archive.
    pub fn zip_entry_names(path: &Path) -> Vec<String> {
        let file = File::open(path).expect("open archive");
        let archive = zip::ZipArchive::new(file).expect("read archive");
        let mut names: Vec<String> = archive.file_names().map(str::to_string).collect();
        names.sort();
        names
    }
}

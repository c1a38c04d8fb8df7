//! Choosing which extracted directory becomes the archive.

use std::path::{Path, PathBuf};
use tracing::debug;

use super::error::TaskError;
use crate::extractor::PayloadLayout;

/// Picks the payload directory inside an extraction root.
///
/// The primary directory wins when it exists and has at least one entry;
/// otherwise the fallback is used under the same condition. When both are
/// usable the primary is taken and the choice is logged.
pub fn select_payload_root(root: &Path, layout: &PayloadLayout) -> Result<PathBuf, TaskError> {
    let primary = root.join(&layout.primary);
    let fallback = root.join(&layout.fallback);

    match (has_entries(&primary), has_entries(&fallback)) {
        (true, also_fallback) => {
            if also_fallback {
                debug!(
                    primary = %primary.display(),
                    fallback = %fallback.display(),
                    "Both payload directories present, using primary"
                );
            }
            Ok(primary)
        }
        (false, true) => Ok(fallback),
        (false, false) => Err(TaskError::NoPayload {
            primary: layout.primary.clone(),
            fallback: layout.fallback.clone(),
        }),
    }
}

fn has_entries(dir: &Path) -> bool {
    std::fs::read_dir(dir)
        .map(|mut entries| entries.next().is_some())
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn layout() -> PayloadLayout {
        PayloadLayout {
            primary: PathBuf::from("mobi8/OEBPS/Images"),
            fallback: PathBuf::from("mobi7/Images"),
        }
    }

    #[test]
    fn test_primary_preferred() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("mobi8/OEBPS/Images")).unwrap();
        fs::create_dir_all(dir.path().join("mobi7/Images")).unwrap();
        fs::write(dir.path().join("mobi8/OEBPS/Images/p1.jpg"), b"x").unwrap();
        fs::write(dir.path().join("mobi7/Images/p1.jpg"), b"x").unwrap();

        let root = select_payload_root(dir.path(), &layout()).unwrap();
        assert_eq!(root, dir.path().join("mobi8/OEBPS/Images"));
    }

    #[test]
    fn test_empty_primary_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("mobi8/OEBPS/Images")).unwrap();
        fs::create_dir_all(dir.path().join("mobi7/Images")).unwrap();
        fs::write(dir.path().join("mobi7/Images/p1.jpg"), b"x").unwrap();

        let root = select_payload_root(dir.path(), &layout()).unwrap();
        assert_eq!(root, dir.path().join("mobi7/Images"));
    }

    #[test]
    fn test_missing_primary_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("mobi7/Images")).unwrap();
        fs::write(dir.path().join("mobi7/Images/p1.jpg"), b"x").unwrap();

        let root = select_payload_root(dir.path(), &layout()).unwrap();
        assert_eq!(root, dir.path().join("mobi7/Images"));
    }

    #[test]
    fn test_no_payload() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("mobi7/Images")).unwrap();

        let err = select_payload_root(dir.path(), &layout()).unwrap_err();
        assert!(matches!(err, TaskError::NoPayload { .. }));
    }
}

//! Types for the format module.

use std::ffi::OsString;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::traits::{Packer, Unpacker};

/// A registered archive format.
///
/// Cheap to clone: codecs are shared behind `Arc`.
#[derive(Clone)]
pub struct ArchiveFormat {
    /// Format name as offered on the command line (e.g. `gztar`).
    pub name: String,
    /// File extension including the leading dot (e.g. `.tar.gz`).
    pub extension: String,
    /// Pack capability.
    pub packer: Arc<dyn Packer>,
    /// Unpack capability, if the codec provides one.
    pub unpacker: Option<Arc<dyn Unpacker>>,
}

impl ArchiveFormat {
    /// Creates a format with pack and unpack capabilities.
    pub fn new(
        name: impl Into<String>,
        extension: impl Into<String>,
        packer: Arc<dyn Packer>,
        unpacker: Option<Arc<dyn Unpacker>>,
    ) -> Self {
        Self {
            name: name.into(),
            extension: extension.into(),
            packer,
            unpacker,
        }
    }

    /// Archive path for a source file: the source without its extension
    /// plus this format's extension, in the same directory.
    ///
    /// `comics/vol1.mobi` becomes `comics/vol1.zip` for zip.
    pub fn target_for_file(&self, source: &Path) -> PathBuf {
        self.append_extension(&source.with_extension(""))
    }

    /// Archive path for a source directory: the full directory name plus
    /// this format's extension, as a sibling of the directory.
    pub fn target_for_directory(&self, dir: &Path) -> PathBuf {
        self.append_extension(dir)
    }

    fn append_extension(&self, base: &Path) -> PathBuf {
        let mut name = OsString::from(base.as_os_str());
        name.push(&self.extension);
        PathBuf::from(name)
    }
}

impl fmt::Debug for ArchiveFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ArchiveFormat")
            .field("name", &self.name)
            .field("extension", &self.extension)
            .field("packer", &self.packer.name())
            .field("can_unpack", &self.unpacker.is_some())
            .finish()
    }
}

/// What to put into an archive and where to write it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackRequest {
    /// Directory the archive paths are relative to.
    pub root_dir: PathBuf,
    /// Restrict the archive to this subdirectory of `root_dir`; entries keep
    /// the `base_dir/` prefix. `None` packs the contents of `root_dir`.
    pub base_dir: Option<PathBuf>,
    /// Archive file to create.
    pub output: PathBuf,
}

impl PackRequest {
    /// Pack the contents of `root_dir` into `output`.
    pub fn contents_of(root_dir: impl Into<PathBuf>, output: impl Into<PathBuf>) -> Self {
        Self {
            root_dir: root_dir.into(),
            base_dir: None,
            output: output.into(),
        }
    }

    /// Pack `root_dir/base_dir` into `output`, keeping the `base_dir/` prefix.
    pub fn subdir_of(
        root_dir: impl Into<PathBuf>,
        base_dir: impl Into<PathBuf>,
        output: impl Into<PathBuf>,
    ) -> Self {
        Self {
            root_dir: root_dir.into(),
            base_dir: Some(base_dir.into()),
            output: output.into(),
        }
    }

    /// The directory whose tree ends up in the archive.
    pub fn source_dir(&self) -> PathBuf {
        match &self.base_dir {
            Some(base) => self.root_dir.join(base),
            None => self.root_dir.clone(),
        }
    }
}

/// Result of a successful pack.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackResult {
    /// Archive that was written.
    pub output: PathBuf,
    /// Archive size on disk.
    pub size_bytes: u64,
    /// Number of file and directory entries stored.
    pub entries: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::native::ZipCodec;

    fn zip_format() -> ArchiveFormat {
        let codec = Arc::new(ZipCodec::default());
        ArchiveFormat::new("zip", ".zip", codec.clone(), Some(codec))
    }

    #[test]
    fn test_target_for_file_replaces_extension() {
        let format = zip_format();
        assert_eq!(
            format.target_for_file(Path::new("/books/photo.mobi")),
            PathBuf::from("/books/photo.zip")
        );
    }

    #[test]
    fn test_target_for_file_keeps_inner_dots() {
        let mut format = zip_format();
        format.extension = ".tar.gz".to_string();
        assert_eq!(
            format.target_for_file(Path::new("vol.01.mobi")),
            PathBuf::from("vol.01.tar.gz")
        );
    }

    #[test]
    fn test_target_for_directory_keeps_full_name() {
        let format = zip_format();
        assert_eq!(
            format.target_for_directory(Path::new("/work/photos.2020")),
            PathBuf::from("/work/photos.2020.zip")
        );
    }

    #[test]
    fn test_pack_request_source_dir() {
        let req = PackRequest::subdir_of("/work", "photos", "/work/photos.zip");
        assert_eq!(req.source_dir(), PathBuf::from("/work/photos"));

        let req = PackRequest::contents_of("/tmp/x/Images", "/books/a.zip");
        assert_eq!(req.source_dir(), PathBuf::from("/tmp/x/Images"));
    }

    #[test]
    fn test_debug_omits_codec_internals() {
        let rendered = format!("{:?}", zip_format());
        assert!(rendered.contains("\"zip\""));
        assert!(rendered.contains("can_unpack: true"));
    }
}

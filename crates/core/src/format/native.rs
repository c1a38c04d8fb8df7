//! In-process archive codecs (zip and the tar family).
//!
//! Compression is CPU-bound, so every pack and unpack runs on Tokio's
//! blocking pool.

use async_trait::async_trait;
use std::fs::File;
use std::io::{self, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use super::error::FormatError;
use super::traits::{Packer, Unpacker};
use super::types::{PackRequest, PackResult};

/// One file or directory to store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct SourceEntry {
    /// Location on disk.
    pub path: PathBuf,
    /// `/`-separated name inside the archive.
    pub name: String,
    pub is_dir: bool,
}

/// Lists everything under the request's source directory in file-name order.
///
/// With a `base_dir` the directory itself is stored as the first entry and
/// every name carries its prefix.
pub(crate) fn collect_entries(request: &PackRequest) -> Result<Vec<SourceEntry>, FormatError> {
    let source_dir = request.source_dir();
    if !source_dir.is_dir() {
        return Err(FormatError::SourceNotFound { path: source_dir });
    }

    let prefix = request.base_dir.as_deref().map(archive_name);
    let mut entries = Vec::new();

    for entry in WalkDir::new(&source_dir)
        .follow_links(false)
        .sort_by_file_name()
    {
        let entry = entry.map_err(|e| FormatError::Io(e.into()))?;
        let relative = entry
            .path()
            .strip_prefix(&source_dir)
            .unwrap_or(entry.path());

        let name = match (&prefix, entry.depth()) {
            (None, 0) => continue,
            (Some(prefix), 0) => prefix.clone(),
            (Some(prefix), _) => format!("{}/{}", prefix, archive_name(relative)),
            (None, _) => archive_name(relative),
        };

        entries.push(SourceEntry {
            path: entry.path().to_path_buf(),
            name,
            is_dir: entry.file_type().is_dir(),
        });
    }

    Ok(entries)
}

fn archive_name(path: &Path) -> String {
    path.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

async fn run_blocking<T, F>(format: &str, f: F) -> Result<T, FormatError>
where
    F: FnOnce() -> Result<T, FormatError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| FormatError::codec(format, format!("codec task aborted: {}", e)))?
}

pub(super) fn finish_result(output: PathBuf, entries: usize) -> Result<PackResult, FormatError> {
    let size_bytes = std::fs::metadata(&output)?.len();
    Ok(PackResult {
        output,
        size_bytes,
        entries,
    })
}

/// Zip codec backed by the `zip` crate (deflate).
#[derive(Debug, Clone, Default)]
pub struct ZipCodec {
    level: Option<i64>,
}

impl ZipCodec {
    /// Creates a zip codec with an optional deflate level (0-9).
    pub fn new(level: Option<u32>) -> Self {
        Self {
            level: level.map(i64::from),
        }
    }

    fn pack_blocking(&self, request: &PackRequest) -> Result<PackResult, FormatError> {
        let entries = collect_entries(request)?;
        let file = File::create(&request.output)?;
        let mut writer = ZipWriter::new(BufWriter::new(file));

        // Fixed timestamps keep archives byte-identical across runs.
        let options = SimpleFileOptions::default()
            .compression_method(CompressionMethod::Deflated)
            .compression_level(self.level)
            .last_modified_time(zip::DateTime::default());

        for entry in &entries {
            if entry.is_dir {
                writer
                    .add_directory(format!("{}/", entry.name), options)
                    .map_err(|e| FormatError::codec("zip", e))?;
            } else {
                let mut input = File::open(&entry.path)?;
                let size = input.metadata()?.len();
                writer
                    .start_file(entry.name.as_str(), options.large_file(needs_zip64(size)))
                    .map_err(|e| FormatError::codec("zip", e))?;
                io::copy(&mut input, &mut writer)?;
            }
        }

        let mut inner = writer.finish().map_err(|e| FormatError::codec("zip", e))?;
        inner.flush()?;

        finish_result(request.output.clone(), entries.len())
    }
}

/// Entries this large must be written with zip64 extensions. Smaller ones
/// are written without them so their bytes stay unchanged.
fn needs_zip64(size: u64) -> bool {
    size >= u64::from(u32::MAX)
}

#[async_trait]
impl Packer for ZipCodec {
    fn name(&self) -> &str {
        "zip"
    }

    async fn pack(&self, request: PackRequest) -> Result<PackResult, FormatError> {
        let codec = self.clone();
        run_blocking("zip", move || codec.pack_blocking(&request)).await
    }
}

#[async_trait]
impl Unpacker for ZipCodec {
    fn name(&self) -> &str {
        "zip"
    }

    async fn unpack(&self, archive: &Path, dest_dir: &Path) -> Result<(), FormatError> {
        let archive = archive.to_path_buf();
        let dest_dir = dest_dir.to_path_buf();
        run_blocking("zip", move || {
            std::fs::create_dir_all(&dest_dir)?;
            let file = BufReader::new(File::open(&archive)?);
            let mut zip = ZipArchive::new(file).map_err(|e| FormatError::codec("zip", e))?;
            zip.extract(&dest_dir)
                .map_err(|e| FormatError::codec("zip", e))
        })
        .await
    }
}

/// Compression applied around a tar stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TarCompression {
    None,
    Gzip,
    Bzip2,
    Xz,
}

impl TarCompression {
    /// Registry name of the format using this compression.
    pub fn format_name(&self) -> &'static str {
        match self {
            Self::None => "tar",
            Self::Gzip => "gztar",
            Self::Bzip2 => "bztar",
            Self::Xz => "xztar",
        }
    }

    /// File extension of the format using this compression.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::None => ".tar",
            Self::Gzip => ".tar.gz",
            Self::Bzip2 => ".tar.bz2",
            Self::Xz => ".tar.xz",
        }
    }
}

/// Tar codec with optional gzip, bzip2 or xz compression.
#[derive(Debug, Clone, Copy)]
pub struct TarCodec {
    compression: TarCompression,
}

impl TarCodec {
    /// Creates a tar codec with the given compression.
    pub fn new(compression: TarCompression) -> Self {
        Self { compression }
    }

    /// Compression used by this codec.
    pub fn compression(&self) -> TarCompression {
        self.compression
    }

    fn pack_blocking(&self, request: &PackRequest) -> Result<PackResult, FormatError> {
        let entries = collect_entries(request)?;
        let writer = BufWriter::new(File::create(&request.output)?);

        let mut out = match self.compression {
            TarCompression::None => write_tar(writer, &entries)?,
            TarCompression::Gzip => {
                let encoder = flate2::write::GzEncoder::new(writer, flate2::Compression::default());
                write_tar(encoder, &entries)?.finish()?
            }
            TarCompression::Bzip2 => {
                let encoder =
                    bzip2::write::BzEncoder::new(writer, bzip2::Compression::default());
                write_tar(encoder, &entries)?.finish()?
            }
            TarCompression::Xz => {
                let encoder = xz2::write::XzEncoder::new(writer, 6);
                write_tar(encoder, &entries)?.finish()?
            }
        };
        out.flush()?;

        finish_result(request.output.clone(), entries.len())
    }

    fn unpack_blocking(&self, archive: &Path, dest_dir: &Path) -> Result<(), FormatError> {
        std::fs::create_dir_all(dest_dir)?;
        let file = BufReader::new(File::open(archive)?);
        match self.compression {
            TarCompression::None => tar::Archive::new(file).unpack(dest_dir)?,
            TarCompression::Gzip => {
                tar::Archive::new(flate2::read::GzDecoder::new(file)).unpack(dest_dir)?
            }
            TarCompression::Bzip2 => {
                tar::Archive::new(bzip2::read::BzDecoder::new(file)).unpack(dest_dir)?
            }
            TarCompression::Xz => {
                tar::Archive::new(xz2::read::XzDecoder::new(file)).unpack(dest_dir)?
            }
        }
        Ok(())
    }
}

fn write_tar<W: Write>(writer: W, entries: &[SourceEntry]) -> io::Result<W> {
    let mut builder = tar::Builder::new(writer);
    builder.mode(tar::HeaderMode::Deterministic);
    builder.follow_symlinks(false);

    for entry in entries {
        if entry.is_dir {
            builder.append_dir(&entry.name, &entry.path)?;
        } else {
            builder.append_path_with_name(&entry.path, &entry.name)?;
        }
    }

    builder.into_inner()
}

#[async_trait]
impl Packer for TarCodec {
    fn name(&self) -> &str {
        self.compression.format_name()
    }

    async fn pack(&self, request: PackRequest) -> Result<PackResult, FormatError> {
        let codec = *self;
        run_blocking(self.compression.format_name(), move || {
            codec.pack_blocking(&request)
        })
        .await
    }
}

#[async_trait]
impl Unpacker for TarCodec {
    fn name(&self) -> &str {
        self.compression.format_name()
    }

    async fn unpack(&self, archive: &Path, dest_dir: &Path) -> Result<(), FormatError> {
        let codec = *self;
        let archive = archive.to_path_buf();
        let dest_dir = dest_dir.to_path_buf();
        run_blocking(self.compression.format_name(), move || {
            codec.unpack_blocking(&archive, &dest_dir)
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_zip64_only_for_entries_past_u32() {
        assert!(!needs_zip64(0));
        assert!(!needs_zip64(u64::from(u32::MAX) - 1));
        assert!(needs_zip64(u64::from(u32::MAX)));
        assert!(needs_zip64(5 * 1024 * 1024 * 1024));
    }

    /// Builds `root/book/{cover.jpg, pages/001.jpg, pages/002.jpg}`.
    fn sample_tree() -> TempDir {
        let dir = TempDir::new().unwrap();
        let book = dir.path().join("book");
        fs::create_dir_all(book.join("pages")).unwrap();
        fs::write(book.join("cover.jpg"), b"cover").unwrap();
        fs::write(book.join("pages/001.jpg"), b"page one").unwrap();
        fs::write(book.join("pages/002.jpg"), b"page two").unwrap();
        dir
    }

    fn names(entries: &[SourceEntry]) -> Vec<&str> {
        entries.iter().map(|e| e.name.as_str()).collect()
    }

    #[test]
    fn test_collect_entries_contents() {
        let tree = sample_tree();
        let req = PackRequest::contents_of(tree.path().join("book"), tree.path().join("out"));
        let entries = collect_entries(&req).unwrap();
        assert_eq!(
            names(&entries),
            vec!["cover.jpg", "pages", "pages/001.jpg", "pages/002.jpg"]
        );
        assert!(entries[1].is_dir);
    }

    #[test]
    fn test_collect_entries_with_base_dir_prefix() {
        let tree = sample_tree();
        let req = PackRequest::subdir_of(tree.path(), "book", tree.path().join("book.zip"));
        let entries = collect_entries(&req).unwrap();
        assert_eq!(
            names(&entries),
            vec![
                "book",
                "book/cover.jpg",
                "book/pages",
                "book/pages/001.jpg",
                "book/pages/002.jpg"
            ]
        );
    }

    #[test]
    fn test_collect_entries_missing_source() {
        let tree = sample_tree();
        let req = PackRequest::contents_of(tree.path().join("nope"), tree.path().join("x.zip"));
        let err = collect_entries(&req).unwrap_err();
        assert!(matches!(err, FormatError::SourceNotFound { .. }));
    }

    #[tokio::test]
    async fn test_zip_pack_and_unpack() {
        let tree = sample_tree();
        let output = tree.path().join("book.zip");
        let codec = ZipCodec::default();

        let result = codec
            .pack(PackRequest::contents_of(tree.path().join("book"), &output))
            .await
            .unwrap();
        assert_eq!(result.output, output);
        assert_eq!(result.entries, 4);
        assert!(result.size_bytes > 0);

        let restored = tree.path().join("restored");
        codec.unpack(&output, &restored).await.unwrap();
        assert_eq!(fs::read(restored.join("pages/002.jpg")).unwrap(), b"page two");
        assert_eq!(fs::read(restored.join("cover.jpg")).unwrap(), b"cover");
    }

    #[tokio::test]
    async fn test_zip_pack_is_deterministic() {
        let tree = sample_tree();
        let codec = ZipCodec::new(Some(6));
        let first = tree.path().join("first.zip");
        let second = tree.path().join("second.zip");

        codec
            .pack(PackRequest::contents_of(tree.path().join("book"), &first))
            .await
            .unwrap();
        codec
            .pack(PackRequest::contents_of(tree.path().join("book"), &second))
            .await
            .unwrap();

        assert_eq!(fs::read(first).unwrap(), fs::read(second).unwrap());
    }

    #[tokio::test]
    async fn test_zip_unpack_rejects_garbage() {
        let tree = sample_tree();
        let bogus = tree.path().join("bogus.zip");
        fs::write(&bogus, b"definitely not a zip").unwrap();

        let err = ZipCodec::default()
            .unpack(&bogus, &tree.path().join("out"))
            .await
            .unwrap_err();
        assert!(matches!(err, FormatError::Codec { .. }));
    }

    #[tokio::test]
    async fn test_tar_family_round_trip_keeps_prefix() {
        for compression in [
            TarCompression::None,
            TarCompression::Gzip,
            TarCompression::Bzip2,
            TarCompression::Xz,
        ] {
            let tree = sample_tree();
            let output = tree.path().join(format!("book{}", compression.extension()));
            let codec = TarCodec::new(compression);

            let result = codec
                .pack(PackRequest::subdir_of(tree.path(), "book", &output))
                .await
                .unwrap();
            assert_eq!(result.entries, 5, "{:?}", compression);

            let restored = tree.path().join("restored");
            codec.unpack(&output, &restored).await.unwrap();
            assert_eq!(
                fs::read(restored.join("book/pages/001.jpg")).unwrap(),
                b"page one",
                "{:?}",
                compression
            );
        }
    }

    #[test]
    fn test_tar_compression_names() {
        assert_eq!(TarCompression::Gzip.format_name(), "gztar");
        assert_eq!(TarCompression::Bzip2.extension(), ".tar.bz2");
        assert_eq!(Packer::name(&TarCodec::new(TarCompression::Xz)), "xztar");
    }
}

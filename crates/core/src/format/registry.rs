//! Name-to-format lookup.

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::{debug, info};

use super::capabilities::CodecCapabilities;
use super::config::CodecConfig;
use super::error::FormatError;
use super::native::{TarCodec, TarCompression, ZipCodec};
use super::sevenzip::SevenZipCodec;
use super::types::ArchiveFormat;

/// Registered archive formats, keyed by name.
///
/// Seeded once at startup and then only read; share it behind `Arc`.
#[derive(Debug, Clone, Default)]
pub struct FormatRegistry {
    formats: BTreeMap<String, ArchiveFormat>,
    aliases: BTreeMap<String, String>,
}

impl FormatRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the formats that need no external tools:
    /// zip, tar, gztar, bztar and xztar.
    pub fn with_builtin(config: &CodecConfig) -> Self {
        let mut registry = Self::new();

        let zip = Arc::new(ZipCodec::new(config.zip_compression_level));
        registry.register(ArchiveFormat::new("zip", ".zip", zip.clone(), Some(zip)));

        for compression in [
            TarCompression::None,
            TarCompression::Gzip,
            TarCompression::Bzip2,
            TarCompression::Xz,
        ] {
            let codec = Arc::new(TarCodec::new(compression));
            registry.register(ArchiveFormat::new(
                compression.format_name(),
                compression.extension(),
                codec.clone(),
                Some(codec),
            ));
        }

        registry
    }

    /// Built-in formats plus whatever optional codecs were detected.
    pub fn seed(config: &CodecConfig, capabilities: &CodecCapabilities) -> Self {
        let mut registry = Self::with_builtin(config);

        match &capabilities.sevenzip {
            Some(tool) => {
                info!(
                    path = %tool.path.display(),
                    version = tool.version.as_deref().unwrap_or("unknown"),
                    "7-Zip available, registering 7zip format"
                );
                let codec = Arc::new(SevenZipCodec::new(tool.clone()));
                registry.register(ArchiveFormat::new("7zip", ".7z", codec.clone(), Some(codec)));
                registry.register_alias("7z", "7zip");
            }
            None => debug!("7-Zip not found, 7zip format unavailable"),
        }

        registry
    }

    /// Adds or replaces a format under its name.
    pub fn register(&mut self, format: ArchiveFormat) {
        debug!(name = %format.name, extension = %format.extension, "Registered archive format");
        self.formats.insert(format.name.clone(), format);
    }

    /// Makes `alias` resolve to the format registered as `name`.
    pub fn register_alias(&mut self, alias: impl Into<String>, name: impl Into<String>) {
        self.aliases.insert(alias.into(), name.into());
    }

    /// Resolves a format by name or alias.
    pub fn lookup(&self, name: &str) -> Result<ArchiveFormat, FormatError> {
        let canonical = self.aliases.get(name).map(String::as_str).unwrap_or(name);
        self.formats
            .get(canonical)
            .cloned()
            .ok_or_else(|| FormatError::UnknownFormat {
                name: name.to_string(),
                available: self.names().join(", "),
            })
    }

    /// Whether `name` resolves to a registered format.
    pub fn contains(&self, name: &str) -> bool {
        self.lookup(name).is_ok()
    }

    /// Registered format names, sorted. Aliases are not listed.
    pub fn names(&self) -> Vec<String> {
        self.formats.keys().cloned().collect()
    }
}

//! Archive format registry and codecs.
//!
//! This module maps format names (as typed on the command line) to an
//! extension and the codecs that write and read archives of that format.
//!
//! # Formats
//!
//! - `zip` (deflate, via the `zip` crate)
//! - `tar`, `gztar`, `bztar`, `xztar` (via `tar` with gzip, bzip2 or xz)
//! - `7zip`, alias `7z` (only when a 7-Zip binary is found)
//!
//! # Example
//!
//! ```ignore
//! use archivist_core::format::{CodecCapabilities, CodecConfig, FormatRegistry, PackRequest};
//!
//! let config = CodecConfig::default();
//! let caps = CodecCapabilities::detect(&config).await;
//! let registry = FormatRegistry::seed(&config, &caps);
//!
//! let zip = registry.lookup("zip")?;
//! let target = zip.target_for_directory(Path::new("/work/photos"));
//! zip.packer
//!     .pack(PackRequest::subdir_of("/work", "photos", &target))
//!     .await?;
//! ```

mod capabilities;
mod config;
mod error;
pub(crate) mod native;
mod registry;
mod sevenzip;
mod traits;
mod types;

pub use capabilities::{parse_sevenzip_version, CodecCapabilities, SevenZipTool};
pub use config::CodecConfig;
pub use error::FormatError;
pub use native::{TarCodec, TarCompression, ZipCodec};
pub use registry::FormatRegistry;
pub use sevenzip::SevenZipCodec;
pub use traits::{Packer, Unpacker};
pub use types::{ArchiveFormat, PackRequest, PackResult};

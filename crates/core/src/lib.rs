pub mod config;
pub mod extractor;
pub mod format;
pub mod pipeline;
pub mod scanner;
pub mod testing;

pub use config::{
    load_config, load_config_from_str, load_default_config, validate_config, Config, ConfigError,
};
pub use extractor::{CommandExtractor, DirectorySource, Extractor, ExtractorConfig, ExtractorError};
pub use format::{
    ArchiveFormat, CodecCapabilities, CodecConfig, FormatError, FormatRegistry, PackRequest,
    PackResult, Packer, Unpacker,
};
pub use pipeline::{
    Batch, BatchReport, Candidate, Pipeline, PipelineConfig, PipelineError, ShutdownSignal,
    TaskOutcome, TaskStatus, WorkerPool,
};
pub use scanner::{scan, Scan, ScanError, ScanTally, Scanner};

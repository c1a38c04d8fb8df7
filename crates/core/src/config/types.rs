use serde::{Deserialize, Serialize};

use crate::extractor::ExtractorConfig;
use crate::format::CodecConfig;
use crate::pipeline::PipelineConfig;

/// Root configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub pipeline: PipelineConfig,
    #[serde(default)]
    pub extractor: ExtractorConfig,
    #[serde(default)]
    pub codecs: CodecConfig,
}

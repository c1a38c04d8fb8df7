use super::{types::Config, ConfigError};

/// Validate configuration
/// Currently validates:
/// - At least one worker
/// - Extractor command and timeout are usable
/// - Zip compression level is in range
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.pipeline.max_workers == 0 {
        return Err(ConfigError::ValidationError(
            "pipeline.max_workers must be at least 1".to_string(),
        ));
    }

    if config.extractor.command.trim().is_empty() {
        return Err(ConfigError::ValidationError(
            "extractor.command cannot be empty".to_string(),
        ));
    }

    if config.extractor.timeout_secs == 0 {
        return Err(ConfigError::ValidationError(
            "extractor.timeout_secs cannot be 0".to_string(),
        ));
    }

    if let Some(level) = config.codecs.zip_compression_level {
        if level > 9 {
            return Err(ConfigError::ValidationError(format!(
                "codecs.zip_compression_level must be 0-9, got {}",
                level
            )));
        }
    }

    Ok(())
}

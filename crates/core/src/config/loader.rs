use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use std::path::Path;

use super::{types::Config, ConfigError};

/// Prefix for environment overrides, e.g. `ARCHIVIST_PIPELINE__MAX_WORKERS=8`.
pub const ENV_PREFIX: &str = "ARCHIVIST_";

/// Load configuration from file with environment variable overrides
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::FileNotFound(path.display().to_string()));
    }

    base_figment()
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
        .map_err(|e| ConfigError::ParseError(e.to_string()))
}

/// Load built-in defaults with environment variable overrides (no file).
pub fn load_default_config() -> Result<Config, ConfigError> {
    base_figment()
        .merge(env_provider())
        .extract()
        .map_err(|e| ConfigError::ParseError(e.to_string()))
}

/// Load configuration from TOML string (useful for testing)
pub fn load_config_from_str(toml_str: &str) -> Result<Config, ConfigError> {
    toml::from_str(toml_str).map_err(|e| ConfigError::ParseError(e.to_string()))
}

fn base_figment() -> Figment {
    Figment::from(Serialized::defaults(Config::default()))
}

fn env_provider() -> Env {
    // The config file location is read by the CLI, not a config key.
    Env::prefixed(ENV_PREFIX)
        .ignore(&["CONFIG"])
        .split("__")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::path::PathBuf;
    use tempfile::NamedTempFile;

    #[test]
    fn test_load_config_from_str_empty_uses_defaults() {
        let config = load_config_from_str("").unwrap();
        assert_eq!(config.pipeline.max_workers, 4);
        assert_eq!(config.extractor.command, "mobiunpack");
        assert!(config.codecs.sevenzip_path.is_none());
    }

    #[test]
    fn test_load_config_from_str_partial_section() {
        let toml = r#"
[pipeline]
max_workers = 8
"#;
        let config = load_config_from_str(toml).unwrap();
        assert_eq!(config.pipeline.max_workers, 8);
        // Untouched fields keep their defaults
        assert_eq!(config.extractor.timeout_secs, 600);
    }

    #[test]
    fn test_load_config_from_str_wrong_type() {
        let toml = r#"
[pipeline]
max_workers = "many"
"#;
        let result = load_config_from_str(toml);
        assert!(matches!(result, Err(ConfigError::ParseError(_))));
    }

    #[test]
    fn test_load_config_file_not_found() {
        let result = load_config(Path::new("/nonexistent/archivist.toml"));
        assert!(matches!(result, Err(ConfigError::FileNotFound(_))));
    }

    #[test]
    fn test_load_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        writeln!(
            temp_file,
            r#"
[extractor]
command = "/opt/kindleunpack/bin/unpack"
args = ["--images", "{{input}}", "{{output}}"]

[codecs]
sevenzip_path = "/usr/local/bin/7zz"
"#
        )
        .unwrap();

        let config = load_config(temp_file.path()).unwrap();
        assert_eq!(config.extractor.command, "/opt/kindleunpack/bin/unpack");
        assert_eq!(config.extractor.args.len(), 3);
        assert_eq!(
            config.codecs.sevenzip_path,
            Some(PathBuf::from("/usr/local/bin/7zz"))
        );
        assert_eq!(config.pipeline.max_workers, 4);
    }
}

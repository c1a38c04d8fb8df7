//! Shared driver: configuration, registry, scan, pool, report.

use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::signal;
use tracing::{debug, error, info, warn};

use archivist_core::extractor::{CommandExtractor, DirectorySource, Extractor};
use archivist_core::format::{CodecCapabilities, FormatRegistry};
use archivist_core::pipeline::{BatchReport, Pipeline, ShutdownSignal};
use archivist_core::scanner::{Scan, Scanner};
use archivist_core::{load_config, load_default_config, validate_config, Config};

use crate::args::{CommonArgs, DirArchiveArgs, Mobi2ArchiveArgs};

/// Exit status for errors that stop the batch before it starts.
pub const EXIT_FATAL: u8 = 2;

/// Exit status when a second interrupt abandons running conversions.
pub const EXIT_INTERRUPTED: i32 = 130;

/// Extension of the container files `mobi2archive` converts.
const MOBI_EXTENSION: &str = "mobi";

/// Archives every top-level directory of `args.directory`.
pub async fn run_dir_archive(args: DirArchiveArgs) -> Result<BatchReport> {
    let config = load_settings(&args.common, args.max_workers)?;
    let registry = seed_registry(&config).await;

    let format = registry.lookup(&args.format)?;
    let scan = Scanner::new(format)
        .with_force(args.force)
        .scan_directories(&args.directory)?;

    let extractor: Arc<dyn Extractor> = Arc::new(DirectorySource::new());
    run_pipeline(&config, extractor, scan).await
}

/// Converts every `.mobi` file below `args.directory`.
pub async fn run_mobi2archive(args: Mobi2ArchiveArgs) -> Result<BatchReport> {
    let config = load_settings(&args.common, args.max_workers)?;
    let registry = seed_registry(&config).await;

    let format_name = args.format.clone().unwrap_or_else(|| {
        if registry.contains("7zip") {
            "7zip".to_string()
        } else {
            "zip".to_string()
        }
    });
    let format = registry.lookup(&format_name)?;
    debug!(format = %format.name, "Target format selected");

    let extractor = CommandExtractor::new(config.extractor.clone());
    if let Err(e) = extractor.validate().await {
        warn!("{}; every conversion will fail", e);
    }

    let scan = Scanner::new(format)
        .with_force(args.force)
        .scan_files(&args.directory, MOBI_EXTENSION)?;

    run_pipeline(&config, Arc::new(extractor), scan).await
}

/// Maps a run result to the process exit status, logging fatal errors.
pub fn finish(result: Result<BatchReport>) -> ExitCode {
    match result {
        Ok(report) => ExitCode::from(report.exit_code()),
        Err(e) => {
            error!("Fatal error: {:#}", e);
            ExitCode::from(EXIT_FATAL)
        }
    }
}

/// Defaults, then the config file, then `ARCHIVIST_` variables, then flags.
fn load_settings(common: &CommonArgs, max_workers: Option<usize>) -> Result<Config> {
    let mut config = match common.config_path() {
        Some(path) => {
            info!("Loading configuration from {:?}", path);
            load_config(&path)
                .with_context(|| format!("Failed to load config from {:?}", path))?
        }
        None => load_default_config().context("Failed to load configuration")?,
    };

    if let Some(workers) = max_workers {
        config.pipeline.max_workers = workers;
    }

    validate_config(&config).context("Configuration validation failed")?;
    Ok(config)
}

async fn seed_registry(config: &Config) -> FormatRegistry {
    let capabilities = CodecCapabilities::detect(&config.codecs).await;
    let registry = FormatRegistry::seed(&config.codecs, &capabilities);
    debug!(formats = %registry.names().join(", "), "Format registry ready");
    registry
}

async fn run_pipeline(
    config: &Config,
    extractor: Arc<dyn Extractor>,
    scan: Scan,
) -> Result<BatchReport> {
    let pipeline = Pipeline::new(&config.pipeline, extractor)?;
    let watcher = tokio::spawn(stop_on_interrupt(pipeline.shutdown_signal()));

    let report = pipeline.run_scan(scan).await;
    watcher.abort();
    Ok(report)
}

/// Triggers `shutdown` on Ctrl+C (or SIGTERM). A second Ctrl+C exits
/// without waiting for running conversions.
async fn stop_on_interrupt(shutdown: ShutdownSignal) {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    warn!("Interrupt received, waiting for running conversions to finish (Ctrl+C again to abort)");
    shutdown.trigger();

    if signal::ctrl_c().await.is_ok() {
        error!("Second interrupt received, aborting");
        std::process::exit(EXIT_INTERRUPTED);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use archivist_core::pipeline::EXIT_FAILURES;

    fn common() -> CommonArgs {
        CommonArgs {
            config: None,
            verbose: 0,
            quiet: false,
        }
    }

    #[test]
    fn test_load_settings_cli_overrides_workers() {
        let config = load_settings(&common(), Some(9)).unwrap();
        assert_eq!(config.pipeline.max_workers, 9);
    }

    #[test]
    fn test_load_settings_rejects_zero_workers() {
        assert!(load_settings(&common(), Some(0)).is_err());
    }

    #[test]
    fn test_load_settings_missing_file() {
        let mut args = common();
        args.config = Some("/nonexistent/archivist.toml".into());
        let err = load_settings(&args, None).unwrap_err();
        assert!(format!("{:#}", err).contains("not found"));
    }

    #[test]
    fn test_finish_maps_fatal_errors() {
        assert_eq!(
            finish(Err(anyhow::anyhow!("boom"))),
            ExitCode::from(EXIT_FATAL)
        );
        assert_eq!(finish(Ok(BatchReport::default())), ExitCode::SUCCESS);
        assert_ne!(EXIT_FATAL, EXIT_FAILURES);
    }

    #[tokio::test]
    async fn test_dir_archive_unknown_format() {
        let dir = tempfile::tempdir().unwrap();
        let args = DirArchiveArgs {
            format: "rar".to_string(),
            directory: dir.path().to_path_buf(),
            max_workers: None,
            force: false,
            common: common(),
        };
        let err = run_dir_archive(args).await.unwrap_err();
        assert!(err.to_string().contains("Unknown archive format 'rar'"));
    }
}

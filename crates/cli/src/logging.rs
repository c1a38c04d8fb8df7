//! Logging setup for one invocation.

use std::io::{IsTerminal, Write};

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::args::CommonArgs;

/// Installs the global subscriber and flushes stderr when dropped.
///
/// Keep it alive for the whole of `main`.
#[derive(Debug)]
pub struct LoggingContext {
    installed: bool,
}

impl LoggingContext {
    /// Logs to stderr. `-v`/`-q` pick the level; otherwise `RUST_LOG`
    /// applies, defaulting to `info`.
    pub fn init(args: &CommonArgs) -> Self {
        let filter = match level_for(args) {
            Some(level) => EnvFilter::new(level),
            None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        };

        let installed = tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_ansi(std::io::stderr().is_terminal())
                    .with_target(false),
            )
            .try_init()
            .is_ok();

        Self { installed }
    }

    /// Whether this context installed the global subscriber.
    pub fn is_installed(&self) -> bool {
        self.installed
    }
}

impl Drop for LoggingContext {
    fn drop(&mut self) {
        let _ = std::io::stderr().flush();
    }
}

fn level_for(args: &CommonArgs) -> Option<&'static str> {
    if args.quiet {
        return Some("warn");
    }
    match args.verbose {
        0 => None,
        1 => Some("debug"),
        _ => Some("trace"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn common(verbose: u8, quiet: bool) -> CommonArgs {
        CommonArgs {
            config: None,
            verbose,
            quiet,
        }
    }

    #[test]
    fn test_level_for_flags() {
        assert_eq!(level_for(&common(0, false)), None);
        assert_eq!(level_for(&common(1, false)), Some("debug"));
        assert_eq!(level_for(&common(3, false)), Some("trace"));
        assert_eq!(level_for(&common(0, true)), Some("warn"));
    }

    #[test]
    fn test_second_init_is_harmless() {
        let first = LoggingContext::init(&common(0, true));
        let second = LoggingContext::init(&common(0, true));
        assert!(!(first.is_installed() && second.is_installed()));
    }
}

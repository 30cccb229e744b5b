//! Tracing subscriber setup.
//!
//! CLI subcommands log to stderr so stdout stays clean for reports and JSON.
//! The dashboard owns the terminal, so it logs to a daily file under `logs/`.

use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use crate::error::AppError;

/// Where log lines go.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogTarget<'a> {
    Stderr,
    /// Daily-rolling `goals.log.YYYY-MM-DD` files in this directory.
    File(&'a Path),
}

/// Default filter directive when `RUST_LOG` is unset.
pub fn default_directive(verbose: bool) -> &'static str {
    if verbose { "debug" } else { "info" }
}

/// Install the global subscriber.
///
/// The returned guard flushes the file writer on drop; hold it for the life of
/// the program. A second call (tests, re-entry) is a no-op.
pub fn init(target: LogTarget<'_>, verbose: bool) -> Result<Option<WorkerGuard>, AppError> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(verbose)));

    match target {
        LogTarget::Stderr => {
            let subscriber = FmtSubscriber::builder()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .finish();
            let _ = tracing::subscriber::set_global_default(subscriber);
            Ok(None)
        }
        LogTarget::File(dir) => {
            std::fs::create_dir_all(dir).map_err(|e| {
                AppError::new(2, format!("Failed to create log directory {}: {e}", dir.display()))
            })?;
            let appender = tracing_appender::rolling::daily(dir, "goals.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let subscriber = FmtSubscriber::builder()
                .with_env_filter(filter)
                .with_ansi(false)
                .with_writer(writer)
                .finish();
            let _ = tracing::subscriber::set_global_default(subscriber);
            Ok(Some(guard))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verbose_raises_default_level() {
        assert_eq!(default_directive(false), "info");
        assert_eq!(default_directive(true), "debug");
    }
}

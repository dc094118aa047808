//! Tracing subscriber setup
//!
//! Log lines go to the console and, unless disabled, to a single
//! non-rotating `memory_optimiser.log` in the configured directory.

use std::path::{Path, PathBuf};

use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::fmt;
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

use crate::core::config::LoggingSettings;

pub const LOG_FILE_NAME: &str = "memory_optimiser.log";

/// Install the global subscriber: console always, log file unless disabled.
///
/// `RUST_LOG` takes precedence over the configured level.
pub fn init(settings: &LoggingSettings) -> anyhow::Result<()> {
    let console_layer = fmt::layer()
        .with_target(false)
        .with_filter(build_filter(&settings.level)?);

    let file_layer = if settings.file {
        std::fs::create_dir_all(&settings.log_dir)?;
        let file_appender = RollingFileAppender::builder()
            .rotation(Rotation::NEVER)
            .filename_prefix(LOG_FILE_NAME)
            .build(&settings.log_dir)?;
        Some(
            fmt::layer()
                .with_ansi(false)
                .with_target(false)
                .with_writer(file_appender)
                .with_filter(build_filter(&settings.level)?),
        )
    } else {
        None
    };

    tracing_subscriber::registry()
        .with(console_layer)
        .with(file_layer)
        .try_init()?;

    Ok(())
}

fn build_filter(level: &str) -> anyhow::Result<EnvFilter> {
    match EnvFilter::try_from_default_env() {
        Ok(filter) => Ok(filter),
        Err(_) => Ok(EnvFilter::try_new(level)?),
    }
}

pub fn log_file_path(log_dir: &Path) -> PathBuf {
    log_dir.join(LOG_FILE_NAME)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_filter_accepts_levels() {
        for level in ["info", "debug", "warn", "memory_optimiser=trace"] {
            assert!(build_filter(level).is_ok(), "{}", level);
        }
    }

    #[test]
    fn test_log_file_path() {
        assert_eq!(
            log_file_path(Path::new("logs")),
            PathBuf::from("logs/memory_optimiser.log")
        );
    }
}

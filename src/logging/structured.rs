//! Structured logging setup using tracing
//!
//! Console output for interactive runs plus an optional rolling JSON log
//! file. The returned guard must be kept alive for the duration of the
//! program so buffered file logs are flushed.

use crate::config::LoggingConfig;
use crate::domain::{Result, SyncError};
use tracing::Level;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

/// Guard that must be kept alive for the duration of the program
/// to ensure logs are flushed properly
pub struct LoggingGuard {
    _file_guard: Option<WorkerGuard>,
}

impl LoggingGuard {
    fn new(file_guard: Option<WorkerGuard>) -> Self {
        Self {
            _file_guard: file_guard,
        }
    }
}

/// Initialize the logging system based on configuration
///
/// Returns a [`LoggingGuard`] that must be held for the lifetime of the
/// program.
pub fn init_logging(log_level_str: &str, config: &LoggingConfig) -> Result<LoggingGuard> {
    let log_level = parse_log_level(log_level_str)?;

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("tabsync={log_level}")));

    let mut layers = Vec::new();

    if config.console_enabled {
        let console_layer = tracing_subscriber::fmt::layer()
            .with_target(true)
            .with_filter(env_filter.clone());
        layers.push(console_layer.boxed());
    }

    let file_guard = if config.file_enabled {
        std::fs::create_dir_all(&config.file_path).map_err(|e| {
            SyncError::Configuration(format!(
                "Failed to create log directory {}: {}",
                config.file_path, e
            ))
        })?;

        let file_appender =
            RollingFileAppender::new(Rotation::DAILY, &config.file_path, "tabsync.log");
        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

        let file_layer = tracing_subscriber::fmt::layer()
            .json()
            .with_target(true)
            .with_writer(non_blocking)
            .with_filter(env_filter);
        layers.push(file_layer.boxed());
        Some(guard)
    } else {
        None
    };

    tracing_subscriber::registry().with(layers).init();

    tracing::info!(
        log_level = %log_level,
        file_logging = config.file_enabled,
        "Logging initialized"
    );

    Ok(LoggingGuard::new(file_guard))
}

fn parse_log_level(level: &str) -> Result<Level> {
    match level.to_lowercase().as_str() {
        "trace" => Ok(Level::TRACE),
        "debug" => Ok(Level::DEBUG),
        "info" => Ok(Level::INFO),
        "warn" => Ok(Level::WARN),
        "error" => Ok(Level::ERROR),
        other => Err(SyncError::Configuration(format!(
            "Invalid log level: {other}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_log_level() {
        assert_eq!(parse_log_level("info").unwrap(), Level::INFO);
        assert_eq!(parse_log_level("DEBUG").unwrap(), Level::DEBUG);
        assert!(parse_log_level("verbose").is_err());
    }

    // Only test in this binary that installs the global subscriber
    #[test]
    fn test_guard_drop_flushes_file_logs() {
        let dir = tempfile::tempdir().unwrap();
        let config = LoggingConfig {
            console_enabled: false,
            file_enabled: true,
            file_path: dir.path().to_string_lossy().to_string(),
        };

        let guard = init_logging("info", &config).unwrap();
        tracing::info!("log line buffered in the non-blocking writer");
        drop(guard);

        let written: u64 = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|entry| entry.unwrap().metadata().unwrap().len())
            .sum();
        assert!(written > 0);
    }
}

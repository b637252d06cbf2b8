//! Global `tracing` subscriber built from [`LogConfig`](super::LogConfig).

use super::config::{LogConfig, LogFormat};
use anyhow::Result;
use std::io;
use tracing::Level;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, Registry};

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// Logger implementation using tracing
///
/// Holds the file writer's guard. Dropping the logger flushes and closes the
/// log file, so keep it alive for the whole process.
pub struct LoggerImpl {
    _guard: Option<WorkerGuard>,
}

impl LoggerImpl {
    /// Install the global subscriber described by `config`.
    ///
    /// # Errors
    /// Returns an error if the level is invalid or a global subscriber is
    /// already installed.
    pub fn init(config: &LogConfig) -> Result<Self> {
        let default_level = parse_log_level(&config.level)?;
        let filter = || {
            EnvFilter::builder()
                .with_default_directive(default_level.into())
                .from_env_lossy()
        };

        let mut layers: Vec<BoxedLayer> = Vec::new();

        if config.enable_console {
            let console = match config.format {
                LogFormat::Json => tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(io::stderr)
                    .with_current_span(true)
                    .with_target(true)
                    .with_filter(filter())
                    .boxed(),
                LogFormat::Pretty => tracing_subscriber::fmt::layer()
                    .with_writer(io::stderr)
                    .with_target(true)
                    .with_span_events(FmtSpan::CLOSE)
                    .with_filter(filter())
                    .boxed(),
            };
            layers.push(console);
        }

        let guard = if let Some(appender) = config.file_appender() {
            let (writer, guard) = tracing_appender::non_blocking(appender);

            // Files are always JSON
            layers.push(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(writer)
                    .with_ansi(false)
                    .with_current_span(true)
                    .with_span_list(true)
                    .with_target(true)
                    .with_file(true)
                    .with_line_number(true)
                    .with_filter(filter())
                    .boxed(),
            );
            Some(guard)
        } else {
            None
        };

        tracing_subscriber::registry().with(layers).try_init()?;

        tracing::debug!(
            level = %config.level,
            format = ?config.format,
            file_output = config.log_dir.is_some(),
            "logger initialized"
        );

        Ok(Self { _guard: guard })
    }
}

/// Parse a log level name, ignoring case.
pub fn parse_log_level(level: &str) -> Result<Level> {
    match level.to_lowercase().as_str() {
        "trace" => Ok(Level::TRACE),
        "debug" => Ok(Level::DEBUG),
        "info" => Ok(Level::INFO),
        "warn" => Ok(Level::WARN),
        "error" => Ok(Level::ERROR),
        _ => anyhow::bail!("Invalid log level: {level}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::logging::RotationPolicy;

    #[test]
    fn test_parse_log_level() {
        assert!(matches!(parse_log_level("trace"), Ok(Level::TRACE)));
        assert!(matches!(parse_log_level("WARN"), Ok(Level::WARN)));
        assert!(matches!(parse_log_level("error"), Ok(Level::ERROR)));
        assert!(parse_log_level("verbose").is_err());
    }

    #[test]
    fn test_logger_init_rejects_bad_level() {
        let config = LogConfig {
            level: "loud".to_string(),
            ..LogConfig::default()
        };
        assert!(LoggerImpl::init(&config).is_err());
    }

    #[test]
    fn test_logger_init_with_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = LogConfig {
            level: "debug".to_string(),
            format: LogFormat::Json,
            log_dir: Some(dir.path().to_path_buf()),
            enable_console: false,
            rotation: RotationPolicy::Never,
            ..LogConfig::default()
        };

        // Only the first global subscriber in the test binary can be installed
        if let Ok(logger) = LoggerImpl::init(&config) {
            assert!(logger._guard.is_some());
        }
    }
}

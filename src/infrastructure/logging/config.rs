//! The `logging` section of the configuration file.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing_appender::rolling::{self, RollingFileAppender};

/// Where log events go and how they look.
///
/// Events land on stderr so `--json` command output on stdout stays
/// machine-readable. Files are written only when `log_dir` is set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogConfig {
    /// Minimum level: trace, debug, info, warn or error. `RUST_LOG` refines it.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Stderr rendering
    #[serde(default)]
    pub format: LogFormat,

    /// Rolling JSON log files go here when set
    #[serde(default)]
    pub log_dir: Option<PathBuf>,

    /// Emit events on stderr
    #[serde(default = "default_true")]
    pub enable_console: bool,

    /// How often a new log file is started
    #[serde(default)]
    pub rotation: RotationPolicy,

    /// Log file name, before the rotation suffix
    #[serde(default = "default_file_prefix")]
    pub file_prefix: String,
}

impl LogConfig {
    /// File appender for `log_dir`, if file logging is on.
    pub fn file_appender(&self) -> Option<RollingFileAppender> {
        self.log_dir
            .as_deref()
            .map(|dir| self.rotation.appender(dir, &self.file_prefix))
    }
}

/// Stderr event format.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// One JSON object per event
    Json,
    /// Human-readable lines
    #[default]
    Pretty,
}

/// Log file rollover cadence.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RotationPolicy {
    /// New file each day
    #[default]
    Daily,
    /// New file each hour
    Hourly,
    /// One file for ever
    Never,
}

impl RotationPolicy {
    /// Appender writing `{dir}/{prefix}[.suffix]` on this cadence.
    pub fn appender(self, dir: &Path, prefix: &str) -> RollingFileAppender {
        match self {
            Self::Daily => rolling::daily(dir, prefix),
            Self::Hourly => rolling::hourly(dir, prefix),
            Self::Never => rolling::never(dir, prefix),
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
            log_dir: None,
            enable_console: true,
            rotation: RotationPolicy::default(),
            file_prefix: default_file_prefix(),
        }
    }
}

// Agents log at info; a run stays quiet unless asked.
fn default_log_level() -> String {
    "warn".to_string()
}

fn default_file_prefix() -> String {
    "meta-factory.log".to_string()
}

const fn default_true() -> bool {
    true
}

//! Logging infrastructure
//!
//! Structured logging with `tracing`: a console layer in JSON or pretty form
//! and an optional rolling JSON file layer.

pub mod config;
pub mod logger;

pub use config::{LogConfig, LogFormat, RotationPolicy};
pub use logger::{parse_log_level, LoggerImpl};

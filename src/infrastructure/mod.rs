//! Infrastructure layer module
//!
//! Concerns outside the critique core:
//! - Configuration management (figment)
//! - Logging infrastructure (tracing)
//! - Run artifact persistence
//! - Output validation for model responses

pub mod config;
pub mod logging;
pub mod persistence;
pub mod validators;

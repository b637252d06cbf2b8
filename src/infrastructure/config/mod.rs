//! Configuration management infrastructure
//!
//! Hierarchical configuration using figment: defaults, project YAML files and
//! `META_FACTORY_*` environment overrides, validated after extraction.

pub mod loader;

pub use loader::{ConfigError, ConfigLoader};

//! Layered configuration: defaults, YAML files, then `META_FACTORY_*` variables.

use std::path::Path;

use anyhow::{Context, Result};
use figment::providers::{Env, Format, Serialized, Yaml};
use figment::Figment;
use thiserror::Error;

use crate::domain::models::config::{Config, ModelsConfig, ProviderKind};

const ENV_PREFIX: &str = "META_FACTORY_";

/// Configuration error types
#[derive(Error, Debug, PartialEq)]
pub enum ConfigError {
    /// Budget cap at or below zero
    #[error("Invalid max_cost_usd: {0}. Must be positive")]
    InvalidBudget(f64),

    /// Critique loop allowed no rounds
    #[error("Invalid max_iterations: {0}. Must be at least 1")]
    InvalidMaxIterations(u32),

    /// A score threshold outside the unit interval
    #[error("Invalid {name}: {value}. Must be between 0.0 and 1.0")]
    InvalidThreshold {
        /// Setting name
        name: &'static str,
        /// Rejected value
        value: f64,
    },

    /// Zero output token cap
    #[error("Invalid max_tokens: {0}. Must be at least 1")]
    InvalidMaxTokens(u32),

    /// Unknown log level name
    #[error("Invalid log level: {0}. Must be one of: trace, debug, info, warn, error")]
    InvalidLogLevel(String),

    /// No default model id
    #[error("models.default_model cannot be empty")]
    EmptyDefaultModel,

    /// Negative fallback rates
    #[error("Invalid fallback pricing: input {input}, output {output}. Rates cannot be negative")]
    InvalidPricing {
        /// Rejected input rate
        input: f64,
        /// Rejected output rate
        output: f64,
    },
}

/// Configuration loader with hierarchical merging
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration with hierarchical merging
    ///
    /// Precedence (lowest to highest):
    /// 1. Programmatic defaults
    /// 2. .meta-factory/config.yaml
    /// 3. .meta-factory/local.yaml
    /// 4. Environment variables (`META_FACTORY_*`, `__` separates nested keys)
    pub fn load() -> Result<Config> {
        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(".meta-factory/config.yaml"))
            .merge(Yaml::file(".meta-factory/local.yaml"))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()
            .context("Failed to extract configuration from figment")?;

        let config = Self::with_vendor_models(config);
        Self::validate(&config)?;
        Ok(config)
    }

    /// Load configuration from a specific file over the defaults
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Config> {
        let path = path.as_ref();
        if !path.exists() {
            anyhow::bail!("Config file not found: {}", path.display());
        }

        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(path))
            .extract()
            .with_context(|| format!("Failed to load config from {}", path.display()))?;

        let config = Self::with_vendor_models(config);
        Self::validate(&config)?;
        Ok(config)
    }

    /// Swap the Anthropic tier table for the selected vendor's when the user
    /// left `models` untouched.
    pub fn with_vendor_models(mut config: Config) -> Config {
        if config.provider.kind != ProviderKind::Anthropic && config.models == ModelsConfig::default() {
            tracing::debug!(provider = %config.provider.kind, "Using vendor default model tiers");
            config.models = ModelsConfig::for_provider(config.provider.kind);
        }
        config
    }

    /// Validate configuration after loading
    pub fn validate(config: &Config) -> Result<(), ConfigError> {
        if config.budget.max_cost_usd <= 0.0 || !config.budget.max_cost_usd.is_finite() {
            return Err(ConfigError::InvalidBudget(config.budget.max_cost_usd));
        }

        if config.critic.max_iterations == 0 {
            return Err(ConfigError::InvalidMaxIterations(config.critic.max_iterations));
        }

        for (name, value) in [
            ("pass_threshold", config.critic.pass_threshold),
            ("similarity_threshold", config.critic.similarity_threshold),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::InvalidThreshold { name, value });
            }
        }

        if config.agent.max_tokens == 0 {
            return Err(ConfigError::InvalidMaxTokens(config.agent.max_tokens));
        }

        let valid_log_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_log_levels.contains(&config.logging.level.to_lowercase().as_str()) {
            return Err(ConfigError::InvalidLogLevel(config.logging.level.clone()));
        }

        if config.models.default_model.trim().is_empty() {
            return Err(ConfigError::EmptyDefaultModel);
        }

        if config.pricing.input_per_million < 0.0 || config.pricing.output_per_million < 0.0 {
            return Err(ConfigError::InvalidPricing {
                input: config.pricing.input_per_million,
                output: config.pricing.output_per_million,
            });
        }

        Ok(())
    }
}

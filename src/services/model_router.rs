//! Tier-to-model resolution.
//!
//! Agents and critics ask for a tier (`tier0`..`tier3`) or the `default`
//! alias. One configuration-driven table turns that into a concrete model id.

use std::collections::BTreeMap;

use crate::domain::models::config::ModelsConfig;
use crate::domain::ports::ModelResolver;

/// Alias for the configured default model.
pub const DEFAULT_ALIAS: &str = "default";

/// Configuration-driven [`ModelResolver`].
#[derive(Debug, Clone)]
pub struct TierRouter {
    default_model: String,
    tiers: BTreeMap<String, String>,
}

impl TierRouter {
    /// Router over the configured tier table.
    pub fn new(config: &ModelsConfig) -> Self {
        Self {
            default_model: config.default_model.clone(),
            tiers: config.tiers.clone(),
        }
    }

    /// Router over the built-in Anthropic tiers.
    pub fn with_defaults() -> Self {
        Self::new(&ModelsConfig::default())
    }

    /// Whether `alias` is a tier in the table.
    pub fn is_known_tier(&self, alias: &str) -> bool {
        self.tiers.contains_key(alias)
    }
}

impl Default for TierRouter {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl ModelResolver for TierRouter {
    fn resolve(&self, tier_or_alias: &str) -> String {
        if tier_or_alias == DEFAULT_ALIAS {
            return self.default_model.clone();
        }
        self.tiers
            .get(tier_or_alias)
            .cloned()
            // Anything else is taken to be a concrete model id
            .unwrap_or_else(|| tier_or_alias.to_string())
    }
}

//! Typed configuration, loaded by [`crate::infrastructure::config::ConfigLoader`].

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::infrastructure::logging::LogConfig;

/// Main configuration structure for meta-factory
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Config {
    /// Per-run spending cap
    #[serde(default)]
    pub budget: BudgetConfig,

    /// Critic and critique-loop settings
    #[serde(default)]
    pub critic: CriticConfig,

    /// Agent executor settings
    #[serde(default)]
    pub agent: AgentConfig,

    /// Tier and alias table
    #[serde(default)]
    pub models: ModelsConfig,

    /// Fallback pricing for models missing from the pricing table
    #[serde(default)]
    pub pricing: PricingConfig,

    /// LLM provider connection
    #[serde(default)]
    pub provider: ProviderConfig,

    /// Cheat-sheet library location
    #[serde(default)]
    pub knowledge: KnowledgeConfig,

    /// Where run artifacts are written
    #[serde(default)]
    pub output: OutputConfig,

    /// Estimation stage options
    #[serde(default)]
    pub estimation: EstimationConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LogConfig,
}

/// Budget configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct BudgetConfig {
    /// Maximum USD spend per run
    #[serde(default = "default_max_cost_usd")]
    pub max_cost_usd: f64,
}

const fn default_max_cost_usd() -> f64 {
    5.0
}

impl Default for BudgetConfig {
    fn default() -> Self {
        Self {
            max_cost_usd: default_max_cost_usd(),
        }
    }
}

/// Critic configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct CriticConfig {
    /// Maximum review calls per critique loop
    #[serde(default = "default_max_iterations")]
    pub max_iterations: u32,

    /// Minimum score that counts as a pass
    #[serde(default = "default_pass_threshold")]
    pub pass_threshold: f64,

    /// Jaccard overlap at which an objection counts as a repeat
    #[serde(default = "default_similarity_threshold")]
    pub similarity_threshold: f64,

    /// Tier or model the critic runs on
    #[serde(default = "default_critic_model")]
    pub model: String,

    /// Escalate a loop that exhausts its iterations with no recorded objections
    #[serde(default)]
    pub escalate_on_empty_exhaustion: bool,
}

const fn default_max_iterations() -> u32 {
    3
}

const fn default_pass_threshold() -> f64 {
    0.7
}

const fn default_similarity_threshold() -> f64 {
    0.7
}

fn default_critic_model() -> String {
    "tier2".to_string()
}

impl Default for CriticConfig {
    fn default() -> Self {
        Self {
            max_iterations: default_max_iterations(),
            pass_threshold: default_pass_threshold(),
            similarity_threshold: default_similarity_threshold(),
            model: default_critic_model(),
            escalate_on_empty_exhaustion: false,
        }
    }
}

/// Agent executor configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct AgentConfig {
    /// Max tokens per agent call
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Extra attempts after an unparseable or invalid response
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Tier used for the re-run after the second failed review
    #[serde(default = "default_escalation_tier")]
    pub escalation_tier: String,
}

const fn default_max_tokens() -> u32 {
    4096
}

const fn default_max_retries() -> u32 {
    1
}

fn default_escalation_tier() -> String {
    "tier3".to_string()
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            max_tokens: default_max_tokens(),
            max_retries: default_max_retries(),
            escalation_tier: default_escalation_tier(),
        }
    }
}

/// Tier table: alias -> concrete model id
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ModelsConfig {
    /// Model behind the `default` alias
    #[serde(default = "default_model")]
    pub default_model: String,

    /// Tier name (`tier0`..`tier3`) to concrete model
    #[serde(default = "default_tiers")]
    pub tiers: BTreeMap<String, String>,
}

fn default_model() -> String {
    "claude-sonnet-4-20250514".to_string()
}

fn default_tiers() -> BTreeMap<String, String> {
    [
        ("tier0", "claude-opus-4-20250514"),
        ("tier1", "claude-3-5-haiku-20241022"),
        ("tier2", "claude-3-5-haiku-20241022"),
        ("tier3", "claude-opus-4-20250514"),
    ]
    .into_iter()
    .map(|(tier, model)| (tier.to_string(), model.to_string()))
    .collect()
}

impl Default for ModelsConfig {
    fn default() -> Self {
        Self {
            default_model: default_model(),
            tiers: default_tiers(),
        }
    }
}

impl ModelsConfig {
    /// Default tier table for a vendor. Anthropic's is [`ModelsConfig::default`].
    pub fn for_provider(kind: ProviderKind) -> Self {
        let (default_model, tiers): (&str, [(&str, &str); 4]) = match kind {
            ProviderKind::Anthropic => return Self::default(),
            ProviderKind::OpenAi => (
                "gpt-4o",
                [
                    ("tier0", "gpt-4o"),
                    ("tier1", "gpt-4o-mini"),
                    ("tier2", "gpt-4o-mini"),
                    ("tier3", "gpt-4o"),
                ],
            ),
            ProviderKind::DeepSeek => (
                "deepseek-chat",
                [
                    ("tier0", "deepseek-reasoner"),
                    ("tier1", "deepseek-chat"),
                    ("tier2", "deepseek-chat"),
                    ("tier3", "deepseek-reasoner"),
                ],
            ),
        };
        Self {
            default_model: default_model.to_string(),
            tiers: tiers
                .into_iter()
                .map(|(tier, model)| (tier.to_string(), model.to_string()))
                .collect(),
        }
    }
}

/// Fallback pricing in USD per million tokens
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct PricingConfig {
    /// USD per million prompt tokens
    #[serde(default = "default_input_per_million")]
    pub input_per_million: f64,

    /// USD per million generated tokens
    #[serde(default = "default_output_per_million")]
    pub output_per_million: f64,
}

const fn default_input_per_million() -> f64 {
    3.0
}

const fn default_output_per_million() -> f64 {
    15.0
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self {
            input_per_million: default_input_per_million(),
            output_per_million: default_output_per_million(),
        }
    }
}

/// LLM vendor behind the provider port
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// Anthropic Messages API
    #[default]
    Anthropic,
    /// OpenAI Chat Completions API
    OpenAi,
    /// DeepSeek, which speaks the OpenAI wire format
    DeepSeek,
}

impl ProviderKind {
    /// Lowercase config name.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Anthropic => "anthropic",
            Self::OpenAi => "openai",
            Self::DeepSeek => "deepseek",
        }
    }

    /// Endpoint used when `provider.base_url` is unset.
    pub const fn default_base_url(&self) -> &'static str {
        match self {
            Self::Anthropic => "https://api.anthropic.com",
            Self::OpenAi => "https://api.openai.com/v1",
            Self::DeepSeek => "https://api.deepseek.com/v1",
        }
    }

    /// Environment variable holding the key when `provider.api_key` is unset.
    pub const fn api_key_env(&self) -> &'static str {
        match self {
            Self::Anthropic => "ANTHROPIC_API_KEY",
            Self::OpenAi => "OPENAI_API_KEY",
            Self::DeepSeek => "DEEPSEEK_API_KEY",
        }
    }
}

impl std::fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// LLM provider connection settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ProviderConfig {
    /// Which vendor adapter to build
    #[serde(default)]
    pub kind: ProviderKind,

    /// API key (read from the vendor's environment variable when unset)
    #[serde(default, skip_serializing)]
    pub api_key: Option<String>,

    /// Endpoint override; the vendor default applies when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,

    /// `anthropic-version` header, Anthropic only
    #[serde(default = "default_api_version")]
    pub api_version: String,

    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Client-side rate limit
    #[serde(default = "default_requests_per_minute")]
    pub requests_per_minute: u32,
}

impl ProviderConfig {
    /// `base_url`, or the vendor default, without a trailing slash.
    pub fn endpoint(&self) -> String {
        self.base_url
            .as_deref()
            .filter(|url| !url.trim().is_empty())
            .unwrap_or_else(|| self.kind.default_base_url())
            .trim_end_matches('/')
            .to_string()
    }
}

fn default_api_version() -> String {
    "2023-06-01".to_string()
}

const fn default_timeout_secs() -> u64 {
    300
}

const fn default_requests_per_minute() -> u32 {
    50
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            kind: ProviderKind::default(),
            api_key: None,
            base_url: None,
            api_version: default_api_version(),
            timeout_secs: default_timeout_secs(),
            requests_per_minute: default_requests_per_minute(),
        }
    }
}

/// Knowledge library configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct KnowledgeConfig {
    /// Directory holding `{name}.md` cheat sheets
    #[serde(default = "default_cheat_sheets_dir")]
    pub cheat_sheets_dir: PathBuf,
}

fn default_cheat_sheets_dir() -> PathBuf {
    PathBuf::from("cheat_sheets")
}

impl Default for KnowledgeConfig {
    fn default() -> Self {
        Self {
            cheat_sheets_dir: default_cheat_sheets_dir(),
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct OutputConfig {
    /// Parent directory of per-run output folders
    #[serde(default = "default_output_dir")]
    pub dir: PathBuf,
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("outputs")
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: default_output_dir(),
        }
    }
}

/// Estimation configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct EstimationConfig {
    /// Run optimist, pessimist and realist estimators and aggregate them (greenfield)
    #[serde(default = "default_true")]
    pub ensemble: bool,
}

const fn default_true() -> bool {
    true
}

impl Default for EstimationConfig {
    fn default() -> Self {
        Self {
            ensemble: default_true(),
        }
    }
}

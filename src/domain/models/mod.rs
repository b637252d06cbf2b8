//! Domain models for the meta-factory swarm.

pub mod agent;
pub mod agent_catalog;
pub mod artifact;
pub mod config;
pub mod contracts;
pub mod cost;
pub mod critique;
pub mod engagement;
pub mod run;

pub use agent::{AgentProfile, AgentRole, EstimatorBias};
pub use artifact::{Artifact, FieldSpec};
pub use config::{
    AgentConfig, BudgetConfig, Config, CriticConfig, EstimationConfig, KnowledgeConfig,
    ModelsConfig, OutputConfig, PricingConfig, ProviderConfig, ProviderKind,
};
pub use cost::{CostBucket, CostEntry, CostManifest, CostSummary};
pub use critique::{CriticFeedback, Escalation, Objection, Severity, Verdict};
pub use engagement::EngagementInput;
pub use run::{PipelineMode, RunError, RunResult, RunState, RunStatus};

//! Service layer: the critique core and the pipelines built on it.
//!
//! - `agent_executor`, `critic`, `critique_loop`: the generate, review and
//!   retry cycle every stage runs through
//! - `cost_ledger`, `model_router`, `objection_filter`: shared plumbing for
//!   budget, model resolution and objection de-duplication
//! - `ensemble_aggregator`, `reconciliation`: deterministic transforms between
//!   stages
//! - `pipelines`: greenfield, brownfield and greyfield orchestrators

pub mod agent_executor;
pub mod cost_ledger;
pub mod critic;
pub mod critique_loop;
pub mod ensemble_aggregator;
pub mod model_router;
pub mod objection_filter;
pub mod pipelines;
pub mod reconciliation;

pub use agent_executor::AgentExecutor;
pub use cost_ledger::CostLedger;
pub use critic::Critic;
pub use critique_loop::{CritiqueLoop, CritiqueOutcome, LoopState};
pub use model_router::TierRouter;
pub use objection_filter::JaccardSimilarity;
pub use pipelines::{pipeline_for, Pipeline, SwarmContext};

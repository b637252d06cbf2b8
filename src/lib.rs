//! Meta-Factory - critic-gated agent swarm
//!
//! Turns client inputs (meeting transcripts, legacy codebase descriptions)
//! into consulting deliverables: pain matrices, architecture decisions, PERT
//! estimates and proposals. Every agent output is reviewed by an adversarial
//! critic and regenerated with the critic's objections until it passes, the
//! iteration limit is reached, or the run's budget runs out.
//!
//! # Architecture
//!
//! - **Domain Layer** (`domain`): artifact contracts, run state, ports
//! - **Service Layer** (`services`): executor, critic, critique loop and the
//!   pipelines built on them
//! - **Adapters** (`adapters`): LLM providers and the cheat-sheet librarian
//! - **Infrastructure Layer** (`infrastructure`): config, logging, output
//!   validation, run persistence
//! - **CLI Layer** (`cli`): command-line interface
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use meta_factory::{pipeline_for, Config, EngagementInput, PipelineMode, SwarmContext};
//! use meta_factory::adapters::{knowledge::Librarian, providers::build_provider};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::default();
//!     let provider = build_provider(&config.provider, &config.pricing)?;
//!     let knowledge = Librarian::new(&config.knowledge.cheat_sheets_dir);
//!     let ctx = SwarmContext::new(config, provider, Arc::new(knowledge));
//!
//!     let input = EngagementInput::greenfield("Acme", "We re-key every order by hand.");
//!     let result = pipeline_for(PipelineMode::Greenfield, ctx).run_pipeline(input).await;
//!     println!("{}: ${:.2}", result.status, result.cost_usd);
//!     Ok(())
//! }
//! ```

pub mod adapters;
pub mod cli;
pub mod domain;
pub mod infrastructure;
pub mod services;

// Re-export commonly used types for convenience
pub use domain::models::config::Config;
pub use domain::models::engagement::EngagementInput;
pub use domain::models::run::{PipelineMode, RunResult, RunStatus};
pub use domain::ports::{KnowledgeProvider, LlmProvider, ModelResolver};
pub use domain::{DomainError, DomainResult};
pub use infrastructure::config::{ConfigError, ConfigLoader};
pub use services::{pipeline_for, CritiqueLoop, LoopState, Pipeline, SwarmContext};

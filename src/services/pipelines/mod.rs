//! Pipeline orchestrators.
//!
//! Each engagement mode chains critique-gated stages:
//!
//! - **greenfield**: sequential discovery to proposal, with optional ensemble
//!   estimation
//! - **brownfield**: sequential, with the legacy analysis adapted into a pain
//!   matrix
//! - **greyfield**: discovery and legacy analysis fanned out in parallel,
//!   reconciled, then sequential
//! - **ingestion**: raw documents mined into a project dossier
//!
//! The shared synthesis and proposal tail lives here.

mod brownfield;
mod context;
mod greenfield;
mod greyfield;
mod ingestion;
mod runner;

pub use brownfield::BrownfieldPipeline;
pub use context::SwarmContext;
pub use greenfield::GreenfieldPipeline;
pub use greyfield::GreyfieldPipeline;
pub use ingestion::IngestionPipeline;
pub use runner::StageRunner;

use async_trait::async_trait;

use crate::domain::errors::DomainResult;
use crate::domain::models::agent::AgentRole;
use crate::domain::models::agent_catalog;
use crate::domain::models::contracts::{
    EngagementSummary, EstimationResult, EstimatorInput, ProposalDocument, ProposalInput,
    SynthesisInput,
};
use crate::domain::models::engagement::EngagementInput;
use crate::domain::models::run::{PipelineMode, RunResult};

/// One engagement mode, end to end.
#[async_trait]
pub trait Pipeline: Send + Sync {
    /// Mode this pipeline runs.
    fn mode(&self) -> PipelineMode;

    /// Run every stage. Never fails: errors are captured in the result's
    /// `error` field with status `error`.
    async fn run_pipeline(&self, input: EngagementInput) -> RunResult;
}

/// Pipeline for `mode` over `ctx`.
pub fn pipeline_for(mode: PipelineMode, ctx: SwarmContext) -> Box<dyn Pipeline> {
    match mode {
        PipelineMode::Greenfield => Box::new(GreenfieldPipeline::new(ctx)),
        PipelineMode::Brownfield => Box::new(BrownfieldPipeline::new(ctx)),
        PipelineMode::Greyfield => Box::new(GreyfieldPipeline::new(ctx)),
        PipelineMode::Ingestion => Box::new(IngestionPipeline::new(ctx)),
    }
}

/// Single critique-gated estimation stage.
pub(crate) async fn estimate(
    runner: &mut StageRunner<'_>,
    input: &EstimatorInput,
) -> DomainResult<Option<EstimationResult>> {
    let ctx = runner.context();
    let executor = ctx.executor(agent_catalog::estimator()).await;
    let critic = ctx.critic(AgentRole::Estimator).await;
    runner.stage(&executor, &critic, input, "estimation").await
}

/// Synthesis then proposal, the tail every mode shares.
pub(crate) async fn synthesize_and_propose(
    runner: &mut StageRunner<'_>,
    engagement: &EngagementInput,
    synthesis_input: &SynthesisInput,
) -> DomainResult<()> {
    let ctx = runner.context();

    let executor = ctx.executor(agent_catalog::synthesis()).await;
    let critic = ctx.critic(AgentRole::Synthesis).await;
    let Some(summary) = runner
        .stage::<_, EngagementSummary>(&executor, &critic, synthesis_input, "synthesis")
        .await?
    else {
        return Ok(());
    };

    let proposal_input = ProposalInput {
        engagement_summary: summary,
        client_name: engagement.client_name.clone(),
        hourly_rate: engagement.hourly_rate,
    };
    let executor = ctx.executor(agent_catalog::proposal()).await;
    let critic = ctx.critic(AgentRole::Proposal).await;
    runner
        .stage::<_, ProposalDocument>(&executor, &critic, &proposal_input, "proposal")
        .await?;
    Ok(())
}

#[cfg(test)]
pub(crate) mod test_support {
    //! Canned agent output for pipeline tests.

    use std::collections::HashMap;
    use std::sync::Arc;

    use serde_json::{json, Value};

    use super::SwarmContext;
    use crate::adapters::knowledge::Librarian;
    use crate::adapters::providers::{MockResponse, ScriptedProvider};
    use crate::domain::models::config::Config;

    pub fn pain_matrix() -> Value {
        json!({
            "pain_points": [{
                "description": "Orders re-keyed by hand",
                "frequency": "daily",
                "cost_per_incident": 40.0,
                "annual_cost": 10400.0,
                "source_quote": "we type every order twice",
                "confidence": 0.9
            }],
            "stakeholder_needs": [{"role": "COO", "need": "Real-time order API", "priority": "high"}],
            "key_constraints": ["GDPR"]
        })
    }

    pub fn legacy_analysis() -> Value {
        json!({
            "tech_debt": [{
                "module": "orders",
                "debt_type": "coupling",
                "coupling_description": "shares tables with billing",
                "remediation_strategy": "wrap",
                "estimated_effort_hours": 10.0
            }],
            "constraints": {"hard_constraints": ["Batch only nightly export"]},
            "summary": "Monolithic order system on Oracle"
        })
    }

    pub fn architecture() -> Value {
        json!({
            "utility_tree": {"scenarios": [{
                "attribute": "modifiability",
                "scenario": "Add a sales channel in under a week",
                "importance": "H",
                "difficulty": "M"
            }]},
            "decisions": [{
                "decision": "Introduce an order intake service",
                "context": "Orders arrive from three channels",
                "pattern_used": "Message Router",
                "trade_off": "One more deployable",
                "alternatives_considered": ["Extend the monolith"]
            }],
            "integration_patterns": ["Message Router"]
        })
    }

    /// Estimation whose single task has the given expected hours, spread 6.
    pub fn estimation(expected: f64) -> Value {
        let (o, m, p) = (expected - 3.0, expected, expected + 3.0);
        json!({
            "pert_estimates": [{
                "task": "Order intake service",
                "optimistic_hours": o,
                "likely_hours": m,
                "pessimistic_hours": p,
                "expected_hours": expected,
                "std_dev": 1.0
            }],
            "cone_of_uncertainty": {
                "phase": "requirements_complete",
                "low_multiplier": 0.5,
                "high_multiplier": 2.0,
                "base_estimate": expected,
                "range_low": expected * 0.5,
                "range_high": expected * 2.0
            },
            "total_expected_hours": expected,
            "total_std_dev": 1.0,
            "confidence_interval_90": [expected - 1.645, expected + 1.645],
            "risk_factors": ["Legacy integration"]
        })
    }

    pub fn engagement_summary() -> Value {
        json!({
            "scqa": {
                "situation": "Orders arrive through three channels",
                "complication": "Each is re-keyed by hand",
                "question": "How do we automate intake?",
                "answer": "A dedicated intake service"
            },
            "pain_matrix": pain_matrix(),
            "architecture_decisions": architecture()["decisions"].clone(),
            "estimates": estimation(12.0)["pert_estimates"].clone(),
            "total_estimate": estimation(12.0)["cone_of_uncertainty"].clone()
        })
    }

    pub fn proposal() -> Value {
        json!({
            "title": "Order intake automation",
            "client_name": "Acme",
            "executive_summary": {
                "bottom_line": "Stop re-keying orders",
                "key_benefits": ["Fewer errors"],
                "investment_summary": "About 12 hours",
                "recommended_action": "Start phase one"
            },
            "engagement_summary": engagement_summary(),
            "problem_statement": "Orders are typed twice",
            "proposed_solution": "An intake service",
            "technical_approach": "Message router in front of the monolith",
            "milestones": [{
                "name": "Intake live",
                "description": "Channel orders flow through the service",
                "deliverables": ["Service"],
                "estimated_hours": 12.0
            }],
            "timeline_weeks": 2,
            "investment": "$1,800"
        })
    }

    pub fn verdict(score: f64) -> Value {
        json!({
            "passed": score >= 0.7,
            "score": score,
            "objections": [],
            "summary": "Reviewed"
        })
    }

    pub fn ok(value: &Value) -> MockResponse {
        MockResponse::success(value.to_string())
    }

    pub fn context(provider: ScriptedProvider, config: Config) -> SwarmContext {
        SwarmContext::new(config, Arc::new(provider), Arc::new(Librarian::in_memory(HashMap::new())))
    }
}

//! Greenfield: a new system from a client transcript.
//!
//! discovery -> architecture -> estimation -> synthesis -> proposal

use async_trait::async_trait;

use super::{estimate, synthesize_and_propose, Pipeline, StageRunner, SwarmContext};
use crate::domain::errors::DomainResult;
use crate::domain::models::agent::{AgentRole, EstimatorBias};
use crate::domain::models::agent_catalog;
use crate::domain::models::contracts::{
    ArchitectInput, ArchitectureResult, EstimationResult, EstimatorInput, PainMonetizationMatrix,
    SynthesisInput,
};
use crate::domain::models::engagement::EngagementInput;
use crate::domain::models::run::{PipelineMode, RunResult};
use crate::services::ensemble_aggregator::aggregate_ensemble;

/// Transcript-driven run for a new system.
pub struct GreenfieldPipeline {
    ctx: SwarmContext,
}

impl GreenfieldPipeline {
    /// Pipeline over `ctx`.
    pub const fn new(ctx: SwarmContext) -> Self {
        Self { ctx }
    }

    async fn stages(&self, runner: &mut StageRunner<'_>, input: &EngagementInput) -> DomainResult<()> {
        input.validate_for(PipelineMode::Greenfield)?;

        let executor = self.ctx.executor(agent_catalog::discovery()).await;
        let critic = self.ctx.critic(AgentRole::Discovery).await;
        let Some(pain_matrix) = runner
            .stage::<_, PainMonetizationMatrix>(&executor, &critic, &input.discovery_input(), "discovery")
            .await?
        else {
            return Ok(());
        };

        let architect_input = ArchitectInput {
            pain_matrix: pain_matrix.clone(),
            constraints: None,
            quality_priorities: input.quality_priorities.clone(),
            legacy_analysis: None,
        };
        let executor = self.ctx.executor(agent_catalog::architect()).await;
        let critic = self.ctx.critic(AgentRole::Architect).await;
        let Some(architecture) = runner
            .stage::<_, ArchitectureResult>(&executor, &critic, &architect_input, "architecture")
            .await?
        else {
            return Ok(());
        };

        let estimator_input = EstimatorInput {
            architecture_decisions: architecture.decisions.clone(),
            project_phase: input.project_phase.clone(),
            risk_factors: Vec::new(),
        };
        let estimation = if self.ctx.config.estimation.ensemble {
            estimate_ensemble(runner, &estimator_input).await?
        } else {
            estimate(runner, &estimator_input).await?
        };
        let Some(estimation) = estimation else {
            return Ok(());
        };

        let synthesis_input = SynthesisInput {
            pain_matrix,
            architecture,
            estimation,
            legacy_analysis: None,
        };
        synthesize_and_propose(runner, input, &synthesis_input).await
    }
}

/// Optimist, pessimist and realist estimators, each critique-gated as its
/// own stage, merged into the `estimation` artifact.
async fn estimate_ensemble(
    runner: &mut StageRunner<'_>,
    input: &EstimatorInput,
) -> DomainResult<Option<EstimationResult>> {
    let ctx = runner.context();
    let mut results = Vec::with_capacity(3);

    for bias in [EstimatorBias::Optimist, EstimatorBias::Pessimist, EstimatorBias::Realist] {
        let stage = format!("estimation_{}", bias.as_str());
        let executor = ctx.executor(agent_catalog::estimator_with_bias(bias)).await;
        let critic = ctx.critic(AgentRole::Estimator).await;
        let Some(result) = runner
            .stage::<_, EstimationResult>(&executor, &critic, input, &stage)
            .await?
        else {
            return Ok(None);
        };
        results.push(result);
    }

    let [optimist, pessimist, realist] = results.as_slice() else {
        return Ok(None);
    };
    let aggregated = aggregate_ensemble(optimist, pessimist, realist);
    runner.record_artifact("estimation", &aggregated)?;
    Ok(Some(aggregated))
}

#[async_trait]
impl Pipeline for GreenfieldPipeline {
    fn mode(&self) -> PipelineMode {
        PipelineMode::Greenfield
    }

    async fn run_pipeline(&self, input: EngagementInput) -> RunResult {
        let mut runner = StageRunner::begin(&self.ctx, PipelineMode::Greenfield).await;
        let outcome = self.stages(&mut runner, &input).await;
        runner.finish(outcome).await
    }
}

//! Greyfield: new capability on top of an existing platform.
//!
//! ```text
//! discovery ─┐
//!            ├─> reconciled_constraints -> architecture -> estimation
//! legacy ────┘      -> synthesis -> proposal
//! ```
//!
//! Discovery and legacy analysis run on separate tokio tasks, each with its
//! own executor, critic and critique loop. Only the cost ledger is shared.

use async_trait::async_trait;
use futures::future::join;
use tokio::task::JoinError;

use super::{estimate, synthesize_and_propose, Pipeline, StageRunner, SwarmContext};
use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::agent::AgentRole;
use crate::domain::models::agent_catalog;
use crate::domain::models::contracts::{
    ArchitectInput, ArchitectureResult, EstimatorInput, LegacyAnalysisResult, PainMonetizationMatrix,
    SynthesisInput,
};
use crate::domain::models::engagement::EngagementInput;
use crate::domain::models::run::{PipelineMode, RunResult};
use crate::services::critique_loop::CritiqueOutcome;
use crate::services::reconciliation::reconcile_constraints;

const DEFAULT_PRIORITIES: [&str; 2] = ["modifiability", "performance"];
const INTEGRATION_RISKS: [&str; 3] = [
    "Integration with existing platform",
    "Legacy system constraints",
    "New/existing code interaction",
];

fn joined<O>(
    branch: &str,
    result: Result<DomainResult<CritiqueOutcome<O>>, JoinError>,
) -> DomainResult<CritiqueOutcome<O>> {
    result.map_err(|err| DomainError::ExecutionFailed(format!("{branch} task failed: {err}")))?
}

/// New capability on an existing platform, with parallel analysis.
pub struct GreyfieldPipeline {
    ctx: SwarmContext,
}

impl GreyfieldPipeline {
    /// Pipeline over `ctx`.
    pub const fn new(ctx: SwarmContext) -> Self {
        Self { ctx }
    }

    /// Discovery and legacy analysis side by side. Both branches run to
    /// completion even if one fails; the successful one is still recorded.
    async fn fan_out(
        &self,
        runner: &mut StageRunner<'_>,
        input: &EngagementInput,
    ) -> DomainResult<Option<(PainMonetizationMatrix, LegacyAnalysisResult)>> {
        if runner.halt_if_exceeded("discovery").await {
            return Ok(None);
        }

        let discovery_task = {
            let ctx = self.ctx.clone();
            let discovery_input = input.discovery_input();
            tokio::spawn(async move {
                let executor = ctx.executor(agent_catalog::discovery()).await;
                let critic = ctx.critic(AgentRole::Discovery).await;
                ctx.critique_loop()
                    .run_with_critique::<_, PainMonetizationMatrix>(
                        &executor,
                        &critic,
                        &discovery_input,
                        "discovery",
                        None,
                    )
                    .await
            })
        };
        let legacy_task = {
            let ctx = self.ctx.clone();
            let legacy_input = input.legacy_input();
            tokio::spawn(async move {
                let executor = ctx.executor(agent_catalog::legacy()).await;
                let critic = ctx.critic(AgentRole::Legacy).await;
                ctx.critique_loop()
                    .run_with_critique::<_, LegacyAnalysisResult>(
                        &executor,
                        &critic,
                        &legacy_input,
                        "legacy_analysis",
                        None,
                    )
                    .await
            })
        };

        let (discovery, legacy) = join(discovery_task, legacy_task).await;
        let discovery = joined("discovery", discovery);
        let legacy = joined("legacy_analysis", legacy);
        tracing::info!(
            discovery_ok = discovery.is_ok(),
            legacy_ok = legacy.is_ok(),
            "Parallel analysis finished"
        );

        let pain_matrix = match discovery {
            Ok(outcome) => runner.record_outcome(outcome)?,
            Err(err) => {
                if let Ok(outcome) = legacy {
                    runner.record_outcome(outcome)?;
                }
                return Err(err);
            }
        };
        let legacy = runner.record_outcome(legacy?)?;

        if runner.halt_if_exceeded("reconciled_constraints").await {
            return Ok(None);
        }
        Ok(pain_matrix.zip(legacy))
    }

    async fn stages(&self, runner: &mut StageRunner<'_>, input: &EngagementInput) -> DomainResult<()> {
        input.validate_for(PipelineMode::Greyfield)?;

        let Some((pain_matrix, legacy)) = self.fan_out(runner, input).await? else {
            return Ok(());
        };

        let reconciled = reconcile_constraints(&pain_matrix, &legacy);
        runner.record_artifact("reconciled_constraints", &reconciled)?;

        let quality_priorities = if input.quality_priorities.is_empty() {
            DEFAULT_PRIORITIES.iter().map(ToString::to_string).collect()
        } else {
            input.quality_priorities.clone()
        };
        let architect_input = ArchitectInput {
            pain_matrix: pain_matrix.clone(),
            constraints: Some(reconciled.constraints),
            quality_priorities,
            legacy_analysis: Some(legacy.clone()),
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
            risk_factors: INTEGRATION_RISKS.iter().map(ToString::to_string).collect(),
        };
        let Some(estimation) = estimate(runner, &estimator_input).await? else {
            return Ok(());
        };

        let synthesis_input = SynthesisInput {
            pain_matrix,
            architecture,
            estimation,
            legacy_analysis: Some(legacy),
        };
        synthesize_and_propose(runner, input, &synthesis_input).await
    }
}

#[async_trait]
impl Pipeline for GreyfieldPipeline {
    fn mode(&self) -> PipelineMode {
        PipelineMode::Greyfield
    }

    async fn run_pipeline(&self, input: EngagementInput) -> RunResult {
        let mut runner = StageRunner::begin(&self.ctx, PipelineMode::Greyfield).await;
        let outcome = self.stages(&mut runner, &input).await;
        runner.finish(outcome).await
    }
}

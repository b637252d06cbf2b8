//! Brownfield: modernizing an existing codebase.
//!
//! legacy_analysis -> derived_pain_matrix -> refactoring_plan -> estimation
//! -> synthesis -> proposal

use async_trait::async_trait;

use super::{estimate, synthesize_and_propose, Pipeline, StageRunner, SwarmContext};
use crate::domain::errors::DomainResult;
use crate::domain::models::agent::AgentRole;
use crate::domain::models::agent_catalog;
use crate::domain::models::contracts::{
    ArchitectInput, ArchitectureResult, EstimatorInput, LegacyAnalysisResult, SynthesisInput,
};
use crate::domain::models::engagement::EngagementInput;
use crate::domain::models::run::{PipelineMode, RunResult};
use crate::services::reconciliation::pain_matrix_from_legacy;

const REFACTORING_PRIORITIES: [&str; 3] = ["modifiability", "testability", "maintainability"];
const MODERNIZATION_RISKS: [&str; 3] = [
    "Legacy system constraints",
    "Technical debt remediation",
    "Testing coverage gaps",
];

/// Modernization of an existing codebase.
pub struct BrownfieldPipeline {
    ctx: SwarmContext,
}

impl BrownfieldPipeline {
    /// Pipeline over `ctx`.
    pub const fn new(ctx: SwarmContext) -> Self {
        Self { ctx }
    }

    async fn stages(&self, runner: &mut StageRunner<'_>, input: &EngagementInput) -> DomainResult<()> {
        input.validate_for(PipelineMode::Brownfield)?;

        let executor = self.ctx.executor(agent_catalog::legacy()).await;
        let critic = self.ctx.critic(AgentRole::Legacy).await;
        let Some(legacy) = runner
            .stage::<_, LegacyAnalysisResult>(&executor, &critic, &input.legacy_input(), "legacy_analysis")
            .await?
        else {
            return Ok(());
        };

        let pain_matrix = pain_matrix_from_legacy(&legacy, &input.known_issues);
        runner.record_artifact("derived_pain_matrix", &pain_matrix)?;
        tracing::debug!(
            pain_points = pain_matrix.pain_points.len(),
            "Derived pain matrix from legacy analysis"
        );

        let architect_input = ArchitectInput {
            pain_matrix: pain_matrix.clone(),
            constraints: Some(legacy.constraints.clone()),
            quality_priorities: REFACTORING_PRIORITIES.iter().map(ToString::to_string).collect(),
            legacy_analysis: Some(legacy.clone()),
        };
        let executor = self.ctx.executor(agent_catalog::refactoring_planner()).await;
        let critic = self.ctx.critic(AgentRole::Architect).await;
        let Some(plan) = runner
            .stage::<_, ArchitectureResult>(&executor, &critic, &architect_input, "refactoring_plan")
            .await?
        else {
            return Ok(());
        };

        let estimator_input = EstimatorInput {
            architecture_decisions: plan.decisions.clone(),
            project_phase: input.project_phase.clone(),
            risk_factors: MODERNIZATION_RISKS.iter().map(ToString::to_string).collect(),
        };
        let Some(estimation) = estimate(runner, &estimator_input).await? else {
            return Ok(());
        };

        let synthesis_input = SynthesisInput {
            pain_matrix,
            architecture: plan,
            estimation,
            legacy_analysis: Some(legacy),
        };
        synthesize_and_propose(runner, input, &synthesis_input).await
    }
}

#[async_trait]
impl Pipeline for BrownfieldPipeline {
    fn mode(&self) -> PipelineMode {
        PipelineMode::Brownfield
    }

    async fn run_pipeline(&self, input: EngagementInput) -> RunResult {
        let mut runner = StageRunner::begin(&self.ctx, PipelineMode::Brownfield).await;
        let outcome = self.stages(&mut runner, &input).await;
        runner.finish(outcome).await
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Arc;

    use super::*;
    use crate::adapters::knowledge::Librarian;
    use crate::adapters::providers::ScriptedProvider;
    use crate::domain::models::config::Config;
    use crate::domain::models::contracts::PainMonetizationMatrix;
    use crate::domain::models::run::RunStatus;
    use crate::services::pipelines::test_support::{self as fixtures, ok};

    #[tokio::test]
    async fn test_brownfield_derives_pain_matrix() {
        let provider = ScriptedProvider::with_responses([
            ok(&fixtures::legacy_analysis()),
            ok(&fixtures::verdict(0.9)),
            ok(&fixtures::architecture()),
            ok(&fixtures::verdict(0.9)),
            ok(&fixtures::estimation(12.0)),
            ok(&fixtures::verdict(0.9)),
            ok(&fixtures::engagement_summary()),
            ok(&fixtures::verdict(0.9)),
            ok(&fixtures::proposal()),
            ok(&fixtures::verdict(0.9)),
        ]);
        let pipeline = BrownfieldPipeline::new(fixtures::context(provider, Config::default()));
        let input = EngagementInput::brownfield("Acme", "Oracle order monolith")
            .with_known_issues(vec!["Nightly export fails weekly".to_string()]);

        let result = pipeline.run_pipeline(input).await;

        assert_eq!(result.status, RunStatus::Completed);
        assert_eq!(
            result.stage_order,
            vec![
                "legacy_analysis",
                "derived_pain_matrix",
                "refactoring_plan",
                "estimation",
                "synthesis",
                "proposal"
            ]
        );
        let derived: PainMonetizationMatrix = result.artifact_as("derived_pain_matrix").unwrap();
        assert_eq!(derived.pain_points.len(), 2);
        assert_eq!(derived.pain_points[0].description, "Technical debt in orders: coupling");
        assert!(!result.critic_logs.contains_key("derived_pain_matrix"));
    }

    #[tokio::test]
    async fn test_refactoring_plan_sees_legacy_constraints() {
        let provider = ScriptedProvider::with_responses([
            ok(&fixtures::legacy_analysis()),
            ok(&fixtures::verdict(0.9)),
            ok(&fixtures::architecture()),
            ok(&fixtures::verdict(0.9)),
        ]);
        let handle = Arc::new(provider);
        let ctx = SwarmContext::new(
            Config::default(),
            handle.clone(),
            Arc::new(Librarian::in_memory(HashMap::new())),
        );

        let result = BrownfieldPipeline::new(ctx)
            .run_pipeline(EngagementInput::brownfield("Acme", "Oracle order monolith"))
            .await;

        // Script runs out at estimation.
        assert_eq!(result.status, RunStatus::Error);
        let requests = handle.requests().await;
        let planner = &requests[2];
        assert!(planner.user_message.contains("Batch only nightly export"));
        assert!(planner.user_message.contains("testability"));
    }
}

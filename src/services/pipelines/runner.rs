//! Per-run bookkeeping shared by every pipeline.

use serde::Serialize;

use crate::domain::errors::DomainResult;
use crate::domain::models::artifact::Artifact;
use crate::domain::models::run::{PipelineMode, RunError, RunResult, RunState, RunStatus};
use crate::domain::ports::TokenUsage;
use crate::services::agent_executor::AgentExecutor;
use crate::services::critic::Critic;
use crate::services::critique_loop::{CritiqueLoop, CritiqueOutcome, LoopState};

use super::context::SwarmContext;

/// Owns the [`RunState`] of one run and turns critique outcomes into
/// recorded artifacts, escalations and critic logs.
///
/// Stage helpers return `Ok(None)` once the budget is exhausted; the
/// pipeline stops at the first `None` and [`StageRunner::finish`] marks the
/// run `cost_exceeded`.
pub struct StageRunner<'a> {
    ctx: &'a SwarmContext,
    critique: CritiqueLoop,
    state: RunState,
    cost_exceeded: bool,
}

impl<'a> StageRunner<'a> {
    /// Reset the ledger and open a new run.
    pub async fn begin(ctx: &'a SwarmContext, mode: PipelineMode) -> StageRunner<'a> {
        ctx.ledger.reset().await;
        let mut state = RunState::new(mode);
        if let Err(err) = state.start() {
            tracing::error!(run_id = %state.run_id, error = %err, "Run could not be started");
        }
        tracing::info!(run_id = %state.run_id, %mode, "Pipeline run started");
        Self {
            ctx,
            critique: ctx.critique_loop(),
            state,
            cost_exceeded: false,
        }
    }

    /// Collaborators of the run, borrowed for the runner's lifetime.
    pub const fn context(&self) -> &'a SwarmContext {
        self.ctx
    }

    /// Identifier of the run being recorded.
    pub fn run_id(&self) -> &str {
        &self.state.run_id
    }

    /// Stop the run if the ledger has reached its cap.
    pub async fn halt_if_exceeded(&mut self, before: &str) -> bool {
        if self.cost_exceeded {
            return true;
        }
        if self.ctx.ledger.is_exceeded().await {
            let spent = self.ctx.ledger.total_usd().await;
            tracing::warn!(
                run_id = %self.state.run_id,
                stage = before,
                spent,
                "Cost limit reached, stopping run"
            );
            self.cost_exceeded = true;
        }
        self.cost_exceeded
    }

    /// Run one critique-gated stage and record its outcome.
    pub async fn stage<I, O>(
        &mut self,
        executor: &AgentExecutor,
        critic: &Critic,
        input: &I,
        stage: &str,
    ) -> DomainResult<Option<O>>
    where
        I: Serialize + Sync + ?Sized,
        O: Artifact,
    {
        if self.halt_if_exceeded(stage).await {
            return Ok(None);
        }
        let outcome = self
            .critique
            .run_with_critique(executor, critic, input, stage, None)
            .await?;
        let artifact = self.record_outcome(outcome)?;
        if self.halt_if_exceeded(stage).await {
            return Ok(None);
        }
        Ok(artifact)
    }

    /// Record a finished critique loop under its stage name.
    ///
    /// The artifact, any escalation and the critic's verdicts all land in the
    /// run state. A loop that ended on the budget latches the runner into
    /// `cost_exceeded` and returns `Ok(None)`; otherwise the artifact is
    /// handed back so the pipeline can feed it forward.
    pub fn record_outcome<O: Artifact>(&mut self, outcome: CritiqueOutcome<O>) -> DomainResult<Option<O>> {
        if let Some(artifact) = &outcome.artifact {
            self.state.record_artifact(&outcome.stage, artifact)?;
        }
        if let Some(escalation) = outcome.escalation {
            self.state.record_escalation(escalation);
        }
        self.state.record_critic_log(&outcome.stage, outcome.verdicts);

        if outcome.state == LoopState::CostExceeded {
            self.cost_exceeded = true;
            return Ok(None);
        }
        Ok(outcome.artifact)
    }

    /// Record an artifact produced without a critique loop.
    pub fn record_artifact<T: Serialize>(&mut self, name: &str, artifact: &T) -> DomainResult<()> {
        self.state.record_artifact(name, artifact)
    }

    /// Finalize the run exactly once and build its result.
    pub async fn finish(mut self, outcome: DomainResult<()>) -> RunResult {
        let (status, error) = match &outcome {
            Err(err) => {
                tracing::error!(run_id = %self.state.run_id, error = %err, "Pipeline run failed");
                (RunStatus::Error, Some(RunError::from(err)))
            }
            Ok(()) if self.cost_exceeded => (RunStatus::CostExceeded, None),
            Ok(()) => (RunStatus::Completed, None),
        };
        if let Err(err) = self.state.finalize(status, error) {
            tracing::error!(run_id = %self.state.run_id, error = %err, "Run could not be finalized");
        }

        let cost = self.ctx.ledger.manifest().await;
        let token_usage = TokenUsage {
            input_tokens: cost.total_input_tokens,
            output_tokens: cost.total_output_tokens,
        };
        tracing::info!(
            run_id = %self.state.run_id,
            status = %self.state.status(),
            cost_usd = cost.total_cost_usd,
            stages = self.state.stages().len(),
            escalations = self.state.escalations().len(),
            "Pipeline run finished"
        );
        self.state.into_result(cost, token_usage)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::providers::ScriptedProvider;
    use crate::domain::models::config::Config;
    use crate::domain::models::contracts::PainMonetizationMatrix;
    use crate::domain::models::cost::CostEntry;
    use crate::services::pipelines::test_support as fixtures;

    fn require_send<T: Send>(_: &T) {}

    #[tokio::test]
    async fn test_halt_future_is_send() {
        let ctx = fixtures::context(ScriptedProvider::new(), Config::default());
        let mut runner = StageRunner::begin(&ctx, PipelineMode::Greenfield).await;
        let halt = runner.halt_if_exceeded("discovery");
        require_send(&halt);
        assert!(!halt.await);
    }

    #[tokio::test]
    async fn test_halt_latches_once_budget_spent() {
        let mut config = Config::default();
        config.budget.max_cost_usd = 1.0;
        let ctx = fixtures::context(ScriptedProvider::new(), config);
        let mut runner = StageRunner::begin(&ctx, PipelineMode::Greenfield).await;

        ctx.ledger
            .record(CostEntry::new("Discovery", "discovery", "tier1").with_cost(1.5))
            .await;
        assert!(runner.halt_if_exceeded("architecture").await);

        ctx.ledger.reset().await;
        assert!(runner.halt_if_exceeded("estimation").await);

        let result = runner.finish(Ok(())).await;
        assert_eq!(result.status, RunStatus::CostExceeded);
    }

    #[tokio::test]
    async fn test_budget_ended_outcome_is_recorded_then_stops() {
        let ctx = fixtures::context(ScriptedProvider::new(), Config::default());
        let mut runner = StageRunner::begin(&ctx, PipelineMode::Greenfield).await;
        let outcome = CritiqueOutcome {
            stage: "discovery".to_string(),
            artifact: Some(serde_json::from_value::<PainMonetizationMatrix>(fixtures::pain_matrix()).unwrap()),
            passed: false,
            escalation: None,
            verdicts: Vec::new(),
            state: LoopState::CostExceeded,
        };

        assert!(runner.record_outcome(outcome).unwrap().is_none());
        assert!(runner.halt_if_exceeded("architecture").await);

        let result = runner.finish(Ok(())).await;
        assert_eq!(result.status, RunStatus::CostExceeded);
        assert_eq!(result.stage_order, vec!["discovery"]);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_runner_can_be_spawned() {
        let ctx = fixtures::context(ScriptedProvider::new(), Config::default());
        let handle = tokio::spawn(async move {
            let mut runner = StageRunner::begin(&ctx, PipelineMode::Brownfield).await;
            let halted = runner.halt_if_exceeded("legacy_analysis").await;
            (halted, runner.finish(Ok(())).await.status)
        });
        let (halted, status) = handle.await.unwrap();
        assert!(!halted);
        assert_eq!(status, RunStatus::Completed);
    }
}

//! Ingestion: raw client documents condensed into a project dossier.
//!
//! mining
//!
//! The whole document set goes to the miner in one call on the long-context
//! tier, and the dossier is critique-gated like any other stage. A finished
//! dossier can be handed to a later greenfield or greyfield run in place of a
//! transcript.

use async_trait::async_trait;

use super::{Pipeline, StageRunner, SwarmContext};
use crate::domain::errors::DomainResult;
use crate::domain::models::agent::AgentRole;
use crate::domain::models::agent_catalog;
use crate::domain::models::contracts::ProjectDossier;
use crate::domain::models::engagement::EngagementInput;
use crate::domain::models::run::{PipelineMode, RunResult};

/// Full-context document mining.
pub struct IngestionPipeline {
    ctx: SwarmContext,
}

impl IngestionPipeline {
    /// Pipeline over `ctx`.
    pub const fn new(ctx: SwarmContext) -> Self {
        Self { ctx }
    }

    async fn stages(&self, runner: &mut StageRunner<'_>, input: &EngagementInput) -> DomainResult<()> {
        input.validate_for(PipelineMode::Ingestion)?;

        let miner_input = input.miner_input();
        tracing::debug!(
            bytes = miner_input.documents.len(),
            legacy_system = miner_input.legacy_system,
            "Mining documents"
        );
        let executor = self.ctx.executor(agent_catalog::miner()).await;
        let critic = self.ctx.critic(AgentRole::Miner).await;
        runner
            .stage::<_, ProjectDossier>(&executor, &critic, &miner_input, "mining")
            .await?;
        Ok(())
    }
}

#[async_trait]
impl Pipeline for IngestionPipeline {
    fn mode(&self) -> PipelineMode {
        PipelineMode::Ingestion
    }

    async fn run_pipeline(&self, input: EngagementInput) -> RunResult {
        let mut runner = StageRunner::begin(&self.ctx, PipelineMode::Ingestion).await;
        let outcome = self.stages(&mut runner, &input).await;
        runner.finish(outcome).await
    }
}

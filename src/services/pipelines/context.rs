//! Shared collaborators for a pipeline run.

use std::sync::Arc;

use crate::domain::models::agent::{AgentProfile, AgentRole};
use crate::domain::models::config::Config;
use crate::domain::ports::{KnowledgeProvider, LlmProvider, ModelResolver, ObjectionSimilarity};
use crate::services::agent_executor::AgentExecutor;
use crate::services::cost_ledger::CostLedger;
use crate::services::critic::Critic;
use crate::services::critique_loop::CritiqueLoop;
use crate::services::model_router::TierRouter;
use crate::services::objection_filter::JaccardSimilarity;

/// Everything a pipeline needs to build agents and critics.
///
/// Cloning is cheap: every collaborator sits behind an `Arc`, and the ledger
/// is a shared handle, so clones moved into spawned tasks still charge the
/// same budget.
#[derive(Clone)]
pub struct SwarmContext {
    /// Validated run configuration
    pub config: Config,
    /// LLM backend every agent and critic calls
    pub provider: Arc<dyn LlmProvider>,
    /// Framework text source
    pub knowledge: Arc<dyn KnowledgeProvider>,
    /// Tier and alias resolution
    pub resolver: Arc<dyn ModelResolver>,
    /// Duplicate-objection detection
    pub similarity: Arc<dyn ObjectionSimilarity>,
    /// Budget shared by the whole run
    pub ledger: CostLedger,
}

impl SwarmContext {
    /// Context with the tier router, Jaccard similarity and a ledger capped at
    /// `config.budget.max_cost_usd`.
    pub fn new(config: Config, provider: Arc<dyn LlmProvider>, knowledge: Arc<dyn KnowledgeProvider>) -> Self {
        let resolver: Arc<dyn ModelResolver> = Arc::new(TierRouter::new(&config.models));
        let similarity: Arc<dyn ObjectionSimilarity> =
            Arc::new(JaccardSimilarity::new(config.critic.similarity_threshold));
        let ledger = CostLedger::new(config.budget.max_cost_usd);
        Self {
            config,
            provider,
            knowledge,
            resolver,
            similarity,
            ledger,
        }
    }

    /// Replace the model resolver.
    pub fn with_resolver(mut self, resolver: Arc<dyn ModelResolver>) -> Self {
        self.resolver = resolver;
        self
    }

    /// Replace the objection similarity measure.
    pub fn with_similarity(mut self, similarity: Arc<dyn ObjectionSimilarity>) -> Self {
        self.similarity = similarity;
        self
    }

    async fn agent_knowledge(&self, role: &str) -> String {
        self.knowledge.context_for_agent(role).await.unwrap_or_else(|err| {
            tracing::warn!(role, error = %err, "No framework knowledge for agent, continuing without");
            String::new()
        })
    }

    async fn critic_knowledge(&self, role: &str) -> String {
        self.knowledge.context_for_critic(role).await.unwrap_or_else(|err| {
            tracing::warn!(role, error = %err, "No framework knowledge for critic, continuing without");
            String::new()
        })
    }

    /// Executor for `profile`, with its role's framework text appended and the
    /// configured token and retry limits applied.
    pub async fn executor(&self, profile: AgentProfile) -> AgentExecutor {
        let knowledge = self.agent_knowledge(profile.knowledge_role()).await;
        AgentExecutor::new(
            profile,
            Arc::clone(&self.provider),
            Arc::clone(&self.resolver),
            self.ledger.clone(),
        )
        .with_knowledge(knowledge)
        .with_max_tokens(self.config.agent.max_tokens)
        .with_max_retries(self.config.agent.max_retries)
    }

    /// Critic for `role`, reading the same framework text as the role's agent.
    pub async fn critic(&self, role: AgentRole) -> Critic {
        let knowledge = self.critic_knowledge(role.knowledge_role()).await;
        Critic::new(
            role.as_str(),
            Arc::clone(&self.provider),
            Arc::clone(&self.resolver),
            self.ledger.clone(),
        )
        .with_knowledge(knowledge)
        .with_similarity(Arc::clone(&self.similarity))
        .with_model(self.config.critic.model.clone())
        .with_pass_threshold(self.config.critic.pass_threshold)
        .with_max_iterations(self.config.critic.max_iterations)
        .with_max_tokens(self.config.agent.max_tokens)
    }

    /// Critique loop charging this context's ledger.
    pub fn critique_loop(&self) -> CritiqueLoop {
        CritiqueLoop::from_config(self.ledger.clone(), &self.config)
    }
}

impl std::fmt::Debug for SwarmContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SwarmContext")
            .field("provider", &self.provider.provider_id())
            .field("max_cost_usd", &self.ledger.max_cost_usd())
            .finish_non_exhaustive()
    }
}

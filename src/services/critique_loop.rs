//! Critic-gated execution loop.
//!
//! ```text
//! Running(0) -> review -> passed? -> Passed
//!                 |
//!                 +-> objections -> rerun with feedback -> Running(i+1)
//!                 |                 (iteration 1 reruns on the escalation tier)
//!                 +-> cap reached  -> Escalated
//! budget reached at any check      -> CostExceeded
//! ```

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::errors::DomainResult;
use crate::domain::models::artifact::Artifact;
use crate::domain::models::config::Config;
use crate::domain::models::critique::{Escalation, Objection, Verdict};
use crate::services::agent_executor::AgentExecutor;
use crate::services::cost_ledger::CostLedger;
use crate::services::critic::Critic;

/// Where a critique loop is, or where it ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoopState {
    /// Review round `n` in progress
    Running(u32),
    /// Critic accepted the artifact
    Passed,
    /// Cap reached, handed to a human
    Escalated,
    /// Budget ran out
    CostExceeded,
}

impl LoopState {
    /// Whether the loop has stopped.
    pub const fn is_terminal(&self) -> bool {
        !matches!(self, Self::Running(_))
    }
}

/// Result of one `run_with_critique` call.
#[derive(Debug, Clone)]
pub struct CritiqueOutcome<O> {
    /// Stage the loop ran for
    pub stage: String,
    /// `None` only when the budget was exhausted before the agent ran
    pub artifact: Option<O>,
    /// Whether the last verdict passed
    pub passed: bool,
    /// Set when a human must look
    pub escalation: Option<Escalation>,
    /// Every verdict in review order; becomes the stage's critic log
    pub verdicts: Vec<Verdict>,
    /// How the loop ended
    pub state: LoopState,
}

/// Caller-supplied regeneration step used instead of the default
/// feedback-enriched re-run.
#[async_trait]
pub trait Rerun<O: Artifact>: Send + Sync {
    /// Produce a revised artifact from the current one and the objections
    /// raised at `iteration`.
    async fn rerun(&self, current: &O, objections: &[Objection], iteration: u32) -> DomainResult<O>;
}

/// Drives an [`AgentExecutor`] and a [`Critic`] until the artifact passes,
/// the iteration cap is hit or the budget runs out.
#[derive(Debug, Clone)]
pub struct CritiqueLoop {
    ledger: CostLedger,
    max_iterations: u32,
    escalation_tier: String,
    escalate_on_empty_exhaustion: bool,
}

impl CritiqueLoop {
    /// Loop with three iterations escalating to `tier3`.
    pub fn new(ledger: CostLedger) -> Self {
        Self {
            ledger,
            max_iterations: 3,
            escalation_tier: "tier3".to_string(),
            escalate_on_empty_exhaustion: false,
        }
    }

    /// Loop limits from the `critic` and `agent` sections.
    pub fn from_config(ledger: CostLedger, config: &Config) -> Self {
        Self {
            ledger,
            max_iterations: config.critic.max_iterations,
            escalation_tier: config.agent.escalation_tier.clone(),
            escalate_on_empty_exhaustion: config.critic.escalate_on_empty_exhaustion,
        }
    }

    /// Review rounds before escalation.
    pub const fn with_max_iterations(mut self, max_iterations: u32) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    /// Tier used for the first revision.
    pub fn with_escalation_tier(mut self, tier: impl Into<String>) -> Self {
        self.escalation_tier = tier.into();
        self
    }

    /// Escalate, rather than silently pass, a loop that runs out of
    /// iterations without ever recording an objection.
    pub const fn with_escalate_on_empty_exhaustion(mut self, enabled: bool) -> Self {
        self.escalate_on_empty_exhaustion = enabled;
        self
    }

    /// Review rounds before escalation.
    pub const fn max_iterations(&self) -> u32 {
        self.max_iterations
    }

    fn cost_escalation(&self, stage: &str, artifact: serde_json::Value) -> Escalation {
        Escalation::new(
            stage,
            artifact,
            format!("Cost limit of ${:.2} exceeded", self.ledger.max_cost_usd()),
        )
        .with_resolution("Increase cost limit or reduce scope")
    }

    /// Run `executor` on `input` under review by `critic`.
    ///
    /// Agent and critic failures are returned as errors. Budget exhaustion and
    /// unresolved objections are normal outcomes carried in the result.
    pub async fn run_with_critique<I, O>(
        &self,
        executor: &AgentExecutor,
        critic: &Critic,
        input: &I,
        stage: &str,
        rerun: Option<&dyn Rerun<O>>,
    ) -> DomainResult<CritiqueOutcome<O>>
    where
        I: Serialize + Sync + ?Sized,
        O: Artifact,
    {
        if self.ledger.is_exceeded().await {
            tracing::warn!(stage, "Budget exhausted before stage, agent not called");
            let escalation = self.cost_escalation(stage, serde_json::json!({"error": "Cost limit exceeded"}));
            return Ok(CritiqueOutcome {
                stage: stage.to_string(),
                artifact: None,
                passed: false,
                escalation: Some(escalation),
                verdicts: Vec::new(),
                state: LoopState::CostExceeded,
            });
        }

        let mut artifact: O = executor.execute(input, stage, None).await?;
        let mut objections: Vec<Objection> = Vec::new();
        let mut verdicts: Vec<Verdict> = Vec::new();
        let mut budget_tripped = false;

        for iteration in 0..self.max_iterations {
            tracing::debug!(stage, state = ?LoopState::Running(iteration), "Critique iteration");

            if self.ledger.is_exceeded().await {
                budget_tripped = true;
                break;
            }

            let verdict = critic.review(&artifact, iteration, &objections, stage).await?;

            if verdict.passed {
                tracing::info!(stage, iteration, score = verdict.score, "Stage passed review");
                verdicts.push(verdict);
                return Ok(CritiqueOutcome {
                    stage: stage.to_string(),
                    artifact: Some(artifact),
                    passed: true,
                    escalation: None,
                    verdicts,
                    state: LoopState::Passed,
                });
            }

            objections.extend(verdict.objections.iter().cloned());

            if iteration + 1 < self.max_iterations {
                artifact = match rerun {
                    Some(custom) => custom.rerun(&artifact, &verdict.objections, iteration).await?,
                    None => {
                        let model_override = if iteration == 1 {
                            tracing::info!(
                                stage,
                                tier = %self.escalation_tier,
                                "Second failed review, escalating agent model tier"
                            );
                            Some(self.escalation_tier.as_str())
                        } else {
                            None
                        };
                        executor
                            .execute_with_feedback(input, &verdict, stage, model_override)
                            .await?
                    }
                };
            }
            verdicts.push(verdict);
        }

        if budget_tripped {
            tracing::warn!(stage, reviews = verdicts.len(), "Budget exhausted inside critique loop");
            let escalation = self
                .cost_escalation(stage, serde_json::to_value(&artifact)?)
                .with_objections(objections);
            return Ok(CritiqueOutcome {
                stage: stage.to_string(),
                artifact: Some(artifact),
                passed: false,
                escalation: Some(escalation),
                verdicts,
                state: LoopState::CostExceeded,
            });
        }

        let reason = if !objections.is_empty() {
            "Max critic iterations reached with unresolved objections"
        } else if self.escalate_on_empty_exhaustion {
            "Max critic iterations reached without a passing score"
        } else {
            // Nothing left to object to. Treated as a pass.
            tracing::warn!(stage, reviews = verdicts.len(), "Critique loop exhausted with no objections");
            return Ok(CritiqueOutcome {
                stage: stage.to_string(),
                artifact: Some(artifact),
                passed: true,
                escalation: None,
                verdicts,
                state: LoopState::Passed,
            });
        };

        let escalation = Escalation::new(stage, serde_json::to_value(&artifact)?, reason)
            .with_objections(objections)
            .with_resolution(format!("Manual review required for {stage}"))
            .with_context(format!("Stage: {stage}, Iterations: {}", verdicts.len()));

        tracing::warn!(
            stage,
            objections = escalation.objections.len(),
            reason,
            "Stage escalated for human review"
        );

        Ok(CritiqueOutcome {
            stage: stage.to_string(),
            artifact: Some(artifact),
            passed: false,
            escalation: Some(escalation),
            verdicts,
            state: LoopState::Escalated,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    use crate::adapters::providers::{MockResponse, ScriptedProvider};
    use crate::domain::errors::DomainError;
    use crate::domain::models::agent::{AgentProfile, AgentRole};
    use crate::domain::models::artifact::FieldSpec;
    use crate::domain::models::cost::CostEntry;
    use crate::services::model_router::TierRouter;

    const OPUS: &str = "claude-opus-4-20250514";
    const SONNET: &str = "claude-sonnet-4-20250514";

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Memo {
        version: u32,
    }

    impl Artifact for Memo {
        const KIND: &'static str = "Memo";

        fn schema() -> &'static [FieldSpec] {
            &[]
        }
    }

    fn memo(version: u32) -> MockResponse {
        MockResponse::success(format!("{{\"version\": {version}}}"))
    }

    fn fail_with(description: &str) -> MockResponse {
        MockResponse::success(format!(
            r#"{{"passed": false, "score": 0.3, "summary": "no", "objections": [
                {{"category": "completeness", "description": "{description}", "severity": "major"}}]}}"#
        ))
    }

    fn fail_empty() -> MockResponse {
        MockResponse::success(r#"{"passed": false, "score": 0.3, "summary": "meh", "objections": []}"#)
    }

    fn pass() -> MockResponse {
        MockResponse::success(r#"{"passed": true, "score": 0.85, "summary": "good", "objections": []}"#)
    }

    struct Harness {
        provider: Arc<ScriptedProvider>,
        ledger: CostLedger,
        executor: AgentExecutor,
        critic: Critic,
    }

    fn harness(responses: Vec<MockResponse>, max_cost: f64) -> Harness {
        let provider = Arc::new(ScriptedProvider::with_responses(responses));
        let ledger = CostLedger::new(max_cost);
        let resolver = Arc::new(TierRouter::with_defaults());
        let executor = AgentExecutor::new(
            AgentProfile::new(AgentRole::Discovery, "Discovery", "Write memos."),
            provider.clone(),
            resolver.clone(),
            ledger.clone(),
        );
        let critic = Critic::new("discovery", provider.clone(), resolver, ledger.clone());
        Harness {
            provider,
            ledger,
            executor,
            critic,
        }
    }

    async fn run(h: &Harness, critique: &CritiqueLoop) -> DomainResult<CritiqueOutcome<Memo>> {
        critique
            .run_with_critique(&h.executor, &h.critic, &serde_json::json!({"ask": "memo"}), "memo", None)
            .await
    }

    #[tokio::test]
    async fn test_pass_on_first_review() {
        let h = harness(vec![memo(1), pass()], 5.0);
        let outcome = run(&h, &CritiqueLoop::new(h.ledger.clone())).await.unwrap();

        assert_eq!(outcome.state, LoopState::Passed);
        assert!(outcome.passed);
        assert!(outcome.escalation.is_none());
        assert_eq!(outcome.artifact, Some(Memo { version: 1 }));
        assert_eq!(outcome.verdicts.len(), 1);
        assert_eq!(h.provider.call_count().await, 2);
    }

    #[tokio::test]
    async fn test_always_failing_critic_escalates_after_three_reviews() {
        let h = harness(
            vec![
                memo(1),
                fail_with("no cost figures at all"),
                memo(2),
                fail_with("stakeholder roles are missing"),
                memo(3),
                fail_with("next steps are vague"),
            ],
            5.0,
        );
        let outcome = run(&h, &CritiqueLoop::new(h.ledger.clone())).await.unwrap();

        assert_eq!(outcome.state, LoopState::Escalated);
        assert!(!outcome.passed);
        assert_eq!(outcome.verdicts.len(), 3);
        assert_eq!(outcome.artifact, Some(Memo { version: 3 }));

        let escalation = outcome.escalation.unwrap();
        assert_eq!(escalation.reason, "Max critic iterations reached with unresolved objections");
        assert_eq!(escalation.suggested_resolution.as_deref(), Some("Manual review required for memo"));
        assert_eq!(escalation.context.as_deref(), Some("Stage: memo, Iterations: 3"));
        assert_eq!(escalation.objections.len(), 3);
        assert_eq!(escalation.artifact, serde_json::json!({"version": 3}));

        // 1 initial + 2 reruns, 3 reviews, nothing more
        assert_eq!(h.provider.call_count().await, 6);
    }

    #[tokio::test]
    async fn test_second_failure_reruns_on_escalation_tier() {
        let h = harness(
            vec![
                memo(1),
                fail_with("first problem"),
                memo(2),
                fail_with("second unrelated issue"),
                memo(3),
                pass(),
            ],
            5.0,
        );
        let outcome = run(&h, &CritiqueLoop::new(h.ledger.clone())).await.unwrap();
        assert_eq!(outcome.state, LoopState::Passed);

        let requests = h.provider.requests().await;
        let agent_models: Vec<&str> = [0, 2, 4].iter().map(|&i| requests[i].model.as_str()).collect();
        assert_eq!(agent_models, vec![SONNET, SONNET, OPUS]);
        assert!(requests[2].user_message.contains("critic_feedback"));
        assert!(!requests[0].user_message.contains("critic_feedback"));
    }

    #[tokio::test]
    async fn test_empty_objection_exhaustion_passes_silently() {
        let h = harness(vec![memo(1), fail_empty(), memo(2), fail_empty(), memo(3), fail_empty()], 5.0);
        let outcome = run(&h, &CritiqueLoop::new(h.ledger.clone())).await.unwrap();

        assert_eq!(outcome.state, LoopState::Passed);
        assert!(outcome.passed);
        assert!(outcome.escalation.is_none());
        assert_eq!(outcome.verdicts.len(), 3);
    }

    #[tokio::test]
    async fn test_empty_objection_exhaustion_can_escalate() {
        let h = harness(vec![memo(1), fail_empty(), memo(2), fail_empty(), memo(3), fail_empty()], 5.0);
        let critique = CritiqueLoop::new(h.ledger.clone()).with_escalate_on_empty_exhaustion(true);
        let outcome = run(&h, &critique).await.unwrap();

        assert_eq!(outcome.state, LoopState::Escalated);
        assert!(!outcome.passed);
        let escalation = outcome.escalation.unwrap();
        assert_eq!(escalation.reason, "Max critic iterations reached without a passing score");
        assert!(escalation.objections.is_empty());
    }

    #[tokio::test]
    async fn test_budget_exhausted_at_entry() {
        let h = harness(vec![], 1.0);
        h.ledger
            .record(CostEntry::new("Discovery", "discovery", SONNET).with_cost(1.0))
            .await;

        let outcome = run(&h, &CritiqueLoop::new(h.ledger.clone())).await.unwrap();
        assert_eq!(outcome.state, LoopState::CostExceeded);
        assert!(!outcome.passed);
        assert!(outcome.artifact.is_none());
        let escalation = outcome.escalation.unwrap();
        assert_eq!(escalation.artifact, serde_json::json!({"error": "Cost limit exceeded"}));
        assert_eq!(escalation.reason, "Cost limit of $1.00 exceeded");
        assert_eq!(
            escalation.suggested_resolution.as_deref(),
            Some("Increase cost limit or reduce scope")
        );
        assert_eq!(h.provider.call_count().await, 0);
    }

    #[tokio::test]
    async fn test_budget_tripped_by_first_agent_call() {
        let h = harness(vec![memo(1).with_cost(0.02)], 0.015);
        let outcome = run(&h, &CritiqueLoop::new(h.ledger.clone())).await.unwrap();

        assert_eq!(outcome.state, LoopState::CostExceeded);
        assert_eq!(outcome.artifact, Some(Memo { version: 1 }));
        assert!(outcome.verdicts.is_empty());
        assert!(outcome.escalation.unwrap().reason.starts_with("Cost limit of $"));
        // The critic was never called
        assert_eq!(h.provider.call_count().await, 1);
    }

    #[tokio::test]
    async fn test_agent_failure_propagates() {
        let h = harness(vec![MockResponse::success("garbage"), MockResponse::success("more garbage")], 5.0);
        let err = run(&h, &CritiqueLoop::new(h.ledger.clone())).await.unwrap_err();
        assert!(matches!(err, DomainError::AgentOutput { .. }));
    }

    #[tokio::test]
    async fn test_critic_parse_failure_propagates() {
        let h = harness(vec![memo(1), MockResponse::success("not a verdict")], 5.0);
        let err = run(&h, &CritiqueLoop::new(h.ledger.clone())).await.unwrap_err();
        assert!(matches!(err, DomainError::CriticParse(_)));
    }

    struct BumpVersion {
        calls: AtomicU32,
    }

    #[async_trait]
    impl Rerun<Memo> for BumpVersion {
        async fn rerun(&self, current: &Memo, objections: &[Objection], _iteration: u32) -> DomainResult<Memo> {
            assert!(!objections.is_empty());
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(Memo {
                version: current.version + 10,
            })
        }
    }

    #[tokio::test]
    async fn test_custom_rerun_replaces_agent() {
        let h = harness(vec![memo(1), fail_with("weak argument"), pass()], 5.0);
        let bump = BumpVersion {
            calls: AtomicU32::new(0),
        };

        let outcome = CritiqueLoop::new(h.ledger.clone())
            .run_with_critique(&h.executor, &h.critic, &"memo", "memo", Some(&bump as &dyn Rerun<Memo>))
            .await
            .unwrap();

        assert_eq!(outcome.artifact, Some(Memo { version: 11 }));
        assert_eq!(bump.calls.load(Ordering::SeqCst), 1);
        // agent once, critic twice
        assert_eq!(h.provider.call_count().await, 3);
    }

    #[tokio::test]
    async fn test_single_iteration_never_reruns() {
        let h = harness(vec![memo(1), fail_with("thin")], 5.0);
        let outcome = run(&h, &CritiqueLoop::new(h.ledger.clone()).with_max_iterations(1))
            .await
            .unwrap();
        assert_eq!(outcome.state, LoopState::Escalated);
        assert_eq!(h.provider.call_count().await, 2);
    }
}

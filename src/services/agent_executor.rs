//! Typed-output agent execution.
//!
//! One `execute` call is one logical agent turn: build the prompt, call the
//! provider, extract and validate the JSON, and on failure retry with the
//! error appended, up to `max_retries` extra attempts.

use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;
use tokio::sync::RwLock;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::agent::AgentProfile;
use crate::domain::models::artifact::Artifact;
use crate::domain::models::cost::CostEntry;
use crate::domain::models::critique::{CriticFeedback, Verdict};
use crate::domain::ports::{CompletionRequest, LlmProvider, ModelResolver, TokenUsage};
use crate::infrastructure::validators::parse_artifact;
use crate::services::cost_ledger::CostLedger;

const DEFAULT_MAX_TOKENS: u32 = 4096;
const DEFAULT_MAX_RETRIES: u32 = 1;

/// Runs one agent profile against the provider with a typed output contract.
pub struct AgentExecutor {
    profile: AgentProfile,
    knowledge: String,
    provider: Arc<dyn LlmProvider>,
    resolver: Arc<dyn ModelResolver>,
    ledger: CostLedger,
    max_tokens: u32,
    max_retries: u32,
    usage: RwLock<TokenUsage>,
}

impl AgentExecutor {
    /// Executor for `profile` with one retry and a 4096-token cap.
    pub fn new(
        profile: AgentProfile,
        provider: Arc<dyn LlmProvider>,
        resolver: Arc<dyn ModelResolver>,
        ledger: CostLedger,
    ) -> Self {
        Self {
            profile,
            knowledge: String::new(),
            provider,
            resolver,
            ledger,
            max_tokens: DEFAULT_MAX_TOKENS,
            max_retries: DEFAULT_MAX_RETRIES,
            usage: RwLock::new(TokenUsage::default()),
        }
    }

    /// Framework text placed under `# FRAMEWORK KNOWLEDGE`.
    pub fn with_knowledge(mut self, knowledge: impl Into<String>) -> Self {
        self.knowledge = knowledge.into();
        self
    }

    /// Output cap per call.
    pub const fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Extra attempts after a malformed response.
    pub const fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Profile this executor runs.
    pub const fn profile(&self) -> &AgentProfile {
        &self.profile
    }

    /// Framework text given to the agent.
    pub fn knowledge(&self) -> &str {
        &self.knowledge
    }

    /// Tokens consumed by every call this executor has made.
    pub async fn total_usage(&self) -> TokenUsage {
        *self.usage.read().await
    }

    /// Role instructions, knowledge, then the output contract for `O`.
    pub fn system_prompt<O: Artifact>(&self) -> String {
        let mut prompt = self.profile.system_prompt.clone();

        if !self.knowledge.trim().is_empty() {
            prompt.push_str("\n\n# FRAMEWORK KNOWLEDGE\n\n");
            prompt.push_str("Use the following frameworks to guide your analysis:\n\n");
            prompt.push_str(&self.knowledge);
        }

        prompt.push_str("\n\n# OUTPUT FORMAT\n\n");
        prompt.push_str(&O::describe_schema());
        prompt.push_str("\nRespond with the JSON object only. No prose before or after it.");
        prompt
    }

    /// Run the agent on `input` and return a validated `O`.
    ///
    /// `model_override` replaces the profile's default tier for this call
    /// only. Provider failures are returned immediately; malformed output is
    /// retried with the parse error fed back to the model.
    pub async fn execute<I, O>(&self, input: &I, stage: &str, model_override: Option<&str>) -> DomainResult<O>
    where
        I: Serialize + Sync + ?Sized,
        O: Artifact,
    {
        let system_prompt = self.system_prompt::<O>();
        let input_json = serde_json::to_string_pretty(input)?;
        let alias = model_override.unwrap_or(&self.profile.default_model);
        let model = self.resolver.resolve(alias);
        let attempts = self.max_retries + 1;

        let mut last_error: Option<String> = None;

        for attempt in 1..=attempts {
            let user_message = match &last_error {
                None => format!("# INPUT\n\n{input_json}"),
                Some(error) => format!(
                    "# INPUT\n\n{input_json}\n\n# PREVIOUS ERROR\n\n\
                     Your previous response did not match the required output format. \
                     Error: {error}\n\n\
                     Fix the issues and respond with valid JSON only."
                ),
            };

            tracing::debug!(
                agent = %self.profile.name,
                stage,
                model = %model,
                attempt,
                "Calling agent"
            );

            let response = self
                .provider
                .complete(CompletionRequest::new(
                    system_prompt.as_str(),
                    user_message,
                    model.as_str(),
                    self.max_tokens,
                ))
                .await?;

            self.usage
                .write()
                .await
                .add(response.input_tokens, response.output_tokens);
            self.ledger
                .record(
                    CostEntry::new(&self.profile.name, stage, &response.model_used)
                        .with_tokens(response.input_tokens, response.output_tokens)
                        .with_cost(response.cost_usd),
                )
                .await;

            tracing::info!(
                agent = %self.profile.name,
                stage,
                model = %response.model_used,
                attempt,
                input_tokens = response.input_tokens,
                output_tokens = response.output_tokens,
                cost_usd = response.cost_usd,
                "Agent call completed"
            );

            match parse_artifact::<O>(&response.content) {
                Ok(artifact) => return Ok(artifact),
                Err(error) => {
                    tracing::warn!(
                        agent = %self.profile.name,
                        stage,
                        attempt,
                        max_attempts = attempts,
                        error = %error,
                        "Agent output rejected"
                    );
                    last_error = Some(error);
                }
            }
        }

        Err(DomainError::AgentOutput {
            agent: self.profile.name.clone(),
            attempts,
            message: last_error.unwrap_or_default(),
        })
    }

    /// Re-run the agent with the critic's verdict folded into its input.
    pub async fn execute_with_feedback<I, O>(
        &self,
        input: &I,
        verdict: &Verdict,
        stage: &str,
        model_override: Option<&str>,
    ) -> DomainResult<O>
    where
        I: Serialize + Sync + ?Sized,
        O: Artifact,
    {
        let enriched = enrich_with_feedback(input, verdict)?;
        self.execute(&enriched, stage, model_override).await
    }
}

/// Attach a `critic_feedback` block to `input`.
///
/// Object inputs gain a `critic_feedback` key. Anything else is wrapped as
/// `{input, critic_feedback}`.
pub fn enrich_with_feedback<I: Serialize + ?Sized>(input: &I, verdict: &Verdict) -> DomainResult<Value> {
    let feedback = serde_json::to_value(CriticFeedback::new(verdict.score, &verdict.objections))?;

    Ok(match serde_json::to_value(input)? {
        Value::Object(mut fields) => {
            fields.insert("critic_feedback".to_string(), feedback);
            Value::Object(fields)
        }
        other => serde_json::json!({ "input": other, "critic_feedback": feedback }),
    })
}

//! Automated artifact reviewer.
//!
//! The critic judges an artifact against the same framework text its agent
//! was given, scores it and raises objections. Repeats of earlier objections
//! are dropped before the verdict leaves this module, and `passed` is always
//! recomputed from the score.

use std::sync::Arc;

use serde_json::Value;
use tokio::sync::RwLock;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::artifact::Artifact;
use crate::domain::models::cost::CostEntry;
use crate::domain::models::critique::{Objection, Verdict};
use crate::domain::ports::{CompletionRequest, LlmProvider, ModelResolver, ObjectionSimilarity, TokenUsage};
use crate::infrastructure::validators::extract_json_payload;
use crate::services::cost_ledger::CostLedger;
use crate::services::objection_filter::{filter_duplicates, JaccardSimilarity};

const CRITIC_SYSTEM_PROMPT: &str = r"You are the reviewer of a software consultancy. You check the work of
other agents against established frameworks.

For every artifact:
1. Read it against each relevant framework principle below.
2. Raise an objection for each genuine violation, with a category
   (completeness, accuracy, framework_compliance, consistency, ...), a
   description, the principle it breaks, a severity and a suggested fix.
3. Score the artifact from 0.0 to 1.0. It passes at {threshold} or above.
4. List what the artifact does well.

Severity:
- blocking: the artifact is unusable until this is fixed
- major: should be fixed before the work moves on
- minor: worth noting, not worth another round

Be fair. Raise only real violations, and never repeat an objection from an
earlier iteration.";

const VERDICT_FORMAT: &str = r#"Respond with a single JSON object:
- passed (boolean, required): your pass/fail call
- score (number, required): overall score between 0.0 and 1.0
- objections (array, required): each {"category", "description", "reference", "severity": "blocking"|"major"|"minor", "suggested_fix"}
- summary (string, required): one-paragraph assessment
- strengths (array of string, optional): what the artifact does well"#;

/// Critic for one agent role.
pub struct Critic {
    role: String,
    knowledge: String,
    provider: Arc<dyn LlmProvider>,
    resolver: Arc<dyn ModelResolver>,
    ledger: CostLedger,
    similarity: Arc<dyn ObjectionSimilarity>,
    model: String,
    pass_threshold: f64,
    max_iterations: u32,
    max_tokens: u32,
    usage: RwLock<TokenUsage>,
}

impl Critic {
    /// Critic for `role` on the default tier, threshold and iteration cap.
    pub fn new(
        role: impl Into<String>,
        provider: Arc<dyn LlmProvider>,
        resolver: Arc<dyn ModelResolver>,
        ledger: CostLedger,
    ) -> Self {
        Self {
            role: role.into(),
            knowledge: String::new(),
            provider,
            resolver,
            ledger,
            similarity: Arc::new(JaccardSimilarity::default()),
            model: "tier2".to_string(),
            pass_threshold: 0.7,
            max_iterations: 3,
            max_tokens: 4096,
            usage: RwLock::new(TokenUsage::default()),
        }
    }

    /// Framework text the artifact is judged against.
    pub fn with_knowledge(mut self, knowledge: impl Into<String>) -> Self {
        self.knowledge = knowledge.into();
        self
    }

    /// Replace the duplicate-objection measure.
    pub fn with_similarity(mut self, similarity: Arc<dyn ObjectionSimilarity>) -> Self {
        self.similarity = similarity;
        self
    }

    /// Tier or model id for review calls.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Minimum score that passes.
    pub const fn with_pass_threshold(mut self, pass_threshold: f64) -> Self {
        self.pass_threshold = pass_threshold;
        self
    }

    /// Revision rounds before escalation.
    pub const fn with_max_iterations(mut self, max_iterations: u32) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    /// Output cap for review calls.
    pub const fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Role this critic reviews.
    pub fn role(&self) -> &str {
        &self.role
    }

    /// Revision rounds before escalation.
    pub const fn max_iterations(&self) -> u32 {
        self.max_iterations
    }

    /// Tokens spent on reviews so far.
    pub async fn total_usage(&self) -> TokenUsage {
        *self.usage.read().await
    }

    fn system_prompt(&self) -> String {
        let mut prompt = CRITIC_SYSTEM_PROMPT.replace("{threshold}", &format!("{:.2}", self.pass_threshold));
        if !self.knowledge.trim().is_empty() {
            prompt.push_str("\n\n# FRAMEWORK KNOWLEDGE\n\n");
            prompt.push_str("Evaluate the artifact against these frameworks:\n\n");
            prompt.push_str(&self.knowledge);
        }
        prompt.push_str("\n\n# OUTPUT FORMAT\n\n");
        prompt.push_str(VERDICT_FORMAT);
        prompt
    }

    fn review_message<O: Artifact>(&self, artifact: &O, iteration: u32, previous: &[Objection]) -> DomainResult<String> {
        let mut message = format!(
            "# ARTIFACT TO REVIEW\n\nType: {}\n\n```json\n{}\n```\n\n# REVIEW CONTEXT\n\nIteration: {} of {}\n",
            O::KIND,
            serde_json::to_string_pretty(artifact)?,
            iteration + 1,
            self.max_iterations
        );

        if !previous.is_empty() {
            message.push_str("\n# PREVIOUS OBJECTIONS (DO NOT REPEAT)\n\n");
            for (i, objection) in previous.iter().enumerate() {
                message.push_str(&format!("{}. {}\n", i + 1, objection.summary_line()));
            }
        }
        Ok(message)
    }

    /// Review `artifact` at 0-based `iteration`.
    ///
    /// `previous` is the loop's full objection history; repeats of it are
    /// removed from the returned verdict. A malformed response is fatal.
    pub async fn review<O: Artifact>(
        &self,
        artifact: &O,
        iteration: u32,
        previous: &[Objection],
        stage: &str,
    ) -> DomainResult<Verdict> {
        let model = self.resolver.resolve(&self.model);
        let request = CompletionRequest::new(
            self.system_prompt(),
            self.review_message(artifact, iteration, previous)?,
            model,
            self.max_tokens,
        );

        let response = self.provider.complete(request).await?;

        self.usage
            .write()
            .await
            .add(response.input_tokens, response.output_tokens);
        self.ledger
            .record(
                CostEntry::new(format!("critic({})", self.role), stage, &response.model_used)
                    .with_tokens(response.input_tokens, response.output_tokens)
                    .with_cost(response.cost_usd),
            )
            .await;

        let mut verdict = self.parse_verdict(&response.content, iteration)?;

        let (kept, dropped) = filter_duplicates(
            std::mem::take(&mut verdict.objections),
            previous,
            self.similarity.as_ref(),
        );
        verdict.objections = kept;

        let claimed = verdict.passed;
        verdict.apply_threshold(self.pass_threshold);
        if claimed != verdict.passed {
            tracing::debug!(
                role = %self.role,
                score = verdict.score,
                claimed,
                "Critic pass flag overridden by score"
            );
        }

        tracing::info!(
            role = %self.role,
            stage,
            iteration,
            score = verdict.score,
            passed = verdict.passed,
            blocking = verdict.blocking_count(),
            objections = verdict.objections.len(),
            dropped_duplicates = dropped.len(),
            "Critic verdict"
        );

        Ok(verdict)
    }

    fn parse_verdict(&self, raw: &str, iteration: u32) -> DomainResult<Verdict> {
        let payload = extract_json_payload(raw);
        let mut data: Value = serde_json::from_str(payload)
            .map_err(|e| DomainError::CriticParse(format!("invalid verdict JSON: {e}")))?;

        let fields = data
            .as_object_mut()
            .ok_or_else(|| DomainError::CriticParse("verdict is not a JSON object".to_string()))?;
        fields.insert("iteration".to_string(), Value::from(iteration));
        fields.insert("max_iterations".to_string(), Value::from(self.max_iterations));

        if let Some(Value::Array(objections)) = fields.get_mut("objections") {
            for objection in objections {
                if let Some(Value::String(severity)) = objection.get_mut("severity") {
                    *severity = severity.to_lowercase();
                }
            }
        }

        let verdict: Verdict = serde_json::from_value(data)
            .map_err(|e| DomainError::CriticParse(format!("verdict does not match schema: {e}")))?;

        if !verdict.score.is_finite() || !(0.0..=1.0).contains(&verdict.score) {
            return Err(DomainError::CriticParse(format!(
                "score {} outside [0, 1]",
                verdict.score
            )));
        }
        Ok(verdict)
    }
}

//! Critic review records: objections, verdicts and human escalations.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// How serious an objection is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Artifact is unusable until fixed.
    Blocking,
    /// Should be fixed before proceeding.
    Major,
    /// Logged only.
    Minor,
}

impl Severity {
    /// Lowercase wire name.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Blocking => "blocking",
            Self::Major => "major",
            Self::Minor => "minor",
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single flagged deficiency raised by the critic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Objection {
    /// completeness, accuracy, framework_compliance, ...
    pub category: String,
    /// What is wrong, in the critic's words
    pub description: String,
    /// Framework principle the artifact violates
    #[serde(default)]
    pub reference: String,
    /// How serious the deficiency is
    pub severity: Severity,
    /// Concrete change the critic proposes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggested_fix: Option<String>,
    /// JSON path to the offending part of the artifact
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub artifact_path: Option<String>,
}

impl Objection {
    /// Objection with no reference, fix or path.
    pub fn new(category: impl Into<String>, description: impl Into<String>, severity: Severity) -> Self {
        Self {
            category: category.into(),
            description: description.into(),
            reference: String::new(),
            severity,
            suggested_fix: None,
            artifact_path: None,
        }
    }

    /// Set the framework principle being violated.
    pub fn with_reference(mut self, reference: impl Into<String>) -> Self {
        self.reference = reference.into();
        self
    }

    /// Attach a proposed fix.
    pub fn with_suggested_fix(mut self, fix: impl Into<String>) -> Self {
        self.suggested_fix = Some(fix.into());
        self
    }

    /// `[SEVERITY] category: description`, the form repeated back to the critic.
    pub fn summary_line(&self) -> String {
        format!(
            "[{}] {}: {}",
            self.severity.as_str().to_uppercase(),
            self.category,
            self.description
        )
    }
}

/// Outcome of one critic review.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Verdict {
    /// Whether the artifact clears the bar. Always recomputed from `score`.
    pub passed: bool,
    /// Overall score in `[0, 1]`
    pub score: f64,
    /// New objections raised in this review, duplicates already removed
    #[serde(default)]
    pub objections: Vec<Objection>,
    /// Zero-based review index within the critique loop
    #[serde(default)]
    pub iteration: u32,
    /// Review cap of the loop that asked for this verdict
    #[serde(default = "default_max_iterations")]
    pub max_iterations: u32,
    /// Short overall assessment
    #[serde(default)]
    pub summary: String,
    /// What the artifact does well
    #[serde(default)]
    pub strengths: Vec<String>,
}

const fn default_max_iterations() -> u32 {
    3
}

impl Verdict {
    /// Replace the critic's self-reported `passed` with the score comparison.
    pub fn apply_threshold(&mut self, pass_threshold: f64) {
        self.passed = self.score >= pass_threshold;
    }

    /// Number of blocking objections.
    pub fn blocking_count(&self) -> usize {
        self.count(Severity::Blocking)
    }

    /// Number of objections at `severity`.
    pub fn count(&self, severity: Severity) -> usize {
        self.objections
            .iter()
            .filter(|o| o.severity == severity)
            .count()
    }
}

/// Structured feedback injected into an agent's input on a re-run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CriticFeedback {
    /// Score of the failed review
    pub score: f64,
    /// The objections the agent must address
    pub objections: Vec<FeedbackItem>,
    /// Closing instruction to the agent
    pub instruction: String,
}

/// An objection as shown to the agent: no reference or artifact path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedbackItem {
    /// Objection category
    pub category: String,
    /// What the agent got wrong
    pub description: String,
    /// How serious it is
    pub severity: Severity,
    /// The critic's proposed fix, if any
    pub suggested_fix: Option<String>,
}

impl CriticFeedback {
    /// Feedback block for a review that scored `score` and raised `objections`.
    pub fn new(score: f64, objections: &[Objection]) -> Self {
        Self {
            score,
            objections: objections
                .iter()
                .map(|o| FeedbackItem {
                    category: o.category.clone(),
                    description: o.description.clone(),
                    severity: o.severity,
                    suggested_fix: o.suggested_fix.clone(),
                })
                .collect(),
            instruction: "Address the objections listed above in your revised output.".to_string(),
        }
    }
}

/// Terminal record handed to a human when automated review cannot resolve a stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Escalation {
    /// Unique id for cross-referencing in reports
    pub id: Uuid,
    /// Stage the escalation was raised for
    pub stage: String,
    /// Serialized artifact under review, or an error marker when none exists
    pub artifact: serde_json::Value,
    /// Full objection history of the critique loop
    pub objections: Vec<Objection>,
    /// Why automated review gave up
    pub reason: String,
    /// What a human should do next
    pub suggested_resolution: Option<String>,
    /// Extra detail such as the iteration count
    pub context: Option<String>,
    /// When the escalation was raised
    pub created_at: DateTime<Utc>,
}

impl Escalation {
    /// Escalation with no objections, resolution or context yet.
    pub fn new(stage: impl Into<String>, artifact: serde_json::Value, reason: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            stage: stage.into(),
            artifact,
            objections: Vec::new(),
            reason: reason.into(),
            suggested_resolution: None,
            context: None,
            created_at: Utc::now(),
        }
    }

    /// Attach the objection history.
    pub fn with_objections(mut self, objections: Vec<Objection>) -> Self {
        self.objections = objections;
        self
    }

    /// Set the suggested resolution.
    pub fn with_resolution(mut self, resolution: impl Into<String>) -> Self {
        self.suggested_resolution = Some(resolution.into());
        self
    }

    /// Set free-form context.
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }
}

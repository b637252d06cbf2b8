//! Synthesis and proposal outputs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::architecture::ArchitectureDecision;
use super::discovery::PainMonetizationMatrix;
use super::estimation::{ConeOfUncertainty, PertEstimate};
use crate::domain::models::artifact::{ensure, Artifact, FieldSpec};

/// Situation, Complication, Question, Answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScqaFrame {
    /// Where the client stands
    pub situation: String,
    /// What changed or hurts
    pub complication: String,
    /// What they must decide
    pub question: String,
    /// The recommendation
    pub answer: String,
}

/// A delivery risk and its handling.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskItem {
    /// What could go wrong
    pub risk: String,
    /// low, medium, high
    pub probability: String,
    /// Effect if it happens
    pub impact: String,
    /// How it is reduced
    pub mitigation: String,
}

/// Everything the proposal writer needs, structured top-down.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngagementSummary {
    /// Top-down framing
    pub scqa: ScqaFrame,
    /// Discovery artifact, unchanged
    pub pain_matrix: PainMonetizationMatrix,
    /// Key decisions
    pub architecture_decisions: Vec<ArchitectureDecision>,
    /// Per-task estimates
    pub estimates: Vec<PertEstimate>,
    /// Overall range
    pub total_estimate: ConeOfUncertainty,
    /// Top risks
    #[serde(default)]
    pub key_risks: Vec<RiskItem>,
    /// Engagement assumptions
    #[serde(default)]
    pub assumptions: Vec<String>,
    /// Explicit exclusions
    #[serde(default)]
    pub out_of_scope: Vec<String>,
}

impl Artifact for EngagementSummary {
    const KIND: &'static str = "EngagementSummary";

    fn schema() -> &'static [FieldSpec] {
        const FIELDS: &[FieldSpec] = &[
            FieldSpec::required("scqa", "{situation, complication, question, answer}", "Minto SCQA frame"),
            FieldSpec::required("pain_matrix", "PainMonetizationMatrix", "Pain matrix from the input, unchanged"),
            FieldSpec::required("architecture_decisions", "list<ArchitectureDecision>", "Key decisions"),
            FieldSpec::required("estimates", "list<PertEstimate>", "PERT estimates from the input"),
            FieldSpec::required("total_estimate", "ConeOfUncertainty", "Overall estimate range"),
            FieldSpec::optional("key_risks[]", "{risk, probability, impact, mitigation}", "Top risks"),
            FieldSpec::optional("assumptions", "list<string>", "Engagement assumptions"),
            FieldSpec::optional("out_of_scope", "list<string>", "Explicit exclusions"),
        ];
        FIELDS
    }

    fn validate(&self) -> Result<(), String> {
        self.pain_matrix.validate()?;
        for estimate in &self.estimates {
            estimate.check()?;
        }
        ensure(!self.scqa.answer.trim().is_empty(), || "scqa.answer must not be empty".to_string())
    }
}

/// The first page of a proposal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutiveSummary {
    /// One-sentence recommendation
    pub bottom_line: String,
    /// What the client gains
    pub key_benefits: Vec<String>,
    /// Cost in one line
    pub investment_summary: String,
    /// What to do next
    pub recommended_action: String,
}

/// A billable checkpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Milestone {
    /// Milestone name
    pub name: String,
    /// What it delivers
    pub description: String,
    /// Concrete outputs
    #[serde(default)]
    pub deliverables: Vec<String>,
    /// Effort in hours
    pub estimated_hours: f64,
    /// Milestones that must come first
    #[serde(default)]
    pub dependencies: Vec<String>,
}

/// A stage the client can fund on its own.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeliveryPhase {
    /// Phase name
    pub phase_name: String,
    /// poc, mvp, v1, extension
    pub phase_type: String,
    /// What the phase proves or ships
    pub goal: String,
    /// How completion is judged
    pub success_criteria: Vec<String>,
    /// Milestones in the phase
    pub milestones: Vec<Milestone>,
    /// Effort in hours
    pub estimated_hours: f64,
    /// Calendar length
    pub estimated_weeks: u32,
    /// USD at the engagement rate
    #[serde(default)]
    pub estimated_cost: Option<f64>,
    /// Whether the client gets value stopping after this phase
    pub can_stop_here: bool,
    /// What must exist before it starts
    #[serde(default)]
    pub prerequisites: Vec<String>,
}

/// Proposal stage artifact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProposalDocument {
    /// Document title
    pub title: String,
    /// Client it is addressed to
    pub client_name: String,
    /// Author line
    #[serde(default = "default_prepared_by")]
    pub prepared_by: String,
    /// Issue date
    #[serde(default = "Utc::now")]
    pub date: DateTime<Utc>,
    /// First page
    pub executive_summary: ExecutiveSummary,
    /// Synthesis the proposal was written from
    pub engagement_summary: EngagementSummary,
    /// The problem in client terms
    pub problem_statement: String,
    /// What will be built
    pub proposed_solution: String,
    /// How it will be built
    pub technical_approach: String,
    /// Billable checkpoints
    pub milestones: Vec<Milestone>,
    /// Total calendar length
    pub timeline_weeks: u32,
    /// Fundable stages
    #[serde(default)]
    pub delivery_phases: Vec<DeliveryPhase>,
    /// Phase to start with
    #[serde(default)]
    pub recommended_first_phase: Option<String>,
    /// Price statement
    pub investment: String,
    /// Commercial terms
    #[serde(default)]
    pub terms_and_conditions: Option<String>,
    /// Supporting material
    #[serde(default)]
    pub appendices: Vec<String>,
}

fn default_prepared_by() -> String {
    "Meta-Factory".to_string()
}

impl Artifact for ProposalDocument {
    const KIND: &'static str = "ProposalDocument";

    fn schema() -> &'static [FieldSpec] {
        const FIELDS: &[FieldSpec] = &[
            FieldSpec::required("title", "string", "Proposal title"),
            FieldSpec::required("client_name", "string", "Client name"),
            FieldSpec::required(
                "executive_summary",
                "{bottom_line, key_benefits[1..5], investment_summary, recommended_action}",
                "Pyramid-principle executive summary",
            ),
            FieldSpec::required("engagement_summary", "EngagementSummary", "The input summary, unchanged"),
            FieldSpec::required("problem_statement", "string", "Detailed problem analysis"),
            FieldSpec::required("proposed_solution", "string", "Detailed solution description"),
            FieldSpec::required("technical_approach", "string", "Technical approach and architecture"),
            FieldSpec::required(
                "milestones[]",
                "{name, description, deliverables, estimated_hours, dependencies}",
                "Delivery milestones",
            ),
            FieldSpec::required("timeline_weeks", "integer >= 1", "Overall timeline"),
            FieldSpec::optional(
                "delivery_phases[]",
                "{phase_name, phase_type, goal, success_criteria, milestones, estimated_hours, estimated_weeks, can_stop_here}",
                "Staged delivery plan",
            ),
            FieldSpec::optional("recommended_first_phase", "string", "Usually POC or MVP"),
            FieldSpec::required("investment", "string", "Investment and pricing section"),
            FieldSpec::optional("terms_and_conditions", "string", "Commercial terms"),
        ];
        FIELDS
    }

    fn validate(&self) -> Result<(), String> {
        let benefits = self.executive_summary.key_benefits.len();
        ensure((1..=5).contains(&benefits), || {
            format!("executive_summary.key_benefits must hold 1 to 5 items, got {benefits}")
        })?;
        ensure(self.timeline_weeks >= 1, || "timeline_weeks must be at least 1".to_string())?;
        for phase in &self.delivery_phases {
            ensure(!phase.success_criteria.is_empty() && !phase.milestones.is_empty(), || {
                format!("delivery phase '{}' needs success criteria and milestones", phase.phase_name)
            })?;
            ensure(phase.estimated_weeks >= 1, || {
                format!("delivery phase '{}' must last at least one week", phase.phase_name)
            })?;
        }
        self.engagement_summary.validate()
    }
}

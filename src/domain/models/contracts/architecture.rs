//! Architecture output: ATAM utility tree and decisions.

use serde::{Deserialize, Serialize};

use crate::domain::models::artifact::{ensure, Artifact, FieldSpec};

/// H / M / L rating used for both importance and difficulty.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Rating {
    /// Rated H
    #[serde(rename = "H", alias = "h", alias = "high")]
    High,
    /// Rated M
    #[serde(rename = "M", alias = "m", alias = "medium")]
    Medium,
    /// Rated L
    #[serde(rename = "L", alias = "l", alias = "low")]
    Low,
}

/// One leaf of the ATAM utility tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QualityScenario {
    /// performance, security, scalability, ...
    pub attribute: String,
    /// Concrete scenario text
    pub scenario: String,
    /// Business importance
    pub importance: Rating,
    /// Technical difficulty
    pub difficulty: Rating,
    /// Triggering event
    #[serde(default)]
    pub stimulus: Option<String>,
    /// Expected system response
    #[serde(default)]
    pub response: Option<String>,
    /// How the response is measured
    #[serde(default)]
    pub response_measure: Option<String>,
}

/// Prioritized quality attribute scenarios.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UtilityTree {
    /// Leaves of the tree
    pub scenarios: Vec<QualityScenario>,
}

/// How a decision can go wrong.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureMode {
    /// What fails
    pub description: String,
    /// How likely it is
    pub likelihood: String,
    /// What it costs when it happens
    pub impact: String,
    /// How it is contained
    pub mitigation: String,
}

/// One recorded architecture decision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArchitectureDecision {
    /// What was decided
    pub decision: String,
    /// Forces behind it
    pub context: String,
    /// Named pattern applied
    pub pattern_used: String,
    /// Enterprise Integration Patterns entry, if any
    #[serde(default)]
    pub eip_reference: Option<String>,
    /// What is given up
    pub trade_off: String,
    /// Options rejected
    #[serde(default)]
    pub alternatives_considered: Vec<String>,
    /// Known ways it fails
    #[serde(default)]
    pub failure_modes: Vec<FailureMode>,
}

/// Architecture stage artifact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArchitectureResult {
    /// Prioritized quality scenarios
    pub utility_tree: UtilityTree,
    /// Decisions taken
    pub decisions: Vec<ArchitectureDecision>,
    /// Integration patterns in use
    #[serde(default)]
    pub integration_patterns: Vec<String>,
    /// Mermaid or PlantUML source
    #[serde(default)]
    pub component_diagram: Option<String>,
}

impl Artifact for ArchitectureResult {
    const KIND: &'static str = "ArchitectureResult";

    fn schema() -> &'static [FieldSpec] {
        const FIELDS: &[FieldSpec] = &[
            FieldSpec::required("utility_tree.scenarios", "list", "At least one quality scenario"),
            FieldSpec::required("utility_tree.scenarios[].attribute", "string", "Quality attribute"),
            FieldSpec::required("utility_tree.scenarios[].scenario", "string", "Concrete scenario"),
            FieldSpec::required("utility_tree.scenarios[].importance", "H|M|L", "Business importance"),
            FieldSpec::required("utility_tree.scenarios[].difficulty", "H|M|L", "Technical difficulty"),
            FieldSpec::optional("utility_tree.scenarios[].response_measure", "string", "How to measure it"),
            FieldSpec::required("decisions", "list", "At least one architecture decision"),
            FieldSpec::required("decisions[].decision", "string", "The decision made"),
            FieldSpec::required("decisions[].context", "string", "Constraints that led to it"),
            FieldSpec::required("decisions[].pattern_used", "string", "Pattern applied"),
            FieldSpec::optional("decisions[].eip_reference", "string", "Enterprise Integration Pattern"),
            FieldSpec::required("decisions[].trade_off", "string", "Trade-offs involved"),
            FieldSpec::optional("decisions[].alternatives_considered", "list<string>", "Rejected options"),
            FieldSpec::optional(
                "decisions[].failure_modes[]",
                "{description, likelihood, impact, mitigation}",
                "What could go wrong",
            ),
            FieldSpec::optional("integration_patterns", "list<string>", "EIP patterns used"),
            FieldSpec::optional("component_diagram", "string", "Mermaid or PlantUML source"),
        ];
        FIELDS
    }

    fn validate(&self) -> Result<(), String> {
        ensure(!self.utility_tree.scenarios.is_empty(), || {
            "utility_tree.scenarios must contain at least one scenario".to_string()
        })?;
        ensure(!self.decisions.is_empty(), || {
            "decisions must contain at least one decision".to_string()
        })
    }
}

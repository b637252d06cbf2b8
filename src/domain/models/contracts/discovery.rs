//! Discovery output: pains quantified in money.

use serde::{Deserialize, Serialize};

use crate::domain::models::artifact::{ensure, Artifact, FieldSpec};

/// How often a pain occurs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Frequency {
    /// Every working day
    Daily,
    /// Once a week or so
    Weekly,
    /// Once a month or so
    Monthly,
    /// A few times a year
    Quarterly,
    /// Less than quarterly
    Rarely,
}

/// Urgency of a stakeholder need.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    /// Blocks the business
    Critical,
    /// Needed this engagement
    High,
    /// Wanted soon
    Medium,
    /// Nice to have
    Low,
}

/// A business pain the client described.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PainPoint {
    /// What hurts
    pub description: String,
    /// How often it happens
    pub frequency: Frequency,
    /// USD lost each time, when stated
    #[serde(default)]
    pub cost_per_incident: Option<f64>,
    /// USD lost per year, when known
    #[serde(default)]
    pub annual_cost: Option<f64>,
    /// Direct quote from the input that evidences the pain
    pub source_quote: String,
    /// Certainty of the estimate, 0.0 to 1.0
    pub confidence: f64,
}

/// What one stakeholder role needs from the work.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StakeholderNeed {
    /// Job title or function
    pub role: String,
    /// What they need
    pub need: String,
    /// How urgent it is
    pub priority: Priority,
}

/// Discovery stage artifact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PainMonetizationMatrix {
    /// Quantified pains
    pub pain_points: Vec<PainPoint>,
    /// Needs by role
    #[serde(default)]
    pub stakeholder_needs: Vec<StakeholderNeed>,
    /// Sum of annual costs, when stated
    #[serde(default)]
    pub total_annual_cost_of_pain: Option<f64>,
    /// Hard constraints: regulatory, technical, budgetary
    #[serde(default)]
    pub key_constraints: Vec<String>,
    /// Suggested follow-ups
    #[serde(default)]
    pub recommended_next_steps: Vec<String>,
}

impl Artifact for PainMonetizationMatrix {
    const KIND: &'static str = "PainMonetizationMatrix";

    fn schema() -> &'static [FieldSpec] {
        const FIELDS: &[FieldSpec] = &[
            FieldSpec::required("pain_points", "list", "At least one quantified pain point"),
            FieldSpec::required("pain_points[].description", "string", "What the pain point is"),
            FieldSpec::required(
                "pain_points[].frequency",
                "daily|weekly|monthly|quarterly|rarely",
                "How often it occurs",
            ),
            FieldSpec::optional("pain_points[].cost_per_incident", "number", "USD cost per occurrence"),
            FieldSpec::optional("pain_points[].annual_cost", "number", "Annualised USD cost"),
            FieldSpec::required("pain_points[].source_quote", "string", "Direct quote evidencing the pain"),
            FieldSpec::required("pain_points[].confidence", "number 0..1", "Confidence in this pain point"),
            FieldSpec::optional("stakeholder_needs[].role", "string", "e.g. CTO, Operations Manager"),
            FieldSpec::optional("stakeholder_needs[].need", "string", "The specific need expressed"),
            FieldSpec::optional(
                "stakeholder_needs[].priority",
                "critical|high|medium|low",
                "Priority of the need",
            ),
            FieldSpec::optional("total_annual_cost_of_pain", "number", "Sum of quantified pain"),
            FieldSpec::optional("key_constraints", "list<string>", "Regulatory, technical, budgetary constraints"),
            FieldSpec::optional("recommended_next_steps", "list<string>", "Suggested next steps"),
        ];
        FIELDS
    }

    fn validate(&self) -> Result<(), String> {
        ensure(!self.pain_points.is_empty(), || {
            "pain_points must contain at least one item".to_string()
        })?;
        for (i, pain) in self.pain_points.iter().enumerate() {
            ensure((0.0..=1.0).contains(&pain.confidence), || {
                format!("pain_points[{i}].confidence {} is outside [0, 1]", pain.confidence)
            })?;
            ensure(pain.cost_per_incident.map_or(true, |c| c >= 0.0), || {
                format!("pain_points[{i}].cost_per_incident must not be negative")
            })?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pain(confidence: f64) -> PainPoint {
        PainPoint {
            description: "Manual invoice matching".to_string(),
            frequency: Frequency::Daily,
            cost_per_incident: Some(120.0),
            annual_cost: None,
            source_quote: "we spend hours matching invoices".to_string(),
            confidence,
        }
    }

    #[test]
    fn test_requires_pain_points() {
        let matrix = PainMonetizationMatrix {
            pain_points: vec![],
            stakeholder_needs: vec![],
            total_annual_cost_of_pain: None,
            key_constraints: vec![],
            recommended_next_steps: vec![],
        };
        assert!(matrix.validate().is_err());
    }

    #[test]
    fn test_confidence_range() {
        let mut matrix = PainMonetizationMatrix {
            pain_points: vec![pain(0.8)],
            stakeholder_needs: vec![],
            total_annual_cost_of_pain: None,
            key_constraints: vec![],
            recommended_next_steps: vec![],
        };
        assert!(matrix.validate().is_ok());

        matrix.pain_points.push(pain(1.4));
        let err = matrix.validate().unwrap_err();
        assert!(err.contains("pain_points[1].confidence"));
    }
}

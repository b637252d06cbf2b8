//! Estimation output: PERT three-point estimates and the cone of uncertainty.

use serde::{Deserialize, Serialize};

use crate::domain::models::artifact::{close_to, ensure, Artifact, FieldSpec};

/// Tolerance for per-task PERT arithmetic.
pub const PERT_TOLERANCE: f64 = 0.01;
/// Tolerance for totals, which accumulate rounding from every task.
pub const TOTAL_TOLERANCE: f64 = 0.1;
/// z-score of a two-sided 90% interval.
pub const Z_90: f64 = 1.645;

/// PERT expected value: `(O + 4M + P) / 6`.
pub fn pert_expected(optimistic: f64, likely: f64, pessimistic: f64) -> f64 {
    (optimistic + 4.0 * likely + pessimistic) / 6.0
}

/// PERT standard deviation: `(P - O) / 6`, never negative.
pub fn pert_std_dev(optimistic: f64, pessimistic: f64) -> f64 {
    ((pessimistic - optimistic) / 6.0).max(0.0)
}

/// Round to two decimals.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Three-point estimate for one task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PertEstimate {
    /// Task name
    pub task: String,
    /// Best case
    pub optimistic_hours: f64,
    /// Most likely case
    pub likely_hours: f64,
    /// Worst case
    pub pessimistic_hours: f64,
    /// `(O + 4M + P) / 6`
    pub expected_hours: f64,
    /// `(P - O) / 6`
    pub std_dev: f64,
    /// What the numbers rest on
    #[serde(default)]
    pub assumptions: Vec<String>,
}

impl PertEstimate {
    /// Build an estimate whose derived fields are consistent by construction.
    pub fn from_three_point(task: impl Into<String>, optimistic: f64, likely: f64, pessimistic: f64) -> Self {
        Self {
            task: task.into(),
            optimistic_hours: optimistic,
            likely_hours: likely,
            pessimistic_hours: pessimistic,
            expected_hours: pert_expected(optimistic, likely, pessimistic),
            std_dev: pert_std_dev(optimistic, pessimistic),
            assumptions: Vec::new(),
        }
    }

    /// Attach the assumptions behind the numbers.
    pub fn with_assumptions(mut self, assumptions: Vec<String>) -> Self {
        self.assumptions = assumptions;
        self
    }

    /// Ordering of the three points and the derived PERT fields.
    pub fn check(&self) -> Result<(), String> {
        ensure(
            self.optimistic_hours >= 0.0
                && self.optimistic_hours <= self.likely_hours
                && self.likely_hours <= self.pessimistic_hours,
            || {
                format!(
                    "task '{}' must satisfy 0 <= optimistic <= likely <= pessimistic",
                    self.task
                )
            },
        )?;
        let expected = pert_expected(self.optimistic_hours, self.likely_hours, self.pessimistic_hours);
        ensure(close_to(self.expected_hours, expected, PERT_TOLERANCE), || {
            format!(
                "task '{}': expected_hours should be {expected:.2}, got {:.2}",
                self.task, self.expected_hours
            )
        })?;
        let std_dev = pert_std_dev(self.optimistic_hours, self.pessimistic_hours);
        ensure(close_to(self.std_dev, std_dev, PERT_TOLERANCE), || {
            format!(
                "task '{}': std_dev should be {std_dev:.2}, got {:.2}",
                self.task, self.std_dev
            )
        })
    }
}

/// McConnell's cone of uncertainty applied to a base estimate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConeOfUncertainty {
    /// initial_concept, approved_product_definition, requirements_complete, ...
    pub phase: String,
    /// Lower bound factor for the phase
    pub low_multiplier: f64,
    /// Upper bound factor for the phase
    pub high_multiplier: f64,
    /// Hours the multipliers apply to
    pub base_estimate: f64,
    /// `base_estimate * low_multiplier`
    pub range_low: f64,
    /// `base_estimate * high_multiplier`
    pub range_high: f64,
}

impl ConeOfUncertainty {
    /// Positive multipliers and a range that matches them.
    pub fn check(&self) -> Result<(), String> {
        ensure(self.low_multiplier > 0.0 && self.high_multiplier > 0.0, || {
            "cone multipliers must be positive".to_string()
        })?;
        let low = self.base_estimate * self.low_multiplier;
        let high = self.base_estimate * self.high_multiplier;
        ensure(close_to(self.range_low, low, PERT_TOLERANCE), || {
            format!("cone range_low should be {low:.2}")
        })?;
        ensure(close_to(self.range_high, high, PERT_TOLERANCE), || {
            format!("cone range_high should be {high:.2}")
        })
    }
}

/// Historical projects the estimate is anchored to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferenceClass {
    /// Kind of project
    pub class_name: String,
    /// Projects in the class
    pub sample_size: u32,
    /// Median effort
    pub median_hours: f64,
    /// 10th percentile effort
    pub p10_hours: f64,
    /// 90th percentile effort
    pub p90_hours: f64,
    /// Named comparables
    #[serde(default)]
    pub similar_projects: Vec<String>,
}

/// Estimation stage artifact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EstimationResult {
    /// Per-task estimates
    pub pert_estimates: Vec<PertEstimate>,
    /// Range for the project phase
    pub cone_of_uncertainty: ConeOfUncertainty,
    /// Outside-view anchors
    #[serde(default)]
    pub reference_classes: Vec<ReferenceClass>,
    /// Sum of expected hours
    pub total_expected_hours: f64,
    /// Root-sum-square of task deviations
    pub total_std_dev: f64,
    /// 90% confidence interval `(low, high)`
    pub confidence_interval_90: (f64, f64),
    /// Risks that widen the range
    #[serde(default)]
    pub risk_factors: Vec<String>,
    /// Notes for the reader
    #[serde(default)]
    pub caveats: Vec<String>,
}

impl EstimationResult {
    /// Sum of expected hours and root-sum-square of standard deviations.
    pub fn combined_totals(estimates: &[PertEstimate]) -> (f64, f64) {
        let total: f64 = estimates.iter().map(|e| e.expected_hours).sum();
        let variance: f64 = estimates.iter().map(|e| e.std_dev.powi(2)).sum();
        (total, variance.sqrt())
    }

    /// `total ± 1.645·σ`, low end clamped at zero.
    pub fn confidence_interval(total: f64, std_dev: f64) -> (f64, f64) {
        ((total - Z_90 * std_dev).max(0.0), total + Z_90 * std_dev)
    }
}

impl Artifact for EstimationResult {
    const KIND: &'static str = "EstimationResult";

    fn schema() -> &'static [FieldSpec] {
        const FIELDS: &[FieldSpec] = &[
            FieldSpec::required("pert_estimates", "list", "At least one PERT estimate"),
            FieldSpec::required("pert_estimates[].task", "string", "Task being estimated"),
            FieldSpec::required("pert_estimates[].optimistic_hours", "number >= 0", "Best case (O)"),
            FieldSpec::required("pert_estimates[].likely_hours", "number >= 0", "Most likely (M)"),
            FieldSpec::required("pert_estimates[].pessimistic_hours", "number >= 0", "Worst case (P)"),
            FieldSpec::required("pert_estimates[].expected_hours", "number", "(O + 4M + P) / 6"),
            FieldSpec::required("pert_estimates[].std_dev", "number", "(P - O) / 6"),
            FieldSpec::optional("pert_estimates[].assumptions", "list<string>", "Key assumptions"),
            FieldSpec::required("cone_of_uncertainty.phase", "string", "Project phase"),
            FieldSpec::required("cone_of_uncertainty.low_multiplier", "number > 0", "Low multiplier"),
            FieldSpec::required("cone_of_uncertainty.high_multiplier", "number > 0", "High multiplier"),
            FieldSpec::required("cone_of_uncertainty.base_estimate", "number", "Base estimate in hours"),
            FieldSpec::required("cone_of_uncertainty.range_low", "number", "base * low_multiplier"),
            FieldSpec::required("cone_of_uncertainty.range_high", "number", "base * high_multiplier"),
            FieldSpec::optional(
                "reference_classes[]",
                "{class_name, sample_size, median_hours, p10_hours, p90_hours}",
                "Reference class forecasting data",
            ),
            FieldSpec::required("total_expected_hours", "number", "Sum of expected_hours"),
            FieldSpec::required("total_std_dev", "number", "sqrt(sum of std_dev^2)"),
            FieldSpec::required("confidence_interval_90", "[low, high]", "total +/- 1.645 * total_std_dev"),
            FieldSpec::optional("risk_factors", "list<string>", "Risks affecting the estimate"),
            FieldSpec::optional("caveats", "list<string>", "Caveats and assumptions"),
        ];
        FIELDS
    }

    fn validate(&self) -> Result<(), String> {
        ensure(!self.pert_estimates.is_empty(), || {
            "pert_estimates must contain at least one estimate".to_string()
        })?;
        for estimate in &self.pert_estimates {
            estimate.check()?;
        }
        self.cone_of_uncertainty.check()?;

        let (total, std_dev) = Self::combined_totals(&self.pert_estimates);
        ensure(close_to(self.total_expected_hours, total, TOTAL_TOLERANCE), || {
            format!("total_expected_hours should be {total:.2}")
        })?;
        ensure(close_to(self.total_std_dev, std_dev, TOTAL_TOLERANCE), || {
            format!("total_std_dev should be {std_dev:.2}")
        })?;
        let (low, high) = self.confidence_interval_90;
        ensure(low <= high, || "confidence_interval_90 low must not exceed high".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cone(base: f64) -> ConeOfUncertainty {
        ConeOfUncertainty {
            phase: "requirements_complete".to_string(),
            low_multiplier: 0.67,
            high_multiplier: 1.5,
            base_estimate: base,
            range_low: base * 0.67,
            range_high: base * 1.5,
        }
    }

    #[test]
    fn test_from_three_point_is_consistent() {
        let estimate = PertEstimate::from_three_point("API", 10.0, 15.0, 20.0);
        assert!((estimate.expected_hours - 15.0).abs() < f64::EPSILON);
        assert!((estimate.std_dev - 10.0 / 6.0).abs() < 1e-9);
        assert!(estimate.check().is_ok());
    }

    #[test]
    fn test_wrong_expected_rejected() {
        let mut estimate = PertEstimate::from_three_point("API", 10.0, 15.0, 20.0);
        estimate.expected_hours = 16.0;
        assert!(estimate.check().unwrap_err().contains("expected_hours should be 15.00"));
    }

    #[test]
    fn test_totals_checked() {
        let estimates = vec![
            PertEstimate::from_three_point("A", 2.0, 4.0, 8.0),
            PertEstimate::from_three_point("B", 1.0, 2.0, 3.0),
        ];
        let (total, std_dev) = EstimationResult::combined_totals(&estimates);
        let mut result = EstimationResult {
            pert_estimates: estimates,
            cone_of_uncertainty: cone(total),
            reference_classes: vec![],
            total_expected_hours: total,
            total_std_dev: std_dev,
            confidence_interval_90: EstimationResult::confidence_interval(total, std_dev),
            risk_factors: vec![],
            caveats: vec![],
        };
        assert!(result.validate().is_ok());

        result.total_expected_hours += 1.0;
        assert!(result.validate().unwrap_err().contains("total_expected_hours"));
    }

    #[test]
    fn test_confidence_interval_clamps_low() {
        let (low, high) = EstimationResult::confidence_interval(1.0, 2.0);
        assert!(low.abs() < f64::EPSILON);
        assert!((high - 4.29).abs() < 1e-9);
    }
}

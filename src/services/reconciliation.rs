//! Bridges between discovery and legacy analysis.
//!
//! Brownfield runs have no transcript, so the pain matrix the architect
//! expects is derived from the legacy findings. Greyfield runs have both and
//! need their constraints merged before architecture.

use std::collections::HashSet;

use crate::domain::models::contracts::{
    ConstraintList, Frequency, LegacyAnalysisResult, PainMonetizationMatrix, PainPoint,
    ReconciledConstraints,
};

/// Rough USD cost of one hour of remediation effort.
const COST_PER_EFFORT_HOUR: f64 = 100.0;
const NEED_KEYWORDS: [&str; 3] = ["real-time", "api", "integration"];
const BLOCKING_CONSTRAINTS: [&str; 2] = ["no api", "batch only"];

/// Translate legacy findings into business pain.
///
/// Every tech-debt item becomes a daily pain costed at its remediation
/// effort; known issues become weekly pains. A matrix with no pain at all
/// falls back to a single modernization item so downstream stages still get
/// a valid artifact.
pub fn pain_matrix_from_legacy(
    legacy: &LegacyAnalysisResult,
    known_issues: &[String],
) -> PainMonetizationMatrix {
    let mut pain_points: Vec<PainPoint> = legacy
        .tech_debt
        .iter()
        .map(|debt| {
            let per_incident = debt.estimated_effort_hours * COST_PER_EFFORT_HOUR;
            PainPoint {
                description: format!("Technical debt in {}: {}", debt.module, debt.debt_type),
                frequency: Frequency::Daily,
                cost_per_incident: Some(per_incident),
                annual_cost: Some(per_incident * 12.0),
                source_quote: debt.coupling_description.clone(),
                confidence: 0.7,
            }
        })
        .collect();

    pain_points.extend(known_issues.iter().map(|issue| PainPoint {
        description: issue.clone(),
        frequency: Frequency::Weekly,
        cost_per_incident: None,
        annual_cost: None,
        source_quote: issue.clone(),
        confidence: 0.8,
    }));

    if pain_points.is_empty() {
        pain_points.push(PainPoint {
            description: "Legacy system requires modernization".to_string(),
            frequency: Frequency::Daily,
            cost_per_incident: None,
            annual_cost: None,
            source_quote: legacy.summary.clone(),
            confidence: 0.6,
        });
    }

    let annual: Vec<f64> = pain_points.iter().filter_map(|p| p.annual_cost).collect();
    let total_annual_cost_of_pain = (!annual.is_empty()).then(|| annual.iter().sum());

    PainMonetizationMatrix {
        pain_points,
        stakeholder_needs: Vec::new(),
        total_annual_cost_of_pain,
        key_constraints: legacy.constraints.hard_constraints.clone(),
        recommended_next_steps: vec!["Begin phased modernization".to_string()],
    }
}

fn dedup_preserving_order(items: impl IntoIterator<Item = String>) -> Vec<String> {
    let mut seen = HashSet::new();
    items
        .into_iter()
        .filter(|item| seen.insert(item.clone()))
        .collect()
}

/// Merge discovery and legacy constraints, flagging needs the legacy system
/// cannot meet.
pub fn reconcile_constraints(
    discovery: &PainMonetizationMatrix,
    legacy: &LegacyAnalysisResult,
) -> ReconciledConstraints {
    let mut conflicts = Vec::new();
    for need in &discovery.stakeholder_needs {
        let need_lower = need.need.to_lowercase();
        if !NEED_KEYWORDS.iter().any(|word| need_lower.contains(word)) {
            continue;
        }
        for constraint in &legacy.constraints.hard_constraints {
            let constraint_lower = constraint.to_lowercase();
            if BLOCKING_CONSTRAINTS.iter().any(|c| constraint_lower.contains(c)) {
                conflicts.push(format!(
                    "Conflict: {} needs '{}' but legacy has constraint '{}'",
                    need.role, need.need, constraint
                ));
            }
        }
    }

    if !conflicts.is_empty() {
        tracing::warn!(count = conflicts.len(), "Constraint conflicts between discovery and legacy");
    }

    let hard_constraints = dedup_preserving_order(
        legacy
            .constraints
            .hard_constraints
            .iter()
            .chain(&discovery.key_constraints)
            .cloned(),
    );
    let soft_constraints = legacy
        .constraints
        .soft_constraints
        .iter()
        .chain(&conflicts)
        .cloned()
        .collect();

    ReconciledConstraints {
        constraints: ConstraintList {
            hard_constraints,
            soft_constraints,
            no_go_zones: legacy.constraints.no_go_zones.clone(),
        },
        conflicts,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::artifact::Artifact;
    use crate::domain::models::contracts::legacy::RemediationStrategy;
    use crate::domain::models::contracts::{Priority, StakeholderNeed, TechDebtItem};

    fn legacy(hard: &[&str]) -> LegacyAnalysisResult {
        LegacyAnalysisResult {
            seams: vec![],
            tech_debt: vec![],
            c4_diagrams: vec![],
            constraints: ConstraintList {
                hard_constraints: hard.iter().map(ToString::to_string).collect(),
                soft_constraints: vec!["Prefer Java 8".to_string()],
                no_go_zones: vec!["billing core".to_string()],
            },
            summary: "Twenty year old order system".to_string(),
        }
    }

    fn matrix(needs: &[(&str, &str)], constraints: &[&str]) -> PainMonetizationMatrix {
        PainMonetizationMatrix {
            pain_points: vec![],
            stakeholder_needs: needs
                .iter()
                .map(|(role, need)| StakeholderNeed {
                    role: (*role).to_string(),
                    need: (*need).to_string(),
                    priority: Priority::High,
                })
                .collect(),
            total_annual_cost_of_pain: None,
            key_constraints: constraints.iter().map(ToString::to_string).collect(),
            recommended_next_steps: vec![],
        }
    }

    #[test]
    fn test_tech_debt_becomes_daily_pain() {
        let mut analysis = legacy(&["Oracle 11g"]);
        analysis.tech_debt.push(TechDebtItem {
            module: "orders".to_string(),
            debt_type: "coupling".to_string(),
            cyclomatic_complexity: Some(42),
            coupling_description: "shares tables with billing".to_string(),
            remediation_strategy: RemediationStrategy::Wrap,
            estimated_effort_hours: 10.0,
        });

        let derived = pain_matrix_from_legacy(&analysis, &["Nightly job fails".to_string()]);
        assert_eq!(derived.pain_points.len(), 2);

        let debt = &derived.pain_points[0];
        assert_eq!(debt.description, "Technical debt in orders: coupling");
        assert_eq!(debt.frequency, Frequency::Daily);
        assert_eq!(debt.cost_per_incident, Some(1000.0));
        assert_eq!(debt.annual_cost, Some(12000.0));

        let issue = &derived.pain_points[1];
        assert_eq!(issue.frequency, Frequency::Weekly);
        assert!((issue.confidence - 0.8).abs() < f64::EPSILON);

        assert_eq!(derived.total_annual_cost_of_pain, Some(12000.0));
        assert_eq!(derived.key_constraints, vec!["Oracle 11g"]);
        assert_eq!(derived.recommended_next_steps, vec!["Begin phased modernization"]);
        assert!(derived.validate().is_ok());
    }

    #[test]
    fn test_empty_findings_fall_back_to_modernization() {
        let derived = pain_matrix_from_legacy(&legacy(&[]), &[]);
        assert_eq!(derived.pain_points.len(), 1);
        assert_eq!(derived.pain_points[0].description, "Legacy system requires modernization");
        assert_eq!(derived.pain_points[0].source_quote, "Twenty year old order system");
        assert_eq!(derived.total_annual_cost_of_pain, None);
        assert!(derived.validate().is_ok());
    }

    #[test]
    fn test_conflict_detected() {
        let discovery = matrix(&[("CTO", "Real-time order API")], &[]);
        let reconciled = reconcile_constraints(&discovery, &legacy(&["Batch only processing"]));

        assert_eq!(
            reconciled.conflicts,
            vec!["Conflict: CTO needs 'Real-time order API' but legacy has constraint 'Batch only processing'"]
        );
        assert_eq!(reconciled.constraints.soft_constraints.len(), 2);
        assert_eq!(reconciled.constraints.soft_constraints[1], reconciled.conflicts[0]);
    }

    #[test]
    fn test_unrelated_need_has_no_conflict() {
        let discovery = matrix(&[("CFO", "Lower hosting spend")], &[]);
        let reconciled = reconcile_constraints(&discovery, &legacy(&["No API access"]));
        assert!(reconciled.conflicts.is_empty());
    }

    #[test]
    fn test_hard_constraints_merged_without_duplicates() {
        let discovery = matrix(&[], &["GDPR", "Oracle 11g"]);
        let reconciled = reconcile_constraints(&discovery, &legacy(&["Oracle 11g"]));

        assert_eq!(reconciled.constraints.hard_constraints, vec!["Oracle 11g", "GDPR"]);
        assert_eq!(reconciled.constraints.no_go_zones, vec!["billing core"]);
    }
}

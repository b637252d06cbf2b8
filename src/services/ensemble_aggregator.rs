//! Ensemble estimation: combine optimist, pessimist and realist estimates.
//!
//! For a task all three estimators produced, the three expected values are
//! treated as a new three-point estimate:
//!
//! - `E  = (optimist + 4 * realist + pessimist) / 6`
//! - `SD = max(0, (pessimist - optimist) / 6)`
//!
//! and the merged record's bounds are re-derived from `(E, SD)` so the PERT
//! identities still hold: `O = max(0, E - 3SD)`, `M = E`, `P = E + 3SD`.

use std::collections::{HashMap, HashSet};

use crate::domain::models::artifact::close_to;
use crate::domain::models::contracts::estimation::{
    pert_expected, pert_std_dev, round2, EstimationResult, PertEstimate, PERT_TOLERANCE,
};

const MAX_ASSUMPTIONS: usize = 5;
const MAX_RISK_FACTORS: usize = 10;
/// Caveat appended to every merged estimate.
pub const ENSEMBLE_CAVEAT: &str = "Aggregated from Optimist, Realist, and Pessimist ensemble (PERT formula).";

/// Normalized task name used for matching across estimators.
fn task_key(task: &str) -> String {
    let key = task.trim().to_lowercase();
    if key.is_empty() {
        "_".to_string()
    } else {
        key
    }
}

fn index(estimates: &[PertEstimate]) -> HashMap<String, &PertEstimate> {
    estimates.iter().map(|e| (task_key(&e.task), e)).collect()
}

fn same_three_point(a: &PertEstimate, b: &PertEstimate) -> bool {
    close_to(a.optimistic_hours, b.optimistic_hours, PERT_TOLERANCE)
        && close_to(a.likely_hours, b.likely_hours, PERT_TOLERANCE)
        && close_to(a.pessimistic_hours, b.pessimistic_hours, PERT_TOLERANCE)
}

fn dedup_limited<'a>(items: impl Iterator<Item = &'a String>, limit: usize) -> Vec<String> {
    let mut seen = HashSet::new();
    items
        .filter(|item| seen.insert(item.as_str()))
        .take(limit)
        .cloned()
        .collect()
}

fn merge_task(optimist: &PertEstimate, realist: &PertEstimate, pessimist: &PertEstimate) -> PertEstimate {
    if same_three_point(optimist, realist) && same_three_point(realist, pessimist) {
        return realist.clone();
    }

    let expected = pert_expected(
        optimist.expected_hours,
        realist.expected_hours,
        pessimist.expected_hours,
    );
    let std_dev = pert_std_dev(optimist.expected_hours, pessimist.expected_hours);

    let task = [&realist.task, &optimist.task, &pessimist.task]
        .into_iter()
        .find(|name| !name.trim().is_empty())
        .cloned()
        .unwrap_or_default();

    PertEstimate {
        task,
        optimistic_hours: round2((expected - 3.0 * std_dev).max(0.0)),
        likely_hours: round2(expected),
        pessimistic_hours: round2(expected + 3.0 * std_dev),
        expected_hours: round2(expected),
        std_dev: round2(std_dev),
        assumptions: dedup_limited(
            optimist
                .assumptions
                .iter()
                .chain(&realist.assumptions)
                .chain(&pessimist.assumptions),
            MAX_ASSUMPTIONS,
        ),
    }
}

/// Merge three independent estimation results into one.
///
/// Tasks present in all three are aggregated; tasks seen by only one or two
/// estimators pass through unchanged with a partial-coverage caveat. The
/// result is not re-validated: clamping `O` at zero can move it off the PERT
/// identities for tasks whose spread exceeds their mean.
pub fn aggregate_ensemble(
    optimist: &EstimationResult,
    pessimist: &EstimationResult,
    realist: &EstimationResult,
) -> EstimationResult {
    let opt = index(&optimist.pert_estimates);
    let pess = index(&pessimist.pert_estimates);
    let real = index(&realist.pert_estimates);

    // Realist order first, then tasks only the optimist or pessimist saw.
    let mut order: Vec<String> = Vec::new();
    let mut seen: HashSet<String> = HashSet::new();
    for estimate in realist
        .pert_estimates
        .iter()
        .chain(&optimist.pert_estimates)
        .chain(&pessimist.pert_estimates)
    {
        let key = task_key(&estimate.task);
        if seen.insert(key.clone()) {
            order.push(key);
        }
    }

    let mut aggregated = Vec::with_capacity(order.len());
    let mut caveats = Vec::new();

    for key in &order {
        let (o, r, p) = (opt.get(key), real.get(key), pess.get(key));
        if let (Some(o), Some(r), Some(p)) = (o, r, p) {
            aggregated.push(merge_task(o, r, p));
            continue;
        }

        let Some(source) = o.or(r).or(p) else {
            continue;
        };
        let sources: Vec<&str> = [("optimist", o), ("realist", r), ("pessimist", p)]
            .into_iter()
            .filter_map(|(name, estimate)| estimate.map(|_| name))
            .collect();
        caveats.push(format!(
            "Task '{}' appeared in only {} estimate(s).",
            source.task,
            sources.join("/")
        ));
        aggregated.push((*source).clone());
    }

    if aggregated.is_empty() {
        return realist.clone();
    }

    let (total_expected, total_std_dev) = EstimationResult::combined_totals(&aggregated);
    let (low, high) = EstimationResult::confidence_interval(total_expected, total_std_dev);
    caveats.push(ENSEMBLE_CAVEAT.to_string());

    tracing::info!(
        tasks = aggregated.len(),
        total_expected_hours = round2(total_expected),
        total_std_dev = round2(total_std_dev),
        "Ensemble estimate aggregated"
    );

    EstimationResult {
        pert_estimates: aggregated,
        cone_of_uncertainty: realist.cone_of_uncertainty.clone(),
        reference_classes: realist.reference_classes.clone(),
        total_expected_hours: round2(total_expected),
        total_std_dev: round2(total_std_dev),
        confidence_interval_90: (round2(low), round2(high)),
        risk_factors: dedup_limited(
            optimist
                .risk_factors
                .iter()
                .chain(&realist.risk_factors)
                .chain(&pessimist.risk_factors),
            MAX_RISK_FACTORS,
        ),
        caveats,
    }
}

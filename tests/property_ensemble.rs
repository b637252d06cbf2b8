use meta_factory::domain::models::artifact::Artifact;
use meta_factory::domain::models::contracts::estimation::{
    pert_expected, ConeOfUncertainty, EstimationResult, PertEstimate,
};
use meta_factory::services::ensemble_aggregator::{aggregate_ensemble, ENSEMBLE_CAVEAT};
use proptest::prop_assert;
use test_strategy::proptest;

fn single_task(task: &str, expected: f64, spread: f64) -> EstimationResult {
    let estimate = PertEstimate::from_three_point(task, expected - spread, expected, expected + spread);
    let (total, std_dev) = EstimationResult::combined_totals(std::slice::from_ref(&estimate));
    EstimationResult {
        pert_estimates: vec![estimate],
        cone_of_uncertainty: ConeOfUncertainty {
            phase: "requirements_complete".to_string(),
            low_multiplier: 0.5,
            high_multiplier: 2.0,
            base_estimate: total,
            range_low: total * 0.5,
            range_high: total * 2.0,
        },
        reference_classes: Vec::new(),
        total_expected_hours: total,
        total_std_dev: std_dev,
        confidence_interval_90: EstimationResult::confidence_interval(total, std_dev),
        risk_factors: Vec::new(),
        caveats: Vec::new(),
    }
}

/// Means in [50, 100) keep `E - 3SD` non-negative, so no bound is clamped.
#[proptest]
fn prop_ensemble_mean_follows_pert(
    #[strategy(50.0f64..100.0)] optimist: f64,
    #[strategy(50.0f64..100.0)] realist: f64,
    #[strategy(50.0f64..100.0)] pessimist: f64,
    #[strategy(0.0f64..10.0)] spread: f64,
) {
    let merged = aggregate_ensemble(
        &single_task("Intake", optimist, spread),
        &single_task("Intake", pessimist, spread),
        &single_task("Intake", realist, spread),
    );

    let task = &merged.pert_estimates[0];
    prop_assert!((task.expected_hours - pert_expected(optimist, realist, pessimist)).abs() <= 0.02);
    prop_assert!(task.std_dev >= 0.0);
    prop_assert!(merged.validate().is_ok(), "{:?}", merged.validate());
}

#[proptest]
fn prop_ensemble_interval_is_ordered(
    #[strategy(1.0f64..400.0)] optimist: f64,
    #[strategy(1.0f64..400.0)] realist: f64,
    #[strategy(1.0f64..400.0)] pessimist: f64,
) {
    let merged = aggregate_ensemble(
        &single_task("Intake", optimist, 0.0),
        &single_task("Intake", pessimist, 0.0),
        &single_task("Intake", realist, 0.0),
    );

    let (low, high) = merged.confidence_interval_90;
    prop_assert!(low >= 0.0);
    prop_assert!(low <= merged.total_expected_hours + 0.01);
    prop_assert!(high >= merged.total_expected_hours - 0.01);
    prop_assert!(merged.caveats.iter().any(|c| c == ENSEMBLE_CAVEAT));
}

#[proptest]
fn prop_ensemble_keeps_every_task(#[strategy(1usize..6)] extra: usize) {
    let realist = single_task("Shared", 20.0, 2.0);
    let mut optimist = single_task("Shared", 15.0, 2.0);
    for i in 0..extra {
        optimist
            .pert_estimates
            .push(PertEstimate::from_three_point(format!("Optimist only {i}"), 1.0, 2.0, 3.0));
    }
    let pessimist = single_task("Shared", 30.0, 2.0);

    let merged = aggregate_ensemble(&optimist, &pessimist, &realist);

    prop_assert!(merged.pert_estimates.len() == extra + 1);
    prop_assert!(merged.pert_estimates[0].task == "Shared");
}

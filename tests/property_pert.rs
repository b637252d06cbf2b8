use meta_factory::domain::models::contracts::estimation::{
    pert_expected, pert_std_dev, EstimationResult, PertEstimate,
};
use proptest::prelude::*;

/// Ordered three-point estimate `0 <= O <= M <= P`.
fn ordered_three_point() -> impl Strategy<Value = (f64, f64, f64)> {
    (0.0f64..500.0, 0.0f64..200.0, 0.0f64..200.0).prop_map(|(o, a, b)| (o, o + a, o + a + b))
}

proptest! {
    /// Property: estimates built from an ordered three-point always validate
    #[test]
    fn prop_three_point_estimates_validate((o, m, p) in ordered_three_point()) {
        let estimate = PertEstimate::from_three_point("Task", o, m, p);
        prop_assert!(estimate.check().is_ok());
    }

    /// Property: the PERT mean lies between the optimistic and pessimistic bounds
    #[test]
    fn prop_expected_within_bounds((o, m, p) in ordered_three_point()) {
        let expected = pert_expected(o, m, p);
        prop_assert!(expected >= o - 1e-9);
        prop_assert!(expected <= p + 1e-9);
    }

    /// Property: standard deviation is never negative, even when bounds are inverted
    #[test]
    fn prop_std_dev_never_negative(o in 0.0f64..500.0, p in 0.0f64..500.0) {
        prop_assert!(pert_std_dev(o, p) >= 0.0);
    }

    /// Property: out-of-order bounds are rejected
    #[test]
    fn prop_inverted_bounds_rejected(o in 1.0f64..500.0, gap in 0.5f64..100.0) {
        let estimate = PertEstimate::from_three_point("Task", o + gap, o, o + 2.0 * gap);
        prop_assert!(estimate.check().is_err());
    }

    /// Property: the combined deviation never exceeds the sum of task deviations
    #[test]
    fn prop_combined_std_dev_is_subadditive(points in prop::collection::vec(ordered_three_point(), 1..8)) {
        let estimates: Vec<PertEstimate> = points
            .iter()
            .enumerate()
            .map(|(i, (o, m, p))| PertEstimate::from_three_point(format!("Task {i}"), *o, *m, *p))
            .collect();

        let (total, std_dev) = EstimationResult::combined_totals(&estimates);
        let expected_sum: f64 = estimates.iter().map(|e| e.expected_hours).sum();
        let std_dev_sum: f64 = estimates.iter().map(|e| e.std_dev).sum();

        prop_assert!((total - expected_sum).abs() < 1e-6);
        prop_assert!(std_dev <= std_dev_sum + 1e-9);
    }

    /// Property: the 90% interval brackets the total and never goes below zero
    #[test]
    fn prop_confidence_interval_brackets_total(total in 0.0f64..5000.0, std_dev in 0.0f64..500.0) {
        let (low, high) = EstimationResult::confidence_interval(total, std_dev);
        prop_assert!(low >= 0.0);
        prop_assert!(low <= total);
        prop_assert!(high >= total);
    }
}

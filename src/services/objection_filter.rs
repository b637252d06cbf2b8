//! Duplicate-objection detection.

use std::collections::HashSet;

use crate::domain::models::critique::Objection;
use crate::domain::ports::ObjectionSimilarity;

/// Token-set Jaccard overlap on descriptions, gated on an exact category match.
#[derive(Debug, Clone, Copy)]
pub struct JaccardSimilarity {
    threshold: f64,
}

impl JaccardSimilarity {
    /// Overlap at or above `threshold` counts as a repeat.
    pub const fn new(threshold: f64) -> Self {
        Self { threshold }
    }
}

impl Default for JaccardSimilarity {
    fn default() -> Self {
        Self::new(0.7)
    }
}

fn word_set(text: &str) -> HashSet<String> {
    text.split_whitespace().map(str::to_lowercase).collect()
}

/// |A ∩ B| / |A ∪ B| over lowercase whitespace-separated words.
pub fn jaccard(a: &str, b: &str) -> f64 {
    let a = word_set(a);
    let b = word_set(b);
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    let intersection = a.intersection(&b).count();
    let union = a.union(&b).count();
    intersection as f64 / union as f64
}

impl ObjectionSimilarity for JaccardSimilarity {
    fn similarity(&self, previous: &Objection, candidate: &Objection) -> f64 {
        if !previous.category.eq_ignore_ascii_case(&candidate.category) {
            return 0.0;
        }
        jaccard(&previous.description, &candidate.description)
    }

    fn threshold(&self) -> f64 {
        self.threshold
    }
}

/// Split `new` into objections to keep and repeats of `previous`.
pub fn filter_duplicates(
    new: Vec<Objection>,
    previous: &[Objection],
    similarity: &dyn ObjectionSimilarity,
) -> (Vec<Objection>, Vec<Objection>) {
    new.into_iter().partition(|candidate| {
        !previous
            .iter()
            .any(|prev| similarity.is_duplicate(prev, candidate))
    })
}

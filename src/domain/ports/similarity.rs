//! Objection similarity port.

use crate::domain::models::critique::Objection;

/// Decides whether a fresh objection repeats an earlier one.
///
/// The critic drops repeats before the verdict reaches the critique loop, so
/// swapping the heuristic for an embedding-based measure never touches the
/// loop's control flow.
pub trait ObjectionSimilarity: Send + Sync {
    /// Similarity of two objections in `[0, 1]`.
    fn similarity(&self, previous: &Objection, candidate: &Objection) -> f64;

    /// Threshold at or above which two objections count as duplicates.
    fn threshold(&self) -> f64;

    /// Whether `candidate` repeats `previous`.
    fn is_duplicate(&self, previous: &Objection, candidate: &Objection) -> bool {
        self.similarity(previous, candidate) >= self.threshold()
    }
}

//! Tier judging policy
//!
//! Council and Regional submissions are judged one-to-one (a single assigned
//! judge, that judge's average is canonical); National submissions are judged
//! one-to-many (no assignment, canonical score is the mean of all judge
//! averages). Selecting the policy once per submission replaces scattered
//! level comparisons in scoring and assignment code.

use crate::constants::SCORE_DECIMAL_PLACES;
use crate::models::{Evaluation, Level};

/// Behavior that differs between judging cardinalities
pub trait TierPolicy: Send + Sync {
    /// Whether submissions at this tier need a judge assignment
    fn requires_assignment(&self) -> bool;

    /// Derive the canonical score from the submission's evaluations.
    /// `None` when nothing has been evaluated yet.
    fn canonical_score(&self, evaluations: &[Evaluation]) -> Option<f64>;
}

/// Single-assignment, single-canonical-score policy (Council/Regional)
pub struct OneToOnePolicy;

impl TierPolicy for OneToOnePolicy {
    fn requires_assignment(&self) -> bool {
        true
    }

    fn canonical_score(&self, evaluations: &[Evaluation]) -> Option<f64> {
        // Duplicates only occur on data anomalies; the first write wins.
        evaluations.first().map(|e| e.average_score)
    }
}

/// No-assignment, averaged-canonical-score policy (National)
pub struct OneToManyPolicy;

impl TierPolicy for OneToManyPolicy {
    fn requires_assignment(&self) -> bool {
        false
    }

    fn canonical_score(&self, evaluations: &[Evaluation]) -> Option<f64> {
        if evaluations.is_empty() {
            return None;
        }
        let sum: f64 = evaluations.iter().map(|e| e.average_score).sum();
        Some(round_to_places(
            sum / evaluations.len() as f64,
            SCORE_DECIMAL_PLACES,
        ))
    }
}

/// Select the policy governing a submission's level
pub fn policy_for(level: Level) -> &'static dyn TierPolicy {
    match level {
        Level::Council | Level::Regional => &OneToOnePolicy,
        Level::National => &OneToManyPolicy,
    }
}

fn round_to_places(value: f64, places: u32) -> f64 {
    let factor = 10f64.powi(places as i32);
    (value * factor).round() / factor
}

//! Deterministic statistical metrics.
//!
//! These metrics compare a candidate text against reference texts without a
//! judge. Identical inputs always produce identical results.

mod meteor;
mod rouge;

pub use meteor::{Meteor, MeteorScore};
pub use rouge::TextOverlapScorer;

use serde::{Deserialize, Serialize};

use crate::scoring::MetricConfig;
use crate::types::{MetricKey, MetricResult};

/// Precision, recall and F1 of one comparison.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct OverlapScore {
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
}

impl OverlapScore {
    /// Build from precision and recall. F1 is 0 when both are 0.
    pub fn from_precision_recall(precision: f64, recall: f64) -> Self {
        let f1 = if precision + recall > 0.0 {
            2.0 * precision * recall / (precision + recall)
        } else {
            0.0
        };
        Self {
            precision,
            recall,
            f1,
        }
    }

    /// Arithmetic mean of each component. Empty input → all zeros.
    pub fn mean(scores: &[OverlapScore]) -> Self {
        if scores.is_empty() {
            return Self::default();
        }
        let n = scores.len() as f64;
        Self {
            precision: scores.iter().map(|s| s.precision).sum::<f64>() / n,
            recall: scores.iter().map(|s| s.recall).sum::<f64>() / n,
            f1: scores.iter().map(|s| s.f1).sum::<f64>() / n,
        }
    }
}

/// A judge-free metric comparing a candidate to references.
pub trait StatisticalMetric: Send + Sync {
    fn key(&self) -> MetricKey;

    /// Score the candidate and wrap the outcome as a metric result.
    fn evaluate(&self, candidate: &str, references: &[String], config: &MetricConfig) -> MetricResult;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_f1_harmonic_mean() {
        let s = OverlapScore::from_precision_recall(0.5, 1.0);
        assert!((s.f1 - 2.0 / 3.0).abs() < 1e-12);
        assert_eq!(OverlapScore::from_precision_recall(0.0, 0.0).f1, 0.0);
    }

    #[test]
    fn test_mean_of_scores() {
        let mean = OverlapScore::mean(&[
            OverlapScore::from_precision_recall(1.0, 1.0),
            OverlapScore::from_precision_recall(0.0, 0.0),
        ]);
        assert_eq!(mean.precision, 0.5);
        assert_eq!(mean.recall, 0.5);
        assert_eq!(mean.f1, 0.5);
        assert_eq!(OverlapScore::mean(&[]), OverlapScore::default());
    }
}

//! METEOR with exact unigram matching.

use serde::{Deserialize, Serialize};

use super::{OverlapScore, StatisticalMetric};
use crate::evidence::Evidence;
use crate::normalize::{BasicNormalizer, NormalizeOptions, TextNormalizer};
use crate::scoring::MetricConfig;
use crate::types::{MetricKey, MetricResult};

/// Recall-weighted harmonic mean: Fmean = 10PR / (R + 9P).
const RECALL_WEIGHT: f64 = 9.0;
const PENALTY_GAMMA: f64 = 0.5;
const PENALTY_BETA: f64 = 3.0;

/// Components of one METEOR comparison.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct MeteorScore {
    pub precision: f64,
    pub recall: f64,
    pub fmean: f64,
    pub penalty: f64,
    pub score: f64,
}

/// METEOR scorer. The best score across references is reported.
#[derive(Debug, Clone)]
pub struct Meteor<N: TextNormalizer = BasicNormalizer> {
    normalizer: N,
    options: NormalizeOptions,
}

impl Meteor<BasicNormalizer> {
    pub fn new() -> Self {
        Self::with_normalizer(BasicNormalizer::new(), NormalizeOptions::default())
    }
}

impl Default for Meteor<BasicNormalizer> {
    fn default() -> Self {
        Self::new()
    }
}

impl<N: TextNormalizer> Meteor<N> {
    pub fn with_normalizer(normalizer: N, options: NormalizeOptions) -> Self {
        Self { normalizer, options }
    }

    pub fn measure<S: AsRef<str>>(&self, candidate: &str, references: &[S]) -> MeteorScore {
        let candidate_tokens = self.normalizer.tokens(candidate, &self.options);
        references
            .iter()
            .map(|r| {
                let reference_tokens = self.normalizer.tokens(r.as_ref(), &self.options);
                score_pair(&candidate_tokens, &reference_tokens)
            })
            .fold(MeteorScore::default(), |best, s| if s.score > best.score { s } else { best })
    }
}

impl<N: TextNormalizer> StatisticalMetric for Meteor<N> {
    fn key(&self) -> MetricKey {
        MetricKey::Meteor
    }

    fn evaluate(&self, candidate: &str, references: &[String], config: &MetricConfig) -> MetricResult {
        let meteor = self.measure(candidate, references);
        let reason = config.include_reason.then(|| {
            format!(
                "METEOR {:.2} (precision {:.2}, recall {:.2}, fragmentation penalty {:.2}).",
                meteor.score, meteor.precision, meteor.recall, meteor.penalty
            )
        });

        let evidence = Evidence::builder()
            .overlap(OverlapScore {
                precision: meteor.precision,
                recall: meteor.recall,
                f1: meteor.fmean,
            })
            .build();

        MetricResult::scored(MetricKey::Meteor, meteor.score, config, reason, evidence)
    }
}

fn score_pair(candidate: &[String], reference: &[String]) -> MeteorScore {
    let alignment = align(candidate, reference);
    let matches = alignment.len();
    if matches == 0 {
        return MeteorScore::default();
    }

    let precision = matches as f64 / candidate.len() as f64;
    let recall = matches as f64 / reference.len() as f64;
    let fmean = 10.0 * precision * recall / (recall + RECALL_WEIGHT * precision);

    let chunks = count_chunks(&alignment);
    let penalty = PENALTY_GAMMA * (chunks as f64 / matches as f64).powf(PENALTY_BETA);

    MeteorScore {
        precision,
        recall,
        fmean,
        penalty,
        score: fmean * (1.0 - penalty),
    }
}

/// Align candidate tokens to reference positions, one-to-one.
///
/// Each candidate token prefers the reference position right after the
/// previous match so contiguous runs stay in one chunk.
fn align(candidate: &[String], reference: &[String]) -> Vec<(usize, usize)> {
    let mut used = vec![false; reference.len()];
    let mut alignment = Vec::new();
    let mut last: Option<usize> = None;

    for (i, token) in candidate.iter().enumerate() {
        let next = last.map(|j| j + 1).filter(|&j| {
            j < reference.len() && !used[j] && reference[j] == *token
        });
        let chosen = next.or_else(|| {
            reference
                .iter()
                .enumerate()
                .position(|(j, r)| !used[j] && r == token)
        });
        if let Some(j) = chosen {
            used[j] = true;
            alignment.push((i, j));
            last = Some(j);
        }
    }

    alignment
}

/// Number of runs that are adjacent in both candidate and reference.
fn count_chunks(alignment: &[(usize, usize)]) -> usize {
    if alignment.is_empty() {
        return 0;
    }
    1 + alignment
        .windows(2)
        .filter(|w| !(w[1].0 == w[0].0 + 1 && w[1].1 == w[0].1 + 1))
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plain() -> Meteor {
        Meteor::with_normalizer(BasicNormalizer::new(), NormalizeOptions::none())
    }

    #[test]
    fn test_identical_single_chunk() {
        let s = plain().measure("the cat sat on the mat", &["the cat sat on the mat"]);
        assert_eq!(s.precision, 1.0);
        assert_eq!(s.recall, 1.0);
        // one chunk over six matches
        let expected_penalty = 0.5 * (1.0f64 / 6.0).powi(3);
        assert!((s.penalty - expected_penalty).abs() < 1e-12);
        assert!((s.score - (1.0 - expected_penalty)).abs() < 1e-12);
    }

    #[test]
    fn test_word_order_is_penalized() {
        let ordered = plain().measure("a b c d", &["a b c d"]);
        let shuffled = plain().measure("d c b a", &["a b c d"]);
        assert_eq!(ordered.fmean, shuffled.fmean);
        assert!(shuffled.score < ordered.score);
    }

    #[test]
    fn test_no_match_is_zero() {
        let s = plain().measure("x y", &["a b"]);
        assert_eq!(s, MeteorScore::default());
        assert_eq!(plain().measure("", &["a b"]).score, 0.0);
    }

    #[test]
    fn test_best_reference_wins() {
        let s = plain().measure("a b c", &["x y z", "a b c"]);
        assert!(s.score > 0.9);
    }

    #[test]
    fn test_alignment_prefers_contiguous_positions() {
        let candidate: Vec<String> = ["a", "b"].iter().map(|s| s.to_string()).collect();
        let reference: Vec<String> = ["b", "a", "b"].iter().map(|s| s.to_string()).collect();
        let alignment = align(&candidate, &reference);
        assert_eq!(alignment, vec![(0, 1), (1, 2)]);
        assert_eq!(count_chunks(&alignment), 1);
    }

    #[test]
    fn test_evaluate_reports_meteor_key() {
        let result = plain().evaluate("a b", &["a b".to_string()], &MetricConfig::default());
        assert_eq!(result.key, MetricKey::Meteor);
        assert!(result.score > 0.9);
        assert!(result.success);
    }
}

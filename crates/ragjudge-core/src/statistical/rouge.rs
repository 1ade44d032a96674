//! ROUGE-N text overlap.

use std::collections::HashMap;

use super::{OverlapScore, StatisticalMetric};
use crate::evidence::Evidence;
use crate::normalize::{BasicNormalizer, NormalizeOptions, TextNormalizer};
use crate::scoring::MetricConfig;
use crate::types::{MetricKey, MetricResult};

/// N-gram precision, recall and F1 between a candidate and references.
#[derive(Debug, Clone)]
pub struct TextOverlapScorer<N: TextNormalizer = BasicNormalizer> {
    n: usize,
    normalizer: N,
    options: NormalizeOptions,
}

impl TextOverlapScorer<BasicNormalizer> {
    /// Scorer over n-grams of size `n` with the default normalization chain.
    ///
    /// An `n` of 0 is treated as 1.
    pub fn new(n: usize) -> Self {
        Self::with_normalizer(n, BasicNormalizer::new(), NormalizeOptions::default())
    }
}

impl<N: TextNormalizer> TextOverlapScorer<N> {
    pub fn with_normalizer(n: usize, normalizer: N, options: NormalizeOptions) -> Self {
        Self {
            n: n.max(1),
            normalizer,
            options,
        }
    }

    pub fn n(&self) -> usize {
        self.n
    }

    /// Mean precision/recall/F1 of the candidate against each reference.
    pub fn measure<S: AsRef<str>>(&self, candidate: &str, references: &[S]) -> OverlapScore {
        let candidate_tokens = self.normalizer.tokens(candidate, &self.options);
        let candidate_ngrams = count_ngrams(&candidate_tokens, self.n);
        let candidate_total: usize = candidate_ngrams.values().sum();

        let per_reference: Vec<OverlapScore> = references
            .iter()
            .map(|reference| {
                let reference_tokens = self.normalizer.tokens(reference.as_ref(), &self.options);
                let reference_ngrams = count_ngrams(&reference_tokens, self.n);
                let reference_total: usize = reference_ngrams.values().sum();

                let matches: usize = reference_ngrams
                    .iter()
                    .map(|(gram, count)| (*count).min(candidate_ngrams.get(gram).copied().unwrap_or(0)))
                    .sum();

                let precision = ratio(matches, candidate_total);
                let recall = ratio(matches, reference_total);
                OverlapScore::from_precision_recall(precision, recall)
            })
            .collect();

        OverlapScore::mean(&per_reference)
    }

    /// Score a candidate given as several segments joined by single spaces.
    pub fn measure_segments<S: AsRef<str>>(&self, segments: &[S], references: &[S]) -> OverlapScore {
        let candidate = segments
            .iter()
            .map(|s| s.as_ref())
            .collect::<Vec<_>>()
            .join(" ");
        self.measure(&candidate, references)
    }
}

impl<N: TextNormalizer> StatisticalMetric for TextOverlapScorer<N> {
    fn key(&self) -> MetricKey {
        MetricKey::Rouge
    }

    fn evaluate(&self, candidate: &str, references: &[String], config: &MetricConfig) -> MetricResult {
        let overlap = self.measure(candidate, references);
        let reason = config.include_reason.then(|| {
            format!(
                "ROUGE-{} precision {:.2}, recall {:.2}, F1 {:.2} over {} reference(s).",
                self.n,
                overlap.precision,
                overlap.recall,
                overlap.f1,
                references.len()
            )
        });

        MetricResult::scored(
            MetricKey::Rouge,
            overlap.f1,
            config,
            reason,
            Evidence::builder().overlap(overlap).build(),
        )
    }
}

fn count_ngrams(tokens: &[String], n: usize) -> HashMap<&[String], usize> {
    let mut counts = HashMap::new();
    for gram in tokens.windows(n) {
        *counts.entry(gram).or_insert(0) += 1;
    }
    counts
}

fn ratio(matches: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        matches as f64 / total as f64
    }
}

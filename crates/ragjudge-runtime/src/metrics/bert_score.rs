//! BERTScore: greedy token matching in embedding space.

use std::sync::Arc;

use ragjudge_core::normalize::{BasicNormalizer, NormalizeOptions, TextNormalizer};
use ragjudge_core::{Evidence, MetricConfig, MetricKey, MetricResult, OverlapScore};

use super::{MetricError, MetricRun};
use crate::embed::{cosine_similarity, EmbedError, Embedder};

/// Compares a candidate to each reference by matching every token to its most
/// similar counterpart. Precision averages the best match of each candidate
/// token, recall that of each reference token. Results are averaged over
/// references.
pub struct BertScore {
    embedder: Arc<dyn Embedder>,
    candidate: String,
    references: Vec<String>,
    config: MetricConfig,
    normalizer: BasicNormalizer,
    options: NormalizeOptions,
}

impl std::fmt::Debug for BertScore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BertScore")
            .field("embedder", &self.embedder.name())
            .field("references", &self.references.len())
            .finish_non_exhaustive()
    }
}

impl BertScore {
    pub fn new(
        embedder: Arc<dyn Embedder>,
        candidate: impl Into<String>,
        references: Vec<String>,
        config: MetricConfig,
    ) -> Self {
        Self {
            embedder,
            candidate: candidate.into(),
            references,
            config,
            normalizer: BasicNormalizer::new(),
            options: NormalizeOptions {
                lowercase: true,
                ..NormalizeOptions::none()
            },
        }
    }

    pub async fn run(&self) -> MetricRun {
        let outcome = self.execute().await;
        if let Err(e) = &outcome {
            tracing::debug!(embedder = self.embedder.name(), error = %e, "BERTScore failed");
        }
        MetricRun::without_judge(MetricKey::BertScore, outcome)
    }

    async fn execute(&self) -> Result<MetricResult, MetricError> {
        let score = self.measure().await?;
        let reason = self.config.include_reason.then(|| {
            format!(
                "BERTScore precision {:.2}, recall {:.2}, F1 {:.2} over {} reference(s).",
                score.precision,
                score.recall,
                score.f1,
                self.references.len()
            )
        });
        let evidence = Evidence::builder().overlap(score).build();
        Ok(MetricResult::scored(MetricKey::BertScore, score.f1, &self.config, reason, evidence))
    }

    /// Precision, recall and F1 averaged over references. Empty input gives zeros.
    pub async fn measure(&self) -> Result<OverlapScore, EmbedError> {
        let candidate_tokens = self.normalizer.tokens(&self.candidate, &self.options);
        if candidate_tokens.is_empty() || self.references.is_empty() {
            return Ok(OverlapScore::default());
        }
        let candidate = self.embed(&candidate_tokens).await?;

        let mut scores = Vec::with_capacity(self.references.len());
        for reference in &self.references {
            let reference_tokens = self.normalizer.tokens(reference, &self.options);
            if reference_tokens.is_empty() {
                scores.push(OverlapScore::default());
                continue;
            }
            let reference = self.embed(&reference_tokens).await?;
            scores.push(greedy_match(&candidate, &reference));
        }

        Ok(OverlapScore::mean(&scores))
    }

    async fn embed(&self, tokens: &[String]) -> Result<Vec<Vec<f64>>, EmbedError> {
        let vectors = self.embedder.embed_batch(tokens).await?;
        if vectors.len() != tokens.len() {
            return Err(EmbedError::CountMismatch {
                expected: tokens.len(),
                got: vectors.len(),
            });
        }
        Ok(vectors)
    }
}

fn greedy_match(candidate: &[Vec<f64>], reference: &[Vec<f64>]) -> OverlapScore {
    let best_mean = |from: &[Vec<f64>], to: &[Vec<f64>]| {
        from.iter()
            .map(|a| {
                to.iter()
                    .map(|b| cosine_similarity(a, b))
                    .fold(f64::NEG_INFINITY, f64::max)
            })
            .sum::<f64>()
            / from.len() as f64
    };
    OverlapScore::from_precision_recall(best_mean(candidate, reference), best_mean(reference, candidate))
}

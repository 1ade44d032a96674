//! Statistical text metrics in the evaluator.

use ragjudge_core::{MetricConfig, MetricKey, StatisticalMetric};

use super::MetricRun;

/// A judge-free overlap metric bound to its inputs.
pub struct TextMetric {
    scorer: Box<dyn StatisticalMetric>,
    candidate: String,
    references: Vec<String>,
    config: MetricConfig,
}

impl std::fmt::Debug for TextMetric {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TextMetric")
            .field("key", &self.scorer.key())
            .field("references", &self.references.len())
            .finish_non_exhaustive()
    }
}

impl TextMetric {
    pub fn new(
        scorer: impl StatisticalMetric + 'static,
        candidate: impl Into<String>,
        references: Vec<String>,
        config: MetricConfig,
    ) -> Self {
        Self {
            scorer: Box::new(scorer),
            candidate: candidate.into(),
            references,
            config,
        }
    }

    pub fn key(&self) -> MetricKey {
        self.scorer.key()
    }

    pub fn run(&self) -> MetricRun {
        let result = self
            .scorer
            .evaluate(&self.candidate, &self.references, &self.config);
        MetricRun::without_judge(self.key(), Ok(result))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::ProtocolState;
    use ragjudge_core::{Meteor, TextOverlapScorer};

    #[test]
    fn test_rouge_run() {
        let metric = TextMetric::new(
            TextOverlapScorer::new(1),
            "The cat sat on the mat.",
            vec!["The cat sat on the mat.".to_string()],
            MetricConfig::default(),
        );
        assert_eq!(metric.key(), MetricKey::Rouge);

        let run = metric.run();
        assert_eq!(run.final_state, ProtocolState::Done);
        assert_eq!(run.usage.total(), 0);
        assert!((run.outcome.unwrap().score - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_meteor_run() {
        let metric = TextMetric::new(
            Meteor::new(),
            "completely different words",
            vec!["nothing shared here".to_string()],
            MetricConfig::default(),
        );
        let result = metric.run().outcome.unwrap();
        assert_eq!(result.key, MetricKey::Meteor);
        assert_eq!(result.score, 0.0);
        assert!(!result.success);
    }
}

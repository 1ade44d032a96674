//! # ragjudge-core
//!
//! Deterministic building blocks for scoring language-model responses.
//!
//! This crate never calls a judge. It provides:
//! - the data model shared by every metric (verdicts, results, reports)
//! - parsing of structured judge replies, including code-fence sanitation
//! - the scoring rules that turn verdicts into scores
//! - text normalization plus the ROUGE-N and METEOR statistical metrics
//! - suite configuration loaded from YAML or JSON
//!
//! ## Key Guarantees
//!
//! 1. **Deterministic**: Same input always produces same output
//! 2. **No judge calls**: Scores are computed from verdicts, never asked for
//! 3. **Conservative**: A verdict label outside `{yes, no, idk}` scores as `no`
//! 4. **Partial failure**: A failed metric is absent from the report, not zero
//!
//! ## Example
//!
//! ```rust,ignore
//! use ragjudge_core::{evaluate_statistical, SuiteConfig};
//!
//! let suite = SuiteConfig::default();
//! let report = evaluate_statistical(
//!     "Paris is the capital of France.",
//!     &["France's capital city is Paris.".to_string()],
//!     &suite,
//! );
//! println!("aggregate: {:?}", report.aggregate_score);
//! ```

pub mod evidence;
pub mod normalize;
pub mod reply;
pub mod scoring;
pub mod statistical;
pub mod suite;
pub mod synthesizer;
pub mod types;

// Re-export main types at crate root
pub use evidence::{Evidence, EvidenceBuilder, Knowledge};
pub use normalize::{BasicNormalizer, NormalizeOptions, TextNormalizer};
pub use reply::{parse_reply, strip_code_fence, ReplyError};
pub use scoring::{quality_score, MetricConfig, GEVAL_SCALE_CEILING};
pub use statistical::{Meteor, MeteorScore, OverlapScore, StatisticalMetric, TextOverlapScorer};
pub use suite::{MetricSpec, SuiteConfig, SuiteError};
pub use synthesizer::Synthesizer;
pub use types::{
    EvaluationReport, MetricKey, MetricResult, ReportEntry, Turn, Verdict, VerdictLabel,
};

/// Run the suite's statistical metrics against a candidate.
///
/// Judge-protocol metrics in the suite are skipped; use the runtime crate's
/// evaluator for those.
pub fn evaluate_statistical(
    candidate: &str,
    references: &[String],
    suite: &SuiteConfig,
) -> EvaluationReport {
    let mut results = Vec::new();

    for spec in suite.ordered_metrics() {
        let config = spec.config(&suite.defaults);
        let result = match spec.key {
            MetricKey::Rouge => TextOverlapScorer::with_normalizer(
                spec.ngram_size(),
                BasicNormalizer::new(),
                suite.normalization.clone(),
            )
            .evaluate(candidate, references, &config),
            MetricKey::Meteor => {
                Meteor::with_normalizer(BasicNormalizer::new(), suite.normalization.clone())
                    .evaluate(candidate, references, &config)
            }
            _ => continue,
        };
        results.push(result);
    }

    Synthesizer::new().synthesize(results, Vec::new())
}

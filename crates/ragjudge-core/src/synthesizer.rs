//! Synthesizer: Aggregates metric results into an evaluation report.
//!
//! The aggregation rules are fixed:
//! 1. Failed metrics are absent from the entries, never scored as zero
//! 2. Every successful score is converted to a unit-interval quality score
//!    (hallucination inverted, G-Eval rescaled by its ceiling)
//! 3. The aggregate is the mean quality over successful metrics only

use chrono::Utc;
use std::collections::BTreeMap;

use crate::scoring::quality_score;
use crate::types::{EvaluationReport, MetricKey, MetricResult, ReportEntry};

/// The Synthesizer aggregates metric results into a final report.
#[derive(Debug, Default)]
pub struct Synthesizer;

impl Synthesizer {
    pub fn new() -> Self {
        Self
    }

    /// Synthesize results and failures into a report.
    ///
    /// If the same key appears more than once, the last result wins.
    pub fn synthesize(
        &self,
        results: Vec<MetricResult>,
        failures: Vec<(MetricKey, String)>,
    ) -> EvaluationReport {
        let entries: BTreeMap<MetricKey, ReportEntry> = results
            .into_iter()
            .map(|result| {
                let quality = quality_score(result.key, result.score);
                (result.key, ReportEntry { result, quality })
            })
            .collect();

        let failures: BTreeMap<MetricKey, String> = failures
            .into_iter()
            .filter(|(key, _)| !entries.contains_key(key))
            .collect();

        let aggregate_score = self.aggregate(&entries);

        EvaluationReport {
            entries,
            failures,
            aggregate_score,
            evaluated_at: Utc::now(),
        }
    }

    fn aggregate(&self, entries: &BTreeMap<MetricKey, ReportEntry>) -> Option<f64> {
        if entries.is_empty() {
            return None;
        }
        let total: f64 = entries.values().map(|e| e.quality).sum();
        Some(total / entries.len() as f64)
    }

    /// One-line summary of a report for logs.
    pub fn summarize(&self, report: &EvaluationReport) -> String {
        let mut summary = format!("{} metric(s) scored", report.entries.len());
        if !report.failures.is_empty() {
            let failed: Vec<&str> = report.failures.keys().map(|k| k.as_str()).collect();
            summary.push_str(&format!(", failed: {}", failed.join(", ")));
        }
        if let Some(score) = report.aggregate_score {
            summary.push_str(&format!(", aggregate {:.3}", score));
        }
        summary
    }
}

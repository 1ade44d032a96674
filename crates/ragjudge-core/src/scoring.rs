//! Deterministic scoring rules.
//!
//! Judges produce verdicts; scores are always computed here from the verdict
//! labels. Nothing in this module calls a judge.
//!
//! Defaults for degenerate input:
//! - empty verdict list for a relevancy-style metric → 1.0 (no evidence of irrelevance)
//! - empty verdict list for the hallucination rate → 0.0 (no contradiction found)
//! - empty n-gram sets → 0.0 (no overlap)
//!
//! Per-item protocols expect one verdict per claim or context. A missing or
//! surplus verdict is a violation and scores as "no".

use serde::{Deserialize, Serialize};

use crate::types::{MetricKey, Verdict, VerdictLabel};

/// Rubric scores are given on a 0..=8 scale, one point per criterion.
pub const GEVAL_SCALE_CEILING: f64 = 8.0;

/// Violation recorded for an item the judge returned no verdict for.
pub const MISSING_VERDICT: &str = "missing";

/// Violation recorded for a verdict beyond the number of items judged.
pub const SURPLUS_VERDICT: &str = "surplus";

/// Pass threshold used when none is configured.
pub const DEFAULT_THRESHOLD: f64 = 0.5;

/// Pass/fail and reason settings shared by every metric.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricConfig {
    /// Minimum quality score that counts as passing
    pub threshold: f64,

    /// Whether to ask the judge for a justification
    pub include_reason: bool,

    /// Only a perfect score passes
    pub strict_mode: bool,
}

impl Default for MetricConfig {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
            include_reason: true,
            strict_mode: false,
        }
    }
}

impl MetricConfig {
    pub fn strict() -> Self {
        Self {
            strict_mode: true,
            ..Default::default()
        }
    }

    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn with_reason(mut self, include_reason: bool) -> Self {
        self.include_reason = include_reason;
        self
    }

    /// The threshold actually applied. Strict mode forces 1.0.
    pub fn effective_threshold(&self) -> f64 {
        if self.strict_mode {
            1.0
        } else {
            self.threshold
        }
    }

    /// Whether a unit-interval quality score passes.
    pub fn passes(&self, quality: f64) -> bool {
        quality >= self.effective_threshold()
    }
}

/// Score a single-verdict protocol from its first verdict.
///
/// yes → 1.0, idk → 0.5, no (or a label violation) → 0.0, no verdicts → 1.0.
pub fn single_verdict_score(verdicts: &[Verdict]) -> f64 {
    match verdicts.first() {
        None => 1.0,
        Some(v) => match v.label {
            VerdictLabel::Yes => 1.0,
            VerdictLabel::Idk => 0.5,
            VerdictLabel::No => 0.0,
        },
    }
}

/// Fit a per-item verdict list to the number of items judged.
///
/// Each item without a verdict gets a `no` violation. Verdicts past `expected`
/// are kept for audit but downgraded to `no` violations.
pub fn align_verdicts(mut verdicts: Vec<Verdict>, expected: usize) -> Vec<Verdict> {
    let got = verdicts.len();
    if got == expected {
        return verdicts;
    }
    tracing::warn!(expected, got, "Verdict count differs from item count");

    if got < expected {
        verdicts.extend((got..expected).map(|_| Verdict {
            label: VerdictLabel::No,
            reason: None,
            violation: Some(MISSING_VERDICT.to_string()),
        }));
    } else {
        for surplus in &mut verdicts[expected..] {
            surplus.label = VerdictLabel::No;
            surplus.violation = Some(SURPLUS_VERDICT.to_string());
        }
    }
    verdicts
}

/// Fraction of verdicts that are not "no". Empty → 1.0.
pub fn non_negative_fraction(verdicts: &[Verdict]) -> f64 {
    if verdicts.is_empty() {
        return 1.0;
    }
    let kept = verdicts.iter().filter(|v| !v.is_no()).count();
    kept as f64 / verdicts.len() as f64
}

/// Fraction of verdicts labelled "yes". Empty → 1.0.
pub fn supported_fraction(verdicts: &[Verdict]) -> f64 {
    if verdicts.is_empty() {
        return 1.0;
    }
    let supported = verdicts
        .iter()
        .filter(|v| v.label == VerdictLabel::Yes)
        .count();
    supported as f64 / verdicts.len() as f64
}

/// Fraction of verdicts labelled "no". Empty → 0.0.
pub fn contradiction_fraction(verdicts: &[Verdict]) -> f64 {
    if verdicts.is_empty() {
        return 0.0;
    }
    let contradicted = verdicts.iter().filter(|v| v.is_no()).count();
    contradicted as f64 / verdicts.len() as f64
}

/// Relevancy of a retrieval set given the number of irrelevant contexts.
pub fn contextual_relevancy_score(irrelevancies: usize, contexts: usize) -> f64 {
    if irrelevancies == 0 {
        return 1.0;
    }
    if contexts == 0 {
        return 0.0;
    }
    (1.0 - irrelevancies as f64 / contexts as f64).max(0.0)
}

/// Truncate a judge's rubric score to an integer on the rubric scale.
pub fn rubric_points(raw: f64) -> f64 {
    raw.trunc().clamp(0.0, GEVAL_SCALE_CEILING)
}

/// Convert a metric's native score to a unit-interval quality score.
///
/// Hallucination measures a rate of failure and is inverted. G-Eval is
/// rescaled by its scale ceiling. BERTScore can be negative and is clamped.
pub fn quality_score(key: MetricKey, raw: f64) -> f64 {
    let quality = match key {
        MetricKey::Hallucination => 1.0 - raw,
        MetricKey::GEval => rubric_points(raw) / GEVAL_SCALE_CEILING,
        _ => raw,
    };
    quality.clamp(0.0, 1.0)
}

/// Reasons attached to verdicts labelled "no", in order.
pub fn unfavorable_reasons(verdicts: &[Verdict]) -> Vec<String> {
    verdicts
        .iter()
        .filter(|v| v.is_no())
        .filter_map(|v| v.reason.clone())
        .collect()
}

/// Reasons attached to verdicts labelled "yes", in order.
pub fn favorable_reasons(verdicts: &[Verdict]) -> Vec<String> {
    verdicts
        .iter()
        .filter(|v| v.label == VerdictLabel::Yes)
        .filter_map(|v| v.reason.clone())
        .collect()
}

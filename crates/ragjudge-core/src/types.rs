//! Core types for ragjudge evaluations.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::evidence::Evidence;
use crate::scoring::{quality_score, MetricConfig};

/// Stable identifiers for every metric the evaluator knows about.
///
/// Declaration order is the execution order used by the orchestrator and the
/// key order of every report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricKey {
    Faithfulness,
    AnswerRelevancy,
    ContextualRelevancy,
    #[serde(rename = "geval")]
    GEval,
    Hallucination,
    KnowledgeRetention,
    BertScore,
    Meteor,
    Rouge,
}

impl MetricKey {
    /// All metric keys in declared order.
    pub const ALL: [MetricKey; 9] = [
        MetricKey::Faithfulness,
        MetricKey::AnswerRelevancy,
        MetricKey::ContextualRelevancy,
        MetricKey::GEval,
        MetricKey::Hallucination,
        MetricKey::KnowledgeRetention,
        MetricKey::BertScore,
        MetricKey::Meteor,
        MetricKey::Rouge,
    ];

    /// The lowercase identifier used in reports and configuration.
    pub fn as_str(&self) -> &'static str {
        match self {
            MetricKey::Faithfulness => "faithfulness",
            MetricKey::AnswerRelevancy => "answer_relevancy",
            MetricKey::ContextualRelevancy => "contextual_relevancy",
            MetricKey::GEval => "geval",
            MetricKey::Hallucination => "hallucination",
            MetricKey::KnowledgeRetention => "knowledge_retention",
            MetricKey::BertScore => "bert_score",
            MetricKey::Meteor => "meteor",
            MetricKey::Rouge => "rouge",
        }
    }

    /// Whether this metric needs a judge to run.
    pub fn requires_judge(&self) -> bool {
        matches!(
            self,
            MetricKey::Faithfulness
                | MetricKey::AnswerRelevancy
                | MetricKey::ContextualRelevancy
                | MetricKey::GEval
                | MetricKey::Hallucination
                | MetricKey::KnowledgeRetention
        )
    }
}

impl fmt::Display for MetricKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MetricKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        MetricKey::ALL
            .iter()
            .copied()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| format!("unknown metric key: {}", s))
    }
}

/// The three canonical verdict labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VerdictLabel {
    Yes,
    No,
    Idk,
}

impl VerdictLabel {
    /// Parse a judge-supplied label. Surrounding whitespace and case are ignored.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "yes" => Some(VerdictLabel::Yes),
            "no" => Some(VerdictLabel::No),
            "idk" => Some(VerdictLabel::Idk),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            VerdictLabel::Yes => "yes",
            VerdictLabel::No => "no",
            VerdictLabel::Idk => "idk",
        }
    }
}

/// A judge's categorical label over one statement, claim, context or turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Verdict {
    /// Canonical label. A reply outside the label domain is stored as `No`.
    pub label: VerdictLabel,

    /// Optional explanation from the judge
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,

    /// The raw label when the judge replied outside `{yes, no, idk}`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub violation: Option<String>,
}

impl Verdict {
    pub fn new(label: VerdictLabel, reason: Option<String>) -> Self {
        Self {
            label,
            reason,
            violation: None,
        }
    }

    /// Build a verdict from a raw judge label.
    ///
    /// Unknown labels resolve to `No`, the failing label for every metric, and
    /// keep the raw token for audit.
    pub fn from_raw(raw_label: &str, reason: Option<String>) -> Self {
        match VerdictLabel::parse(raw_label) {
            Some(label) => Self::new(label, reason),
            None => {
                tracing::warn!(label = raw_label, "Verdict label outside {{yes, no, idk}}");
                Self {
                    label: VerdictLabel::No,
                    reason,
                    violation: Some(raw_label.to_string()),
                }
            }
        }
    }

    /// Whether the judge broke the label contract for this verdict.
    pub fn is_violation(&self) -> bool {
        self.violation.is_some()
    }

    pub fn is_no(&self) -> bool {
        self.label == VerdictLabel::No
    }
}

/// One (query, response) exchange in a conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Turn {
    pub query: String,
    pub response: String,
}

impl Turn {
    pub fn new(query: impl Into<String>, response: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            response: response.into(),
        }
    }
}

/// The externally visible output of one metric execution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricResult {
    /// Which metric produced this result
    pub key: MetricKey,

    /// Score on the metric's native scale
    pub score: f64,

    /// Effective pass threshold (1.0 under strict mode)
    pub threshold: f64,

    /// Whether the quality score met the threshold
    pub success: bool,

    /// Human-readable justification, when requested
    pub reason: Option<String>,

    /// Intermediate artifacts for audit
    pub evidence: Evidence,
}

impl MetricResult {
    /// Build a result, deciding `success` from the quality score under `config`.
    pub fn scored(
        key: MetricKey,
        score: f64,
        config: &MetricConfig,
        reason: Option<String>,
        evidence: Evidence,
    ) -> Self {
        Self {
            key,
            score,
            threshold: config.effective_threshold(),
            success: config.passes(quality_score(key, score)),
            reason,
            evidence,
        }
    }
}

/// A successful metric in a report, with its unit-interval quality score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportEntry {
    pub result: MetricResult,

    /// Score after inversion or rescaling, in `[0, 1]`
    pub quality: f64,
}

/// The unified result of evaluating one response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationReport {
    /// Successful metrics, keyed in declared order
    pub entries: BTreeMap<MetricKey, ReportEntry>,

    /// Metrics that failed, with the failure message
    pub failures: BTreeMap<MetricKey, String>,

    /// Mean quality over successful metrics; `None` when nothing succeeded
    pub aggregate_score: Option<f64>,

    /// When the report was assembled
    pub evaluated_at: DateTime<Utc>,
}

impl EvaluationReport {
    pub fn get(&self, key: MetricKey) -> Option<&MetricResult> {
        self.entries.get(&key).map(|e| &e.result)
    }

    pub fn quality(&self, key: MetricKey) -> Option<f64> {
        self.entries.get(&key).map(|e| e.quality)
    }

    pub fn contains(&self, key: MetricKey) -> bool {
        self.entries.contains_key(&key)
    }
}

//! Evidence carried by every metric result.
//!
//! Each result keeps the intermediate artifacts that produced its score so a
//! reader can audit why a response passed or failed.

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::collections::BTreeMap;

use crate::statistical::OverlapScore;
use crate::types::Verdict;

/// Accumulated knowledge for one conversation, keyed by fact name.
pub type Knowledge = BTreeMap<String, JsonValue>;

/// Intermediate artifacts of one metric execution.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Evidence {
    /// Statements extracted from the response
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub statements: Vec<String>,

    /// Claims extracted from the response
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub claims: Vec<String>,

    /// Truths extracted from the retrieval context
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub truths: Vec<String>,

    /// Verdicts in the order the judge returned them
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub verdicts: Vec<Verdict>,

    /// Rubric evaluation steps
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub steps: Vec<String>,

    /// Knowledge snapshot after each conversation turn
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub knowledge: Vec<Knowledge>,

    /// Precision/recall/F1 for overlap-style metrics
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub overlap: Option<OverlapScore>,
}

impl Evidence {
    pub fn builder() -> EvidenceBuilder {
        EvidenceBuilder::default()
    }

    /// Number of verdicts that broke the label contract.
    pub fn violation_count(&self) -> usize {
        self.verdicts.iter().filter(|v| v.is_violation()).count()
    }
}

/// Builder for creating evidence with fluent API.
#[derive(Debug, Default)]
pub struct EvidenceBuilder {
    evidence: Evidence,
}

impl EvidenceBuilder {
    pub fn statements(mut self, statements: Vec<String>) -> Self {
        self.evidence.statements = statements;
        self
    }

    pub fn claims(mut self, claims: Vec<String>) -> Self {
        self.evidence.claims = claims;
        self
    }

    pub fn truths(mut self, truths: Vec<String>) -> Self {
        self.evidence.truths = truths;
        self
    }

    pub fn verdicts(mut self, verdicts: Vec<Verdict>) -> Self {
        self.evidence.verdicts = verdicts;
        self
    }

    pub fn steps(mut self, steps: Vec<String>) -> Self {
        self.evidence.steps = steps;
        self
    }

    pub fn knowledge(mut self, knowledge: Vec<Knowledge>) -> Self {
        self.evidence.knowledge = knowledge;
        self
    }

    pub fn overlap(mut self, overlap: OverlapScore) -> Self {
        self.evidence.overlap = Some(overlap);
        self
    }

    pub fn build(self) -> Evidence {
        self.evidence
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::VerdictLabel;

    #[test]
    fn test_builder_sets_fields() {
        let evidence = Evidence::builder()
            .claims(vec!["Paris is in France".into()])
            .truths(vec!["Paris is the capital of France".into()])
            .verdicts(vec![Verdict::new(VerdictLabel::Yes, None)])
            .build();

        assert_eq!(evidence.claims.len(), 1);
        assert_eq!(evidence.truths.len(), 1);
        assert_eq!(evidence.verdicts[0].label, VerdictLabel::Yes);
        assert!(evidence.statements.is_empty());
        assert!(evidence.overlap.is_none());
    }

    #[test]
    fn test_empty_fields_are_not_serialized() {
        let evidence = Evidence::builder()
            .statements(vec!["The sky is blue".into()])
            .build();
        let json = serde_json::to_value(&evidence).unwrap();
        let obj = json.as_object().unwrap();
        assert!(obj.contains_key("statements"));
        assert!(!obj.contains_key("claims"));
        assert!(!obj.contains_key("overlap"));
    }

    #[test]
    fn test_violation_count() {
        let evidence = Evidence::builder()
            .verdicts(vec![
                Verdict::from_raw("yes", None),
                Verdict::from_raw("perhaps", None),
                Verdict::from_raw("unclear", None),
            ])
            .build();
        assert_eq!(evidence.violation_count(), 2);
    }
}

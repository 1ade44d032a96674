//! Structured judge replies.
//!
//! Every judge-protocol step expects a JSON object with fixed field names.
//! This module sanitizes the raw reply text and parses it into the typed
//! reply for that step. Field names here are the wire contract with the
//! prompt templates and must not drift.

use lazy_static::lazy_static;
use regex::Regex;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use thiserror::Error;

use crate::evidence::Knowledge;
use crate::types::Verdict;

lazy_static! {
    /// A single code fence around the whole reply, with an optional language tag.
    static ref CODE_FENCE: Regex = Regex::new(
        r"(?s)\A```[ \t]*(?:[A-Za-z][A-Za-z0-9_-]*)?[ \t]*\r?\n?(.*?)\s*```\z"
    ).unwrap();
}

/// Errors from parsing a judge reply.
#[derive(Error, Debug)]
pub enum ReplyError {
    #[error("Reply is not valid JSON: {0}")]
    Malformed(String),

    #[error("Reply does not match the {expected} contract: {message}")]
    Contract {
        expected: &'static str,
        message: String,
    },
}

/// Strip one enclosing code fence from a reply, if present.
///
/// Text without a fence is returned unchanged.
pub fn strip_code_fence(reply: &str) -> &str {
    let trimmed = reply.trim();
    match CODE_FENCE.captures(trimmed) {
        Some(caps) => caps.get(1).map(|m| m.as_str().trim()).unwrap_or(trimmed),
        None => reply,
    }
}

/// Parse a reply into the structured type expected by one protocol step.
pub fn parse_reply<T>(reply: &str) -> Result<T, ReplyError>
where
    T: DeserializeOwned + ReplyContract,
{
    let payload = strip_code_fence(reply);
    serde_json::from_str(payload).map_err(|e| match e.classify() {
        serde_json::error::Category::Data => ReplyError::Contract {
            expected: T::CONTRACT,
            message: e.to_string(),
        },
        _ => ReplyError::Malformed(e.to_string()),
    })
}

/// Names the field contract a reply type implements, for error messages.
pub trait ReplyContract {
    const CONTRACT: &'static str;
}

/// `{"statements": [...]}`
#[derive(Debug, Clone, Deserialize)]
pub struct StatementsReply {
    pub statements: Vec<String>,
}

/// `{"claims": [...]}`
#[derive(Debug, Clone, Deserialize)]
pub struct ClaimsReply {
    pub claims: Vec<String>,
}

/// `{"truths": [...]}`
#[derive(Debug, Clone, Deserialize)]
pub struct TruthsReply {
    pub truths: Vec<String>,
}

/// `{"verdict": "...", "reason": "..."}`
#[derive(Debug, Clone, Deserialize)]
pub struct VerdictReply {
    pub verdict: String,
    #[serde(default)]
    pub reason: Option<String>,
}

impl VerdictReply {
    pub fn into_verdict(self) -> Verdict {
        Verdict::from_raw(&self.verdict, self.reason)
    }
}

/// `{"verdicts": [{"verdict": "...", "reason": "..."}, ...]}`
#[derive(Debug, Clone, Deserialize)]
pub struct VerdictsReply {
    pub verdicts: Vec<VerdictReply>,
}

impl VerdictsReply {
    pub fn into_verdicts(self) -> Vec<Verdict> {
        self.verdicts
            .into_iter()
            .map(VerdictReply::into_verdict)
            .collect()
    }
}

/// `{"reason": "..."}`
#[derive(Debug, Clone, Deserialize)]
pub struct ReasonReply {
    pub reason: String,
}

/// `{"steps": [...]}`
#[derive(Debug, Clone, Deserialize)]
pub struct StepsReply {
    pub steps: Vec<String>,
}

/// `{"score": 7, "reason": "..."}`
#[derive(Debug, Clone, Deserialize)]
pub struct RubricReply {
    pub score: RubricScore,
    #[serde(default)]
    pub reason: Option<String>,
}

/// Judges return rubric scores as numbers or numeric strings.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RubricScore {
    Number(f64),
    Text(String),
}

impl RubricScore {
    pub fn value(&self) -> Result<f64, ReplyError> {
        let value = match self {
            RubricScore::Number(n) => *n,
            RubricScore::Text(s) => s.trim().parse::<f64>().map_err(|_| ReplyError::Contract {
                expected: RubricReply::CONTRACT,
                message: format!("score is not numeric: {:?}", s),
            })?,
        };
        if value.is_finite() {
            Ok(value)
        } else {
            Err(ReplyError::Contract {
                expected: RubricReply::CONTRACT,
                message: "score is not finite".to_string(),
            })
        }
    }
}

/// `{"data": {...}}`
#[derive(Debug, Clone, Deserialize)]
pub struct KnowledgeReply {
    #[serde(deserialize_with = "null_as_empty")]
    pub data: Knowledge,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Knowledge, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value: Option<Knowledge> = Option::deserialize(deserializer)?;
    Ok(value.unwrap_or_default())
}

impl ReplyContract for StatementsReply {
    const CONTRACT: &'static str = "statements";
}

impl ReplyContract for ClaimsReply {
    const CONTRACT: &'static str = "claims";
}

impl ReplyContract for TruthsReply {
    const CONTRACT: &'static str = "truths";
}

impl ReplyContract for VerdictReply {
    const CONTRACT: &'static str = "verdict";
}

impl ReplyContract for VerdictsReply {
    const CONTRACT: &'static str = "verdicts";
}

impl ReplyContract for ReasonReply {
    const CONTRACT: &'static str = "reason";
}

impl ReplyContract for StepsReply {
    const CONTRACT: &'static str = "steps";
}

impl ReplyContract for RubricReply {
    const CONTRACT: &'static str = "score";
}

impl ReplyContract for KnowledgeReply {
    const CONTRACT: &'static str = "data";
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::VerdictLabel;

    #[test]
    fn test_unfenced_reply_passes_through() {
        let reply = r#"{"statements": ["a"]}"#;
        assert_eq!(strip_code_fence(reply), reply);
    }

    #[test]
    fn test_json_fence_is_stripped() {
        let reply = "```json\n{\"statements\": [\"a\"]}\n```";
        assert_eq!(strip_code_fence(reply), r#"{"statements": ["a"]}"#);
    }

    #[test]
    fn test_bare_fence_is_stripped() {
        let reply = "```\n{\"reason\": \"ok\"}```";
        assert_eq!(strip_code_fence(reply), r#"{"reason": "ok"}"#);
    }

    #[test]
    fn test_inline_fence_with_tag() {
        let reply = "```json{\"reason\": \"ok\"}```";
        assert_eq!(strip_code_fence(reply), r#"{"reason": "ok"}"#);
    }

    #[test]
    fn test_fenced_and_plain_parse_identically() {
        let plain = r#"{"verdicts": [{"verdict": "yes", "reason": "on topic"}, {"verdict": "idk"}]}"#;
        let fenced = format!("```json\n{}\n```", plain);

        let a: VerdictsReply = parse_reply(plain).unwrap();
        let b: VerdictsReply = parse_reply(&fenced).unwrap();
        assert_eq!(a.into_verdicts(), b.into_verdicts());
    }

    #[test]
    fn test_missing_field_is_contract_error() {
        let result: Result<StatementsReply, _> = parse_reply(r#"{"claims": []}"#);
        match result {
            Err(ReplyError::Contract { expected, .. }) => assert_eq!(expected, "statements"),
            other => panic!("expected contract error, got {:?}", other),
        }
    }

    #[test]
    fn test_garbage_is_malformed() {
        let result: Result<ReasonReply, _> = parse_reply("I think the answer is good.");
        assert!(matches!(result, Err(ReplyError::Malformed(_))));
    }

    #[test]
    fn test_verdicts_with_unknown_label() {
        let reply: VerdictsReply =
            parse_reply(r#"{"verdicts": [{"verdict": "partially", "reason": "mixed"}]}"#).unwrap();
        let verdicts = reply.into_verdicts();
        assert_eq!(verdicts[0].label, VerdictLabel::No);
        assert!(verdicts[0].is_violation());
    }

    #[test]
    fn test_rubric_score_forms() {
        let numeric: RubricReply = parse_reply(r#"{"score": 7, "reason": "good"}"#).unwrap();
        assert_eq!(numeric.score.value().unwrap(), 7.0);

        let text: RubricReply = parse_reply(r#"{"score": " 6 ", "reason": "fine"}"#).unwrap();
        assert_eq!(text.score.value().unwrap(), 6.0);

        let bad: RubricReply = parse_reply(r#"{"score": "high"}"#).unwrap();
        assert!(bad.score.value().is_err());
    }

    #[test]
    fn test_knowledge_reply_allows_null_data() {
        let reply: KnowledgeReply = parse_reply(r#"{"data": null}"#).unwrap();
        assert!(reply.data.is_empty());

        let reply: KnowledgeReply =
            parse_reply(r#"{"data": {"name": "Ada", "city": "London"}}"#).unwrap();
        assert_eq!(reply.data.len(), 2);
    }
}

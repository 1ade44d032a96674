//! Answer relevancy: does the response address the query?

use async_trait::async_trait;

use ragjudge_core::reply::{ReasonReply, StatementsReply, VerdictsReply};
use ragjudge_core::scoring::{single_verdict_score, unfavorable_reasons};
use ragjudge_core::{Evidence, MetricConfig, MetricKey, MetricResult};

use super::{JudgeProtocol, MetricError};
use crate::judge::JudgeClient;
use crate::prompts::answer_relevancy as prompts;
use crate::protocol::ProtocolState;
use crate::session::JudgeSession;

/// Statements are extracted from the response, then judged as a whole against
/// the query. The score comes from the first verdict only.
#[derive(Debug)]
pub struct AnswerRelevancy {
    client: JudgeClient,
    query: String,
    response: String,
    config: MetricConfig,
}

impl AnswerRelevancy {
    pub fn new(
        client: JudgeClient,
        query: impl Into<String>,
        response: impl Into<String>,
        config: MetricConfig,
    ) -> Self {
        Self {
            client,
            query: query.into(),
            response: response.into(),
            config,
        }
    }
}

#[async_trait]
impl JudgeProtocol for AnswerRelevancy {
    const KEY: MetricKey = MetricKey::AnswerRelevancy;

    fn client(&self) -> &JudgeClient {
        &self.client
    }

    async fn execute(&self, session: &mut JudgeSession) -> Result<MetricResult, MetricError> {
        let statements = session
            .ask::<StatementsReply>(&prompts::generate_statements(&self.response))
            .await?
            .statements;
        session.advance(ProtocolState::Extracted)?;

        let verdicts = session
            .ask::<VerdictsReply>(&prompts::generate_verdicts(&self.query, &statements))
            .await?
            .into_verdicts();
        session.advance(ProtocolState::Judged)?;

        let score = single_verdict_score(&verdicts);
        session.advance(ProtocolState::Scored)?;

        let reason = if self.config.include_reason {
            let irrelevant = unfavorable_reasons(&verdicts);
            let reply = session
                .ask::<ReasonReply>(&prompts::generate_reason(&irrelevant, &self.query, score))
                .await?;
            session.advance(ProtocolState::Reasoned)?;
            Some(reply.reason)
        } else {
            None
        };
        session.advance(ProtocolState::Done)?;

        let evidence = Evidence::builder()
            .statements(statements)
            .verdicts(verdicts)
            .build();
        Ok(MetricResult::scored(Self::KEY, score, &self.config, reason, evidence))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedJudge;
    use std::sync::Arc;

    const STATEMENTS: &str = r#"{"statements": ["The Eiffel Tower is in Paris.", "It opened in 1889."]}"#;

    fn metric(judge: ScriptedJudge, config: MetricConfig) -> AnswerRelevancy {
        AnswerRelevancy::new(
            JudgeClient::new(Arc::new(judge)),
            "Where is the Eiffel Tower?",
            "The Eiffel Tower is in Paris. It opened in 1889.",
            config,
        )
    }

    fn judge_with_verdicts(verdicts: &str) -> ScriptedJudge {
        ScriptedJudge::new()
            .route("Extract the standalone statements", STATEMENTS)
            .route("Decide whether the statements", verdicts)
            .route("Explain the answer relevancy score", r#"{"reason": "On topic."}"#)
    }

    #[tokio::test]
    async fn test_yes_scores_one_with_reason() {
        let m = metric(
            judge_with_verdicts(r#"{"verdicts": [{"verdict": "yes"}]}"#),
            MetricConfig::default(),
        );
        let run = m.run().await;
        let result = run.outcome.unwrap();

        assert_eq!(result.score, 1.0);
        assert!(result.success);
        assert_eq!(result.reason.as_deref(), Some("On topic."));
        assert_eq!(result.evidence.statements.len(), 2);
        assert_eq!(run.usage.judge_calls, 3);
        assert_eq!(run.final_state, ProtocolState::Done);
    }

    #[tokio::test]
    async fn test_first_verdict_decides() {
        let m = metric(
            judge_with_verdicts(
                r#"{"verdicts": [{"verdict": "idk"}, {"verdict": "no", "reason": "x"}]}"#,
            ),
            MetricConfig::default().with_reason(false),
        );
        let result = m.run().await.outcome.unwrap();
        assert_eq!(result.score, 0.5);
        assert!(result.success);
    }

    #[tokio::test]
    async fn test_no_verdict_scores_zero() {
        let m = metric(
            judge_with_verdicts(r#"{"verdicts": [{"verdict": "no", "reason": "Talks about London."}]}"#),
            MetricConfig::default(),
        );
        let result = m.run().await.outcome.unwrap();
        assert_eq!(result.score, 0.0);
        assert!(!result.success);
    }

    #[tokio::test]
    async fn test_empty_verdicts_score_one() {
        let m = metric(
            judge_with_verdicts(r#"{"verdicts": []}"#),
            MetricConfig::default().with_reason(false),
        );
        assert_eq!(m.run().await.outcome.unwrap().score, 1.0);
    }

    #[tokio::test]
    async fn test_label_violation_scores_zero() {
        let m = metric(
            judge_with_verdicts(r#"{"verdicts": [{"verdict": "absolutely"}]}"#),
            MetricConfig::default().with_reason(false),
        );
        let result = m.run().await.outcome.unwrap();
        assert_eq!(result.score, 0.0);
        assert_eq!(result.evidence.violation_count(), 1);
    }

    #[tokio::test]
    async fn test_strict_mode_changes_only_success() {
        let m = metric(
            judge_with_verdicts(r#"{"verdicts": [{"verdict": "idk"}]}"#),
            MetricConfig::strict().with_reason(false),
        );
        let result = m.run().await.outcome.unwrap();
        assert_eq!(result.score, 0.5);
        assert_eq!(result.threshold, 1.0);
        assert!(!result.success);
    }

    #[tokio::test]
    async fn test_malformed_statements_fail_the_metric() {
        let judge = ScriptedJudge::new()
            .route("Extract the standalone statements", r#"{"items": []}"#);
        let run = metric(judge, MetricConfig::default()).run().await;

        assert!(matches!(run.outcome, Err(MetricError::Parse(_))));
        assert_eq!(run.final_state, ProtocolState::Failed);
        assert!(run.usage.output_tokens > 0);
    }
}

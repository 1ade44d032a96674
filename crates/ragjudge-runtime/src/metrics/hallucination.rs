//! Hallucination: how often does the response contradict its contexts?

use async_trait::async_trait;

use ragjudge_core::reply::{ReasonReply, VerdictsReply};
use ragjudge_core::scoring::{
    align_verdicts, contradiction_fraction, favorable_reasons, unfavorable_reasons,
};
use ragjudge_core::{Evidence, MetricConfig, MetricKey, MetricResult};

use super::{JudgeProtocol, MetricError};
use crate::judge::JudgeClient;
use crate::prompts::hallucination as prompts;
use crate::protocol::ProtocolState;
use crate::session::JudgeSession;

/// The score is a contradiction rate, so lower is better. Reports invert it
/// into a quality score.
#[derive(Debug)]
pub struct Hallucination {
    client: JudgeClient,
    response: String,
    contexts: Vec<String>,
    config: MetricConfig,
}

impl Hallucination {
    pub fn new(
        client: JudgeClient,
        response: impl Into<String>,
        contexts: Vec<String>,
        config: MetricConfig,
    ) -> Self {
        Self {
            client,
            response: response.into(),
            contexts,
            config,
        }
    }
}

#[async_trait]
impl JudgeProtocol for Hallucination {
    const KEY: MetricKey = MetricKey::Hallucination;

    fn client(&self) -> &JudgeClient {
        &self.client
    }

    async fn execute(&self, session: &mut JudgeSession) -> Result<MetricResult, MetricError> {
        session.advance(ProtocolState::Extracted)?;

        let verdicts = if self.contexts.is_empty() {
            Vec::new()
        } else {
            let reply = session
                .ask::<VerdictsReply>(&prompts::generate_verdicts(&self.response, &self.contexts))
                .await?;
            align_verdicts(reply.into_verdicts(), self.contexts.len())
        };
        session.advance(ProtocolState::Judged)?;

        let score = contradiction_fraction(&verdicts);
        session.advance(ProtocolState::Scored)?;

        let reason = if self.config.include_reason {
            let alignments = favorable_reasons(&verdicts);
            let contradictions = unfavorable_reasons(&verdicts);
            let reply = session
                .ask::<ReasonReply>(&prompts::generate_reason(&alignments, &contradictions, score))
                .await?;
            session.advance(ProtocolState::Reasoned)?;
            Some(reply.reason)
        } else {
            None
        };
        session.advance(ProtocolState::Done)?;

        let evidence = Evidence::builder().verdicts(verdicts).build();
        Ok(MetricResult::scored(Self::KEY, score, &self.config, reason, evidence))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedJudge;
    use ragjudge_core::quality_score;
    use std::sync::Arc;

    fn metric(verdicts: &str) -> Hallucination {
        let judge = ScriptedJudge::new()
            .route("Judge whether the response agrees", verdicts)
            .route("Explain the hallucination score", r#"{"reason": "Mostly grounded."}"#);
        Hallucination::new(
            JudgeClient::new(Arc::new(judge)),
            "The Great Wall is visible from the Moon.",
            vec![
                "The Great Wall is not visible to the naked eye from the Moon.".to_string(),
                "The Great Wall is in China.".to_string(),
            ],
            MetricConfig::default(),
        )
    }

    #[tokio::test]
    async fn test_contradiction_rate_and_quality() {
        let run = metric(
            r#"{"verdicts": [{"verdict": "no", "reason": "Not visible."}, {"verdict": "yes", "reason": "Agrees on location."}]}"#,
        )
        .run()
        .await;
        let result = run.outcome.unwrap();

        assert_eq!(result.score, 0.5);
        assert_eq!(quality_score(MetricKey::Hallucination, result.score), 0.5);
        assert_eq!(result.reason.as_deref(), Some("Mostly grounded."));
    }

    #[tokio::test]
    async fn test_no_contradictions_passes() {
        let result = metric(r#"{"verdicts": [{"verdict": "yes"}, {"verdict": "yes"}]}"#)
            .run()
            .await
            .outcome
            .unwrap();
        assert_eq!(result.score, 0.0);
        assert!(result.success);
    }

    #[tokio::test]
    async fn test_full_contradiction_fails() {
        let result = metric(r#"{"verdicts": [{"verdict": "no"}, {"verdict": "unsure"}]}"#)
            .run()
            .await
            .outcome
            .unwrap();
        assert_eq!(result.score, 1.0);
        assert!(!result.success);
    }

    #[tokio::test]
    async fn test_missing_verdicts_count_as_contradictions() {
        let result = metric(r#"{"verdicts": []}"#).run().await.outcome.unwrap();
        assert_eq!(result.score, 1.0);
        assert!(!result.success);
        assert_eq!(result.evidence.violation_count(), 2);
    }

    #[tokio::test]
    async fn test_surplus_verdicts_count_as_contradictions() {
        let result = metric(
            r#"{"verdicts": [{"verdict": "yes"}, {"verdict": "yes"}, {"verdict": "yes"}]}"#,
        )
        .run()
        .await
        .outcome
        .unwrap();
        assert!((result.score - 1.0 / 3.0).abs() < 1e-12);
        assert_eq!(result.evidence.violation_count(), 1);
    }
}

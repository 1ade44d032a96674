//! One metric's conversation with the judge.
//!
//! A session owns the protocol state and the token usage of a single metric
//! execution. Calls are strictly sequential: each prompt is built from the
//! previous reply.

use serde::de::DeserializeOwned;
use std::sync::Arc;

use ragjudge_core::reply::{parse_reply, ReplyContract};
use ragjudge_core::{MetricKey, MetricResult};

use crate::judge::{Judge, JudgeError};
use crate::metrics::{MetricError, MetricRun};
use crate::protocol::{Protocol, ProtocolState};
use crate::usage::{TokenCounter, TokenUsage};

pub struct JudgeSession {
    judge: Arc<dyn Judge>,
    counter: Arc<dyn TokenCounter>,
    key: MetricKey,
    usage: TokenUsage,
    protocol: Protocol,
}

impl JudgeSession {
    pub(crate) fn new(judge: Arc<dyn Judge>, counter: Arc<dyn TokenCounter>, key: MetricKey) -> Self {
        Self {
            judge,
            counter,
            key,
            usage: TokenUsage::default(),
            protocol: Protocol::new(key),
        }
    }

    pub fn key(&self) -> MetricKey {
        self.key
    }

    pub fn usage(&self) -> TokenUsage {
        self.usage
    }

    pub fn state(&self) -> ProtocolState {
        self.protocol.state()
    }

    /// Send one prompt and parse the reply into the step's structured type.
    ///
    /// Tokens are counted before parsing, so a reply that fails to parse is
    /// still accounted for. Any error moves the protocol to `Failed`.
    pub async fn ask<T>(&mut self, prompt: &str) -> Result<T, MetricError>
    where
        T: DeserializeOwned + ReplyContract,
    {
        let input_tokens = self.counter.count(prompt);
        self.usage.input_tokens += input_tokens;
        self.usage.judge_calls += 1;

        let reply = match self.judge.generate(prompt).await {
            Ok(reply) => reply,
            Err(e) => return Err(self.fail(MetricError::Judge(e))),
        };

        let output_tokens = self.counter.count(&reply);
        self.usage.output_tokens += output_tokens;

        tracing::debug!(
            metric = %self.key,
            judge = self.judge.name(),
            contract = T::CONTRACT,
            input_tokens,
            output_tokens,
            "Judge call"
        );

        if reply.trim().is_empty() {
            return Err(self.fail(MetricError::Judge(JudgeError::EmptyReply)));
        }

        parse_reply::<T>(&reply).map_err(|e| self.fail(MetricError::Parse(e)))
    }

    /// Record that a protocol stage has completed.
    pub fn advance(&mut self, next: ProtocolState) -> Result<(), MetricError> {
        self.protocol
            .advance(next)
            .map_err(|e| self.fail(MetricError::Protocol(e)))
    }

    pub(crate) fn fail(&mut self, error: MetricError) -> MetricError {
        self.protocol.fail();
        error
    }

    /// Close the session and package the outcome with its usage.
    pub(crate) fn finish(mut self, outcome: Result<MetricResult, MetricError>) -> MetricRun {
        if outcome.is_err() {
            self.protocol.fail();
        }
        MetricRun {
            key: self.key,
            outcome,
            usage: self.usage,
            final_state: self.protocol.state(),
        }
    }
}

impl std::fmt::Debug for JudgeSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JudgeSession")
            .field("key", &self.key)
            .field("judge", &self.judge.name())
            .field("usage", &self.usage)
            .field("state", &self.protocol.state())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::judge::JudgeClient;
    use crate::testing::ScriptedJudge;
    use crate::usage::CharEstimateCounter;
    use ragjudge_core::reply::{ReasonReply, StatementsReply};

    fn client(judge: ScriptedJudge) -> JudgeClient {
        JudgeClient::new(Arc::new(judge)).with_counter(Arc::new(CharEstimateCounter))
    }

    #[tokio::test]
    async fn test_counters_increase_after_every_call() {
        let judge = ScriptedJudge::new()
            .route("first", r#"{"statements": ["a", "b"]}"#)
            .route("second", r#"{"reason": "fine"}"#);
        let mut session = client(judge).session(MetricKey::AnswerRelevancy);

        let before = session.usage();
        let _: StatementsReply = session.ask("first prompt").await.unwrap();
        let mid = session.usage();
        let _: ReasonReply = session.ask("second prompt").await.unwrap();
        let after = session.usage();

        assert!(mid.input_tokens > before.input_tokens);
        assert!(mid.output_tokens > before.output_tokens);
        assert!(after.input_tokens > mid.input_tokens);
        assert!(after.output_tokens > mid.output_tokens);
        assert_eq!(after.judge_calls, 2);
    }

    #[tokio::test]
    async fn test_parse_failure_still_counts_tokens() {
        let judge = ScriptedJudge::new().route("extract", "this is not json at all");
        let mut session = client(judge).session(MetricKey::AnswerRelevancy);

        let result: Result<StatementsReply, _> = session.ask("extract statements").await;
        assert!(matches!(result, Err(MetricError::Parse(_))));
        assert!(session.usage().input_tokens > 0);
        assert!(session.usage().output_tokens > 0);
        assert_eq!(session.state(), ProtocolState::Failed);
    }

    #[tokio::test]
    async fn test_empty_reply_is_judge_error() {
        let judge = ScriptedJudge::new().route("extract", "  \n ");
        let mut session = client(judge).session(MetricKey::Faithfulness);

        let result: Result<StatementsReply, _> = session.ask("extract claims").await;
        assert!(matches!(
            result,
            Err(MetricError::Judge(JudgeError::EmptyReply))
        ));
        assert_eq!(session.usage().judge_calls, 1);
    }

    #[tokio::test]
    async fn test_fenced_reply_parses() {
        let judge = ScriptedJudge::new().route("x", "```json\n{\"statements\": [\"s\"]}\n```");
        let mut session = client(judge).session(MetricKey::AnswerRelevancy);
        let reply: StatementsReply = session.ask("x").await.unwrap();
        assert_eq!(reply.statements, vec!["s".to_string()]);
    }

    #[tokio::test]
    async fn test_finish_marks_failure() {
        let session = client(ScriptedJudge::new()).session(MetricKey::GEval);
        let run = session.finish(Err(MetricError::Judge(JudgeError::Failed("x".into()))));
        assert_eq!(run.final_state, ProtocolState::Failed);
        assert!(run.outcome.is_err());
    }

    #[test]
    fn test_invalid_transition_fails_session() {
        let mut session = client(ScriptedJudge::new()).session(MetricKey::GEval);
        let err = session.advance(ProtocolState::Scored).unwrap_err();
        assert!(matches!(err, MetricError::Protocol(_)));
        assert_eq!(session.state(), ProtocolState::Failed);
    }
}

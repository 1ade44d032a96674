//! Metric implementations.
//!
//! Every metric the evaluator can run is one variant of [`Metric`]. The
//! orchestrator depends only on [`Metric::run`], which always returns a
//! [`MetricRun`]: the outcome plus the tokens spent getting there.
//!
//! Judge-protocol metrics implement [`JudgeProtocol`] and share one
//! execution path: open a session, run the protocol steps, close the session.

use async_trait::async_trait;
use thiserror::Error;

use ragjudge_core::{MetricKey, MetricResult, ReplyError};

use crate::embed::EmbedError;
use crate::judge::{JudgeClient, JudgeError};
use crate::protocol::{InvalidTransition, ProtocolState};
use crate::session::JudgeSession;
use crate::usage::TokenUsage;

mod answer_relevancy;
mod bert_score;
mod contextual_relevancy;
mod faithfulness;
mod geval;
mod hallucination;
mod knowledge_retention;
mod text;

pub use answer_relevancy::AnswerRelevancy;
pub use bert_score::BertScore;
pub use contextual_relevancy::ContextualRelevancy;
pub use faithfulness::Faithfulness;
pub use geval::{GEval, GEvalInputs};
pub use hallucination::Hallucination;
pub use knowledge_retention::KnowledgeRetention;
pub use text::TextMetric;

/// Errors that end one metric execution.
#[derive(Error, Debug)]
pub enum MetricError {
    #[error("Judge call failed: {0}")]
    Judge(#[from] JudgeError),

    #[error("Judge reply rejected: {0}")]
    Parse(#[from] ReplyError),

    #[error("Protocol error: {0}")]
    Protocol(#[from] InvalidTransition),

    #[error("Embedding failed: {0}")]
    Embed(#[from] EmbedError),
}

/// The outcome of one metric execution and what it cost.
#[derive(Debug)]
pub struct MetricRun {
    pub key: MetricKey,

    pub outcome: Result<MetricResult, MetricError>,

    /// Tokens spent, counted even when the run failed
    pub usage: TokenUsage,

    /// `Done` on success, `Failed` otherwise
    pub final_state: ProtocolState,
}

impl MetricRun {
    /// A run that made no judge calls.
    pub(crate) fn without_judge(key: MetricKey, outcome: Result<MetricResult, MetricError>) -> Self {
        let final_state = if outcome.is_ok() {
            ProtocolState::Done
        } else {
            ProtocolState::Failed
        };
        Self {
            key,
            outcome,
            usage: TokenUsage::default(),
            final_state,
        }
    }
}

/// A metric that reaches its score through a sequence of judge calls.
#[async_trait]
pub(crate) trait JudgeProtocol: Send + Sync {
    const KEY: MetricKey;

    fn client(&self) -> &JudgeClient;

    /// Drive the protocol to `Done`, advancing the session after each stage.
    async fn execute(&self, session: &mut JudgeSession) -> Result<MetricResult, MetricError>;

    async fn run(&self) -> MetricRun {
        let mut session = self.client().session(Self::KEY);
        let outcome = self.execute(&mut session).await;
        session.finish(outcome)
    }
}

/// The closed set of metrics the evaluator knows how to run.
#[derive(Debug)]
pub enum Metric {
    Faithfulness(Faithfulness),
    AnswerRelevancy(AnswerRelevancy),
    ContextualRelevancy(ContextualRelevancy),
    GEval(GEval),
    Hallucination(Hallucination),
    KnowledgeRetention(KnowledgeRetention),
    BertScore(BertScore),
    Text(TextMetric),
}

impl Metric {
    pub fn key(&self) -> MetricKey {
        match self {
            Metric::Faithfulness(_) => MetricKey::Faithfulness,
            Metric::AnswerRelevancy(_) => MetricKey::AnswerRelevancy,
            Metric::ContextualRelevancy(_) => MetricKey::ContextualRelevancy,
            Metric::GEval(_) => MetricKey::GEval,
            Metric::Hallucination(_) => MetricKey::Hallucination,
            Metric::KnowledgeRetention(_) => MetricKey::KnowledgeRetention,
            Metric::BertScore(_) => MetricKey::BertScore,
            Metric::Text(m) => m.key(),
        }
    }

    /// Execute the metric to completion.
    pub async fn run(&self) -> MetricRun {
        match self {
            Metric::Faithfulness(m) => m.run().await,
            Metric::AnswerRelevancy(m) => m.run().await,
            Metric::ContextualRelevancy(m) => m.run().await,
            Metric::GEval(m) => m.run().await,
            Metric::Hallucination(m) => m.run().await,
            Metric::KnowledgeRetention(m) => m.run().await,
            Metric::BertScore(m) => m.run().await,
            Metric::Text(m) => m.run(),
        }
    }
}

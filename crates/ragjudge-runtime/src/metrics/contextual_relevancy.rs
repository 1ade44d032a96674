//! Contextual relevancy: is the retrieved context relevant to the query?

use async_trait::async_trait;

use ragjudge_core::reply::{ReasonReply, VerdictsReply};
use ragjudge_core::scoring::{align_verdicts, contextual_relevancy_score};
use ragjudge_core::{Evidence, MetricConfig, MetricKey, MetricResult, Verdict};

use super::{JudgeProtocol, MetricError};
use crate::judge::JudgeClient;
use crate::prompts::contextual_relevancy as prompts;
use crate::protocol::ProtocolState;
use crate::session::JudgeSession;

#[derive(Debug)]
pub struct ContextualRelevancy {
    client: JudgeClient,
    query: String,
    retrieval_context: Vec<String>,
    config: MetricConfig,
}

impl ContextualRelevancy {
    pub fn new(
        client: JudgeClient,
        query: impl Into<String>,
        retrieval_context: Vec<String>,
        config: MetricConfig,
    ) -> Self {
        Self {
            client,
            query: query.into(),
            retrieval_context,
            config,
        }
    }
}

/// One entry per irrelevant context: its reason, or the raw label when the
/// judge gave none.
fn irrelevancies(verdicts: &[Verdict]) -> Vec<String> {
    verdicts
        .iter()
        .filter(|v| v.is_no())
        .map(|v| {
            v.reason
                .clone()
                .or_else(|| v.violation.clone())
                .unwrap_or_else(|| "irrelevant".to_string())
        })
        .collect()
}

#[async_trait]
impl JudgeProtocol for ContextualRelevancy {
    const KEY: MetricKey = MetricKey::ContextualRelevancy;

    fn client(&self) -> &JudgeClient {
        &self.client
    }

    async fn execute(&self, session: &mut JudgeSession) -> Result<MetricResult, MetricError> {
        // The contexts are the artifacts; there is nothing to extract.
        session.advance(ProtocolState::Extracted)?;

        let verdicts = if self.retrieval_context.is_empty() {
            Vec::new()
        } else {
            let reply = session
                .ask::<VerdictsReply>(&prompts::generate_verdicts(
                    &self.query,
                    &self.retrieval_context,
                ))
                .await?;
            align_verdicts(reply.into_verdicts(), self.retrieval_context.len())
        };
        session.advance(ProtocolState::Judged)?;

        let irrelevant = irrelevancies(&verdicts);
        let score = contextual_relevancy_score(irrelevant.len(), self.retrieval_context.len());
        session.advance(ProtocolState::Scored)?;

        let reason = if self.config.include_reason {
            let reply = session
                .ask::<ReasonReply>(&prompts::generate_reason(&self.query, &irrelevant, score))
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

//! Faithfulness: are the response's claims supported by the retrieval context?

use async_trait::async_trait;

use ragjudge_core::reply::{ClaimsReply, ReasonReply, TruthsReply, VerdictsReply};
use ragjudge_core::scoring::{align_verdicts, supported_fraction, unfavorable_reasons};
use ragjudge_core::{Evidence, MetricConfig, MetricKey, MetricResult};

use super::{JudgeProtocol, MetricError};
use crate::judge::JudgeClient;
use crate::prompts::faithfulness as prompts;
use crate::protocol::ProtocolState;
use crate::session::JudgeSession;

/// Cross-verification of claims against truths.
///
/// Claims come from the response and truths from the retrieval context, in two
/// independent extractions. Each claim is then checked against the truths
/// only, never against the raw context.
#[derive(Debug)]
pub struct Faithfulness {
    client: JudgeClient,
    response: String,
    retrieval_context: Vec<String>,
    config: MetricConfig,
}

impl Faithfulness {
    pub fn new(
        client: JudgeClient,
        response: impl Into<String>,
        retrieval_context: Vec<String>,
        config: MetricConfig,
    ) -> Self {
        Self {
            client,
            response: response.into(),
            retrieval_context,
            config,
        }
    }
}

#[async_trait]
impl JudgeProtocol for Faithfulness {
    const KEY: MetricKey = MetricKey::Faithfulness;

    fn client(&self) -> &JudgeClient {
        &self.client
    }

    async fn execute(&self, session: &mut JudgeSession) -> Result<MetricResult, MetricError> {
        let claims = session
            .ask::<ClaimsReply>(&prompts::generate_claims(&self.response))
            .await?
            .claims;
        let truths = session
            .ask::<TruthsReply>(&prompts::generate_truths(&self.retrieval_context))
            .await?
            .truths;
        session.advance(ProtocolState::Extracted)?;

        let verdicts = if claims.is_empty() {
            Vec::new()
        } else {
            let reply = session
                .ask::<VerdictsReply>(&prompts::generate_verdicts(&claims, &truths))
                .await?;
            align_verdicts(reply.into_verdicts(), claims.len())
        };
        session.advance(ProtocolState::Judged)?;

        let score = supported_fraction(&verdicts);
        session.advance(ProtocolState::Scored)?;

        let reason = if self.config.include_reason {
            let contradictions = unfavorable_reasons(&verdicts);
            let reply = session
                .ask::<ReasonReply>(&prompts::generate_reason(&contradictions, score))
                .await?;
            session.advance(ProtocolState::Reasoned)?;
            Some(reply.reason)
        } else {
            None
        };
        session.advance(ProtocolState::Done)?;

        let evidence = Evidence::builder()
            .claims(claims)
            .truths(truths)
            .verdicts(verdicts)
            .build();
        Ok(MetricResult::scored(Self::KEY, score, &self.config, reason, evidence))
    }
}

//! Knowledge retention across a conversation.

use async_trait::async_trait;

use ragjudge_core::reply::{KnowledgeReply, ReasonReply, VerdictReply};
use ragjudge_core::scoring::{non_negative_fraction, unfavorable_reasons};
use ragjudge_core::{Evidence, Knowledge, MetricConfig, MetricKey, MetricResult, Turn};

use super::{JudgeProtocol, MetricError};
use crate::judge::JudgeClient;
use crate::prompts::knowledge_retention as prompts;
use crate::protocol::ProtocolState;
use crate::session::JudgeSession;

/// Checks each assistant turn against the knowledge established by the turns
/// before it.
///
/// Turns are processed strictly in order. For each turn the judge first gives
/// a verdict against the knowledge so far, then extracts what the turn adds;
/// the additions are merged in, with later keys overwriting earlier ones.
#[derive(Debug)]
pub struct KnowledgeRetention {
    client: JudgeClient,
    turns: Vec<Turn>,
    config: MetricConfig,
}

impl KnowledgeRetention {
    pub fn new(client: JudgeClient, turns: Vec<Turn>, config: MetricConfig) -> Self {
        Self {
            client,
            turns,
            config,
        }
    }
}

#[async_trait]
impl JudgeProtocol for KnowledgeRetention {
    const KEY: MetricKey = MetricKey::KnowledgeRetention;

    fn client(&self) -> &JudgeClient {
        &self.client
    }

    async fn execute(&self, session: &mut JudgeSession) -> Result<MetricResult, MetricError> {
        let mut knowledge = Knowledge::new();
        let mut snapshots = Vec::with_capacity(self.turns.len());
        let mut verdicts = Vec::with_capacity(self.turns.len());

        for turn in &self.turns {
            let verdict = session
                .ask::<VerdictReply>(&prompts::generate_verdict(
                    &knowledge,
                    &turn.query,
                    &turn.response,
                ))
                .await?
                .into_verdict();
            verdicts.push(verdict);

            let update = session
                .ask::<KnowledgeReply>(&prompts::generate_knowledge(
                    &knowledge,
                    &turn.query,
                    &turn.response,
                ))
                .await?;
            knowledge.extend(update.data);
            snapshots.push(knowledge.clone());
        }
        session.advance(ProtocolState::Extracted)?;
        session.advance(ProtocolState::Judged)?;

        let score = non_negative_fraction(&verdicts);
        session.advance(ProtocolState::Scored)?;

        let reason = if self.config.include_reason {
            let attritions = unfavorable_reasons(&verdicts);
            let reply = session
                .ask::<ReasonReply>(&prompts::generate_reason(&attritions, score))
                .await?;
            session.advance(ProtocolState::Reasoned)?;
            Some(reply.reason)
        } else {
            None
        };
        session.advance(ProtocolState::Done)?;

        let evidence = Evidence::builder()
            .verdicts(verdicts)
            .knowledge(snapshots)
            .build();
        Ok(MetricResult::scored(Self::KEY, score, &self.config, reason, evidence))
    }
}

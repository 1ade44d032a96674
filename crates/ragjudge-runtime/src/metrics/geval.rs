//! G-Eval: rubric scoring with judge-written evaluation steps.

use async_trait::async_trait;

use ragjudge_core::reply::{RubricReply, StepsReply};
use ragjudge_core::scoring::rubric_points;
use ragjudge_core::{Evidence, MetricConfig, MetricKey, MetricResult};

use super::{JudgeProtocol, MetricError};
use crate::judge::JudgeClient;
use crate::prompts::geval as prompts;
use crate::protocol::ProtocolState;
use crate::session::JudgeSession;

/// The texts shown to the judge when scoring.
#[derive(Debug, Clone, Default)]
pub struct GEvalInputs {
    pub query: String,
    pub response: String,
    pub retrieval_context: Vec<String>,
    pub ground_truth: Option<String>,
    pub context: Option<String>,
}

/// Single-shot rubric metric.
///
/// The judge first writes evaluation steps for the RAG criteria, then scores
/// the response against them on a 0 to 8 scale. This is the one protocol where
/// the judge supplies the number directly; the reason arrives with the score.
#[derive(Debug)]
pub struct GEval {
    client: JudgeClient,
    parameters: String,
    inputs: GEvalInputs,
    config: MetricConfig,
}

impl GEval {
    pub fn new(
        client: JudgeClient,
        parameters: impl Into<String>,
        inputs: GEvalInputs,
        config: MetricConfig,
    ) -> Self {
        Self {
            client,
            parameters: parameters.into(),
            inputs,
            config,
        }
    }
}

#[async_trait]
impl JudgeProtocol for GEval {
    const KEY: MetricKey = MetricKey::GEval;

    fn client(&self) -> &JudgeClient {
        &self.client
    }

    async fn execute(&self, session: &mut JudgeSession) -> Result<MetricResult, MetricError> {
        let steps = session
            .ask::<StepsReply>(&prompts::generate_evaluation_steps(
                &self.parameters,
                prompts::RAG_CRITERIA,
            ))
            .await?
            .steps;
        session.advance(ProtocolState::Extracted)?;

        let retrieval_context = self.inputs.retrieval_context.join("\n");
        let fields = [
            ("Query", self.inputs.query.as_str()),
            ("LLM response", self.inputs.response.as_str()),
            ("Ground truth", self.inputs.ground_truth.as_deref().unwrap_or_default()),
            ("Context", self.inputs.context.as_deref().unwrap_or_default()),
            ("Retrieval Context", retrieval_context.as_str()),
        ];
        let rubric = session
            .ask::<RubricReply>(&prompts::generate_evaluation_results(
                &steps,
                &fields,
                &self.parameters,
            ))
            .await?;
        session.advance(ProtocolState::Judged)?;

        let raw = rubric
            .score
            .value()
            .map_err(|e| session.fail(MetricError::Parse(e)))?;
        let score = rubric_points(raw);
        session.advance(ProtocolState::Scored)?;
        session.advance(ProtocolState::Done)?;

        let reason = if self.config.include_reason {
            rubric.reason
        } else {
            None
        };
        let evidence = Evidence::builder().steps(steps).build();
        Ok(MetricResult::scored(Self::KEY, score, &self.config, reason, evidence))
    }
}

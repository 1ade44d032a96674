//! Evaluation orchestrator.
//!
//! The evaluator owns a suite of metric settings and the shared judge. For
//! each evaluation it:
//! - Instantiates fresh metric instances bound to the request's inputs
//! - Runs them one at a time in declared order
//! - Isolates failures: a failed metric is logged and left out of the report
//! - Aggregates through the Synthesizer and sums token usage

use std::sync::Arc;
use thiserror::Error;

use ragjudge_core::{
    BasicNormalizer, EvaluationReport, Meteor, MetricKey, MetricResult, MetricSpec, SuiteConfig,
    SuiteError, Synthesizer, TextOverlapScorer, Turn,
};

use crate::embed::Embedder;
use crate::judge::{Judge, JudgeClient};
use crate::metrics::{
    AnswerRelevancy, BertScore, ContextualRelevancy, Faithfulness, GEval, GEvalInputs,
    Hallucination, KnowledgeRetention, Metric, TextMetric,
};
use crate::usage::{LlmUsage, TokenCounter};

/// Errors from building an evaluator.
#[derive(Error, Debug)]
pub enum OrchestratorError {
    #[error("Metric {0} needs a judge but none was provided")]
    JudgeRequired(MetricKey),

    #[error("Metric bert_score needs an embedder but none was provided")]
    EmbedderRequired,

    #[error("Suite error: {0}")]
    Suite(#[from] SuiteError),
}

/// Inputs for one evaluation.
#[derive(Debug, Clone, Default)]
pub struct EvaluationRequest {
    pub query: String,
    pub response: String,
    pub retrieval_context: Vec<String>,

    /// Full conversation for knowledge retention. Empty means the single
    /// (query, response) turn.
    pub turns: Vec<Turn>,

    /// Expected answer. When present it is the reference for the text
    /// metrics instead of the retrieval context.
    pub ground_truth: Option<String>,
}

impl EvaluationRequest {
    pub fn new(
        response: impl Into<String>,
        query: impl Into<String>,
        retrieval_context: Vec<String>,
    ) -> Self {
        Self {
            query: query.into(),
            response: response.into(),
            retrieval_context,
            ..Default::default()
        }
    }

    pub fn with_turns(mut self, turns: Vec<Turn>) -> Self {
        self.turns = turns;
        self
    }

    pub fn with_ground_truth(mut self, ground_truth: impl Into<String>) -> Self {
        self.ground_truth = Some(ground_truth.into());
        self
    }

    fn conversation(&self) -> Vec<Turn> {
        if self.turns.is_empty() {
            vec![Turn::new(self.query.clone(), self.response.clone())]
        } else {
            self.turns.clone()
        }
    }

    fn references(&self) -> Vec<String> {
        match &self.ground_truth {
            Some(truth) => vec![truth.clone()],
            None => self.retrieval_context.clone(),
        }
    }
}

/// Result from one evaluation.
#[derive(Debug)]
pub struct RuntimeResult {
    /// Scores, failures and the aggregate
    pub report: EvaluationReport,

    /// Judge token usage, per metric and in total
    pub usage: LlmUsage,
}

/// Runs a suite of metrics against responses.
///
/// Each call to [`Evaluator::evaluate`] builds its own metric instances, so
/// evaluations share nothing but the read-only judge and embedder.
pub struct Evaluator {
    suite: SuiteConfig,
    judge: Option<JudgeClient>,
    embedder: Option<Arc<dyn Embedder>>,
    synthesizer: Synthesizer,
}

impl std::fmt::Debug for Evaluator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Evaluator")
            .field("suite", &self.suite.name)
            .field("judge", &self.judge)
            .field("embedder", &self.embedder.as_ref().map(|e| e.name().to_string()))
            .finish()
    }
}

impl Evaluator {
    pub fn builder() -> EvaluatorBuilder {
        EvaluatorBuilder::new()
    }

    pub fn suite(&self) -> &SuiteConfig {
        &self.suite
    }

    /// Evaluate one response to a query against its retrieval context.
    pub async fn evaluate(
        &self,
        response: &str,
        query: &str,
        retrieval_context: &[String],
    ) -> RuntimeResult {
        let request = EvaluationRequest::new(response, query, retrieval_context.to_vec());
        self.evaluate_request(&request).await
    }

    /// Evaluate the last turn of a conversation. Knowledge retention sees
    /// every turn; the other metrics see the last one.
    pub async fn evaluate_conversation(
        &self,
        turns: &[Turn],
        retrieval_context: &[String],
    ) -> RuntimeResult {
        let (query, response) = turns
            .last()
            .map(|t| (t.query.as_str(), t.response.as_str()))
            .unwrap_or_default();
        let request = EvaluationRequest::new(response, query, retrieval_context.to_vec())
            .with_turns(turns.to_vec());
        self.evaluate_request(&request).await
    }

    pub async fn evaluate_request(&self, request: &EvaluationRequest) -> RuntimeResult {
        let mut results: Vec<MetricResult> = Vec::new();
        let mut failures: Vec<(MetricKey, String)> = Vec::new();
        let mut usage = LlmUsage::default();

        for spec in self.suite.ordered_metrics() {
            let metric = match self.instantiate(spec, request) {
                Ok(metric) => metric,
                Err(e) => {
                    tracing::error!(metric = %spec.key, error = %e, "Metric could not be built");
                    failures.push((spec.key, e.to_string()));
                    continue;
                }
            };

            tracing::debug!(metric = %spec.key, "Evaluating metric");
            let run = metric.run().await;
            usage.record(run.key, &run.usage);

            match run.outcome {
                Ok(result) => {
                    tracing::debug!(metric = %run.key, score = result.score, "Metric completed");
                    results.push(result);
                }
                Err(e) => {
                    tracing::error!(
                        metric = %run.key,
                        error = %e,
                        state = %run.final_state,
                        "Metric failed"
                    );
                    failures.push((run.key, e.to_string()));
                }
            }
        }

        let report = self.synthesizer.synthesize(results, failures);
        tracing::info!(
            suite = %self.suite.name,
            input_tokens = usage.total.input_tokens,
            output_tokens = usage.total.output_tokens,
            "{}",
            self.synthesizer.summarize(&report)
        );

        RuntimeResult { report, usage }
    }

    /// Build a fresh metric instance bound to the request.
    fn instantiate(
        &self,
        spec: &MetricSpec,
        request: &EvaluationRequest,
    ) -> Result<Metric, OrchestratorError> {
        let config = spec.config(&self.suite.defaults);
        let normalization = self.suite.normalization.clone();

        let metric = match spec.key {
            MetricKey::Faithfulness => Metric::Faithfulness(Faithfulness::new(
                self.judge_for(spec.key)?,
                request.response.clone(),
                request.retrieval_context.clone(),
                config,
            )),
            MetricKey::AnswerRelevancy => Metric::AnswerRelevancy(AnswerRelevancy::new(
                self.judge_for(spec.key)?,
                request.query.clone(),
                request.response.clone(),
                config,
            )),
            MetricKey::ContextualRelevancy => {
                Metric::ContextualRelevancy(ContextualRelevancy::new(
                    self.judge_for(spec.key)?,
                    request.query.clone(),
                    request.retrieval_context.clone(),
                    config,
                ))
            }
            MetricKey::GEval => Metric::GEval(GEval::new(
                self.judge_for(spec.key)?,
                spec.geval_parameters(),
                GEvalInputs {
                    query: request.query.clone(),
                    response: request.response.clone(),
                    retrieval_context: request.retrieval_context.clone(),
                    ground_truth: request.ground_truth.clone(),
                    context: None,
                },
                config,
            )),
            MetricKey::Hallucination => Metric::Hallucination(Hallucination::new(
                self.judge_for(spec.key)?,
                request.response.clone(),
                request.retrieval_context.clone(),
                config,
            )),
            MetricKey::KnowledgeRetention => Metric::KnowledgeRetention(KnowledgeRetention::new(
                self.judge_for(spec.key)?,
                request.conversation(),
                config,
            )),
            MetricKey::BertScore => {
                let embedder = self
                    .embedder
                    .clone()
                    .ok_or(OrchestratorError::EmbedderRequired)?;
                Metric::BertScore(BertScore::new(
                    embedder,
                    request.response.clone(),
                    request.references(),
                    config,
                ))
            }
            MetricKey::Rouge => Metric::Text(TextMetric::new(
                TextOverlapScorer::with_normalizer(
                    spec.ngram_size(),
                    BasicNormalizer::new(),
                    normalization,
                ),
                request.response.clone(),
                request.references(),
                config,
            )),
            MetricKey::Meteor => Metric::Text(TextMetric::new(
                Meteor::with_normalizer(BasicNormalizer::new(), normalization),
                request.response.clone(),
                request.references(),
                config,
            )),
        };

        Ok(metric)
    }

    fn judge_for(&self, key: MetricKey) -> Result<JudgeClient, OrchestratorError> {
        self.judge
            .clone()
            .ok_or(OrchestratorError::JudgeRequired(key))
    }
}

/// Builder for [`Evaluator`].
pub struct EvaluatorBuilder {
    suite: SuiteConfig,
    judge: Option<Arc<dyn Judge>>,
    counter: Option<Arc<dyn TokenCounter>>,
    embedder: Option<Arc<dyn Embedder>>,
}

impl EvaluatorBuilder {
    /// Start from the default RAG suite.
    pub fn new() -> Self {
        Self {
            suite: SuiteConfig::default(),
            judge: None,
            counter: None,
            embedder: None,
        }
    }

    pub fn suite(mut self, suite: SuiteConfig) -> Self {
        self.suite = suite;
        self
    }

    /// Set the judge shared by every judge-protocol metric.
    pub fn judge(mut self, judge: Arc<dyn Judge>) -> Self {
        self.judge = Some(judge);
        self
    }

    /// Override the token counter. Defaults to cl100k_base when available.
    pub fn token_counter(mut self, counter: Arc<dyn TokenCounter>) -> Self {
        self.counter = Some(counter);
        self
    }

    pub fn embedder(mut self, embedder: Arc<dyn Embedder>) -> Self {
        self.embedder = Some(embedder);
        self
    }

    /// Build the evaluator.
    ///
    /// Fails when the suite is invalid, when a metric in it needs a judge and
    /// none was set, or when bert_score is configured without an embedder.
    pub fn build(self) -> Result<Evaluator, OrchestratorError> {
        self.suite.validate()?;

        for spec in &self.suite.metrics {
            if spec.key.requires_judge() && self.judge.is_none() {
                return Err(OrchestratorError::JudgeRequired(spec.key));
            }
            if spec.key == MetricKey::BertScore && self.embedder.is_none() {
                return Err(OrchestratorError::EmbedderRequired);
            }
        }

        let judge = self.judge.map(|judge| {
            let client = JudgeClient::new(judge);
            match self.counter {
                Some(counter) => client.with_counter(counter),
                None => client,
            }
        });

        Ok(Evaluator {
            suite: self.suite,
            judge,
            embedder: self.embedder,
            synthesizer: Synthesizer::new(),
        })
    }
}

impl Default for EvaluatorBuilder {
    fn default() -> Self {
        Self::new()
    }
}

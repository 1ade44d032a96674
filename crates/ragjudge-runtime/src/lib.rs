//! # ragjudge-runtime
//!
//! Judge-backed evaluation for ragjudge.
//!
//! This crate runs the metrics that need a language model acting as a judge,
//! plus BERTScore, and orchestrates a whole suite against one response.
//! Scores are still computed deterministically in `ragjudge-core`; the judge
//! only extracts statements and hands out verdicts.
//!
//! ## Execution model
//!
//! - Metrics run one at a time, in declared order
//! - Within a metric each judge call waits for the previous reply
//! - A failing metric is logged and left out of the report; the rest still run
//! - Token usage is returned with every metric run, including failed ones
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use ragjudge_runtime::{AnthropicJudge, Evaluator};
//!
//! let judge = AnthropicJudge::from_env()?;
//! let evaluator = Evaluator::builder().judge(Arc::new(judge)).build()?;
//!
//! let result = evaluator
//!     .evaluate(
//!         "The Eiffel Tower is in Paris.",
//!         "Where is the Eiffel Tower?",
//!         &["The Eiffel Tower stands on the Champ de Mars in Paris.".to_string()],
//!     )
//!     .await;
//! println!("{:?} ({} tokens)", result.report.aggregate_score, result.usage.total.total());
//! ```

pub mod embed;
pub mod judge;
pub mod metrics;
pub mod orchestrator;
pub mod prompts;
pub mod protocol;
pub mod session;
pub mod usage;

#[cfg(test)]
mod testing;

pub use embed::{cosine_similarity, EmbedError, Embedder};
pub use judge::{CachedJudge, Judge, JudgeClient, JudgeConfig, JudgeError};
pub use metrics::{Metric, MetricError, MetricRun};
pub use orchestrator::{
    EvaluationRequest, Evaluator, EvaluatorBuilder, OrchestratorError, RuntimeResult,
};
pub use protocol::{Protocol, ProtocolState};
pub use session::JudgeSession;
pub use usage::{default_counter, CharEstimateCounter, LlmUsage, TokenCounter, TokenUsage};

#[cfg(feature = "anthropic")]
pub use judge::{AnthropicJudge, ANTHROPIC_API_KEY_ENV};

#[cfg(feature = "tiktoken")]
pub use usage::{Cl100kCounter, TokenizerError};

//! Token accounting for judge calls.
//!
//! Every judge call is measured in model-vocabulary tokens. Usage is returned
//! alongside each metric run; nothing here influences a score.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

use ragjudge_core::MetricKey;

/// Counts tokens in a piece of text.
pub trait TokenCounter: Send + Sync {
    fn count(&self, text: &str) -> u64;

    /// Counter name for logs.
    fn name(&self) -> &str;
}

/// Rough estimate of ~4 characters per token, rounded up.
#[derive(Debug, Clone, Copy, Default)]
pub struct CharEstimateCounter;

impl TokenCounter for CharEstimateCounter {
    fn count(&self, text: &str) -> u64 {
        text.chars().count().div_ceil(4) as u64
    }

    fn name(&self) -> &str {
        "char-estimate"
    }
}

#[cfg(feature = "tiktoken")]
pub use cl100k::{Cl100kCounter, TokenizerError};

#[cfg(feature = "tiktoken")]
mod cl100k {
    use super::TokenCounter;
    use std::sync::Arc;
    use thiserror::Error;

    /// The cl100k_base encoding could not be loaded.
    #[derive(Error, Debug)]
    #[error("Failed to load cl100k_base: {0}")]
    pub struct TokenizerError(pub(super) String);

    /// Exact counts with the cl100k_base encoding.
    #[derive(Clone)]
    pub struct Cl100kCounter {
        bpe: Arc<tiktoken_rs::CoreBPE>,
    }

    impl std::fmt::Debug for Cl100kCounter {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.debug_struct("Cl100kCounter").finish_non_exhaustive()
        }
    }

    impl Cl100kCounter {
        pub fn new() -> Result<Self, TokenizerError> {
            let bpe = tiktoken_rs::cl100k_base().map_err(|e| TokenizerError(e.to_string()))?;
            Ok(Self { bpe: Arc::new(bpe) })
        }
    }

    impl TokenCounter for Cl100kCounter {
        fn count(&self, text: &str) -> u64 {
            self.bpe.encode_ordinary(text).len() as u64
        }

        fn name(&self) -> &str {
            "cl100k_base"
        }
    }
}

/// The best available counter: cl100k_base when compiled in, otherwise the
/// character estimate.
pub fn default_counter() -> Arc<dyn TokenCounter> {
    #[cfg(feature = "tiktoken")]
    {
        match Cl100kCounter::new() {
            Ok(counter) => return Arc::new(counter),
            Err(e) => {
                tracing::warn!(error = %e, "cl100k_base unavailable, estimating tokens");
            }
        }
    }
    Arc::new(CharEstimateCounter)
}

/// Tokens spent by one metric execution.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    /// Prompt tokens sent to the judge
    pub input_tokens: u64,

    /// Reply tokens received from the judge
    pub output_tokens: u64,

    /// Number of judge calls made
    pub judge_calls: u32,
}

impl TokenUsage {
    pub fn total(&self) -> u64 {
        self.input_tokens + self.output_tokens
    }

    pub fn add(&mut self, other: &TokenUsage) {
        self.input_tokens += other.input_tokens;
        self.output_tokens += other.output_tokens;
        self.judge_calls += other.judge_calls;
    }
}

/// Usage across every metric of one evaluation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LlmUsage {
    /// Sum over all metrics
    pub total: TokenUsage,

    /// Per-metric usage, including metrics that failed
    pub per_metric: BTreeMap<MetricKey, TokenUsage>,
}

impl LlmUsage {
    pub fn record(&mut self, key: MetricKey, usage: &TokenUsage) {
        self.total.add(usage);
        self.per_metric.entry(key).or_default().add(usage);
    }
}

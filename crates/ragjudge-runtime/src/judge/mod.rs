//! Judge abstractions for ragjudge-runtime.
//!
//! A judge is a language model used as an automated evaluator. This module
//! defines the trait every judge backend implements, plus the client handle
//! that metrics receive at construction.
//!
//! ## Security
//!
//! Judges that need credentials hold them in `secrecy::SecretString` and
//! never print them through `Debug`.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

use ragjudge_core::MetricKey;

use crate::session::JudgeSession;
use crate::usage::{default_counter, TokenCounter};

mod cache;

#[cfg(feature = "anthropic")]
mod anthropic;

pub use cache::CachedJudge;

#[cfg(feature = "anthropic")]
pub use anthropic::{AnthropicJudge, ANTHROPIC_API_KEY_ENV};

/// Errors from a judge call.
#[derive(Error, Debug)]
pub enum JudgeError {
    #[error("Judge returned an empty reply")]
    EmptyReply,

    #[error("HTTP request failed: {0}")]
    HttpError(String),

    #[error("Rate limit exceeded, retry after {retry_after:?}")]
    RateLimited { retry_after: Option<Duration> },

    #[error("API error: {status} - {message}")]
    ApiError { status: u16, message: String },

    #[error("Response decode error: {0}")]
    DecodeError(String),

    #[error("Timeout after {0:?}")]
    Timeout(Duration),

    #[error("Judge not configured: {0}")]
    NotConfigured(String),

    #[error("Judge failed: {0}")]
    Failed(String),
}

/// Generation settings for judges that talk to a model API.
#[derive(Debug, Clone)]
pub struct JudgeConfig {
    /// Model to use
    pub model: String,

    /// Maximum tokens to generate
    pub max_tokens: u32,

    /// Temperature (0.0 for deterministic)
    pub temperature: f32,

    /// Request timeout
    pub timeout: Duration,

    /// System prompt sent with every request
    pub system_prompt: String,
}

impl Default for JudgeConfig {
    fn default() -> Self {
        Self {
            model: "claude-sonnet-4-5".to_string(),
            max_tokens: 1024,
            temperature: 0.0,
            timeout: Duration::from_secs(60),
            system_prompt: "You are an evaluation judge. Reply with a single JSON object and nothing else."
                .to_string(),
        }
    }
}

/// A language model acting as an evaluator.
///
/// The judge is an opaque text-in/text-out call. It is shared read-only by
/// every metric in an evaluation; implementations must not rely on call order
/// across metrics.
#[async_trait]
pub trait Judge: Send + Sync {
    /// Generate a reply for one prompt.
    async fn generate(&self, prompt: &str) -> Result<String, JudgeError>;

    /// Judge name for logs.
    fn name(&self) -> &str;
}

#[async_trait]
impl<J: Judge + ?Sized> Judge for Arc<J> {
    async fn generate(&self, prompt: &str) -> Result<String, JudgeError> {
        (**self).generate(prompt).await
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

/// Shared handle to a judge and the token counter used to account for it.
///
/// Cloning is cheap; every metric instance receives its own clone.
#[derive(Clone)]
pub struct JudgeClient {
    judge: Arc<dyn Judge>,
    counter: Arc<dyn TokenCounter>,
}

impl std::fmt::Debug for JudgeClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JudgeClient")
            .field("judge", &self.judge.name())
            .field("counter", &self.counter.name())
            .finish()
    }
}

impl JudgeClient {
    /// Wrap a judge with the default token counter.
    pub fn new(judge: Arc<dyn Judge>) -> Self {
        Self {
            judge,
            counter: default_counter(),
        }
    }

    pub fn with_counter(mut self, counter: Arc<dyn TokenCounter>) -> Self {
        self.counter = counter;
        self
    }

    pub fn judge_name(&self) -> &str {
        self.judge.name()
    }

    /// Start a fresh protocol session for one metric execution.
    pub fn session(&self, key: MetricKey) -> JudgeSession {
        JudgeSession::new(Arc::clone(&self.judge), Arc::clone(&self.counter), key)
    }
}

//! A scripted judge for tests.

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use crate::judge::{Judge, JudgeError};

/// Replies with canned text chosen by prompt prefix.
///
/// Routes are checked in insertion order; the first prefix that matches the
/// prompt wins. Prompts with no route get the fallback, or an error when no
/// fallback is set.
#[derive(Default)]
pub struct ScriptedJudge {
    routes: Vec<(String, String)>,
    failing: Vec<String>,
    fallback: Option<String>,
    calls: AtomicUsize,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedJudge {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn route(mut self, prefix: impl Into<String>, reply: impl Into<String>) -> Self {
        self.routes.push((prefix.into(), reply.into()));
        self
    }

    pub fn with_fallback(mut self, reply: impl Into<String>) -> Self {
        self.fallback = Some(reply.into());
        self
    }

    /// Fail every prompt starting with `prefix`. Failures take precedence over routes.
    pub fn fail_on(mut self, prefix: impl Into<String>) -> Self {
        self.failing.push(prefix.into());
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Every prompt received, in order.
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().map(|p| p.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl Judge for ScriptedJudge {
    async fn generate(&self, prompt: &str) -> Result<String, JudgeError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut prompts) = self.prompts.lock() {
            prompts.push(prompt.to_string());
        }

        if self.failing.iter().any(|p| prompt.starts_with(p.as_str())) {
            return Err(JudgeError::Failed("scripted failure".to_string()));
        }

        self.routes
            .iter()
            .find(|(prefix, _)| prompt.starts_with(prefix.as_str()))
            .map(|(_, reply)| reply.clone())
            .or_else(|| self.fallback.clone())
            .ok_or_else(|| JudgeError::Failed(format!("no scripted reply for: {:.60}", prompt)))
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

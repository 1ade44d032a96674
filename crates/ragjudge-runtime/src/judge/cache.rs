//! Caching layer for judge calls.
//!
//! Identical prompts sent to the same judge return the cached reply, which
//! cuts cost when a suite is re-run over the same responses. Token accounting
//! happens in the session, so cached replies are still counted.

use async_trait::async_trait;
use moka::future::Cache;
use std::time::Duration;

use super::{Judge, JudgeError};

/// Judge name and full prompt text.
type CacheKey = (String, String);

/// A judge wrapper that memoizes successful replies.
pub struct CachedJudge<J: Judge> {
    inner: J,
    cache: Cache<CacheKey, String>,
}

impl<J: Judge> CachedJudge<J> {
    /// Create a cache with the given capacity and time-to-live.
    pub fn new(inner: J, max_entries: u64, ttl: Duration) -> Self {
        let cache = Cache::builder()
            .max_capacity(max_entries)
            .time_to_live(ttl)
            .build();

        Self { inner, cache }
    }

    /// Wrap a judge with 10 000 entries kept for an hour.
    pub fn with_defaults(inner: J) -> Self {
        Self::new(inner, 10_000, Duration::from_secs(3600))
    }

    fn key(&self, prompt: &str) -> CacheKey {
        (self.inner.name().to_string(), prompt.to_string())
    }

    pub fn invalidate_all(&self) {
        self.cache.invalidate_all();
    }

    pub fn entry_count(&self) -> u64 {
        self.cache.entry_count()
    }
}

#[async_trait]
impl<J: Judge> Judge for CachedJudge<J> {
    async fn generate(&self, prompt: &str) -> Result<String, JudgeError> {
        let key = self.key(prompt);
        if let Some(hit) = self.cache.get(&key).await {
            tracing::trace!(judge = self.inner.name(), "Judge cache hit");
            return Ok(hit);
        }

        let reply = self.inner.generate(prompt).await?;
        if !reply.trim().is_empty() {
            self.cache.insert(key, reply.clone()).await;
        }
        Ok(reply)
    }

    fn name(&self) -> &str {
        self.inner.name()
    }
}

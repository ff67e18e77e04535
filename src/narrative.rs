//! Narrative generation seam and its cache-backed decorator.
//!
//! No concrete model client lives here. Callers plug in a
//! [`NarrativeGenerator`] and wrap it in [`CachedGenerator`] to reuse earlier
//! responses for identical `(query, context)` inputs.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use crate::cache::ResponseCache;
use crate::config::CacheConfig;
use crate::error::Result;

/// Separator placed between retrieved chunks when building a context string.
pub const CONTEXT_SEPARATOR: &str = "\n\n";

/// Something that turns a query plus retrieved context into narrative text.
#[async_trait]
pub trait NarrativeGenerator: Send + Sync {
    /// Short identifier used in logs.
    fn name(&self) -> &str;

    /// Produce a narrative for `query` grounded in `context`.
    async fn generate(&self, query: &str, context: &str) -> Result<String>;
}

/// Join retrieved chunks into the context string used for generation and cache keys.
pub fn context_from_chunks<S: AsRef<str>>(chunks: &[S]) -> String {
    chunks
        .iter()
        .map(AsRef::as_ref)
        .collect::<Vec<_>>()
        .join(CONTEXT_SEPARATOR)
}

/// Decorator that consults a [`ResponseCache`] before delegating to `inner`.
///
/// Only successful generations are stored. With caching disabled the
/// decorator is a pass-through.
pub struct CachedGenerator<G> {
    inner: G,
    cache: Arc<ResponseCache>,
    enabled: bool,
}

impl<G: NarrativeGenerator> CachedGenerator<G> {
    pub fn new(inner: G, cache: Arc<ResponseCache>) -> Self {
        Self {
            inner,
            cache,
            enabled: true,
        }
    }

    /// Wrap `inner` with the cache described by `config`: directory resolved
    /// against `root`, TTL applied, and `enabled` honoured.
    pub fn from_config(inner: G, root: &Path, config: &CacheConfig) -> Self {
        let cache = Arc::new(ResponseCache::from_config(root, config));
        Self::new(inner, cache).with_enabled(config.enabled)
    }

    /// Toggle cache use.
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn cache(&self) -> &Arc<ResponseCache> {
        &self.cache
    }

    pub fn inner(&self) -> &G {
        &self.inner
    }
}

impl<G> std::fmt::Debug for CachedGenerator<G> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CachedGenerator")
            .field("cache_dir", &self.cache.dir())
            .field("enabled", &self.enabled)
            .finish()
    }
}

#[async_trait]
impl<G: NarrativeGenerator> NarrativeGenerator for CachedGenerator<G> {
    fn name(&self) -> &str {
        self.inner.name()
    }

    async fn generate(&self, query: &str, context: &str) -> Result<String> {
        if !self.enabled {
            return self.inner.generate(query, context).await;
        }
        if let Some(hit) = self.cache.get(query, context) {
            debug!(generator = %self.inner.name(), "Response cache hit");
            return Ok(hit);
        }
        let response = self.inner.generate(query, context).await?;
        self.cache.set(query, context, &response);
        Ok(response)
    }
}

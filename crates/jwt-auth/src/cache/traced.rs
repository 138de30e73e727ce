//! Traced cache wrapper for observability

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{Instrument, Span};

use super::error::{CacheError, CacheResult};
use super::key::CacheKey;
use super::provider::CacheProvider;

/// Wrapper that adds a span per operation to any [`CacheProvider`]
///
/// Only key digests and sizes are recorded. Cached values are key material
/// and are never logged.
#[derive(Clone)]
pub struct TracedCache<C> {
    inner: C,
    service_name: String,
}

impl<C: fmt::Debug> fmt::Debug for TracedCache<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TracedCache")
            .field("inner", &self.inner)
            .field("service_name", &self.service_name)
            .finish()
    }
}

impl<C> TracedCache<C> {
    pub fn new(cache: C, service_name: impl Into<String>) -> Self {
        Self {
            inner: cache,
            service_name: service_name.into(),
        }
    }

    pub const fn inner(&self) -> &C {
        &self.inner
    }

    fn span(&self, operation: &'static str, key: &CacheKey) -> Span {
        tracing::debug_span!(
            "cache",
            cache.operation = operation,
            cache.key = key.digest(),
            service = %self.service_name,
        )
    }
}

fn log_failure(operation: &'static str, key: &CacheKey, error: &CacheError) {
    tracing::warn!(
        cache.operation = operation,
        cache.key = key.digest(),
        error = %error,
        "Cache operation failed",
    );
}

#[async_trait]
impl<C: CacheProvider> CacheProvider for TracedCache<C> {
    async fn get(&self, key: &CacheKey) -> CacheResult<Option<Vec<u8>>> {
        let result = self.inner.get(key).instrument(self.span("get", key)).await;

        match &result {
            Ok(Some(document)) => {
                tracing::debug!(cache.result = "hit", cache.size_bytes = document.len());
            }
            Ok(None) => tracing::debug!(cache.result = "miss"),
            Err(e) => log_failure("get", key, e),
        }
        result
    }

    async fn set(&self, key: &CacheKey, value: &[u8], ttl: Option<Duration>) -> CacheResult<()> {
        let span = self.span("set", key);
        span.in_scope(|| {
            tracing::debug!(
                cache.size_bytes = value.len(),
                cache.ttl_secs = ttl.map(|d| d.as_secs()),
            );
        });

        let result = self.inner.set(key, value, ttl).instrument(span).await;
        if let Err(e) = &result {
            log_failure("set", key, e);
        }
        result
    }

    async fn exists(&self, key: &CacheKey) -> CacheResult<bool> {
        self.inner
            .exists(key)
            .instrument(self.span("exists", key))
            .await
    }

    async fn delete(&self, key: &CacheKey) -> CacheResult<bool> {
        let result = self
            .inner
            .delete(key)
            .instrument(self.span("delete", key))
            .await;

        match &result {
            Ok(deleted) => tracing::debug!(cache.key = key.digest(), cache.deleted = deleted),
            Err(e) => log_failure("delete", key, e),
        }
        result
    }
}

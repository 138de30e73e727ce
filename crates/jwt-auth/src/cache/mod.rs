//! Cache abstraction for fetched verification keys
//!
//! The key provider stores key material fetched from a key URL here, under a
//! key derived from the SHA-256 digest of that URL. Any backend implementing
//! [`CacheProvider`] can be plugged in.
//!
//! # Available Backends
//!
//! - [`NoopCache`] - No-op implementation (every cold lookup fetches)
//! - [`InMemoryCache`] - Thread-safe in-memory cache with optional TTL
//!
//! # Observability
//!
//! Wrap any cache with [`TracedCache`] to add tracing spans and logging.
//!
//! # Key Staleness
//!
//! Entries carry no expiry unless [`CacheConfig::ttl`] is set. A key rotated
//! at the key URL is not picked up until the entry is deleted or the process
//! restarts.

mod config;
mod error;
mod key;
mod memory;
mod noop;
mod provider;
mod traced;

use std::sync::Arc;

use crate::constants::SERVICE_NAME;

pub use config::{CacheBackend, CacheConfig, DEFAULT_MAX_ENTRIES, DEFAULT_MAX_VALUE_SIZE};
pub use error::{CacheError, CacheResult};
pub use key::CacheKey;
pub use memory::InMemoryCache;
pub use noop::NoopCache;
pub use provider::CacheProvider;
pub use traced::TracedCache;

/// Create a cache provider based on configuration
#[must_use]
pub fn create_cache(config: &CacheConfig) -> Arc<dyn CacheProvider> {
    match config.backend {
        CacheBackend::Noop => Arc::new(NoopCache::new()),
        CacheBackend::Memory => {
            let mut cache = InMemoryCache::new().with_max_value_size(config.max_value_size);

            if let Some(ttl) = config.ttl {
                cache = cache.with_default_ttl(ttl);
            }

            if let Some(max) = config.max_entries {
                cache = cache.with_max_entries(max);
            }

            Arc::new(TracedCache::new(cache, SERVICE_NAME))
        }
    }
}

#[cfg(test)]
pub(crate) fn test_key(name: &str) -> CacheKey {
    let url = format!("https://issuer.example.com/keys/{name}");
    CacheKey::verification_key(&url::Url::parse(&url).unwrap())
}

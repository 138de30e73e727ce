//! Cache provider trait definition

use std::time::Duration;

use async_trait::async_trait;

use super::error::CacheResult;
use super::key::CacheKey;

/// Async cache provider trait
///
/// The storage backend behind the key provider. Implementors own eviction;
/// the authentication pipeline only reads and writes. Hosts call
/// [`CacheProvider::delete`] to force a refetch after a key rotation.
#[async_trait]
pub trait CacheProvider: Send + Sync {
    /// Get a value from cache by key
    async fn get(&self, key: &CacheKey) -> CacheResult<Option<Vec<u8>>>;

    /// Set a value in cache with optional TTL
    async fn set(&self, key: &CacheKey, value: &[u8], ttl: Option<Duration>) -> CacheResult<()>;

    /// Check if a live entry exists
    async fn exists(&self, key: &CacheKey) -> CacheResult<bool>;

    /// Delete a key from cache, returning whether it was present
    async fn delete(&self, key: &CacheKey) -> CacheResult<bool>;
}

//! In-memory key document store

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use parking_lot::RwLock;

use super::config::DEFAULT_MAX_VALUE_SIZE;
use super::error::{CacheError, CacheResult};
use super::key::CacheKey;
use super::provider::CacheProvider;

struct Entry {
    document: Vec<u8>,
    stored_at: Instant,
    expires_at: Option<Instant>,
}

impl Entry {
    fn is_live(&self, now: Instant) -> bool {
        self.expires_at.is_none_or(|exp| now <= exp)
    }
}

/// Thread-safe in-memory cache
///
/// Entries stored without a TTL (and without a default TTL) live until they
/// are deleted or evicted by `max_entries`.
/// When full, expired entries are dropped first, then the oldest entry.
///
/// Clones share the same store. Concurrent writers to the same key are
/// last-write-wins.
#[derive(Clone)]
pub struct InMemoryCache {
    entries: Arc<RwLock<HashMap<CacheKey, Entry>>>,
    max_entries: Option<usize>,
    max_value_size: usize,
    default_ttl: Option<Duration>,
}

impl std::fmt::Debug for InMemoryCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryCache")
            .field("max_entries", &self.max_entries)
            .field("max_value_size", &self.max_value_size)
            .field("default_ttl", &self.default_ttl)
            .field("entry_count", &self.entries.read().len())
            .finish_non_exhaustive()
    }
}

impl Default for InMemoryCache {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryCache {
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: Arc::new(RwLock::new(HashMap::new())),
            max_entries: None,
            max_value_size: DEFAULT_MAX_VALUE_SIZE,
            default_ttl: None,
        }
    }

    #[must_use]
    pub const fn with_max_entries(mut self, max: usize) -> Self {
        self.max_entries = Some(max);
        self
    }

    #[must_use]
    pub const fn with_max_value_size(mut self, max: usize) -> Self {
        self.max_value_size = max;
        self
    }

    #[must_use]
    pub const fn with_default_ttl(mut self, ttl: Duration) -> Self {
        self.default_ttl = Some(ttl);
        self
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.entries.read().len()
    }

    // Caller holds the write lock and is about to insert a new key
    fn make_room(entries: &mut HashMap<CacheKey, Entry>, max: usize, now: Instant) {
        if entries.len() < max {
            return;
        }
        entries.retain(|_, e| e.is_live(now));
        while entries.len() >= max {
            let Some(oldest) = entries
                .iter()
                .min_by_key(|(_, e)| e.stored_at)
                .map(|(k, _)| k.clone())
            else {
                break;
            };
            tracing::debug!(key = %oldest, "Evicting oldest cached key document");
            entries.remove(&oldest);
        }
    }
}

#[async_trait]
impl CacheProvider for InMemoryCache {
    async fn get(&self, key: &CacheKey) -> CacheResult<Option<Vec<u8>>> {
        let now = Instant::now();
        let found = {
            let entries = self.entries.read();
            entries.get(key).map(|e| e.is_live(now).then(|| e.document.clone()))
        };

        match found {
            Some(Some(document)) => Ok(Some(document)),
            Some(None) => {
                let mut entries = self.entries.write();
                if entries.get(key).is_some_and(|e| !e.is_live(now)) {
                    entries.remove(key);
                }
                Ok(None)
            }
            None => Ok(None),
        }
    }

    async fn set(&self, key: &CacheKey, value: &[u8], ttl: Option<Duration>) -> CacheResult<()> {
        if value.len() > self.max_value_size {
            return Err(CacheError::ValueTooLarge {
                size: value.len(),
                max: self.max_value_size,
            });
        }

        let now = Instant::now();
        let entry = Entry {
            document: value.to_vec(),
            stored_at: now,
            expires_at: ttl.or(self.default_ttl).map(|d| now + d),
        };

        let mut entries = self.entries.write();
        if let Some(max) = self.max_entries
            && !entries.contains_key(key)
        {
            Self::make_room(&mut entries, max, now);
        }
        entries.insert(key.clone(), entry);
        Ok(())
    }

    async fn exists(&self, key: &CacheKey) -> CacheResult<bool> {
        let now = Instant::now();
        Ok(self.entries.read().get(key).is_some_and(|e| e.is_live(now)))
    }

    async fn delete(&self, key: &CacheKey) -> CacheResult<bool> {
        Ok(self.entries.write().remove(key).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::test_key as key;

    const PEM: &[u8] = b"-----BEGIN PUBLIC KEY-----\nMFkw\n-----END PUBLIC KEY-----\n";

    #[tokio::test]
    async fn test_store_and_read_document() {
        let cache = InMemoryCache::new();
        let key = key("key.pem");

        cache.set(&key, PEM, None).await.unwrap();

        assert_eq!(cache.get(&key).await.unwrap(), Some(PEM.to_vec()));
    }

    #[tokio::test]
    async fn test_missing_document() {
        let cache = InMemoryCache::new();
        assert!(cache.get(&key("missing")).await.unwrap().is_none());
        assert!(!cache.exists(&key("missing")).await.unwrap());
    }

    #[tokio::test]
    async fn test_document_without_ttl_persists() {
        let cache = InMemoryCache::new();
        let key = key("key.pem");

        cache.set(&key, PEM, None).await.unwrap();
        tokio::time::sleep(Duration::from_millis(20)).await;

        assert_eq!(cache.get(&key).await.unwrap(), Some(PEM.to_vec()));
    }

    #[tokio::test]
    async fn test_explicit_ttl_expires() {
        let cache = InMemoryCache::new();
        let key = key("key.pem");

        cache
            .set(&key, PEM, Some(Duration::from_millis(10)))
            .await
            .unwrap();
        assert!(cache.get(&key).await.unwrap().is_some());

        tokio::time::sleep(Duration::from_millis(25)).await;

        assert!(cache.get(&key).await.unwrap().is_none());
        assert!(!cache.exists(&key).await.unwrap());
        assert_eq!(cache.len(), 0);
    }

    #[tokio::test]
    async fn test_default_ttl_applies() {
        let cache = InMemoryCache::new().with_default_ttl(Duration::from_millis(10));
        let key = key("key.pem");

        cache.set(&key, PEM, None).await.unwrap();
        tokio::time::sleep(Duration::from_millis(25)).await;

        assert!(cache.get(&key).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_full_cache_evicts_oldest() {
        let cache = InMemoryCache::new().with_max_entries(2);

        cache.set(&key("first"), b"1", None).await.unwrap();
        tokio::time::sleep(Duration::from_millis(2)).await;
        cache.set(&key("second"), b"2", None).await.unwrap();
        tokio::time::sleep(Duration::from_millis(2)).await;
        cache.set(&key("third"), b"3", None).await.unwrap();

        assert!(cache.get(&key("first")).await.unwrap().is_none());
        assert!(cache.get(&key("second")).await.unwrap().is_some());
        assert!(cache.get(&key("third")).await.unwrap().is_some());
        assert_eq!(cache.len(), 2);
    }

    #[tokio::test]
    async fn test_full_cache_drops_expired_before_live() {
        let cache = InMemoryCache::new().with_max_entries(2);

        cache.set(&key("live"), b"1", None).await.unwrap();
        cache
            .set(&key("stale"), b"2", Some(Duration::from_millis(5)))
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(15)).await;
        cache.set(&key("new"), b"3", None).await.unwrap();

        assert!(cache.get(&key("live")).await.unwrap().is_some());
        assert!(cache.get(&key("new")).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_overwrite_is_last_write_wins() {
        let cache = InMemoryCache::new().with_max_entries(1);
        let key = key("key.pem");

        cache.set(&key, b"first", None).await.unwrap();
        cache.set(&key, b"second", None).await.unwrap();

        assert_eq!(cache.get(&key).await.unwrap(), Some(b"second".to_vec()));
        assert_eq!(cache.len(), 1);
    }

    #[tokio::test]
    async fn test_delete_forces_refetch() {
        let cache = InMemoryCache::new();

        cache.set(&key("a"), PEM, None).await.unwrap();
        cache.set(&key("b"), PEM, None).await.unwrap();

        assert!(cache.delete(&key("a")).await.unwrap());
        assert!(!cache.delete(&key("a")).await.unwrap());

        assert!(!cache.exists(&key("a")).await.unwrap());
        assert!(cache.get(&key("a")).await.unwrap().is_none());
        assert!(cache.get(&key("b")).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_clone_shares_state() {
        let cache = InMemoryCache::new();
        let shared = cache.clone();

        cache.set(&key("key.pem"), PEM, None).await.unwrap();

        assert_eq!(shared.get(&key("key.pem")).await.unwrap(), Some(PEM.to_vec()));
        assert_eq!(shared.len(), 1);
    }

    #[tokio::test]
    async fn test_oversized_document_rejected() {
        let cache = InMemoryCache::new().with_max_value_size(100);

        let err = cache.set(&key("jwks"), &[b'x'; 200], None).await.unwrap_err();
        assert!(matches!(err, CacheError::ValueTooLarge { size: 200, max: 100 }));

        cache.set(&key("jwks"), &[b'x'; 100], None).await.unwrap();
        assert!(cache.get(&key("jwks")).await.unwrap().is_some());
    }

    #[test]
    fn test_debug_impl() {
        let cache = InMemoryCache::new()
            .with_max_entries(100)
            .with_max_value_size(1024)
            .with_default_ttl(Duration::from_secs(60));
        let debug_str = format!("{cache:?}");
        assert!(debug_str.contains("InMemoryCache"));
        assert!(debug_str.contains("100"));
        assert!(debug_str.contains("1024"));
    }
}

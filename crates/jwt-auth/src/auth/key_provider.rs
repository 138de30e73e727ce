//! Verification key resolution
//!
//! A static key always wins. Otherwise the key document is read from the
//! cache under a digest of its URL, and fetched (then cached) on a miss.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use url::Url;

use super::config::SecurityConfig;
use super::error::{AuthError, Result};
use crate::cache::{CacheKey, CacheProvider};

/// Where the key material came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyOrigin {
    Static,
    Cached,
    Fetched,
}

impl KeyOrigin {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Static => "static",
            Self::Cached => "cached",
            Self::Fetched => "fetched",
        }
    }
}

/// Key material used to verify token signatures
#[derive(Clone, PartialEq, Eq)]
pub struct VerificationKey {
    material: String,
    origin: KeyOrigin,
}

impl VerificationKey {
    #[must_use]
    pub fn new(material: impl Into<String>, origin: KeyOrigin) -> Self {
        Self {
            material: material.into(),
            origin,
        }
    }

    #[must_use]
    pub fn material(&self) -> &str {
        &self.material
    }

    #[must_use]
    pub const fn origin(&self) -> KeyOrigin {
        self.origin
    }
}

impl fmt::Debug for VerificationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VerificationKey")
            .field("origin", &self.origin)
            .field("len", &self.material.len())
            .finish_non_exhaustive()
    }
}

/// Retrieves a key document from a URL
#[async_trait]
pub trait KeyFetcher: Send + Sync {
    async fn fetch(&self, url: &Url) -> Result<Vec<u8>>;
}

/// Fetches key documents over HTTP(S) or from `file://` URLs
#[derive(Debug, Clone)]
pub struct HttpKeyFetcher {
    client: reqwest::Client,
    timeout: Duration,
}

impl HttpKeyFetcher {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AuthError::Config(format!("Failed to build HTTP client: {e}")))?;
        Ok(Self { client, timeout })
    }

    async fn fetch_http(&self, url: &Url) -> Result<Vec<u8>> {
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| AuthError::KeyUnavailable(format!("request to {url} failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AuthError::KeyUnavailable(format!(
                "{url} responded with {status}"
            )));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| AuthError::KeyUnavailable(format!("reading {url} failed: {e}")))?;
        Ok(body.to_vec())
    }

    async fn fetch_file(&self, url: &Url) -> Result<Vec<u8>> {
        let path = url
            .to_file_path()
            .map_err(|()| AuthError::KeyUnavailable(format!("{url} is not a local file path")))?;

        tokio::time::timeout(self.timeout, tokio::fs::read(&path))
            .await
            .map_err(|_| AuthError::KeyUnavailable(format!("reading {url} timed out")))?
            .map_err(|e| AuthError::KeyUnavailable(format!("reading {url} failed: {e}")))
    }
}

#[async_trait]
impl KeyFetcher for HttpKeyFetcher {
    async fn fetch(&self, url: &Url) -> Result<Vec<u8>> {
        match url.scheme() {
            "http" | "https" => self.fetch_http(url).await,
            "file" => self.fetch_file(url).await,
            other => Err(AuthError::KeyUnavailable(format!(
                "unsupported key URL scheme '{other}'"
            ))),
        }
    }
}

/// Supplies the key for the current verification
pub struct KeyProvider {
    static_key: Option<String>,
    key_url: Option<Url>,
    cache: Arc<dyn CacheProvider>,
    fetcher: Arc<dyn KeyFetcher>,
    cache_ttl: Option<Duration>,
}

impl fmt::Debug for KeyProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyProvider")
            .field("has_static_key", &self.static_key.is_some())
            .field("key_url", &self.key_url)
            .field("cache_ttl", &self.cache_ttl)
            .finish_non_exhaustive()
    }
}

impl KeyProvider {
    #[must_use]
    pub fn new(
        config: &SecurityConfig,
        cache: Arc<dyn CacheProvider>,
        fetcher: Arc<dyn KeyFetcher>,
    ) -> Self {
        Self {
            static_key: config.static_key().map(str::to_owned),
            key_url: config.key_url.clone(),
            cache,
            fetcher,
            cache_ttl: None,
        }
    }

    /// Expire cached key documents after `ttl`
    #[must_use]
    pub const fn with_cache_ttl(mut self, ttl: Option<Duration>) -> Self {
        self.cache_ttl = ttl;
        self
    }

    /// Key material for the current verification.
    ///
    /// Fails with [`AuthError::KeyUnavailable`] when the document cannot be
    /// fetched. Cache failures are logged and bypassed.
    pub async fn public_key(&self) -> Result<VerificationKey> {
        if let Some(key) = &self.static_key {
            return Ok(VerificationKey::new(key.clone(), KeyOrigin::Static));
        }

        let url = self.key_url.as_ref().ok_or_else(|| {
            AuthError::Config("neither a static key nor a key URL is configured".into())
        })?;
        let cache_key = CacheKey::verification_key(url);

        if let Some(material) = self.lookup(&cache_key).await {
            return Ok(VerificationKey::new(material, KeyOrigin::Cached));
        }

        let material = self.fetch(url).await?;

        if let Err(e) = self
            .cache
            .set(&cache_key, material.as_bytes(), self.cache_ttl)
            .await
        {
            tracing::warn!(
                cache.key = %cache_key,
                error = %e,
                "Failed to cache verification key"
            );
        }

        Ok(VerificationKey::new(material, KeyOrigin::Fetched))
    }

    async fn lookup(&self, cache_key: &CacheKey) -> Option<String> {
        match self.cache.get(cache_key).await {
            Ok(Some(bytes)) => match String::from_utf8(bytes) {
                Ok(material) if !material.is_empty() => {
                    tracing::debug!(cache.result = "hit", cache.key = %cache_key, "Verification key cache hit");
                    #[cfg(feature = "metrics")]
                    crate::observability::record_key_cache("hit");
                    Some(material)
                }
                _ => {
                    tracing::warn!(cache.key = %cache_key, "Ignoring unreadable cached verification key");
                    #[cfg(feature = "metrics")]
                    crate::observability::record_key_cache("error");
                    None
                }
            },
            Ok(None) => {
                tracing::debug!(cache.result = "miss", cache.key = %cache_key, "Verification key cache miss");
                #[cfg(feature = "metrics")]
                crate::observability::record_key_cache("miss");
                None
            }
            Err(e) => {
                tracing::warn!(
                    cache.key = %cache_key,
                    error = %e,
                    "Cache get failed, fetching verification key"
                );
                #[cfg(feature = "metrics")]
                crate::observability::record_key_cache("error");
                None
            }
        }
    }

    async fn fetch(&self, url: &Url) -> Result<String> {
        let result = self.fetcher.fetch(url).await.and_then(|bytes| {
            let material = String::from_utf8(bytes).map_err(|_| {
                AuthError::KeyUnavailable(format!("key document at {url} is not UTF-8"))
            })?;
            if material.trim().is_empty() {
                return Err(AuthError::KeyUnavailable(format!(
                    "key document at {url} is empty"
                )));
            }
            Ok(material)
        });

        match &result {
            Ok(_) => {
                tracing::info!(key_url = %url, "Fetched verification key");
                #[cfg(feature = "metrics")]
                crate::observability::record_key_fetch("success");
            }
            Err(_) => {
                #[cfg(feature = "metrics")]
                crate::observability::record_key_fetch("error");
            }
        }

        result
    }
}

//! Authentication orchestration
//!
//! Drives one attempt: key lookup, verification, identity projection, and the
//! single status write on the token.

use std::sync::Arc;

use super::config::{ClaimMapping, SecurityConfig};
use super::error::{AuthError, Result};
use super::identity::{Identity, RoleResolver, StaticRoleResolver};
use super::key_provider::{HttpKeyFetcher, KeyFetcher, KeyProvider};
use super::locator::TokenLocator;
use super::mapper::ClaimsToIdentityMapper;
use super::request::RequestView;
use super::token::{EncodedToken, FailureReason, JsonWebToken};
use super::verifier::TokenVerifier;
use crate::cache::{CacheProvider, create_cache};
use crate::config::Config;

enum Attempt {
    Authenticated(Box<Identity>),
    Expired,
    Rejected,
    Broken(AuthError),
}

impl Attempt {
    #[cfg(feature = "metrics")]
    const fn label(&self) -> &'static str {
        match self {
            Self::Authenticated(_) => "success",
            Self::Expired => "expired",
            Self::Rejected => "invalid",
            Self::Broken(AuthError::KeyUnavailable(_)) => "key_unavailable",
            Self::Broken(AuthError::Config(_)) => "config_error",
        }
    }
}

/// Authenticates [`JsonWebToken`]s
pub struct JwtAuthenticationProvider {
    name: String,
    locator: TokenLocator,
    keys: KeyProvider,
    verifier: TokenVerifier,
    mapper: ClaimsToIdentityMapper,
}

impl std::fmt::Debug for JwtAuthenticationProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtAuthenticationProvider")
            .field("name", &self.name)
            .field("locator", &self.locator)
            .field("keys", &self.keys)
            .field("verifier", &self.verifier)
            .finish_non_exhaustive()
    }
}

impl JwtAuthenticationProvider {
    /// Validate the settings and wire the collaborators.
    ///
    /// Fails if the security settings are incomplete or a mapped role name
    /// does not resolve.
    pub fn new(
        security: &SecurityConfig,
        mapping: ClaimMapping,
        cache: Arc<dyn CacheProvider>,
        fetcher: Arc<dyn KeyFetcher>,
        resolver: Arc<dyn RoleResolver>,
    ) -> Result<Self> {
        security.validate()?;

        let mapper = ClaimsToIdentityMapper::new(mapping, resolver, security.provider_name.clone());
        mapper.validate()?;

        Ok(Self {
            name: security.provider_name.clone(),
            locator: TokenLocator::new(security.token_sources.clone()),
            keys: KeyProvider::new(security, cache, fetcher),
            verifier: TokenVerifier::new(security),
            mapper,
        })
    }

    /// Build from loaded configuration with the bundled cache, HTTP fetcher
    /// and static role list.
    pub fn from_config(config: &Config) -> Result<Self> {
        let fetcher = HttpKeyFetcher::new(config.security.key_fetch_timeout)?;
        let provider = Self::new(
            &config.security,
            config.claim_mapping.clone(),
            create_cache(&config.cache),
            Arc::new(fetcher),
            Arc::new(StaticRoleResolver::new(config.roles.iter().cloned())),
        )?;
        Ok(provider.with_key_cache_ttl(config.cache.ttl))
    }

    #[must_use]
    pub fn with_key_cache_ttl(mut self, ttl: Option<std::time::Duration>) -> Self {
        self.keys = self.keys.with_cache_ttl(ttl);
        self
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub const fn locator(&self) -> &TokenLocator {
        &self.locator
    }

    /// Resolve a token that carries credentials.
    ///
    /// Tokens without credentials are left untouched. Rejected tokens end as
    /// `WrongCredentials` with `Ok(())`. Key and configuration failures also
    /// mark the token `WrongCredentials` but are returned as errors.
    pub async fn authenticate(&self, token: &mut JsonWebToken) -> Result<()> {
        if !token.needs_authentication() {
            return Ok(());
        }
        let Some(encoded) = token.take_credentials() else {
            return Ok(());
        };

        #[cfg(feature = "metrics")]
        let started = std::time::Instant::now();

        let attempt = self.attempt(encoded).await;

        #[cfg(feature = "metrics")]
        crate::observability::record_attempt(attempt.label(), started.elapsed());

        match attempt {
            Attempt::Authenticated(identity) => {
                token.succeed(*identity);
                Ok(())
            }
            Attempt::Expired | Attempt::Rejected => {
                token.fail(FailureReason::WrongCredentials);
                Ok(())
            }
            Attempt::Broken(e) => {
                let reason = if e.is_key_unavailable() {
                    FailureReason::KeyUnavailable
                } else {
                    FailureReason::Configuration
                };
                token.fail(reason);
                Err(e)
            }
        }
    }

    /// Locate and authenticate in one step
    pub async fn authenticate_request(&self, request: &impl RequestView) -> Result<JsonWebToken> {
        let mut token = JsonWebToken::new();
        if token.update_credentials(request, &self.locator) {
            self.authenticate(&mut token).await?;
        }
        Ok(token)
    }

    // The encoded token is dropped when this returns
    async fn attempt(&self, encoded: EncodedToken) -> Attempt {
        let key = match self.keys.public_key().await {
            Ok(key) => key,
            Err(e) => {
                tracing::error!(provider = %self.name, error = %e, "Cannot obtain verification key");
                return Attempt::Broken(e);
            }
        };

        let claims = match self.verifier.verify(&encoded, &key) {
            Ok(claims) => claims,
            Err(e) if !e.is_anomaly() => {
                tracing::debug!(provider = %self.name, "Token expired");
                return Attempt::Expired;
            }
            Err(e) => {
                tracing::warn!(
                    provider = %self.name,
                    reason = e.reason_code(),
                    key_origin = key.origin().as_str(),
                    "Rejected token"
                );
                return Attempt::Rejected;
            }
        };

        match self.mapper.project(claims) {
            Ok(identity) => {
                tracing::debug!(
                    provider = %self.name,
                    account = identity.account_identifier(),
                    roles = identity.roles().len(),
                    "Token authenticated"
                );
                Attempt::Authenticated(Box::new(identity))
            }
            Err(e) => {
                tracing::error!(provider = %self.name, error = %e, "Cannot map claims to an identity");
                Attempt::Broken(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::fmt::Write as _;
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::time::Duration;

    use async_trait::async_trait;
    use jsonwebtoken::{Algorithm, EncodingKey, Header, encode, get_current_timestamp};
    use parking_lot::Mutex;
    use serde_json::{Value, json};
    use tracing::field::{Field, Visit};
    use tracing::{Event, Level, Subscriber};
    use tracing_subscriber::layer::{Context, Layer, SubscriberExt};
    use url::Url;

    use super::*;
    use crate::auth::config::TokenSource;
    use crate::auth::request::RequestParts;
    use crate::auth::token::AuthenticationStatus;
    use crate::cache::{CacheKey, CacheResult, InMemoryCache};

    const SECRET: &str = "test-secret-key-at-least-32-bytes-long";

    #[derive(Clone, Default)]
    struct Recorded(Arc<Mutex<Vec<(Level, String)>>>);

    impl Recorded {
        fn levels(&self) -> Vec<Level> {
            self.0.lock().iter().map(|(level, _)| *level).collect()
        }

        fn text(&self) -> String {
            self.0
                .lock()
                .iter()
                .map(|(_, line)| line.as_str())
                .collect::<Vec<_>>()
                .join("\n")
        }
    }

    struct LineVisitor(String);

    impl Visit for LineVisitor {
        fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
            let _ = write!(self.0, "{}={value:?} ", field.name());
        }
    }

    impl<S: Subscriber> Layer<S> for Recorded {
        fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
            let mut visitor = LineVisitor(String::new());
            event.record(&mut visitor);
            self.0.lock().push((*event.metadata().level(), visitor.0));
        }
    }

    fn with_recorded_logs<T>(f: impl FnOnce() -> T) -> (T, Recorded) {
        let recorded = Recorded::default();
        let subscriber = tracing_subscriber::registry().with(recorded.clone());
        let out = tracing::subscriber::with_default(subscriber, f);
        (out, recorded)
    }

    #[derive(Default)]
    struct CountingCache {
        calls: AtomicU64,
    }

    #[async_trait]
    impl CacheProvider for CountingCache {
        async fn get(&self, _key: &CacheKey) -> CacheResult<Option<Vec<u8>>> {
            self.calls.fetch_add(1, Ordering::Relaxed);
            Ok(None)
        }

        async fn set(&self, _key: &CacheKey, _value: &[u8], _ttl: Option<Duration>) -> CacheResult<()> {
            self.calls.fetch_add(1, Ordering::Relaxed);
            Ok(())
        }

        async fn exists(&self, _key: &CacheKey) -> CacheResult<bool> {
            self.calls.fetch_add(1, Ordering::Relaxed);
            Ok(false)
        }

        async fn delete(&self, _key: &CacheKey) -> CacheResult<bool> {
            self.calls.fetch_add(1, Ordering::Relaxed);
            Ok(false)
        }
    }

    struct StubFetcher {
        calls: AtomicU64,
        body: Option<String>,
    }

    impl StubFetcher {
        fn serving(body: &str) -> Self {
            Self {
                calls: AtomicU64::new(0),
                body: Some(body.to_string()),
            }
        }

        fn unreachable() -> Self {
            Self {
                calls: AtomicU64::new(0),
                body: None,
            }
        }
    }

    #[async_trait]
    impl KeyFetcher for StubFetcher {
        async fn fetch(&self, url: &Url) -> Result<Vec<u8>> {
            self.calls.fetch_add(1, Ordering::Relaxed);
            self.body
                .as_ref()
                .map(|b| b.as_bytes().to_vec())
                .ok_or_else(|| AuthError::KeyUnavailable(format!("{url} unreachable")))
        }
    }

    fn now() -> i64 {
        get_current_timestamp() as i64
    }

    fn sign(claims: &Value) -> String {
        encode(
            &Header::new(Algorithm::HS256),
            claims,
            &EncodingKey::from_secret(SECRET.as_bytes()),
        )
        .unwrap()
    }

    fn security() -> SecurityConfig {
        SecurityConfig::new(vec![Algorithm::HS256])
            .with_key(SECRET)
            .with_token_sources(vec![TokenSource::header("X-Jwt"), TokenSource::cookie("jwt")])
    }

    fn mapping() -> ClaimMapping {
        ClaimMapping::new("roles").with_role("editor", "Acme.Blog:Editor")
    }

    fn resolver() -> Arc<dyn RoleResolver> {
        Arc::new(StaticRoleResolver::new(["Acme.Blog:Editor"]))
    }

    fn provider() -> JwtAuthenticationProvider {
        JwtAuthenticationProvider::new(
            &security(),
            mapping(),
            Arc::new(InMemoryCache::new()),
            Arc::new(StubFetcher::unreachable()),
            resolver(),
        )
        .unwrap()
    }

    fn located(raw: &str) -> JsonWebToken {
        let mut token = JsonWebToken::new();
        let request = RequestParts::new().with_header("X-Jwt", raw);
        assert!(token.update_credentials(&request, provider().locator()));
        token
    }

    #[tokio::test]
    async fn test_valid_token_authenticates() {
        let raw = sign(&json!({"sub": "alice", "exp": now() + 3600, "roles": ["editor", "guest"], "email": "a@example.com"}));
        let mut token = located(&raw);

        provider().authenticate(&mut token).await.unwrap();

        assert_eq!(token.status(), AuthenticationStatus::AuthenticationSuccessful);
        let identity = token.identity().unwrap();
        assert_eq!(identity.account_identifier(), "alice");
        assert_eq!(identity.provider_name(), "JwtAuthenticationProvider");
        assert!(identity.has_role("Acme.Blog:Editor"));
        assert_eq!(identity.roles().len(), 1);
        assert_eq!(identity.claim("email"), Some(&json!("a@example.com")));
    }

    #[tokio::test]
    async fn test_authenticate_request_uses_cookie_fallback() {
        let raw = sign(&json!({"sub": "bob", "exp": now() + 3600}));
        let request = RequestParts::new().with_cookie("jwt", raw);

        let token = provider().authenticate_request(&request).await.unwrap();

        assert!(token.is_authenticated());
        assert_eq!(token.identity().unwrap().account_identifier(), "bob");
    }

    #[tokio::test]
    async fn test_no_credentials_does_no_work() {
        let cache = Arc::new(CountingCache::default());
        let fetcher = Arc::new(StubFetcher::serving(SECRET));
        let security = SecurityConfig::new(vec![Algorithm::HS256])
            .with_key_url(Url::parse("https://issuer.example.com/key").unwrap());
        let provider = JwtAuthenticationProvider::new(
            &security,
            mapping(),
            cache.clone(),
            fetcher.clone(),
            resolver(),
        )
        .unwrap();

        let request = RequestParts::new().with_header("Authorization", "Bearer x");
        let mut token = provider.authenticate_request(&request).await.unwrap();
        assert_eq!(token.status(), AuthenticationStatus::NoCredentialsGiven);

        provider.authenticate(&mut token).await.unwrap();
        assert_eq!(token.status(), AuthenticationStatus::NoCredentialsGiven);

        assert_eq!(cache.calls.load(Ordering::Relaxed), 0);
        assert_eq!(fetcher.calls.load(Ordering::Relaxed), 0);
    }

    #[test]
    fn test_expired_token_logs_at_debug_only() {
        let raw = sign(&json!({"sub": "alice", "exp": now() - 600}));
        let mut token = located(&raw);
        let provider = provider();

        let (result, logs) =
            with_recorded_logs(|| tokio_test::block_on(provider.authenticate(&mut token)));

        assert!(result.is_ok());
        assert_eq!(token.status(), AuthenticationStatus::WrongCredentials);
        assert_eq!(token.failure_reason(), Some(FailureReason::WrongCredentials));
        assert!(!logs.levels().is_empty());
        assert!(logs.levels().iter().all(|level| *level == Level::DEBUG || *level == Level::TRACE));
    }

    #[test]
    fn test_bad_signature_logs_warning_without_token() {
        let raw = encode(
            &Header::new(Algorithm::HS256),
            &json!({"sub": "mallory", "exp": now() + 3600}),
            &EncodingKey::from_secret(b"forged-secret-forged-secret-forged"),
        )
        .unwrap();
        let mut token = located(&raw);
        let provider = provider();

        let (result, logs) =
            with_recorded_logs(|| tokio_test::block_on(provider.authenticate(&mut token)));

        assert!(result.is_ok());
        assert_eq!(token.status(), AuthenticationStatus::WrongCredentials);
        assert!(logs.levels().contains(&Level::WARN));
        assert!(logs.text().contains("bad_signature"));
        assert!(!logs.text().contains(&raw));
        assert!(!logs.text().contains(SECRET));
    }

    #[tokio::test]
    async fn test_malformed_token_is_wrong_credentials() {
        let mut token = located("not-a-jwt");

        provider().authenticate(&mut token).await.unwrap();

        assert_eq!(token.status(), AuthenticationStatus::WrongCredentials);
        assert!(token.identity().is_none());
    }

    #[tokio::test]
    async fn test_missing_subject_is_wrong_credentials() {
        let raw = sign(&json!({"name": "nobody", "exp": now() + 3600}));
        let mut token = located(&raw);

        provider().authenticate(&mut token).await.unwrap();

        assert_eq!(token.status(), AuthenticationStatus::WrongCredentials);
    }

    #[test]
    fn test_key_unavailable_is_error_and_wrong_credentials() {
        let security = SecurityConfig::new(vec![Algorithm::HS256])
            .with_key_url(Url::parse("https://issuer.example.com/key").unwrap());
        let provider = JwtAuthenticationProvider::new(
            &security,
            mapping(),
            Arc::new(InMemoryCache::new()),
            Arc::new(StubFetcher::unreachable()),
            resolver(),
        )
        .unwrap();
        let raw = sign(&json!({"sub": "alice", "exp": now() + 3600}));
        let mut token = located(&raw);

        let (result, logs) =
            with_recorded_logs(|| tokio_test::block_on(provider.authenticate(&mut token)));

        assert!(result.unwrap_err().is_key_unavailable());
        assert_eq!(token.status(), AuthenticationStatus::WrongCredentials);
        assert_eq!(token.failure_reason(), Some(FailureReason::KeyUnavailable));
        assert!(logs.levels().contains(&Level::ERROR));
    }

    #[tokio::test]
    async fn test_fetched_key_is_reused() {
        let fetcher = Arc::new(StubFetcher::serving(SECRET));
        let security = SecurityConfig::new(vec![Algorithm::HS256])
            .with_key_url(Url::parse("https://issuer.example.com/key").unwrap());
        let provider = JwtAuthenticationProvider::new(
            &security,
            mapping(),
            Arc::new(InMemoryCache::new()),
            fetcher.clone(),
            resolver(),
        )
        .unwrap();
        let raw = sign(&json!({"sub": "alice", "exp": now() + 3600}));
        let request = RequestParts::new().with_header("X-Jwt", raw);

        for _ in 0..3 {
            let token = provider.authenticate_request(&request).await.unwrap();
            assert!(token.is_authenticated());
        }
        assert_eq!(fetcher.calls.load(Ordering::Relaxed), 1);
    }

    #[tokio::test]
    async fn test_resolved_token_is_not_reauthenticated() {
        let raw = sign(&json!({"sub": "alice", "exp": now() + 3600}));
        let mut token = located(&raw);
        let provider = provider();

        provider.authenticate(&mut token).await.unwrap();
        provider.authenticate(&mut token).await.unwrap();

        assert!(token.is_authenticated());
    }

    #[test]
    fn test_unknown_mapped_role_fails_construction() {
        let mapping = ClaimMapping::new("roles").with_role("ghost", "Acme.Blog:Ghost");

        let result = JwtAuthenticationProvider::new(
            &security(),
            mapping,
            Arc::new(InMemoryCache::new()),
            Arc::new(StubFetcher::unreachable()),
            resolver(),
        );

        assert!(matches!(result, Err(AuthError::Config(_))));
    }

    #[test]
    fn test_incomplete_security_fails_construction() {
        let result = JwtAuthenticationProvider::new(
            &SecurityConfig::new(vec![Algorithm::HS256]),
            ClaimMapping::default(),
            Arc::new(InMemoryCache::new()),
            Arc::new(StubFetcher::unreachable()),
            resolver(),
        );

        assert!(matches!(result, Err(AuthError::Config(_))));
    }

    #[test]
    fn test_from_config() {
        let mut config = Config::default();
        config.security = security();
        config.claim_mapping = mapping();
        config.roles = vec!["Acme.Blog:Editor".into()];

        let provider = JwtAuthenticationProvider::from_config(&config).unwrap();
        assert_eq!(provider.name(), "JwtAuthenticationProvider");
        assert_eq!(provider.locator().sources().len(), 2);
    }
}

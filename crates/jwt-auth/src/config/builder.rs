//! Configuration builder

use std::time::Duration;

use url::Url;

use crate::Error;
use crate::auth::{
    ClaimMapping, DEFAULT_PROVIDER_NAME, DEFAULT_TOKEN_HEADER, SecurityConfig, TokenSource,
    parse_algorithms,
};
use crate::cache::{CacheBackend, CacheConfig};
use crate::constants::{DEFAULT_KEY_FETCH_TIMEOUT_SECS, DEFAULT_LOG_LEVEL};

/// Process configuration, loaded once at startup
#[derive(Debug, Clone, Default)]
pub struct Config {
    pub security: SecurityConfig,
    pub claim_mapping: ClaimMapping,
    pub cache: CacheConfig,
    /// Role names known to the bundled static role resolver
    pub roles: Vec<String>,
    pub telemetry: TelemetryConfig,
}

impl Config {
    #[must_use]
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::new()
    }
}

/// Telemetry configuration
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
    pub json_logs: bool,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: DEFAULT_LOG_LEVEL.to_string(),
            json_logs: false,
        }
    }
}

/// Configuration builder with fluent API
#[derive(Debug, Default)]
pub struct ConfigBuilder {
    algorithms: Vec<String>,
    key: Option<String>,
    key_url: Option<Url>,
    key_fetch_timeout: Option<Duration>,
    token_sources: Vec<TokenSource>,
    leeway: Duration,
    issuer: Option<String>,
    audience: Vec<String>,
    provider_name: Option<String>,
    claim_mapping: ClaimMapping,
    cache: CacheConfig,
    roles: Vec<String>,
    log_level: Option<String>,
    json_logs: bool,
}

impl ConfigBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Allowed algorithm names, in order
    #[must_use]
    pub fn algorithms<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.algorithms = names.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }

    #[must_use]
    pub fn key_url(mut self, url: Url) -> Self {
        self.key_url = Some(url);
        self
    }

    #[must_use]
    pub const fn key_fetch_timeout(mut self, timeout: Duration) -> Self {
        self.key_fetch_timeout = Some(timeout);
        self
    }

    #[must_use]
    pub fn token_sources(mut self, sources: Vec<TokenSource>) -> Self {
        self.token_sources = sources;
        self
    }

    #[must_use]
    pub const fn leeway(mut self, leeway: Duration) -> Self {
        self.leeway = leeway;
        self
    }

    #[must_use]
    pub fn issuer(mut self, issuer: impl Into<String>) -> Self {
        self.issuer = Some(issuer.into());
        self
    }

    #[must_use]
    pub fn audience(mut self, audience: Vec<String>) -> Self {
        self.audience = audience;
        self
    }

    #[must_use]
    pub fn provider_name(mut self, name: impl Into<String>) -> Self {
        self.provider_name = Some(name.into());
        self
    }

    #[must_use]
    pub fn claim_mapping(mut self, mapping: ClaimMapping) -> Self {
        self.claim_mapping = mapping;
        self
    }

    #[must_use]
    pub fn roles(mut self, roles: Vec<String>) -> Self {
        self.roles = roles;
        self
    }

    #[must_use]
    pub const fn cache_backend(mut self, backend: CacheBackend) -> Self {
        self.cache.backend = backend;
        self
    }

    /// Expire cached key documents after `ttl`
    #[must_use]
    pub const fn cache_ttl(mut self, ttl: Option<Duration>) -> Self {
        self.cache.ttl = ttl;
        self
    }

    #[must_use]
    pub const fn cache_max_entries(mut self, max: Option<usize>) -> Self {
        self.cache.max_entries = max;
        self
    }

    #[must_use]
    pub fn log_level(mut self, level: String) -> Self {
        self.log_level = Some(level);
        self
    }

    #[must_use]
    pub const fn json_logs(mut self, enabled: bool) -> Self {
        self.json_logs = enabled;
        self
    }

    /// Build the configuration
    ///
    /// Checks everything that can be checked without collaborators; mapped
    /// role names are checked when the provider is constructed.
    pub fn build(self) -> crate::Result<Config> {
        let algorithms = parse_algorithms(&self.algorithms)?;

        let token_sources = if self.token_sources.is_empty() {
            vec![TokenSource::header(DEFAULT_TOKEN_HEADER)]
        } else {
            self.token_sources
        };

        let security = SecurityConfig {
            algorithms,
            key: self.key,
            key_url: self.key_url,
            key_fetch_timeout: self
                .key_fetch_timeout
                .unwrap_or(Duration::from_secs(DEFAULT_KEY_FETCH_TIMEOUT_SECS)),
            token_sources,
            leeway: self.leeway,
            issuer: self.issuer.filter(|i| !i.is_empty()),
            audience: self.audience,
            provider_name: self
                .provider_name
                .filter(|n| !n.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_PROVIDER_NAME.to_string()),
        };
        security.validate()?;

        if self.cache.max_entries == Some(0) {
            return Err(Error::Config("cache.max_entries must be greater than zero".into()));
        }

        let log_level = self
            .log_level
            .filter(|l| !l.is_empty())
            .unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string());

        Ok(Config {
            security,
            claim_mapping: self.claim_mapping,
            cache: self.cache,
            roles: self.roles,
            telemetry: TelemetryConfig {
                log_level,
                json_logs: self.json_logs,
            },
        })
    }
}

//! Authentication configuration types

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use jsonwebtoken::Algorithm;
use serde::Deserialize;
use url::Url;

use super::error::{AuthError, Result};
use crate::constants::DEFAULT_KEY_FETCH_TIMEOUT_SECS;

/// Header consulted when no token sources are configured
pub const DEFAULT_TOKEN_HEADER: &str = "X-Jwt";

/// Provider name recorded on every authenticated identity by default
pub const DEFAULT_PROVIDER_NAME: &str = "JwtAuthenticationProvider";

/// Where in a request a token may be found
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenOrigin {
    Header,
    Cookie,
    Query,
}

impl TokenOrigin {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Header => "header",
            Self::Cookie => "cookie",
            Self::Query => "query",
        }
    }
}

impl FromStr for TokenOrigin {
    type Err = AuthError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "header" => Ok(Self::Header),
            "cookie" => Ok(Self::Cookie),
            "query" => Ok(Self::Query),
            other => Err(AuthError::Config(format!(
                "unknown token source origin '{other}' (expected header, cookie or query)"
            ))),
        }
    }
}

/// A named location to search for an encoded token
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TokenSource {
    pub name: String,
    #[serde(rename = "from")]
    pub origin: TokenOrigin,
}

impl TokenSource {
    #[must_use]
    pub fn header(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            origin: TokenOrigin::Header,
        }
    }

    #[must_use]
    pub fn cookie(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            origin: TokenOrigin::Cookie,
        }
    }

    #[must_use]
    pub fn query(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            origin: TokenOrigin::Query,
        }
    }
}

impl fmt::Display for TokenSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.origin.as_str(), self.name)
    }
}

/// Parse `origin:name` (e.g. `cookie:jwt`), as used by the env loader
impl FromStr for TokenSource {
    type Err = AuthError;

    fn from_str(s: &str) -> Result<Self> {
        let (origin, name) = s.split_once(':').ok_or_else(|| {
            AuthError::Config(format!("token source '{s}' must look like origin:name"))
        })?;
        Ok(Self {
            name: name.trim().to_string(),
            origin: origin.parse()?,
        })
    }
}

/// Parse algorithm names into an ordered, de-duplicated allow-list
pub fn parse_algorithms<S: AsRef<str>>(names: &[S]) -> Result<Vec<Algorithm>> {
    let mut algorithms = Vec::with_capacity(names.len());
    for name in names {
        let name = name.as_ref().trim();
        let alg = Algorithm::from_str(name)
            .map_err(|_| AuthError::Config(format!("unknown signature algorithm '{name}'")))?;
        if !algorithms.contains(&alg) {
            algorithms.push(alg);
        }
    }
    Ok(algorithms)
}

/// Token verification settings
#[derive(Clone)]
pub struct SecurityConfig {
    /// Allowed signature algorithms
    pub algorithms: Vec<Algorithm>,
    /// Static verification key (HMAC secret, PEM or JWKS document)
    pub key: Option<String>,
    /// Location to fetch key material from when no static key is set
    pub key_url: Option<Url>,
    /// Upper bound for a single key fetch
    pub key_fetch_timeout: Duration,
    /// Ordered token sources; first present wins
    pub token_sources: Vec<TokenSource>,
    /// Clock skew tolerance for `exp`/`nbf`
    pub leeway: Duration,
    /// Expected `iss` claim, if any
    pub issuer: Option<String>,
    /// Accepted `aud` values; empty disables the audience check
    pub audience: Vec<String>,
    /// Name recorded on authenticated identities
    pub provider_name: String,
}

// Key material is omitted from debug output
impl fmt::Debug for SecurityConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecurityConfig")
            .field("algorithms", &self.algorithms)
            .field("has_static_key", &self.static_key().is_some())
            .field("key_url", &self.key_url)
            .field("key_fetch_timeout", &self.key_fetch_timeout)
            .field("token_sources", &self.token_sources)
            .field("leeway", &self.leeway)
            .field("issuer", &self.issuer)
            .field("audience", &self.audience)
            .field("provider_name", &self.provider_name)
            .finish()
    }
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            algorithms: Vec::new(),
            key: None,
            key_url: None,
            key_fetch_timeout: Duration::from_secs(DEFAULT_KEY_FETCH_TIMEOUT_SECS),
            token_sources: vec![TokenSource::header(DEFAULT_TOKEN_HEADER)],
            leeway: Duration::ZERO,
            issuer: None,
            audience: Vec::new(),
            provider_name: DEFAULT_PROVIDER_NAME.to_string(),
        }
    }
}

impl SecurityConfig {
    #[must_use]
    pub fn new(algorithms: Vec<Algorithm>) -> Self {
        Self {
            algorithms,
            ..Default::default()
        }
    }

    #[must_use]
    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }

    #[must_use]
    pub fn with_key_url(mut self, url: Url) -> Self {
        self.key_url = Some(url);
        self
    }

    #[must_use]
    pub fn with_token_sources(mut self, sources: Vec<TokenSource>) -> Self {
        self.token_sources = sources;
        self
    }

    /// The static key, if one is configured and non-empty
    #[must_use]
    pub fn static_key(&self) -> Option<&str> {
        self.key.as_deref().filter(|k| !k.is_empty())
    }

    /// Check the settings that can be checked without collaborators
    pub fn validate(&self) -> Result<()> {
        if self.algorithms.is_empty() {
            return Err(AuthError::Config(
                "security.algorithms must list at least one algorithm".into(),
            ));
        }

        if self.static_key().is_none() && self.key_url.is_none() {
            return Err(AuthError::Config(
                "either security.key or security.key_url must be set".into(),
            ));
        }

        if self.token_sources.is_empty() {
            return Err(AuthError::Config(
                "security.token_sources must not be empty".into(),
            ));
        }

        if let Some(source) = self
            .token_sources
            .iter()
            .find(|s| s.name.trim().is_empty())
        {
            return Err(AuthError::Config(format!(
                "token source of origin '{}' has an empty name",
                source.origin.as_str()
            )));
        }

        if self.key_fetch_timeout.is_zero() {
            return Err(AuthError::Config(
                "security.key_fetch_timeout must be greater than zero".into(),
            ));
        }

        Ok(())
    }
}

/// Declarative mapping from claim values to role names
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ClaimMapping {
    /// Claim holding role values; `None` disables role derivation
    #[serde(default, alias = "roleField")]
    pub role_field: Option<String>,
    /// Claim value -> role name
    #[serde(default)]
    pub roles: BTreeMap<String, String>,
}

impl ClaimMapping {
    #[must_use]
    pub fn new(role_field: impl Into<String>) -> Self {
        Self {
            role_field: Some(role_field.into()),
            roles: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn with_role(mut self, claim_value: impl Into<String>, role: impl Into<String>) -> Self {
        self.roles.insert(claim_value.into(), role.into());
        self
    }

    /// Role field, ignoring empty strings
    #[must_use]
    pub fn role_field(&self) -> Option<&str> {
        self.role_field.as_deref().filter(|f| !f.is_empty())
    }

    /// Role names the mapping can produce
    pub fn role_names(&self) -> impl Iterator<Item = &str> {
        self.roles.values().map(String::as_str)
    }
}

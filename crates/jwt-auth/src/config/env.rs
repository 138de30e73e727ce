//! Environment variable loading for configuration

use std::env;
use std::time::Duration;

use url::Url;

use super::builder::ConfigBuilder;
use crate::Result;
use crate::auth::TokenSource;
use crate::cache::CacheBackend;

/// Environment variable names
mod vars {
    pub const JWT_AUTH_ALGORITHMS: &str = "JWT_AUTH_ALGORITHMS";
    pub const JWT_AUTH_KEY: &str = "JWT_AUTH_KEY";
    pub const JWT_AUTH_KEY_URL: &str = "JWT_AUTH_KEY_URL";
    pub const JWT_AUTH_KEY_FETCH_TIMEOUT_SECS: &str = "JWT_AUTH_KEY_FETCH_TIMEOUT_SECS";
    pub const JWT_AUTH_LEEWAY_SECS: &str = "JWT_AUTH_LEEWAY_SECS";
    pub const JWT_AUTH_TOKEN_SOURCES: &str = "JWT_AUTH_TOKEN_SOURCES";
    pub const JWT_AUTH_CACHE_BACKEND: &str = "JWT_AUTH_CACHE_BACKEND";
    pub const JWT_AUTH_CACHE_TTL_SECS: &str = "JWT_AUTH_CACHE_TTL_SECS";
    pub const RUST_LOG: &str = "RUST_LOG";
    pub const JWT_AUTH_JSON_LOGS: &str = "JWT_AUTH_JSON_LOGS";
}

/// Load configuration from environment variables
pub fn load_from_env(mut builder: ConfigBuilder) -> Result<ConfigBuilder> {
    // Comma-separated, e.g. "RS256,ES256"
    if let Ok(list) = env::var(vars::JWT_AUTH_ALGORITHMS) {
        builder = builder.algorithms(split_list(&list));
    }

    if let Ok(key) = env::var(vars::JWT_AUTH_KEY) {
        builder = builder.key(key);
    }

    if let Ok(url_str) = env::var(vars::JWT_AUTH_KEY_URL) {
        let url = Url::parse(&url_str).map_err(|e| {
            crate::Error::Config(format!("Invalid {}: {}", vars::JWT_AUTH_KEY_URL, e))
        })?;
        builder = builder.key_url(url);
    }

    if let Ok(secs_str) = env::var(vars::JWT_AUTH_KEY_FETCH_TIMEOUT_SECS) {
        let secs = parse_secs(vars::JWT_AUTH_KEY_FETCH_TIMEOUT_SECS, &secs_str)?;
        builder = builder.key_fetch_timeout(Duration::from_secs(secs));
    }

    if let Ok(secs_str) = env::var(vars::JWT_AUTH_LEEWAY_SECS) {
        let secs = parse_secs(vars::JWT_AUTH_LEEWAY_SECS, &secs_str)?;
        builder = builder.leeway(Duration::from_secs(secs));
    }

    // Comma-separated origin:name pairs, e.g. "header:X-Jwt,cookie:jwt"
    if let Ok(list) = env::var(vars::JWT_AUTH_TOKEN_SOURCES) {
        let sources = split_list(&list)
            .into_iter()
            .map(|s| s.parse::<TokenSource>())
            .collect::<std::result::Result<Vec<_>, _>>()?;
        builder = builder.token_sources(sources);
    }

    if let Ok(backend) = env::var(vars::JWT_AUTH_CACHE_BACKEND) {
        builder = builder.cache_backend(backend.parse::<CacheBackend>()?);
    }

    if let Ok(secs_str) = env::var(vars::JWT_AUTH_CACHE_TTL_SECS) {
        let secs = parse_secs(vars::JWT_AUTH_CACHE_TTL_SECS, &secs_str)?;
        builder = builder.cache_ttl(Some(Duration::from_secs(secs)));
    }

    if let Ok(level) = env::var(vars::RUST_LOG) {
        builder = builder.log_level(level);
    }

    if let Ok(val) = env::var(vars::JWT_AUTH_JSON_LOGS) {
        builder = builder.json_logs(parse_bool(&val));
    }

    Ok(builder)
}

fn split_list(s: &str) -> Vec<String> {
    s.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

fn parse_secs(name: &str, value: &str) -> Result<u64> {
    value
        .trim()
        .parse::<u64>()
        .map_err(|e| crate::Error::Config(format!("Invalid {name}: {e}")))
}

fn parse_bool(s: &str) -> bool {
    matches!(s.to_lowercase().as_str(), "true" | "1" | "yes" | "on")
}

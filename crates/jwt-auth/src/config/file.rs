//! TOML configuration file loading

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use url::Url;

use super::builder::ConfigBuilder;
use crate::Result;
use crate::auth::{ClaimMapping, TokenSource};
use crate::cache::CacheBackend;
use crate::constants::LOCAL_CONFIG_FILE;

/// Configuration file locations checked after the working directory
const CONFIG_PATHS: &[&str] = &["~/.config/jwt-auth/config.toml", "/etc/jwt-auth/config.toml"];

/// Find the first existing configuration file
pub fn find_config_file() -> Option<PathBuf> {
    let local = PathBuf::from(".").join(LOCAL_CONFIG_FILE);
    if local.exists() {
        return Some(local);
    }

    for path_str in CONFIG_PATHS {
        let path = if path_str.starts_with('~') {
            if let Ok(home) = std::env::var("HOME") {
                PathBuf::from(path_str.replacen('~', &home, 1))
            } else {
                continue;
            }
        } else {
            PathBuf::from(path_str)
        };

        if path.exists() {
            return Some(path);
        }
    }
    None
}

/// Load configuration from a TOML file
pub fn load_from_file(path: &Path, builder: ConfigBuilder) -> Result<ConfigBuilder> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        crate::Error::Config(format!(
            "Failed to read config file {}: {}",
            path.display(),
            e
        ))
    })?;

    let file_config: FileConfig = toml::from_str(&content).map_err(|e| {
        crate::Error::Config(format!(
            "Failed to parse config file {}: {}",
            path.display(),
            e
        ))
    })?;

    apply_file_config(builder, file_config)
}

fn apply_file_config(mut builder: ConfigBuilder, config: FileConfig) -> Result<ConfigBuilder> {
    if let Some(sec) = config.security {
        if let Some(algorithms) = sec.algorithms {
            builder = builder.algorithms(algorithms);
        }

        if let Some(key) = sec.key {
            builder = builder.key(key);
        }

        if let Some(url_str) = sec.key_url.filter(|u| !u.is_empty()) {
            let url = Url::parse(&url_str)
                .map_err(|e| crate::Error::Config(format!("Invalid security.keyUrl: {e}")))?;
            builder = builder.key_url(url);
        }

        if let Some(secs) = sec.key_fetch_timeout_secs {
            builder = builder.key_fetch_timeout(Duration::from_secs(secs));
        }

        if let Some(sources) = sec.token_sources {
            builder = builder.token_sources(sources);
        }

        if let Some(secs) = sec.leeway_secs {
            builder = builder.leeway(Duration::from_secs(secs));
        }

        if let Some(issuer) = sec.issuer {
            builder = builder.issuer(issuer);
        }

        if let Some(audience) = sec.audience {
            builder = builder.audience(audience);
        }

        if let Some(name) = sec.provider_name {
            builder = builder.provider_name(name);
        }
    }

    if let Some(mapping) = config.claim_mapping {
        builder = builder.claim_mapping(mapping);
    }

    if let Some(cache) = config.cache {
        if let Some(backend) = cache.backend {
            builder = builder.cache_backend(backend);
        }

        if let Some(secs) = cache.ttl_secs {
            builder = builder.cache_ttl(Some(Duration::from_secs(secs)));
        }

        if let Some(max) = cache.max_entries {
            builder = builder.cache_max_entries(Some(max));
        }
    }

    if let Some(policy) = config.policy {
        builder = builder.roles(policy.roles);
    }

    if let Some(obs) = config.observability {
        if let Some(level) = obs.log_level {
            builder = builder.log_level(level);
        }

        if let Some(json) = obs.json_logs {
            builder = builder.json_logs(json);
        }
    }

    Ok(builder)
}

/// Root configuration file structure
#[derive(Debug, Deserialize, Default)]
struct FileConfig {
    security: Option<SecurityFileConfig>,
    #[serde(alias = "claimMapping")]
    claim_mapping: Option<ClaimMapping>,
    cache: Option<CacheFileConfig>,
    policy: Option<PolicyFileConfig>,
    observability: Option<ObservabilityConfig>,
}

#[derive(Debug, Deserialize)]
struct SecurityFileConfig {
    algorithms: Option<Vec<String>>,
    key: Option<String>,
    #[serde(alias = "keyUrl")]
    key_url: Option<String>,
    #[serde(alias = "keyFetchTimeoutSecs")]
    key_fetch_timeout_secs: Option<u64>,
    #[serde(alias = "tokenSources")]
    token_sources: Option<Vec<TokenSource>>,
    #[serde(alias = "leewaySecs")]
    leeway_secs: Option<u64>,
    issuer: Option<String>,
    audience: Option<Vec<String>>,
    #[serde(alias = "providerName")]
    provider_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CacheFileConfig {
    backend: Option<CacheBackend>,
    #[serde(alias = "ttlSecs")]
    ttl_secs: Option<u64>,
    #[serde(alias = "maxEntries")]
    max_entries: Option<usize>,
}

#[derive(Debug, Deserialize)]
struct PolicyFileConfig {
    #[serde(default)]
    roles: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct ObservabilityConfig {
    log_level: Option<String>,
    json_logs: Option<bool>,
}

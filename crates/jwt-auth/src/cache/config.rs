//! Cache configuration types

use std::str::FromStr;
use std::time::Duration;

use serde::Deserialize;

/// Default maximum value size: 64KB (a large JWKS document fits comfortably)
pub const DEFAULT_MAX_VALUE_SIZE: usize = 65_536;

/// Default maximum number of entries in the in-memory backend
pub const DEFAULT_MAX_ENTRIES: usize = 1024;

/// Cache backend type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheBackend {
    /// Never stores anything; every cold lookup fetches the key again
    Noop,
    #[default]
    Memory,
}

impl FromStr for CacheBackend {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "memory" | "mem" => Ok(Self::Memory),
            "noop" | "none" | "disabled" => Ok(Self::Noop),
            other => Err(crate::Error::Config(format!(
                "unknown cache backend '{other}' (expected memory or noop)"
            ))),
        }
    }
}

/// Cache configuration
#[derive(Debug, Clone, Copy)]
pub struct CacheConfig {
    /// Cache backend type
    pub backend: CacheBackend,
    /// Expiry applied to entries stored without an explicit TTL.
    ///
    /// `None` keeps fetched keys until they are evicted; a rotated remote key
    /// is then only picked up after a manual eviction or a restart.
    pub ttl: Option<Duration>,
    /// Maximum entries for in-memory cache
    pub max_entries: Option<usize>,
    /// Maximum size of a single cached value in bytes
    pub max_value_size: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl CacheConfig {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            backend: CacheBackend::Memory,
            ttl: None,
            max_entries: Some(DEFAULT_MAX_ENTRIES),
            max_value_size: DEFAULT_MAX_VALUE_SIZE,
        }
    }
}

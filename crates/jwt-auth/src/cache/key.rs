//! Cache keys for fetched key material

use std::fmt;

use sha2::{Digest, Sha256};
use url::Url;

const PREFIX: &str = "jwt_key";

/// Cache key for the document behind one key URL
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    digest: String,
}

impl CacheKey {
    /// Create key for key material fetched from `url`.
    ///
    /// The identifier is the hex SHA-256 digest of the serialized URL, so the
    /// key is stable across processes and restarts and does not embed the URL
    /// itself (which may carry credentials in its query string).
    #[must_use]
    pub fn verification_key(url: &Url) -> Self {
        Self {
            digest: hex::encode(Sha256::digest(url.as_str().as_bytes())),
        }
    }

    /// Hex digest of the key URL
    #[must_use]
    pub fn digest(&self) -> &str {
        &self.digest
    }

    /// Convert to string key for storage
    #[must_use]
    pub fn to_key_string(&self) -> String {
        format!("{PREFIX}:{}", self.digest)
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{PREFIX}:{}", self.digest)
    }
}

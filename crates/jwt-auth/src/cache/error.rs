//! Cache error types

use thiserror::Error;

/// Cache operation errors
///
/// The key provider treats every variant as a cache miss.
#[derive(Error, Debug)]
pub enum CacheError {
    #[error("Value too large: {size} bytes (max: {max} bytes)")]
    ValueTooLarge { size: usize, max: usize },

    /// The backing store could not serve the request
    #[error("Cache backend unavailable: {0}")]
    Backend(String),
}

/// Result type for cache operations
pub type CacheResult<T> = Result<T, CacheError>;

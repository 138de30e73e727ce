//! Constants for jwt-auth

/// Tokens longer than this are rejected before any decoding
pub const MAX_TOKEN_SIZE_BYTES: usize = 8192;

/// Default seconds allowed for one key fetch
pub const DEFAULT_KEY_FETCH_TIMEOUT_SECS: u64 = 5;

/// Default log filter when neither `RUST_LOG` nor the config sets one
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Service name attached to cache spans
pub const SERVICE_NAME: &str = "jwt-auth";

/// Config file name searched in the working directory
pub const LOCAL_CONFIG_FILE: &str = "jwt-auth.toml";

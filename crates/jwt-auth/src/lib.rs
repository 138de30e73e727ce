//! JWT request authentication with claim-to-role mapping

pub mod auth;
pub mod cache;
pub mod config;
mod constants;
mod error;
pub mod observability;

pub use auth::{
    AuthError, AuthenticationStatus, ClaimMapping, ClaimSet, EncodedToken, Identity,
    JsonWebToken, JwtAuthenticationProvider, RequestParts, RequestView, Role, RoleResolver,
    SecurityConfig, TokenLocator, TokenSource, TokenVerifier,
};
pub use cache::{CacheBackend, CacheConfig, CacheKey, CacheProvider, create_cache};
pub use config::{Config, ConfigBuilder, TelemetryConfig};
pub use error::{Error, Result};

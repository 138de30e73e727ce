//! JWT request authentication
//!
//! One attempt flows through these pieces:
//!
//! - [`TokenLocator`] finds the encoded token in the request (headers,
//!   cookies or query arguments, in configured order)
//! - [`KeyProvider`] supplies the verification key, either the static key or
//!   a document fetched from the key URL and kept in the cache
//! - [`TokenVerifier`] checks the signature against the algorithm allow-list
//!   and validates the time claims
//! - [`ClaimsToIdentityMapper`] turns the claims into an [`Identity`] with
//!   roles resolved through a [`RoleResolver`]
//!
//! [`JwtAuthenticationProvider`] drives the sequence and writes the final
//! status onto the [`JsonWebToken`].
//!
//! # Failure handling
//!
//! Every failure reaches the caller as `WrongCredentials`. Expired tokens are
//! logged at debug level; any other rejection is logged as a warning with a
//! reason code. Tokens and key material are never logged.

mod claims;
mod config;
mod error;
mod identity;
mod jwks;
mod key_provider;
mod locator;
mod mapper;
#[cfg(feature = "http")]
mod middleware;
mod provider;
mod request;
mod token;
mod verifier;

pub use claims::ClaimSet;
pub use config::{
    ClaimMapping, DEFAULT_PROVIDER_NAME, DEFAULT_TOKEN_HEADER, SecurityConfig, TokenOrigin,
    TokenSource, parse_algorithms,
};
pub use error::{AuthError, InvalidReason, Result, VerifyError};
pub use identity::{Identity, Role, RoleResolver, StaticRoleResolver};
pub use jwks::{Jwk, JwkSet};
pub use key_provider::{HttpKeyFetcher, KeyFetcher, KeyOrigin, KeyProvider, VerificationKey};
pub use locator::TokenLocator;
pub use mapper::ClaimsToIdentityMapper;
#[cfg(feature = "http")]
pub use middleware::{AuthState, jwt_auth_middleware};
pub use provider::JwtAuthenticationProvider;
pub use request::{RequestParts, RequestView};
pub use token::{
    AuthenticationOutcome, AuthenticationStatus, EncodedToken, FailureReason, JsonWebToken,
};
pub use verifier::TokenVerifier;

//! JWT authentication middleware for axum
//!
//! This module requires the `http` feature.

use std::sync::Arc;

use axum::extract::{Request, State};
use axum::http::StatusCode;
use axum::middleware::Next;
use axum::response::Response;

use super::identity::Identity;
use super::provider::JwtAuthenticationProvider;
use super::token::{FailureReason, JsonWebToken};

/// Authentication state for middleware
#[derive(Debug, Clone)]
pub struct AuthState {
    pub provider: Arc<JwtAuthenticationProvider>,
}

impl AuthState {
    #[must_use]
    pub const fn new(provider: Arc<JwtAuthenticationProvider>) -> Self {
        Self { provider }
    }
}

/// Authenticate the request and expose the [`Identity`] as an extension.
///
/// Requests without a token pass through unauthenticated; protected routes
/// decide what to do with a missing identity.
pub async fn jwt_auth_middleware(
    State(state): State<AuthState>,
    mut request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    // The request borrow must end before the first await
    if let Some(token) = locate(&state, &request) {
        let identity = resolve(&state, token).await?;
        request.extensions_mut().insert(identity);
    }
    Ok(next.run(request).await)
}

fn locate(state: &AuthState, request: &Request) -> Option<JsonWebToken> {
    let mut token = JsonWebToken::new();
    token
        .update_credentials(request, state.provider.locator())
        .then_some(token)
}

async fn resolve(state: &AuthState, mut token: JsonWebToken) -> Result<Identity, StatusCode> {
    // Failures are already logged by the provider
    let _ = state.provider.authenticate(&mut token).await;

    if let Some(reason) = token.failure_reason() {
        return Err(status_for(reason));
    }
    token
        .identity()
        .cloned()
        .ok_or(StatusCode::INTERNAL_SERVER_ERROR)
}

const fn status_for(reason: FailureReason) -> StatusCode {
    match reason {
        FailureReason::WrongCredentials => StatusCode::UNAUTHORIZED,
        FailureReason::KeyUnavailable => StatusCode::SERVICE_UNAVAILABLE,
        FailureReason::Configuration => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

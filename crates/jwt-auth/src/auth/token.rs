//! Per-request authentication token and its status

use std::fmt;

use super::identity::Identity;
use super::locator::TokenLocator;
use super::request::RequestView;

/// Raw signed token exactly as received. Never printed.
#[derive(Clone, PartialEq, Eq)]
pub struct EncodedToken(String);

impl EncodedToken {
    #[must_use]
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for EncodedToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EncodedToken")
            .field("len", &self.0.len())
            .finish_non_exhaustive()
    }
}

/// Status code visible to the caller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthenticationStatus {
    NoCredentialsGiven,
    AuthenticationNeeded,
    WrongCredentials,
    AuthenticationSuccessful,
}

impl AuthenticationStatus {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::NoCredentialsGiven => "no_credentials_given",
            Self::AuthenticationNeeded => "authentication_needed",
            Self::WrongCredentials => "wrong_credentials",
            Self::AuthenticationSuccessful => "authentication_successful",
        }
    }
}

/// Why an attempt failed. All variants surface as `WrongCredentials`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureReason {
    /// The token was rejected by the verifier
    WrongCredentials,
    /// Key material could not be obtained
    KeyUnavailable,
    /// A mapped role could not be resolved
    Configuration,
}

#[derive(Debug, Clone)]
pub enum AuthenticationOutcome {
    NoCredentials,
    NeedsCredentials,
    Failed(FailureReason),
    Succeeded(Box<Identity>),
}

/// Authentication token for one request
///
/// Created with status `NoCredentialsGiven`, filled by
/// [`update_credentials`](Self::update_credentials) and resolved exactly once
/// by the authentication provider.
#[derive(Debug)]
pub struct JsonWebToken {
    credentials: Option<EncodedToken>,
    outcome: AuthenticationOutcome,
}

impl Default for JsonWebToken {
    fn default() -> Self {
        Self::new()
    }
}

impl JsonWebToken {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            credentials: None,
            outcome: AuthenticationOutcome::NoCredentials,
        }
    }

    /// Look for a token in `request`.
    ///
    /// Returns `true` if the token now needs to be authenticated.
    pub fn update_credentials(&mut self, request: &impl RequestView, locator: &TokenLocator) -> bool {
        if let Some(encoded) = locator.locate(request) {
            self.credentials = Some(encoded);
            self.outcome = AuthenticationOutcome::NeedsCredentials;
            true
        } else {
            self.credentials = None;
            self.outcome = AuthenticationOutcome::NoCredentials;
            false
        }
    }

    #[must_use]
    pub const fn status(&self) -> AuthenticationStatus {
        match self.outcome {
            AuthenticationOutcome::NoCredentials => AuthenticationStatus::NoCredentialsGiven,
            AuthenticationOutcome::NeedsCredentials => AuthenticationStatus::AuthenticationNeeded,
            AuthenticationOutcome::Failed(_) => AuthenticationStatus::WrongCredentials,
            AuthenticationOutcome::Succeeded(_) => AuthenticationStatus::AuthenticationSuccessful,
        }
    }

    #[must_use]
    pub const fn outcome(&self) -> &AuthenticationOutcome {
        &self.outcome
    }

    #[must_use]
    pub const fn is_authenticated(&self) -> bool {
        matches!(self.outcome, AuthenticationOutcome::Succeeded(_))
    }

    #[must_use]
    pub fn identity(&self) -> Option<&Identity> {
        match &self.outcome {
            AuthenticationOutcome::Succeeded(identity) => Some(identity),
            _ => None,
        }
    }

    /// Internal failure reason, for operator-facing handling only
    #[must_use]
    pub const fn failure_reason(&self) -> Option<FailureReason> {
        match self.outcome {
            AuthenticationOutcome::Failed(reason) => Some(reason),
            _ => None,
        }
    }

    #[must_use]
    pub const fn needs_authentication(&self) -> bool {
        matches!(self.outcome, AuthenticationOutcome::NeedsCredentials)
    }

    /// Move the raw token out; it is not kept past verification.
    pub(crate) const fn take_credentials(&mut self) -> Option<EncodedToken> {
        self.credentials.take()
    }

    pub(crate) fn fail(&mut self, reason: FailureReason) {
        self.resolve(AuthenticationOutcome::Failed(reason));
    }

    pub(crate) fn succeed(&mut self, identity: Identity) {
        self.resolve(AuthenticationOutcome::Succeeded(Box::new(identity)));
    }

    fn resolve(&mut self, outcome: AuthenticationOutcome) {
        if self.needs_authentication() {
            self.credentials = None;
            self.outcome = outcome;
        } else {
            tracing::warn!(
                status = self.status().as_str(),
                "Ignoring second resolution of an authentication token"
            );
        }
    }
}

//! Authentication error types
//!
//! Two layers: [`VerifyError`] describes why a token was rejected and never
//! leaves the authentication attempt (it collapses into the
//! `WrongCredentials` status), while [`AuthError`] covers infrastructure and
//! configuration failures that the host must see.

use thiserror::Error;

/// Failure of the surrounding infrastructure or configuration
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("verification key unavailable: {0}")]
    KeyUnavailable(String),

    #[error("configuration error: {0}")]
    Config(String),
}

impl AuthError {
    #[must_use]
    pub const fn is_key_unavailable(&self) -> bool {
        matches!(self, Self::KeyUnavailable(_))
    }
}

pub type Result<T> = std::result::Result<T, AuthError>;

/// Structured reason code for a rejected (non-expired) token
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvalidReason {
    /// Not a decodable compact JWT (bad segments, base64 or JSON)
    Malformed,
    /// Larger than the accepted token size
    Oversized,
    /// Header algorithm is not in the allow-list
    DisallowedAlgorithm,
    /// Signature does not match the key
    BadSignature,
    /// `nbf` lies in the future
    NotYetValid,
    /// No string `sub` claim
    MissingSubject,
    InvalidIssuer,
    InvalidAudience,
    /// Key material cannot be used with the token's algorithm
    UnusableKey,
}

impl InvalidReason {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Malformed => "malformed",
            Self::Oversized => "oversized",
            Self::DisallowedAlgorithm => "disallowed_algorithm",
            Self::BadSignature => "bad_signature",
            Self::NotYetValid => "not_yet_valid",
            Self::MissingSubject => "missing_subject",
            Self::InvalidIssuer => "invalid_issuer",
            Self::InvalidAudience => "invalid_audience",
            Self::UnusableKey => "unusable_key",
        }
    }
}

impl std::fmt::Display for InvalidReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why the verifier rejected a token
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VerifyError {
    #[error("token expired")]
    Expired,

    #[error("malformed token or invalid signature ({0})")]
    MalformedOrInvalidSignature(InvalidReason),
}

impl VerifyError {
    /// Expiry is routine; everything else deserves operator attention.
    #[must_use]
    pub const fn is_anomaly(&self) -> bool {
        !matches!(self, Self::Expired)
    }

    #[must_use]
    pub const fn reason_code(&self) -> &'static str {
        match self {
            Self::Expired => "expired",
            Self::MalformedOrInvalidSignature(reason) => reason.as_str(),
        }
    }
}

impl From<InvalidReason> for VerifyError {
    fn from(reason: InvalidReason) -> Self {
        Self::MalformedOrInvalidSignature(reason)
    }
}

impl From<jsonwebtoken::errors::Error> for VerifyError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        use jsonwebtoken::errors::ErrorKind;
        match err.kind() {
            ErrorKind::ExpiredSignature => Self::Expired,
            ErrorKind::ImmatureSignature => InvalidReason::NotYetValid.into(),
            ErrorKind::InvalidSignature => InvalidReason::BadSignature.into(),
            ErrorKind::InvalidAlgorithm => InvalidReason::DisallowedAlgorithm.into(),
            ErrorKind::InvalidIssuer => InvalidReason::InvalidIssuer.into(),
            ErrorKind::InvalidAudience => InvalidReason::InvalidAudience.into(),
            ErrorKind::MissingRequiredClaim(claim) => match claim.as_str() {
                "sub" => InvalidReason::MissingSubject.into(),
                "iss" => InvalidReason::InvalidIssuer.into(),
                "aud" => InvalidReason::InvalidAudience.into(),
                _ => InvalidReason::Malformed.into(),
            },
            ErrorKind::InvalidEcdsaKey | ErrorKind::InvalidRsaKey(_) | ErrorKind::InvalidKeyFormat => {
                InvalidReason::UnusableKey.into()
            }
            _ => InvalidReason::Malformed.into(),
        }
    }
}

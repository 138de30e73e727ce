//! Signature and claim verification

use jsonwebtoken::{Algorithm, DecodingKey, Header, Validation, decode, decode_header};
use serde_json::{Map, Value};

use super::claims::ClaimSet;
use super::config::SecurityConfig;
use super::error::{InvalidReason, VerifyError};
use super::jwks::JwkSet;
use super::key_provider::VerificationKey;
use super::token::EncodedToken;
use crate::constants::MAX_TOKEN_SIZE_BYTES;

/// Verifies compact JWS tokens against an algorithm allow-list
#[derive(Debug, Clone)]
pub struct TokenVerifier {
    algorithms: Vec<Algorithm>,
    leeway_secs: u64,
    issuer: Option<String>,
    audience: Vec<String>,
}

impl TokenVerifier {
    #[must_use]
    pub fn new(config: &SecurityConfig) -> Self {
        Self {
            algorithms: config.algorithms.clone(),
            leeway_secs: config.leeway.as_secs(),
            issuer: config.issuer.clone(),
            audience: config.audience.clone(),
        }
    }

    #[must_use]
    pub fn algorithms(&self) -> &[Algorithm] {
        &self.algorithms
    }

    /// Check signature, `exp`, `nbf` and the configured `iss`/`aud`, then
    /// return the claims.
    ///
    /// The algorithm named in the token header is only honored when it is on
    /// the allow-list.
    pub fn verify(
        &self,
        token: &EncodedToken,
        key: &VerificationKey,
    ) -> Result<ClaimSet, VerifyError> {
        if token.len() > MAX_TOKEN_SIZE_BYTES {
            return Err(InvalidReason::Oversized.into());
        }

        let header = decode_header(token.as_str()).map_err(|_| InvalidReason::Malformed)?;

        if !self.algorithms.contains(&header.alg) {
            return Err(InvalidReason::DisallowedAlgorithm.into());
        }

        let decoding_key = decoding_key(key.material(), &header)?;
        let validation = self.validation(header.alg);

        let data = decode::<Map<String, Value>>(token.as_str(), &decoding_key, &validation)?;
        ClaimSet::from_map(data.claims)
    }

    fn validation(&self, alg: Algorithm) -> Validation {
        let mut validation = Validation::new(alg);
        validation.leeway = self.leeway_secs;
        validation.validate_nbf = true;

        let mut required = vec!["sub"];

        if let Some(issuer) = &self.issuer {
            validation.set_issuer(&[issuer]);
            required.push("iss");
        }

        if self.audience.is_empty() {
            validation.validate_aud = false;
        } else {
            validation.set_audience(&self.audience);
            required.push("aud");
        }

        validation.set_required_spec_claims(&required);
        validation
    }
}

/// Build the decoding key for the header's algorithm family.
///
/// PEM material is never used as an HMAC secret.
fn decoding_key(material: &str, header: &Header) -> Result<DecodingKey, InvalidReason> {
    if let Some(set) = JwkSet::from_material(material) {
        return set?.select(header.kid.as_deref(), header.alg);
    }

    let bytes = material.as_bytes();
    let key = match header.alg {
        Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512 => {
            if material.trim_start().starts_with("-----BEGIN") {
                return Err(InvalidReason::UnusableKey);
            }
            Ok(DecodingKey::from_secret(bytes))
        }
        Algorithm::RS256
        | Algorithm::RS384
        | Algorithm::RS512
        | Algorithm::PS256
        | Algorithm::PS384
        | Algorithm::PS512 => DecodingKey::from_rsa_pem(bytes),
        Algorithm::ES256 | Algorithm::ES384 => DecodingKey::from_ec_pem(bytes),
        Algorithm::EdDSA => DecodingKey::from_ed_pem(bytes),
    };

    key.map_err(|_| InvalidReason::UnusableKey)
}

//! JWKS key material
//!
//! A key document that starts with `{` is read as a JSON Web Key Set and the
//! decoding key is picked per token from the header's `kid` and `alg`.

use jsonwebtoken::{Algorithm, DecodingKey};
use serde::Deserialize;

use super::error::InvalidReason;

/// JSON Web Key
#[derive(Debug, Clone, Deserialize)]
pub struct Jwk {
    /// Key ID
    #[serde(default)]
    pub kid: Option<String>,
    /// Key type (RSA, EC, OKP, oct)
    pub kty: String,
    #[serde(default)]
    pub alg: Option<String>,
    /// Key usage
    #[serde(default)]
    pub r#use: Option<String>,
    // RSA components
    #[serde(default)]
    pub n: Option<String>,
    #[serde(default)]
    pub e: Option<String>,
    // EC / OKP components
    #[serde(default)]
    pub crv: Option<String>,
    #[serde(default)]
    pub x: Option<String>,
    #[serde(default)]
    pub y: Option<String>,
    // Symmetric key
    #[serde(default)]
    pub k: Option<String>,
}

impl Jwk {
    /// Whether this key may verify a token signed with `alg`.
    ///
    /// An explicit `alg` must match exactly; otherwise the key type and curve
    /// decide.
    #[must_use]
    pub fn accepts(&self, alg: Algorithm) -> bool {
        if self.r#use.as_deref().is_some_and(|u| u != "sig") {
            return false;
        }

        if let Some(declared) = self.alg.as_deref() {
            return declared.parse::<Algorithm>().is_ok_and(|a| a == alg);
        }

        match self.kty.as_str() {
            "RSA" => matches!(
                alg,
                Algorithm::RS256
                    | Algorithm::RS384
                    | Algorithm::RS512
                    | Algorithm::PS256
                    | Algorithm::PS384
                    | Algorithm::PS512
            ),
            "EC" => matches!(
                (self.crv.as_deref(), alg),
                (Some("P-256"), Algorithm::ES256) | (Some("P-384"), Algorithm::ES384)
            ),
            "OKP" => self.crv.as_deref() == Some("Ed25519") && alg == Algorithm::EdDSA,
            "oct" => matches!(alg, Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512),
            _ => false,
        }
    }

    fn decoding_key(&self) -> Option<DecodingKey> {
        let key = match self.kty.as_str() {
            "RSA" => DecodingKey::from_rsa_components(self.n.as_deref()?, self.e.as_deref()?),
            "EC" => DecodingKey::from_ec_components(self.x.as_deref()?, self.y.as_deref()?),
            "OKP" => DecodingKey::from_ed_components(self.x.as_deref()?),
            "oct" => DecodingKey::from_base64_secret(self.k.as_deref()?),
            other => {
                tracing::debug!(kty = other, "Skipping unsupported key type");
                return None;
            }
        };

        key.map_err(|e| tracing::debug!(kid = ?self.kid, error = %e, "Unusable JWK"))
            .ok()
    }
}

/// JSON Web Key Set
#[derive(Debug, Clone, Deserialize)]
pub struct JwkSet {
    pub keys: Vec<Jwk>,
}

impl JwkSet {
    /// Parse key material that looks like a JWKS document.
    ///
    /// Returns `None` for material that is not JSON (a PEM key or a secret).
    /// A single bare JWK is accepted as a one-key set.
    pub fn from_material(material: &str) -> Option<Result<Self, InvalidReason>> {
        let trimmed = material.trim_start();
        if !trimmed.starts_with('{') {
            return None;
        }

        let value: serde_json::Value = match serde_json::from_str(trimmed) {
            Ok(v) => v,
            Err(_) => return Some(Err(InvalidReason::UnusableKey)),
        };

        let parsed = if value.get("keys").is_some() {
            serde_json::from_value::<Self>(value)
        } else {
            serde_json::from_value::<Jwk>(value).map(|jwk| Self { keys: vec![jwk] })
        };

        Some(parsed.map_err(|_| InvalidReason::UnusableKey))
    }

    /// Pick the decoding key for a token header.
    ///
    /// With a `kid` only that key is considered; without one the first key
    /// accepting `alg` is used.
    pub fn select(&self, kid: Option<&str>, alg: Algorithm) -> Result<DecodingKey, InvalidReason> {
        self.keys
            .iter()
            .filter(|jwk| kid.is_none_or(|kid| jwk.kid.as_deref() == Some(kid)))
            .filter(|jwk| jwk.accepts(alg))
            .find_map(Jwk::decoding_key)
            .ok_or(InvalidReason::UnusableKey)
    }
}

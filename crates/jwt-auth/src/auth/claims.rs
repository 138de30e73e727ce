//! Verified claim sets

use serde::Serialize;
use serde_json::{Map, Value};

use super::error::{InvalidReason, VerifyError};

/// Claims decoded from a verified token body
///
/// Always carries a non-empty string `sub`; construction fails otherwise.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ClaimSet {
    claims: Map<String, Value>,
}

impl ClaimSet {
    pub fn from_map(claims: Map<String, Value>) -> Result<Self, VerifyError> {
        match claims.get("sub") {
            Some(Value::String(sub)) if !sub.is_empty() => Ok(Self { claims }),
            _ => Err(InvalidReason::MissingSubject.into()),
        }
    }

    /// The subject claim
    #[must_use]
    pub fn subject(&self) -> &str {
        self.claims
            .get("sub")
            .and_then(Value::as_str)
            .unwrap_or_default()
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.claims.get(name)
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.claims.contains_key(name)
    }

    /// Values of a claim, treating a scalar as a one-element list.
    ///
    /// A missing claim (or an explicit `null`) yields nothing.
    #[must_use]
    pub fn values(&self, name: &str) -> Vec<&Value> {
        match self.claims.get(name) {
            None | Some(Value::Null) => Vec::new(),
            Some(Value::Array(items)) => items.iter().collect(),
            Some(other) => vec![other],
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.claims.iter()
    }

    #[must_use]
    pub const fn as_map(&self) -> &Map<String, Value> {
        &self.claims
    }
}

//! Authenticated identities and roles

use std::collections::BTreeSet;
use std::collections::HashSet;
use std::fmt;

use serde::Serialize;
use serde_json::Value;

use super::claims::ClaimSet;
use super::error::{AuthError, Result};

/// A role known to the host's policy
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct Role {
    identifier: String,
}

impl Role {
    #[must_use]
    pub fn new(identifier: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
        }
    }

    #[must_use]
    pub fn identifier(&self) -> &str {
        &self.identifier
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.identifier)
    }
}

/// Resolves role names to roles of the host's policy
pub trait RoleResolver: Send + Sync {
    /// Fails with a configuration error for unknown names.
    fn get_role(&self, name: &str) -> Result<Role>;
}

/// Resolver over a fixed set of role names
#[derive(Debug, Clone, Default)]
pub struct StaticRoleResolver {
    roles: HashSet<String>,
}

impl StaticRoleResolver {
    pub fn new<I, S>(roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            roles: roles.into_iter().map(Into::into).collect(),
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.roles.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.roles.is_empty()
    }
}

impl RoleResolver for StaticRoleResolver {
    fn get_role(&self, name: &str) -> Result<Role> {
        if self.roles.contains(name) {
            Ok(Role::new(name))
        } else {
            Err(AuthError::Config(format!("role '{name}' is not defined")))
        }
    }
}

/// The authenticated principal attached to a successful token
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Identity {
    account_identifier: String,
    provider_name: String,
    roles: BTreeSet<Role>,
    claims: ClaimSet,
}

impl Identity {
    /// The account identifier is the token subject.
    #[must_use]
    pub fn new(claims: ClaimSet, roles: BTreeSet<Role>, provider_name: impl Into<String>) -> Self {
        Self {
            account_identifier: claims.subject().to_owned(),
            provider_name: provider_name.into(),
            roles,
            claims,
        }
    }

    #[must_use]
    pub fn account_identifier(&self) -> &str {
        &self.account_identifier
    }

    #[must_use]
    pub fn provider_name(&self) -> &str {
        &self.provider_name
    }

    #[must_use]
    pub const fn roles(&self) -> &BTreeSet<Role> {
        &self.roles
    }

    #[must_use]
    pub fn has_role(&self, identifier: &str) -> bool {
        self.roles.iter().any(|r| r.identifier() == identifier)
    }

    /// Any claim of the verified token, by name
    #[must_use]
    pub fn claim(&self, name: &str) -> Option<&Value> {
        self.claims.get(name)
    }

    #[must_use]
    pub const fn claims(&self) -> &ClaimSet {
        &self.claims
    }
}

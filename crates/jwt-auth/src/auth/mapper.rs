//! Claims to identity projection

use std::collections::BTreeSet;
use std::sync::Arc;

use serde_json::Value;

use super::claims::ClaimSet;
use super::config::ClaimMapping;
use super::error::Result;
use super::identity::{Identity, Role, RoleResolver};

/// Builds identities from verified claims
pub struct ClaimsToIdentityMapper {
    mapping: ClaimMapping,
    resolver: Arc<dyn RoleResolver>,
    provider_name: String,
}

impl std::fmt::Debug for ClaimsToIdentityMapper {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClaimsToIdentityMapper")
            .field("mapping", &self.mapping)
            .field("provider_name", &self.provider_name)
            .finish_non_exhaustive()
    }
}

impl ClaimsToIdentityMapper {
    #[must_use]
    pub fn new(
        mapping: ClaimMapping,
        resolver: Arc<dyn RoleResolver>,
        provider_name: impl Into<String>,
    ) -> Self {
        Self {
            mapping,
            resolver,
            provider_name: provider_name.into(),
        }
    }

    /// Check that every mapped role name resolves
    pub fn validate(&self) -> Result<()> {
        for name in self.mapping.role_names() {
            self.resolver.get_role(name)?;
        }
        Ok(())
    }

    pub fn project(&self, claims: ClaimSet) -> Result<Identity> {
        let roles = self.roles(&claims)?;
        Ok(Identity::new(claims, roles, self.provider_name.clone()))
    }

    fn roles(&self, claims: &ClaimSet) -> Result<BTreeSet<Role>> {
        let mut roles = BTreeSet::new();

        let Some(field) = self.mapping.role_field() else {
            return Ok(roles);
        };

        for value in claims.values(field) {
            let Some(claim_value) = lookup_key(value) else {
                tracing::debug!(claim = field, "Skipping non-scalar role claim value");
                continue;
            };

            // Unmapped values are not an error
            if let Some(role_name) = self.mapping.roles.get(&claim_value) {
                roles.insert(self.resolver.get_role(role_name)?);
            }
        }

        Ok(roles)
    }
}

fn lookup_key(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

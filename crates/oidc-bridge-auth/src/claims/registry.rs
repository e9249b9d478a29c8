//! Scope to claims lookup table.

use indexmap::{IndexMap, IndexSet};

use crate::config::ScopeConfig;

/// A scope and the claims it grants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScopeDefinition {
    pub name: String,
    pub description: String,
    /// Claim names in emission order, without duplicates.
    pub claims: Vec<String>,
}

/// Immutable scope table, built once from configuration.
#[derive(Debug, Clone, Default)]
pub struct ScopeClaimRegistry {
    scopes: IndexMap<String, ScopeDefinition>,
}

impl ScopeClaimRegistry {
    /// Builds the registry from the configured scope table.
    ///
    /// Duplicate claim names inside one scope keep their first position.
    #[must_use]
    pub fn from_config(scopes: &IndexMap<String, ScopeConfig>) -> Self {
        let scopes = scopes
            .iter()
            .map(|(name, scope)| {
                let claims: IndexSet<String> = scope.claims.iter().cloned().collect();
                let definition = ScopeDefinition {
                    name: name.clone(),
                    description: scope.description.clone(),
                    claims: claims.into_iter().collect(),
                };
                (name.clone(), definition)
            })
            .collect();
        Self { scopes }
    }

    /// Looks up a scope.
    #[must_use]
    pub fn get(&self, scope: &str) -> Option<&ScopeDefinition> {
        self.scopes.get(scope)
    }

    /// Returns `true` if the scope is known.
    #[must_use]
    pub fn contains(&self, scope: &str) -> bool {
        self.scopes.contains_key(scope)
    }

    /// Claims granted by a scope; empty for unknown scopes.
    #[must_use]
    pub fn claims_for(&self, scope: &str) -> &[String] {
        self.scopes
            .get(scope)
            .map(|s| s.claims.as_slice())
            .unwrap_or_default()
    }

    /// Scope names in configuration order.
    pub fn scope_names(&self) -> impl Iterator<Item = &str> {
        self.scopes.keys().map(String::as_str)
    }

    /// Iterates over all scope definitions in configuration order.
    pub fn iter(&self) -> impl Iterator<Item = &ScopeDefinition> {
        self.scopes.values()
    }

    /// Ordered, de-duplicated claim names for the requested scopes.
    ///
    /// Follows the order of `scopes`, then claim order within each scope.
    /// Unknown scopes contribute nothing.
    #[must_use]
    pub fn claims_for_scopes<S: AsRef<str>>(&self, scopes: &[S]) -> IndexSet<String> {
        scopes
            .iter()
            .flat_map(|scope| self.claims_for(scope.as_ref()).iter().cloned())
            .collect()
    }

    /// Every claim name declared by any scope, de-duplicated.
    #[must_use]
    pub fn all_claims(&self) -> IndexSet<String> {
        self.scopes
            .values()
            .flat_map(|s| s.claims.iter().cloned())
            .collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.scopes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.scopes.is_empty()
    }
}

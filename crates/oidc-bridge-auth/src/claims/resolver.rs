//! Per-claim value resolution.
//!
//! Lookup order for a claim name:
//!
//! 1. the per-deployment override table
//! 2. the reserved `sub` claim, answered from [`OidcUser::subject`]
//! 3. the default table
//! 4. otherwise absent
//!
//! A `null` result is treated as absent. Only a failing computation is an
//! error.

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use serde_json::Value;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

use super::registry::ScopeClaimRegistry;
use super::service::ClaimSet;
use super::user::OidcUser;
use crate::config::OidcConfig;
use crate::error::{AuthError, AuthResult};

/// A claim computation over a user.
pub type ClaimFn = dyn Fn(&dyn OidcUser) -> anyhow::Result<Option<Value>> + Send + Sync;

/// Where a claim value comes from.
#[derive(Clone)]
pub enum ClaimSource {
    /// Read the named user attribute.
    Attribute(String),
    /// Run a computation.
    Computed(Arc<ClaimFn>),
}

impl ClaimSource {
    /// Wraps a closure as a computed source.
    pub fn computed<F>(f: F) -> Self
    where
        F: Fn(&dyn OidcUser) -> anyhow::Result<Option<Value>> + Send + Sync + 'static,
    {
        Self::Computed(Arc::new(f))
    }

    fn evaluate(&self, claim: &str, user: &dyn OidcUser) -> AuthResult<Option<Value>> {
        let value = match self {
            Self::Attribute(attribute) => user.attribute(attribute),
            Self::Computed(f) => {
                f(user).map_err(|e| AuthError::claim_resolution(claim, format!("{e:#}")))?
            }
        };
        Ok(value.filter(|v| !v.is_null()))
    }
}

impl fmt::Debug for ClaimSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Attribute(name) => f.debug_tuple("Attribute").field(name).finish(),
            Self::Computed(_) => f.write_str("Computed(..)"),
        }
    }
}

/// Ordered claim name to source mapping.
#[derive(Debug, Clone, Default)]
pub struct ClaimResolverTable {
    entries: IndexMap<String, ClaimSource>,
}

impl ClaimResolverTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a table of attribute reads.
    #[must_use]
    pub fn from_attributes(map: &IndexMap<String, String>) -> Self {
        let entries = map
            .iter()
            .map(|(claim, attr)| (claim.clone(), ClaimSource::Attribute(attr.clone())))
            .collect();
        Self { entries }
    }

    /// Built-in computations: `email_verified` from `email_verified_at` and
    /// `updated_at` as epoch seconds.
    #[must_use]
    pub fn standard_defaults() -> Self {
        let mut table = Self::new();
        table.insert(
            "email_verified",
            ClaimSource::computed(|user| {
                let verified = user
                    .attribute("email_verified_at")
                    .is_some_and(|v| !v.is_null());
                Ok(Some(Value::Bool(verified)))
            }),
        );
        table.insert("updated_at", ClaimSource::computed(updated_at_timestamp));
        table
    }

    /// Inserts or replaces an entry.
    pub fn insert(&mut self, claim: impl Into<String>, source: ClaimSource) {
        self.entries.insert(claim.into(), source);
    }

    #[must_use]
    pub fn get(&self, claim: &str) -> Option<&ClaimSource> {
        self.entries.get(claim)
    }

    #[must_use]
    pub fn contains(&self, claim: &str) -> bool {
        self.entries.contains_key(claim)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn updated_at_timestamp(user: &dyn OidcUser) -> anyhow::Result<Option<Value>> {
    match user.attribute("updated_at") {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => Ok(Some(Value::Number(n))),
        Some(Value::String(s)) => {
            let parsed = OffsetDateTime::parse(&s, &Rfc3339)?;
            Ok(Some(Value::from(parsed.unix_timestamp())))
        }
        Some(other) => anyhow::bail!("updated_at has unsupported type: {other}"),
    }
}

/// Resolves claim values for users.
///
/// Immutable after construction and safe to share across requests.
#[derive(Debug, Clone)]
pub struct ClaimsResolver {
    registry: Arc<ScopeClaimRegistry>,
    overrides: ClaimResolverTable,
    defaults: ClaimResolverTable,
}

impl ClaimsResolver {
    /// Creates a resolver from explicit tables.
    #[must_use]
    pub fn new(
        registry: Arc<ScopeClaimRegistry>,
        overrides: ClaimResolverTable,
        defaults: ClaimResolverTable,
    ) -> Self {
        Self {
            registry,
            overrides,
            defaults,
        }
    }

    /// Creates a resolver from configuration.
    ///
    /// Defaults are the built-in computations overlaid with the configured
    /// `default_claims_map`; overrides come from `claims_resolver`.
    #[must_use]
    pub fn from_config(config: &OidcConfig) -> Self {
        Self::builder(Arc::new(ScopeClaimRegistry::from_config(&config.scopes)))
            .config_tables(config)
            .build()
    }

    /// Starts a builder for programmatic resolver entries.
    #[must_use]
    pub fn builder(registry: Arc<ScopeClaimRegistry>) -> ClaimsResolverBuilder {
        ClaimsResolverBuilder {
            registry,
            overrides: ClaimResolverTable::new(),
            defaults: ClaimResolverTable::standard_defaults(),
        }
    }

    #[must_use]
    pub fn registry(&self) -> &Arc<ScopeClaimRegistry> {
        &self.registry
    }

    /// Resolves one claim for a user.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::ClaimResolution`] if a computation fails.
    pub fn resolve(&self, user: &dyn OidcUser, claim: &str) -> AuthResult<Option<Value>> {
        if let Some(source) = self.overrides.get(claim) {
            return source.evaluate(claim, user);
        }

        if claim == "sub" {
            return Ok(Some(Value::String(user.subject())));
        }

        match self.defaults.get(claim) {
            Some(source) => source.evaluate(claim, user),
            None => Ok(None),
        }
    }

    /// Resolves every claim granted by `scopes`, omitting absent values.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::ClaimResolution`] if a computation fails.
    pub fn resolve_scopes(&self, user: &dyn OidcUser, scopes: &[String]) -> AuthResult<ClaimSet> {
        let mut claims = ClaimSet::new();
        for claim in self.registry.claims_for_scopes(scopes) {
            if let Some(value) = self.resolve(user, &claim)? {
                claims.insert(claim, value);
            }
        }
        Ok(claims)
    }
}

/// Builder for [`ClaimsResolver`].
#[derive(Debug)]
pub struct ClaimsResolverBuilder {
    registry: Arc<ScopeClaimRegistry>,
    overrides: ClaimResolverTable,
    defaults: ClaimResolverTable,
}

impl ClaimsResolverBuilder {
    /// Adds the attribute tables from configuration.
    #[must_use]
    pub fn config_tables(mut self, config: &OidcConfig) -> Self {
        for (claim, attr) in &config.default_claims_map {
            self.defaults
                .insert(claim.clone(), ClaimSource::Attribute(attr.clone()));
        }
        for (claim, attr) in &config.claims_resolver {
            self.overrides
                .insert(claim.clone(), ClaimSource::Attribute(attr.clone()));
        }
        self
    }

    /// Adds an override entry.
    #[must_use]
    pub fn override_claim(mut self, claim: impl Into<String>, source: ClaimSource) -> Self {
        self.overrides.insert(claim, source);
        self
    }

    /// Adds a default entry.
    #[must_use]
    pub fn default_claim(mut self, claim: impl Into<String>, source: ClaimSource) -> Self {
        self.defaults.insert(claim, source);
        self
    }

    /// Drops the built-in default computations.
    #[must_use]
    pub fn without_standard_defaults(mut self) -> Self {
        self.defaults = ClaimResolverTable::new();
        self
    }

    #[must_use]
    pub fn build(self) -> ClaimsResolver {
        ClaimsResolver::new(self.registry, self.overrides, self.defaults)
    }
}

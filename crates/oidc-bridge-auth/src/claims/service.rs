//! Claims service: canonical `sub` plus scope-driven claims.

use std::sync::Arc;

use indexmap::{IndexMap, IndexSet};
use serde_json::Value;

use super::resolver::ClaimsResolver;
use super::user::OidcUser;
use crate::AuthResult;

/// An ordered claim map. Serializes as a JSON object in insertion order.
pub type ClaimSet = IndexMap<String, Value>;

/// Claims every ID token carries regardless of scope.
pub const PROTOCOL_CLAIMS: [&str; 6] = ["sub", "iss", "aud", "exp", "iat", "auth_time"];

/// Produces claim sets for users and advertises supported claims.
#[derive(Debug, Clone)]
pub struct ClaimsService {
    resolver: Arc<ClaimsResolver>,
}

impl ClaimsService {
    #[must_use]
    pub fn new(resolver: Arc<ClaimsResolver>) -> Self {
        Self { resolver }
    }

    #[must_use]
    pub fn resolver(&self) -> &Arc<ClaimsResolver> {
        &self.resolver
    }

    /// Claims for `user` under `scopes`.
    ///
    /// `sub` is always present, always first and always equal to
    /// `user.subject()`, whatever the user's `claims` returned for it.
    ///
    /// # Errors
    ///
    /// Propagates claim computation failures.
    pub fn resolve_for_user(&self, user: &dyn OidcUser, scopes: &[String]) -> AuthResult<ClaimSet> {
        let mut claims = ClaimSet::new();
        claims.insert("sub".to_string(), Value::String(user.subject()));

        for (name, value) in user.claims(scopes, &self.resolver)? {
            if name != "sub" && !value.is_null() {
                claims.insert(name, value);
            }
        }

        Ok(claims)
    }

    /// Protocol claims followed by every scope-declared claim, de-duplicated.
    ///
    /// For advertisement only.
    #[must_use]
    pub fn supported_claims(&self) -> IndexSet<String> {
        let mut claims: IndexSet<String> = PROTOCOL_CLAIMS.iter().map(|c| (*c).to_string()).collect();
        claims.extend(self.resolver.registry().all_claims());
        claims
    }
}

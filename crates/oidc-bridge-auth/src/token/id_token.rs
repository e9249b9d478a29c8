//! ID token minting.

use std::sync::Arc;

use oidc_bridge_core::{EventBroadcaster, OidcEvent};
use serde_json::Value;
use time::OffsetDateTime;
use tracing::{debug, instrument};

use super::keys::KeyMaterial;
use crate::claims::{ClaimSet, ClaimsService, OidcUser};
use crate::error::{AuthError, AuthResult};
use crate::types::{AccessToken, Client};

/// Claims set by the minter that resolved claims may not replace.
const RESERVED_CLAIMS: [&str; 7] = ["iss", "aud", "exp", "iat", "sub", "auth_time", "nonce"];

/// Mints signed ID tokens for issued access tokens.
#[derive(Clone)]
pub struct IdTokenMinter {
    keys: KeyMaterial,
    claims: ClaimsService,
    issuer: String,
    events: Option<Arc<EventBroadcaster>>,
}

impl IdTokenMinter {
    /// `issuer` is used as given; pass [`crate::OidcConfig::issuer`].
    #[must_use]
    pub fn new(keys: KeyMaterial, claims: ClaimsService, issuer: impl Into<String>) -> Self {
        Self {
            keys,
            claims,
            issuer: issuer.into(),
            events: None,
        }
    }

    /// Publishes [`OidcEvent::TokenIssued`] after every successful mint.
    #[must_use]
    pub fn with_events(mut self, events: Arc<EventBroadcaster>) -> Self {
        self.events = Some(events);
        self
    }

    /// Builds and signs the ID token for `access_token`.
    ///
    /// `exp` follows the access token, `auth_time` and `iat` are now.
    /// An empty nonce is treated as absent.
    ///
    /// # Errors
    /// Fails if a claim computation fails or the signing key is unavailable.
    #[instrument(skip_all, fields(client_id = %client.client_id))]
    pub fn mint(
        &self,
        access_token: &AccessToken,
        user: &dyn OidcUser,
        client: &Client,
        nonce: Option<&str>,
    ) -> AuthResult<String> {
        let claims = self.build_claims(access_token, user, client, nonce)?;

        let jwt = self.keys.jwt_service()?;
        let id_token = jwt
            .encode(&claims)
            .map_err(|e| AuthError::signing(e.to_string()))?;

        let subject = user.subject();
        debug!(sub = %subject, "ID token minted");

        if let Some(events) = &self.events {
            events.send(OidcEvent::token_issued(
                subject,
                client.client_id.clone(),
                access_token.scopes.clone(),
            ));
        }

        Ok(id_token)
    }

    fn build_claims(
        &self,
        access_token: &AccessToken,
        user: &dyn OidcUser,
        client: &Client,
        nonce: Option<&str>,
    ) -> AuthResult<ClaimSet> {
        let now = OffsetDateTime::now_utc().unix_timestamp();

        let mut claims = ClaimSet::new();
        claims.insert("iss".into(), Value::String(self.issuer.clone()));
        claims.insert("aud".into(), Value::String(client.client_id.clone()));
        claims.insert("iat".into(), Value::from(now));
        claims.insert("exp".into(), Value::from(access_token.expires_at.unix_timestamp()));
        claims.insert("sub".into(), Value::String(user.subject()));
        claims.insert("auth_time".into(), Value::from(now));

        if let Some(nonce) = nonce.filter(|n| !n.is_empty()) {
            claims.insert("nonce".into(), Value::String(nonce.to_string()));
        }

        for (name, value) in self.claims.resolve_for_user(user, &access_token.scopes)? {
            if !RESERVED_CLAIMS.contains(&name.as_str()) {
                claims.insert(name, value);
            }
        }

        Ok(claims)
    }
}

//! Token revocation endpoint handler (RFC 7009).
//!
//! # Request Format
//!
//! ```text
//! POST /oauth/revoke
//! Content-Type: application/x-www-form-urlencoded
//! Authorization: Basic <client_credentials>
//!
//! token=<token_to_revoke>&token_type_hint=refresh_token
//! ```
//!
//! # Response
//!
//! Always `200 {}` once the client has authenticated and the hint is valid,
//! whether or not the token existed.

use axum::{
    Form, Json,
    extract::State,
    http::{HeaderMap, header},
};
use serde::Deserialize;
use serde_json::{Value, json};

use super::state::OidcState;
use crate::error::AuthResult;
use crate::oauth::{ClientCredentials, authenticate_client};
use crate::token::{RevocationOutcome, RevocationRequest};

/// Form parameters for the revocation endpoint.
#[derive(Debug, Default, Deserialize)]
pub struct RevocationForm {
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub token_type_hint: Option<String>,
    #[serde(default)]
    pub client_id: Option<String>,
    #[serde(default)]
    pub client_secret: Option<String>,
}

impl RevocationForm {
    fn credentials(&self) -> ClientCredentials {
        ClientCredentials {
            client_id: self.client_id.clone(),
            client_secret: self.client_secret.clone(),
        }
    }

    fn request(&self) -> RevocationRequest {
        RevocationRequest {
            token: self.token.clone(),
            token_type_hint: self.token_type_hint.clone(),
        }
    }
}

/// Handler for `POST /oauth/revoke`.
pub async fn revoke_handler(
    State(state): State<OidcState>,
    headers: HeaderMap,
    Form(form): Form<RevocationForm>,
) -> AuthResult<Json<Value>> {
    let authorization = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok());
    let client =
        authenticate_client(authorization, &form.credentials(), state.stores.clients.as_ref())
            .await?
            .client;

    if let RevocationOutcome::NotFound = state.lifecycle.revoke(&client, &form.request()).await? {
        tracing::debug!(client_id = %client.client_id, "Revocation matched no token");
    }

    Ok(Json(json!({})))
}

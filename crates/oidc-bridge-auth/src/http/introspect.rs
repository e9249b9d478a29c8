//! Token introspection endpoint handler (RFC 7662).
//!
//! # Request Format
//!
//! ```text
//! POST /oauth/introspect
//! Content-Type: application/x-www-form-urlencoded
//! Authorization: Basic <client_credentials>
//!
//! token=<token>&token_type_hint=access_token
//! ```

use axum::{
    Form, Json,
    extract::State,
    http::{HeaderMap, header},
};
use serde::Deserialize;

use super::state::OidcState;
use crate::error::AuthResult;
use crate::oauth::{ClientCredentials, authenticate_client};
use crate::token::{IntrospectionRequest, IntrospectionResponse};

/// Form parameters for the introspection endpoint.
#[derive(Debug, Default, Deserialize)]
pub struct IntrospectionForm {
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub token_type_hint: Option<String>,
    #[serde(default)]
    pub client_id: Option<String>,
    #[serde(default)]
    pub client_secret: Option<String>,
}

impl IntrospectionForm {
    fn credentials(&self) -> ClientCredentials {
        ClientCredentials {
            client_id: self.client_id.clone(),
            client_secret: self.client_secret.clone(),
        }
    }

    fn request(&self) -> IntrospectionRequest {
        IntrospectionRequest {
            token: self.token.clone(),
            token_type_hint: self.token_type_hint.clone(),
        }
    }
}

/// Handler for `POST /oauth/introspect`.
///
/// 401 for failed client authentication, 400 for an unknown hint, otherwise
/// 200 with either the token metadata or `{"active": false}`.
pub async fn introspect_handler(
    State(state): State<OidcState>,
    headers: HeaderMap,
    Form(form): Form<IntrospectionForm>,
) -> AuthResult<Json<IntrospectionResponse>> {
    let authorization = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok());
    let client =
        authenticate_client(authorization, &form.credentials(), state.stores.clients.as_ref())
            .await?
            .client;

    let response = state.lifecycle.introspect(&client, &form.request()).await?;
    Ok(Json(response))
}

//! OpenID Connect discovery handler.
//!
//! Provides `/.well-known/openid-configuration`. Every endpoint URL is built
//! from the configured issuer, never from the bind address.

use axum::Json;
use axum::extract::State;
use axum::http::header;
use axum::response::IntoResponse;
use serde_json::{Value, json};

use super::state::OidcState;

/// Handler for `GET /.well-known/openid-configuration`.
pub async fn openid_configuration_handler(State(state): State<OidcState>) -> impl IntoResponse {
    (
        [
            (header::CONTENT_TYPE, "application/json"),
            (header::CACHE_CONTROL, "public, max-age=3600"),
        ],
        Json(discovery_document(&state)),
    )
}

/// Builds the discovery document.
#[must_use]
pub fn discovery_document(state: &OidcState) -> Value {
    let config = &state.config;
    let base = state.issuer();
    let scopes: Vec<&str> = state.claims.resolver().registry().scope_names().collect();

    json!({
        "issuer": base,
        "authorization_endpoint": format!("{base}/oauth/authorize"),
        "token_endpoint": format!("{base}/oauth/token"),
        "userinfo_endpoint": format!("{base}/oauth/userinfo"),
        "jwks_uri": format!("{base}/.well-known/jwks.json"),
        "end_session_endpoint": format!("{base}/oauth/logout"),
        "introspection_endpoint": format!("{base}/oauth/introspect"),
        "revocation_endpoint": format!("{base}/oauth/revoke"),
        "post_logout_redirect_uris_supported": config.post_logout_redirect_uris_supported,
        "response_types_supported": config.response_types_supported,
        "subject_types_supported": config.subject_types_supported,
        "id_token_signing_alg_values_supported": config.id_token_signing_alg_values_supported,
        "scopes_supported": scopes,
        "token_endpoint_auth_methods_supported": config.token_endpoint_auth_methods_supported,
        "claims_supported": state.claims.supported_claims(),
        "code_challenge_methods_supported": config.code_challenge_methods_supported,
        "grant_types_supported": config.grant_types_supported,
        "introspection_endpoint_auth_methods_supported": config.token_endpoint_auth_methods_supported,
        "revocation_endpoint_auth_methods_supported": config.token_endpoint_auth_methods_supported,
    })
}

//! JWKS endpoint handler.
//!
//! Provides `/.well-known/jwks.json` so relying parties can verify ID
//! tokens. Missing key material is a deployment fault and answers 500.
//!
//! # References
//!
//! - [RFC 7517 - JSON Web Key](https://tools.ietf.org/html/rfc7517)

use axum::Json;
use axum::extract::State;
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};

use super::error::oauth_error_body;
use super::state::OidcState;
use crate::token::KeyError;

/// Handler for `GET /.well-known/jwks.json`.
pub async fn jwks_handler(State(state): State<OidcState>) -> Response {
    match state.keys.public_key() {
        Ok(key) => (
            [
                (header::CONTENT_TYPE, "application/json"),
                (header::CACHE_CONTROL, "public, max-age=86400"),
            ],
            Json(key.jwks()),
        )
            .into_response(),
        Err(e) => {
            tracing::error!(error = %e, "JWKS requested without usable key material");
            let (error, description) = match e {
                KeyError::Missing(_) => (
                    "Public key not found",
                    "The OAuth public key has not been generated.",
                ),
                KeyError::Invalid(_) => ("Invalid public key", "Unable to parse the public key."),
            };
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(oauth_error_body(error, description)),
            )
                .into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::OidcConfig;
    use crate::http::test_support::{state_with, state_with_keys};
    use crate::token::KeyMaterial;
    use axum::body::to_bytes;

    async fn body(response: Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_jwks_returns_rs256_key() {
        let state = state_with(OidcConfig::default());
        let kid = state.keys.public_key().unwrap().kid().to_string();

        let response = jwks_handler(State(state)).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CACHE_CONTROL], "public, max-age=86400");

        let jwks = body(response).await;
        let key = &jwks["keys"][0];
        assert_eq!(key["kty"], "RSA");
        assert_eq!(key["alg"], "RS256");
        assert_eq!(key["use"], "sig");
        assert_eq!(key["kid"], kid.as_str());
        assert_eq!(key["e"], "AQAB");
    }

    #[tokio::test]
    async fn test_missing_key_is_500() {
        let state = state_with_keys(OidcConfig::default(), KeyMaterial::missing());

        let response = jwks_handler(State(state)).await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = body(response).await;
        assert_eq!(body["error"], "Public key not found");
        assert_eq!(body["error_description"], "The OAuth public key has not been generated.");
    }
}

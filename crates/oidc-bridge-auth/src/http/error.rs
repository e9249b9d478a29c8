//! OAuth JSON rendering of [`AuthError`].
//!
//! Errors render as `{"error": ..., "error_description": ...}`. 401
//! responses also carry a `WWW-Authenticate` challenge. Server-side faults
//! are logged in full and rendered with a generic description.

use axum::{
    Json,
    http::{HeaderMap, HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use serde_json::json;

use crate::error::AuthError;

const SERVER_ERROR_DESCRIPTION: &str = "The server encountered an unexpected condition.";

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = status_code(&self);
        let oauth_error = self.oauth_error_code();

        let description = if self.is_server_error() {
            tracing::error!(error = %self, category = %self.category(), "Request failed");
            SERVER_ERROR_DESCRIPTION.to_string()
        } else {
            tracing::debug!(error = %self, category = %self.category(), "Request rejected");
            description(&self)
        };

        let mut headers = HeaderMap::new();
        headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-store"));

        if status == StatusCode::UNAUTHORIZED {
            let challenge = build_www_authenticate_header(oauth_error, &description);
            if let Ok(value) = HeaderValue::from_str(&challenge) {
                headers.insert(header::WWW_AUTHENTICATE, value);
            }
        }

        (status, headers, Json(oauth_error_body(oauth_error, &description))).into_response()
    }
}

/// `{"error": .., "error_description": ..}`.
#[must_use]
pub fn oauth_error_body(error: &str, description: &str) -> serde_json::Value {
    json!({
        "error": error,
        "error_description": description,
    })
}

fn status_code(error: &AuthError) -> StatusCode {
    match error {
        AuthError::InvalidClient { .. }
        | AuthError::InvalidToken { .. }
        | AuthError::Unauthorized { .. }
        | AuthError::TokenExpired
        | AuthError::TokenRevoked => StatusCode::UNAUTHORIZED,
        AuthError::InvalidRequest { .. } | AuthError::UnsupportedTokenType { .. } => {
            StatusCode::BAD_REQUEST
        }
        AuthError::ClaimResolution { .. }
        | AuthError::Signing { .. }
        | AuthError::KeyMaterial { .. }
        | AuthError::Storage { .. }
        | AuthError::Configuration { .. }
        | AuthError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn description(error: &AuthError) -> String {
    match error {
        AuthError::InvalidClient { message }
        | AuthError::InvalidToken { message }
        | AuthError::InvalidRequest { message }
        | AuthError::UnsupportedTokenType { message }
        | AuthError::Unauthorized { message } => message.clone(),
        AuthError::TokenExpired => "The access token has expired.".to_string(),
        AuthError::TokenRevoked => "The access token has been revoked.".to_string(),
        other => other.to_string(),
    }
}

/// Format: `Bearer realm="oidc", error="invalid_token", error_description="..."`
fn build_www_authenticate_header(error: &str, description: &str) -> String {
    let escaped = description.replace('\\', "\\\\").replace('"', "\\\"");
    format!("Bearer realm=\"oidc\", error=\"{error}\", error_description=\"{escaped}\"")
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_invalid_client_is_401_with_challenge() {
        let response = AuthError::invalid_client("Client authentication failed").into_response();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let challenge = response.headers()[header::WWW_AUTHENTICATE].to_str().unwrap();
        assert!(challenge.starts_with("Bearer realm=\"oidc\""));
        assert!(challenge.contains("error=\"invalid_client\""));

        let body = body_json(response).await;
        assert_eq!(body["error"], "invalid_client");
        assert_eq!(body["error_description"], "Client authentication failed");
    }

    #[tokio::test]
    async fn test_unsupported_token_type_is_400() {
        let response = AuthError::unsupported_token_type("bad hint").into_response();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(!response.headers().contains_key(header::WWW_AUTHENTICATE));
        assert_eq!(body_json(response).await["error"], "unsupported_token_type");
    }

    #[tokio::test]
    async fn test_server_errors_hide_details() {
        let response = AuthError::storage("password=hunter2").into_response();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_json(response).await;
        assert_eq!(body["error"], "server_error");
        assert_eq!(body["error_description"], SERVER_ERROR_DESCRIPTION);
    }

    #[test]
    fn test_challenge_escapes_quotes() {
        let header = build_www_authenticate_header("invalid_token", r#"bad "token""#);
        assert!(header.ends_with(r#"error_description="bad \"token\"""#));
    }
}

//! OpenID Connect UserInfo endpoint.
//!
//! Returns the claims granted by the bearer token's scopes, resolved through
//! [`crate::claims::ClaimsService`]. JWT access tokens are verified against
//! the deployment key before their `jti` is trusted; opaque tokens are
//! looked up directly.
//!
//! # References
//!
//! - [OpenID Connect UserInfo](https://openid.net/specs/openid-connect-core-1_0.html#UserInfo)

use axum::Json;
use axum::extract::State;
use axum::http::{HeaderMap, header};
use oidc_bridge_core::OidcEvent;
use serde::Deserialize;
use tracing::{debug, instrument, warn};

use super::state::OidcState;
use crate::claims::ClaimSet;
use crate::error::{AuthError, AuthResult};
use crate::token::jwt::is_jwt_shaped;
use crate::token::token_preview;
use crate::types::AccessToken;

const INVALID_TOKEN_DESCRIPTION: &str = "The access token is invalid or expired.";

#[derive(Deserialize)]
struct JtiClaim {
    jti: String,
}

/// Handler for `GET /oauth/userinfo` and `POST /oauth/userinfo`.
#[instrument(skip_all)]
pub async fn userinfo_handler(
    State(state): State<OidcState>,
    headers: HeaderMap,
) -> AuthResult<Json<ClaimSet>> {
    let token = extract_bearer_token(&headers).ok_or_else(invalid_token)?;
    let access_token = authenticate_bearer(&state, token).await?;

    let user_id = access_token.user_id.as_deref().ok_or_else(|| {
        debug!("Client credentials token presented to userinfo");
        invalid_token()
    })?;
    let user = state
        .stores
        .users
        .find_by_id(user_id)
        .await?
        .ok_or_else(invalid_token)?;

    let scopes = if access_token.scopes.is_empty() {
        state.config.default_scopes.clone()
    } else {
        access_token.scopes.clone()
    };

    let claims = state.claims.resolve_for_user(user.as_ref(), &scopes)?;
    state
        .events
        .send(OidcEvent::userinfo_requested(user.subject(), scopes));

    Ok(Json(claims))
}

/// Extracts the token from an `Authorization: Bearer` header.
#[must_use]
pub fn extract_bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?.trim();
    let (scheme, token) = value.split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}

async fn authenticate_bearer(state: &OidcState, token: &str) -> AuthResult<AccessToken> {
    let token_id = if is_jwt_shaped(token) {
        let jwt = state.keys.jwt_service().map_err(|e| {
            warn!(error = %e, "Cannot verify JWT access token without key material");
            invalid_token()
        })?;
        match jwt.decode::<JtiClaim>(token) {
            Ok(data) => data.claims.jti,
            Err(e) => {
                debug!(token_preview = %token_preview(token), error = %e, "Bearer JWT rejected");
                return Err(invalid_token());
            }
        }
    } else {
        token.to_string()
    };

    let access_token = state
        .stores
        .access_tokens
        .find_by_id(&token_id)
        .await?
        .ok_or_else(invalid_token)?;

    if !access_token.is_active() {
        return Err(invalid_token());
    }
    Ok(access_token)
}

fn invalid_token() -> AuthError {
    AuthError::invalid_token(INVALID_TOKEN_DESCRIPTION)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_extract_bearer_token() {
        let mut headers = HeaderMap::new();
        assert!(extract_bearer_token(&headers).is_none());

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer abc"));
        assert_eq!(extract_bearer_token(&headers), Some("abc"));

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("bearer  abc "));
        assert_eq!(extract_bearer_token(&headers), Some("abc"));

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Basic abc"));
        assert!(extract_bearer_token(&headers).is_none());

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer "));
        assert!(extract_bearer_token(&headers).is_none());
    }
}

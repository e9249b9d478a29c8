//! RP-initiated logout handler.
//!
//! ```text
//! GET /oauth/logout?id_token_hint=...&post_logout_redirect_uri=...&state=...
//!
//! HTTP/1.1 302 Found
//! Location: https://rp.example.org/bye?state=...
//! Set-Cookie: oidc_session=<fresh id>; HttpOnly; SameSite=Lax; Path=/
//! Cache-Control: no-store
//! ```
//!
//! Always redirects; see [`crate::logout::LogoutService`].

use axum::{
    extract::{RawQuery, State},
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use axum_extra::extract::CookieJar;
use cookie::{Cookie, SameSite};

use super::state::OidcState;
use crate::config::SessionConfig;
use crate::logout::{LOGOUT_FALLBACK_REDIRECT, LogoutRequest};
use crate::types::Session;

/// Handler for `GET /oauth/logout`.
pub async fn logout_handler(
    State(state): State<OidcState>,
    jar: CookieJar,
    RawQuery(query): RawQuery,
) -> Response {
    let request = query
        .as_deref()
        .map(LogoutRequest::from_query)
        .unwrap_or_default();
    let session_config = &state.config.session;
    let session_id = jar
        .get(&session_config.cookie_name)
        .map(|c| c.value().to_string());

    let outcome = state.logout.logout(session_id.as_deref(), &request).await;

    let jar = match &outcome.session {
        Some(session) => jar.add(session_cookie(session_config, session)),
        None => jar.remove(Cookie::build((session_config.cookie_name.clone(), "")).path("/")),
    };

    let location = HeaderValue::from_str(&outcome.redirect_to)
        .unwrap_or_else(|_| HeaderValue::from_static(LOGOUT_FALLBACK_REDIRECT));

    (
        StatusCode::FOUND,
        jar,
        [
            (header::LOCATION, location),
            (header::CACHE_CONTROL, HeaderValue::from_static("no-store")),
        ],
    )
        .into_response()
}

fn session_cookie(config: &SessionConfig, session: &Session) -> Cookie<'static> {
    Cookie::build((config.cookie_name.clone(), session.id.clone()))
        .http_only(true)
        .secure(config.secure)
        .same_site(SameSite::Lax)
        .path("/")
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::OidcConfig;
    use crate::http::test_support::state_with;

    async fn logout(query: &str) -> Response {
        let state = state_with(OidcConfig::default());
        logout_handler(State(state), CookieJar::new(), RawQuery(Some(query.to_string()))).await
    }

    #[tokio::test]
    async fn test_repeated_parameters_keep_last_value() {
        let response =
            logout("post_logout_redirect_uri=http%3A%2F%2Flocalhost%3A8080%2Fbye&state=a&state=b")
                .await;
        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(response.headers()[header::LOCATION], "http://localhost:8080/bye?state=b");
    }

    #[tokio::test]
    async fn test_control_characters_never_reach_location() {
        let response =
            logout("post_logout_redirect_uri=http%3A%2F%2Flocalhost%3A8080%2Fbye%0A").await;
        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(response.headers()[header::LOCATION], "http://localhost:8080/bye");
        assert_eq!(response.headers()[header::CACHE_CONTROL], "no-store");
    }

    #[tokio::test]
    async fn test_missing_or_garbled_query_redirects_to_root() {
        for query in [None, Some("%zz=%%&&=")] {
            let state = state_with(OidcConfig::default());
            let response =
                logout_handler(State(state), CookieJar::new(), RawQuery(query.map(String::from)))
                    .await;
            assert_eq!(response.status(), StatusCode::FOUND);
            assert_eq!(response.headers()[header::LOCATION], LOGOUT_FALLBACK_REDIRECT);
            assert!(response.headers().contains_key(header::SET_COOKIE));
        }
    }
}

//! Route groups for the OIDC endpoints.
//!
//! | Group | Routes |
//! |---|---|
//! | discovery | `/.well-known/openid-configuration`, `/.well-known/jwks.json` |
//! | token | `/oauth/introspect`, `/oauth/revoke`, `/oauth/logout` |
//! | userinfo | `/oauth/userinfo` |
//!
//! Groups are returned separately so the host can layer each with its own
//! middleware before merging.

use axum::Router;
use axum::routing::{get, post};

use super::discovery::openid_configuration_handler;
use super::introspect::introspect_handler;
use super::jwks::jwks_handler;
use super::logout::logout_handler;
use super::revoke::revoke_handler;
use super::state::OidcState;
use super::userinfo::userinfo_handler;

/// The three route groups, each with state applied.
pub struct OidcRoutes {
    pub discovery: Router,
    pub token: Router,
    pub userinfo: Router,
}

impl OidcRoutes {
    #[must_use]
    pub fn new(state: OidcState) -> Self {
        Self {
            discovery: discovery_routes().with_state(state.clone()),
            token: token_routes().with_state(state.clone()),
            userinfo: userinfo_routes().with_state(state),
        }
    }

    /// All groups in one router, without per-group middleware.
    #[must_use]
    pub fn merged(self) -> Router {
        self.discovery.merge(self.token).merge(self.userinfo)
    }
}

/// Every OIDC route, or an empty router when `routes.enabled` is off.
#[must_use]
pub fn oidc_router(state: OidcState) -> Router {
    if !state.config.routes.enabled {
        return Router::new();
    }
    OidcRoutes::new(state).merged()
}

fn discovery_routes() -> Router<OidcState> {
    Router::new()
        .route(
            "/.well-known/openid-configuration",
            get(openid_configuration_handler),
        )
        .route("/.well-known/jwks.json", get(jwks_handler))
}

fn token_routes() -> Router<OidcState> {
    Router::new()
        .route("/oauth/introspect", post(introspect_handler))
        .route("/oauth/revoke", post(revoke_handler))
        .route("/oauth/logout", get(logout_handler))
}

fn userinfo_routes() -> Router<OidcState> {
    Router::new().route("/oauth/userinfo", get(userinfo_handler).post(userinfo_handler))
}

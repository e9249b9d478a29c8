//! # oidc-bridge-auth
//!
//! OpenID Connect layer over an existing OAuth 2.0 authorization server.
//!
//! This crate provides:
//! - Scope to claim resolution for pluggable user types
//! - ID token minting and token response augmentation
//! - Token introspection (RFC 7662) and revocation (RFC 7009)
//! - RP-initiated logout with strict redirect validation
//! - Discovery, JWKS and UserInfo endpoints
//!
//! ## Overview
//!
//! The OAuth2 server keeps ownership of grants, token storage and client
//! registration. This crate reads that state through the [`storage`]
//! traits and turns it into OIDC artifacts.
//!
//! ## Modules
//!
//! - [`config`] - OIDC configuration
//! - [`claims`] - Scope registry, claims resolver and claims service
//! - [`token`] - Keys, ID tokens, identity extraction, introspection, revocation
//! - [`oauth`] - Client authentication
//! - [`logout`] - RP-initiated logout
//! - [`storage`] - Storage traits for the external stores
//! - [`http`] - Axum handlers and route groups

pub mod claims;
pub mod config;
pub mod error;
pub mod http;
pub mod logout;
pub mod oauth;
pub mod storage;
pub mod token;
pub mod types;

pub use claims::{
    AttributeUser, ClaimSet, ClaimSource, ClaimsResolver, ClaimsService, OidcUser,
    ScopeClaimRegistry,
};
pub use config::{ConfigError, OidcConfig, RouteMiddleware};
pub use error::{AuthError, AuthResult, ErrorCategory};
pub use http::{OidcRoutes, OidcState, OidcStores, oidc_router};
pub use logout::{LogoutService, PostLogoutRedirectValidator};
pub use storage::{
    AccessTokenStorage, ClientStorage, RefreshTokenStorage, SessionStorage, UserStorage,
};
pub use token::{
    IdTokenAugmenter, IdTokenMinter, KeyMaterial, TokenIdentityExtractor, TokenLifecycleGateway,
    TokenResponse,
};
pub use types::{AccessToken, Client, RefreshToken, Session};

/// Prelude module for convenient imports.
///
/// ```ignore
/// use oidc_bridge_auth::prelude::*;
/// ```
pub mod prelude {
    pub use crate::claims::{
        AttributeUser, ClaimSet, ClaimSource, ClaimsResolver, ClaimsService, OidcUser,
    };
    pub use crate::config::OidcConfig;
    pub use crate::error::{AuthError, AuthResult};
    pub use crate::http::{OidcState, OidcStores, oidc_router};
    pub use crate::storage::{
        AccessTokenStorage, ClientStorage, RefreshTokenStorage, SessionStorage, UserStorage,
    };
    pub use crate::types::{AccessToken, Client, RefreshToken, Session};
}

//! Axum handlers for the OIDC endpoints.
//!
//! # Available Handlers
//!
//! - [`discovery`] - OpenID Connect discovery document
//! - [`jwks`] - JSON Web Key Set
//! - [`userinfo`] - UserInfo (bearer token)
//! - [`introspect`] - Token introspection (RFC 7662)
//! - [`revoke`] - Token revocation (RFC 7009)
//! - [`logout`] - RP-initiated logout

pub mod discovery;
pub mod error;
pub mod introspect;
pub mod jwks;
pub mod logout;
pub mod revoke;
pub mod routes;
pub mod state;
pub mod userinfo;

#[cfg(test)]
pub(crate) mod test_support;

pub use discovery::{discovery_document, openid_configuration_handler};
pub use error::oauth_error_body;
pub use introspect::introspect_handler;
pub use jwks::jwks_handler;
pub use logout::logout_handler;
pub use revoke::revoke_handler;
pub use routes::{OidcRoutes, oidc_router};
pub use state::{OidcState, OidcStores};
pub use userinfo::{extract_bearer_token, userinfo_handler};

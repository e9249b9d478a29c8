//! OAuth 2.0 client authentication.

pub mod client_auth;
pub mod secret;

pub use client_auth::{
    AuthenticatedClient, ClientCredentials, TokenEndpointAuthMethod, authenticate_client,
    parse_basic_auth,
};
pub use secret::{generate_client_secret, hash_client_secret, verify_client_secret};

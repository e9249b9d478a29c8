//! Records owned by the external token store, as seen by the OIDC layer.
//!
//! The OIDC layer reads these and flips `revoked`; creating, rotating and
//! expiring them belongs to the OAuth2 server.

pub mod client;
pub mod session;
pub mod token;

pub use client::Client;
pub use session::Session;
pub use token::{AccessToken, RefreshToken};

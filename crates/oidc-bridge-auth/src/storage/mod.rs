//! Storage traits for the records the OIDC layer consumes.
//!
//! The OIDC layer does not own persistence. These traits describe the
//! lookups and revocations it needs from the OAuth2 server's token store,
//! the host application's user store and its session store.
//!
//! # Implementations
//!
//! - `oidc-bridge-auth-memory` - in-memory stores for development and tests

pub mod client;
pub mod session;
pub mod token;
pub mod user;

pub use client::ClientStorage;
pub use session::SessionStorage;
pub use token::{AccessTokenStorage, RefreshTokenStorage};
pub use user::UserStorage;

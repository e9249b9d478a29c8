//! RP-initiated logout and post-logout redirect validation.

pub mod redirect;
pub mod service;

pub use redirect::{PostLogoutRedirectValidator, append_state};
pub use service::{LOGOUT_FALLBACK_REDIRECT, LogoutOutcome, LogoutRequest, LogoutService};

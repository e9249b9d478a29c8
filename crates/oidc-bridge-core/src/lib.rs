//! Shared building blocks for the OIDC bridge crates.
//!
//! Currently this is the domain event system: identity events raised by the
//! OIDC layer (ID token issued, logout initiated, userinfo requested) are
//! published on a broadcast bus and delivered to registered hooks.

pub mod events;

pub use events::{
    EventBroadcaster, HookDispatcher, HookError, HookRegistry, OidcEvent, OidcEventType, OidcHook,
};

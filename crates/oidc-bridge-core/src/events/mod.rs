//! Domain event system for the OIDC layer.
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │              Event Broadcaster               │
//! │       (tokio::sync::broadcast channel)       │
//! └──────────────────────────────────────────────┘
//!          │               │               │
//!          ▼               ▼               ▼
//!    ┌──────────┐    ┌──────────┐    ┌──────────┐
//!    │  Hook 1  │    │  Hook 2  │    │  Hook 3  │
//!    │ (async)  │    │ (async)  │    │ (async)  │
//!    └──────────┘    └──────────┘    └──────────┘
//! ```
//!
//! Publishing never blocks: [`EventBroadcaster::send`] returns immediately
//! with the number of live receivers. The [`HookDispatcher`] drains the
//! channel and runs each matching hook in its own task with a timeout and
//! panic isolation, so a slow or failing subscriber can never affect the
//! request that raised the event.
//!
//! # Example
//!
//! ```ignore
//! use oidc_bridge_core::events::{EventBroadcaster, HookDispatcher, HookRegistry, OidcEvent};
//!
//! let broadcaster = EventBroadcaster::new_shared();
//! let registry = Arc::new(HookRegistry::new());
//! registry.register(audit_hook).await;
//!
//! tokio::spawn(HookDispatcher::new(registry).run(broadcaster.subscribe()));
//!
//! broadcaster.send(OidcEvent::token_issued("42", "client-1", vec!["openid".into()]));
//! ```

pub mod broadcaster;
pub mod hooks;
pub mod registry;
pub mod types;

pub use broadcaster::EventBroadcaster;
pub use hooks::{HookError, OidcHook};
pub use registry::{HookDispatcher, HookRegistry};
pub use types::{OidcEvent, OidcEventType};

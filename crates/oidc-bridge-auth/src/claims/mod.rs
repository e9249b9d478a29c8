//! Claims resolution.
//!
//! Turns a user plus a set of granted scopes into a claim map:
//!
//! - [`ScopeClaimRegistry`] maps scopes to the claim names they grant
//! - [`ClaimsResolver`] resolves one claim for one user through the
//!   override table, the reserved `sub` rule and the default table
//! - [`OidcUser`] is the capability a host user type implements; its
//!   default `claims` drives the resolver across scopes
//! - [`ClaimsService`] adds the canonical `sub` and reports supported claims

pub mod registry;
pub mod resolver;
pub mod service;
pub mod user;

pub use registry::{ScopeClaimRegistry, ScopeDefinition};
pub use resolver::{ClaimFn, ClaimResolverTable, ClaimSource, ClaimsResolver, ClaimsResolverBuilder};
pub use service::{ClaimSet, ClaimsService, PROTOCOL_CLAIMS};
pub use user::{AttributeUser, OidcUser};

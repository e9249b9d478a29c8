//! The user capability consumed by the OIDC layer.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::resolver::ClaimsResolver;
use super::service::ClaimSet;
use crate::AuthResult;

/// A user that can be represented in ID tokens and userinfo responses.
///
/// Implementors provide a stable subject and attribute reads. The default
/// [`claims`](OidcUser::claims) resolves every claim granted by the scopes
/// through the [`ClaimsResolver`]; override it to take full control.
///
/// # Example
///
/// ```ignore
/// impl OidcUser for Account {
///     fn subject(&self) -> String {
///         self.id.to_string()
///     }
///
///     fn attribute(&self, name: &str) -> Option<Value> {
///         match name {
///             "name" => Some(Value::String(self.display_name.clone())),
///             "email" => Some(Value::String(self.email.clone())),
///             _ => None,
///         }
///     }
/// }
/// ```
pub trait OidcUser: Send + Sync {
    /// Stable, non-empty subject identifier.
    fn subject(&self) -> String;

    /// Reads a named attribute. `None` and `Value::Null` both mean absent.
    fn attribute(&self, name: &str) -> Option<Value>;

    /// Username reported by token introspection.
    fn username(&self) -> Option<String> {
        match self.attribute("email") {
            Some(Value::String(email)) => Some(email),
            _ => None,
        }
    }

    /// Claims granted by `scopes`.
    ///
    /// # Errors
    ///
    /// Fails only when a configured claim computation fails.
    fn claims(&self, scopes: &[String], resolver: &ClaimsResolver) -> AuthResult<ClaimSet> {
        resolver.resolve_scopes(&UserRef(self), scopes)
    }
}

/// Sized view over a possibly unsized user, so default trait methods can
/// hand `self` to code expecting `&dyn OidcUser`.
struct UserRef<'a, U: ?Sized>(&'a U);

impl<U: OidcUser + ?Sized> OidcUser for UserRef<'_, U> {
    fn subject(&self) -> String {
        self.0.subject()
    }

    fn attribute(&self, name: &str) -> Option<Value> {
        self.0.attribute(name)
    }

    fn username(&self) -> Option<String> {
        self.0.username()
    }

    fn claims(&self, scopes: &[String], resolver: &ClaimsResolver) -> AuthResult<ClaimSet> {
        resolver.resolve_scopes(self, scopes)
    }
}

/// A user backed by a plain attribute map.
///
/// Useful for host applications that already hold user rows as JSON, and for
/// seeding in-memory stores.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct AttributeUser {
    pub id: String,
    #[serde(default)]
    pub attributes: HashMap<String, Value>,
}

impl AttributeUser {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            attributes: HashMap::new(),
        }
    }

    /// Sets an attribute.
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }
}

impl OidcUser for AttributeUser {
    fn subject(&self) -> String {
        self.id.clone()
    }

    fn attribute(&self, name: &str) -> Option<Value> {
        if name == "id" {
            return Some(Value::String(self.id.clone()));
        }
        self.attributes.get(name).cloned()
    }
}

impl fmt::Debug for AttributeUser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Attribute values may be personal data.
        f.debug_struct("AttributeUser")
            .field("id", &self.id)
            .field("attributes", &self.attributes.keys().collect::<Vec<_>>())
            .finish()
    }
}

//! OIDC layer configuration.
//!
//! One immutable [`OidcConfig`] is built at process start and handed to every
//! component constructor. Nothing in this crate reads configuration from a
//! global.
//!
//! # Example (TOML)
//!
//! ```toml
//! [oidc]
//! issuer = "https://id.example.com"
//! app_url = "https://example.com"
//! default_scopes = ["openid"]
//!
//! [oidc.scopes.email]
//! description = "Access to your email address"
//! claims = ["email", "email_verified"]
//!
//! [oidc.claims_resolver]
//! name = "display_name"
//!
//! [oidc.tokens]
//! access_token_ttl = "15m"
//! refresh_token_ttl = "7d"
//! ```

use std::path::PathBuf;
use std::time::Duration;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Root OIDC configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct OidcConfig {
    /// Issuer URL placed in `iss` and used as the base of discovery endpoints.
    pub issuer: String,

    /// Public base URL of the host application. Used as the only allowed
    /// post-logout redirect target when no client can be identified.
    pub app_url: String,

    /// Scope name to granted claims.
    pub scopes: IndexMap<String, ScopeConfig>,

    /// Scopes assumed when a token carries none.
    pub default_scopes: Vec<String>,

    /// Per-deployment claim overrides: claim name to user attribute name.
    /// Consulted before the built-in `sub` rule and the default map.
    pub claims_resolver: IndexMap<String, String>,

    /// Fallback claim map: claim name to user attribute name.
    pub default_claims_map: IndexMap<String, String>,

    /// Token lifetimes.
    pub tokens: TokenLifetimes,

    /// Advertised `response_types_supported`.
    pub response_types_supported: Vec<String>,

    /// Advertised `grant_types_supported`.
    pub grant_types_supported: Vec<String>,

    /// Advertised client authentication methods for token, introspection
    /// and revocation endpoints.
    pub token_endpoint_auth_methods_supported: Vec<String>,

    /// Advertised ID token signing algorithms.
    pub id_token_signing_alg_values_supported: Vec<String>,

    /// Advertised subject identifier types.
    pub subject_types_supported: Vec<String>,

    /// Advertised PKCE methods.
    pub code_challenge_methods_supported: Vec<String>,

    /// Advertised post-logout redirect URIs.
    pub post_logout_redirect_uris_supported: Vec<String>,

    /// Route mounting and per-group middleware.
    pub routes: RoutesConfig,

    /// Signing key locations.
    pub keys: KeysConfig,

    /// Master symmetric key used to decrypt refresh token blobs.
    ///
    /// Accepts `base64:<key>`, plain base64 or 64 hex characters; must decode
    /// to 32 bytes. Without it only legacy opaque refresh tokens resolve.
    pub encryption_key: Option<String>,

    /// Session cookie settings used by logout.
    pub session: SessionConfig,
}

impl Default for OidcConfig {
    fn default() -> Self {
        Self {
            issuer: "http://localhost:8080".to_string(),
            app_url: "http://localhost:8080".to_string(),
            scopes: default_scopes_table(),
            default_scopes: vec!["openid".to_string()],
            claims_resolver: IndexMap::new(),
            default_claims_map: IndexMap::from([
                ("name".to_string(), "name".to_string()),
                ("email".to_string(), "email".to_string()),
            ]),
            tokens: TokenLifetimes::default(),
            response_types_supported: strings(&["code", "token"]),
            grant_types_supported: strings(&[
                "authorization_code",
                "refresh_token",
                "client_credentials",
                "urn:ietf:params:oauth:grant-type:device_code",
            ]),
            token_endpoint_auth_methods_supported: strings(&[
                "client_secret_basic",
                "client_secret_post",
            ]),
            id_token_signing_alg_values_supported: strings(&["RS256"]),
            subject_types_supported: strings(&["public"]),
            code_challenge_methods_supported: strings(&["S256", "plain"]),
            post_logout_redirect_uris_supported: Vec::new(),
            routes: RoutesConfig::default(),
            keys: KeysConfig::default(),
            encryption_key: None,
            session: SessionConfig::default(),
        }
    }
}

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| (*v).to_string()).collect()
}

fn default_scopes_table() -> IndexMap<String, ScopeConfig> {
    IndexMap::from([
        (
            "openid".to_string(),
            ScopeConfig::new("Verify your identity", &["sub"]),
        ),
        (
            "profile".to_string(),
            ScopeConfig::new(
                "Access to your basic profile information",
                &["name", "nickname", "picture", "updated_at"],
            ),
        ),
        (
            "email".to_string(),
            ScopeConfig::new("Access to your email address", &["email", "email_verified"]),
        ),
    ])
}

/// One entry of the scope table.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default)]
pub struct ScopeConfig {
    /// Human readable description shown on consent screens.
    pub description: String,
    /// Claims granted by the scope, in emission order.
    pub claims: Vec<String>,
}

impl ScopeConfig {
    /// Builds a scope entry from borrowed claim names.
    pub fn new(description: impl Into<String>, claims: &[&str]) -> Self {
        Self {
            description: description.into(),
            claims: strings(claims),
        }
    }
}

/// Token lifetimes.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TokenLifetimes {
    #[serde(with = "humantime_serde")]
    pub access_token_ttl: Duration,

    #[serde(with = "humantime_serde")]
    pub refresh_token_ttl: Duration,

    /// Configured ID token lifetime. Minted ID tokens expire together with
    /// the access token they accompany.
    #[serde(with = "humantime_serde")]
    pub id_token_ttl: Duration,
}

impl Default for TokenLifetimes {
    fn default() -> Self {
        Self {
            access_token_ttl: Duration::from_secs(900),
            refresh_token_ttl: Duration::from_secs(604_800),
            id_token_ttl: Duration::from_secs(900),
        }
    }
}

/// Middleware that can be attached to a route group by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RouteMiddleware {
    /// Request tracing spans
    Trace,
    /// Permissive CORS
    Cors,
    /// Gzip response compression
    Compression,
    /// `Cache-Control: no-store` on every response
    NoStore,
}

/// Route mounting configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RoutesConfig {
    /// Mount the OIDC routes at all.
    pub enabled: bool,
    /// Middleware for discovery and JWKS.
    pub discovery_middleware: Vec<RouteMiddleware>,
    /// Middleware for introspection, revocation and logout.
    pub token_middleware: Vec<RouteMiddleware>,
    /// Middleware for userinfo.
    pub userinfo_middleware: Vec<RouteMiddleware>,
}

impl Default for RoutesConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            discovery_middleware: vec![RouteMiddleware::Trace],
            token_middleware: vec![RouteMiddleware::Trace],
            userinfo_middleware: vec![RouteMiddleware::Trace],
        }
    }
}

/// Signing key locations.
///
/// Inline PEM values take precedence over the file paths.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct KeysConfig {
    pub private_key_path: PathBuf,
    pub public_key_path: PathBuf,
    pub private_key: Option<String>,
    pub public_key: Option<String>,
}

impl Default for KeysConfig {
    fn default() -> Self {
        Self {
            private_key_path: PathBuf::from("storage/oauth-private.key"),
            public_key_path: PathBuf::from("storage/oauth-public.key"),
            private_key: None,
            public_key: None,
        }
    }
}

/// Session cookie settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SessionConfig {
    pub cookie_name: String,
    pub secure: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            cookie_name: "oidc_session".to_string(),
            secure: false,
        }
    }
}

/// Configuration validation errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// An invalid configuration value was provided.
    #[error("Invalid configuration value: {0}")]
    InvalidValue(String),

    /// A required configuration value is missing.
    #[error("Missing required configuration: {0}")]
    Missing(String),
}

impl OidcConfig {
    /// Issuer with any trailing slash removed.
    #[must_use]
    pub fn issuer(&self) -> &str {
        self.issuer.trim_end_matches('/')
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the issuer or app URL is not an absolute URL,
    /// the scope table lacks `openid`, a default scope is unknown, a TTL is
    /// zero, or the encryption key does not decode to 32 bytes.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.issuer.is_empty() {
            return Err(ConfigError::Missing("issuer".to_string()));
        }
        url::Url::parse(&self.issuer)
            .map_err(|e| ConfigError::InvalidValue(format!("issuer is not a URL: {e}")))?;

        url::Url::parse(&self.app_url)
            .map_err(|e| ConfigError::InvalidValue(format!("app_url is not a URL: {e}")))?;

        if !self.scopes.contains_key("openid") {
            return Err(ConfigError::Missing("scopes.openid".to_string()));
        }

        for scope in &self.default_scopes {
            if !self.scopes.contains_key(scope) {
                return Err(ConfigError::InvalidValue(format!(
                    "default scope '{scope}' is not defined in scopes"
                )));
            }
        }

        if self.tokens.access_token_ttl.is_zero() || self.tokens.refresh_token_ttl.is_zero() {
            return Err(ConfigError::InvalidValue(
                "token lifetimes must be greater than zero".to_string(),
            ));
        }

        if let Some(key) = &self.encryption_key {
            crate::token::cipher::parse_key(key)
                .map_err(|e| ConfigError::InvalidValue(format!("encryption_key: {e}")))?;
        }

        if self.session.cookie_name.is_empty() {
            return Err(ConfigError::Missing("session.cookie_name".to_string()));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = OidcConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.default_scopes, vec!["openid"]);
        assert_eq!(config.tokens.access_token_ttl, Duration::from_secs(900));
        assert_eq!(config.tokens.refresh_token_ttl, Duration::from_secs(604_800));
    }

    #[test]
    fn test_default_scope_table_order() {
        let config = OidcConfig::default();
        let names: Vec<&str> = config.scopes.keys().map(String::as_str).collect();
        assert_eq!(names, vec!["openid", "profile", "email"]);
        assert_eq!(
            config.scopes["profile"].claims,
            vec!["name", "nickname", "picture", "updated_at"]
        );
    }

    #[test]
    fn test_issuer_trailing_slash_stripped() {
        let config = OidcConfig {
            issuer: "https://id.example.com/".to_string(),
            ..Default::default()
        };
        assert_eq!(config.issuer(), "https://id.example.com");
    }

    #[test]
    fn test_validate_rejects_unknown_default_scope() {
        let config = OidcConfig {
            default_scopes: vec!["admin".to_string()],
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue(_)));
    }

    #[test]
    fn test_validate_requires_openid_scope() {
        let mut config = OidcConfig::default();
        config.scopes.shift_remove("openid");
        assert!(matches!(config.validate(), Err(ConfigError::Missing(_))));
    }

    #[test]
    fn test_validate_rejects_bad_encryption_key() {
        let config = OidcConfig {
            encryption_key: Some("base64:dG9vLXNob3J0".to_string()),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_route_middleware_names() {
        let routes: RoutesConfig = serde_json::from_value(serde_json::json!({
            "userinfo_middleware": ["cors", "no_store"]
        }))
        .unwrap();
        assert!(routes.enabled);
        assert_eq!(
            routes.userinfo_middleware,
            vec![RouteMiddleware::Cors, RouteMiddleware::NoStore]
        );

        let unknown: Result<RoutesConfig, _> = serde_json::from_value(serde_json::json!({
            "token_middleware": ["auth:api"]
        }));
        assert!(unknown.is_err());
    }

    #[test]
    fn test_humantime_lifetimes() {
        let tokens: TokenLifetimes = serde_json::from_value(serde_json::json!({
            "access_token_ttl": "1h",
            "refresh_token_ttl": "30days"
        }))
        .unwrap();
        assert_eq!(tokens.access_token_ttl, Duration::from_secs(3600));
        assert_eq!(tokens.refresh_token_ttl, Duration::from_secs(30 * 86_400));
        assert_eq!(tokens.id_token_ttl, Duration::from_secs(900));
    }
}

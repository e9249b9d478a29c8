//! Token type hints and revocation outcomes (RFC 7009).

use serde::{Deserialize, Serialize};

use crate::error::{AuthError, AuthResult};

/// Description returned for an unknown `token_type_hint`.
pub const UNSUPPORTED_HINT_DESCRIPTION: &str =
    "token_type_hint must be access_token or refresh_token.";

/// Token type hint for introspection and revocation requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenTypeHint {
    /// The token is an access token.
    AccessToken,
    /// The token is a refresh token.
    RefreshToken,
}

impl TokenTypeHint {
    /// Returns the token type hint as a string.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AccessToken => "access_token",
            Self::RefreshToken => "refresh_token",
        }
    }

    /// Parses a raw hint parameter. Absent or empty means no hint.
    ///
    /// # Errors
    /// Returns [`AuthError::UnsupportedTokenType`] for any other value.
    pub fn parse(raw: Option<&str>) -> AuthResult<Option<Self>> {
        match raw.unwrap_or_default() {
            "" => Ok(None),
            "access_token" => Ok(Some(Self::AccessToken)),
            "refresh_token" => Ok(Some(Self::RefreshToken)),
            _ => Err(AuthError::unsupported_token_type(UNSUPPORTED_HINT_DESCRIPTION)),
        }
    }

    /// Whether the access token path may run under `hint`.
    #[must_use]
    pub fn allows_access(hint: Option<Self>) -> bool {
        hint.is_none_or(|h| h == Self::AccessToken)
    }

    /// Whether the refresh token path may run under `hint`.
    #[must_use]
    pub fn allows_refresh(hint: Option<Self>) -> bool {
        hint.is_none_or(|h| h == Self::RefreshToken)
    }
}

impl std::fmt::Display for TokenTypeHint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Raw revocation request parameters.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RevocationRequest {
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub token_type_hint: Option<String>,
}

/// What a revocation did. Never shown to the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RevocationOutcome {
    /// A refresh token and its paired access token were revoked.
    RefreshToken {
        refresh_token_id: String,
        access_token_id: String,
    },
    /// An access token and its paired refresh tokens were revoked.
    AccessToken {
        access_token_id: String,
        refresh_tokens_revoked: u64,
    },
    /// Nothing matched (or it belonged to another client).
    NotFound,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_hint() {
        assert_eq!(TokenTypeHint::parse(None).unwrap(), None);
        assert_eq!(TokenTypeHint::parse(Some("")).unwrap(), None);
        assert_eq!(
            TokenTypeHint::parse(Some("access_token")).unwrap(),
            Some(TokenTypeHint::AccessToken)
        );
        assert_eq!(
            TokenTypeHint::parse(Some("refresh_token")).unwrap(),
            Some(TokenTypeHint::RefreshToken)
        );
    }

    #[test]
    fn test_parse_unknown_hint() {
        let err = TokenTypeHint::parse(Some("id_token")).unwrap_err();
        assert_eq!(err.oauth_error_code(), "unsupported_token_type");
        assert!(err.to_string().contains(UNSUPPORTED_HINT_DESCRIPTION));
    }

    #[test]
    fn test_path_gates() {
        assert!(TokenTypeHint::allows_access(None));
        assert!(TokenTypeHint::allows_refresh(None));
        assert!(TokenTypeHint::allows_access(Some(TokenTypeHint::AccessToken)));
        assert!(!TokenTypeHint::allows_refresh(Some(TokenTypeHint::AccessToken)));
        assert!(!TokenTypeHint::allows_access(Some(TokenTypeHint::RefreshToken)));
    }

    #[test]
    fn test_display() {
        assert_eq!(TokenTypeHint::RefreshToken.to_string(), "refresh_token");
    }
}

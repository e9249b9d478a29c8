//! Error types for the OIDC layer.
//!
//! Every fallible operation in this crate returns [`AuthResult`]. The HTTP
//! rendering of these errors lives in [`crate::http::error`].

use std::fmt;

/// Errors that can occur while serving OIDC operations.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// The client credentials are invalid or the client is not registered.
    #[error("Invalid client: {message}")]
    InvalidClient {
        /// Description of why the client is invalid.
        message: String,
    },

    /// The bearer token is invalid, malformed, or cannot be parsed.
    #[error("Invalid token: {message}")]
    InvalidToken {
        /// Description of why the token is invalid.
        message: String,
    },

    /// A request parameter is missing or malformed.
    #[error("Invalid request: {message}")]
    InvalidRequest {
        /// Description of why the request is invalid.
        message: String,
    },

    /// The `token_type_hint` names a token type this server does not know.
    #[error("Unsupported token type: {message}")]
    UnsupportedTokenType {
        /// Description returned to the caller.
        message: String,
    },

    /// The request lacks valid authentication.
    #[error("Unauthorized: {message}")]
    Unauthorized {
        /// Description of why the request is unauthorized.
        message: String,
    },

    /// The access token has expired.
    #[error("Token expired")]
    TokenExpired,

    /// The token has been explicitly revoked.
    #[error("Token revoked")]
    TokenRevoked,

    /// A configured claim computation failed.
    ///
    /// This is a deployment fault, not a request fault.
    #[error("Claim resolution failed for '{claim}': {message}")]
    ClaimResolution {
        /// The claim being resolved.
        claim: String,
        /// Error reported by the computation.
        message: String,
    },

    /// Token signing failed.
    #[error("Signing error: {message}")]
    Signing {
        /// Description of the signing failure.
        message: String,
    },

    /// Signing key material is missing or unusable.
    #[error("Key material error: {message}")]
    KeyMaterial {
        /// Description of the key problem.
        message: String,
    },

    /// The token store or another backing store failed.
    #[error("Storage error: {message}")]
    Storage {
        /// Description of the storage error.
        message: String,
    },

    /// The OIDC configuration is invalid.
    #[error("Configuration error: {message}")]
    Configuration {
        /// Description of the configuration error.
        message: String,
    },

    /// An unexpected internal error occurred.
    #[error("Internal error: {message}")]
    Internal {
        /// Description of the internal error.
        message: String,
    },
}

impl AuthError {
    /// Creates a new `InvalidClient` error.
    #[must_use]
    pub fn invalid_client(message: impl Into<String>) -> Self {
        Self::InvalidClient {
            message: message.into(),
        }
    }

    /// Creates a new `InvalidToken` error.
    #[must_use]
    pub fn invalid_token(message: impl Into<String>) -> Self {
        Self::InvalidToken {
            message: message.into(),
        }
    }

    /// Creates a new `InvalidRequest` error.
    #[must_use]
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest {
            message: message.into(),
        }
    }

    /// Creates a new `UnsupportedTokenType` error.
    #[must_use]
    pub fn unsupported_token_type(message: impl Into<String>) -> Self {
        Self::UnsupportedTokenType {
            message: message.into(),
        }
    }

    /// Creates a new `Unauthorized` error.
    #[must_use]
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::Unauthorized {
            message: message.into(),
        }
    }

    /// Creates a new `ClaimResolution` error.
    #[must_use]
    pub fn claim_resolution(claim: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ClaimResolution {
            claim: claim.into(),
            message: message.into(),
        }
    }

    /// Creates a new `Signing` error.
    #[must_use]
    pub fn signing(message: impl Into<String>) -> Self {
        Self::Signing {
            message: message.into(),
        }
    }

    /// Creates a new `KeyMaterial` error.
    #[must_use]
    pub fn key_material(message: impl Into<String>) -> Self {
        Self::KeyMaterial {
            message: message.into(),
        }
    }

    /// Creates a new `Storage` error.
    #[must_use]
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
        }
    }

    /// Creates a new `Configuration` error.
    #[must_use]
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Creates a new `Internal` error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Returns `true` if this is a client error (4xx category).
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidClient { .. }
                | Self::InvalidToken { .. }
                | Self::InvalidRequest { .. }
                | Self::UnsupportedTokenType { .. }
                | Self::Unauthorized { .. }
                | Self::TokenExpired
                | Self::TokenRevoked
        )
    }

    /// Returns `true` if this is a server error (5xx category).
    #[must_use]
    pub fn is_server_error(&self) -> bool {
        matches!(
            self,
            Self::ClaimResolution { .. }
                | Self::Signing { .. }
                | Self::KeyMaterial { .. }
                | Self::Storage { .. }
                | Self::Configuration { .. }
                | Self::Internal { .. }
        )
    }

    /// Returns `true` if this is a token-related error.
    #[must_use]
    pub fn is_token_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidToken { .. } | Self::TokenExpired | Self::TokenRevoked
        )
    }

    /// Returns the error category for logging purposes.
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::InvalidClient { .. } => ErrorCategory::Authentication,
            Self::InvalidToken { .. } => ErrorCategory::Token,
            Self::InvalidRequest { .. } => ErrorCategory::Validation,
            Self::UnsupportedTokenType { .. } => ErrorCategory::Validation,
            Self::Unauthorized { .. } => ErrorCategory::Authentication,
            Self::TokenExpired => ErrorCategory::Token,
            Self::TokenRevoked => ErrorCategory::Token,
            Self::ClaimResolution { .. } => ErrorCategory::Configuration,
            Self::Signing { .. } => ErrorCategory::Crypto,
            Self::KeyMaterial { .. } => ErrorCategory::Crypto,
            Self::Storage { .. } => ErrorCategory::Infrastructure,
            Self::Configuration { .. } => ErrorCategory::Configuration,
            Self::Internal { .. } => ErrorCategory::Internal,
        }
    }

    /// Returns the OAuth 2.0 error code for this error.
    #[must_use]
    pub fn oauth_error_code(&self) -> &'static str {
        match self {
            Self::InvalidClient { .. } => "invalid_client",
            Self::InvalidToken { .. } => "invalid_token",
            Self::InvalidRequest { .. } => "invalid_request",
            Self::UnsupportedTokenType { .. } => "unsupported_token_type",
            Self::Unauthorized { .. } => "unauthorized",
            Self::TokenExpired => "invalid_token",
            Self::TokenRevoked => "invalid_token",
            Self::ClaimResolution { .. }
            | Self::Signing { .. }
            | Self::KeyMaterial { .. }
            | Self::Storage { .. }
            | Self::Configuration { .. }
            | Self::Internal { .. } => "server_error",
        }
    }
}

/// Categories of errors for logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Client authentication failures.
    Authentication,
    /// Bearer token validation failures.
    Token,
    /// Request validation errors.
    Validation,
    /// Signing and key handling errors.
    Crypto,
    /// Storage errors.
    Infrastructure,
    /// Configuration errors, including broken claim computations.
    Configuration,
    /// Internal server errors.
    Internal,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Authentication => write!(f, "authentication"),
            Self::Token => write!(f, "token"),
            Self::Validation => write!(f, "validation"),
            Self::Crypto => write!(f, "crypto"),
            Self::Infrastructure => write!(f, "infrastructure"),
            Self::Configuration => write!(f, "configuration"),
            Self::Internal => write!(f, "internal"),
        }
    }
}

/// Result type for OIDC operations.
pub type AuthResult<T> = Result<T, AuthError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = AuthError::invalid_client("client not found");
        assert_eq!(err.to_string(), "Invalid client: client not found");

        let err = AuthError::claim_resolution("email_verified", "column missing");
        assert_eq!(
            err.to_string(),
            "Claim resolution failed for 'email_verified': column missing"
        );

        assert_eq!(AuthError::TokenExpired.to_string(), "Token expired");
    }

    #[test]
    fn test_error_predicates() {
        let err = AuthError::invalid_client("test");
        assert!(err.is_client_error());
        assert!(!err.is_server_error());

        let err = AuthError::claim_resolution("x", "y");
        assert!(err.is_server_error());
        assert!(!err.is_client_error());

        assert!(AuthError::TokenRevoked.is_token_error());
        assert!(!AuthError::storage("down").is_token_error());
    }

    #[test]
    fn test_oauth_error_codes() {
        assert_eq!(
            AuthError::invalid_client("x").oauth_error_code(),
            "invalid_client"
        );
        assert_eq!(
            AuthError::unsupported_token_type("x").oauth_error_code(),
            "unsupported_token_type"
        );
        assert_eq!(AuthError::TokenExpired.oauth_error_code(), "invalid_token");
        assert_eq!(AuthError::key_material("x").oauth_error_code(), "server_error");
    }

    #[test]
    fn test_error_category() {
        assert_eq!(
            AuthError::invalid_request("x").category(),
            ErrorCategory::Validation
        );
        assert_eq!(AuthError::signing("x").category(), ErrorCategory::Crypto);
        assert_eq!(ErrorCategory::Infrastructure.to_string(), "infrastructure");
    }
}

//! Token handling: keys, JWTs, refresh token blobs, identity extraction,
//! ID token minting, introspection and revocation.

pub mod cipher;
pub mod id_token;
pub mod identity;
pub mod introspection;
pub mod jwt;
pub mod keys;
pub mod lifecycle;
pub mod response;
pub mod revocation;

pub use cipher::{CipherError, RefreshTokenCipher, RefreshTokenPayload};
pub use id_token::IdTokenMinter;
pub use identity::{TokenIdentityExtractor, token_preview};
pub use introspection::{IntrospectionRequest, IntrospectionResponse};
pub use jwt::{Jwk, Jwks, JwtError, JwtService, PublicKey, SigningKeyPair};
pub use keys::{KeyError, KeyMaterial};
pub use lifecycle::TokenLifecycleGateway;
pub use response::{IdTokenAugmenter, OPENID_SCOPE, TokenResponse};
pub use revocation::{RevocationOutcome, RevocationRequest, TokenTypeHint};

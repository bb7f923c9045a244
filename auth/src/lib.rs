//! Credential and token primitives
//!
//! Provides the building blocks the catalog service authenticates with:
//! - Password hashing (Argon2id)
//! - Signed access/refresh token pairs (HS256 JWT)
//!
//! Both are stateless: the hasher has no state at all and the codec only keeps
//! the signing key it was constructed with.
//!
//! # Examples
//!
//! ## Password Hashing
//! ```
//! use auth::PasswordHasher;
//!
//! let hasher = PasswordHasher::new();
//! let hash = hasher.hash("my_password").unwrap();
//! assert!(hasher.verify("my_password", &hash).is_ok());
//! assert!(hasher.verify("not_my_password", &hash).is_err());
//! ```
//!
//! ## Token Pairs
//! ```
//! use auth::TokenCodec;
//!
//! let codec = TokenCodec::new(b"secret_key_at_least_32_bytes_long!");
//!
//! let access = codec.sign_access(1, false).unwrap();
//! let claims = codec.parse_access(&access).unwrap();
//! assert_eq!(claims.user_id, 1);
//!
//! let (refresh, issued) = codec.sign_refresh(1).unwrap();
//! assert_eq!(codec.parse_refresh(&refresh).unwrap().jti, issued.jti);
//!
//! // An access token is never accepted as a refresh token.
//! assert!(codec.parse_refresh(&access).is_err());
//! ```

pub mod codec;
pub mod jwt;
pub mod password;

// Re-export commonly used items
pub use codec::TokenCodec;
pub use codec::TokenSettings;
pub use codec::DEFAULT_ISSUER;
pub use jwt::AccessClaims;
pub use jwt::JwtError;
pub use jwt::JwtHandler;
pub use jwt::RefreshClaims;
pub use jwt::TokenType;
pub use password::PasswordError;
pub use password::PasswordHasher;

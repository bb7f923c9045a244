use chrono::Duration;
use chrono::Utc;
use serde::de::DeserializeOwned;
use uuid::Uuid;

use crate::jwt::AccessClaims;
use crate::jwt::JwtError;
use crate::jwt::JwtHandler;
use crate::jwt::RefreshClaims;
use crate::jwt::TokenType;
use crate::jwt::TypedClaims;

pub const DEFAULT_ISSUER: &str = "gstore.auth";

/// Lifetime and issuer policy applied by [`TokenCodec`].
#[derive(Debug, Clone)]
pub struct TokenSettings {
    pub issuer: String,
    pub access_ttl: Duration,
    pub refresh_ttl: Duration,
}

impl Default for TokenSettings {
    fn default() -> Self {
        Self {
            issuer: DEFAULT_ISSUER.to_string(),
            access_ttl: Duration::minutes(10),
            refresh_ttl: Duration::days(30),
        }
    }
}

/// Token codec issuing and verifying access/refresh token pairs.
///
/// Holds nothing but the signing key and the lifetime policy, both read-only
/// after construction, so a single instance can be shared across tasks.
pub struct TokenCodec {
    jwt_handler: JwtHandler,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl TokenCodec {
    /// Create a codec with the default issuer and lifetimes
    /// (10 minutes for access tokens, 30 days for refresh tokens).
    pub fn new(secret: &[u8]) -> Self {
        Self::with_settings(secret, TokenSettings::default())
    }

    pub fn with_settings(secret: &[u8], settings: TokenSettings) -> Self {
        Self {
            jwt_handler: JwtHandler::new(secret, settings.issuer),
            access_ttl: settings.access_ttl,
            refresh_ttl: settings.refresh_ttl,
        }
    }

    /// Sign a fresh access token for a user.
    ///
    /// # Errors
    /// * `EncodingFailed` - Signing failed
    pub fn sign_access(&self, user_id: i64, is_admin: bool) -> Result<String, JwtError> {
        let now = Utc::now();
        let claims = AccessClaims {
            token_type: TokenType::Access,
            user_id,
            is_admin,
            jti: Uuid::new_v4(),
            iss: self.jwt_handler.issuer().to_string(),
            iat: now.timestamp(),
            exp: (now + self.access_ttl).timestamp(),
        };

        self.jwt_handler.encode(&claims)
    }

    /// Sign a fresh refresh token for a user.
    ///
    /// The claims are returned alongside the token string: the caller must
    /// persist `jti`/`exp` before handing the string out.
    ///
    /// # Errors
    /// * `EncodingFailed` - Signing failed
    pub fn sign_refresh(&self, user_id: i64) -> Result<(String, RefreshClaims), JwtError> {
        let now = Utc::now();
        let claims = RefreshClaims {
            token_type: TokenType::Refresh,
            user_id,
            jti: Uuid::new_v4(),
            iss: self.jwt_handler.issuer().to_string(),
            iat: now.timestamp(),
            exp: (now + self.refresh_ttl).timestamp(),
        };

        let token = self.jwt_handler.encode(&claims)?;
        Ok((token, claims))
    }

    /// Verify an access token and return its claims.
    ///
    /// # Errors
    /// * `InvalidToken` - Malformed, wrongly signed, expired, foreign issuer, or not an access token
    pub fn parse_access(&self, token: &str) -> Result<AccessClaims, JwtError> {
        self.parse_typed(token, TokenType::Access)
    }

    /// Verify a refresh token and return its claims.
    ///
    /// Only the signature and claims are checked here; whether the token is
    /// still live is decided by the server-side record.
    ///
    /// # Errors
    /// * `InvalidToken` - Malformed, wrongly signed, expired, foreign issuer, or not a refresh token
    pub fn parse_refresh(&self, token: &str) -> Result<RefreshClaims, JwtError> {
        self.parse_typed(token, TokenType::Refresh)
    }

    fn parse_typed<T>(&self, token: &str, expected: TokenType) -> Result<T, JwtError>
    where
        T: DeserializeOwned + TypedClaims,
    {
        let claims: T = self.jwt_handler.decode(token)?;

        if claims.token_type() != expected {
            return Err(JwtError::InvalidToken(format!(
                "expected {} token, got {}",
                expected.as_str(),
                claims.token_type().as_str()
            )));
        }

        Ok(claims)
    }
}

use serde::Deserialize;
use serde::Serialize;
use uuid::Uuid;

/// Token type discriminator carried in the `type` claim.
///
/// Prevents a refresh token from being accepted where an access token is
/// expected, and vice versa.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    Access,
    Refresh,
}

impl TokenType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenType::Access => "access",
            TokenType::Refresh => "refresh",
        }
    }
}

/// Claims of a short-lived access token.
///
/// `admin` is a snapshot taken at issuance; it is not re-checked against the
/// user record until the next login or refresh.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessClaims {
    #[serde(rename = "type")]
    pub token_type: TokenType,

    #[serde(rename = "userId")]
    pub user_id: i64,

    #[serde(rename = "admin", default)]
    pub is_admin: bool,

    /// Unique token identifier
    pub jti: Uuid,

    pub iss: String,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// Expiration time (Unix timestamp)
    pub exp: i64,
}

/// Claims of a long-lived refresh token.
///
/// `jti` doubles as the key of the server-side refresh token record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefreshClaims {
    #[serde(rename = "type")]
    pub token_type: TokenType,

    #[serde(rename = "userId")]
    pub user_id: i64,

    pub jti: Uuid,

    pub iss: String,

    pub iat: i64,

    pub exp: i64,
}

/// Common view over both claim sets, used by the codec for the type check.
pub trait TypedClaims {
    fn token_type(&self) -> TokenType;
}

impl TypedClaims for AccessClaims {
    fn token_type(&self) -> TokenType {
        self.token_type
    }
}

impl TypedClaims for RefreshClaims {
    fn token_type(&self) -> TokenType {
        self.token_type
    }
}

use jsonwebtoken::decode;
use jsonwebtoken::encode;
use jsonwebtoken::Algorithm;
use jsonwebtoken::DecodingKey;
use jsonwebtoken::EncodingKey;
use jsonwebtoken::Header;
use jsonwebtoken::Validation;
use serde::Deserialize;
use serde::Serialize;

use super::errors::JwtError;

/// JWT token handler for encoding and decoding tokens.
///
/// Generic over the claims type. The algorithm is fixed to HS256 (HMAC with
/// SHA-256): decoding rejects any token whose header names another algorithm,
/// including `none`.
pub struct JwtHandler {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    algorithm: Algorithm,
    issuer: String,
}

impl JwtHandler {
    /// Create a new JWT handler with a secret key.
    ///
    /// # Arguments
    /// * `secret` - Secret key for signing tokens
    /// * `issuer` - Value written to and required in the `iss` claim
    ///
    /// # Security Notes
    /// - The secret should be at least 256 bits (32 bytes) for HS256
    /// - Store secrets in environment variables or secure vaults, never in code
    pub fn new(secret: &[u8], issuer: impl Into<String>) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            algorithm: Algorithm::HS256,
            issuer: issuer.into(),
        }
    }

    pub fn issuer(&self) -> &str {
        &self.issuer
    }

    /// Encode claims into a signed JWT.
    ///
    /// # Errors
    /// * `EncodingFailed` - Token encoding failed
    pub fn encode<T: Serialize>(&self, claims: &T) -> Result<String, JwtError> {
        let header = Header::new(self.algorithm);

        encode(&header, claims, &self.encoding_key)
            .map_err(|e| JwtError::EncodingFailed(e.to_string()))
    }

    /// Decode and validate a JWT.
    ///
    /// Checks signature, algorithm, `exp` (no leeway) and `iss`; both claims
    /// must be present.
    ///
    /// # Errors
    /// * `InvalidToken` - Any validation or decoding failure
    pub fn decode<T: for<'de> Deserialize<'de>>(&self, token: &str) -> Result<T, JwtError> {
        decode::<T>(token, &self.decoding_key, &self.validation())
            .map(|token_data| token_data.claims)
            .map_err(|e| JwtError::InvalidToken(e.to_string()))
    }

    fn validation(&self) -> Validation {
        let mut validation = Validation::new(self.algorithm);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "iss"]);
        validation.set_issuer(&[self.issuer.as_str()]);
        validation
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;
    use chrono::Utc;

    use super::*;

    const SECRET: &[u8] = b"my_secret_key_at_least_32_bytes_long!";
    const ISSUER: &str = "gstore.auth";

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct TestClaims {
        sub: String,
        jti: String,
        iss: String,
        iat: i64,
        exp: i64,
    }

    fn claims_expiring_in(seconds: i64) -> TestClaims {
        let now = Utc::now();
        TestClaims {
            sub: "user123".to_string(),
            jti: "token-1".to_string(),
            iss: ISSUER.to_string(),
            iat: now.timestamp(),
            exp: (now + Duration::seconds(seconds)).timestamp(),
        }
    }

    #[test]
    fn test_encode_and_decode() {
        let handler = JwtHandler::new(SECRET, ISSUER);
        let claims = claims_expiring_in(600);

        let token = handler.encode(&claims).expect("Failed to encode token");
        assert!(!token.is_empty());

        let decoded: TestClaims = handler.decode(&token).expect("Failed to decode token");
        assert_eq!(decoded, claims);
    }

    #[test]
    fn test_decode_invalid_token() {
        let handler = JwtHandler::new(SECRET, ISSUER);

        let result = handler.decode::<TestClaims>("invalid.token.here");
        assert!(matches!(result, Err(JwtError::InvalidToken(_))));
    }

    #[test]
    fn test_decode_with_wrong_secret() {
        let handler1 = JwtHandler::new(b"secret1_at_least_32_bytes_long_key!", ISSUER);
        let handler2 = JwtHandler::new(b"secret2_at_least_32_bytes_long_key!", ISSUER);

        let token = handler1.encode(&claims_expiring_in(600)).unwrap();

        let result = handler2.decode::<TestClaims>(&token);
        assert!(matches!(result, Err(JwtError::InvalidToken(_))));
    }

    #[test]
    fn test_decode_expired_token() {
        let handler = JwtHandler::new(SECRET, ISSUER);
        let token = handler.encode(&claims_expiring_in(-5)).unwrap();

        let result = handler.decode::<TestClaims>(&token);
        assert!(matches!(result, Err(JwtError::InvalidToken(_))));
    }

    #[test]
    fn test_decode_wrong_issuer() {
        let foreign = JwtHandler::new(SECRET, "someone.else");
        let handler = JwtHandler::new(SECRET, ISSUER);

        let mut claims = claims_expiring_in(600);
        claims.iss = "someone.else".to_string();
        let token = foreign.encode(&claims).unwrap();

        assert!(handler.decode::<TestClaims>(&token).is_err());
    }

    #[test]
    fn test_decode_rejects_other_hmac_algorithm() {
        let handler = JwtHandler::new(SECRET, ISSUER);

        // Same key, structurally valid payload, but signed with HS512.
        let token = encode(
            &Header::new(Algorithm::HS512),
            &claims_expiring_in(600),
            &EncodingKey::from_secret(SECRET),
        )
        .unwrap();

        assert!(handler.decode::<TestClaims>(&token).is_err());
    }
}

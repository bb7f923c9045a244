use thiserror::Error;

/// Error type for JWT operations.
///
/// Every verification failure (malformed, bad signature, wrong algorithm,
/// expired, wrong issuer, wrong type) is reported as `InvalidToken`. The
/// message is meant for server logs, not for clients.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum JwtError {
    #[error("Failed to encode token: {0}")]
    EncodingFailed(String),

    #[error("Token is invalid: {0}")]
    InvalidToken(String),
}

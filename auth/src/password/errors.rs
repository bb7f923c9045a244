use thiserror::Error;

/// Error type for credential hashing operations.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PasswordError {
    #[error("Password hashing failed: {0}")]
    HashingFailed(String),

    #[error("Stored password hash is malformed: {0}")]
    InvalidHash(String),

    #[error("Incorrect password")]
    IncorrectPassword,
}

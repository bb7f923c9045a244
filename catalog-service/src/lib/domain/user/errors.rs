use thiserror::Error;

use crate::domain::user::models::UserId;

/// Error for UserId parsing failures
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum UserIdError {
    #[error("Invalid user ID format: {0}")]
    InvalidFormat(String),
}

/// Error for EmailAddress validation failures
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum EmailError {
    #[error("Invalid email format: {0}")]
    InvalidFormat(String),
}

/// Errors reported by the user record store.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("Email already exists: {0}")]
    EmailTaken(String),

    #[error("Record not found")]
    NotFound,

    /// Concurrent transaction touched the same rows (serialization failure).
    #[error("Transaction conflict: {0}")]
    Conflict(String),

    #[error("Database error: {0}")]
    Database(String),
}

/// Error kinds of the authentication service.
///
/// `InvalidToken` covers malformed, expired, wrongly typed, wrongly signed and
/// already consumed tokens alike. Its message is for server logs only.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Email already exists: {0}")]
    EmailTaken(String),

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Invalid token: {0}")]
    InvalidToken(String),

    #[error("User not found: {0}")]
    NotFound(UserId),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl AuthError {
    /// Wrap an infrastructure failure, keeping the cause in the chain.
    pub(crate) fn internal<E>(context: &'static str, err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        AuthError::Internal(anyhow::Error::new(err).context(context))
    }
}

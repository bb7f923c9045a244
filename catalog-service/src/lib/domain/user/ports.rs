use std::sync::Arc;

use async_trait::async_trait;
use auth::AccessClaims;
use futures::future::BoxFuture;

use crate::domain::user::models::NewUser;
use crate::domain::user::models::NewUserRecord;
use crate::domain::user::models::RefreshTokenRecord;
use crate::domain::user::models::TokenId;
use crate::domain::user::models::TokenPair;
use crate::domain::user::models::User;
use crate::domain::user::models::UserId;
use crate::user::errors::AuthError;
use crate::user::errors::StoreError;

/// Port for authentication service operations.
#[async_trait]
pub trait AuthServicePort: Send + Sync + 'static {
    /// Register a new user.
    ///
    /// # Arguments
    /// * `user` - Email and admin flag of the new user
    /// * `password` - Plaintext password (hashed before it reaches the store)
    ///
    /// # Returns
    /// Stored user with its assigned ID
    ///
    /// # Errors
    /// * `EmailTaken` - Email is already registered
    /// * `Internal` - Hashing or database operation failed
    async fn register(&self, user: NewUser, password: &str) -> Result<User, AuthError>;

    /// Verify credentials and issue a token pair.
    ///
    /// # Errors
    /// * `InvalidCredentials` - Unknown email or wrong password (indistinguishable)
    /// * `Internal` - Signing or database operation failed
    async fn login(&self, email: &str, password: &str) -> Result<TokenPair, AuthError>;

    /// Exchange a live refresh token for a new pair, consuming it.
    ///
    /// # Errors
    /// * `InvalidToken` - Token is invalid, its user is gone, or it was already used or revoked
    /// * `Internal` - Signing or database operation failed
    async fn refresh(&self, refresh_token: &str) -> Result<TokenPair, AuthError>;

    /// Revoke a refresh token. Revoking an already consumed token succeeds.
    ///
    /// # Errors
    /// * `InvalidToken` - Token does not verify
    /// * `Internal` - Database operation failed
    async fn revoke(&self, refresh_token: &str) -> Result<(), AuthError>;

    /// Verify an access token without touching the store.
    ///
    /// # Errors
    /// * `InvalidToken` - Token does not verify or is not an access token
    fn validate_access_token(&self, token: &str) -> Result<AccessClaims, AuthError>;

    /// Set the admin flag of an existing user.
    ///
    /// Access tokens already issued keep their admin snapshot until they expire.
    ///
    /// # Errors
    /// * `NotFound` - User does not exist
    /// * `Internal` - Database operation failed
    async fn update_user_permissions(&self, id: UserId, is_admin: bool) -> Result<(), AuthError>;
}

/// Persistence operations on users and refresh token records.
///
/// Implemented both by repositories and by the transaction-scoped handles they
/// hand to [`UserRepository::run_in_transaction`].
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Persist a new user and return it with its assigned ID.
    ///
    /// # Errors
    /// * `EmailTaken` - Email is already registered
    /// * `Database` - Database operation failed
    async fn create_user(&self, user: NewUserRecord) -> Result<User, StoreError>;

    /// Retrieve user by email (exact match).
    ///
    /// # Errors
    /// * `Database` - Database operation failed
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;

    /// Retrieve user by identifier.
    ///
    /// # Errors
    /// * `Database` - Database operation failed
    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, StoreError>;

    /// Set the admin flag of a user.
    ///
    /// # Errors
    /// * `NotFound` - User does not exist
    /// * `Database` - Database operation failed
    async fn update_user_permissions(&self, id: UserId, is_admin: bool)
        -> Result<(), StoreError>;

    /// Persist a refresh token record.
    ///
    /// # Errors
    /// * `Database` - Database operation failed
    async fn save_refresh_token(&self, record: &RefreshTokenRecord) -> Result<(), StoreError>;

    /// Delete a refresh token record.
    ///
    /// # Errors
    /// * `NotFound` - No record with this ID (already consumed or revoked)
    /// * `Conflict` - A concurrent transaction modified the record
    /// * `Database` - Database operation failed
    async fn delete_refresh_token(&self, id: &TokenId) -> Result<(), StoreError>;
}

/// Work executed against a transaction-scoped store handle.
pub type TransactionAction = Box<
    dyn FnOnce(Arc<dyn UserStore>) -> BoxFuture<'static, Result<(), StoreError>> + Send,
>;

/// User store that can run a unit of work atomically.
#[async_trait]
pub trait UserRepository: UserStore + 'static {
    /// Run `action` against a handle bound to a single transaction.
    ///
    /// Commits when the action returns `Ok`, rolls back otherwise and returns
    /// the action's error unchanged. Isolation is at least repeatable read.
    ///
    /// # Errors
    /// * The action's own error
    /// * `Database` - Beginning or committing the transaction failed
    /// * `Conflict` - Commit lost a serialization race
    async fn run_in_transaction(&self, action: TransactionAction) -> Result<(), StoreError>;
}

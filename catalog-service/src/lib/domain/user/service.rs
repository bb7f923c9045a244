use std::sync::Arc;

use async_trait::async_trait;
use auth::AccessClaims;
use auth::PasswordError;
use auth::TokenCodec;
use futures::FutureExt;

use crate::domain::user::models::NewUser;
use crate::domain::user::models::NewUserRecord;
use crate::domain::user::models::RefreshTokenRecord;
use crate::domain::user::models::TokenId;
use crate::domain::user::models::TokenPair;
use crate::domain::user::models::User;
use crate::domain::user::models::UserId;
use crate::user::errors::AuthError;
use crate::user::errors::StoreError;
use crate::user::ports::AuthServicePort;
use crate::user::ports::UserRepository;
use crate::user::ports::UserStore;

const DUMMY_PASSWORD: &str = "dummy password";

/// Domain service implementation for authentication operations.
///
/// Holds no mutable state of its own; rotation races are settled by the
/// repository transaction.
pub struct AuthService<R>
where
    R: UserRepository,
{
    repository: Arc<R>,
    codec: Arc<TokenCodec>,
    password_hasher: auth::PasswordHasher,
    /// Verified against when the login email is unknown, so both failure
    /// paths pay for one Argon2 verification.
    dummy_hash: Arc<str>,
}

impl<R> AuthService<R>
where
    R: UserRepository,
{
    /// Create a new auth service with injected dependencies.
    ///
    /// # Arguments
    /// * `repository` - User and refresh token persistence implementation
    /// * `codec` - Token codec holding the signing key and lifetimes
    ///
    /// # Returns
    /// Configured auth service instance
    pub fn new(repository: Arc<R>, codec: Arc<TokenCodec>) -> Self {
        let password_hasher = auth::PasswordHasher::new();
        let dummy_hash = password_hasher.hash(DUMMY_PASSWORD).unwrap_or_else(|e| {
            tracing::error!(error = %e, "Failed to prepare dummy password hash");
            String::new()
        });

        Self {
            repository,
            codec,
            password_hasher,
            dummy_hash: dummy_hash.into(),
        }
    }

    async fn hash_password(&self, password: &str) -> Result<String, AuthError> {
        let hasher = self.password_hasher;
        let password = password.to_owned();

        tokio::task::spawn_blocking(move || hasher.hash(&password))
            .await
            .map_err(|e| AuthError::internal("password hashing task failed", e))?
            .map_err(|e| AuthError::internal("password hashing failed", e))
    }

    async fn verify_password(
        &self,
        password: &str,
        hash: Option<String>,
    ) -> Result<(), PasswordError> {
        let hasher = self.password_hasher;
        let password = password.to_owned();
        let dummy_hash = Arc::clone(&self.dummy_hash);

        let outcome = tokio::task::spawn_blocking(move || match hash {
            Some(hash) => hasher.verify(&password, &hash),
            None => {
                // Result ignored: the caller already knows the login fails.
                let _ = hasher.verify(&password, &dummy_hash);
                Err(PasswordError::IncorrectPassword)
            }
        })
        .await;

        match outcome {
            Ok(result) => result,
            Err(e) => Err(PasswordError::HashingFailed(e.to_string())),
        }
    }

    fn issue_pair(&self, user: &User) -> Result<(TokenPair, RefreshTokenRecord), AuthError> {
        let access_token = self
            .codec
            .sign_access(user.id.0, user.is_admin)
            .map_err(|e| AuthError::internal("failed to sign access token", e))?;
        let (refresh_token, claims) = self
            .codec
            .sign_refresh(user.id.0)
            .map_err(|e| AuthError::internal("failed to sign refresh token", e))?;

        let pair = TokenPair {
            access_token,
            refresh_token,
        };
        Ok((pair, RefreshTokenRecord::from(&claims)))
    }
}

#[async_trait]
impl<R> AuthServicePort for AuthService<R>
where
    R: UserRepository,
{
    async fn register(&self, user: NewUser, password: &str) -> Result<User, AuthError> {
        let password_hash = self.hash_password(password).await?;

        let record = NewUserRecord {
            email: user.email,
            password_hash,
            is_admin: user.is_admin,
        };

        let created = self
            .repository
            .create_user(record)
            .await
            .map_err(|e| match e {
                StoreError::EmailTaken(email) => AuthError::EmailTaken(email),
                other => AuthError::internal("failed to create user", other),
            })?;

        tracing::info!(user_id = %created.id, "User registered");
        Ok(created)
    }

    async fn login(&self, email: &str, password: &str) -> Result<TokenPair, AuthError> {
        let user = self
            .repository
            .find_by_email(email)
            .await
            .map_err(|e| AuthError::internal("failed to look up user", e))?;

        let stored_hash = user.as_ref().map(|u| u.password_hash.clone());
        match self.verify_password(password, stored_hash).await {
            Ok(()) => {}
            Err(PasswordError::IncorrectPassword) => return Err(AuthError::InvalidCredentials),
            Err(e) => return Err(AuthError::internal("failed to verify password", e)),
        }

        let user = user.ok_or(AuthError::InvalidCredentials)?;
        let (pair, record) = self.issue_pair(&user)?;

        self.repository
            .save_refresh_token(&record)
            .await
            .map_err(|e| AuthError::internal("failed to save refresh token", e))?;

        tracing::info!(user_id = %user.id, token_id = %record.id, "User logged in");
        Ok(pair)
    }

    async fn refresh(&self, refresh_token: &str) -> Result<TokenPair, AuthError> {
        let claims = self
            .codec
            .parse_refresh(refresh_token)
            .map_err(|e| AuthError::InvalidToken(e.to_string()))?;

        let user = self
            .repository
            .find_by_id(UserId(claims.user_id))
            .await
            .map_err(|e| AuthError::internal("failed to look up token owner", e))?
            .ok_or_else(|| AuthError::InvalidToken("token owner no longer exists".to_string()))?;

        let (pair, record) = self.issue_pair(&user)?;
        let old_id = TokenId(claims.jti);
        let new_id = record.id;

        let rotation = self
            .repository
            .run_in_transaction(Box::new(move |store: Arc<dyn UserStore>| {
                async move {
                    store.delete_refresh_token(&old_id).await?;
                    store.save_refresh_token(&record).await
                }
                .boxed()
            }))
            .await;

        match rotation {
            Ok(()) => {
                tracing::debug!(
                    user_id = %user.id,
                    old_token_id = %old_id,
                    token_id = %new_id,
                    "Refresh token rotated"
                );
                Ok(pair)
            }
            Err(StoreError::NotFound) | Err(StoreError::Conflict(_)) => {
                tracing::warn!(
                    user_id = %user.id,
                    token_id = %old_id,
                    "Rejected reuse of consumed refresh token"
                );
                Err(AuthError::InvalidToken("token has been used".to_string()))
            }
            Err(e) => Err(AuthError::internal("failed to rotate refresh token", e)),
        }
    }

    async fn revoke(&self, refresh_token: &str) -> Result<(), AuthError> {
        let claims = self
            .codec
            .parse_refresh(refresh_token)
            .map_err(|e| AuthError::InvalidToken(e.to_string()))?;
        let token_id = TokenId(claims.jti);

        match self.repository.delete_refresh_token(&token_id).await {
            Ok(()) => {
                tracing::info!(user_id = claims.user_id, token_id = %token_id, "Refresh token revoked");
                Ok(())
            }
            Err(StoreError::NotFound) => Ok(()),
            Err(e) => Err(AuthError::internal("failed to revoke refresh token", e)),
        }
    }

    fn validate_access_token(&self, token: &str) -> Result<AccessClaims, AuthError> {
        self.codec
            .parse_access(token)
            .map_err(|e| AuthError::InvalidToken(e.to_string()))
    }

    async fn update_user_permissions(&self, id: UserId, is_admin: bool) -> Result<(), AuthError> {
        self.repository
            .update_user_permissions(id, is_admin)
            .await
            .map_err(|e| match e {
                StoreError::NotFound => AuthError::NotFound(id),
                other => AuthError::internal("failed to update permissions", other),
            })?;

        tracing::info!(user_id = %id, is_admin, "User permissions updated");
        Ok(())
    }
}

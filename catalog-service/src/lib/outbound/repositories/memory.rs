use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Mutex;

use crate::domain::user::models::NewUserRecord;
use crate::domain::user::models::RefreshTokenRecord;
use crate::domain::user::models::TokenId;
use crate::domain::user::models::User;
use crate::domain::user::models::UserId;
use crate::domain::user::ports::TransactionAction;
use crate::domain::user::ports::UserRepository;
use crate::domain::user::ports::UserStore;
use crate::user::errors::StoreError;

#[derive(Debug, Clone, Default)]
struct MemState {
    last_user_id: i64,
    users: HashMap<UserId, User>,
    refresh_tokens: HashMap<TokenId, RefreshTokenRecord>,
}

/// Process-local user store for tests and local runs.
///
/// Clones share the same state. Transactions hold the state lock for their
/// whole duration and work on a private copy of the entire state (every user
/// and refresh token) that is written back only on success, so they are fully
/// serialized and never partially visible. Each transaction costs a full clone.
///
/// Expired refresh-token records are dropped whenever a new one is saved.
#[derive(Debug, Clone, Default)]
pub struct InMemoryUserRepository {
    state: Arc<Mutex<MemState>>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn scoped(state: MemState) -> Self {
        Self {
            state: Arc::new(Mutex::new(state)),
        }
    }
}

#[async_trait]
impl UserStore for InMemoryUserRepository {
    async fn create_user(&self, user: NewUserRecord) -> Result<User, StoreError> {
        let mut state = self.state.lock().await;

        if state.users.values().any(|u| u.email == user.email) {
            return Err(StoreError::EmailTaken(user.email.to_string()));
        }

        state.last_user_id += 1;
        let created = User {
            id: UserId(state.last_user_id),
            email: user.email,
            password_hash: user.password_hash,
            is_admin: user.is_admin,
        };
        state.users.insert(created.id, created.clone());

        Ok(created)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let state = self.state.lock().await;
        Ok(state
            .users
            .values()
            .find(|u| u.email.as_str() == email)
            .cloned())
    }

    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, StoreError> {
        let state = self.state.lock().await;
        Ok(state.users.get(&id).cloned())
    }

    async fn update_user_permissions(
        &self,
        id: UserId,
        is_admin: bool,
    ) -> Result<(), StoreError> {
        let mut state = self.state.lock().await;
        let user = state.users.get_mut(&id).ok_or(StoreError::NotFound)?;
        user.is_admin = is_admin;
        Ok(())
    }

    async fn save_refresh_token(&self, record: &RefreshTokenRecord) -> Result<(), StoreError> {
        let mut state = self.state.lock().await;
        let now = Utc::now();
        state.refresh_tokens.retain(|_, r| r.expires_at > now);
        state.refresh_tokens.insert(record.id, record.clone());
        Ok(())
    }

    async fn delete_refresh_token(&self, id: &TokenId) -> Result<(), StoreError> {
        let mut state = self.state.lock().await;
        state
            .refresh_tokens
            .remove(id)
            .map(|_| ())
            .ok_or(StoreError::NotFound)
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn run_in_transaction(&self, action: TransactionAction) -> Result<(), StoreError> {
        let mut state = self.state.lock().await;

        let scoped = Self::scoped(state.clone());
        action(Arc::new(scoped.clone())).await?;

        let committed = scoped.state.lock().await.clone();
        *state = committed;
        Ok(())
    }
}

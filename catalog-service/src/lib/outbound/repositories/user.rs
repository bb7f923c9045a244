use std::sync::Arc;

use async_trait::async_trait;
use sqlx::PgExecutor;
use sqlx::PgPool;
use sqlx::Postgres;
use sqlx::Transaction;
use tokio::sync::Mutex;

use crate::domain::user::models::EmailAddress;
use crate::domain::user::models::NewUserRecord;
use crate::domain::user::models::RefreshTokenRecord;
use crate::domain::user::models::TokenId;
use crate::domain::user::models::User;
use crate::domain::user::models::UserId;
use crate::domain::user::ports::TransactionAction;
use crate::domain::user::ports::UserRepository;
use crate::domain::user::ports::UserStore;
use crate::user::errors::StoreError;

const SERIALIZATION_FAILURE: &str = "40001";

#[derive(sqlx::FromRow)]
struct UserRow {
    id: i64,
    email: String,
    password_hash: String,
    is_admin: bool,
}

impl TryFrom<UserRow> for User {
    type Error = StoreError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        Ok(User {
            id: UserId(row.id),
            email: EmailAddress::new(row.email)
                .map_err(|e| StoreError::Database(e.to_string()))?,
            password_hash: row.password_hash,
            is_admin: row.is_admin,
        })
    }
}

fn map_db_error(e: sqlx::Error) -> StoreError {
    if let Some(db_err) = e.as_database_error() {
        if db_err.code().as_deref() == Some(SERIALIZATION_FAILURE) {
            return StoreError::Conflict(db_err.message().to_string());
        }
    }
    StoreError::Database(e.to_string())
}

async fn insert_user<'e, E>(executor: E, user: NewUserRecord) -> Result<User, StoreError>
where
    E: PgExecutor<'e>,
{
    let row = sqlx::query_as::<_, UserRow>(
        r#"
        INSERT INTO users (email, password_hash, is_admin)
        VALUES ($1, $2, $3)
        RETURNING id, email, password_hash, is_admin
        "#,
    )
    .bind(user.email.as_str())
    .bind(&user.password_hash)
    .bind(user.is_admin)
    .fetch_one(executor)
    .await
    .map_err(|e| {
        if let Some(db_err) = e.as_database_error() {
            if db_err.is_unique_violation() && db_err.constraint() == Some("users_email_key") {
                return StoreError::EmailTaken(user.email.to_string());
            }
        }
        map_db_error(e)
    })?;

    User::try_from(row)
}

async fn select_user_by_email<'e, E>(executor: E, email: &str) -> Result<Option<User>, StoreError>
where
    E: PgExecutor<'e>,
{
    sqlx::query_as::<_, UserRow>(
        r#"
        SELECT id, email, password_hash, is_admin
        FROM users
        WHERE email = $1
        "#,
    )
    .bind(email)
    .fetch_optional(executor)
    .await
    .map_err(map_db_error)?
    .map(User::try_from)
    .transpose()
}

async fn select_user_by_id<'e, E>(executor: E, id: UserId) -> Result<Option<User>, StoreError>
where
    E: PgExecutor<'e>,
{
    sqlx::query_as::<_, UserRow>(
        r#"
        SELECT id, email, password_hash, is_admin
        FROM users
        WHERE id = $1
        "#,
    )
    .bind(id.0)
    .fetch_optional(executor)
    .await
    .map_err(map_db_error)?
    .map(User::try_from)
    .transpose()
}

async fn set_admin<'e, E>(executor: E, id: UserId, is_admin: bool) -> Result<(), StoreError>
where
    E: PgExecutor<'e>,
{
    let result = sqlx::query("UPDATE users SET is_admin = $2 WHERE id = $1")
        .bind(id.0)
        .bind(is_admin)
        .execute(executor)
        .await
        .map_err(map_db_error)?;

    if result.rows_affected() == 0 {
        return Err(StoreError::NotFound);
    }

    Ok(())
}

async fn insert_refresh_token<'e, E>(
    executor: E,
    record: &RefreshTokenRecord,
) -> Result<(), StoreError>
where
    E: PgExecutor<'e>,
{
    sqlx::query(
        r#"
        INSERT INTO refresh_tokens (id, user_id, expires_at)
        VALUES ($1, $2, $3)
        "#,
    )
    .bind(record.id.0)
    .bind(record.user_id.0)
    .bind(record.expires_at)
    .execute(executor)
    .await
    .map_err(map_db_error)?;

    Ok(())
}

async fn remove_refresh_token<'e, E>(executor: E, id: &TokenId) -> Result<(), StoreError>
where
    E: PgExecutor<'e>,
{
    let result = sqlx::query("DELETE FROM refresh_tokens WHERE id = $1")
        .bind(id.0)
        .execute(executor)
        .await
        .map_err(map_db_error)?;

    if result.rows_affected() == 0 {
        return Err(StoreError::NotFound);
    }

    Ok(())
}

pub struct PostgresUserRepository {
    pool: PgPool,
}

impl PostgresUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserStore for PostgresUserRepository {
    async fn create_user(&self, user: NewUserRecord) -> Result<User, StoreError> {
        insert_user(&self.pool, user).await
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        select_user_by_email(&self.pool, email).await
    }

    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, StoreError> {
        select_user_by_id(&self.pool, id).await
    }

    async fn update_user_permissions(
        &self,
        id: UserId,
        is_admin: bool,
    ) -> Result<(), StoreError> {
        set_admin(&self.pool, id, is_admin).await
    }

    async fn save_refresh_token(&self, record: &RefreshTokenRecord) -> Result<(), StoreError> {
        insert_refresh_token(&self.pool, record).await
    }

    async fn delete_refresh_token(&self, id: &TokenId) -> Result<(), StoreError> {
        remove_refresh_token(&self.pool, id).await
    }
}

#[async_trait]
impl UserRepository for PostgresUserRepository {
    async fn run_in_transaction(&self, action: TransactionAction) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await.map_err(map_db_error)?;

        sqlx::query("SET TRANSACTION ISOLATION LEVEL REPEATABLE READ")
            .execute(&mut *tx)
            .await
            .map_err(map_db_error)?;

        let store = Arc::new(PostgresTransactionStore {
            tx: Mutex::new(Some(tx)),
        });
        let handle: Arc<dyn UserStore> = store.clone();
        let outcome = action(handle).await;

        let tx = store
            .tx
            .lock()
            .await
            .take()
            .ok_or_else(finished)?;

        match outcome {
            Ok(()) => tx.commit().await.map_err(map_db_error),
            Err(e) => {
                if let Err(rollback_err) = tx.rollback().await {
                    tracing::error!(error = %rollback_err, "Failed to roll back transaction");
                }
                Err(e)
            }
        }
    }
}

/// Store handle bound to one open transaction.
///
/// The transaction is taken back by [`PostgresUserRepository::run_in_transaction`]
/// once the action finishes; any later call on a leaked handle fails.
struct PostgresTransactionStore {
    tx: Mutex<Option<Transaction<'static, Postgres>>>,
}

fn finished() -> StoreError {
    StoreError::Database("transaction already finished".to_string())
}

#[async_trait]
impl UserStore for PostgresTransactionStore {
    async fn create_user(&self, user: NewUserRecord) -> Result<User, StoreError> {
        let mut guard = self.tx.lock().await;
        let tx = guard.as_mut().ok_or_else(finished)?;
        insert_user(&mut **tx, user).await
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let mut guard = self.tx.lock().await;
        let tx = guard.as_mut().ok_or_else(finished)?;
        select_user_by_email(&mut **tx, email).await
    }

    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, StoreError> {
        let mut guard = self.tx.lock().await;
        let tx = guard.as_mut().ok_or_else(finished)?;
        select_user_by_id(&mut **tx, id).await
    }

    async fn update_user_permissions(
        &self,
        id: UserId,
        is_admin: bool,
    ) -> Result<(), StoreError> {
        let mut guard = self.tx.lock().await;
        let tx = guard.as_mut().ok_or_else(finished)?;
        set_admin(&mut **tx, id, is_admin).await
    }

    async fn save_refresh_token(&self, record: &RefreshTokenRecord) -> Result<(), StoreError> {
        let mut guard = self.tx.lock().await;
        let tx = guard.as_mut().ok_or_else(finished)?;
        insert_refresh_token(&mut **tx, record).await
    }

    async fn delete_refresh_token(&self, id: &TokenId) -> Result<(), StoreError> {
        let mut guard = self.tx.lock().await;
        let tx = guard.as_mut().ok_or_else(finished)?;
        remove_refresh_token(&mut **tx, id).await
    }
}

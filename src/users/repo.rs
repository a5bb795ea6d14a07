use async_trait::async_trait;
use sqlx::PgPool;
use thiserror::Error;

use super::repo_types::{NewUser, User};

#[derive(Error, Debug)]
pub enum StoreError {
    /// Unique constraint on `username` rejected the insert.
    #[error("username already exists")]
    Duplicate,

    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn count_by_username(&self, username: &str) -> StoreResult<i64>;
    async fn find_by_username(&self, username: &str) -> StoreResult<Option<User>>;
    async fn find_by_token(&self, token: &str) -> StoreResult<Option<User>>;
    async fn create(&self, user: NewUser) -> StoreResult<User>;
    /// Overwrites the session token. Returns the updated row.
    async fn set_token(&self, username: &str, token: &str) -> StoreResult<Option<User>>;
}

/// A unique violation on insert means the username was taken concurrently.
fn insert_error(e: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(db) = &e {
        if db.is_unique_violation() {
            return StoreError::Duplicate;
        }
    }
    StoreError::Database(e)
}

#[derive(Clone)]
pub struct PgUserStore {
    db: PgPool,
}

impl PgUserStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn count_by_username(&self, username: &str) -> StoreResult<i64> {
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*)
            FROM users
            WHERE username = $1
            "#,
        )
        .bind(username)
        .fetch_one(&self.db)
        .await?;
        Ok(count)
    }

    async fn find_by_username(&self, username: &str) -> StoreResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT username, name, password_hash, token, created_at, updated_at
            FROM users
            WHERE username = $1
            "#,
        )
        .bind(username)
        .fetch_optional(&self.db)
        .await?;
        Ok(user)
    }

    async fn find_by_token(&self, token: &str) -> StoreResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT username, name, password_hash, token, created_at, updated_at
            FROM users
            WHERE token = $1
            "#,
        )
        .bind(token)
        .fetch_optional(&self.db)
        .await?;
        Ok(user)
    }

    async fn create(&self, user: NewUser) -> StoreResult<User> {
        let created = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (username, name, password_hash)
            VALUES ($1, $2, $3)
            RETURNING username, name, password_hash, token, created_at, updated_at
            "#,
        )
        .bind(&user.username)
        .bind(&user.name)
        .bind(&user.password_hash)
        .fetch_one(&self.db)
        .await
        .map_err(insert_error)?;
        Ok(created)
    }

    async fn set_token(&self, username: &str, token: &str) -> StoreResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            UPDATE users
            SET token = $2, updated_at = now()
            WHERE username = $1
            RETURNING username, name, password_hash, token, created_at, updated_at
            "#,
        )
        .bind(username)
        .bind(token)
        .fetch_optional(&self.db)
        .await?;
        Ok(user)
    }
}

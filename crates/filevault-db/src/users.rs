//! User account repository.

use async_trait::async_trait;
use chrono::Utc;
use filevault_core::models::User;
use filevault_core::AppError;
use sqlx::{PgPool, Postgres};
use uuid::Uuid;

/// User account store abstraction.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Create an unconfirmed account. Fails if the email is already
    /// registered.
    async fn create(&self, email: &str, password_hash: &str) -> Result<User, AppError>;

    /// Mark an account as confirmed. Returns whether a row was updated.
    async fn confirm(&self, email: &str) -> Result<bool, AppError>;

    async fn get_by_email(&self, email: &str) -> Result<Option<User>, AppError>;

    async fn get_by_id(&self, id: Uuid) -> Result<Option<User>, AppError>;

    /// Stamp last_login_at after a successful login.
    async fn record_login(&self, id: Uuid) -> Result<(), AppError>;
}

/// Postgres-backed user store
#[derive(Clone)]
pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    #[tracing::instrument(skip(self, password_hash), fields(db.table = "users", db.operation = "insert"))]
    async fn create(&self, email: &str, password_hash: &str) -> Result<User, AppError> {
        let row = sqlx::query_as::<Postgres, User>(
            r#"
            INSERT INTO users (id, email, password_hash, is_confirmed, is_active, created_at)
            VALUES ($1, $2, $3, FALSE, TRUE, $4)
            RETURNING id, email, password_hash, is_confirmed, is_active, last_login_at, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(email)
        .bind(password_hash)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                AppError::BadRequest("Email is already registered".to_string())
            }
            _ => AppError::from(e),
        })?;

        Ok(row)
    }

    #[tracing::instrument(skip(self, email), fields(db.table = "users", db.operation = "update"))]
    async fn confirm(&self, email: &str) -> Result<bool, AppError> {
        let result = sqlx::query(
            r#"
            UPDATE users SET is_confirmed = TRUE WHERE email = $1
            "#,
        )
        .bind(email)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    #[tracing::instrument(skip(self, email), fields(db.table = "users", db.operation = "select"))]
    async fn get_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let row = sqlx::query_as::<Postgres, User>(
            r#"
            SELECT id, email, password_hash, is_confirmed, is_active, last_login_at, created_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    #[tracing::instrument(skip(self), fields(db.table = "users", db.operation = "select"))]
    async fn get_by_id(&self, id: Uuid) -> Result<Option<User>, AppError> {
        let row = sqlx::query_as::<Postgres, User>(
            r#"
            SELECT id, email, password_hash, is_confirmed, is_active, last_login_at, created_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    #[tracing::instrument(skip(self), fields(db.table = "users", db.operation = "update"))]
    async fn record_login(&self, id: Uuid) -> Result<(), AppError> {
        sqlx::query(
            r#"
            UPDATE users SET last_login_at = $2 WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

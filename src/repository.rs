use std::sync::Arc;

use async_trait::async_trait;
use sqlx::PgPool;

use crate::models::{ModelError, Snippet};

/// bcrypt work factor for new password hashes.
pub const BCRYPT_COST: u32 = 12;

/// Name of the unique constraint on `users.email`, used to recognise duplicate signups.
const EMAIL_UNIQUE_CONSTRAINT: &str = "users_uc_email";

/// SnippetRepository
///
/// Persistence contract for snippets. `Send + Sync + async_trait` make the trait object
/// shareable across request tasks.
#[async_trait]
pub trait SnippetRepository: Send + Sync {
    /// Returns `ModelError::NoRecord` when no snippet has this id.
    async fn get(&self, id: i64) -> Result<Snippet, ModelError>;
    /// Inserts a snippet and returns its new id.
    async fn insert(&self, content: &str, language: &str) -> Result<i64, ModelError>;
}

/// UserRepository
///
/// Persistence and credential checks for user accounts.
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Returns `ModelError::DuplicateEmail` when the address is taken.
    async fn insert(&self, name: &str, email: &str, password: &str) -> Result<(), ModelError>;
    /// Returns the user id, or `ModelError::InvalidCredentials` for an unknown email or a
    /// wrong password alike.
    async fn authenticate(&self, email: &str, password: &str) -> Result<i64, ModelError>;
    async fn exists(&self, id: i64) -> Result<bool, ModelError>;
}

pub type SnippetState = Arc<dyn SnippetRepository>;
pub type UserState = Arc<dyn UserRepository>;

/// PostgresRepository
///
/// Implements both repository traits over one connection pool.
#[derive(Clone)]
pub struct PostgresRepository {
    pool: PgPool,
}

impl PostgresRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SnippetRepository for PostgresRepository {
    async fn get(&self, id: i64) -> Result<Snippet, ModelError> {
        sqlx::query_as::<_, Snippet>(
            "SELECT id, content, created, language FROM snippets WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(ModelError::NoRecord)
    }

    async fn insert(&self, content: &str, language: &str) -> Result<i64, ModelError> {
        let id = sqlx::query_scalar::<_, i64>(
            r#"INSERT INTO snippets (content, created, language)
               VALUES ($1, NOW(), $2)
               RETURNING id"#,
        )
        .bind(content)
        .bind(language)
        .fetch_one(&self.pool)
        .await?;
        Ok(id)
    }
}

#[async_trait]
impl UserRepository for PostgresRepository {
    /// insert
    ///
    /// Hashes the password on the blocking pool and maps a violation of the email unique
    /// constraint to `DuplicateEmail`.
    async fn insert(&self, name: &str, email: &str, password: &str) -> Result<(), ModelError> {
        let password = password.to_owned();
        let hashed = tokio::task::spawn_blocking(move || bcrypt::hash(password, BCRYPT_COST))
            .await??;

        let result = sqlx::query(
            r#"INSERT INTO users (name, email, hashed_password, created)
               VALUES ($1, $2, $3, NOW())"#,
        )
        .bind(name)
        .bind(email)
        .bind(hashed)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(sqlx::Error::Database(db_err))
                if db_err.is_unique_violation()
                    && db_err.constraint() == Some(EMAIL_UNIQUE_CONSTRAINT) =>
            {
                Err(ModelError::DuplicateEmail)
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn authenticate(&self, email: &str, password: &str) -> Result<i64, ModelError> {
        let row = sqlx::query_as::<_, (i64, String)>(
            "SELECT id, hashed_password FROM users WHERE email = $1",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        let Some((id, hashed)) = row else {
            return Err(ModelError::InvalidCredentials);
        };

        let password = password.to_owned();
        let matches = tokio::task::spawn_blocking(move || bcrypt::verify(password, &hashed))
            .await??;

        if matches {
            Ok(id)
        } else {
            Err(ModelError::InvalidCredentials)
        }
    }

    async fn exists(&self, id: i64) -> Result<bool, ModelError> {
        let exists =
            sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT true FROM users WHERE id = $1)")
                .bind(id)
                .fetch_one(&self.pool)
                .await?;
        Ok(exists)
    }
}

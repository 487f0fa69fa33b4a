//! User account repository implementation.

use sqlx::{Pool, Postgres};
use uuid::Uuid;

use boreal_core::{Error, Result, User};

/// PostgreSQL repository for user accounts.
pub struct PgUserRepository {
    pool: Pool<Postgres>,
}

impl PgUserRepository {
    /// Create a new PgUserRepository with the given connection pool.
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Create a new account. Duplicate email surfaces as `Error::Conflict`.
    pub async fn insert(
        &self,
        email: &str,
        password_hash: &str,
        phone_number: Option<&str>,
    ) -> Result<User> {
        let user = sqlx::query_as::<_, User>(
            "INSERT INTO users (email, password_hash, phone_number)
             VALUES ($1, $2, $3)
             RETURNING *",
        )
        .bind(email)
        .bind(password_hash)
        .bind(phone_number)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                Error::Conflict(format!("email already registered: {}", email))
            }
            _ => Error::Database(e),
        })?;

        Ok(user)
    }

    /// Look up an account by email.
    pub async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = $1")
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    /// Look up an account by id.
    pub async fn find_by_id(&self, user_id: Uuid) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE user_id = $1")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }
}

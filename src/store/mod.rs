/// Credential Store
///
/// Persists user records. The auth core reads through this trait only, so
/// the backing storage can be Postgres in production and memory in tests.

mod memory;
mod postgres;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::AppError;

pub use memory::InMemoryCredentialStore;
pub use postgres::PgCredentialStore;

/// Stored user record
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: i32,
    pub username: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub email: String,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A user about to be created; the password is already hashed.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub password_hash: String,
    pub email: String,
    pub active: bool,
}

#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// `Ok(None)` when no user has that username; `Err` only for store faults.
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, AppError>;

    async fn find_by_id(&self, id: i32) -> Result<Option<User>, AppError>;

    /// Insert `user` and return the id the store assigned.
    ///
    /// # Errors
    /// A duplicate username is reported as a unique violation.
    async fn create(&self, user: NewUser) -> Result<i32, AppError>;

    /// Replace the stored hash for `id`; a missing user is not an error.
    async fn update_password_hash(&self, id: i32, password_hash: String) -> Result<(), AppError>;
}

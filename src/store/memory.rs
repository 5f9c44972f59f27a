use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use super::{CredentialStore, NewUser, User};
use crate::error::{AppError, DatabaseError};

/// Process-local store with sequential ids starting at 1
#[derive(Default)]
pub struct InMemoryCredentialStore {
    inner: RwLock<Inner>,
}

#[derive(Default)]
struct Inner {
    next_id: i32,
    users: HashMap<i32, User>,
}

impl InMemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Remove a user; returns whether one was present.
    pub async fn delete(&self, id: i32) -> bool {
        self.inner.write().await.users.remove(&id).is_some()
    }
}

#[async_trait]
impl CredentialStore for InMemoryCredentialStore {
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, AppError> {
        let inner = self.inner.read().await;
        Ok(inner
            .users
            .values()
            .find(|u| u.username == username)
            .cloned())
    }

    async fn find_by_id(&self, id: i32) -> Result<Option<User>, AppError> {
        Ok(self.inner.read().await.users.get(&id).cloned())
    }

    async fn create(&self, user: NewUser) -> Result<i32, AppError> {
        let mut inner = self.inner.write().await;

        if inner.users.values().any(|u| u.username == user.username) {
            return Err(DatabaseError::UniqueViolation(format!(
                "username {:?} already exists",
                user.username
            ))
            .into());
        }

        inner.next_id += 1;
        let id = inner.next_id;
        let now = Utc::now();
        inner.users.insert(
            id,
            User {
                id,
                username: user.username,
                password_hash: user.password_hash,
                email: user.email,
                active: user.active,
                created_at: now,
                updated_at: now,
            },
        );

        Ok(id)
    }

    async fn update_password_hash(&self, id: i32, password_hash: String) -> Result<(), AppError> {
        if let Some(user) = self.inner.write().await.users.get_mut(&id) {
            user.password_hash = password_hash;
            user.updated_at = Utc::now();
        }
        Ok(())
    }
}

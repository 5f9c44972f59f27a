/// Login Flow
///
/// Exchanges a username and password for a token pair. Every credential
/// failure produces the same error, and the unknown-user path still pays
/// for a full bcrypt verification so response time does not reveal whether
/// the username exists.

use serde::Deserialize;

use crate::auth::{AuthContext, TokenPair};
use crate::error::{AppError, INVALID_CREDENTIALS_MESSAGE};
use crate::store::CredentialStore;

#[derive(Deserialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    /// Decode a JSON request body.
    pub fn from_json(body: &[u8]) -> Result<Self, AppError> {
        serde_json::from_slice(body).map_err(|e| {
            tracing::warn!(error = %e, "Login payload is not valid JSON");
            AppError::BadRequest(INVALID_CREDENTIALS_MESSAGE.to_string())
        })
    }
}

enum Outcome {
    UnknownUser,
    WrongPassword(i32),
    /// Carries a fresh hash when the stored one was made at another cost.
    Verified(i32, Option<String>),
}

/// # Errors
/// - `InvalidCredentials` for an unknown username or a wrong password
/// - store faults pass through unchanged and are not credential rejections
pub async fn login(
    ctx: &AuthContext,
    store: &dyn CredentialStore,
    credentials: Credentials,
) -> Result<TokenPair, AppError> {
    let user = store.find_by_username(&credentials.username).await?;

    let hasher = ctx.hasher().clone();
    let outcome = tokio::task::spawn_blocking(move || match user {
        None => {
            hasher.verify_placeholder(&credentials.password);
            Outcome::UnknownUser
        }
        Some(user) => {
            if hasher.verify(&user.password_hash, &credentials.password) {
                let rehashed = if hasher.needs_rehash(&user.password_hash) {
                    hasher.hash(&credentials.password).ok()
                } else {
                    None
                };
                Outcome::Verified(user.id, rehashed)
            } else {
                Outcome::WrongPassword(user.id)
            }
        }
    })
    .await?;

    match outcome {
        Outcome::UnknownUser => {
            tracing::info!("Login rejected: no such user");
            Err(AppError::InvalidCredentials)
        }
        Outcome::WrongPassword(user_id) => {
            tracing::info!(user_id = user_id, "Login rejected: wrong password");
            Err(AppError::InvalidCredentials)
        }
        Outcome::Verified(user_id, rehashed) => {
            if let Some(password_hash) = rehashed {
                match store.update_password_hash(user_id, password_hash).await {
                    Ok(()) => tracing::info!(
                        user_id = user_id,
                        cost = ctx.hasher().cost(),
                        "Password rehashed at configured cost"
                    ),
                    Err(e) => {
                        tracing::warn!(user_id = user_id, error = %e, "Failed to store rehashed password")
                    }
                }
            }

            let pair = ctx.issuer().issue_pair(user_id)?;
            tracing::info!(user_id = user_id, "User logged in");
            Ok(pair)
        }
    }
}

/// User Routes
///
/// Registration and the current-user lookup.

use actix_web::{web, HttpResponse};
use serde::Deserialize;

use crate::auth::{AuthContext, AuthenticatedUser};
use crate::error::AppError;
use crate::store::{CredentialStore, NewUser};
use crate::validators::{is_valid_email, is_valid_password, is_valid_username};

#[derive(Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
    pub email: String,
}

/// POST /users
///
/// The password is hashed before it reaches the store; the response never
/// includes the hash.
///
/// # Errors
/// - 400: invalid username, email or password
/// - 409: username already taken
pub async fn register(
    form: web::Json<RegisterRequest>,
    ctx: web::Data<AuthContext>,
    store: web::Data<dyn CredentialStore>,
) -> Result<HttpResponse, AppError> {
    let RegisterRequest {
        username,
        password,
        email,
    } = form.into_inner();

    is_valid_username(&username)?;
    is_valid_password(&password)?;
    let email = is_valid_email(&email)?;

    let password_hash = ctx.hash_password(password).await?;
    let id = store
        .create(NewUser {
            username,
            password_hash,
            email,
            active: true,
        })
        .await?;

    let user = store
        .find_by_id(id)
        .await?
        .ok_or_else(|| AppError::Internal(format!("User {} vanished after insert", id)))?;

    tracing::info!(user_id = id, "User registered");
    Ok(HttpResponse::Created().json(user))
}

/// GET /api/users/me
///
/// Identity comes from the verified token, never from the URL.
pub async fn current_user(
    user: web::ReqData<AuthenticatedUser>,
    store: web::Data<dyn CredentialStore>,
) -> Result<HttpResponse, AppError> {
    let user = store
        .find_by_id(user.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    Ok(HttpResponse::Ok().json(user))
}

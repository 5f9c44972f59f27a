/// Authentication Routes
///
/// Thin HTTP wrappers around the login and refresh flows.

use actix_web::{web, HttpRequest, HttpResponse};

use crate::auth::{self, AuthContext, Credentials};
use crate::error::AppError;
use crate::store::CredentialStore;

/// Header carrying the refresh token
pub const REFRESH_HEADER: &str = "Refresh";

/// POST /api/token
///
/// Body: `{"username": string, "password": string}`.
///
/// # Errors
/// - 400: malformed JSON, unknown username or wrong password (same message)
/// - 5xx: credential store failure
pub async fn login(
    body: web::Bytes,
    ctx: web::Data<AuthContext>,
    store: web::Data<dyn CredentialStore>,
) -> Result<HttpResponse, AppError> {
    let credentials = Credentials::from_json(&body)?;
    let pair = auth::login(ctx.get_ref(), store.get_ref(), credentials).await?;

    Ok(HttpResponse::Ok().json(pair))
}

/// GET /api/refresh
///
/// The refresh token travels in the `Refresh` header.
///
/// # Errors
/// - 400: header missing or token undecodable
/// - 401: bad signature, expired, too much lifetime left, or user gone
pub async fn refresh(
    req: HttpRequest,
    ctx: web::Data<AuthContext>,
    store: web::Data<dyn CredentialStore>,
) -> Result<HttpResponse, AppError> {
    let token = req
        .headers()
        .get(REFRESH_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or_else(|| AppError::BadRequest("Missing refresh token".to_string()))?;

    let pair = auth::refresh(ctx.get_ref(), store.get_ref(), token).await?;

    Ok(HttpResponse::Ok().json(pair))
}

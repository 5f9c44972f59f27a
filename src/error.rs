/// Error Handling Module
///
/// One taxonomy for the whole service. Every failure the auth core can
/// produce is an `AppError`, and the mapping to HTTP status codes lives in
/// exactly one place (the `ResponseError` impl at the bottom of this file).

use actix_web::{error::ResponseError, http::StatusCode, HttpResponse};
use std::error::Error as StdError;
use std::fmt;

/// Message returned for every credential rejection during login.
pub const INVALID_CREDENTIALS_MESSAGE: &str = "Invalid user or password";

/// ============================================================================
/// 1. DOMAIN-SPECIFIC ERROR TYPES
/// ============================================================================

/// Reasons a token can fail to parse
///
/// The distinction is kept for logging; callers outside the auth core only
/// ever see the uniform response shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenError {
    /// The token could not be decoded (bad segments, base64, JSON, missing claims)
    Malformed(String),
    /// Signature mismatch, or a header algorithm other than the expected HMAC variant
    InvalidSignature,
    /// Anything else the decoder reported
    Other(String),
}

impl fmt::Display for TokenError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenError::Malformed(msg) => write!(f, "Malformed token: {}", msg),
            TokenError::InvalidSignature => write!(f, "Invalid token signature"),
            TokenError::Other(msg) => write!(f, "Token parse error: {}", msg),
        }
    }
}

impl StdError for TokenError {}

/// Credential store failures
#[derive(Debug)]
pub enum DatabaseError {
    UniqueViolation(String),
    Unavailable(String),
    Unexpected(String),
}

impl fmt::Display for DatabaseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DatabaseError::UniqueViolation(msg) => write!(f, "Duplicate entry: {}", msg),
            DatabaseError::Unavailable(msg) => write!(f, "Database unavailable: {}", msg),
            DatabaseError::Unexpected(msg) => write!(f, "Database error: {}", msg),
        }
    }
}

impl StdError for DatabaseError {}

/// ============================================================================
/// 2. UNIFIED APPLICATION ERROR TYPE
/// ============================================================================

#[derive(Debug)]
pub enum AppError {
    /// Malformed payload or header
    BadRequest(String),
    /// Unknown username or wrong password; the two are never told apart
    InvalidCredentials,
    /// Missing, invalid or expired token
    Unauthorized(String),
    Token(TokenError),
    NotFound(String),
    Conflict(String),
    Database(DatabaseError),
    Internal(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::BadRequest(msg) => write!(f, "Bad request: {}", msg),
            AppError::InvalidCredentials => write!(f, "{}", INVALID_CREDENTIALS_MESSAGE),
            AppError::Unauthorized(msg) => write!(f, "Unauthorized: {}", msg),
            AppError::Token(e) => write!(f, "{}", e),
            AppError::NotFound(msg) => write!(f, "Not found: {}", msg),
            AppError::Conflict(msg) => write!(f, "Conflict: {}", msg),
            AppError::Database(e) => write!(f, "{}", e),
            AppError::Internal(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl StdError for AppError {}

// ============================================================================
// FROM IMPLEMENTATIONS
// ============================================================================

impl From<TokenError> for AppError {
    fn from(err: TokenError) -> Self {
        AppError::Token(err)
    }
}

impl From<DatabaseError> for AppError {
    fn from(err: DatabaseError) -> Self {
        AppError::Database(err)
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::Database(db_err) if db_err.code().as_deref() == Some("23505") => {
                AppError::Database(DatabaseError::UniqueViolation(db_err.message().to_string()))
            }
            sqlx::Error::Io(_)
            | sqlx::Error::Tls(_)
            | sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed => {
                AppError::Database(DatabaseError::Unavailable(err.to_string()))
            }
            _ => AppError::Database(DatabaseError::Unexpected(err.to_string())),
        }
    }
}

impl From<tokio::task::JoinError> for AppError {
    fn from(err: tokio::task::JoinError) -> Self {
        AppError::Internal(format!("Blocking task failed: {}", err))
    }
}

// ============================================================================
// 3. HTTP RESPONSE MAPPING
// ============================================================================

/// Error body sent to clients
#[derive(Debug, serde::Serialize, serde::Deserialize)]
pub struct ErrorResponse {
    /// Human-readable error message
    pub error: String,
    /// Stable code for client-side handling
    pub code: String,
}

impl AppError {
    /// Status, code and public message for this error.
    ///
    /// Internal detail never leaks into the message.
    fn parts(&self) -> (StatusCode, &'static str, String) {
        match self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg.clone()),
            AppError::InvalidCredentials => (
                StatusCode::BAD_REQUEST,
                "INVALID_CREDENTIALS",
                INVALID_CREDENTIALS_MESSAGE.to_string(),
            ),
            AppError::Unauthorized(msg) => {
                (StatusCode::UNAUTHORIZED, "UNAUTHORIZED", msg.clone())
            }
            AppError::Token(TokenError::InvalidSignature) => (
                StatusCode::UNAUTHORIZED,
                "TOKEN_INVALID",
                "Invalid token".to_string(),
            ),
            AppError::Token(_) => (
                StatusCode::BAD_REQUEST,
                "TOKEN_MALFORMED",
                "Malformed token".to_string(),
            ),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone()),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, "CONFLICT", msg.clone()),
            AppError::Database(DatabaseError::UniqueViolation(_)) => (
                StatusCode::CONFLICT,
                "DUPLICATE_ENTRY",
                "Entry already exists".to_string(),
            ),
            AppError::Database(DatabaseError::Unavailable(_)) => (
                StatusCode::SERVICE_UNAVAILABLE,
                "SERVICE_UNAVAILABLE",
                "Database service temporarily unavailable".to_string(),
            ),
            AppError::Database(DatabaseError::Unexpected(_)) | AppError::Internal(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                "Internal server error".to_string(),
            ),
        }
    }

    fn log_error(&self, error_id: &str) {
        match self {
            AppError::Database(_) | AppError::Internal(_) => {
                tracing::error!(error_id = error_id, error = %self, "Request failed");
            }
            AppError::InvalidCredentials | AppError::Unauthorized(_) | AppError::Token(_) => {
                tracing::warn!(error_id = error_id, error = %self, "Authentication rejected");
            }
            _ => {
                tracing::info!(error_id = error_id, error = %self, "Request rejected");
            }
        }
    }
}

impl ResponseError for AppError {
    fn error_response(&self) -> HttpResponse {
        let error_id = uuid::Uuid::new_v4().to_string();
        self.log_error(&error_id);

        let (status, code, error) = self.parts();
        HttpResponse::build(status).json(ErrorResponse {
            error,
            code: code.to_string(),
        })
    }

    fn status_code(&self) -> StatusCode {
        self.parts().0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_credentials_maps_to_400_with_generic_message() {
        let err = AppError::InvalidCredentials;
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(err.parts().2, "Invalid user or password");
    }

    #[test]
    fn test_token_errors_map_by_kind() {
        assert_eq!(
            AppError::from(TokenError::InvalidSignature).status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AppError::from(TokenError::Malformed("bad base64".into())).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::from(TokenError::Other("whatever".into())).status_code(),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn test_token_detail_is_not_exposed() {
        let err = AppError::from(TokenError::Malformed("InvalidToken at segment 2".into()));
        let (_, _, message) = err.parts();
        assert_eq!(message, "Malformed token");
    }

    #[test]
    fn test_store_faults_are_internal_class() {
        let unavailable = AppError::from(DatabaseError::Unavailable("refused".into()));
        assert_eq!(unavailable.status_code(), StatusCode::SERVICE_UNAVAILABLE);

        let unexpected = AppError::from(DatabaseError::Unexpected("syntax".into()));
        assert_eq!(unexpected.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(unexpected.parts().2, "Internal server error");
    }

    #[test]
    fn test_pool_timeout_is_unavailable() {
        match AppError::from(sqlx::Error::PoolTimedOut) {
            AppError::Database(DatabaseError::Unavailable(_)) => (),
            other => panic!("Expected Unavailable, got {:?}", other),
        }
    }
}

/// Authentication module
///
/// Password hashing, token signing and validation, and the login and
/// refresh flows built on top of them.

mod claims;
mod issuer;
mod jwt;
mod login;
mod password;
mod refresh;

use chrono::Duration;

use crate::configuration::{JwtSettings, PasswordSettings};
use crate::error::AppError;

pub use claims::Claims;
pub use issuer::{TokenIssuer, TokenPair, MAX_TOKEN_LIFETIME_SECONDS};
pub use jwt::TokenCodec;
pub use login::{login, Credentials};
pub use password::{PasswordHasher, MAX_COST, MIN_COST};
pub use refresh::{refresh, refresh_at};

/// Identity bound to a request by the access-control middleware.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthenticatedUser {
    pub user_id: i32,
}

/// Everything the auth flows need, built once at startup and shared
/// read-only by every worker.
#[derive(Clone)]
pub struct AuthContext {
    hasher: PasswordHasher,
    issuer: TokenIssuer,
    refresh_window: Duration,
}

impl AuthContext {
    pub fn new(hasher: PasswordHasher, issuer: TokenIssuer, refresh_window: Duration) -> Self {
        Self {
            hasher,
            issuer,
            refresh_window,
        }
    }

    /// # Errors
    /// `Internal` for an out-of-range bcrypt cost, token lifetime or refresh
    /// window. Nothing is checked lazily at request time.
    pub fn from_settings(jwt: &JwtSettings, password: &PasswordSettings) -> Result<Self, AppError> {
        if !(0..=MAX_TOKEN_LIFETIME_SECONDS).contains(&jwt.refresh_window) {
            return Err(AppError::Internal(format!(
                "jwt.refresh_window must be between 0 and {} seconds, got {}",
                MAX_TOKEN_LIFETIME_SECONDS, jwt.refresh_window
            )));
        }

        Ok(Self::new(
            PasswordHasher::new(password.bcrypt_cost)?,
            TokenIssuer::from_settings(jwt)?,
            Duration::seconds(jwt.refresh_window),
        ))
    }

    pub fn hasher(&self) -> &PasswordHasher {
        &self.hasher
    }

    pub fn issuer(&self) -> &TokenIssuer {
        &self.issuer
    }

    pub fn codec(&self) -> &TokenCodec {
        self.issuer.codec()
    }

    /// Largest remaining lifetime a refresh token may have when exchanged.
    pub fn refresh_window(&self) -> Duration {
        self.refresh_window
    }

    /// Hash on the blocking pool; bcrypt is deliberately slow.
    pub async fn hash_password(&self, password: String) -> Result<String, AppError> {
        let hasher = self.hasher.clone();
        tokio::task::spawn_blocking(move || hasher.hash(&password)).await?
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn jwt_settings() -> JwtSettings {
        JwtSettings {
            secret: "context-secret".to_string(),
            access_token_expiry: 1800,
            refresh_token_expiry: 604800,
            refresh_window: 30,
        }
    }

    fn password_settings() -> PasswordSettings {
        PasswordSettings { bcrypt_cost: MIN_COST }
    }

    #[test]
    fn test_from_settings() {
        let ctx = AuthContext::from_settings(&jwt_settings(), &password_settings()).unwrap();

        assert_eq!(ctx.refresh_window(), Duration::seconds(30));
        assert_eq!(ctx.hasher().cost(), MIN_COST);
        let pair = ctx.issuer().issue_pair(4).unwrap();
        assert!(!ctx.codec().parse(&pair.access_token).unwrap().is_expired());
    }

    #[test]
    fn test_from_settings_rejects_bad_values() {
        let cases = [
            JwtSettings { access_token_expiry: -60, ..jwt_settings() },
            JwtSettings { refresh_token_expiry: 10_000_000_000_000, ..jwt_settings() },
            JwtSettings { refresh_window: -1, ..jwt_settings() },
            JwtSettings { refresh_window: i64::MAX, ..jwt_settings() },
        ];

        for jwt in cases {
            assert!(
                matches!(
                    AuthContext::from_settings(&jwt, &password_settings()),
                    Err(AppError::Internal(_))
                ),
                "should reject {:?}",
                jwt
            );
        }

        let bad_cost = PasswordSettings { bcrypt_cost: 2 };
        assert!(AuthContext::from_settings(&jwt_settings(), &bad_cost).is_err());
    }
}

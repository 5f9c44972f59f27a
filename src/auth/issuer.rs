/// Token Issuer
///
/// Produces the access/refresh pair handed to a client after login or refresh.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::auth::claims::Claims;
use crate::auth::jwt::TokenCodec;
use crate::configuration::JwtSettings;
use crate::error::AppError;

/// Upper bound for any configured token lifetime (ten years)
pub const MAX_TOKEN_LIFETIME_SECONDS: i64 = 10 * 365 * 24 * 60 * 60;

fn lifetime(name: &str, seconds: i64) -> Result<Duration, AppError> {
    if !(1..=MAX_TOKEN_LIFETIME_SECONDS).contains(&seconds) {
        return Err(AppError::Internal(format!(
            "jwt.{} must be between 1 and {} seconds, got {}",
            name, MAX_TOKEN_LIFETIME_SECONDS, seconds
        )));
    }
    Ok(Duration::seconds(seconds))
}

/// Issued credentials; never persisted server-side.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TokenPair {
    pub user_id: i32,
    pub access_token: String,
    pub refresh_token: String,
}

#[derive(Clone)]
pub struct TokenIssuer {
    codec: TokenCodec,
    access_lifetime: Duration,
    refresh_lifetime: Duration,
}

impl TokenIssuer {
    pub fn new(codec: TokenCodec, access_lifetime: Duration, refresh_lifetime: Duration) -> Self {
        Self {
            codec,
            access_lifetime,
            refresh_lifetime,
        }
    }

    /// # Errors
    /// `Internal` if either lifetime is not between one second and
    /// `MAX_TOKEN_LIFETIME_SECONDS`.
    pub fn from_settings(settings: &JwtSettings) -> Result<Self, AppError> {
        Ok(Self::new(
            TokenCodec::new(&settings.secret),
            lifetime("access_token_expiry", settings.access_token_expiry)?,
            lifetime("refresh_token_expiry", settings.refresh_token_expiry)?,
        ))
    }

    pub fn codec(&self) -> &TokenCodec {
        &self.codec
    }

    pub fn issue_pair(&self, user_id: i32) -> Result<TokenPair, AppError> {
        self.issue_pair_at(user_id, Utc::now())
    }

    /// Both tokens are signed with the same key and differ only in expiry.
    pub fn issue_pair_at(&self, user_id: i32, now: DateTime<Utc>) -> Result<TokenPair, AppError> {
        let access_token = self
            .codec
            .issue(&Claims::new(user_id, now, self.access_lifetime))?;
        let refresh_token = self
            .codec
            .issue(&Claims::new(user_id, now, self.refresh_lifetime))?;

        Ok(TokenPair {
            user_id,
            access_token,
            refresh_token,
        })
    }
}

/// Token claims
///
/// The whole server-side state of a session: who the token is for and when
/// it stops being usable. Nothing else is embedded, so issuing the same
/// claims with the same key always yields the same token.

use chrono::{DateTime, Duration, TimeZone, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Claims {
    /// Identifier assigned by the credential store
    #[serde(rename = "userId")]
    pub user_id: i32,
    /// Expiration time (Unix timestamp, seconds)
    pub exp: i64,
}

impl Claims {
    /// Claims for `user_id` that expire `lifetime` after `now`.
    pub fn new(user_id: i32, now: DateTime<Utc>, lifetime: Duration) -> Self {
        Self {
            user_id,
            exp: (now + lifetime).timestamp(),
        }
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        Utc.timestamp_opt(self.exp, 0)
            .single()
            .unwrap_or(DateTime::<Utc>::MIN_UTC)
    }

    /// A token is usable only while its expiration is strictly in the future.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at() <= now
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }

    /// Time left before expiry; negative once expired.
    pub fn remaining_lifetime(&self, now: DateTime<Utc>) -> Duration {
        self.expires_at() - now
    }
}

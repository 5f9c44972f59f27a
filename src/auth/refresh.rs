/// Refresh Flow
///
/// Trades a refresh token that is close to expiry for a new pair. A token
/// with more than `refresh_window` left is refused, so a single fresh token
/// cannot be rolled forward indefinitely.

use chrono::{DateTime, Utc};

use crate::auth::{AuthContext, TokenPair};
use crate::error::AppError;
use crate::store::CredentialStore;

pub async fn refresh(
    ctx: &AuthContext,
    store: &dyn CredentialStore,
    token: &str,
) -> Result<TokenPair, AppError> {
    refresh_at(ctx, store, token, Utc::now()).await
}

/// # Errors
/// - `Token(InvalidSignature)` for a token not signed by this service
/// - `Token(Malformed | Other)` for a token that cannot be decoded
/// - `Unauthorized` if the token is expired, still too fresh, or names a
///   user that no longer exists
pub async fn refresh_at(
    ctx: &AuthContext,
    store: &dyn CredentialStore,
    token: &str,
    now: DateTime<Utc>,
) -> Result<TokenPair, AppError> {
    let claims = ctx.codec().parse(token)?;

    if claims.is_expired_at(now) {
        tracing::info!(user_id = claims.user_id, "Refresh rejected: token expired");
        return Err(AppError::Unauthorized("Invalid token".to_string()));
    }

    let remaining = claims.remaining_lifetime(now);
    if remaining > ctx.refresh_window() {
        tracing::info!(
            user_id = claims.user_id,
            remaining_seconds = remaining.num_seconds(),
            "Refresh rejected: token still fresh"
        );
        return Err(AppError::Unauthorized(
            "Too soon to request a new token".to_string(),
        ));
    }

    let user = store.find_by_id(claims.user_id).await?.ok_or_else(|| {
        tracing::warn!(user_id = claims.user_id, "Refresh rejected: user no longer exists");
        AppError::Unauthorized("Invalid token".to_string())
    })?;

    let pair = ctx.issuer().issue_pair_at(user.id, now)?;
    tracing::info!(user_id = user.id, "Token pair refreshed");
    Ok(pair)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{Claims, PasswordHasher, TokenCodec, TokenIssuer, MIN_COST};
    use crate::error::TokenError;
    use crate::store::{InMemoryCredentialStore, NewUser};
    use chrono::{Duration, TimeZone};

    const SECRET: &str = "refresh-test-secret";

    fn context() -> AuthContext {
        AuthContext::new(
            PasswordHasher::new(MIN_COST).unwrap(),
            TokenIssuer::new(
                TokenCodec::new(SECRET),
                Duration::minutes(30),
                Duration::days(7),
            ),
            Duration::seconds(30),
        )
    }

    fn now() -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000, 0).unwrap()
    }

    async fn store_with_user() -> (InMemoryCredentialStore, i32) {
        let store = InMemoryCredentialStore::new();
        let id = store
            .create(NewUser {
                username: "alice".to_string(),
                password_hash: "unused".to_string(),
                email: "alice@example.com".to_string(),
                active: true,
            })
            .await
            .unwrap();
        (store, id)
    }

    fn token_expiring_in(ctx: &AuthContext, user_id: i32, remaining: Duration) -> String {
        ctx.codec()
            .issue(&Claims::new(user_id, now(), remaining))
            .unwrap()
    }

    #[tokio::test]
    async fn test_refresh_within_window_issues_later_pair() {
        let ctx = context();
        let (store, id) = store_with_user().await;
        let token = token_expiring_in(&ctx, id, Duration::seconds(10));

        let pair = refresh_at(&ctx, &store, &token, now()).await.unwrap();

        let old = ctx.codec().parse(&token).unwrap();
        let new_refresh = ctx.codec().parse(&pair.refresh_token).unwrap();
        let new_access = ctx.codec().parse(&pair.access_token).unwrap();
        assert_eq!(pair.user_id, id);
        assert!(new_refresh.exp > old.exp);
        assert!(new_access.exp > old.exp);
    }

    #[tokio::test]
    async fn test_window_boundary_is_inclusive() {
        let ctx = context();
        let (store, id) = store_with_user().await;
        let token = token_expiring_in(&ctx, id, Duration::seconds(30));

        assert!(refresh_at(&ctx, &store, &token, now()).await.is_ok());
    }

    #[tokio::test]
    async fn test_fresh_token_is_too_soon() {
        let ctx = context();
        let (store, id) = store_with_user().await;
        let token = token_expiring_in(&ctx, id, Duration::seconds(31));

        match refresh_at(&ctx, &store, &token, now()).await {
            Err(AppError::Unauthorized(msg)) => assert_eq!(msg, "Too soon to request a new token"),
            other => panic!("Expected Unauthorized, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_freshly_issued_refresh_token_is_too_soon() {
        let ctx = context();
        let (store, id) = store_with_user().await;
        let pair = ctx.issuer().issue_pair_at(id, now()).unwrap();

        let result = refresh_at(&ctx, &store, &pair.refresh_token, now()).await;
        assert!(matches!(result, Err(AppError::Unauthorized(_))));
    }

    #[tokio::test]
    async fn test_expired_token_is_rejected_despite_valid_signature() {
        let ctx = context();
        let (store, id) = store_with_user().await;
        let token = token_expiring_in(&ctx, id, Duration::seconds(-5));
        assert!(ctx.codec().parse(&token).is_ok());

        match refresh_at(&ctx, &store, &token, now()).await {
            Err(AppError::Unauthorized(msg)) => assert_eq!(msg, "Invalid token"),
            other => panic!("Expected Unauthorized, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_token_expiring_exactly_now_is_rejected() {
        let ctx = context();
        let (store, id) = store_with_user().await;
        let token = token_expiring_in(&ctx, id, Duration::zero());

        let result = refresh_at(&ctx, &store, &token, now()).await;
        assert!(matches!(result, Err(AppError::Unauthorized(_))));
    }

    #[tokio::test]
    async fn test_foreign_key_is_invalid_signature() {
        let ctx = context();
        let (store, id) = store_with_user().await;
        let token = TokenCodec::new("someone-else")
            .issue(&Claims::new(id, now(), Duration::seconds(10)))
            .unwrap();

        let result = refresh_at(&ctx, &store, &token, now()).await;
        assert!(matches!(result, Err(AppError::Token(TokenError::InvalidSignature))));
    }

    #[tokio::test]
    async fn test_garbage_is_malformed() {
        let ctx = context();
        let (store, _) = store_with_user().await;

        let result = refresh_at(&ctx, &store, "garbage", now()).await;
        assert!(matches!(result, Err(AppError::Token(TokenError::Malformed(_)))));
    }

    #[tokio::test]
    async fn test_deleted_user_cannot_refresh() {
        let ctx = context();
        let (store, id) = store_with_user().await;
        let token = token_expiring_in(&ctx, id, Duration::seconds(10));
        store.delete(id).await;

        let result = refresh_at(&ctx, &store, &token, now()).await;
        assert!(matches!(result, Err(AppError::Unauthorized(_))));
    }
}

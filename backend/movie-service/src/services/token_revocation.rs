use crate::error::{AppError, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use redis::AsyncCommands;
use redis_utils::SharedConnectionManager;
use tracing::error;

/// Tokens invalidated before their natural expiry
#[async_trait]
pub trait RevocationStore: Send + Sync {
    async fn revoke(&self, token: &str, expires_at: DateTime<Utc>) -> Result<()>;
    async fn is_revoked(&self, token: &str) -> Result<bool>;
}

pub fn revocation_key(token: &str) -> String {
    format!(
        "movie_store:revoked:token:{}",
        crypto_core::hash::sha256_hex(token)
    )
}

/// Whole seconds until `expires_at`; `None` once it has passed
pub fn remaining_ttl(expires_at: DateTime<Utc>, now: DateTime<Utc>) -> Option<u64> {
    let secs = (expires_at - now).num_seconds();
    (secs > 0).then_some(secs as u64)
}

pub struct RedisRevocationStore {
    redis: SharedConnectionManager,
}

impl RedisRevocationStore {
    pub fn new(redis: SharedConnectionManager) -> Self {
        Self { redis }
    }
}

#[async_trait]
impl RevocationStore for RedisRevocationStore {
    async fn revoke(&self, token: &str, expires_at: DateTime<Utc>) -> Result<()> {
        let Some(ttl) = remaining_ttl(expires_at, Utc::now()) else {
            return Ok(());
        };
        let mut conn = self.redis.lock().await;
        conn.set_ex::<_, _, ()>(revocation_key(token), 1, ttl)
            .await
            .map_err(|e| {
                error!(error = %e, "failed to store revoked token");
                AppError::CacheError(e.to_string())
            })
    }

    async fn is_revoked(&self, token: &str) -> Result<bool> {
        let mut conn = self.redis.lock().await;
        conn.exists(revocation_key(token)).await.map_err(|e| {
            error!(error = %e, "token revocation lookup failed");
            AppError::CacheError(e.to_string())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn ttl_is_remaining_lifetime() {
        let now = Utc::now();
        assert_eq!(remaining_ttl(now + Duration::seconds(90), now), Some(90));
    }

    #[test]
    fn expired_tokens_have_no_ttl() {
        let now = Utc::now();
        assert_eq!(remaining_ttl(now, now), None);
        assert_eq!(remaining_ttl(now - Duration::seconds(5), now), None);
    }

    #[test]
    fn key_hashes_the_token() {
        let key = revocation_key("abc");
        assert!(key.starts_with("movie_store:revoked:token:"));
        assert_eq!(key.len(), "movie_store:revoked:token:".len() + 64);
        assert!(!key.contains("abc"));
    }
}

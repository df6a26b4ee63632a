use crate::db::token_repo::{self, TokenKind};
use chrono::Utc;
use sqlx::PgPool;
use tracing::info;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CleanupReport {
    pub activation: u64,
    pub password_reset: u64,
    pub refresh: u64,
}

/// Delete every activation, password-reset and refresh token past its expiry
pub async fn cleanup_expired_tokens(pool: &PgPool) -> Result<CleanupReport, sqlx::Error> {
    let now = Utc::now();
    let report = CleanupReport {
        activation: token_repo::delete_expired(pool, TokenKind::Activation, now).await?,
        password_reset: token_repo::delete_expired(pool, TokenKind::PasswordReset, now).await?,
        refresh: token_repo::delete_expired_refresh_tokens(pool, now).await?,
    };
    info!(
        activation = report.activation,
        password_reset = report.password_reset,
        refresh = report.refresh,
        "expired tokens cleaned up"
    );
    Ok(report)
}

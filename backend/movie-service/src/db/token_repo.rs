use crate::models::OneTimeToken;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgExecutor;

/// One-time token families; each has its own table keyed by user
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Activation,
    PasswordReset,
}

impl TokenKind {
    fn table(&self) -> &'static str {
        match self {
            TokenKind::Activation => "activation_tokens",
            TokenKind::PasswordReset => "password_reset_tokens",
        }
    }
}

/// Insert or overwrite the user's token of this kind
pub async fn replace_token<'e, E: PgExecutor<'e>>(
    executor: E,
    kind: TokenKind,
    user_id: i64,
    token: &str,
    expires_at: DateTime<Utc>,
) -> Result<(), sqlx::Error> {
    let sql = format!(
        r#"
        INSERT INTO {} (user_id, token, expires_at)
        VALUES ($1, $2, $3)
        ON CONFLICT (user_id) DO UPDATE
        SET token = EXCLUDED.token, expires_at = EXCLUDED.expires_at
        "#,
        kind.table()
    );
    sqlx::query(&sql)
        .bind(user_id)
        .bind(token)
        .bind(expires_at)
        .execute(executor)
        .await?;
    Ok(())
}

pub async fn find_token<'e, E: PgExecutor<'e>>(
    executor: E,
    kind: TokenKind,
    user_id: i64,
) -> Result<Option<OneTimeToken>, sqlx::Error> {
    let sql = format!(
        "SELECT user_id, token, expires_at FROM {} WHERE user_id = $1",
        kind.table()
    );
    sqlx::query_as::<_, OneTimeToken>(&sql)
        .bind(user_id)
        .fetch_optional(executor)
        .await
}

pub async fn delete_token<'e, E: PgExecutor<'e>>(
    executor: E,
    kind: TokenKind,
    user_id: i64,
) -> Result<(), sqlx::Error> {
    let sql = format!("DELETE FROM {} WHERE user_id = $1", kind.table());
    sqlx::query(&sql).bind(user_id).execute(executor).await?;
    Ok(())
}

pub async fn delete_expired<'e, E: PgExecutor<'e>>(
    executor: E,
    kind: TokenKind,
    now: DateTime<Utc>,
) -> Result<u64, sqlx::Error> {
    let sql = format!("DELETE FROM {} WHERE expires_at <= $1", kind.table());
    let result = sqlx::query(&sql).bind(now).execute(executor).await?;
    Ok(result.rows_affected())
}

pub async fn store_refresh_token<'e, E: PgExecutor<'e>>(
    executor: E,
    user_id: i64,
    token_hash: &str,
    expires_at: DateTime<Utc>,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO refresh_tokens (user_id, token_hash, expires_at) VALUES ($1, $2, $3)",
    )
    .bind(user_id)
    .bind(token_hash)
    .bind(expires_at)
    .execute(executor)
    .await?;
    Ok(())
}

/// Owner of a live refresh token
pub async fn find_refresh_token_owner<'e, E: PgExecutor<'e>>(
    executor: E,
    token_hash: &str,
    now: DateTime<Utc>,
) -> Result<Option<i64>, sqlx::Error> {
    sqlx::query_scalar(
        "SELECT user_id FROM refresh_tokens WHERE token_hash = $1 AND expires_at > $2",
    )
    .bind(token_hash)
    .bind(now)
    .fetch_optional(executor)
    .await
}

pub async fn delete_refresh_tokens_for_user<'e, E: PgExecutor<'e>>(
    executor: E,
    user_id: i64,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM refresh_tokens WHERE user_id = $1")
        .bind(user_id)
        .execute(executor)
        .await?;
    Ok(result.rows_affected())
}

pub async fn delete_expired_refresh_tokens<'e, E: PgExecutor<'e>>(
    executor: E,
    now: DateTime<Utc>,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM refresh_tokens WHERE expires_at <= $1")
        .bind(now)
        .execute(executor)
        .await?;
    Ok(result.rows_affected())
}

use crate::models::{Notification, NotificationKind};
use sqlx::postgres::PgExecutor;

const NOTIFICATION_COLUMNS: &str = "id, user_id, kind, related_id, message, is_read, created_at";

pub async fn create_notification<'e, E: PgExecutor<'e>>(
    executor: E,
    user_id: i64,
    kind: NotificationKind,
    related_id: i64,
    message: &str,
) -> Result<Notification, sqlx::Error> {
    let sql = format!(
        r#"
        INSERT INTO notifications (user_id, kind, related_id, message)
        VALUES ($1, $2, $3, $4)
        RETURNING {NOTIFICATION_COLUMNS}
        "#
    );
    sqlx::query_as::<_, Notification>(&sql)
        .bind(user_id)
        .bind(kind)
        .bind(related_id)
        .bind(message)
        .fetch_one(executor)
        .await
}

/// Newest first
pub async fn list_for_user<'e, E: PgExecutor<'e>>(
    executor: E,
    user_id: i64,
    unread_only: bool,
) -> Result<Vec<Notification>, sqlx::Error> {
    let sql = format!(
        r#"
        SELECT {NOTIFICATION_COLUMNS} FROM notifications
        WHERE user_id = $1 AND (NOT $2 OR is_read = FALSE)
        ORDER BY created_at DESC, id DESC
        "#
    );
    sqlx::query_as::<_, Notification>(&sql)
        .bind(user_id)
        .bind(unread_only)
        .fetch_all(executor)
        .await
}

/// `None` when the notification does not belong to the user
pub async fn mark_read<'e, E: PgExecutor<'e>>(
    executor: E,
    notification_id: i64,
    user_id: i64,
) -> Result<Option<Notification>, sqlx::Error> {
    let sql = format!(
        r#"
        UPDATE notifications SET is_read = TRUE
        WHERE id = $1 AND user_id = $2
        RETURNING {NOTIFICATION_COLUMNS}
        "#
    );
    sqlx::query_as::<_, Notification>(&sql)
        .bind(notification_id)
        .bind(user_id)
        .fetch_optional(executor)
        .await
}

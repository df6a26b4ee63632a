use crate::models::{Role, User};
use sqlx::postgres::PgExecutor;

const USER_SELECT: &str = r#"
    SELECT u.id, u.email, u.hashed_password, u.is_active, g.name AS role,
           u.created_at, u.updated_at
    FROM users u
    JOIN user_groups g ON g.id = u.group_id
"#;

pub async fn find_by_id<'e, E: PgExecutor<'e>>(
    executor: E,
    user_id: i64,
) -> Result<Option<User>, sqlx::Error> {
    let sql = format!("{USER_SELECT} WHERE u.id = $1");
    sqlx::query_as::<_, User>(&sql)
        .bind(user_id)
        .fetch_optional(executor)
        .await
}

/// Lookup by email; callers pass the normalized (lowercased) address
pub async fn find_by_email<'e, E: PgExecutor<'e>>(
    executor: E,
    email: &str,
) -> Result<Option<User>, sqlx::Error> {
    let sql = format!("{USER_SELECT} WHERE u.email = $1");
    sqlx::query_as::<_, User>(&sql)
        .bind(email)
        .fetch_optional(executor)
        .await
}

pub async fn create_user<'e, E: PgExecutor<'e>>(
    executor: E,
    email: &str,
    hashed_password: &str,
    is_active: bool,
    role: Role,
) -> Result<User, sqlx::Error> {
    sqlx::query_as::<_, User>(
        r#"
        WITH inserted AS (
            INSERT INTO users (email, hashed_password, is_active, group_id)
            SELECT $1, $2, $3, g.id FROM user_groups g WHERE g.name = $4
            RETURNING id, email, hashed_password, is_active, group_id, created_at, updated_at
        )
        SELECT i.id, i.email, i.hashed_password, i.is_active, g.name AS role,
               i.created_at, i.updated_at
        FROM inserted i
        JOIN user_groups g ON g.id = i.group_id
        "#,
    )
    .bind(email)
    .bind(hashed_password)
    .bind(is_active)
    .bind(role)
    .fetch_one(executor)
    .await
}

/// Returns false when the user does not exist
pub async fn set_active<'e, E: PgExecutor<'e>>(
    executor: E,
    user_id: i64,
    is_active: bool,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE users SET is_active = $2, updated_at = NOW() WHERE id = $1",
    )
    .bind(user_id)
    .bind(is_active)
    .execute(executor)
    .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn update_password<'e, E: PgExecutor<'e>>(
    executor: E,
    user_id: i64,
    hashed_password: &str,
) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE users SET hashed_password = $2, updated_at = NOW() WHERE id = $1")
        .bind(user_id)
        .bind(hashed_password)
        .execute(executor)
        .await?;
    Ok(())
}

/// Returns false when the user does not exist
pub async fn set_role<'e, E: PgExecutor<'e>>(
    executor: E,
    user_id: i64,
    role: Role,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        r#"
        UPDATE users
        SET group_id = (SELECT id FROM user_groups WHERE name = $2), updated_at = NOW()
        WHERE id = $1
        "#,
    )
    .bind(user_id)
    .bind(role)
    .execute(executor)
    .await?;
    Ok(result.rows_affected() > 0)
}

/// Newest users first
pub async fn list_users<'e, E: PgExecutor<'e>>(
    executor: E,
    limit: i64,
    offset: i64,
) -> Result<Vec<User>, sqlx::Error> {
    let sql = format!("{USER_SELECT} ORDER BY u.id DESC LIMIT $1 OFFSET $2");
    sqlx::query_as::<_, User>(&sql)
        .bind(limit)
        .bind(offset)
        .fetch_all(executor)
        .await
}

pub async fn count_users<'e, E: PgExecutor<'e>>(executor: E) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar("SELECT COUNT(*) FROM users")
        .fetch_one(executor)
        .await
}

use crate::models::{Comment, CommentRow};
use sqlx::postgres::PgExecutor;

const COMMENT_COLUMNS: &str =
    "id, movie_id, user_id, parent_id, content, created_at, updated_at";

/// Projection shared by the tree queries; `$viewer` is the caller's user id
fn row_projection(alias: &str, viewer_param: &str) -> String {
    format!(
        r#"
        {alias}.id, {alias}.movie_id, {alias}.user_id, {alias}.parent_id, {alias}.content,
        {alias}.created_at, {alias}.updated_at,
        u.email AS username,
        (SELECT COUNT(*) FROM comment_likes cl WHERE cl.comment_id = {alias}.id) AS like_count,
        EXISTS(
            SELECT 1 FROM comment_likes cl
            WHERE cl.comment_id = {alias}.id AND cl.user_id = {viewer_param}
        ) AS user_has_liked
        "#
    )
}

pub async fn create_comment<'e, E: PgExecutor<'e>>(
    executor: E,
    movie_id: i64,
    user_id: i64,
    parent_id: Option<i64>,
    content: &str,
) -> Result<Comment, sqlx::Error> {
    let sql = format!(
        r#"
        INSERT INTO comments (movie_id, user_id, parent_id, content)
        VALUES ($1, $2, $3, $4)
        RETURNING {COMMENT_COLUMNS}
        "#
    );
    sqlx::query_as::<_, Comment>(&sql)
        .bind(movie_id)
        .bind(user_id)
        .bind(parent_id)
        .bind(content)
        .fetch_one(executor)
        .await
}

pub async fn find_comment<'e, E: PgExecutor<'e>>(
    executor: E,
    comment_id: i64,
) -> Result<Option<Comment>, sqlx::Error> {
    let sql = format!("SELECT {COMMENT_COLUMNS} FROM comments WHERE id = $1");
    sqlx::query_as::<_, Comment>(&sql)
        .bind(comment_id)
        .fetch_optional(executor)
        .await
}

pub async fn find_in_movie<'e, E: PgExecutor<'e>>(
    executor: E,
    movie_id: i64,
    comment_id: i64,
) -> Result<Option<Comment>, sqlx::Error> {
    let sql = format!("SELECT {COMMENT_COLUMNS} FROM comments WHERE id = $1 AND movie_id = $2");
    sqlx::query_as::<_, Comment>(&sql)
        .bind(comment_id)
        .bind(movie_id)
        .fetch_optional(executor)
        .await
}

pub async fn count_roots<'e, E: PgExecutor<'e>>(
    executor: E,
    movie_id: i64,
) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar("SELECT COUNT(*) FROM comments WHERE movie_id = $1 AND parent_id IS NULL")
        .bind(movie_id)
        .fetch_one(executor)
        .await
}

/// Top-level comments, newest first
pub async fn list_roots<'e, E: PgExecutor<'e>>(
    executor: E,
    movie_id: i64,
    viewer_id: i64,
    limit: i64,
    offset: i64,
) -> Result<Vec<CommentRow>, sqlx::Error> {
    let sql = format!(
        r#"
        SELECT {}
        FROM comments c
        JOIN users u ON u.id = c.user_id
        WHERE c.movie_id = $1 AND c.parent_id IS NULL
        ORDER BY c.created_at DESC, c.id DESC
        LIMIT $3 OFFSET $4
        "#,
        row_projection("c", "$2")
    );
    sqlx::query_as::<_, CommentRow>(&sql)
        .bind(movie_id)
        .bind(viewer_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(executor)
        .await
}

pub async fn find_row<'e, E: PgExecutor<'e>>(
    executor: E,
    movie_id: i64,
    comment_id: i64,
    viewer_id: i64,
) -> Result<Option<CommentRow>, sqlx::Error> {
    let sql = format!(
        r#"
        SELECT {}
        FROM comments c
        JOIN users u ON u.id = c.user_id
        WHERE c.id = $1 AND c.movie_id = $3
        "#,
        row_projection("c", "$2")
    );
    sqlx::query_as::<_, CommentRow>(&sql)
        .bind(comment_id)
        .bind(viewer_id)
        .bind(movie_id)
        .fetch_optional(executor)
        .await
}

/// Every reply beneath `root_ids`, at any depth, in no particular order
pub async fn list_descendants<'e, E: PgExecutor<'e>>(
    executor: E,
    root_ids: &[i64],
    viewer_id: i64,
) -> Result<Vec<CommentRow>, sqlx::Error> {
    if root_ids.is_empty() {
        return Ok(Vec::new());
    }
    let sql = format!(
        r#"
        WITH RECURSIVE tree AS (
            SELECT c.id, c.movie_id, c.user_id, c.parent_id, c.content, c.created_at, c.updated_at
            FROM comments c
            WHERE c.parent_id = ANY($1)
            UNION ALL
            SELECT c.id, c.movie_id, c.user_id, c.parent_id, c.content, c.created_at, c.updated_at
            FROM comments c
            JOIN tree t ON c.parent_id = t.id
        )
        SELECT {}
        FROM tree t
        JOIN users u ON u.id = t.user_id
        "#,
        row_projection("t", "$2")
    );
    sqlx::query_as::<_, CommentRow>(&sql)
        .bind(root_ids)
        .bind(viewer_id)
        .fetch_all(executor)
        .await
}

pub async fn update_content<'e, E: PgExecutor<'e>>(
    executor: E,
    comment_id: i64,
    content: &str,
) -> Result<Comment, sqlx::Error> {
    let sql = format!(
        r#"
        UPDATE comments SET content = $2, updated_at = NOW()
        WHERE id = $1
        RETURNING {COMMENT_COLUMNS}
        "#
    );
    sqlx::query_as::<_, Comment>(&sql)
        .bind(comment_id)
        .bind(content)
        .fetch_one(executor)
        .await
}

/// Direct replies survive with `parent_id` cleared (ON DELETE SET NULL)
pub async fn delete_comment<'e, E: PgExecutor<'e>>(
    executor: E,
    comment_id: i64,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM comments WHERE id = $1")
        .bind(comment_id)
        .execute(executor)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// Returns false when the like already existed
pub async fn add_like<'e, E: PgExecutor<'e>>(
    executor: E,
    user_id: i64,
    comment_id: i64,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "INSERT INTO comment_likes (user_id, comment_id) VALUES ($1, $2) ON CONFLICT DO NOTHING",
    )
    .bind(user_id)
    .bind(comment_id)
    .execute(executor)
    .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn remove_like<'e, E: PgExecutor<'e>>(
    executor: E,
    user_id: i64,
    comment_id: i64,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM comment_likes WHERE user_id = $1 AND comment_id = $2")
        .bind(user_id)
        .bind(comment_id)
        .execute(executor)
        .await?;
    Ok(result.rows_affected() > 0)
}

use sqlx::postgres::PgExecutor;

/// `Some(true)` for a like, `Some(false)` for a dislike
pub async fn find_reaction<'e, E: PgExecutor<'e>>(
    executor: E,
    user_id: i64,
    movie_id: i64,
) -> Result<Option<bool>, sqlx::Error> {
    sqlx::query_scalar("SELECT is_like FROM movie_reactions WHERE user_id = $1 AND movie_id = $2")
        .bind(user_id)
        .bind(movie_id)
        .fetch_optional(executor)
        .await
}

pub async fn set_reaction<'e, E: PgExecutor<'e>>(
    executor: E,
    user_id: i64,
    movie_id: i64,
    is_like: bool,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO movie_reactions (user_id, movie_id, is_like)
        VALUES ($1, $2, $3)
        ON CONFLICT (user_id, movie_id) DO UPDATE SET is_like = EXCLUDED.is_like
        "#,
    )
    .bind(user_id)
    .bind(movie_id)
    .bind(is_like)
    .execute(executor)
    .await?;
    Ok(())
}

pub async fn delete_reaction<'e, E: PgExecutor<'e>>(
    executor: E,
    user_id: i64,
    movie_id: i64,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM movie_reactions WHERE user_id = $1 AND movie_id = $2")
        .bind(user_id)
        .bind(movie_id)
        .execute(executor)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// Returns false when the movie was already a favorite
pub async fn add_favorite<'e, E: PgExecutor<'e>>(
    executor: E,
    user_id: i64,
    movie_id: i64,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "INSERT INTO favorites (user_id, movie_id) VALUES ($1, $2) ON CONFLICT DO NOTHING",
    )
    .bind(user_id)
    .bind(movie_id)
    .execute(executor)
    .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn remove_favorite<'e, E: PgExecutor<'e>>(
    executor: E,
    user_id: i64,
    movie_id: i64,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM favorites WHERE user_id = $1 AND movie_id = $2")
        .bind(user_id)
        .bind(movie_id)
        .execute(executor)
        .await?;
    Ok(result.rows_affected() > 0)
}

use crate::models::UserRating;
use sqlx::postgres::PgExecutor;

pub async fn upsert_rating<'e, E: PgExecutor<'e>>(
    executor: E,
    user_id: i64,
    movie_id: i64,
    rating: i16,
) -> Result<UserRating, sqlx::Error> {
    sqlx::query_as::<_, UserRating>(
        r#"
        INSERT INTO ratings (user_id, movie_id, rating)
        VALUES ($1, $2, $3)
        ON CONFLICT (user_id, movie_id) DO UPDATE
        SET rating = EXCLUDED.rating, updated_at = NOW()
        RETURNING movie_id, rating, updated_at
        "#,
    )
    .bind(user_id)
    .bind(movie_id)
    .bind(rating)
    .fetch_one(executor)
    .await
}

pub async fn find_rating<'e, E: PgExecutor<'e>>(
    executor: E,
    user_id: i64,
    movie_id: i64,
) -> Result<Option<UserRating>, sqlx::Error> {
    sqlx::query_as::<_, UserRating>(
        "SELECT movie_id, rating, updated_at FROM ratings WHERE user_id = $1 AND movie_id = $2",
    )
    .bind(user_id)
    .bind(movie_id)
    .fetch_optional(executor)
    .await
}

pub async fn delete_rating<'e, E: PgExecutor<'e>>(
    executor: E,
    user_id: i64,
    movie_id: i64,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM ratings WHERE user_id = $1 AND movie_id = $2")
        .bind(user_id)
        .bind(movie_id)
        .execute(executor)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// Recompute the stored mean and count from the ratings table.
///
/// Returns the new `(rating_average, rating_count)`; the average is NULL
/// once no ratings remain.
pub async fn recompute_aggregate<'e, E: PgExecutor<'e>>(
    executor: E,
    movie_id: i64,
) -> Result<(Option<f64>, i32), sqlx::Error> {
    sqlx::query_as::<_, (Option<f64>, i32)>(
        r#"
        UPDATE movies m
        SET rating_average = s.average, rating_count = s.total, updated_at = NOW()
        FROM (
            SELECT AVG(rating)::float8 AS average, COUNT(*)::int AS total
            FROM ratings WHERE movie_id = $1
        ) s
        WHERE m.id = $1
        RETURNING m.rating_average, m.rating_count
        "#,
    )
    .bind(movie_id)
    .fetch_one(executor)
    .await
}

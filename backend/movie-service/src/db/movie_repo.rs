use crate::models::{
    Movie, MovieCreateRequest, MovieFilter, MovieListItem, MovieScope, MovieUpdateRequest,
    NamedItem,
};
use sqlx::postgres::{PgConnection, PgExecutor};
use sqlx::{PgPool, Postgres, QueryBuilder};

use super::like_pattern;

const MOVIE_COLUMNS: &str = r#"
    m.id, m.uuid, m.name, m.year, m.time, m.imdb, m.votes, m.meta_score, m.gross,
    m.description, m.price, m.certification_id, m.rating_average, m.rating_count,
    m.like_count, m.dislike_count, m.favorite_count, m.comment_count,
    m.created_at, m.updated_at
"#;

const LIST_COLUMNS: &str = r#"
    m.id, m.uuid, m.name, m.year, m.time, m.imdb, m.votes, m.price,
    m.rating_average, m.rating_count, m.like_count, m.favorite_count, m.comment_count
"#;

/// Denormalized per-movie counters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Counter {
    Like,
    Dislike,
    Favorite,
    Comment,
}

impl Counter {
    fn column(&self) -> &'static str {
        match self {
            Counter::Like => "like_count",
            Counter::Dislike => "dislike_count",
            Counter::Favorite => "favorite_count",
            Counter::Comment => "comment_count",
        }
    }
}

fn push_conditions(qb: &mut QueryBuilder<'_, Postgres>, filter: &MovieFilter, scope: MovieScope) {
    qb.push(" FROM movies m WHERE TRUE");

    match scope {
        MovieScope::All => {}
        MovieScope::FavoritesOf(user_id) => {
            qb.push(" AND EXISTS (SELECT 1 FROM favorites f WHERE f.movie_id = m.id AND f.user_id = ")
                .push_bind(user_id)
                .push(")");
        }
        MovieScope::Genre(genre_id) => {
            qb.push(" AND EXISTS (SELECT 1 FROM movie_genres mg WHERE mg.movie_id = m.id AND mg.genre_id = ")
                .push_bind(genre_id)
                .push(")");
        }
    }

    if let Some(title) = &filter.title {
        qb.push(" AND m.name ILIKE ").push_bind(like_pattern(title));
    }
    if let Some(description) = &filter.description {
        qb.push(" AND m.description ILIKE ")
            .push_bind(like_pattern(description));
    }
    if let Some(actor) = &filter.actor {
        qb.push(
            " AND EXISTS (SELECT 1 FROM movie_stars ms JOIN stars s ON s.id = ms.star_id \
             WHERE ms.movie_id = m.id AND s.name ILIKE ",
        )
        .push_bind(like_pattern(actor))
        .push(")");
    }
    if let Some(director) = &filter.director {
        qb.push(
            " AND EXISTS (SELECT 1 FROM movie_directors md JOIN directors d ON d.id = md.director_id \
             WHERE md.movie_id = m.id AND d.name ILIKE ",
        )
        .push_bind(like_pattern(director))
        .push(")");
    }
    if let Some(genre) = &filter.genre {
        qb.push(
            " AND EXISTS (SELECT 1 FROM movie_genres mg2 JOIN genres g ON g.id = mg2.genre_id \
             WHERE mg2.movie_id = m.id AND g.name ILIKE ",
        )
        .push_bind(like_pattern(genre))
        .push(")");
    }
    if let Some(v) = filter.year_min {
        qb.push(" AND m.year >= ").push_bind(v);
    }
    if let Some(v) = filter.year_max {
        qb.push(" AND m.year <= ").push_bind(v);
    }
    if let Some(v) = filter.imdb_min {
        qb.push(" AND m.imdb >= ").push_bind(v);
    }
    if let Some(v) = filter.imdb_max {
        qb.push(" AND m.imdb <= ").push_bind(v);
    }
    if let Some(v) = filter.price_min {
        qb.push(" AND m.price >= ").push_bind(v);
    }
    if let Some(v) = filter.price_max {
        qb.push(" AND m.price <= ").push_bind(v);
    }
}

pub async fn count_movies(
    pool: &PgPool,
    filter: &MovieFilter,
    scope: MovieScope,
) -> Result<i64, sqlx::Error> {
    let mut qb = QueryBuilder::<Postgres>::new("SELECT COUNT(*)");
    push_conditions(&mut qb, filter, scope);
    qb.build_query_scalar::<i64>().fetch_one(pool).await
}

/// One page of movies; ties on the sort column are broken by id
pub async fn list_movies(
    pool: &PgPool,
    filter: &MovieFilter,
    scope: MovieScope,
    limit: i64,
    offset: i64,
) -> Result<Vec<MovieListItem>, sqlx::Error> {
    let mut qb = QueryBuilder::<Postgres>::new(format!("SELECT {LIST_COLUMNS}"));
    push_conditions(&mut qb, filter, scope);
    let direction = filter.sort_order.keyword();
    qb.push(format!(
        " ORDER BY {} {direction}, m.id {direction}",
        filter.sort_by.column()
    ));
    qb.push(" LIMIT ").push_bind(limit);
    qb.push(" OFFSET ").push_bind(offset);
    qb.build_query_as::<MovieListItem>().fetch_all(pool).await
}

pub async fn find_movie<'e, E: PgExecutor<'e>>(
    executor: E,
    movie_id: i64,
) -> Result<Option<Movie>, sqlx::Error> {
    let sql = format!("SELECT {MOVIE_COLUMNS} FROM movies m WHERE m.id = $1");
    sqlx::query_as::<_, Movie>(&sql)
        .bind(movie_id)
        .fetch_optional(executor)
        .await
}

/// Row lock serializing writers of the movie's derived columns
pub async fn lock_movie(conn: &mut PgConnection, movie_id: i64) -> Result<bool, sqlx::Error> {
    let locked: Option<i64> = sqlx::query_scalar("SELECT id FROM movies WHERE id = $1 FOR UPDATE")
        .bind(movie_id)
        .fetch_optional(conn)
        .await?;
    Ok(locked.is_some())
}

pub async fn movie_exists<'e, E: PgExecutor<'e>>(
    executor: E,
    movie_id: i64,
) -> Result<bool, sqlx::Error> {
    sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM movies WHERE id = $1)")
        .bind(movie_id)
        .fetch_one(executor)
        .await
}

pub async fn movie_genres<'e, E: PgExecutor<'e>>(
    executor: E,
    movie_id: i64,
) -> Result<Vec<NamedItem>, sqlx::Error> {
    sqlx::query_as::<_, NamedItem>(
        r#"
        SELECT g.id, g.name FROM genres g
        JOIN movie_genres mg ON mg.genre_id = g.id
        WHERE mg.movie_id = $1
        ORDER BY g.name
        "#,
    )
    .bind(movie_id)
    .fetch_all(executor)
    .await
}

pub async fn movie_stars<'e, E: PgExecutor<'e>>(
    executor: E,
    movie_id: i64,
) -> Result<Vec<NamedItem>, sqlx::Error> {
    sqlx::query_as::<_, NamedItem>(
        r#"
        SELECT s.id, s.name FROM stars s
        JOIN movie_stars ms ON ms.star_id = s.id
        WHERE ms.movie_id = $1
        ORDER BY s.name
        "#,
    )
    .bind(movie_id)
    .fetch_all(executor)
    .await
}

pub async fn movie_directors<'e, E: PgExecutor<'e>>(
    executor: E,
    movie_id: i64,
) -> Result<Vec<NamedItem>, sqlx::Error> {
    sqlx::query_as::<_, NamedItem>(
        r#"
        SELECT d.id, d.name FROM directors d
        JOIN movie_directors md ON md.director_id = d.id
        WHERE md.movie_id = $1
        ORDER BY d.name
        "#,
    )
    .bind(movie_id)
    .fetch_all(executor)
    .await
}

pub async fn insert_movie(
    conn: &mut PgConnection,
    movie: &MovieCreateRequest,
) -> Result<Movie, sqlx::Error> {
    let sql = format!(
        r#"
        WITH m AS (
            INSERT INTO movies (name, year, time, imdb, votes, meta_score, gross,
                                description, price, certification_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING *
        )
        SELECT {MOVIE_COLUMNS} FROM m
        "#
    );
    sqlx::query_as::<_, Movie>(&sql)
        .bind(movie.name.trim())
        .bind(movie.year)
        .bind(movie.time)
        .bind(movie.imdb)
        .bind(movie.votes)
        .bind(movie.meta_score)
        .bind(movie.gross)
        .bind(&movie.description)
        .bind(movie.price)
        .bind(movie.certification_id)
        .fetch_one(conn)
        .await
}

/// Partial update; `None` fields keep their current value
pub async fn update_movie(
    conn: &mut PgConnection,
    movie_id: i64,
    update: &MovieUpdateRequest,
) -> Result<Option<Movie>, sqlx::Error> {
    let sql = format!(
        r#"
        WITH m AS (
            UPDATE movies SET
                name = COALESCE($2, name),
                year = COALESCE($3, year),
                time = COALESCE($4, time),
                imdb = COALESCE($5, imdb),
                votes = COALESCE($6, votes),
                meta_score = COALESCE($7, meta_score),
                gross = COALESCE($8, gross),
                description = COALESCE($9, description),
                price = COALESCE($10, price),
                certification_id = COALESCE($11, certification_id),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
        )
        SELECT {MOVIE_COLUMNS} FROM m
        "#
    );
    sqlx::query_as::<_, Movie>(&sql)
        .bind(movie_id)
        .bind(update.name.as_deref().map(str::trim))
        .bind(update.year)
        .bind(update.time)
        .bind(update.imdb)
        .bind(update.votes)
        .bind(update.meta_score)
        .bind(update.gross)
        .bind(update.description.as_deref())
        .bind(update.price)
        .bind(update.certification_id)
        .fetch_optional(conn)
        .await
}

pub async fn replace_genres(
    conn: &mut PgConnection,
    movie_id: i64,
    genre_ids: &[i32],
) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM movie_genres WHERE movie_id = $1")
        .bind(movie_id)
        .execute(&mut *conn)
        .await?;
    sqlx::query(
        r#"
        INSERT INTO movie_genres (movie_id, genre_id)
        SELECT $1, UNNEST($2::int[])
        ON CONFLICT DO NOTHING
        "#,
    )
    .bind(movie_id)
    .bind(genre_ids)
    .execute(&mut *conn)
    .await?;
    Ok(())
}

pub async fn replace_stars(
    conn: &mut PgConnection,
    movie_id: i64,
    star_ids: &[i32],
) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM movie_stars WHERE movie_id = $1")
        .bind(movie_id)
        .execute(&mut *conn)
        .await?;
    sqlx::query(
        r#"
        INSERT INTO movie_stars (movie_id, star_id)
        SELECT $1, UNNEST($2::int[])
        ON CONFLICT DO NOTHING
        "#,
    )
    .bind(movie_id)
    .bind(star_ids)
    .execute(&mut *conn)
    .await?;
    Ok(())
}

pub async fn replace_directors(
    conn: &mut PgConnection,
    movie_id: i64,
    director_ids: &[i32],
) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM movie_directors WHERE movie_id = $1")
        .bind(movie_id)
        .execute(&mut *conn)
        .await?;
    sqlx::query(
        r#"
        INSERT INTO movie_directors (movie_id, director_id)
        SELECT $1, UNNEST($2::int[])
        ON CONFLICT DO NOTHING
        "#,
    )
    .bind(movie_id)
    .bind(director_ids)
    .execute(&mut *conn)
    .await?;
    Ok(())
}

pub async fn appears_in_orders<'e, E: PgExecutor<'e>>(
    executor: E,
    movie_id: i64,
) -> Result<bool, sqlx::Error> {
    sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM order_items WHERE movie_id = $1)")
        .bind(movie_id)
        .fetch_one(executor)
        .await
}

/// Dependent rows go with the movie through ON DELETE CASCADE
pub async fn delete_movie<'e, E: PgExecutor<'e>>(
    executor: E,
    movie_id: i64,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM movies WHERE id = $1")
        .bind(movie_id)
        .execute(executor)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// Add `delta` to a counter, never going below zero
pub async fn adjust_counter<'e, E: PgExecutor<'e>>(
    executor: E,
    movie_id: i64,
    counter: Counter,
    delta: i32,
) -> Result<(), sqlx::Error> {
    let column = counter.column();
    let sql = format!(
        "UPDATE movies SET {column} = GREATEST({column} + $2, 0) WHERE id = $1"
    );
    sqlx::query(&sql)
        .bind(movie_id)
        .bind(delta)
        .execute(executor)
        .await?;
    Ok(())
}

/// Recompute every movie's aggregates from source rows
pub async fn recount_all<'e, E: PgExecutor<'e>>(executor: E) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        r#"
        UPDATE movies m SET
            rating_average = (SELECT AVG(r.rating)::float8 FROM ratings r WHERE r.movie_id = m.id),
            rating_count = (SELECT COUNT(*)::int FROM ratings r WHERE r.movie_id = m.id),
            like_count = (SELECT COUNT(*)::int FROM movie_reactions x
                          WHERE x.movie_id = m.id AND x.is_like),
            dislike_count = (SELECT COUNT(*)::int FROM movie_reactions x
                             WHERE x.movie_id = m.id AND NOT x.is_like),
            favorite_count = (SELECT COUNT(*)::int FROM favorites f WHERE f.movie_id = m.id),
            comment_count = (SELECT COUNT(*)::int FROM comments c WHERE c.movie_id = m.id),
            updated_at = NOW()
        "#,
    )
    .execute(executor)
    .await?;
    Ok(result.rows_affected())
}

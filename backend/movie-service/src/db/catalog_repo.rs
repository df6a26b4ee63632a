use crate::models::{GenreWithCount, NamedItem};
use sqlx::postgres::PgExecutor;

/// Reference tables that hold a unique `name`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NamedTable {
    Certification,
    Genre,
    Star,
    Director,
}

impl NamedTable {
    fn table(&self) -> &'static str {
        match self {
            NamedTable::Certification => "certifications",
            NamedTable::Genre => "genres",
            NamedTable::Star => "stars",
            NamedTable::Director => "directors",
        }
    }
}

/// Return the id for `name`, inserting the row when absent
pub async fn upsert_named<'e, E: PgExecutor<'e>>(
    executor: E,
    table: NamedTable,
    name: &str,
) -> Result<i32, sqlx::Error> {
    let sql = format!(
        r#"
        INSERT INTO {} (name) VALUES ($1)
        ON CONFLICT (name) DO UPDATE SET name = EXCLUDED.name
        RETURNING id
        "#,
        table.table()
    );
    sqlx::query_scalar(&sql).bind(name).fetch_one(executor).await
}

pub async fn find_named<'e, E: PgExecutor<'e>>(
    executor: E,
    table: NamedTable,
    id: i32,
) -> Result<Option<NamedItem>, sqlx::Error> {
    let sql = format!("SELECT id, name FROM {} WHERE id = $1", table.table());
    sqlx::query_as::<_, NamedItem>(&sql)
        .bind(id)
        .fetch_optional(executor)
        .await
}

pub async fn list_genres_with_counts<'e, E: PgExecutor<'e>>(
    executor: E,
) -> Result<Vec<GenreWithCount>, sqlx::Error> {
    sqlx::query_as::<_, GenreWithCount>(
        r#"
        SELECT g.id, g.name, COUNT(mg.movie_id) AS movie_count
        FROM genres g
        LEFT JOIN movie_genres mg ON mg.genre_id = g.id
        GROUP BY g.id, g.name
        ORDER BY g.name
        "#,
    )
    .fetch_all(executor)
    .await
}

/// Ids from `ids` that have no genre row
pub async fn missing_genre_ids<'e, E: PgExecutor<'e>>(
    executor: E,
    ids: &[i32],
) -> Result<Vec<i32>, sqlx::Error> {
    sqlx::query_scalar(
        r#"
        SELECT t.id
        FROM UNNEST($1::int[]) AS t(id)
        WHERE NOT EXISTS (SELECT 1 FROM genres g WHERE g.id = t.id)
        ORDER BY t.id
        "#,
    )
    .bind(ids)
    .fetch_all(executor)
    .await
}

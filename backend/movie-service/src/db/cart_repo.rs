use crate::models::{Cart, CartItemView};
use sqlx::postgres::{PgConnection, PgExecutor};

const CART_COLUMNS: &str = "id, user_id, created_at";

/// One cart per user, created on first access
pub async fn get_or_create<'e, E: PgExecutor<'e>>(
    executor: E,
    user_id: i64,
) -> Result<Cart, sqlx::Error> {
    let sql = format!(
        r#"
        INSERT INTO carts (user_id) VALUES ($1)
        ON CONFLICT (user_id) DO UPDATE SET user_id = EXCLUDED.user_id
        RETURNING {CART_COLUMNS}
        "#
    );
    sqlx::query_as::<_, Cart>(&sql)
        .bind(user_id)
        .fetch_one(executor)
        .await
}

pub async fn find_by_user<'e, E: PgExecutor<'e>>(
    executor: E,
    user_id: i64,
) -> Result<Option<Cart>, sqlx::Error> {
    let sql = format!("SELECT {CART_COLUMNS} FROM carts WHERE user_id = $1");
    sqlx::query_as::<_, Cart>(&sql)
        .bind(user_id)
        .fetch_optional(executor)
        .await
}

/// Lock the user's cart row for the rest of the transaction
pub async fn lock_for_user(
    conn: &mut PgConnection,
    user_id: i64,
) -> Result<Option<Cart>, sqlx::Error> {
    let sql = format!("SELECT {CART_COLUMNS} FROM carts WHERE user_id = $1 FOR UPDATE");
    sqlx::query_as::<_, Cart>(&sql)
        .bind(user_id)
        .fetch_optional(conn)
        .await
}

/// Oldest additions first
pub async fn list_items<'e, E: PgExecutor<'e>>(
    executor: E,
    cart_id: i64,
) -> Result<Vec<CartItemView>, sqlx::Error> {
    sqlx::query_as::<_, CartItemView>(
        r#"
        SELECT ci.movie_id, m.name, m.year, m.price, ci.added_at
        FROM cart_items ci
        JOIN movies m ON m.id = ci.movie_id
        WHERE ci.cart_id = $1
        ORDER BY ci.added_at, ci.id
        "#,
    )
    .bind(cart_id)
    .fetch_all(executor)
    .await
}

/// Returns false when the movie is already in the cart
pub async fn add_item<'e, E: PgExecutor<'e>>(
    executor: E,
    cart_id: i64,
    movie_id: i64,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "INSERT INTO cart_items (cart_id, movie_id) VALUES ($1, $2) ON CONFLICT DO NOTHING",
    )
    .bind(cart_id)
    .bind(movie_id)
    .execute(executor)
    .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn remove_item<'e, E: PgExecutor<'e>>(
    executor: E,
    cart_id: i64,
    movie_id: i64,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM cart_items WHERE cart_id = $1 AND movie_id = $2")
        .bind(cart_id)
        .bind(movie_id)
        .execute(executor)
        .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn clear<'e, E: PgExecutor<'e>>(executor: E, cart_id: i64) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM cart_items WHERE cart_id = $1")
        .bind(cart_id)
        .execute(executor)
        .await?;
    Ok(result.rows_affected())
}

/// Drop purchased movies from the buyer's cart
pub async fn remove_movies_for_user<'e, E: PgExecutor<'e>>(
    executor: E,
    user_id: i64,
    movie_ids: &[i64],
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        r#"
        DELETE FROM cart_items ci
        USING carts c
        WHERE ci.cart_id = c.id AND c.user_id = $1 AND ci.movie_id = ANY($2)
        "#,
    )
    .bind(user_id)
    .bind(movie_ids)
    .execute(executor)
    .await?;
    Ok(result.rows_affected())
}

pub async fn list_non_empty<'e, E: PgExecutor<'e>>(executor: E) -> Result<Vec<Cart>, sqlx::Error> {
    sqlx::query_as::<_, Cart>(
        r#"
        SELECT c.id, c.user_id, c.created_at
        FROM carts c
        WHERE EXISTS (SELECT 1 FROM cart_items ci WHERE ci.cart_id = c.id)
        ORDER BY c.id
        "#,
    )
    .fetch_all(executor)
    .await
}

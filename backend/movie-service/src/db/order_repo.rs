use crate::models::{AdminListFilter, Order, OrderItemView, OrderStatus};
use rust_decimal::Decimal;
use sqlx::postgres::{PgConnection, PgExecutor};
use sqlx::{PgPool, Postgres, QueryBuilder};

const ORDER_COLUMNS: &str = "id, user_id, status, total_amount, created_at, updated_at";

/// Append the admin list filters; `alias` is the table alias carrying
/// `user_id`, `status` and `created_at`.
pub(crate) fn push_admin_filter(
    qb: &mut QueryBuilder<'_, Postgres>,
    alias: &str,
    filter: &AdminListFilter,
) {
    if let Some(user_id) = filter.user_id {
        qb.push(format!(" AND {alias}.user_id = ")).push_bind(user_id);
    }
    if let Some(status) = &filter.status {
        qb.push(format!(" AND {alias}.status = "))
            .push_bind(status.trim().to_ascii_lowercase());
    }
    if let Some(from) = filter.date_from {
        qb.push(format!(" AND {alias}.created_at >= ")).push_bind(from);
    }
    if let Some(to) = filter.date_to {
        qb.push(format!(" AND {alias}.created_at <= ")).push_bind(to);
    }
}

/// Which of `movie_ids` the user already owns through a paid order
pub async fn purchased_movie_ids<'e, E: PgExecutor<'e>>(
    executor: E,
    user_id: i64,
    movie_ids: &[i64],
) -> Result<Vec<i64>, sqlx::Error> {
    sqlx::query_scalar(
        r#"
        SELECT DISTINCT oi.movie_id
        FROM order_items oi
        JOIN orders o ON o.id = oi.order_id
        WHERE o.user_id = $1 AND o.status = 'paid' AND oi.movie_id = ANY($2)
        "#,
    )
    .bind(user_id)
    .bind(movie_ids)
    .fetch_all(executor)
    .await
}

/// Which of `movie_ids` already sit in one of the user's pending orders
pub async fn pending_movie_ids<'e, E: PgExecutor<'e>>(
    executor: E,
    user_id: i64,
    movie_ids: &[i64],
) -> Result<Vec<i64>, sqlx::Error> {
    sqlx::query_scalar(
        r#"
        SELECT DISTINCT oi.movie_id
        FROM order_items oi
        JOIN orders o ON o.id = oi.order_id
        WHERE o.user_id = $1 AND o.status = 'pending' AND oi.movie_id = ANY($2)
        "#,
    )
    .bind(user_id)
    .bind(movie_ids)
    .fetch_all(executor)
    .await
}

pub async fn create_order(
    conn: &mut PgConnection,
    user_id: i64,
    total_amount: Decimal,
) -> Result<Order, sqlx::Error> {
    let sql = format!(
        r#"
        INSERT INTO orders (user_id, status, total_amount)
        VALUES ($1, 'pending', $2)
        RETURNING {ORDER_COLUMNS}
        "#
    );
    sqlx::query_as::<_, Order>(&sql)
        .bind(user_id)
        .bind(total_amount)
        .fetch_one(conn)
        .await
}

/// Snapshot current movie prices into order items
pub async fn add_items(
    conn: &mut PgConnection,
    order_id: i64,
    movie_ids: &[i64],
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        r#"
        INSERT INTO order_items (order_id, movie_id, price_at_order)
        SELECT $1, m.id, m.price FROM movies m WHERE m.id = ANY($2)
        "#,
    )
    .bind(order_id)
    .bind(movie_ids)
    .execute(conn)
    .await?;
    Ok(result.rows_affected())
}

pub async fn find_order<'e, E: PgExecutor<'e>>(
    executor: E,
    order_id: i64,
) -> Result<Option<Order>, sqlx::Error> {
    let sql = format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1");
    sqlx::query_as::<_, Order>(&sql)
        .bind(order_id)
        .fetch_optional(executor)
        .await
}

pub async fn find_for_user<'e, E: PgExecutor<'e>>(
    executor: E,
    user_id: i64,
    order_id: i64,
) -> Result<Option<Order>, sqlx::Error> {
    let sql = format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1 AND user_id = $2");
    sqlx::query_as::<_, Order>(&sql)
        .bind(order_id)
        .bind(user_id)
        .fetch_optional(executor)
        .await
}

pub async fn lock_order(
    conn: &mut PgConnection,
    order_id: i64,
) -> Result<Option<Order>, sqlx::Error> {
    let sql = format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1 FOR UPDATE");
    sqlx::query_as::<_, Order>(&sql)
        .bind(order_id)
        .fetch_optional(conn)
        .await
}

/// Newest first
pub async fn list_for_user<'e, E: PgExecutor<'e>>(
    executor: E,
    user_id: i64,
) -> Result<Vec<Order>, sqlx::Error> {
    let sql = format!(
        "SELECT {ORDER_COLUMNS} FROM orders WHERE user_id = $1 ORDER BY created_at DESC, id DESC"
    );
    sqlx::query_as::<_, Order>(&sql)
        .bind(user_id)
        .fetch_all(executor)
        .await
}

pub async fn list_filtered(
    pool: &PgPool,
    filter: &AdminListFilter,
) -> Result<Vec<Order>, sqlx::Error> {
    let mut qb = QueryBuilder::<Postgres>::new(
        "SELECT o.id, o.user_id, o.status, o.total_amount, o.created_at, o.updated_at \
         FROM orders o WHERE TRUE",
    );
    push_admin_filter(&mut qb, "o", filter);
    qb.push(" ORDER BY o.created_at DESC, o.id DESC");
    qb.build_query_as::<Order>().fetch_all(pool).await
}

/// Items of several orders at once
pub async fn list_items<'e, E: PgExecutor<'e>>(
    executor: E,
    order_ids: &[i64],
) -> Result<Vec<OrderItemView>, sqlx::Error> {
    sqlx::query_as::<_, OrderItemView>(
        r#"
        SELECT oi.id, oi.order_id, oi.movie_id, m.name, oi.price_at_order
        FROM order_items oi
        JOIN movies m ON m.id = oi.movie_id
        WHERE oi.order_id = ANY($1)
        ORDER BY oi.id
        "#,
    )
    .bind(order_ids)
    .fetch_all(executor)
    .await
}

pub async fn items_total<'e, E: PgExecutor<'e>>(
    executor: E,
    order_id: i64,
) -> Result<Decimal, sqlx::Error> {
    sqlx::query_scalar(
        "SELECT COALESCE(SUM(price_at_order), 0) FROM order_items WHERE order_id = $1",
    )
    .bind(order_id)
    .fetch_one(executor)
    .await
}

pub async fn set_status<'e, E: PgExecutor<'e>>(
    executor: E,
    order_id: i64,
    status: OrderStatus,
) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE orders SET status = $2, updated_at = NOW() WHERE id = $1")
        .bind(order_id)
        .bind(status)
        .execute(executor)
        .await?;
    Ok(())
}

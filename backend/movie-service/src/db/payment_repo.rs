use crate::models::{AdminListFilter, Payment, PaymentItemView, PaymentStatus};
use rust_decimal::Decimal;
use sqlx::postgres::{PgConnection, PgExecutor};
use sqlx::{PgPool, Postgres, QueryBuilder};

use super::order_repo::push_admin_filter;

const PAYMENT_COLUMNS: &str =
    "id, user_id, order_id, status, amount, external_payment_id, created_at, updated_at";

/// Pending payment for an order plus one payment item per order item
pub async fn create_pending(
    conn: &mut PgConnection,
    user_id: i64,
    order_id: i64,
    amount: Decimal,
) -> Result<Payment, sqlx::Error> {
    let sql = format!(
        r#"
        INSERT INTO payments (user_id, order_id, status, amount)
        VALUES ($1, $2, 'pending', $3)
        RETURNING {PAYMENT_COLUMNS}
        "#
    );
    let payment = sqlx::query_as::<_, Payment>(&sql)
        .bind(user_id)
        .bind(order_id)
        .bind(amount)
        .fetch_one(&mut *conn)
        .await?;

    sqlx::query(
        r#"
        INSERT INTO payment_items (payment_id, order_item_id, price_at_payment)
        SELECT $1, oi.id, oi.price_at_order FROM order_items oi WHERE oi.order_id = $2
        "#,
    )
    .bind(payment.id)
    .bind(order_id)
    .execute(&mut *conn)
    .await?;

    Ok(payment)
}

pub async fn find_payment<'e, E: PgExecutor<'e>>(
    executor: E,
    payment_id: i64,
) -> Result<Option<Payment>, sqlx::Error> {
    let sql = format!("SELECT {PAYMENT_COLUMNS} FROM payments WHERE id = $1");
    sqlx::query_as::<_, Payment>(&sql)
        .bind(payment_id)
        .fetch_optional(executor)
        .await
}

pub async fn lock_payment(
    conn: &mut PgConnection,
    payment_id: i64,
) -> Result<Option<Payment>, sqlx::Error> {
    let sql = format!("SELECT {PAYMENT_COLUMNS} FROM payments WHERE id = $1 FOR UPDATE");
    sqlx::query_as::<_, Payment>(&sql)
        .bind(payment_id)
        .fetch_optional(conn)
        .await
}

pub async fn lock_by_external_id(
    conn: &mut PgConnection,
    external_payment_id: &str,
) -> Result<Option<Payment>, sqlx::Error> {
    let sql = format!(
        "SELECT {PAYMENT_COLUMNS} FROM payments WHERE external_payment_id = $1 FOR UPDATE"
    );
    sqlx::query_as::<_, Payment>(&sql)
        .bind(external_payment_id)
        .fetch_optional(conn)
        .await
}

/// Most recent payment of an order, locked
pub async fn lock_latest_for_order(
    conn: &mut PgConnection,
    order_id: i64,
) -> Result<Option<Payment>, sqlx::Error> {
    let sql = format!(
        r#"
        SELECT {PAYMENT_COLUMNS} FROM payments
        WHERE order_id = $1
        ORDER BY id DESC
        LIMIT 1
        FOR UPDATE
        "#
    );
    sqlx::query_as::<_, Payment>(&sql)
        .bind(order_id)
        .fetch_optional(conn)
        .await
}

pub async fn find_pending_for_order<'e, E: PgExecutor<'e>>(
    executor: E,
    order_id: i64,
) -> Result<Option<Payment>, sqlx::Error> {
    let sql = format!(
        "SELECT {PAYMENT_COLUMNS} FROM payments WHERE order_id = $1 AND status = 'pending'"
    );
    sqlx::query_as::<_, Payment>(&sql)
        .bind(order_id)
        .fetch_optional(executor)
        .await
}

pub async fn set_external_id<'e, E: PgExecutor<'e>>(
    executor: E,
    payment_id: i64,
    external_payment_id: &str,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE payments SET external_payment_id = $2, updated_at = NOW() WHERE id = $1",
    )
    .bind(payment_id)
    .bind(external_payment_id)
    .execute(executor)
    .await?;
    Ok(())
}

pub async fn set_status<'e, E: PgExecutor<'e>>(
    executor: E,
    payment_id: i64,
    status: PaymentStatus,
) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE payments SET status = $2, updated_at = NOW() WHERE id = $1")
        .bind(payment_id)
        .bind(status)
        .execute(executor)
        .await?;
    Ok(())
}

/// Cancel the pending payments of an order; returns their provider ids
pub async fn cancel_pending_for_order<'e, E: PgExecutor<'e>>(
    executor: E,
    order_id: i64,
) -> Result<Vec<Option<String>>, sqlx::Error> {
    sqlx::query_scalar(
        r#"
        UPDATE payments SET status = 'canceled', updated_at = NOW()
        WHERE order_id = $1 AND status = 'pending'
        RETURNING external_payment_id
        "#,
    )
    .bind(order_id)
    .fetch_all(executor)
    .await
}

/// Newest first
pub async fn list_for_user<'e, E: PgExecutor<'e>>(
    executor: E,
    user_id: i64,
) -> Result<Vec<Payment>, sqlx::Error> {
    let sql = format!(
        "SELECT {PAYMENT_COLUMNS} FROM payments WHERE user_id = $1 ORDER BY created_at DESC, id DESC"
    );
    sqlx::query_as::<_, Payment>(&sql)
        .bind(user_id)
        .fetch_all(executor)
        .await
}

pub async fn list_filtered(
    pool: &PgPool,
    filter: &AdminListFilter,
) -> Result<Vec<Payment>, sqlx::Error> {
    let mut qb = QueryBuilder::<Postgres>::new(
        "SELECT p.id, p.user_id, p.order_id, p.status, p.amount, p.external_payment_id, \
         p.created_at, p.updated_at FROM payments p WHERE TRUE",
    );
    push_admin_filter(&mut qb, "p", filter);
    qb.push(" ORDER BY p.created_at DESC, p.id DESC");
    qb.build_query_as::<Payment>().fetch_all(pool).await
}

pub async fn list_items<'e, E: PgExecutor<'e>>(
    executor: E,
    payment_id: i64,
) -> Result<Vec<PaymentItemView>, sqlx::Error> {
    sqlx::query_as::<_, PaymentItemView>(
        r#"
        SELECT pi.id, pi.order_item_id, oi.movie_id, m.name, pi.price_at_payment
        FROM payment_items pi
        JOIN order_items oi ON oi.id = pi.order_item_id
        JOIN movies m ON m.id = oi.movie_id
        WHERE pi.payment_id = $1
        ORDER BY pi.id
        "#,
    )
    .bind(payment_id)
    .fetch_all(executor)
    .await
}

/// Movie ids covered by a payment
pub async fn movie_ids<'e, E: PgExecutor<'e>>(
    executor: E,
    payment_id: i64,
) -> Result<Vec<i64>, sqlx::Error> {
    sqlx::query_scalar(
        r#"
        SELECT oi.movie_id
        FROM payment_items pi
        JOIN order_items oi ON oi.id = pi.order_item_id
        WHERE pi.payment_id = $1
        "#,
    )
    .bind(payment_id)
    .fetch_all(executor)
    .await
}

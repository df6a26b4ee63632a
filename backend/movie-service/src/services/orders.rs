/// Checkout and the customer's view of orders
use super::PaymentGateway;
use crate::db::{cart_repo, order_repo, payment_repo};
use crate::error::{AppError, Result};
use crate::models::{Order, OrderResponse, OrderStatus, PaymentProgressResponse};
use rust_decimal::Decimal;
use sqlx::PgPool;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Clone)]
pub struct OrderService {
    pool: PgPool,
    gateway: Arc<dyn PaymentGateway>,
}

fn order_not_found() -> AppError {
    AppError::NotFound("Order not found.".into())
}

impl OrderService {
    pub fn new(pool: PgPool, gateway: Arc<dyn PaymentGateway>) -> Self {
        Self { pool, gateway }
    }

    /// Turn the cart into a pending order with a pending payment.
    ///
    /// Cart items stay in place until the payment is confirmed.
    pub async fn checkout(&self, user_id: i64) -> Result<OrderResponse> {
        let empty = || AppError::BadRequest("Cart is empty.".into());

        let mut tx = self.pool.begin().await?;
        let cart = cart_repo::lock_for_user(&mut tx, user_id)
            .await?
            .ok_or_else(empty)?;
        let items = cart_repo::list_items(&mut *tx, cart.id).await?;
        if items.is_empty() {
            return Err(empty());
        }

        let movie_ids: Vec<i64> = items.iter().map(|item| item.movie_id).collect();
        let owned = order_repo::purchased_movie_ids(&mut *tx, user_id, &movie_ids).await?;
        if !owned.is_empty() {
            return Err(AppError::duplicate_purchase());
        }
        let pending = order_repo::pending_movie_ids(&mut *tx, user_id, &movie_ids).await?;
        if !pending.is_empty() {
            return Err(AppError::invalid_state("Movies already in pending order."));
        }

        let total: Decimal = items.iter().map(|item| item.price).sum();
        let order = order_repo::create_order(&mut tx, user_id, total).await?;
        order_repo::add_items(&mut tx, order.id, &movie_ids).await?;
        let payment = payment_repo::create_pending(&mut tx, user_id, order.id, total).await?;
        tx.commit().await?;

        info!(
            user_id,
            order_id = order.id,
            payment_id = payment.id,
            total = %total,
            "order created"
        );
        let items = order_repo::list_items(&self.pool, &[order.id]).await?;
        Ok(OrderResponse::new(order, items))
    }

    pub async fn list(&self, user_id: i64) -> Result<Vec<OrderResponse>> {
        let orders = order_repo::list_for_user(&self.pool, user_id).await?;
        with_items(&self.pool, orders).await
    }

    pub async fn get(&self, user_id: i64, order_id: i64) -> Result<OrderResponse> {
        let order = order_repo::find_for_user(&self.pool, user_id, order_id)
            .await?
            .ok_or_else(order_not_found)?;
        let items = order_repo::list_items(&self.pool, &[order.id]).await?;
        Ok(OrderResponse::new(order, items))
    }

    pub async fn cancel(&self, user_id: i64, order_id: i64) -> Result<OrderResponse> {
        let mut tx = self.pool.begin().await?;
        let order = order_repo::lock_order(&mut tx, order_id)
            .await?
            .filter(|order| order.user_id == user_id)
            .ok_or_else(order_not_found)?;
        if !order.status.can_cancel() {
            return Err(AppError::invalid_state("Only pending orders can be canceled."));
        }

        order_repo::set_status(&mut *tx, order.id, OrderStatus::Canceled).await?;
        let intents = payment_repo::cancel_pending_for_order(&mut *tx, order.id).await?;
        tx.commit().await?;
        info!(user_id, order_id, "order canceled");

        for intent_id in intents.into_iter().flatten() {
            if let Err(e) = self.gateway.cancel_intent(&intent_id).await {
                warn!(order_id, intent_id = %intent_id, error = %e, "provider cancel failed");
            }
        }

        self.get(user_id, order_id).await
    }

    pub async fn payment_status(
        &self,
        user_id: i64,
        order_id: i64,
    ) -> Result<PaymentProgressResponse> {
        let order = order_repo::find_for_user(&self.pool, user_id, order_id)
            .await?
            .ok_or_else(order_not_found)?;
        Ok(PaymentProgressResponse {
            order_id: order.id,
            status: order.status.into(),
        })
    }
}

/// Attach items to a batch of orders with one query
pub(crate) async fn with_items(pool: &PgPool, orders: Vec<Order>) -> Result<Vec<OrderResponse>> {
    let ids: Vec<i64> = orders.iter().map(|order| order.id).collect();
    let mut items_by_order: HashMap<i64, Vec<_>> = HashMap::new();
    for item in order_repo::list_items(pool, &ids).await? {
        items_by_order.entry(item.order_id).or_default().push(item);
    }
    Ok(orders
        .into_iter()
        .map(|order| {
            let items = items_by_order.remove(&order.id).unwrap_or_default();
            OrderResponse::new(order, items)
        })
        .collect())
}

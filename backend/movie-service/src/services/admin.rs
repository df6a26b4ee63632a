/// Administrator tools: groups, activation, counters, carts, orders and refunds
use super::orders::with_items;
use super::PaymentGateway;
use crate::db::{cart_repo, movie_repo, order_repo, payment_repo, user_repo};
use crate::error::{AppError, Result};
use crate::models::{
    AdminListFilter, CartResponse, OrderResponse, OrderStatus, Payment, PaymentStatus,
    RecountResponse, Role, UserResponse,
};
use sqlx::PgPool;
use std::sync::Arc;
use tracing::info;

#[derive(Clone)]
pub struct AdminService {
    pool: PgPool,
    gateway: Arc<dyn PaymentGateway>,
}

fn user_not_found() -> AppError {
    AppError::NotFound("User not found.".into())
}

impl AdminService {
    pub fn new(pool: PgPool, gateway: Arc<dyn PaymentGateway>) -> Self {
        Self { pool, gateway }
    }

    pub async fn change_group(&self, user_id: i64, group: &str) -> Result<UserResponse> {
        let role =
            Role::parse(group).ok_or_else(|| AppError::NotFound("Group not found.".into()))?;
        if !user_repo::set_role(&self.pool, user_id, role).await? {
            return Err(user_not_found());
        }
        info!(user_id, group = role.as_str(), "user group changed");
        self.user(user_id).await
    }

    pub async fn set_activation(&self, user_id: i64, is_active: bool) -> Result<UserResponse> {
        if !user_repo::set_active(&self.pool, user_id, is_active).await? {
            return Err(user_not_found());
        }
        info!(user_id, is_active, "user activation changed");
        self.user(user_id).await
    }

    async fn user(&self, user_id: i64) -> Result<UserResponse> {
        user_repo::find_by_id(&self.pool, user_id)
            .await?
            .map(UserResponse::from)
            .ok_or_else(user_not_found)
    }

    pub async fn recount_counters(&self) -> Result<RecountResponse> {
        let movies_updated = movie_repo::recount_all(&self.pool).await?;
        info!(movies_updated, "movie counters recomputed");
        Ok(RecountResponse { movies_updated })
    }

    pub async fn list_carts(&self) -> Result<Vec<CartResponse>> {
        let carts = cart_repo::list_non_empty(&self.pool).await?;
        let mut responses = Vec::with_capacity(carts.len());
        for cart in carts {
            let items = cart_repo::list_items(&self.pool, cart.id).await?;
            responses.push(CartResponse::new(&cart, items));
        }
        Ok(responses)
    }

    pub async fn user_cart(&self, user_id: i64) -> Result<CartResponse> {
        user_repo::find_by_id(&self.pool, user_id)
            .await?
            .ok_or_else(user_not_found)?;
        let cart = cart_repo::find_by_user(&self.pool, user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Cart not found.".into()))?;
        let items = cart_repo::list_items(&self.pool, cart.id).await?;
        Ok(CartResponse::new(&cart, items))
    }

    pub async fn orders(&self, filter: &AdminListFilter) -> Result<Vec<OrderResponse>> {
        let orders = order_repo::list_filtered(&self.pool, filter).await?;
        with_items(&self.pool, orders).await
    }

    pub async fn payments(&self, filter: &AdminListFilter) -> Result<Vec<Payment>> {
        Ok(payment_repo::list_filtered(&self.pool, filter).await?)
    }

    /// Refund at the provider, then mark the payment and its order refunded
    pub async fn refund(&self, payment_id: i64) -> Result<Payment> {
        let mut tx = self.pool.begin().await?;
        let payment = payment_repo::lock_payment(&mut tx, payment_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Payment not found.".into()))?;

        match payment.status {
            PaymentStatus::Successful => {}
            PaymentStatus::Refunded => {
                return Err(AppError::invalid_state("Payment already refunded"))
            }
            _ => {
                return Err(AppError::invalid_state(
                    "Only successful payments can be refunded",
                ))
            }
        }
        let intent_id = payment.external_payment_id.as_deref().ok_or_else(|| {
            AppError::invalid_state("Payment has no provider reference to refund")
        })?;

        self.gateway.refund(intent_id).await?;
        payment_repo::set_status(&mut *tx, payment.id, PaymentStatus::Refunded).await?;
        order_repo::set_status(&mut *tx, payment.order_id, OrderStatus::Refunded).await?;
        tx.commit().await?;

        info!(payment_id, order_id = payment.order_id, "payment refunded");
        payment_repo::find_payment(&self.pool, payment_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Payment not found.".into()))
    }
}

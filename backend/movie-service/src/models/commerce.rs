use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Cart {
    pub id: i64,
    pub user_id: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct CartItemView {
    pub movie_id: i64,
    pub name: String,
    pub year: i32,
    pub price: Decimal,
    pub added_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CartResponse {
    pub cart_id: i64,
    pub user_id: i64,
    pub items: Vec<CartItemView>,
    pub total_price: Decimal,
}

impl CartResponse {
    pub fn new(cart: &Cart, items: Vec<CartItemView>) -> Self {
        let total_price = items.iter().map(|item| item.price).sum();
        Self {
            cart_id: cart.id,
            user_id: cart.user_id,
            items,
            total_price,
        }
    }
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct AddToCartRequest {
    pub movie_id: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "varchar", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Paid,
    Refunded,
    Canceled,
}

impl OrderStatus {
    pub fn can_cancel(&self) -> bool {
        matches!(self, OrderStatus::Pending)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Order {
    pub id: i64,
    pub user_id: i64,
    pub status: OrderStatus,
    pub total_amount: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct OrderItemView {
    pub id: i64,
    pub order_id: i64,
    pub movie_id: i64,
    pub name: String,
    pub price_at_order: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct OrderResponse {
    pub id: i64,
    pub user_id: i64,
    pub status: OrderStatus,
    pub total_amount: Decimal,
    pub created_at: DateTime<Utc>,
    pub items: Vec<OrderItemView>,
}

impl OrderResponse {
    pub fn new(order: Order, items: Vec<OrderItemView>) -> Self {
        Self {
            id: order.id,
            user_id: order.user_id,
            status: order.status,
            total_amount: order.total_amount,
            created_at: order.created_at,
            items,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "varchar", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Pending,
    Successful,
    Canceled,
    Refunded,
}

impl PaymentStatus {
    pub fn can_cancel(&self) -> bool {
        matches!(self, PaymentStatus::Pending)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct Payment {
    pub id: i64,
    pub user_id: i64,
    pub order_id: i64,
    pub status: PaymentStatus,
    pub amount: Decimal,
    pub external_payment_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct PaymentItemView {
    pub id: i64,
    pub order_item_id: i64,
    pub movie_id: i64,
    pub name: String,
    pub price_at_payment: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PaymentResponse {
    #[serde(flatten)]
    pub payment: Payment,
    pub items: Vec<PaymentItemView>,
}

/// Client-facing view of an order's payment progress
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum PaymentProgress {
    Processing,
    Success,
    Refunded,
    Canceled,
}

impl From<OrderStatus> for PaymentProgress {
    fn from(status: OrderStatus) -> Self {
        match status {
            OrderStatus::Pending => PaymentProgress::Processing,
            OrderStatus::Paid => PaymentProgress::Success,
            OrderStatus::Refunded => PaymentProgress::Refunded,
            OrderStatus::Canceled => PaymentProgress::Canceled,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PaymentProgressResponse {
    pub order_id: i64,
    pub status: PaymentProgress,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PaymentIntentResponse {
    pub payment_id: i64,
    pub external_payment_id: String,
    pub client_secret: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct WebhookAck {
    pub status: String,
}

impl WebhookAck {
    pub fn new(status: &str) -> Self {
        Self {
            status: status.to_string(),
        }
    }
}

/// Admin filters for orders and payments; `status` is matched as text
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
pub struct AdminListFilter {
    pub user_id: Option<i64>,
    pub status: Option<String>,
    pub date_from: Option<DateTime<Utc>>,
    pub date_to: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RecountResponse {
    pub movies_updated: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_pending_orders_and_payments_cancel() {
        assert!(OrderStatus::Pending.can_cancel());
        assert!(!OrderStatus::Paid.can_cancel());
        assert!(!OrderStatus::Refunded.can_cancel());
        assert!(PaymentStatus::Pending.can_cancel());
        assert!(!PaymentStatus::Successful.can_cancel());
    }

    #[test]
    fn order_status_maps_to_progress() {
        assert_eq!(PaymentProgress::from(OrderStatus::Pending), PaymentProgress::Processing);
        assert_eq!(PaymentProgress::from(OrderStatus::Paid), PaymentProgress::Success);
        assert_eq!(
            serde_json::to_string(&PaymentProgress::Processing).unwrap(),
            "\"processing\""
        );
    }

    #[test]
    fn cart_total_sums_prices() {
        let cart = Cart {
            id: 1,
            user_id: 2,
            created_at: Utc::now(),
        };
        let item = |price: &str| CartItemView {
            movie_id: 1,
            name: "m".into(),
            year: 2000,
            price: price.parse().unwrap(),
            added_at: Utc::now(),
        };
        let response = CartResponse::new(&cart, vec![item("9.99"), item("0.01")]);
        assert_eq!(response.total_price, "10.00".parse::<Decimal>().unwrap());
    }
}

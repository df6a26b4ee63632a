/// Payment intents, provider webhooks and the customer's payments
use super::payment_gateway::{to_minor_units, verify_webhook_signature, WEBHOOK_TOLERANCE_SECS};
use super::PaymentGateway;
use crate::db::{cart_repo, order_repo, payment_repo, user_repo};
use crate::error::{AppError, Result};
use crate::jobs::{Task, TaskDispatcher};
use crate::middleware::AuthUser;
use crate::models::{
    OrderStatus, Payment, PaymentIntentResponse, PaymentResponse, PaymentStatus, Role, WebhookAck,
};
use serde::Deserialize;
use sqlx::PgPool;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Debug, Deserialize)]
struct WebhookEvent {
    #[serde(rename = "type")]
    kind: String,
    data: WebhookData,
}

#[derive(Debug, Deserialize)]
struct WebhookData {
    object: IntentObject,
}

#[derive(Debug, Deserialize)]
struct IntentObject {
    id: String,
    #[serde(default)]
    metadata: HashMap<String, String>,
}

fn payment_not_found() -> AppError {
    AppError::NotFound("Payment not found.".into())
}

#[derive(Clone)]
pub struct PaymentService {
    pool: PgPool,
    gateway: Arc<dyn PaymentGateway>,
    tasks: TaskDispatcher,
    webhook_secret: String,
    currency: String,
}

impl PaymentService {
    pub fn new(
        pool: PgPool,
        gateway: Arc<dyn PaymentGateway>,
        tasks: TaskDispatcher,
        webhook_secret: &str,
        currency: &str,
    ) -> Self {
        Self {
            pool,
            gateway,
            tasks,
            webhook_secret: webhook_secret.to_string(),
            currency: currency.to_string(),
        }
    }

    /// Open a provider intent for a pending order.
    ///
    /// The provider call runs between two short transactions so the order row
    /// is never locked across the network round trip.
    pub async fn create_intent(&self, user_id: i64, order_id: i64) -> Result<PaymentIntentResponse> {
        let not_payable = || AppError::NotFound("Order not found or not payable.".into());

        let mut tx = self.pool.begin().await?;
        let order = order_repo::lock_order(&mut tx, order_id)
            .await?
            .filter(|order| order.user_id == user_id && order.status == OrderStatus::Pending)
            .ok_or_else(not_payable)?;

        let items_total = order_repo::items_total(&mut *tx, order.id).await?;
        if items_total != order.total_amount {
            return Err(AppError::BadRequest("Order total mismatch.".into()));
        }

        let payment = match payment_repo::find_pending_for_order(&mut *tx, order.id).await? {
            Some(payment) => payment,
            None => {
                payment_repo::create_pending(&mut tx, user_id, order.id, order.total_amount)
                    .await?
            }
        };
        tx.commit().await?;

        let amount_minor = to_minor_units(order.total_amount)?;
        let metadata = [
            ("order_id", order.id.to_string()),
            ("user_id", user_id.to_string()),
        ];
        let intent = self
            .gateway
            .create_intent(amount_minor, &self.currency, &metadata)
            .await?;

        let mut tx = self.pool.begin().await?;
        let still_pending = order_repo::lock_order(&mut tx, order.id)
            .await?
            .is_some_and(|order| order.status == OrderStatus::Pending);
        let payment_open = still_pending
            && payment_repo::lock_payment(&mut tx, payment.id)
                .await?
                .is_some_and(|p| p.status == PaymentStatus::Pending);
        if !payment_open {
            drop(tx);
            warn!(order_id, intent_id = %intent.id, "order closed while the intent was created");
            if let Err(e) = self.gateway.cancel_intent(&intent.id).await {
                warn!(order_id, intent_id = %intent.id, error = %e, "provider cancel failed");
            }
            return Err(not_payable());
        }
        payment_repo::set_external_id(&mut *tx, payment.id, &intent.id).await?;
        tx.commit().await?;

        info!(order_id, payment_id = payment.id, intent_id = %intent.id, "payment intent created");
        Ok(PaymentIntentResponse {
            payment_id: payment.id,
            external_payment_id: intent.id,
            client_secret: intent.client_secret,
        })
    }

    /// Verify and apply a provider event
    pub async fn handle_webhook(&self, payload: &[u8], signature: Option<&str>) -> Result<WebhookAck> {
        let signature =
            signature.ok_or_else(|| AppError::BadRequest("Invalid signature".into()))?;
        verify_webhook_signature(
            payload,
            signature,
            &self.webhook_secret,
            chrono::Utc::now().timestamp(),
            WEBHOOK_TOLERANCE_SECS,
        )
        .map_err(|e| {
            warn!(error = %e, "rejected webhook signature");
            AppError::BadRequest("Invalid signature".into())
        })?;

        let event: WebhookEvent = serde_json::from_slice(payload)
            .map_err(|_| AppError::BadRequest("Invalid payload".into()))?;

        match event.kind.as_str() {
            "payment_intent.succeeded" => self.apply_success(&event.data.object).await,
            "payment_intent.payment_failed" | "payment_intent.canceled" => {
                self.apply_failure(&event.data.object).await
            }
            other => {
                info!(event = other, "ignoring webhook event");
                Ok(WebhookAck::new("ignored"))
            }
        }
    }

    async fn lock_for_intent(
        &self,
        conn: &mut sqlx::PgConnection,
        intent: &IntentObject,
    ) -> Result<Option<Payment>> {
        if let Some(payment) = payment_repo::lock_by_external_id(&mut *conn, &intent.id).await? {
            return Ok(Some(payment));
        }
        let order_id = intent
            .metadata
            .get("order_id")
            .and_then(|value| value.parse::<i64>().ok());
        match order_id {
            Some(order_id) => Ok(payment_repo::lock_latest_for_order(conn, order_id).await?),
            None => Ok(None),
        }
    }

    async fn apply_success(&self, intent: &IntentObject) -> Result<WebhookAck> {
        let mut tx = self.pool.begin().await?;
        let payment = self
            .lock_for_intent(&mut tx, intent)
            .await?
            .ok_or_else(payment_not_found)?;

        match payment.status {
            PaymentStatus::Successful => return Ok(WebhookAck::new("already_processed")),
            PaymentStatus::Pending => {}
            status => {
                warn!(payment_id = payment.id, ?status, "success event for a closed payment");
                return Ok(WebhookAck::new("ignored"));
            }
        }

        if payment.external_payment_id.as_deref() != Some(intent.id.as_str()) {
            payment_repo::set_external_id(&mut *tx, payment.id, &intent.id).await?;
        }
        payment_repo::set_status(&mut *tx, payment.id, PaymentStatus::Successful).await?;
        order_repo::set_status(&mut *tx, payment.order_id, OrderStatus::Paid).await?;
        let movie_ids = payment_repo::movie_ids(&mut *tx, payment.id).await?;
        cart_repo::remove_movies_for_user(&mut *tx, payment.user_id, &movie_ids).await?;
        tx.commit().await?;

        info!(
            payment_id = payment.id,
            order_id = payment.order_id,
            "payment confirmed"
        );

        if let Some(buyer) = user_repo::find_by_id(&self.pool, payment.user_id).await? {
            let movies = payment_repo::list_items(&self.pool, payment.id)
                .await?
                .into_iter()
                .map(|item| item.name)
                .collect();
            self.tasks
                .dispatch(Task::SendPaymentSuccessEmail {
                    email: buyer.email,
                    order_id: payment.order_id,
                    amount: payment.amount.to_string(),
                    movies,
                })
                .await;
        }

        Ok(WebhookAck::new("ok"))
    }

    async fn apply_failure(&self, intent: &IntentObject) -> Result<WebhookAck> {
        let mut tx = self.pool.begin().await?;
        let Some(payment) = self.lock_for_intent(&mut tx, intent).await? else {
            return Ok(WebhookAck::new("ignored"));
        };
        if payment.status == PaymentStatus::Pending {
            payment_repo::set_status(&mut *tx, payment.id, PaymentStatus::Canceled).await?;
            info!(payment_id = payment.id, "payment canceled by provider event");
        }
        tx.commit().await?;
        Ok(WebhookAck::new("ok"))
    }

    pub async fn list(&self, user_id: i64) -> Result<Vec<Payment>> {
        Ok(payment_repo::list_for_user(&self.pool, user_id).await?)
    }

    /// Owner or admin only; anyone else sees 404
    pub async fn get(&self, viewer: &AuthUser, payment_id: i64) -> Result<PaymentResponse> {
        let payment = payment_repo::find_payment(&self.pool, payment_id)
            .await?
            .filter(|p| p.user_id == viewer.id || viewer.role == Role::Admin)
            .ok_or_else(payment_not_found)?;
        let items = payment_repo::list_items(&self.pool, payment.id).await?;
        Ok(PaymentResponse { payment, items })
    }

    pub async fn cancel(&self, user_id: i64, payment_id: i64) -> Result<Payment> {
        let mut tx = self.pool.begin().await?;
        let payment = payment_repo::lock_payment(&mut tx, payment_id)
            .await?
            .filter(|p| p.user_id == user_id)
            .ok_or_else(payment_not_found)?;
        if !payment.status.can_cancel() {
            return Err(AppError::invalid_state(
                "Only pending payments can be canceled.",
            ));
        }

        if let Some(intent_id) = &payment.external_payment_id {
            self.gateway.cancel_intent(intent_id).await?;
        }
        payment_repo::set_status(&mut *tx, payment.id, PaymentStatus::Canceled).await?;
        tx.commit().await?;

        info!(user_id, payment_id, "payment canceled");
        payment_repo::find_payment(&self.pool, payment_id)
            .await?
            .ok_or_else(payment_not_found)
    }
}

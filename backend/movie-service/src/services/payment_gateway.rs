use async_trait::async_trait;
use hmac::{Hmac, Mac};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::Deserialize;
use sha2::Sha256;
use std::time::Duration;
use tracing::{error, info};

/// Webhook signatures older than this are rejected
pub const WEBHOOK_TOLERANCE_SECS: i64 = 300;

#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("request to payment provider failed: {0}")]
    Transport(String),
    #[error("payment provider rejected the request: {0}")]
    Rejected(String),
    #[error("invalid amount: {0}")]
    InvalidAmount(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PaymentIntent {
    pub id: String,
    pub client_secret: String,
}

/// External payment provider
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn create_intent(
        &self,
        amount_minor: i64,
        currency: &str,
        metadata: &[(&str, String)],
    ) -> Result<PaymentIntent, GatewayError>;

    async fn cancel_intent(&self, intent_id: &str) -> Result<(), GatewayError>;

    async fn refund(&self, intent_id: &str) -> Result<(), GatewayError>;
}

/// `12.34` -> `1234`
pub fn to_minor_units(amount: Decimal) -> Result<i64, GatewayError> {
    (amount * Decimal::ONE_HUNDRED)
        .round()
        .to_i64()
        .ok_or_else(|| GatewayError::InvalidAmount(amount.to_string()))
}

/// Stripe over its form-encoded REST API
pub struct StripeGateway {
    client: reqwest::Client,
    api_base: String,
    secret_key: String,
}

impl StripeGateway {
    pub fn new(api_base: &str, secret_key: &str) -> Result<Self, GatewayError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(15))
            .build()
            .map_err(|e| GatewayError::Transport(e.to_string()))?;
        Ok(Self {
            client,
            api_base: api_base.trim_end_matches('/').to_string(),
            secret_key: secret_key.to_string(),
        })
    }

    async fn post_form<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        form: &[(String, String)],
    ) -> Result<T, GatewayError> {
        let response = self
            .client
            .post(format!("{}{}", self.api_base, path))
            .bearer_auth(&self.secret_key)
            .form(form)
            .send()
            .await
            .map_err(|e| GatewayError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!(path, status = status.as_u16(), body = %body, "payment provider error");
            return Err(GatewayError::Rejected(format!("HTTP {}", status.as_u16())));
        }
        response
            .json::<T>()
            .await
            .map_err(|e| GatewayError::Transport(e.to_string()))
    }
}

#[derive(Deserialize)]
struct Ignored {}

#[async_trait]
impl PaymentGateway for StripeGateway {
    async fn create_intent(
        &self,
        amount_minor: i64,
        currency: &str,
        metadata: &[(&str, String)],
    ) -> Result<PaymentIntent, GatewayError> {
        let mut form = vec![
            ("amount".to_string(), amount_minor.to_string()),
            ("currency".to_string(), currency.to_string()),
            ("automatic_payment_methods[enabled]".to_string(), "true".to_string()),
        ];
        for (key, value) in metadata {
            form.push((format!("metadata[{key}]"), value.clone()));
        }
        let intent: PaymentIntent = self.post_form("/v1/payment_intents", &form).await?;
        info!(intent_id = %intent.id, amount_minor, "payment intent created");
        Ok(intent)
    }

    async fn cancel_intent(&self, intent_id: &str) -> Result<(), GatewayError> {
        let path = format!("/v1/payment_intents/{}/cancel", urlencoding::encode(intent_id));
        self.post_form::<Ignored>(&path, &[]).await?;
        Ok(())
    }

    async fn refund(&self, intent_id: &str) -> Result<(), GatewayError> {
        let form = [("payment_intent".to_string(), intent_id.to_string())];
        self.post_form::<Ignored>("/v1/refunds", &form).await?;
        Ok(())
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum SignatureError {
    #[error("missing or malformed signature header")]
    Malformed,
    #[error("signature timestamp outside tolerance")]
    Stale,
    #[error("signature mismatch")]
    Mismatch,
}

/// Verify a `t=<unix>,v1=<hex>` header: HMAC-SHA256 over `"{t}.{body}"`.
///
/// Any one of several `v1` entries may match.
pub fn verify_webhook_signature(
    payload: &[u8],
    header: &str,
    secret: &str,
    now_unix: i64,
    tolerance_secs: i64,
) -> Result<(), SignatureError> {
    let mut timestamp: Option<i64> = None;
    let mut signatures: Vec<Vec<u8>> = Vec::new();
    for part in header.split(',') {
        let Some((key, value)) = part.trim().split_once('=') else {
            continue;
        };
        match key {
            "t" => timestamp = value.parse().ok(),
            "v1" => {
                if let Ok(bytes) = hex::decode(value) {
                    signatures.push(bytes);
                }
            }
            _ => {}
        }
    }

    let timestamp = timestamp.ok_or(SignatureError::Malformed)?;
    if signatures.is_empty() {
        return Err(SignatureError::Malformed);
    }
    if (now_unix - timestamp).abs() > tolerance_secs {
        return Err(SignatureError::Stale);
    }

    for signature in &signatures {
        let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes())
            .map_err(|_| SignatureError::Malformed)?;
        mac.update(timestamp.to_string().as_bytes());
        mac.update(b".");
        mac.update(payload);
        if mac.verify_slice(signature).is_ok() {
            return Ok(());
        }
    }
    Err(SignatureError::Mismatch)
}

/// Build a valid signature header; used by tests and local tooling
pub fn sign_webhook_payload(payload: &[u8], secret: &str, timestamp: i64) -> String {
    let mut mac = match Hmac::<Sha256>::new_from_slice(secret.as_bytes()) {
        Ok(mac) => mac,
        Err(_) => return format!("t={timestamp}"),
    };
    mac.update(timestamp.to_string().as_bytes());
    mac.update(b".");
    mac.update(payload);
    format!("t={timestamp},v1={}", hex::encode(mac.finalize().into_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    const SECRET: &str = "whsec_test";

    #[test]
    fn minor_units_round_half_away() {
        assert_eq!(to_minor_units(Decimal::from_str("12.34").unwrap()).unwrap(), 1234);
        assert_eq!(to_minor_units(Decimal::from_str("0").unwrap()).unwrap(), 0);
        assert_eq!(to_minor_units(Decimal::from_str("9.99").unwrap()).unwrap(), 999);
    }

    #[test]
    fn valid_signature_verifies() {
        let body = br#"{"type":"payment_intent.succeeded"}"#;
        let header = sign_webhook_payload(body, SECRET, 1_700_000_000);
        assert_eq!(
            verify_webhook_signature(body, &header, SECRET, 1_700_000_100, WEBHOOK_TOLERANCE_SECS),
            Ok(())
        );
    }

    #[test]
    fn tampered_body_is_rejected() {
        let header = sign_webhook_payload(b"original", SECRET, 1_700_000_000);
        assert_eq!(
            verify_webhook_signature(b"tampered", &header, SECRET, 1_700_000_000, 300),
            Err(SignatureError::Mismatch)
        );
    }

    #[test]
    fn stale_timestamp_is_rejected() {
        let header = sign_webhook_payload(b"x", SECRET, 1_700_000_000);
        assert_eq!(
            verify_webhook_signature(b"x", &header, SECRET, 1_700_000_301, 300),
            Err(SignatureError::Stale)
        );
    }

    #[test]
    fn malformed_header_is_rejected() {
        assert_eq!(
            verify_webhook_signature(b"x", "garbage", SECRET, 0, 300),
            Err(SignatureError::Malformed)
        );
        assert_eq!(
            verify_webhook_signature(b"x", "t=1,v1=zz", SECRET, 1, 300),
            Err(SignatureError::Malformed)
        );
    }
}

/// Payment handlers - intents, provider webhook and payment history
use crate::error::Result;
use crate::middleware::AuthUser;
use crate::services::PaymentService;
use actix_web::{web, HttpRequest, HttpResponse};

pub async fn create_intent(
    service: web::Data<PaymentService>,
    user: AuthUser,
    path: web::Path<i64>,
) -> Result<HttpResponse> {
    let intent = service.create_intent(user.id, path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(intent))
}

/// Raw body is required for signature verification
pub async fn webhook(
    service: web::Data<PaymentService>,
    req: HttpRequest,
    body: web::Bytes,
) -> Result<HttpResponse> {
    let signature = req
        .headers()
        .get("Stripe-Signature")
        .and_then(|value| value.to_str().ok());
    let ack = service.handle_webhook(&body, signature).await?;
    Ok(HttpResponse::Ok().json(ack))
}

pub async fn list_payments(
    service: web::Data<PaymentService>,
    user: AuthUser,
) -> Result<HttpResponse> {
    Ok(HttpResponse::Ok().json(service.list(user.id).await?))
}

pub async fn get_payment(
    service: web::Data<PaymentService>,
    user: AuthUser,
    path: web::Path<i64>,
) -> Result<HttpResponse> {
    let payment = service.get(&user, path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(payment))
}

pub async fn cancel_payment(
    service: web::Data<PaymentService>,
    user: AuthUser,
    path: web::Path<i64>,
) -> Result<HttpResponse> {
    let payment = service.cancel(user.id, path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(payment))
}

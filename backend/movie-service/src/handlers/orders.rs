/// Order handlers - checkout, history, cancellation and payment status
use crate::error::Result;
use crate::middleware::AuthUser;
use crate::services::OrderService;
use actix_web::{web, HttpResponse};

pub async fn checkout(service: web::Data<OrderService>, user: AuthUser) -> Result<HttpResponse> {
    let order = service.checkout(user.id).await?;
    Ok(HttpResponse::Created().json(order))
}

pub async fn list_orders(service: web::Data<OrderService>, user: AuthUser) -> Result<HttpResponse> {
    Ok(HttpResponse::Ok().json(service.list(user.id).await?))
}

pub async fn get_order(
    service: web::Data<OrderService>,
    user: AuthUser,
    path: web::Path<i64>,
) -> Result<HttpResponse> {
    let order = service.get(user.id, path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(order))
}

pub async fn cancel_order(
    service: web::Data<OrderService>,
    user: AuthUser,
    path: web::Path<i64>,
) -> Result<HttpResponse> {
    let order = service.cancel(user.id, path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(order))
}

pub async fn payment_status(
    service: web::Data<OrderService>,
    user: AuthUser,
    path: web::Path<i64>,
) -> Result<HttpResponse> {
    let status = service.payment_status(user.id, path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(status))
}

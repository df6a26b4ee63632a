/// Admin handlers
use crate::error::Result;
use crate::middleware::Admin;
use crate::models::{AdminListFilter, ChangeGroupRequest, SetActivationRequest};
use crate::services::AdminService;
use actix_web::{web, HttpResponse};

pub async fn change_group(
    service: web::Data<AdminService>,
    _admin: Admin,
    path: web::Path<i64>,
    req: web::Json<ChangeGroupRequest>,
) -> Result<HttpResponse> {
    let user = service.change_group(path.into_inner(), &req.group).await?;
    Ok(HttpResponse::Ok().json(user))
}

pub async fn set_activation(
    service: web::Data<AdminService>,
    _admin: Admin,
    path: web::Path<i64>,
    req: web::Json<SetActivationRequest>,
) -> Result<HttpResponse> {
    let user = service
        .set_activation(path.into_inner(), req.is_active)
        .await?;
    Ok(HttpResponse::Ok().json(user))
}

pub async fn recount_counters(
    service: web::Data<AdminService>,
    _admin: Admin,
) -> Result<HttpResponse> {
    Ok(HttpResponse::Ok().json(service.recount_counters().await?))
}

pub async fn list_carts(service: web::Data<AdminService>, _admin: Admin) -> Result<HttpResponse> {
    Ok(HttpResponse::Ok().json(service.list_carts().await?))
}

pub async fn user_cart(
    service: web::Data<AdminService>,
    _admin: Admin,
    path: web::Path<i64>,
) -> Result<HttpResponse> {
    Ok(HttpResponse::Ok().json(service.user_cart(path.into_inner()).await?))
}

pub async fn list_orders(
    service: web::Data<AdminService>,
    _admin: Admin,
    filter: web::Query<AdminListFilter>,
) -> Result<HttpResponse> {
    Ok(HttpResponse::Ok().json(service.orders(&filter).await?))
}

pub async fn list_payments(
    service: web::Data<AdminService>,
    _admin: Admin,
    filter: web::Query<AdminListFilter>,
) -> Result<HttpResponse> {
    Ok(HttpResponse::Ok().json(service.payments(&filter).await?))
}

pub async fn refund_payment(
    service: web::Data<AdminService>,
    Admin(user): Admin,
    path: web::Path<i64>,
) -> Result<HttpResponse> {
    let payment_id = path.into_inner();
    let payment = service.refund(payment_id).await?;
    tracing::info!(admin_id = user.id, payment_id, "admin issued refund");
    Ok(HttpResponse::Ok().json(payment))
}

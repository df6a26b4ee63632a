/// Cart handlers
use crate::error::Result;
use crate::middleware::AuthUser;
use crate::models::AddToCartRequest;
use crate::services::CartService;
use actix_web::{web, HttpResponse};
use sqlx::PgPool;

pub async fn get_cart(pool: web::Data<PgPool>, user: AuthUser) -> Result<HttpResponse> {
    let service = CartService::new((**pool).clone());
    Ok(HttpResponse::Ok().json(service.get(user.id).await?))
}

pub async fn add_item(
    pool: web::Data<PgPool>,
    user: AuthUser,
    req: web::Json<AddToCartRequest>,
) -> Result<HttpResponse> {
    let service = CartService::new((**pool).clone());
    let cart = service.add(user.id, req.movie_id).await?;
    Ok(HttpResponse::Created().json(cart))
}

pub async fn remove_item(
    pool: web::Data<PgPool>,
    user: AuthUser,
    path: web::Path<i64>,
) -> Result<HttpResponse> {
    let service = CartService::new((**pool).clone());
    service.remove(user.id, path.into_inner()).await?;
    Ok(HttpResponse::NoContent().finish())
}

pub async fn clear_cart(pool: web::Data<PgPool>, user: AuthUser) -> Result<HttpResponse> {
    let service = CartService::new((**pool).clone());
    service.clear(user.id).await?;
    Ok(HttpResponse::NoContent().finish())
}

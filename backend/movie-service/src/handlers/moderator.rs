/// Moderator handlers - user lookup and movie management
use crate::error::Result;
use crate::middleware::Moderator;
use crate::models::{MovieCreateRequest, MovieUpdateRequest, UserListQuery};
use crate::services::ModerationService;
use actix_web::{web, HttpResponse};
use sqlx::PgPool;
use tracing::info;

pub async fn list_users(
    pool: web::Data<PgPool>,
    _moderator: Moderator,
    query: web::Query<UserListQuery>,
) -> Result<HttpResponse> {
    let service = ModerationService::new((**pool).clone());
    Ok(HttpResponse::Ok().json(service.list_users(&query).await?))
}

pub async fn get_user(
    pool: web::Data<PgPool>,
    _moderator: Moderator,
    path: web::Path<i64>,
) -> Result<HttpResponse> {
    let service = ModerationService::new((**pool).clone());
    Ok(HttpResponse::Ok().json(service.get_user(path.into_inner()).await?))
}

pub async fn create_movie(
    pool: web::Data<PgPool>,
    Moderator(user): Moderator,
    req: web::Json<MovieCreateRequest>,
) -> Result<HttpResponse> {
    let service = ModerationService::new((**pool).clone());
    let movie = service.create_movie(req.into_inner()).await?;
    info!(moderator_id = user.id, movie_id = movie.id, "moderator created movie");
    Ok(HttpResponse::Created().json(movie))
}

pub async fn update_movie(
    pool: web::Data<PgPool>,
    Moderator(user): Moderator,
    path: web::Path<i64>,
    req: web::Json<MovieUpdateRequest>,
) -> Result<HttpResponse> {
    let movie_id = path.into_inner();
    let service = ModerationService::new((**pool).clone());
    let message = service.update_movie(movie_id, req.into_inner()).await?;
    info!(moderator_id = user.id, movie_id, "moderator updated movie");
    Ok(HttpResponse::Ok().json(message))
}

pub async fn delete_movie(
    pool: web::Data<PgPool>,
    Moderator(user): Moderator,
    path: web::Path<i64>,
) -> Result<HttpResponse> {
    let movie_id = path.into_inner();
    let service = ModerationService::new((**pool).clone());
    service.delete_movie(movie_id).await?;
    info!(moderator_id = user.id, movie_id, "moderator deleted movie");
    Ok(HttpResponse::NoContent().finish())
}

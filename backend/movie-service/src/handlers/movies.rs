/// Catalog handlers - movie lists, detail, genres, ratings, reactions and favorites
use crate::error::Result;
use crate::middleware::AuthUser;
use crate::models::{MovieListQuery, MovieScope, RatingRequest, Reaction};
use crate::services::{CatalogService, RatingService, ReactionService};
use actix_web::{web, HttpResponse};
use sqlx::PgPool;

pub async fn list_movies(
    pool: web::Data<PgPool>,
    query: web::Query<MovieListQuery>,
) -> Result<HttpResponse> {
    let service = CatalogService::new((**pool).clone());
    let page = service
        .list(&query, MovieScope::All, "/api/v1/movies", false)
        .await?;
    Ok(HttpResponse::Ok().json(page))
}

pub async fn get_movie(pool: web::Data<PgPool>, path: web::Path<i64>) -> Result<HttpResponse> {
    let service = CatalogService::new((**pool).clone());
    let movie = service.detail(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(movie))
}

pub async fn list_genres(pool: web::Data<PgPool>) -> Result<HttpResponse> {
    let service = CatalogService::new((**pool).clone());
    Ok(HttpResponse::Ok().json(service.genres().await?))
}

pub async fn genre_movies(
    pool: web::Data<PgPool>,
    path: web::Path<i32>,
    query: web::Query<MovieListQuery>,
) -> Result<HttpResponse> {
    let service = CatalogService::new((**pool).clone());
    let page = service.genre_movies(path.into_inner(), &query).await?;
    Ok(HttpResponse::Ok().json(page))
}

pub async fn list_favorites(
    pool: web::Data<PgPool>,
    user: AuthUser,
    query: web::Query<MovieListQuery>,
) -> Result<HttpResponse> {
    let service = CatalogService::new((**pool).clone());
    let page = service
        .list(
            &query,
            MovieScope::FavoritesOf(user.id),
            "/api/v1/movies/favorites",
            true,
        )
        .await?;
    Ok(HttpResponse::Ok().json(page))
}

pub async fn rate_movie(
    pool: web::Data<PgPool>,
    user: AuthUser,
    path: web::Path<i64>,
    req: web::Json<RatingRequest>,
) -> Result<HttpResponse> {
    let service = RatingService::new((**pool).clone());
    let summary = service
        .rate(user.id, path.into_inner(), req.into_inner())
        .await?;
    Ok(HttpResponse::Created().json(summary))
}

pub async fn get_rating(
    pool: web::Data<PgPool>,
    user: AuthUser,
    path: web::Path<i64>,
) -> Result<HttpResponse> {
    let service = RatingService::new((**pool).clone());
    let rating = service.get(user.id, path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(rating))
}

pub async fn delete_rating(
    pool: web::Data<PgPool>,
    user: AuthUser,
    path: web::Path<i64>,
) -> Result<HttpResponse> {
    let service = RatingService::new((**pool).clone());
    service.remove(user.id, path.into_inner()).await?;
    Ok(HttpResponse::NoContent().finish())
}

pub async fn like_movie(
    pool: web::Data<PgPool>,
    user: AuthUser,
    path: web::Path<i64>,
) -> Result<HttpResponse> {
    let service = ReactionService::new((**pool).clone());
    let reaction = service
        .toggle_reaction(user.id, path.into_inner(), Reaction::Like)
        .await?;
    Ok(HttpResponse::Ok().json(reaction))
}

pub async fn dislike_movie(
    pool: web::Data<PgPool>,
    user: AuthUser,
    path: web::Path<i64>,
) -> Result<HttpResponse> {
    let service = ReactionService::new((**pool).clone());
    let reaction = service
        .toggle_reaction(user.id, path.into_inner(), Reaction::Dislike)
        .await?;
    Ok(HttpResponse::Ok().json(reaction))
}

pub async fn toggle_favorite(
    pool: web::Data<PgPool>,
    user: AuthUser,
    path: web::Path<i64>,
) -> Result<HttpResponse> {
    let service = ReactionService::new((**pool).clone());
    let favorite = service.toggle_favorite(user.id, path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(favorite))
}

pub async fn remove_favorite(
    pool: web::Data<PgPool>,
    user: AuthUser,
    path: web::Path<i64>,
) -> Result<HttpResponse> {
    let service = ReactionService::new((**pool).clone());
    service.remove_favorite(user.id, path.into_inner()).await?;
    Ok(HttpResponse::NoContent().finish())
}

/// Comment handlers - threads, likes and notifications
use crate::error::Result;
use crate::middleware::AuthUser;
use crate::models::{CommentListQuery, CreateCommentRequest, NotificationQuery, UpdateCommentRequest};
use crate::services::CommentService;
use actix_web::{web, HttpResponse};

pub async fn create_comment(
    service: web::Data<CommentService>,
    user: AuthUser,
    path: web::Path<i64>,
    req: web::Json<CreateCommentRequest>,
) -> Result<HttpResponse> {
    let comment = service
        .create(&user, path.into_inner(), req.into_inner())
        .await?;
    Ok(HttpResponse::Created().json(comment))
}

pub async fn list_comments(
    service: web::Data<CommentService>,
    user: AuthUser,
    path: web::Path<i64>,
    query: web::Query<CommentListQuery>,
) -> Result<HttpResponse> {
    let comments = service.list(user.id, path.into_inner(), &query).await?;
    Ok(HttpResponse::Ok().json(comments))
}

pub async fn get_comment(
    service: web::Data<CommentService>,
    user: AuthUser,
    path: web::Path<(i64, i64)>,
) -> Result<HttpResponse> {
    let (movie_id, comment_id) = path.into_inner();
    let comment = service.get(user.id, movie_id, comment_id).await?;
    Ok(HttpResponse::Ok().json(comment))
}

pub async fn update_comment(
    service: web::Data<CommentService>,
    user: AuthUser,
    path: web::Path<(i64, i64)>,
    req: web::Json<UpdateCommentRequest>,
) -> Result<HttpResponse> {
    let (movie_id, comment_id) = path.into_inner();
    let comment = service
        .update(&user, movie_id, comment_id, req.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(comment))
}

pub async fn delete_comment(
    service: web::Data<CommentService>,
    user: AuthUser,
    path: web::Path<(i64, i64)>,
) -> Result<HttpResponse> {
    let (movie_id, comment_id) = path.into_inner();
    service.delete(&user, movie_id, comment_id).await?;
    Ok(HttpResponse::NoContent().finish())
}

pub async fn like_comment(
    service: web::Data<CommentService>,
    user: AuthUser,
    path: web::Path<i64>,
) -> Result<HttpResponse> {
    service.like(&user, path.into_inner()).await?;
    Ok(HttpResponse::Created().json(serde_json::json!({"liked": true})))
}

pub async fn unlike_comment(
    service: web::Data<CommentService>,
    user: AuthUser,
    path: web::Path<i64>,
) -> Result<HttpResponse> {
    service.unlike(&user, path.into_inner()).await?;
    Ok(HttpResponse::NoContent().finish())
}

pub async fn list_notifications(
    service: web::Data<CommentService>,
    user: AuthUser,
    query: web::Query<NotificationQuery>,
) -> Result<HttpResponse> {
    let notifications = service.notifications(user.id, query.unread_only).await?;
    Ok(HttpResponse::Ok().json(notifications))
}

pub async fn mark_notification_read(
    service: web::Data<CommentService>,
    user: AuthUser,
    path: web::Path<i64>,
) -> Result<HttpResponse> {
    let notification = service
        .mark_notification_read(user.id, path.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(notification))
}

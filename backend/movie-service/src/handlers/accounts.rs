/// Account handlers - registration, activation, tokens and passwords
use crate::error::Result;
use crate::middleware::AuthUser;
use crate::models::{
    ActivationRequest, ChangePasswordRequest, EmailRequest, LoginRequest,
    PasswordResetCompleteRequest, RefreshRequest, RegisterRequest,
};
use crate::services::AccountService;
use actix_web::{web, HttpResponse};

pub async fn register(
    service: web::Data<AccountService>,
    req: web::Json<RegisterRequest>,
) -> Result<HttpResponse> {
    let user = service.register(req.into_inner()).await?;
    Ok(HttpResponse::Created().json(user))
}

pub async fn activate(
    service: web::Data<AccountService>,
    req: web::Json<ActivationRequest>,
) -> Result<HttpResponse> {
    let message = service.activate(req.into_inner()).await?;
    Ok(HttpResponse::Ok().json(message))
}

/// Same as [`activate`], reached from the emailed link
pub async fn activate_link(
    service: web::Data<AccountService>,
    query: web::Query<ActivationRequest>,
) -> Result<HttpResponse> {
    let message = service.activate(query.into_inner()).await?;
    Ok(HttpResponse::Ok().json(message))
}

pub async fn resend_activation(
    service: web::Data<AccountService>,
    req: web::Json<EmailRequest>,
) -> Result<HttpResponse> {
    let message = service.resend_activation(req.into_inner()).await?;
    Ok(HttpResponse::Ok().json(message))
}

pub async fn login(
    service: web::Data<AccountService>,
    req: web::Json<LoginRequest>,
) -> Result<HttpResponse> {
    let tokens = service.login(req.into_inner()).await?;
    Ok(HttpResponse::Ok().json(tokens))
}

pub async fn refresh(
    service: web::Data<AccountService>,
    req: web::Json<RefreshRequest>,
) -> Result<HttpResponse> {
    let token = service.refresh(&req.refresh_token).await?;
    Ok(HttpResponse::Ok().json(token))
}

pub async fn logout(service: web::Data<AccountService>, user: AuthUser) -> Result<HttpResponse> {
    service.logout(&user).await?;
    Ok(HttpResponse::NoContent().finish())
}

pub async fn change_password(
    service: web::Data<AccountService>,
    user: AuthUser,
    req: web::Json<ChangePasswordRequest>,
) -> Result<HttpResponse> {
    let message = service.change_password(&user, req.into_inner()).await?;
    Ok(HttpResponse::Ok().json(message))
}

pub async fn request_password_reset(
    service: web::Data<AccountService>,
    req: web::Json<EmailRequest>,
) -> Result<HttpResponse> {
    let message = service.request_password_reset(req.into_inner()).await?;
    Ok(HttpResponse::Ok().json(message))
}

pub async fn complete_password_reset(
    service: web::Data<AccountService>,
    req: web::Json<PasswordResetCompleteRequest>,
) -> Result<HttpResponse> {
    let message = service.complete_password_reset(req.into_inner()).await?;
    Ok(HttpResponse::Ok().json(message))
}

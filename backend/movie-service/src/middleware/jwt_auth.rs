use crate::db::user_repo;
use crate::error::AppError;
use crate::middleware::permissions::authorize;
use crate::models::Role;
use crate::services::token_revocation::RevocationStore;
use actix_web::dev::{forward_ready, Payload, Service, ServiceRequest, ServiceResponse, Transform};
use actix_web::{Error, FromRequest, HttpMessage, HttpRequest};
use chrono::{DateTime, Utc};
use crypto_core::jwt::JwtKeys;
use futures::future::{ready, LocalBoxFuture, Ready};
use sqlx::PgPool;
use std::rc::Rc;
use std::sync::Arc;
use tracing::{debug, warn};

/// Authenticated principal attached to the request by [`JwtAuthMiddleware`]
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: i64,
    pub email: String,
    pub role: Role,
    /// Raw bearer token, kept for logout
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// Authenticates requests that carry `Authorization: Bearer ...`.
///
/// Requests without the header pass through untouched; the [`AuthUser`]
/// extractor rejects them on protected routes. A presented token is checked
/// against the revocation store first, then verified, then its user is
/// re-read so role changes apply immediately.
#[derive(Clone)]
pub struct JwtAuthMiddleware {
    pool: PgPool,
    keys: Arc<JwtKeys>,
    revocations: Arc<dyn RevocationStore>,
}

impl JwtAuthMiddleware {
    pub fn new(pool: PgPool, keys: Arc<JwtKeys>, revocations: Arc<dyn RevocationStore>) -> Self {
        Self {
            pool,
            keys,
            revocations,
        }
    }
}

impl<S, B> Transform<S, ServiceRequest> for JwtAuthMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = JwtAuthMiddlewareService<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(JwtAuthMiddlewareService {
            service: Rc::new(service),
            auth: self.clone(),
        }))
    }
}

pub struct JwtAuthMiddlewareService<S> {
    service: Rc<S>,
    auth: JwtAuthMiddleware,
}

impl<S, B> Service<ServiceRequest> for JwtAuthMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = self.service.clone();
        let auth = self.auth.clone();

        Box::pin(async move {
            let header = req
                .headers()
                .get("Authorization")
                .and_then(|h| h.to_str().ok())
                .map(str::to_string);

            if let Some(header) = header {
                let user = authenticate(&auth, &header).await?;
                debug!(user_id = user.id, role = user.role.as_str(), "request authenticated");
                req.extensions_mut().insert(user);
            }

            service.call(req).await
        })
    }
}

async fn authenticate(auth: &JwtAuthMiddleware, header: &str) -> Result<AuthUser, AppError> {
    let token = header
        .strip_prefix("Bearer ")
        .or_else(|| header.strip_prefix("bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| AppError::Unauthorized("Invalid Authorization header format.".into()))?;

    // Fails closed: a cache error surfaces as 500 rather than admitting the token
    if auth.revocations.is_revoked(token).await? {
        return Err(AppError::Unauthorized("Token has been revoked.".into()));
    }

    let claims = auth.keys.validate_access_token(token).map_err(|e| {
        warn!(error = %e, "access token rejected");
        AppError::Unauthorized("Invalid or expired token.".into())
    })?;
    let user_id = claims
        .user_id()
        .map_err(|_| AppError::Unauthorized("Invalid or expired token.".into()))?;

    let user = user_repo::find_by_id(&auth.pool, user_id)
        .await?
        .ok_or_else(|| AppError::Unauthorized("User not found.".into()))?;
    if !user.is_active {
        return Err(AppError::Unauthorized("User account is not active.".into()));
    }

    Ok(AuthUser {
        id: user.id,
        email: user.email,
        role: user.role,
        token: token.to_string(),
        expires_at: claims.expires_at(),
    })
}

fn current_user(req: &HttpRequest) -> Result<AuthUser, AppError> {
    req.extensions().get::<AuthUser>().cloned().ok_or_else(|| {
        AppError::Unauthorized("Authentication credentials were not provided.".into())
    })
}

impl FromRequest for AuthUser {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(current_user(req).map_err(Error::from))
    }
}

/// Moderator or admin
#[derive(Debug, Clone)]
pub struct Moderator(pub AuthUser);

impl FromRequest for Moderator {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let result = current_user(req).and_then(|user| {
            authorize(user.role, Role::Moderator)?;
            Ok(Moderator(user))
        });
        ready(result.map_err(Error::from))
    }
}

#[derive(Debug, Clone)]
pub struct Admin(pub AuthUser);

impl FromRequest for Admin {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let result = current_user(req).and_then(|user| {
            authorize(user.role, Role::Admin)?;
            Ok(Admin(user))
        });
        ready(result.map_err(Error::from))
    }
}

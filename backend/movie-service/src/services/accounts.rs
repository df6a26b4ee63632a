/// Registration, activation, login, token refresh, logout and password flows
use super::{normalize_email, LinkBuilder, RevocationStore};
use crate::db::token_repo::{self, TokenKind};
use crate::db::user_repo;
use crate::error::{AppError, Result};
use crate::jobs::{Task, TaskDispatcher};
use crate::middleware::AuthUser;
use crate::models::{
    AccessTokenResponse, ActivationRequest, ChangePasswordRequest, EmailRequest, LoginRequest,
    MessageResponse, PasswordResetCompleteRequest, RegisterRequest, RegisteredUser, Role,
    TokenPairResponse,
};
use chrono::{Duration, Utc};
use crypto_core::hash::{generate_token, sha256_hex};
use crypto_core::jwt::JwtKeys;
use crypto_core::password::{hash_password, validate_password_strength, verify_password};
use crypto_core::CryptoError;
use sqlx::PgPool;
use std::sync::Arc;
use tracing::info;
use validator::Validate;

const ONE_TIME_TOKEN_LEN: usize = 48;

fn activation_ttl() -> Duration {
    Duration::hours(24)
}

fn password_reset_ttl() -> Duration {
    Duration::hours(1)
}

#[derive(Clone)]
pub struct AccountService {
    pool: PgPool,
    keys: Arc<JwtKeys>,
    revocations: Arc<dyn RevocationStore>,
    tasks: TaskDispatcher,
    links: LinkBuilder,
}

impl AccountService {
    pub fn new(
        pool: PgPool,
        keys: Arc<JwtKeys>,
        revocations: Arc<dyn RevocationStore>,
        tasks: TaskDispatcher,
        links: LinkBuilder,
    ) -> Self {
        Self {
            pool,
            keys,
            revocations,
            tasks,
            links,
        }
    }

    pub async fn register(&self, req: RegisterRequest) -> Result<RegisteredUser> {
        req.validate()?;
        validate_password_strength(&req.password)?;
        let email = normalize_email(&req.email);

        if user_repo::find_by_email(&self.pool, &email).await?.is_some() {
            return Err(AppError::Conflict(format!(
                "A user with this email {} already exists.",
                email
            )));
        }

        let hashed = hash_password(&req.password)?;
        let token = generate_token(ONE_TIME_TOKEN_LEN);

        let mut tx = self.pool.begin().await?;
        let user = user_repo::create_user(&mut *tx, &email, &hashed, false, Role::User).await?;
        token_repo::replace_token(
            &mut *tx,
            TokenKind::Activation,
            user.id,
            &token,
            Utc::now() + activation_ttl(),
        )
        .await?;
        tx.commit().await?;

        info!(user_id = user.id, "user registered");
        self.tasks
            .dispatch(Task::SendActivationEmail {
                email: user.email.clone(),
                activation_link: self.links.activation(&user.email, &token),
            })
            .await;

        Ok(RegisteredUser {
            id: user.id,
            email: user.email,
        })
    }

    pub async fn activate(&self, req: ActivationRequest) -> Result<MessageResponse> {
        req.validate()?;
        let invalid = || AppError::BadRequest("Invalid or expired activation token.".into());
        let email = normalize_email(&req.email);

        let user = user_repo::find_by_email(&self.pool, &email)
            .await?
            .ok_or_else(invalid)?;
        let record = token_repo::find_token(&self.pool, TokenKind::Activation, user.id)
            .await?
            .filter(|record| record.token == req.token)
            .ok_or_else(invalid)?;

        if record.is_expired_at(Utc::now()) {
            token_repo::delete_token(&self.pool, TokenKind::Activation, user.id).await?;
            return Err(invalid());
        }
        if user.is_active {
            return Err(AppError::BadRequest("User account is already active.".into()));
        }

        let mut tx = self.pool.begin().await?;
        user_repo::set_active(&mut *tx, user.id, true).await?;
        token_repo::delete_token(&mut *tx, TokenKind::Activation, user.id).await?;
        tx.commit().await?;

        info!(user_id = user.id, "account activated");
        self.tasks
            .dispatch(Task::SendActivationCompleteEmail {
                email: user.email,
                login_link: self.links.login(),
            })
            .await;

        Ok(MessageResponse::new("Account activated. Please log in."))
    }

    pub async fn resend_activation(&self, req: EmailRequest) -> Result<MessageResponse> {
        req.validate()?;
        let email = normalize_email(&req.email);
        let Some(user) = user_repo::find_by_email(&self.pool, &email).await? else {
            return Ok(MessageResponse::new("This user is not registered."));
        };
        if user.is_active {
            return Ok(MessageResponse::new("This user is already active."));
        }

        let token = generate_token(ONE_TIME_TOKEN_LEN);
        token_repo::replace_token(
            &self.pool,
            TokenKind::Activation,
            user.id,
            &token,
            Utc::now() + activation_ttl(),
        )
        .await?;

        self.tasks
            .dispatch(Task::SendActivationEmail {
                activation_link: self.links.activation(&user.email, &token),
                email: user.email,
            })
            .await;

        Ok(MessageResponse::new(
            "You will receive an email with instructions.",
        ))
    }

    pub async fn login(&self, req: LoginRequest) -> Result<TokenPairResponse> {
        req.validate()?;
        let invalid = || AppError::Unauthorized("Invalid email or password.".into());
        let email = normalize_email(&req.email);

        let user = user_repo::find_by_email(&self.pool, &email)
            .await?
            .ok_or_else(invalid)?;
        verify_password(&req.password, &user.hashed_password).map_err(|e| match e {
            CryptoError::InvalidCredentials => invalid(),
            other => other.into(),
        })?;
        if !user.is_active {
            return Err(AppError::Forbidden("User account is not activated.".into()));
        }

        let access = self
            .keys
            .generate_access_token(user.id)
            .map_err(|e| AppError::Internal(e.to_string()))?;
        let refresh = self
            .keys
            .generate_refresh_token(user.id)
            .map_err(|e| AppError::Internal(e.to_string()))?;

        let mut tx = self.pool.begin().await?;
        token_repo::delete_refresh_tokens_for_user(&mut *tx, user.id).await?;
        token_repo::store_refresh_token(
            &mut *tx,
            user.id,
            &sha256_hex(&refresh.token),
            refresh.expires_at,
        )
        .await?;
        tx.commit().await?;

        info!(user_id = user.id, "user logged in");
        Ok(TokenPairResponse {
            access_token: access.token,
            refresh_token: refresh.token,
            token_type: "bearer".to_string(),
            expires_in: self.keys.access_ttl().num_seconds(),
        })
    }

    pub async fn refresh(&self, refresh_token: &str) -> Result<AccessTokenResponse> {
        let claims = self
            .keys
            .validate_refresh_token(refresh_token)
            .map_err(|_| AppError::Unauthorized("Invalid or expired refresh token.".into()))?;
        let user_id = claims
            .user_id()
            .map_err(|_| AppError::Unauthorized("Invalid or expired refresh token.".into()))?;

        let owner = token_repo::find_refresh_token_owner(
            &self.pool,
            &sha256_hex(refresh_token),
            Utc::now(),
        )
        .await?
        .ok_or_else(|| AppError::Unauthorized("Refresh token not found.".into()))?;
        if owner != user_id {
            return Err(AppError::Unauthorized("Refresh token not found.".into()));
        }

        let user = user_repo::find_by_id(&self.pool, user_id)
            .await?
            .filter(|u| u.is_active)
            .ok_or_else(|| AppError::Unauthorized("User not found.".into()))?;

        let access = self
            .keys
            .generate_access_token(user.id)
            .map_err(|e| AppError::Internal(e.to_string()))?;
        Ok(AccessTokenResponse {
            access_token: access.token,
            token_type: "bearer".to_string(),
            expires_in: self.keys.access_ttl().num_seconds(),
        })
    }

    /// Revoke the presented access token and every refresh token of the user
    pub async fn logout(&self, user: &AuthUser) -> Result<()> {
        self.revocations.revoke(&user.token, user.expires_at).await?;
        let removed = token_repo::delete_refresh_tokens_for_user(&self.pool, user.id).await?;
        info!(user_id = user.id, refresh_tokens = removed, "user logged out");
        Ok(())
    }

    pub async fn change_password(
        &self,
        user: &AuthUser,
        req: ChangePasswordRequest,
    ) -> Result<MessageResponse> {
        let account = user_repo::find_by_id(&self.pool, user.id)
            .await?
            .ok_or_else(|| AppError::Unauthorized("User not found.".into()))?;

        verify_password(&req.old_password, &account.hashed_password).map_err(|e| match e {
            CryptoError::InvalidCredentials => {
                AppError::BadRequest("Old password is incorrect.".into())
            }
            other => other.into(),
        })?;
        validate_password_strength(&req.new_password)?;
        let hashed = hash_password(&req.new_password)?;

        let mut tx = self.pool.begin().await?;
        user_repo::update_password(&mut *tx, account.id, &hashed).await?;
        token_repo::delete_refresh_tokens_for_user(&mut *tx, account.id).await?;
        tx.commit().await?;

        info!(user_id = account.id, "password changed");
        Ok(MessageResponse::new("Password updated successfully."))
    }

    pub async fn request_password_reset(&self, req: EmailRequest) -> Result<MessageResponse> {
        req.validate()?;
        let response = MessageResponse::new(
            "If you are registered, you will receive an email with instructions.",
        );
        let email = normalize_email(&req.email);

        let Some(user) = user_repo::find_by_email(&self.pool, &email).await? else {
            return Ok(response);
        };
        if !user.is_active {
            return Ok(response);
        }

        let token = generate_token(ONE_TIME_TOKEN_LEN);
        token_repo::replace_token(
            &self.pool,
            TokenKind::PasswordReset,
            user.id,
            &token,
            Utc::now() + password_reset_ttl(),
        )
        .await?;

        self.tasks
            .dispatch(Task::SendPasswordResetEmail {
                reset_link: self.links.password_reset(&user.email, &token),
                email: user.email,
            })
            .await;

        Ok(response)
    }

    pub async fn complete_password_reset(
        &self,
        req: PasswordResetCompleteRequest,
    ) -> Result<MessageResponse> {
        req.validate()?;
        let invalid = || AppError::BadRequest("Invalid email or token.".into());
        let email = normalize_email(&req.email);

        let user = user_repo::find_by_email(&self.pool, &email)
            .await?
            .filter(|u| u.is_active)
            .ok_or_else(invalid)?;
        let Some(record) =
            token_repo::find_token(&self.pool, TokenKind::PasswordReset, user.id).await?
        else {
            return Err(invalid());
        };
        if record.token != req.token || record.is_expired_at(Utc::now()) {
            token_repo::delete_token(&self.pool, TokenKind::PasswordReset, user.id).await?;
            return Err(invalid());
        }

        validate_password_strength(&req.password)?;
        let hashed = hash_password(&req.password)?;

        let mut tx = self.pool.begin().await?;
        user_repo::update_password(&mut *tx, user.id, &hashed).await?;
        token_repo::delete_token(&mut *tx, TokenKind::PasswordReset, user.id).await?;
        token_repo::delete_refresh_tokens_for_user(&mut *tx, user.id).await?;
        tx.commit().await?;

        info!(user_id = user.id, "password reset completed");
        self.tasks
            .dispatch(Task::SendPasswordResetCompleteEmail {
                email: user.email,
                login_link: self.links.login(),
            })
            .await;

        Ok(MessageResponse::new("Password reset successfully."))
    }
}

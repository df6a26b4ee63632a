/// Error types for the movie service
///
/// Every failure a handler can produce is an `AppError`; actix renders it
/// as `{"error": ..., "status": ...}` with the status of its category.
use actix_web::{error::ResponseError, http::StatusCode, HttpResponse};
use std::collections::BTreeMap;
use std::fmt;

/// Result type for movie-service operations
pub type Result<T> = std::result::Result<T, AppError>;

/// Field name to the messages raised against it
pub type FieldErrors = BTreeMap<String, Vec<String>>;

/// Application error types
#[derive(Debug)]
pub enum AppError {
    /// Database operation failed
    DatabaseError(String),

    /// Cache or revocation store operation failed
    CacheError(String),

    /// Object storage operation failed
    StorageError(String),

    /// Payment provider call failed
    PaymentGateway(String),

    /// Input failed validation, with per-field detail
    ValidationError(String, FieldErrors),

    /// Resource not found
    NotFound(String),

    /// Missing, invalid, expired or revoked credentials
    Unauthorized(String),

    /// Authenticated but not permitted
    Forbidden(String),

    /// Internal server error
    Internal(String),

    /// Bad request
    BadRequest(String),

    /// Duplicate resource, duplicate purchase or invalid state transition
    Conflict(String),
}

impl AppError {
    pub fn validation(field: &str, message: impl Into<String>) -> Self {
        let message = message.into();
        let mut fields = FieldErrors::new();
        fields.insert(field.to_string(), vec![message.clone()]);
        AppError::ValidationError(message, fields)
    }

    pub fn duplicate_purchase() -> Self {
        AppError::Conflict("You have already purchased this movie.".to_string())
    }

    pub fn invalid_state(message: impl Into<String>) -> Self {
        AppError::Conflict(message.into())
    }

    /// Message without the category prefix
    pub fn message(&self) -> &str {
        match self {
            AppError::DatabaseError(msg)
            | AppError::CacheError(msg)
            | AppError::StorageError(msg)
            | AppError::PaymentGateway(msg)
            | AppError::ValidationError(msg, _)
            | AppError::NotFound(msg)
            | AppError::Unauthorized(msg)
            | AppError::Forbidden(msg)
            | AppError::Internal(msg)
            | AppError::BadRequest(msg)
            | AppError::Conflict(msg) => msg,
        }
    }

    fn is_infrastructure(&self) -> bool {
        matches!(
            self,
            AppError::DatabaseError(_)
                | AppError::CacheError(_)
                | AppError::StorageError(_)
                | AppError::PaymentGateway(_)
                | AppError::Internal(_)
        )
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::DatabaseError(msg) => write!(f, "Database error: {}", msg),
            AppError::CacheError(msg) => write!(f, "Cache error: {}", msg),
            AppError::StorageError(msg) => write!(f, "Storage error: {}", msg),
            AppError::PaymentGateway(msg) => write!(f, "Payment provider error: {}", msg),
            AppError::ValidationError(msg, _) => write!(f, "Validation error: {}", msg),
            AppError::NotFound(msg)
            | AppError::Unauthorized(msg)
            | AppError::Forbidden(msg)
            | AppError::BadRequest(msg)
            | AppError::Conflict(msg) => write!(f, "{}", msg),
            AppError::Internal(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for AppError {}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::DatabaseError(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::CacheError(_) | AppError::StorageError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::PaymentGateway(_) => StatusCode::BAD_GATEWAY,
            AppError::ValidationError(..) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Conflict(_) => StatusCode::CONFLICT,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();

        // Infrastructure detail stays in the logs
        let error_msg = if self.is_infrastructure() {
            tracing::error!(error = %self, status = status.as_u16(), "request failed");
            match self {
                AppError::PaymentGateway(_) => "Payment provider unavailable".to_string(),
                AppError::StorageError(msg) => msg.clone(),
                _ => "Internal server error".to_string(),
            }
        } else {
            self.to_string()
        };

        let mut body = serde_json::json!({
            "error": error_msg,
            "status": status.as_u16(),
        });
        if let AppError::ValidationError(_, fields) = self {
            body["fields"] = serde_json::json!(fields);
        }

        HttpResponse::build(status).json(body)
    }
}

impl From<String> for AppError {
    fn from(msg: String) -> Self {
        AppError::Internal(msg)
    }
}

impl From<&str> for AppError {
    fn from(msg: &str) -> Self {
        AppError::Internal(msg.to_string())
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::RowNotFound => AppError::NotFound("Resource not found".to_string()),
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                AppError::Conflict("Resource already exists".to_string())
            }
            _ => AppError::DatabaseError(err.to_string()),
        }
    }
}

impl From<redis::RedisError> for AppError {
    fn from(err: redis::RedisError) -> Self {
        AppError::CacheError(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Internal(err.to_string())
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut fields = FieldErrors::new();
        for (field, errs) in errors.field_errors() {
            let messages = errs
                .iter()
                .map(|e| {
                    e.message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| e.code.to_string())
                })
                .collect();
            fields.insert(field.to_string(), messages);
        }
        let summary = fields
            .keys()
            .cloned()
            .collect::<Vec<_>>()
            .join(", ");
        AppError::ValidationError(format!("invalid fields: {}", summary), fields)
    }
}

impl From<crate::services::payment_gateway::GatewayError> for AppError {
    fn from(err: crate::services::payment_gateway::GatewayError) -> Self {
        AppError::PaymentGateway(err.to_string())
    }
}

impl From<crypto_core::CryptoError> for AppError {
    fn from(err: crypto_core::CryptoError) -> Self {
        match err {
            crypto_core::CryptoError::WeakPassword(reason) => {
                AppError::validation("password", format!("Password {}", reason))
            }
            crypto_core::CryptoError::InvalidCredentials => {
                AppError::Unauthorized("Invalid email or password.".to_string())
            }
            crypto_core::CryptoError::Hashing(msg) => AppError::Internal(msg),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::body::to_bytes;

    #[test]
    fn status_codes_follow_categories() {
        assert_eq!(AppError::duplicate_purchase().status_code(), StatusCode::CONFLICT);
        assert_eq!(
            AppError::invalid_state("Only pending orders can be canceled.").status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            AppError::Unauthorized("x".into()).status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(AppError::Forbidden("x".into()).status_code(), StatusCode::FORBIDDEN);
        assert_eq!(
            AppError::validation("rating", "out of range").status_code(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            AppError::PaymentGateway("down".into()).status_code(),
            StatusCode::BAD_GATEWAY
        );
    }

    #[test]
    fn row_not_found_maps_to_404() {
        let err: AppError = sqlx::Error::RowNotFound.into();
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
    }

    #[actix_web::test]
    async fn validation_body_carries_fields() {
        let resp = AppError::validation("email", "invalid email").error_response();
        let body = to_bytes(resp.into_body()).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["status"], 422);
        assert_eq!(json["fields"]["email"][0], "invalid email");
    }

    #[actix_web::test]
    async fn database_detail_is_not_leaked() {
        let resp = AppError::DatabaseError("relation users does not exist".into()).error_response();
        let body = to_bytes(resp.into_body()).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["error"], "Internal server error");
    }

    #[actix_web::test]
    async fn domain_messages_are_returned_verbatim() {
        let resp = AppError::NotFound("No movies found.".into()).error_response();
        let body = to_bytes(resp.into_body()).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["error"], "No movies found.");
        assert_eq!(json["status"], 404);
    }
}

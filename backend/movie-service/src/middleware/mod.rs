/// HTTP middleware for movie-service
///
/// Bearer-token authentication with revocation and per-request role
/// loading, role checks, and Prometheus request metrics.
pub mod jwt_auth;
pub mod metrics;
pub mod permissions;

pub use jwt_auth::{Admin, AuthUser, JwtAuthMiddleware, Moderator};
pub use metrics::MetricsMiddleware;
pub use permissions::*;

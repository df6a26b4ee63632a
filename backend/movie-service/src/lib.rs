/// Movie Store Service Library
///
/// Online movie store backend: accounts with role-based access, a movie
/// catalog with ratings, reactions and threaded comments, carts, orders and
/// card payments, plus background email delivery.
///
/// # Modules
///
/// - `handlers`: HTTP request handlers and the `/api/v1` route table
/// - `models`: Database rows, request bodies and response payloads
/// - `services`: Business logic layer
/// - `db`: Database access layer and repositories
/// - `jobs`: Redis task queue, worker and scheduler
/// - `notifications`: Email templates and SMTP delivery
/// - `middleware`: Authentication, role checks and request metrics
/// - `error`: Error types and handling
/// - `config`: Configuration management
/// - `metrics`: Prometheus collectors
/// - `bootstrap`: Tracing, config and pool set-up shared by the binaries
pub mod bootstrap;
pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod jobs;
pub mod metrics;
pub mod middleware;
pub mod models;
pub mod notifications;
pub mod openapi;
pub mod services;

pub use config::Config;
pub use error::{AppError, Result};

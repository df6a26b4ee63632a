use actix_cors::Cors;
use actix_web::{middleware::Logger, web, App, HttpResponse, HttpServer};
use crypto_core::jwt::JwtKeys;
use movie_service::bootstrap::{self, shutdown_signal};
use movie_service::db::MIGRATOR;
use movie_service::handlers::{self, health, health::HealthState};
use movie_service::jobs::{RedisTaskQueue, TaskDispatcher};
use movie_service::middleware::{JwtAuthMiddleware, MetricsMiddleware};
use movie_service::openapi::ApiDoc;
use movie_service::services::{
    AccountService, AdminService, CommentService, LinkBuilder, OrderService, PaymentGateway,
    PaymentService, ProfileService, RedisRevocationStore, RevocationStore, StripeGateway,
};
use redis_utils::RedisPool;
use s3_utils::{ObjectStore, S3Client};
use std::io;
use std::sync::Arc;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

async fn openapi_json(doc: web::Data<utoipa::openapi::OpenApi>) -> actix_web::Result<HttpResponse> {
    let body = serde_json::to_string(&*doc).map_err(|e| {
        actix_web::error::ErrorInternalServerError(format!("OpenAPI serialization failed: {e}"))
    })?;

    Ok(HttpResponse::Ok()
        .content_type("application/json")
        .body(body))
}

fn startup_error(context: &str, err: impl std::fmt::Display) -> io::Error {
    tracing::error!("{}: {}", context, err);
    io::Error::new(io::ErrorKind::Other, format!("{context}: {err}"))
}

/// Movie Store API server
///
/// Serves `/api/v1/*`, health probes, `/metrics` and the Swagger UI.
/// Emails and token cleanup run in the `task-worker` and `task-scheduler`
/// binaries; this process only enqueues work for them.
#[actix_web::main]
async fn main() -> io::Result<()> {
    let config = bootstrap::load_config();

    // Container healthcheck: `movie-service healthcheck`
    if std::env::args().nth(1).as_deref() == Some("healthcheck") {
        let url = format!("http://127.0.0.1:{}/api/v1/health", config.app.port);
        return match reqwest::Client::new().get(&url).send().await {
            Ok(resp) if resp.status().is_success() => Ok(()),
            Ok(resp) => {
                eprintln!("healthcheck HTTP status: {}", resp.status());
                Err(io::Error::new(io::ErrorKind::Other, "healthcheck failed"))
            }
            Err(e) => {
                eprintln!("healthcheck HTTP error: {}", e);
                Err(io::Error::new(io::ErrorKind::Other, "healthcheck error"))
            }
        };
    }

    bootstrap::init_tracing();
    tracing::info!("Starting movie-service v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!("Environment: {}", config.app.env);

    let db_pool = bootstrap::connect_database(&config, "movie-service")
        .await
        .map_err(|e| startup_error("Failed to create database pool", e))?;
    db_pool::run_migrations(&db_pool, &MIGRATOR)
        .await
        .map_err(|e| startup_error("Failed to run migrations", e))?;

    let cache = RedisPool::connect(&config.cache.url)
        .await
        .map_err(|e| startup_error("Failed to connect to Redis", e))?;
    let broker = if config.tasks.broker_url == config.cache.url {
        cache.clone()
    } else {
        RedisPool::connect(&config.tasks.broker_url)
            .await
            .map_err(|e| startup_error("Failed to connect to task broker", e))?
    };

    let storage = S3Client::with_config(config.s3_config()).await;
    if let Err(e) = storage.ensure_bucket().await {
        // Avatars fail per request until storage comes back
        tracing::warn!(error = %e, "object storage bucket check failed");
    }
    let storage: Arc<dyn ObjectStore> = Arc::new(storage);

    let keys = Arc::new(
        JwtKeys::new(
            &config.jwt.access_secret,
            &config.jwt.refresh_secret,
            chrono::Duration::seconds(config.jwt.access_ttl_secs),
            chrono::Duration::days(config.jwt.login_time_days),
        )
        .map_err(|e| startup_error("Failed to initialize JWT keys", e))?,
    );
    let revocations: Arc<dyn RevocationStore> =
        Arc::new(RedisRevocationStore::new(cache.manager()));
    let gateway: Arc<dyn PaymentGateway> = Arc::new(
        StripeGateway::new(
            &config.payments.stripe_api_base,
            &config.payments.stripe_secret_key,
        )
        .map_err(|e| startup_error("Failed to build payment gateway client", e))?,
    );
    let tasks = TaskDispatcher::new(
        Arc::new(RedisTaskQueue::new(broker.manager(), &config.tasks.queue_name)),
        config.tasks.max_retries,
    );
    let links = LinkBuilder::new(&config.app.public_base_url);

    let account_service = web::Data::new(AccountService::new(
        db_pool.clone(),
        keys.clone(),
        revocations.clone(),
        tasks.clone(),
        links.clone(),
    ));
    let profile_service = web::Data::new(ProfileService::new(db_pool.clone(), storage));
    let comment_service = web::Data::new(CommentService::new(
        db_pool.clone(),
        tasks.clone(),
        links,
    ));
    let order_service = web::Data::new(OrderService::new(db_pool.clone(), gateway.clone()));
    let payment_service = web::Data::new(PaymentService::new(
        db_pool.clone(),
        gateway.clone(),
        tasks,
        &config.payments.stripe_webhook_secret,
        &config.payments.currency,
    ));
    let admin_service = web::Data::new(AdminService::new(db_pool.clone(), gateway));
    let health_state = web::Data::new(HealthState::new(db_pool.clone(), cache.manager()));
    let auth = JwtAuthMiddleware::new(db_pool.clone(), keys, revocations);

    let http_bind_address = format!("{}:{}", config.app.host, config.app.port);
    tracing::info!("Starting HTTP server at {}", http_bind_address);

    let allowed_origins = config.cors.allowed_origins.clone();
    let db_pool_http = db_pool.clone();
    let server = HttpServer::new(move || {
        let mut cors = Cors::default();
        for origin in allowed_origins.split(',') {
            let origin = origin.trim();
            if origin == "*" {
                cors = cors.allow_any_origin();
            } else if !origin.is_empty() {
                cors = cors.allowed_origin(origin);
            }
        }
        cors = cors.allow_any_method().allow_any_header().max_age(3600);

        let openapi_doc = ApiDoc::openapi();

        App::new()
            .app_data(web::Data::new(openapi_doc.clone()))
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}")
                    .url(ApiDoc::openapi_json_path(), openapi_doc.clone()),
            )
            .route(ApiDoc::openapi_json_path(), web::get().to(openapi_json))
            .app_data(web::Data::new(db_pool_http.clone()))
            .app_data(account_service.clone())
            .app_data(profile_service.clone())
            .app_data(comment_service.clone())
            .app_data(order_service.clone())
            .app_data(payment_service.clone())
            .app_data(admin_service.clone())
            .app_data(health_state.clone())
            .app_data(handlers::json_config())
            .app_data(handlers::query_config())
            .app_data(handlers::path_config())
            .wrap(cors)
            .wrap(Logger::default())
            .wrap(tracing_actix_web::TracingLogger::default())
            .route(
                "/metrics",
                web::get().to(movie_service::metrics::serve_metrics),
            )
            .route("/api/v1/health", web::get().to(health::health_summary))
            .route("/api/v1/health/ready", web::get().to(health::readiness))
            .route("/api/v1/health/live", web::get().to(health::liveness))
            .service(
                web::scope("/api/v1")
                    .wrap(auth.clone())
                    .wrap(MetricsMiddleware)
                    .configure(handlers::configure),
            )
    })
    .bind(&http_bind_address)?
    .run();

    let server_handle = server.handle();
    let server_task = tokio::spawn(server);

    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);

    let result = tokio::select! {
        joined = server_task => match joined {
            Ok(result) => result,
            Err(e) => Err(io::Error::new(io::ErrorKind::Other, e.to_string())),
        },
        _ = &mut shutdown => {
            tracing::info!("Shutdown signal received");
            server_handle.stop(true).await;
            Ok(())
        }
    };

    db_pool.close().await;
    tracing::info!("movie-service shutting down");
    result
}

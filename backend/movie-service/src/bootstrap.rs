/// Start-up plumbing shared by every binary in this crate
use crate::config::Config;
use db_pool::{create_pool, DbConfig};
use sqlx::PgPool;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const DEFAULT_LOG_FILTER: &str = "info,actix_web=debug,sqlx=warn";

/// Install the global subscriber; `LOG_FORMAT=json` switches to JSON lines
pub fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    let json = std::env::var("LOG_FORMAT")
        .map(|value| value.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_current_span(false))
            .init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

/// Read `.env` (if any) and the process environment, exiting on bad input
pub fn load_config() -> Config {
    let _ = dotenvy::dotenv();
    match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            tracing::error!("Configuration loading failed: {}", e);
            eprintln!("ERROR: Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    }
}

/// Build the Postgres pool for `service_name`; pool tuning comes from `DB_*`
/// variables, the URL and ceiling from `config`
pub async fn connect_database(config: &Config, service_name: &str) -> anyhow::Result<PgPool> {
    let mut db_cfg = DbConfig::from_env(service_name).with_url(config.database.url.clone());
    if db_cfg.max_connections < config.database.max_connections {
        db_cfg.max_connections = config.database.max_connections;
    }
    db_cfg.log_config();
    let pool = create_pool(db_cfg).await?;
    tracing::info!(service = service_name, "Connected to database via db-pool crate");
    Ok(pool)
}

/// Resolves on Ctrl+C, or on SIGTERM under unix
pub async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut terminate) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {},
                    _ = terminate.recv() => {},
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "SIGTERM handler unavailable; waiting for Ctrl+C");
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}

//! Task scheduler: promotes delayed retries and enqueues periodic maintenance.

use anyhow::Context;
use movie_service::bootstrap::{self, shutdown_signal};
use movie_service::jobs::scheduler::Scheduler;
use movie_service::jobs::RedisTaskQueue;
use redis_utils::RedisPool;
use std::time::Duration;
use tokio::sync::watch;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = bootstrap::load_config();
    bootstrap::init_tracing();
    tracing::info!("Starting task-scheduler v{}", env!("CARGO_PKG_VERSION"));

    let broker = RedisPool::connect(&config.tasks.broker_url)
        .await
        .context("failed to connect to task broker")?;
    let queue = RedisTaskQueue::new(broker.manager(), &config.tasks.queue_name);
    let scheduler = Scheduler::new(
        queue,
        Duration::from_secs(config.tasks.token_cleanup_interval_secs.max(1)),
        config.tasks.max_retries,
    );

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        shutdown_signal().await;
        tracing::info!("Shutdown signal received");
        let _ = shutdown_tx.send(true);
    });

    scheduler.run(shutdown_rx).await
}

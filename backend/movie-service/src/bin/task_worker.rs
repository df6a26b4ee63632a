//! Task worker: consumes the Redis task queue and sends emails.

use anyhow::Context;
use movie_service::bootstrap::{self, shutdown_signal};
use movie_service::jobs::{EmailTaskHandler, RedisTaskQueue, Worker};
use movie_service::notifications::SmtpEmailSender;
use redis_utils::RedisPool;
use std::sync::Arc;
use tokio::sync::watch;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = bootstrap::load_config();
    bootstrap::init_tracing();
    tracing::info!(
        queue = %config.tasks.queue_name,
        max_retries = config.tasks.max_retries,
        "Starting task-worker v{}",
        env!("CARGO_PKG_VERSION")
    );

    let db_pool = bootstrap::connect_database(&config, "task-worker").await?;
    let broker = RedisPool::connect(&config.tasks.broker_url)
        .await
        .context("failed to connect to task broker")?;
    // BRPOP blocks, so the consumer gets its own connection
    let consumer = broker.dedicated().await?;

    let email = SmtpEmailSender::new(&config.email).context("failed to build SMTP transport")?;
    let handler = EmailTaskHandler::new(db_pool.clone(), Arc::new(email));
    let queue = RedisTaskQueue::new(broker.manager(), &config.tasks.queue_name);
    let worker = Worker::new(
        queue,
        handler,
        chrono::Duration::seconds(config.tasks.retry_delay_secs as i64),
    );

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        shutdown_signal().await;
        tracing::info!("Shutdown signal received; finishing current task");
        let _ = shutdown_tx.send(true);
    });

    worker.run(consumer, shutdown_rx).await?;
    db_pool.close().await;
    Ok(())
}

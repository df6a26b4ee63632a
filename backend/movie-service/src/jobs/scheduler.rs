use super::queue::{RedisTaskQueue, TaskPublisher};
use super::tasks::{Task, TaskEnvelope};
use chrono::Utc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, error, info};

const PROMOTE_BATCH: usize = 100;

/// Periodic dispatcher: promotes due retries every second and enqueues
/// token cleanup every `cleanup_interval`.
pub struct Scheduler {
    queue: RedisTaskQueue,
    cleanup_interval: Duration,
    max_retries: u32,
}

impl Scheduler {
    pub fn new(queue: RedisTaskQueue, cleanup_interval: Duration, max_retries: u32) -> Self {
        Self {
            queue,
            cleanup_interval,
            max_retries,
        }
    }

    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) -> anyhow::Result<()> {
        let mut promote_tick = interval(Duration::from_secs(1));
        promote_tick.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut cleanup_tick = interval(self.cleanup_interval);
        cleanup_tick.set_missed_tick_behavior(MissedTickBehavior::Skip);

        info!(
            cleanup_interval_secs = self.cleanup_interval.as_secs(),
            "task scheduler started"
        );

        loop {
            tokio::select! {
                _ = promote_tick.tick() => {
                    match self.queue.promote_due(Utc::now(), PROMOTE_BATCH).await {
                        Ok(0) => {}
                        Ok(moved) => debug!(moved, "promoted delayed tasks"),
                        Err(e) => error!(error = %e, "failed to promote delayed tasks"),
                    }
                }
                _ = cleanup_tick.tick() => {
                    let envelope = TaskEnvelope::new(Task::CleanupExpiredTokens, self.max_retries);
                    match self.queue.publish(&envelope).await {
                        Ok(()) => info!(task_id = %envelope.id, "scheduled token cleanup"),
                        Err(e) => error!(error = %e, "failed to schedule token cleanup"),
                    }
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }

        info!("task scheduler stopped");
        Ok(())
    }
}

use super::tasks::{QueueKeys, Task, TaskEnvelope};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use redis_utils::SharedConnectionManager;
use std::sync::Arc;
use tracing::{debug, warn};

/// Dead-letter list is capped at this many entries
const DEAD_LETTER_LIMIT: isize = 1000;

/// Move due envelopes from the delayed zset back onto the ready list
const PROMOTE_DUE_SCRIPT: &str = r#"
local due = redis.call('ZRANGEBYSCORE', KEYS[1], '-inf', ARGV[1], 'LIMIT', 0, tonumber(ARGV[2]))
for _, payload in ipairs(due) do
    redis.call('ZREM', KEYS[1], payload)
    redis.call('LPUSH', KEYS[2], payload)
end
return #due
"#;

#[derive(Debug, thiserror::Error)]
pub enum QueueError {
    #[error("broker error: {0}")]
    Broker(#[from] redis::RedisError),
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Enqueue side of the queue
#[async_trait]
pub trait TaskPublisher: Send + Sync {
    async fn publish(&self, envelope: &TaskEnvelope) -> Result<(), QueueError>;
}

/// Redis list + sorted set queue
#[derive(Clone)]
pub struct RedisTaskQueue {
    redis: SharedConnectionManager,
    keys: QueueKeys,
}

impl RedisTaskQueue {
    pub fn new(redis: SharedConnectionManager, queue_name: &str) -> Self {
        Self {
            redis,
            keys: QueueKeys::new(queue_name),
        }
    }

    pub fn keys(&self) -> &QueueKeys {
        &self.keys
    }

    /// Blocking pop on a dedicated connection; `None` on timeout
    pub async fn pop(
        &self,
        conn: &mut ConnectionManager,
        timeout_secs: u64,
    ) -> Result<Option<String>, QueueError> {
        let popped: Option<(String, String)> = redis::cmd("BRPOP")
            .arg(&self.keys.ready)
            .arg(timeout_secs)
            .query_async(conn)
            .await?;
        Ok(popped.map(|(_, payload)| payload))
    }

    pub async fn schedule_retry(
        &self,
        envelope: &TaskEnvelope,
        run_at: DateTime<Utc>,
    ) -> Result<(), QueueError> {
        let payload = serde_json::to_string(envelope)?;
        let mut conn = self.redis.lock().await;
        conn.zadd::<_, _, _, ()>(&self.keys.delayed, payload, run_at.timestamp())
            .await?;
        Ok(())
    }

    /// Store a payload that will not be retried
    pub async fn dead_letter(&self, payload: &str) -> Result<(), QueueError> {
        let mut conn = self.redis.lock().await;
        redis::pipe()
            .atomic()
            .lpush(&self.keys.dead, payload)
            .ignore()
            .ltrim(&self.keys.dead, 0, DEAD_LETTER_LIMIT - 1)
            .ignore()
            .query_async::<_, ()>(&mut *conn)
            .await?;
        Ok(())
    }

    /// Promote delayed envelopes whose time has come; returns how many moved
    pub async fn promote_due(&self, now: DateTime<Utc>, batch: usize) -> Result<usize, QueueError> {
        let mut conn = self.redis.lock().await;
        let moved: usize = redis::Script::new(PROMOTE_DUE_SCRIPT)
            .key(&self.keys.delayed)
            .key(&self.keys.ready)
            .arg(now.timestamp())
            .arg(batch)
            .invoke_async(&mut *conn)
            .await?;
        Ok(moved)
    }
}

#[async_trait]
impl TaskPublisher for RedisTaskQueue {
    async fn publish(&self, envelope: &TaskEnvelope) -> Result<(), QueueError> {
        let payload = serde_json::to_string(envelope)?;
        let mut conn = self.redis.lock().await;
        conn.lpush::<_, _, ()>(&self.keys.ready, payload).await?;
        debug!(task = envelope.task.name(), task_id = %envelope.id, "task enqueued");
        Ok(())
    }
}

/// Fire-and-forget front of the queue used by request handlers.
///
/// Failures are logged and swallowed; a lost email never fails a request.
#[derive(Clone)]
pub struct TaskDispatcher {
    publisher: Arc<dyn TaskPublisher>,
    max_retries: u32,
}

impl TaskDispatcher {
    pub fn new(publisher: Arc<dyn TaskPublisher>, max_retries: u32) -> Self {
        Self {
            publisher,
            max_retries,
        }
    }

    pub async fn dispatch(&self, task: Task) {
        let envelope = TaskEnvelope::new(task, self.max_retries);
        if let Err(e) = self.publisher.publish(&envelope).await {
            warn!(
                task = envelope.task.name(),
                task_id = %envelope.id,
                error = %e,
                "failed to enqueue background task"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct FailingPublisher;

    #[async_trait]
    impl TaskPublisher for FailingPublisher {
        async fn publish(&self, _envelope: &TaskEnvelope) -> Result<(), QueueError> {
            Err(QueueError::Broker(redis::RedisError::from((
                redis::ErrorKind::IoError,
                "connection refused",
            ))))
        }
    }

    #[derive(Default)]
    struct RecordingPublisher {
        seen: Mutex<Vec<TaskEnvelope>>,
    }

    #[async_trait]
    impl TaskPublisher for RecordingPublisher {
        async fn publish(&self, envelope: &TaskEnvelope) -> Result<(), QueueError> {
            self.seen.lock().unwrap().push(envelope.clone());
            Ok(())
        }
    }

    #[tokio::test]
    async fn dispatch_swallows_broker_failure() {
        let dispatcher = TaskDispatcher::new(Arc::new(FailingPublisher), 5);
        dispatcher.dispatch(Task::CleanupExpiredTokens).await;
    }

    #[tokio::test]
    async fn dispatch_wraps_task_with_retry_budget() {
        let publisher = Arc::new(RecordingPublisher::default());
        let dispatcher = TaskDispatcher::new(publisher.clone(), 3);
        dispatcher.dispatch(Task::CleanupExpiredTokens).await;

        let seen = publisher.seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].attempts, 0);
        assert_eq!(seen[0].max_retries, 3);
    }
}

use super::cleanup::cleanup_expired_tokens;
use super::queue::RedisTaskQueue;
use super::tasks::{Task, TaskEnvelope};
use crate::metrics::{record_task, TASK_DURATION_SECONDS};
use crate::notifications::{templates, EmailSender};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use redis::aio::ConnectionManager;
use sqlx::PgPool;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::watch;
use tracing::{error, info, warn};

const POP_TIMEOUT_SECS: u64 = 5;

/// What to do with an envelope whose execution just failed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetryDecision {
    Retry { attempts: u32, run_at: DateTime<Utc> },
    DeadLetter { attempts: u32 },
}

/// `attempts` counts failures before this one.
pub fn decide_retry(
    attempts: u32,
    max_retries: u32,
    delay: Duration,
    now: DateTime<Utc>,
) -> RetryDecision {
    if attempts < max_retries {
        RetryDecision::Retry {
            attempts: attempts + 1,
            run_at: now + delay,
        }
    } else {
        RetryDecision::DeadLetter {
            attempts: attempts + 1,
        }
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TaskHandler: Send + Sync {
    async fn handle(&self, task: &Task) -> anyhow::Result<()>;
}

/// Default handler: renders and sends emails, runs maintenance
pub struct EmailTaskHandler {
    pool: PgPool,
    email: Arc<dyn EmailSender>,
}

impl EmailTaskHandler {
    pub fn new(pool: PgPool, email: Arc<dyn EmailSender>) -> Self {
        Self { pool, email }
    }
}

#[async_trait]
impl TaskHandler for EmailTaskHandler {
    async fn handle(&self, task: &Task) -> anyhow::Result<()> {
        let (recipient, rendered) = match task {
            Task::SendActivationEmail {
                email,
                activation_link,
            } => (email, templates::activation(activation_link)),
            Task::SendActivationCompleteEmail { email, login_link } => {
                (email, templates::activation_complete(login_link))
            }
            Task::SendPasswordResetEmail { email, reset_link } => {
                (email, templates::password_reset(reset_link))
            }
            Task::SendPasswordResetCompleteEmail { email, login_link } => {
                (email, templates::password_reset_complete(login_link))
            }
            Task::SendCommentReplyEmail {
                email,
                parent_preview,
                reply_preview,
                reply_link,
            } => (
                email,
                templates::comment_reply(parent_preview, reply_preview, reply_link),
            ),
            Task::SendCommentLikeEmail {
                email,
                comment_preview,
                comment_link,
            } => (email, templates::comment_like(comment_preview, comment_link)),
            Task::SendPaymentSuccessEmail {
                email,
                order_id,
                amount,
                movies,
            } => (email, templates::payment_success(*order_id, amount, movies)),
            Task::CleanupExpiredTokens => {
                cleanup_expired_tokens(&self.pool).await?;
                return Ok(());
            }
        };

        self.email.send(recipient, &rendered).await?;
        Ok(())
    }
}

/// Queue consumer loop
pub struct Worker<H: TaskHandler> {
    queue: RedisTaskQueue,
    handler: H,
    retry_delay: Duration,
}

impl<H: TaskHandler> Worker<H> {
    pub fn new(queue: RedisTaskQueue, handler: H, retry_delay: Duration) -> Self {
        Self {
            queue,
            handler,
            retry_delay,
        }
    }

    /// Pop and process until `shutdown` flips to true.
    ///
    /// The flag is checked between pops, so an in-flight task always finishes.
    pub async fn run(
        &self,
        mut conn: ConnectionManager,
        shutdown: watch::Receiver<bool>,
    ) -> anyhow::Result<()> {
        info!(queue = %self.queue.keys().ready, "task worker started");
        while !*shutdown.borrow() {
            match self.queue.pop(&mut conn, POP_TIMEOUT_SECS).await {
                Ok(Some(payload)) => self.process(&payload).await,
                Ok(None) => {}
                Err(e) => {
                    error!(error = %e, "failed to pop from task queue");
                    tokio::time::sleep(std::time::Duration::from_secs(1)).await;
                }
            }
        }
        info!("task worker stopped");
        Ok(())
    }

    pub async fn process(&self, payload: &str) {
        let mut envelope: TaskEnvelope = match serde_json::from_str(payload) {
            Ok(envelope) => envelope,
            Err(e) => {
                error!(error = %e, "malformed task payload; dead-lettering");
                record_task("unknown", "dead_lettered");
                if let Err(e) = self.queue.dead_letter(payload).await {
                    error!(error = %e, "failed to dead-letter malformed payload");
                }
                return;
            }
        };

        let name = envelope.task.name();
        let started = Instant::now();
        let result = self.handler.handle(&envelope.task).await;
        TASK_DURATION_SECONDS
            .with_label_values(&[name])
            .observe(started.elapsed().as_secs_f64());

        let failure = match result {
            Ok(()) => {
                record_task(name, "succeeded");
                info!(
                    task = name,
                    task_id = %envelope.id,
                    duration_ms = started.elapsed().as_millis() as u64,
                    "task succeeded"
                );
                return;
            }
            Err(e) => e,
        };

        match decide_retry(
            envelope.attempts,
            envelope.max_retries,
            self.retry_delay,
            Utc::now(),
        ) {
            RetryDecision::Retry { attempts, run_at } => {
                envelope.attempts = attempts;
                warn!(
                    task = name,
                    task_id = %envelope.id,
                    attempt = attempts,
                    error = %failure,
                    "task failed; scheduling retry"
                );
                record_task(name, "retried");
                if let Err(e) = self.queue.schedule_retry(&envelope, run_at).await {
                    error!(task_id = %envelope.id, error = %e, "failed to schedule retry");
                }
            }
            RetryDecision::DeadLetter { attempts } => {
                envelope.attempts = attempts;
                error!(
                    task = name,
                    task_id = %envelope.id,
                    attempt = attempts,
                    error = %failure,
                    "task exhausted its retries"
                );
                record_task(name, "dead_lettered");
                match serde_json::to_string(&envelope) {
                    Ok(json) => {
                        if let Err(e) = self.queue.dead_letter(&json).await {
                            error!(task_id = %envelope.id, error = %e, "failed to dead-letter task");
                        }
                    }
                    Err(e) => error!(task_id = %envelope.id, error = %e, "failed to serialize task"),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn now() -> DateTime<Utc> {
        DateTime::<Utc>::UNIX_EPOCH + Duration::days(365)
    }

    #[test]
    fn first_failure_is_retried_after_delay() {
        let decision = decide_retry(0, 5, Duration::seconds(60), now());
        assert_eq!(
            decision,
            RetryDecision::Retry {
                attempts: 1,
                run_at: now() + Duration::seconds(60)
            }
        );
    }

    #[test]
    fn fifth_failure_still_retries_sixth_dead_letters() {
        assert!(matches!(
            decide_retry(4, 5, Duration::seconds(60), now()),
            RetryDecision::Retry { attempts: 5, .. }
        ));
        assert_eq!(
            decide_retry(5, 5, Duration::seconds(60), now()),
            RetryDecision::DeadLetter { attempts: 6 }
        );
    }

    #[test]
    fn zero_retry_budget_dead_letters_immediately() {
        assert_eq!(
            decide_retry(0, 0, Duration::seconds(60), now()),
            RetryDecision::DeadLetter { attempts: 1 }
        );
    }

    #[tokio::test]
    async fn mock_handler_receives_task() {
        let mut handler = MockTaskHandler::new();
        handler
            .expect_handle()
            .withf(|task| *task == Task::CleanupExpiredTokens)
            .times(1)
            .returning(|_| Ok(()));
        handler.handle(&Task::CleanupExpiredTokens).await.unwrap();
    }
}

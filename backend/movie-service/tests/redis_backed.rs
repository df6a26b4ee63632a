//! Revocation store and task queue against a real Redis.

mod common;

use async_trait::async_trait;
use chrono::{Duration, Utc};
use movie_service::jobs::{RedisTaskQueue, Task, TaskEnvelope, TaskHandler, TaskPublisher, Worker};
use movie_service::services::token_revocation::{revocation_key, RedisRevocationStore};
use movie_service::services::RevocationStore;
use redis::AsyncCommands;

struct AlwaysFails;

#[async_trait]
impl TaskHandler for AlwaysFails {
    async fn handle(&self, _task: &Task) -> anyhow::Result<()> {
        anyhow::bail!("smtp unavailable")
    }
}

#[tokio::test]
async fn revoked_token_exists_until_its_expiry() {
    let redis = common::start_redis().await;
    let store = RedisRevocationStore::new(redis.manager());

    store
        .revoke("access-token", Utc::now() + Duration::seconds(60))
        .await
        .unwrap();
    assert!(store.is_revoked("access-token").await.unwrap());
    assert!(!store.is_revoked("other-token").await.unwrap());

    let ttl: i64 = {
        let manager = redis.manager();
        let mut conn = manager.lock().await;
        conn.ttl(revocation_key("access-token")).await.unwrap()
    };
    assert!((1..=60).contains(&ttl), "ttl was {ttl}");

    // Already expired tokens are not stored at all
    store
        .revoke("stale-token", Utc::now() - Duration::seconds(1))
        .await
        .unwrap();
    assert!(!store.is_revoked("stale-token").await.unwrap());
}

#[tokio::test]
async fn promote_due_moves_only_due_envelopes() {
    let redis = common::start_redis().await;
    let queue = RedisTaskQueue::new(redis.manager(), "promote");
    let now = Utc::now();

    let due = TaskEnvelope::new(Task::CleanupExpiredTokens, 3);
    let later = TaskEnvelope::new(Task::CleanupExpiredTokens, 3);
    queue.schedule_retry(&due, now - Duration::seconds(1)).await.unwrap();
    queue.schedule_retry(&later, now + Duration::hours(1)).await.unwrap();

    assert_eq!(queue.promote_due(now, 100).await.unwrap(), 1);
    assert_eq!(queue.promote_due(now, 100).await.unwrap(), 0);

    let delayed: usize = {
        let manager = redis.manager();
        let mut conn = manager.lock().await;
        conn.zcard(&queue.keys().delayed).await.unwrap()
    };
    assert_eq!(delayed, 1);

    let mut consumer = redis.dedicated().await.unwrap();
    let payload = queue.pop(&mut consumer, 1).await.unwrap().expect("promoted envelope");
    let envelope: TaskEnvelope = serde_json::from_str(&payload).unwrap();
    assert_eq!(envelope.id, due.id);
    assert!(queue.pop(&mut consumer, 1).await.unwrap().is_none());
}

#[tokio::test]
async fn failing_task_is_retried_then_dead_lettered() {
    let redis = common::start_redis().await;
    let queue = RedisTaskQueue::new(redis.manager(), "retries");
    let worker = Worker::new(queue.clone(), AlwaysFails, Duration::seconds(30));
    let mut consumer = redis.dedicated().await.unwrap();

    queue
        .publish(&TaskEnvelope::new(Task::CleanupExpiredTokens, 1))
        .await
        .unwrap();
    let payload = queue.pop(&mut consumer, 1).await.unwrap().expect("published envelope");
    worker.process(&payload).await;

    // First failure lands in the delayed set, not yet due
    assert_eq!(queue.promote_due(Utc::now(), 10).await.unwrap(), 0);
    assert_eq!(
        queue
            .promote_due(Utc::now() + Duration::seconds(31), 10)
            .await
            .unwrap(),
        1
    );
    let payload = queue.pop(&mut consumer, 1).await.unwrap().expect("retried envelope");
    let retried: TaskEnvelope = serde_json::from_str(&payload).unwrap();
    assert_eq!(retried.attempts, 1);

    worker.process(&payload).await;
    worker.process("not an envelope").await;

    let dead: Vec<String> = {
        let manager = redis.manager();
        let mut conn = manager.lock().await;
        conn.lrange(&queue.keys().dead, 0, -1).await.unwrap()
    };
    assert_eq!(dead.len(), 2);
    assert_eq!(dead[0], "not an envelope");
    let exhausted: TaskEnvelope = serde_json::from_str(&dead[1]).unwrap();
    assert_eq!(exhausted.id, retried.id);
    assert_eq!(exhausted.attempts, 2);
}

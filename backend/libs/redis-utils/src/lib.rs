use anyhow::{bail, Context, Result};
use redis::aio::ConnectionManager;
use redis::{Client, IntoConnectionInfo};
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::time::{timeout, Duration};
use tracing::{info, warn};

/// Shared Redis connection manager guarded by a Tokio mutex.
pub type SharedConnectionManager = Arc<Mutex<ConnectionManager>>;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Redis client plus one shared, auto-reconnecting connection.
///
/// Short request/response commands go through [`RedisPool::manager`].
/// Blocking commands such as `BRPOP` must use a connection from
/// [`RedisPool::dedicated`] so they never hold the shared mutex.
#[derive(Clone)]
pub struct RedisPool {
    client: Client,
    manager: SharedConnectionManager,
}

impl RedisPool {
    pub async fn connect(redis_url: &str) -> Result<Self> {
        let info = redis_url
            .into_connection_info()
            .context("failed to parse Redis connection string")?;
        let client = Client::open(info).context("failed to construct Redis client")?;

        let mut connection_manager = timeout(CONNECT_TIMEOUT, ConnectionManager::new(client.clone()))
            .await
            .context("timed out connecting to Redis")?
            .context("failed to initialize Redis connection manager")?;

        ping(&mut connection_manager).await?;
        info!("Redis connection established");

        Ok(Self {
            client,
            manager: Arc::new(Mutex::new(connection_manager)),
        })
    }

    pub fn manager(&self) -> SharedConnectionManager {
        self.manager.clone()
    }

    /// Open a connection that is not shared with anyone else.
    pub async fn dedicated(&self) -> Result<ConnectionManager> {
        ConnectionManager::new(self.client.clone())
            .await
            .context("failed to open dedicated Redis connection")
    }
}

/// Round-trip a PING, failing on anything but `PONG`.
pub async fn ping(conn: &mut ConnectionManager) -> Result<()> {
    let pong: String = redis::cmd("PING")
        .query_async(conn)
        .await
        .context("Redis PING failed")?;
    if pong != "PONG" {
        warn!(response = %pong, "unexpected PING response");
        bail!("unexpected PING response: {pong}");
    }
    Ok(())
}

/// Same as [`ping`] for the shared handle.
pub async fn ping_shared(manager: &SharedConnectionManager) -> Result<()> {
    let mut conn = manager.lock().await;
    ping(&mut conn).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn connect_rejects_malformed_url() {
        let err = RedisPool::connect("not a url").await.err();
        assert!(err.is_some());
    }
}

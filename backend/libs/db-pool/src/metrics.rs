//! Prometheus gauges for the Postgres pool

use prometheus::{register_int_gauge_vec, IntGaugeVec};
use sqlx::PgPool;

lazy_static::lazy_static! {
    /// Pool connection count by state (idle/active/max)
    static ref DB_POOL_CONNECTIONS: IntGaugeVec = register_int_gauge_vec!(
        "db_pool_connections",
        "Database pool connection count by state",
        &["service", "state"]
    ).expect("Prometheus metrics registration should succeed at startup");
}

/// Point-in-time view of pool occupancy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolStats {
    pub size: u32,
    pub idle: u32,
    pub max: u32,
}

impl PoolStats {
    pub fn of(pool: &PgPool) -> Self {
        Self {
            size: pool.size(),
            idle: pool.num_idle() as u32,
            max: pool.options().get_max_connections(),
        }
    }

    pub fn active(&self) -> u32 {
        self.size.saturating_sub(self.idle)
    }
}

pub(crate) fn update_pool_metrics(pool: &PgPool, service: &str) {
    let stats = PoolStats::of(pool);

    DB_POOL_CONNECTIONS
        .with_label_values(&[service, "idle"])
        .set(stats.idle as i64);
    DB_POOL_CONNECTIONS
        .with_label_values(&[service, "active"])
        .set(stats.active() as i64);
    DB_POOL_CONNECTIONS
        .with_label_values(&[service, "max"])
        .set(stats.max as i64);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn active_never_underflows() {
        let stats = PoolStats {
            size: 2,
            idle: 5,
            max: 10,
        };
        assert_eq!(stats.active(), 0);
    }
}

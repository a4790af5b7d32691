//! Query timing and connection pool gauges.

use metrics::{gauge, histogram};
use sqlx::PgPool;
use std::time::Instant;

const QUERY_DURATION: &str = "database_query_duration_seconds";

/// Times one repository query. Names are static so the label set stays bounded.
pub struct QueryTimer {
    query: &'static str,
    start: Instant,
}

impl QueryTimer {
    pub fn new(query: &'static str) -> Self {
        Self {
            query,
            start: Instant::now(),
        }
    }

    /// Records the elapsed time under `database_query_duration_seconds{query}`.
    pub fn record(self) {
        histogram!(QUERY_DURATION, "query" => self.query).record(self.start.elapsed().as_secs_f64());
    }
}

/// Point-in-time connection counts for a pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolSnapshot {
    pub total: usize,
    pub idle: usize,
}

impl PoolSnapshot {
    pub fn of(pool: &PgPool) -> Self {
        Self {
            total: pool.size() as usize,
            idle: pool.num_idle(),
        }
    }

    pub fn active(&self) -> usize {
        self.total.saturating_sub(self.idle)
    }
}

/// Publishes pool gauges; called by the periodic pool job.
pub fn record_pool_gauges(pool: &PgPool) {
    let snapshot = PoolSnapshot::of(pool);
    gauge!("database_connections_active").set(snapshot.active() as f64);
    gauge!("database_connections_idle").set(snapshot.idle as f64);
    gauge!("database_connections_total").set(snapshot.total as f64);
}

//! Periodic connection pool gauges.

use sqlx::PgPool;

use super::scheduler::{Job, JobFrequency, JobOutcome};

pub struct PoolMetricsJob {
    pool: PgPool,
}

impl PoolMetricsJob {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl Job for PoolMetricsJob {
    fn name(&self) -> &'static str {
        "pool_metrics"
    }

    fn frequency(&self) -> JobFrequency {
        JobFrequency::Seconds(10)
    }

    async fn execute(&self) -> Result<JobOutcome, String> {
        persistence::metrics::record_pool_gauges(&self.pool);
        Ok(JobOutcome::Completed(0))
    }
}

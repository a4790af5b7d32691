//! Sweep lease repository.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use domain::store::{LeaseStore, StoreError};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::map_db_error;
use crate::metrics::QueryTimer;

/// Repository for the sweep_leases table.
#[derive(Clone)]
pub struct SweepLeaseRepository {
    pool: PgPool,
}

impl SweepLeaseRepository {
    /// Creates a new SweepLeaseRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LeaseStore for SweepLeaseRepository {
    async fn try_acquire(
        &self,
        name: &str,
        holder: Uuid,
        now: DateTime<Utc>,
        ttl: Duration,
    ) -> Result<bool, StoreError> {
        let timer = QueryTimer::new("try_acquire_sweep_lease");
        // The conflict update only fires for an expired lease or the current holder
        let result = sqlx::query(
            r#"
            INSERT INTO sweep_leases (name, holder, expires_at)
            VALUES ($1, $2, $3)
            ON CONFLICT (name) DO UPDATE SET
                holder = EXCLUDED.holder,
                expires_at = EXCLUDED.expires_at
            WHERE sweep_leases.expires_at <= $4 OR sweep_leases.holder = EXCLUDED.holder
            "#,
        )
        .bind(name)
        .bind(holder)
        .bind(now + ttl)
        .bind(now)
        .execute(&self.pool)
        .await;
        timer.record();
        Ok(result.map_err(map_db_error)?.rows_affected() == 1)
    }

    async fn release(&self, name: &str, holder: Uuid) -> Result<(), StoreError> {
        let timer = QueryTimer::new("release_sweep_lease");
        let result = sqlx::query("DELETE FROM sweep_leases WHERE name = $1 AND holder = $2")
            .bind(name)
            .bind(holder)
            .execute(&self.pool)
            .await;
        timer.record();
        result.map_err(map_db_error)?;
        Ok(())
    }
}

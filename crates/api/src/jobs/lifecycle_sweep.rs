//! Timer-driven lifecycle sweep.

use domain::services::LifecycleScheduler;
use domain::DomainError;

use super::scheduler::{Job, JobFrequency, JobOutcome};
use crate::middleware::metrics::{record_lifecycle_sweep, record_sweep_skipped};

/// Closes registration for started events and ends finished ones.
pub struct LifecycleSweepJob {
    lifecycle: LifecycleScheduler,
    limit: i64,
    interval_secs: u64,
}

impl LifecycleSweepJob {
    pub fn new(lifecycle: LifecycleScheduler, limit: i64, interval_secs: u64) -> Self {
        Self {
            lifecycle,
            limit,
            interval_secs,
        }
    }
}

#[async_trait::async_trait]
impl Job for LifecycleSweepJob {
    fn name(&self) -> &'static str {
        "lifecycle_sweep"
    }

    fn frequency(&self) -> JobFrequency {
        JobFrequency::Seconds(self.interval_secs)
    }

    async fn execute(&self) -> Result<JobOutcome, String> {
        match self.lifecycle.run_sweep(self.limit).await {
            Ok(report) => {
                record_lifecycle_sweep(&report);
                Ok(JobOutcome::Completed(report.total_updates()))
            }
            Err(DomainError::SweepInProgress(name)) => {
                record_sweep_skipped(name);
                Ok(JobOutcome::Skipped)
            }
            Err(e) => Err(e.to_string()),
        }
    }
}

//! Timer-driven dispatch of due reminders for all users.

use domain::services::ReminderScheduler;
use domain::DomainError;

use super::scheduler::{Job, JobFrequency, JobOutcome};
use crate::middleware::metrics::{record_reminders_sent, record_sweep_skipped};

pub struct ReminderSweepJob {
    reminders: ReminderScheduler,
    limit: i64,
    interval_secs: u64,
}

impl ReminderSweepJob {
    pub fn new(reminders: ReminderScheduler, limit: i64, interval_secs: u64) -> Self {
        Self {
            reminders,
            limit,
            interval_secs,
        }
    }
}

#[async_trait::async_trait]
impl Job for ReminderSweepJob {
    fn name(&self) -> &'static str {
        "reminder_sweep"
    }

    fn frequency(&self) -> JobFrequency {
        JobFrequency::Seconds(self.interval_secs)
    }

    async fn execute(&self) -> Result<JobOutcome, String> {
        match self.reminders.run_due(None, self.limit).await {
            Ok(sent) => {
                record_reminders_sent(sent.len());
                Ok(JobOutcome::Completed(sent.len() as u64))
            }
            Err(DomainError::SweepInProgress(name)) => {
                record_sweep_skipped(name);
                Ok(JobOutcome::Skipped)
            }
            Err(e) => Err(e.to_string()),
        }
    }
}

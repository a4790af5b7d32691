//! Background job scheduler and job implementations.

mod lifecycle_sweep;
mod pool_metrics;
mod reminder_sweep;
mod scheduler;

pub use lifecycle_sweep::LifecycleSweepJob;
pub use pool_metrics::PoolMetricsJob;
pub use reminder_sweep::ReminderSweepJob;
pub use scheduler::{Job, JobFrequency, JobOutcome, JobScheduler};

//! Time-driven event lifecycle sweep.

use serde::Serialize;
use std::sync::Arc;

use crate::clock::Clock;
use crate::error::DomainResult;
use crate::services::lease::SweepLease;
use crate::services::participant_registry::ParticipantRegistry;
use crate::store::Stores;

/// Lease name for the lifecycle sweep.
pub const LIFECYCLE_LEASE: &str = "lifecycle_sweep";

/// Outcome of one sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SweepReport {
    pub registrations_closed: u64,
    pub events_ended: u64,
    pub participants_marked_absent: u64,
    /// Events skipped because their write failed.
    pub failures: u64,
}

impl SweepReport {
    /// Number of entities updated.
    pub fn total_updates(&self) -> u64 {
        self.registrations_closed + self.events_ended + self.participants_marked_absent
    }
}

#[derive(Clone)]
pub struct LifecycleScheduler {
    stores: Stores,
    registry: ParticipantRegistry,
    lease: SweepLease,
    clock: Arc<dyn Clock>,
}

impl LifecycleScheduler {
    pub fn new(
        stores: Stores,
        registry: ParticipantRegistry,
        lease: SweepLease,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            stores,
            registry,
            lease,
            clock,
        }
    }

    /// Closes registration for started events, then ends finished ones.
    ///
    /// Each phase handles at most `limit` events. Fails with `SweepInProgress`
    /// if another sweep holds the lease.
    pub async fn run_sweep(&self, limit: i64) -> DomainResult<SweepReport> {
        let guard = self.lease.acquire(LIFECYCLE_LEASE).await?;
        let result = self.sweep(limit).await;
        guard.release().await;
        result
    }

    async fn sweep(&self, limit: i64) -> DomainResult<SweepReport> {
        let mut report = SweepReport::default();
        let now = self.clock.now();

        let to_close = self
            .stores
            .events
            .events_due_for_registration_close(now, limit)
            .await?;
        for event_id in to_close {
            match self
                .stores
                .events
                .close_registration_if_due(event_id, now)
                .await
            {
                Ok(true) => report.registrations_closed += 1,
                Ok(false) => {}
                Err(e) => {
                    report.failures += 1;
                    tracing::warn!(event_id = %event_id, error = %e, "Failed to close registration");
                }
            }
        }

        let to_end = self.stores.events.events_due_to_end(now, limit).await?;
        for event_id in to_end {
            match self.registry.close_out_event(event_id).await {
                Ok(Some(absent)) => {
                    report.events_ended += 1;
                    report.participants_marked_absent += absent as u64;
                }
                Ok(None) => {}
                Err(e) => {
                    report.failures += 1;
                    tracing::warn!(event_id = %event_id, error = %e, "Failed to end event");
                }
            }
        }

        if report.total_updates() > 0 || report.failures > 0 {
            tracing::info!(
                registrations_closed = report.registrations_closed,
                events_ended = report.events_ended,
                participants_marked_absent = report.participants_marked_absent,
                failures = report.failures,
                "Lifecycle sweep finished"
            );
        }
        Ok(report)
    }
}

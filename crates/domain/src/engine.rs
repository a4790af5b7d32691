//! Composition root for the engine services.

use chrono::Duration;
use shared::AttendanceTokenService;
use std::sync::Arc;

use crate::clock::Clock;
use crate::error::DomainResult;
use crate::services::{
    AdmissionController, AttendanceRecorder, EmailGateway, EventService, LifecycleScheduler,
    NotificationGateway, ParticipantRegistry, ReminderScheduler, SweepLease, TokenTtls,
};
use crate::store::Stores;

/// Tunables taken from configuration.
#[derive(Debug, Clone, Copy)]
pub struct EngineSettings {
    pub token_ttls: TokenTtls,
    /// How long a sweep lease is held before it is considered abandoned.
    pub lease_ttl: Duration,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            token_ttls: TokenTtls::default(),
            lease_ttl: Duration::minutes(5),
        }
    }
}

/// All engine services, wired to one set of stores, gateways and clock.
#[derive(Clone)]
pub struct Engine {
    pub events: EventService,
    pub registry: ParticipantRegistry,
    pub admission: AdmissionController,
    pub attendance: AttendanceRecorder,
    pub lifecycle: LifecycleScheduler,
    pub reminders: ReminderScheduler,
    stores: Stores,
}

impl Engine {
    pub fn new(
        stores: Stores,
        tokens: AttendanceTokenService,
        notifier: Arc<dyn NotificationGateway>,
        mailer: Arc<dyn EmailGateway>,
        clock: Arc<dyn Clock>,
        settings: EngineSettings,
    ) -> Self {
        let lease = SweepLease::new(stores.leases.clone(), clock.clone(), settings.lease_ttl);
        let registry = ParticipantRegistry::new(stores.clone(), notifier.clone(), clock.clone());

        Self {
            events: EventService::new(stores.clone(), registry.clone(), clock.clone()),
            admission: AdmissionController::new(
                stores.clone(),
                registry.clone(),
                notifier.clone(),
                clock.clone(),
            ),
            attendance: AttendanceRecorder::new(
                stores.clone(),
                registry.clone(),
                tokens,
                notifier.clone(),
                clock.clone(),
                settings.token_ttls,
            ),
            lifecycle: LifecycleScheduler::new(
                stores.clone(),
                registry.clone(),
                lease.clone(),
                clock.clone(),
            ),
            reminders: ReminderScheduler::new(stores.clone(), notifier, mailer, lease, clock),
            registry,
            stores,
        }
    }

    /// Checks that the backing store answers.
    pub async fn ping(&self) -> DomainResult<()> {
        Ok(self.stores.events.ping().await?)
    }
}

#[cfg(test)]
mod tests {
    use crate::models::{EventStatus, ParticipantStatus};
    use crate::test_support::Harness;
    use chrono::Duration;
    use uuid::Uuid;

    #[tokio::test]
    async fn test_capacity_then_end_of_event() {
        let h = Harness::new();
        let event = h.published_event(Some(1), true).await;
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());

        let joined_a = h.engine.admission.join(event.id, a).await.unwrap();
        let joined_b = h.engine.admission.join(event.id, b).await.unwrap();
        assert_eq!(joined_a.participant.status, ParticipantStatus::Accepted);
        assert_eq!(joined_b.participant.status, ParticipantStatus::Pending);

        h.clock.set(event.end_datetime + Duration::seconds(1));
        let report = h.engine.lifecycle.run_sweep(50).await.unwrap();
        assert_eq!(report.events_ended, 1);

        let summary = h.engine.registry.summary(event.id).await.unwrap();
        assert_eq!(summary.event.status, EventStatus::Ended);
        assert_eq!(h.status_of(event.id, a).await, ParticipantStatus::Absent);
        assert_eq!(h.status_of(event.id, b).await, ParticipantStatus::Pending);
    }

    #[tokio::test]
    async fn test_ping() {
        assert!(Harness::new().engine.ping().await.is_ok());
    }
}

//! Engine fixture over the in-memory store.

use chrono::{Duration, TimeZone, Utc};
use shared::AttendanceTokenService;
use std::sync::Arc;
use uuid::Uuid;

use crate::clock::{Clock, FixedClock};
use crate::engine::{Engine, EngineSettings};
use crate::models::{CreateEventRequest, Event, ParticipantStatus};
use crate::services::RecordingGateway;
use crate::store::{InMemoryStore, ParticipantStore, Stores};

pub const TEST_SECRET: &[u8] = b"an-attendance-secret-of-32-bytes!";

pub struct Harness {
    pub engine: Engine,
    pub store: Arc<InMemoryStore>,
    pub clock: Arc<FixedClock>,
    pub gateway: Arc<RecordingGateway>,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_gateway(RecordingGateway::new())
    }

    pub fn with_failing_gateway() -> Self {
        Self::with_gateway(RecordingGateway::failing())
    }

    fn with_gateway(gateway: RecordingGateway) -> Self {
        let store = Arc::new(InMemoryStore::new());
        let clock = Arc::new(FixedClock::new(
            Utc.with_ymd_and_hms(2026, 3, 14, 9, 0, 0).unwrap(),
        ));
        let gateway = Arc::new(gateway);
        let engine = Engine::new(
            Stores::from_shared(store.clone()),
            AttendanceTokenService::new(TEST_SECRET).unwrap(),
            gateway.clone(),
            gateway.clone(),
            clock.clone(),
            EngineSettings::default(),
        );
        Self {
            engine,
            store,
            clock,
            gateway,
        }
    }

    async fn create(&self, request: CreateEventRequest) -> Event {
        self.engine
            .events
            .create(Uuid::new_v4(), request)
            .await
            .unwrap()
    }

    fn request(&self, start_in: Duration, max: Option<i32>, auto: bool, public: bool) -> CreateEventRequest {
        let now = self.clock.now();
        CreateEventRequest {
            title: "Community meetup".to_string(),
            start_datetime: now + start_in,
            end_datetime: now + start_in + Duration::hours(2),
            max_participant: max,
            auto_accept_registration: auto,
            is_public: public,
        }
    }

    /// Draft event starting in one hour and ending two hours later.
    pub async fn draft_event(&self, max: Option<i32>, auto: bool) -> Event {
        self.create(self.request(Duration::hours(1), max, auto, true)).await
    }

    /// Published event starting in one hour and ending two hours later.
    pub async fn published_event(&self, max: Option<i32>, auto: bool) -> Event {
        let event = self.draft_event(max, auto).await;
        self.engine
            .events
            .publish(event.id, event.organizer_id)
            .await
            .unwrap()
    }

    pub async fn private_published_event(&self) -> Event {
        let event = self
            .create(self.request(Duration::hours(1), None, true, false))
            .await;
        self.engine
            .events
            .publish(event.id, event.organizer_id)
            .await
            .unwrap()
    }

    /// Published event starting in thirty days.
    pub async fn far_future_event(&self) -> Event {
        let event = self
            .create(self.request(Duration::days(30), None, true, true))
            .await;
        self.engine
            .events
            .publish(event.id, event.organizer_id)
            .await
            .unwrap()
    }

    pub async fn status_of(&self, event_id: Uuid, user_id: Uuid) -> ParticipantStatus {
        self.store
            .find_by_event_and_user(event_id, user_id)
            .await
            .unwrap()
            .unwrap()
            .status
    }
}

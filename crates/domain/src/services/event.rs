//! Organizer-side event operations.

use shared::validation::validate_event_window;
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

use crate::clock::Clock;
use crate::error::{DomainError, DomainResult};
use crate::models::{
    CreateEventRequest, Event, EventStatus, EventSummary, NewEvent, RegistrationStatus,
};
use crate::services::participant_registry::ParticipantRegistry;
use crate::store::Stores;

const ACTIVE_STATUSES: [EventStatus; 4] = [
    EventStatus::Draft,
    EventStatus::Published,
    EventStatus::Opened,
    EventStatus::Closed,
];

#[derive(Clone)]
pub struct EventService {
    stores: Stores,
    registry: ParticipantRegistry,
    clock: Arc<dyn Clock>,
}

impl EventService {
    pub fn new(stores: Stores, registry: ParticipantRegistry, clock: Arc<dyn Clock>) -> Self {
        Self {
            stores,
            registry,
            clock,
        }
    }

    async fn load_owned(&self, event_id: Uuid, requester: Uuid) -> DomainResult<Event> {
        let event = self.registry.load_event(event_id).await?;
        if event.organizer_id != requester {
            return Err(DomainError::Forbidden("Only the organizer may do this"));
        }
        Ok(event)
    }

    /// Creates a draft event owned by `organizer_id`.
    pub async fn create(
        &self,
        organizer_id: Uuid,
        request: CreateEventRequest,
    ) -> DomainResult<Event> {
        request.validate()?;
        validate_event_window(request.start_datetime, request.end_datetime)?;

        let event = self
            .stores
            .events
            .insert_event(
                NewEvent {
                    organizer_id,
                    title: request.title.trim().to_string(),
                    start_datetime: request.start_datetime,
                    end_datetime: request.end_datetime,
                    max_participant: request.max_participant,
                    auto_accept_registration: request.auto_accept_registration,
                    is_public: request.is_public,
                },
                self.clock.now(),
            )
            .await?;

        tracing::info!(event_id = %event.id, organizer_id = %organizer_id, "Event created");
        Ok(event)
    }

    pub async fn publish(&self, event_id: Uuid, requester: Uuid) -> DomainResult<Event> {
        let event = self.load_owned(event_id, requester).await?;
        self.stores
            .events
            .update_event_status(
                event_id,
                &[EventStatus::Draft],
                EventStatus::Published,
                self.clock.now(),
            )
            .await?
            .ok_or(DomainError::InvalidEventState {
                action: "published",
                status: event.status,
            })
    }

    pub async fn cancel(&self, event_id: Uuid, requester: Uuid) -> DomainResult<Event> {
        let event = self.load_owned(event_id, requester).await?;
        let cancelled = self
            .stores
            .events
            .update_event_status(
                event_id,
                &ACTIVE_STATUSES,
                EventStatus::Cancelled,
                self.clock.now(),
            )
            .await?
            .ok_or(DomainError::InvalidEventState {
                action: "cancelled",
                status: event.status,
            })?;
        tracing::info!(event_id = %event_id, "Event cancelled");
        Ok(cancelled)
    }

    /// Opens or closes registration by hand.
    pub async fn set_registration(
        &self,
        event_id: Uuid,
        requester: Uuid,
        open: bool,
    ) -> DomainResult<Event> {
        let event = self.load_owned(event_id, requester).await?;
        if !event.status.is_active() {
            return Err(DomainError::InvalidEventState {
                action: "changed",
                status: event.status,
            });
        }
        let status = if open {
            RegistrationStatus::Opened
        } else {
            RegistrationStatus::Closed
        };
        self.stores
            .events
            .set_registration_status(event_id, status, self.clock.now())
            .await?
            .ok_or(DomainError::NotFound("Event"))
    }

    /// Event detail. Drafts are only visible to their managers.
    pub async fn get(&self, event_id: Uuid, requester: Uuid) -> DomainResult<EventSummary> {
        let summary = self.registry.summary(event_id).await?;
        if summary.event.status == EventStatus::Draft
            && self.registry.require_manager(event_id, requester).await.is_err()
        {
            return Err(DomainError::NotFound("Event"));
        }
        Ok(summary)
    }
}

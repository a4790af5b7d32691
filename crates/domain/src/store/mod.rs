//! Storage seams used by the engine services.
//!
//! Every mutating method is a single transaction. Status writes are
//! compare-and-set: the expected prior state is part of the write predicate
//! and a `None` result means the predicate did not match.

pub mod memory;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

use crate::models::{
    Admission, Event, EventStatus, Identity, NewEvent, NewParticipant, NewReminder, Participant,
    ParticipantCounts, ParticipantRole, ParticipantStatus, RegistrationStatus, Reminder,
};

pub use memory::InMemoryStore;

/// Storage failure.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Unique constraint violated: {0}")]
    UniqueViolation(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

/// Result of ending an event.
#[derive(Debug, Clone)]
pub struct EndedEvent {
    pub event: Event,
    /// Participants flipped from accepted to absent in the same transaction.
    pub absentees: Vec<Participant>,
}

#[async_trait]
pub trait EventStore: Send + Sync {
    async fn ping(&self) -> Result<(), StoreError>;

    /// Inserts a draft event together with its organizer participant.
    async fn insert_event(&self, new: NewEvent, now: DateTime<Utc>) -> Result<Event, StoreError>;

    async fn find_event(&self, id: Uuid) -> Result<Option<Event>, StoreError>;

    async fn update_event_status(
        &self,
        id: Uuid,
        expected: &[EventStatus],
        to: EventStatus,
        now: DateTime<Utc>,
    ) -> Result<Option<Event>, StoreError>;

    async fn set_registration_status(
        &self,
        id: Uuid,
        status: RegistrationStatus,
        now: DateTime<Utc>,
    ) -> Result<Option<Event>, StoreError>;

    /// Published events with open registration whose start has passed, oldest first.
    async fn events_due_for_registration_close(
        &self,
        now: DateTime<Utc>,
        limit: i64,
    ) -> Result<Vec<Uuid>, StoreError>;

    /// Closes registration if the event still matches the due filter.
    async fn close_registration_if_due(
        &self,
        id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<bool, StoreError>;

    /// Published events whose end has passed, oldest first.
    async fn events_due_to_end(
        &self,
        now: DateTime<Utc>,
        limit: i64,
    ) -> Result<Vec<Uuid>, StoreError>;

    /// Ends the event if still due and flips accepted participants with one
    /// of `roles` to absent, atomically.
    async fn end_event_marking_absent(
        &self,
        id: Uuid,
        now: DateTime<Utc>,
        roles: &[ParticipantRole],
    ) -> Result<Option<EndedEvent>, StoreError>;
}

#[async_trait]
pub trait ParticipantStore: Send + Sync {
    async fn find_participant(&self, id: Uuid) -> Result<Option<Participant>, StoreError>;

    async fn find_by_event_and_user(
        &self,
        event_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<Participant>, StoreError>;

    async fn list_for_event(&self, event_id: Uuid) -> Result<Vec<Participant>, StoreError>;

    async fn count_by_status(&self, event_id: Uuid) -> Result<ParticipantCounts, StoreError>;

    /// Self-join under a lock on the event row. Returns the existing row when
    /// the user is already a participant and `None` when the event is gone.
    async fn admit(
        &self,
        new: NewParticipant,
        now: DateTime<Utc>,
    ) -> Result<Option<Admission>, StoreError>;

    /// Plain insert, failing with `UniqueViolation` on an existing (event, user) pair.
    async fn insert_participant(
        &self,
        new: NewParticipant,
        status: ParticipantStatus,
        now: DateTime<Utc>,
    ) -> Result<Participant, StoreError>;

    /// Compare-and-set status change. Organizer rows never match.
    async fn transition_status(
        &self,
        id: Uuid,
        from: ParticipantStatus,
        to: ParticipantStatus,
        now: DateTime<Utc>,
    ) -> Result<Option<Participant>, StoreError>;

    /// Creates or updates the (event, user) row as attended via walk-in.
    /// Returns `None` if the existing row belongs to the organizer.
    async fn upsert_walk_in(
        &self,
        event_id: Uuid,
        user_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<Option<Participant>, StoreError>;
}

#[async_trait]
pub trait ReminderStore: Send + Sync {
    /// Fails with `UniqueViolation` when an unsent reminder with the same option exists.
    async fn insert_reminder(
        &self,
        new: NewReminder,
        now: DateTime<Utc>,
    ) -> Result<Reminder, StoreError>;

    async fn list_reminders_for_user(&self, user_id: Uuid) -> Result<Vec<Reminder>, StoreError>;

    /// Marks up to `limit` due reminders as sent and returns them ordered by `remind_at`.
    async fn claim_due(
        &self,
        user_id: Option<Uuid>,
        now: DateTime<Utc>,
        limit: i64,
    ) -> Result<Vec<Reminder>, StoreError>;
}

#[async_trait]
pub trait IdentityStore: Send + Sync {
    async fn find_identity(&self, id: Uuid) -> Result<Option<Identity>, StoreError>;

    /// Looks up an identity by normalised email, creating an unregistered one if absent.
    async fn resolve_or_create(
        &self,
        email: &str,
        display_name: &str,
    ) -> Result<Identity, StoreError>;
}

#[async_trait]
pub trait LeaseStore: Send + Sync {
    /// Takes the named lease if it is free or expired.
    async fn try_acquire(
        &self,
        name: &str,
        holder: Uuid,
        now: DateTime<Utc>,
        ttl: Duration,
    ) -> Result<bool, StoreError>;

    async fn release(&self, name: &str, holder: Uuid) -> Result<(), StoreError>;
}

/// Handles to every store the engine uses.
#[derive(Clone)]
pub struct Stores {
    pub events: Arc<dyn EventStore>,
    pub participants: Arc<dyn ParticipantStore>,
    pub reminders: Arc<dyn ReminderStore>,
    pub identities: Arc<dyn IdentityStore>,
    pub leases: Arc<dyn LeaseStore>,
}

impl Stores {
    /// Uses one backend for every seam.
    pub fn from_shared<S>(store: Arc<S>) -> Self
    where
        S: EventStore + ParticipantStore + ReminderStore + IdentityStore + LeaseStore + 'static,
    {
        Self {
            events: store.clone(),
            participants: store.clone(),
            reminders: store.clone(),
            identities: store.clone(),
            leases: store,
        }
    }
}

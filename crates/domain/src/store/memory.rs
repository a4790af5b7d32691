//! In-process store used by tests and local runs.
//!
//! All state sits behind one mutex, so every method is trivially atomic.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard};
use uuid::Uuid;

use super::{
    EndedEvent, EventStore, IdentityStore, LeaseStore, ParticipantStore, ReminderStore,
    StoreError,
};
use crate::models::{
    join_method, Admission, Event, EventStatus, Identity, NewEvent, NewParticipant, NewReminder,
    Participant, ParticipantCounts, ParticipantRole, ParticipantStatus, RegistrationStatus,
    Reminder,
};

#[derive(Debug, Default)]
struct State {
    events: HashMap<Uuid, Event>,
    participants: HashMap<Uuid, Participant>,
    reminders: HashMap<Uuid, Reminder>,
    identities: HashMap<Uuid, Identity>,
    leases: HashMap<String, (Uuid, DateTime<Utc>)>,
    failing_events: HashSet<Uuid>,
    writes: u64,
}

impl State {
    fn participant_for(&self, event_id: Uuid, user_id: Uuid) -> Option<&Participant> {
        self.participants
            .values()
            .find(|p| p.event_id == event_id && p.user_id == user_id)
    }

    fn counts_for(&self, event_id: Uuid) -> ParticipantCounts {
        let mut counts = ParticipantCounts::default();
        for p in self.participants.values() {
            if p.event_id == event_id && p.role != ParticipantRole::Organizer {
                counts.add(p.status, 1);
            }
        }
        counts
    }

    fn new_participant(
        &mut self,
        new: &NewParticipant,
        status: ParticipantStatus,
        now: DateTime<Utc>,
    ) -> Participant {
        let participant = Participant {
            id: Uuid::new_v4(),
            event_id: new.event_id,
            user_id: new.user_id,
            role: new.role,
            status,
            payment_status: None,
            join_method: new.join_method.to_string(),
            created_at: now,
            updated_at: now,
        };
        self.participants.insert(participant.id, participant.clone());
        self.writes += 1;
        participant
    }
}

/// Mutex-backed implementation of every store trait.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    state: Mutex<State>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Number of row writes performed so far.
    pub fn write_count(&self) -> u64 {
        self.lock().writes
    }

    /// Makes lifecycle writes against this event fail.
    pub fn fail_writes_for(&self, event_id: Uuid) {
        self.lock().failing_events.insert(event_id);
    }

    /// Registers an identity directly, as the external identity service would.
    pub fn add_identity(&self, identity: Identity) {
        self.lock().identities.insert(identity.id, identity);
    }

    /// Removes an event row without touching dependants.
    pub fn remove_event(&self, event_id: Uuid) {
        self.lock().events.remove(&event_id);
    }
}

#[async_trait]
impl EventStore for InMemoryStore {
    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }

    async fn insert_event(&self, new: NewEvent, now: DateTime<Utc>) -> Result<Event, StoreError> {
        let mut state = self.lock();
        let event = Event {
            id: Uuid::new_v4(),
            organizer_id: new.organizer_id,
            title: new.title,
            status: EventStatus::Draft,
            registration_status: RegistrationStatus::Opened,
            start_datetime: new.start_datetime,
            end_datetime: new.end_datetime,
            max_participant: new.max_participant,
            auto_accept_registration: new.auto_accept_registration,
            is_public: new.is_public,
            created_at: now,
            updated_at: now,
        };
        state.events.insert(event.id, event.clone());
        state.writes += 1;
        let organizer = NewParticipant {
            event_id: event.id,
            user_id: event.organizer_id,
            role: ParticipantRole::Organizer,
            join_method: join_method::ORGANIZER,
        };
        state.new_participant(&organizer, ParticipantStatus::Accepted, now);
        Ok(event)
    }

    async fn find_event(&self, id: Uuid) -> Result<Option<Event>, StoreError> {
        Ok(self.lock().events.get(&id).cloned())
    }

    async fn update_event_status(
        &self,
        id: Uuid,
        expected: &[EventStatus],
        to: EventStatus,
        now: DateTime<Utc>,
    ) -> Result<Option<Event>, StoreError> {
        let mut state = self.lock();
        let updated = match state.events.get_mut(&id) {
            Some(event) if expected.contains(&event.status) => {
                event.status = to;
                event.updated_at = now;
                Some(event.clone())
            }
            _ => None,
        };
        if updated.is_some() {
            state.writes += 1;
        }
        Ok(updated)
    }

    async fn set_registration_status(
        &self,
        id: Uuid,
        status: RegistrationStatus,
        now: DateTime<Utc>,
    ) -> Result<Option<Event>, StoreError> {
        let mut state = self.lock();
        let updated = state.events.get_mut(&id).map(|event| {
            event.registration_status = status;
            event.updated_at = now;
            event.clone()
        });
        if updated.is_some() {
            state.writes += 1;
        }
        Ok(updated)
    }

    async fn events_due_for_registration_close(
        &self,
        now: DateTime<Utc>,
        limit: i64,
    ) -> Result<Vec<Uuid>, StoreError> {
        let state = self.lock();
        let mut due: Vec<&Event> = state
            .events
            .values()
            .filter(|e| {
                e.status == EventStatus::Published
                    && e.registration_status == RegistrationStatus::Opened
                    && e.start_datetime <= now
            })
            .collect();
        due.sort_by_key(|e| e.start_datetime);
        Ok(due
            .into_iter()
            .take(limit.max(0) as usize)
            .map(|e| e.id)
            .collect())
    }

    async fn close_registration_if_due(
        &self,
        id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<bool, StoreError> {
        let mut state = self.lock();
        if state.failing_events.contains(&id) {
            return Err(StoreError::Database(format!("injected failure for {}", id)));
        }
        let closed = match state.events.get_mut(&id) {
            Some(event)
                if event.status == EventStatus::Published
                    && event.registration_status == RegistrationStatus::Opened
                    && event.start_datetime <= now =>
            {
                event.registration_status = RegistrationStatus::Closed;
                event.updated_at = now;
                true
            }
            _ => false,
        };
        if closed {
            state.writes += 1;
        }
        Ok(closed)
    }

    async fn events_due_to_end(
        &self,
        now: DateTime<Utc>,
        limit: i64,
    ) -> Result<Vec<Uuid>, StoreError> {
        let state = self.lock();
        let mut due: Vec<&Event> = state
            .events
            .values()
            .filter(|e| e.status == EventStatus::Published && e.end_datetime < now)
            .collect();
        due.sort_by_key(|e| e.end_datetime);
        Ok(due
            .into_iter()
            .take(limit.max(0) as usize)
            .map(|e| e.id)
            .collect())
    }

    async fn end_event_marking_absent(
        &self,
        id: Uuid,
        now: DateTime<Utc>,
        roles: &[ParticipantRole],
    ) -> Result<Option<EndedEvent>, StoreError> {
        let mut state = self.lock();
        if state.failing_events.contains(&id) {
            return Err(StoreError::Database(format!("injected failure for {}", id)));
        }
        let event = match state.events.get_mut(&id) {
            Some(event) if event.status == EventStatus::Published && event.end_datetime < now => {
                event.status = EventStatus::Ended;
                event.updated_at = now;
                event.clone()
            }
            _ => return Ok(None),
        };
        state.writes += 1;

        let mut absentees = Vec::new();
        for p in state.participants.values_mut() {
            if p.event_id == id
                && p.status == ParticipantStatus::Accepted
                && roles.contains(&p.role)
            {
                p.status = ParticipantStatus::Absent;
                p.updated_at = now;
                absentees.push(p.clone());
            }
        }
        state.writes += absentees.len() as u64;
        Ok(Some(EndedEvent { event, absentees }))
    }
}

#[async_trait]
impl ParticipantStore for InMemoryStore {
    async fn find_participant(&self, id: Uuid) -> Result<Option<Participant>, StoreError> {
        Ok(self.lock().participants.get(&id).cloned())
    }

    async fn find_by_event_and_user(
        &self,
        event_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<Participant>, StoreError> {
        Ok(self.lock().participant_for(event_id, user_id).cloned())
    }

    async fn list_for_event(&self, event_id: Uuid) -> Result<Vec<Participant>, StoreError> {
        let state = self.lock();
        let mut list: Vec<Participant> = state
            .participants
            .values()
            .filter(|p| p.event_id == event_id)
            .cloned()
            .collect();
        list.sort_by_key(|p| p.created_at);
        Ok(list)
    }

    async fn count_by_status(&self, event_id: Uuid) -> Result<ParticipantCounts, StoreError> {
        Ok(self.lock().counts_for(event_id))
    }

    async fn admit(
        &self,
        new: NewParticipant,
        now: DateTime<Utc>,
    ) -> Result<Option<Admission>, StoreError> {
        let mut state = self.lock();
        let policy = match state.events.get(&new.event_id) {
            Some(event) => event.admission_policy(),
            None => return Ok(None),
        };
        if let Some(existing) = state.participant_for(new.event_id, new.user_id) {
            return Ok(Some(Admission {
                participant: existing.clone(),
                created: false,
            }));
        }
        let accepted = state.counts_for(new.event_id).accepted;
        let participant = state.new_participant(&new, policy.status_for(accepted), now);
        Ok(Some(Admission {
            participant,
            created: true,
        }))
    }

    async fn insert_participant(
        &self,
        new: NewParticipant,
        status: ParticipantStatus,
        now: DateTime<Utc>,
    ) -> Result<Participant, StoreError> {
        let mut state = self.lock();
        if state.participant_for(new.event_id, new.user_id).is_some() {
            return Err(StoreError::UniqueViolation(
                "participants_event_id_user_id_key".to_string(),
            ));
        }
        Ok(state.new_participant(&new, status, now))
    }

    async fn transition_status(
        &self,
        id: Uuid,
        from: ParticipantStatus,
        to: ParticipantStatus,
        now: DateTime<Utc>,
    ) -> Result<Option<Participant>, StoreError> {
        let mut state = self.lock();
        let updated = match state.participants.get_mut(&id) {
            Some(p) if p.status == from && p.role != ParticipantRole::Organizer => {
                p.status = to;
                p.updated_at = now;
                Some(p.clone())
            }
            _ => None,
        };
        if updated.is_some() {
            state.writes += 1;
        }
        Ok(updated)
    }

    async fn upsert_walk_in(
        &self,
        event_id: Uuid,
        user_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<Option<Participant>, StoreError> {
        let mut state = self.lock();
        let existing_id = state.participant_for(event_id, user_id).map(|p| p.id);
        match existing_id {
            Some(id) => {
                let updated = match state.participants.get_mut(&id) {
                    Some(p) if p.role == ParticipantRole::Organizer => None,
                    Some(p) => {
                        p.status = ParticipantStatus::Attended;
                        p.join_method = join_method::WALK_IN.to_string();
                        p.updated_at = now;
                        Some(p.clone())
                    }
                    None => None,
                };
                if updated.is_some() {
                    state.writes += 1;
                }
                Ok(updated)
            }
            None => {
                let new = NewParticipant {
                    event_id,
                    user_id,
                    role: ParticipantRole::Audience,
                    join_method: join_method::WALK_IN,
                };
                Ok(Some(state.new_participant(
                    &new,
                    ParticipantStatus::Attended,
                    now,
                )))
            }
        }
    }
}

#[async_trait]
impl ReminderStore for InMemoryStore {
    async fn insert_reminder(
        &self,
        new: NewReminder,
        now: DateTime<Utc>,
    ) -> Result<Reminder, StoreError> {
        let mut state = self.lock();
        let duplicate = state.reminders.values().any(|r| {
            !r.is_sent
                && r.event_id == new.event_id
                && r.user_id == new.user_id
                && r.option == new.option
        });
        if duplicate {
            return Err(StoreError::UniqueViolation(
                "reminders_unsent_unique".to_string(),
            ));
        }
        let reminder = Reminder {
            id: Uuid::new_v4(),
            event_id: new.event_id,
            user_id: new.user_id,
            option: new.option,
            remind_at: new.remind_at,
            is_sent: false,
            sent_at: None,
            created_at: now,
        };
        state.reminders.insert(reminder.id, reminder.clone());
        state.writes += 1;
        Ok(reminder)
    }

    async fn list_reminders_for_user(&self, user_id: Uuid) -> Result<Vec<Reminder>, StoreError> {
        let state = self.lock();
        let mut list: Vec<Reminder> = state
            .reminders
            .values()
            .filter(|r| r.user_id == user_id)
            .cloned()
            .collect();
        list.sort_by_key(|r| r.remind_at);
        Ok(list)
    }

    async fn claim_due(
        &self,
        user_id: Option<Uuid>,
        now: DateTime<Utc>,
        limit: i64,
    ) -> Result<Vec<Reminder>, StoreError> {
        let mut state = self.lock();
        let mut due: Vec<(DateTime<Utc>, Uuid)> = state
            .reminders
            .values()
            .filter(|r| !r.is_sent && r.remind_at <= now)
            .filter(|r| user_id.map_or(true, |u| r.user_id == u))
            .map(|r| (r.remind_at, r.id))
            .collect();
        due.sort();
        due.truncate(limit.max(0) as usize);

        let mut claimed = Vec::with_capacity(due.len());
        for (_, id) in due {
            if let Some(r) = state.reminders.get_mut(&id) {
                r.is_sent = true;
                r.sent_at = Some(now);
                claimed.push(r.clone());
            }
        }
        state.writes += claimed.len() as u64;
        Ok(claimed)
    }
}

#[async_trait]
impl IdentityStore for InMemoryStore {
    async fn find_identity(&self, id: Uuid) -> Result<Option<Identity>, StoreError> {
        Ok(self.lock().identities.get(&id).cloned())
    }

    async fn resolve_or_create(
        &self,
        email: &str,
        display_name: &str,
    ) -> Result<Identity, StoreError> {
        let mut state = self.lock();
        if let Some(existing) = state.identities.values().find(|i| i.email == email) {
            return Ok(existing.clone());
        }
        let identity = Identity {
            id: Uuid::new_v4(),
            email: email.to_string(),
            display_name: display_name.to_string(),
            registered: false,
        };
        state.identities.insert(identity.id, identity.clone());
        state.writes += 1;
        Ok(identity)
    }
}

#[async_trait]
impl LeaseStore for InMemoryStore {
    async fn try_acquire(
        &self,
        name: &str,
        holder: Uuid,
        now: DateTime<Utc>,
        ttl: Duration,
    ) -> Result<bool, StoreError> {
        let mut state = self.lock();
        match state.leases.get(name) {
            Some((current, expires_at)) if *current != holder && *expires_at > now => Ok(false),
            _ => {
                state.leases.insert(name.to_string(), (holder, now + ttl));
                Ok(true)
            }
        }
    }

    async fn release(&self, name: &str, holder: Uuid) -> Result<(), StoreError> {
        let mut state = self.lock();
        if matches!(state.leases.get(name), Some((current, _)) if *current == holder) {
            state.leases.remove(name);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_event(organizer_id: Uuid, now: DateTime<Utc>) -> NewEvent {
        NewEvent {
            organizer_id,
            title: "Launch party".to_string(),
            start_datetime: now + Duration::hours(1),
            end_datetime: now + Duration::hours(3),
            max_participant: None,
            auto_accept_registration: true,
            is_public: true,
        }
    }

    #[tokio::test]
    async fn test_insert_event_creates_organizer_participant() {
        let store = InMemoryStore::new();
        let organizer = Uuid::new_v4();
        let event = store
            .insert_event(new_event(organizer, Utc::now()), Utc::now())
            .await
            .unwrap();

        let row = store
            .find_by_event_and_user(event.id, organizer)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(row.role, ParticipantRole::Organizer);
        assert_eq!(row.join_method, join_method::ORGANIZER);
        assert_eq!(store.count_by_status(event.id).await.unwrap().accepted, 0);
    }

    #[tokio::test]
    async fn test_transition_never_touches_organizer() {
        let store = InMemoryStore::new();
        let organizer = Uuid::new_v4();
        let event = store
            .insert_event(new_event(organizer, Utc::now()), Utc::now())
            .await
            .unwrap();
        let row = store
            .find_by_event_and_user(event.id, organizer)
            .await
            .unwrap()
            .unwrap();

        let result = store
            .transition_status(
                row.id,
                ParticipantStatus::Accepted,
                ParticipantStatus::Attended,
                Utc::now(),
            )
            .await
            .unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_lease_exclusive_until_expiry() {
        let store = InMemoryStore::new();
        let now = Utc::now();
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());

        assert!(store.try_acquire("lifecycle", a, now, Duration::seconds(60)).await.unwrap());
        assert!(!store.try_acquire("lifecycle", b, now, Duration::seconds(60)).await.unwrap());
        assert!(store
            .try_acquire("lifecycle", b, now + Duration::seconds(61), Duration::seconds(60))
            .await
            .unwrap());

        // a no longer holds it, so this is a no-op
        store.release("lifecycle", a).await.unwrap();
        assert!(!store
            .try_acquire("lifecycle", a, now + Duration::seconds(62), Duration::seconds(60))
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn test_resolve_or_create_is_stable() {
        let store = InMemoryStore::new();
        let first = store.resolve_or_create("ana@example.com", "Ana").await.unwrap();
        let second = store.resolve_or_create("ana@example.com", "Ana B").await.unwrap();
        assert_eq!(first.id, second.id);
        assert!(!first.registered);
    }
}

//! Check-in: token scans and walk-ins.

use chrono::Duration;
use shared::validation::{normalize_display_name, normalize_email};
use shared::{AttendanceTokenService, IssuedToken};
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

use crate::clock::Clock;
use crate::error::{DomainError, DomainResult};
use crate::models::{Event, Participant, ParticipantStatus, WalkInRequest};
use crate::services::notification::{
    dispatch, Notification, NotificationGateway, NotificationKind,
};
use crate::services::participant_registry::ParticipantRegistry;
use crate::store::Stores;

/// Lifetimes of the two token shapes.
#[derive(Debug, Clone, Copy)]
pub struct TokenTtls {
    pub event_token: Duration,
    pub subject_token: Duration,
}

impl Default for TokenTtls {
    fn default() -> Self {
        Self {
            event_token: Duration::hours(4),
            subject_token: Duration::minutes(5),
        }
    }
}

#[derive(Clone)]
pub struct AttendanceRecorder {
    stores: Stores,
    registry: ParticipantRegistry,
    tokens: AttendanceTokenService,
    notifier: Arc<dyn NotificationGateway>,
    clock: Arc<dyn Clock>,
    ttls: TokenTtls,
}

impl AttendanceRecorder {
    pub fn new(
        stores: Stores,
        registry: ParticipantRegistry,
        tokens: AttendanceTokenService,
        notifier: Arc<dyn NotificationGateway>,
        clock: Arc<dyn Clock>,
        ttls: TokenTtls,
    ) -> Self {
        Self {
            stores,
            registry,
            tokens,
            notifier,
            clock,
            ttls,
        }
    }

    fn ensure_live(&self, event: &Event) -> DomainResult<()> {
        if event.is_live_at(self.clock.now()) {
            Ok(())
        } else {
            Err(DomainError::EventNotLive)
        }
    }

    async fn participant_of(&self, event_id: Uuid, user_id: Uuid) -> DomainResult<Participant> {
        self.stores
            .participants
            .find_by_event_and_user(event_id, user_id)
            .await?
            .ok_or(DomainError::NotAParticipant(user_id))
    }

    /// Event-scoped token displayed at the venue. Organizer or committee only.
    pub async fn issue_event_token(
        &self,
        event_id: Uuid,
        requester: Uuid,
    ) -> DomainResult<IssuedToken> {
        let event = self.registry.load_event(event_id).await?;
        self.registry.require_manager(event_id, requester).await?;
        self.ensure_live(&event)?;
        Ok(self
            .tokens
            .issue_at(event_id, None, self.ttls.event_token, self.clock.now()))
    }

    /// Subject-scoped token the attendee shows to staff.
    pub async fn issue_subject_token(
        &self,
        event_id: Uuid,
        requester: Uuid,
    ) -> DomainResult<IssuedToken> {
        let event = self.registry.load_event(event_id).await?;
        let participant = self.participant_of(event_id, requester).await?;
        if !matches!(
            participant.status,
            ParticipantStatus::Accepted | ParticipantStatus::Attended
        ) {
            return Err(DomainError::WrongStatus {
                current: participant.status,
                expected: ParticipantStatus::Accepted,
            });
        }
        self.ensure_live(&event)?;
        Ok(self.tokens.issue_at(
            event_id,
            Some(requester),
            self.ttls.subject_token,
            self.clock.now(),
        ))
    }

    /// Attendee scans the venue token; the requester is the attendee.
    pub async fn record_by_token(&self, token: &str, requester: Uuid) -> DomainResult<Participant> {
        let claims = self.tokens.verify_at(token, self.clock.now())?;
        if claims.is_subject_scoped() {
            return Err(DomainError::Validation(
                "token: expected an event attendance token".to_string(),
            ));
        }

        let event = self.registry.load_event(claims.event_id).await?;
        self.ensure_live(&event)?;
        let participant = self.participant_of(event.id, requester).await?;
        self.registry.mark_attended(&event, &participant, None).await
    }

    /// Staff scans an attendee's personal token.
    pub async fn record_by_subject_token(
        &self,
        event_id: Uuid,
        token: &str,
        operator: Uuid,
    ) -> DomainResult<Participant> {
        let event = self.registry.load_event(event_id).await?;
        self.registry.require_manager(event_id, operator).await?;

        let claims = self.tokens.verify_at(token, self.clock.now())?;
        let Some(user_id) = claims.user_id else {
            return Err(DomainError::Validation(
                "token: expected a personal attendance token".to_string(),
            ));
        };
        if claims.event_id != event_id {
            return Err(DomainError::Validation(
                "token: issued for a different event".to_string(),
            ));
        }

        self.ensure_live(&event)?;
        let participant = self.participant_of(event_id, user_id).await?;
        self.registry
            .mark_attended(&event, &participant, Some(operator))
            .await
    }

    /// Records an on-site attendee who may have no prior registration.
    pub async fn record_walk_in(
        &self,
        event_id: Uuid,
        operator: Uuid,
        request: WalkInRequest,
    ) -> DomainResult<Participant> {
        let event = self.registry.load_event(event_id).await?;
        self.registry.require_manager(event_id, operator).await?;

        request.validate()?;
        let email = normalize_email(&request.email)?;
        let name = normalize_display_name(&request.name)?;
        self.ensure_live(&event)?;

        let identity = self
            .stores
            .identities
            .resolve_or_create(&email, &name)
            .await?;
        let participant = self
            .stores
            .participants
            .upsert_walk_in(event_id, identity.id, self.clock.now())
            .await?
            .ok_or(DomainError::OrganizerImmutable)?;

        tracing::info!(
            event_id = %event_id,
            user_id = %identity.id,
            registered = identity.registered,
            "Walk-in attendance recorded"
        );
        dispatch(
            self.notifier.as_ref(),
            Notification::for_event(
                identity.id,
                NotificationKind::AttendanceRecorded,
                event.id,
                format!("Attendance recorded for {}", event.title),
            ),
        )
        .await;
        Ok(participant)
    }
}

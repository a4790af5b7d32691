//! Join and invitation policy.

use std::sync::Arc;
use uuid::Uuid;

use crate::clock::Clock;
use crate::error::{DomainError, DomainResult};
use crate::models::{
    join_method, Admission, EventStatus, NewParticipant, Participant, ParticipantRole,
    ParticipantStatus, RegistrationStatus,
};
use crate::services::notification::{
    dispatch, Notification, NotificationGateway, NotificationKind,
};
use crate::services::participant_registry::ParticipantRegistry;
use crate::store::{StoreError, Stores};

#[derive(Clone)]
pub struct AdmissionController {
    stores: Stores,
    registry: ParticipantRegistry,
    notifier: Arc<dyn NotificationGateway>,
    clock: Arc<dyn Clock>,
}

impl AdmissionController {
    pub fn new(
        stores: Stores,
        registry: ParticipantRegistry,
        notifier: Arc<dyn NotificationGateway>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            stores,
            registry,
            notifier,
            clock,
        }
    }

    /// Self-join. An existing participant is returned unchanged.
    ///
    /// Capacity and auto-accept are decided by the store while the event row
    /// is locked, so concurrent joins cannot overshoot `max_participant`.
    pub async fn join(&self, event_id: Uuid, user_id: Uuid) -> DomainResult<Admission> {
        let event = self.registry.load_event(event_id).await?;

        if let Some(existing) = self
            .stores
            .participants
            .find_by_event_and_user(event_id, user_id)
            .await?
        {
            return Ok(Admission {
                participant: existing,
                created: false,
            });
        }

        if !event.is_public {
            return Err(DomainError::EventNotPublic);
        }
        if event.status != EventStatus::Published {
            return Err(DomainError::EventNotPublished);
        }
        if event.registration_status != RegistrationStatus::Opened {
            return Err(DomainError::RegistrationClosed);
        }

        let new = NewParticipant {
            event_id,
            user_id,
            role: ParticipantRole::Audience,
            join_method: join_method::SELF_JOIN,
        };
        let admission = self
            .stores
            .participants
            .admit(new, self.clock.now())
            .await?
            .ok_or(DomainError::NotFound("Event"))?;

        if admission.created {
            tracing::info!(
                event_id = %event_id,
                user_id = %user_id,
                status = %admission.participant.status,
                "Participant joined event"
            );
            dispatch(
                self.notifier.as_ref(),
                Notification::for_event(
                    event.organizer_id,
                    NotificationKind::ParticipantJoined,
                    event.id,
                    format!("A new participant joined {}", event.title),
                ),
            )
            .await;
        }

        Ok(admission)
    }

    /// Invites a user as a pending participant with the given role.
    pub async fn invite(
        &self,
        event_id: Uuid,
        inviter_id: Uuid,
        invitee_id: Uuid,
        role: ParticipantRole,
    ) -> DomainResult<Participant> {
        let event = self.registry.load_event(event_id).await?;
        self.registry.require_manager(event_id, inviter_id).await?;

        if role == ParticipantRole::Organizer {
            return Err(DomainError::Validation(
                "role: organizer cannot be invited".to_string(),
            ));
        }
        if !event.status.is_active() {
            return Err(DomainError::InvalidEventState {
                action: "invited to",
                status: event.status,
            });
        }

        let new = NewParticipant {
            event_id,
            user_id: invitee_id,
            role,
            join_method: join_method::INVITE,
        };
        let participant = match self
            .stores
            .participants
            .insert_participant(new, ParticipantStatus::Pending, self.clock.now())
            .await
        {
            Ok(p) => p,
            Err(StoreError::UniqueViolation(_)) => return Err(DomainError::AlreadyMember),
            Err(e) => return Err(e.into()),
        };

        tracing::info!(
            event_id = %event_id,
            invitee_id = %invitee_id,
            role = %role,
            "Participant invited"
        );
        dispatch(
            self.notifier.as_ref(),
            Notification::for_event(
                invitee_id,
                NotificationKind::InvitationReceived,
                event.id,
                format!("You are invited to {} as {}", event.title, role),
            ),
        )
        .await;

        Ok(participant)
    }
}

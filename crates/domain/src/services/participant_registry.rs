//! Participant state machine.
//!
//! Every status change goes through [`required_prior_status`], which is the
//! single place that knows who may move a participant from where to where.

use std::sync::Arc;
use uuid::Uuid;

use crate::clock::Clock;
use crate::error::{DomainError, DomainResult};
use crate::models::{
    join_method, Decision, Event, EventSummary, Participant, ParticipantRole, ParticipantStatus,
};
use crate::services::notification::{
    dispatch, Notification, NotificationGateway, NotificationKind,
};
use crate::store::Stores;

/// Who is asking for a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Actor {
    /// The invited user answering for themselves.
    Invitee(Uuid),
    /// An organizer or committee member moderating.
    Manager(Uuid),
    /// Check-in. `operator` is set when staff recorded it on the attendee's behalf.
    AttendanceRecorder { operator: Option<Uuid> },
    /// End-of-event sweep.
    LifecycleSweep,
}

/// Prior status an actor needs to move a participant into `to`.
///
/// `None` means the actor may never produce `to`.
pub fn required_prior_status(
    actor: &Actor,
    role: ParticipantRole,
    to: ParticipantStatus,
) -> Option<ParticipantStatus> {
    use ParticipantStatus::*;
    match (actor, to) {
        (Actor::Invitee(_) | Actor::Manager(_), Accepted | Rejected) => Some(Pending),
        (Actor::AttendanceRecorder { .. }, Attended) => Some(Accepted),
        (Actor::LifecycleSweep, Absent) if role.is_audience_like() => Some(Accepted),
        (Actor::Invitee(_), _)
        | (Actor::Manager(_), _)
        | (Actor::AttendanceRecorder { .. }, _)
        | (Actor::LifecycleSweep, _) => None,
    }
}

/// Validates a transition against the table and organizer immutability.
pub fn check_transition(
    actor: &Actor,
    participant: &Participant,
    to: ParticipantStatus,
) -> DomainResult<()> {
    if participant.role.is_immutable() {
        return Err(DomainError::OrganizerImmutable);
    }
    match required_prior_status(actor, participant.role, to) {
        None => Err(DomainError::IllegalTransition {
            from: participant.status,
            to,
        }),
        Some(expected) if participant.status != expected => Err(DomainError::WrongStatus {
            current: participant.status,
            expected,
        }),
        Some(_) => Ok(()),
    }
}

/// Owns participant transitions and their notifications.
#[derive(Clone)]
pub struct ParticipantRegistry {
    stores: Stores,
    notifier: Arc<dyn NotificationGateway>,
    clock: Arc<dyn Clock>,
}

impl ParticipantRegistry {
    pub fn new(
        stores: Stores,
        notifier: Arc<dyn NotificationGateway>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            stores,
            notifier,
            clock,
        }
    }

    pub(crate) async fn load_event(&self, event_id: Uuid) -> DomainResult<Event> {
        self.stores
            .events
            .find_event(event_id)
            .await?
            .ok_or(DomainError::NotFound("Event"))
    }

    async fn load_participant(&self, participant_id: Uuid) -> DomainResult<Participant> {
        self.stores
            .participants
            .find_participant(participant_id)
            .await?
            .ok_or(DomainError::NotFound("Participant"))
    }

    /// Returns the requester's participant row if they may manage the event.
    pub async fn require_manager(&self, event_id: Uuid, user_id: Uuid) -> DomainResult<Participant> {
        match self
            .stores
            .participants
            .find_by_event_and_user(event_id, user_id)
            .await?
        {
            Some(p) if p.role.can_manage_event() => Ok(p),
            _ => Err(DomainError::Forbidden(
                "Only the organizer or committee may do this",
            )),
        }
    }

    /// Compare-and-set write. A lost race re-reads the row and reports its status.
    async fn apply(
        &self,
        participant: &Participant,
        actor: Actor,
        to: ParticipantStatus,
    ) -> DomainResult<Participant> {
        check_transition(&actor, participant, to)?;
        let from = participant.status;
        let now = self.clock.now();
        match self
            .stores
            .participants
            .transition_status(participant.id, from, to, now)
            .await?
        {
            Some(updated) => {
                tracing::info!(
                    participant_id = %updated.id,
                    event_id = %updated.event_id,
                    from = %from,
                    to = %to,
                    "Participant status changed"
                );
                Ok(updated)
            }
            None => {
                let current = self.load_participant(participant.id).await?;
                if current.role.is_immutable() {
                    return Err(DomainError::OrganizerImmutable);
                }
                Err(DomainError::WrongStatus {
                    current: current.status,
                    expected: from,
                })
            }
        }
    }

    /// Invitee answers their own invitation.
    pub async fn respond(
        &self,
        participant_id: Uuid,
        user_id: Uuid,
        decision: Decision,
    ) -> DomainResult<Participant> {
        let participant = self.load_participant(participant_id).await?;
        if participant.user_id != user_id {
            return Err(DomainError::Forbidden("Only the invitee may respond"));
        }
        if participant.join_method != join_method::INVITE {
            return Err(DomainError::Forbidden(
                "Registrations are decided by the organizer",
            ));
        }
        let event = self.load_event(participant.event_id).await?;
        let updated = self
            .apply(&participant, Actor::Invitee(user_id), decision.target_status())
            .await?;

        let kind = match decision {
            Decision::Accept => NotificationKind::InvitationAccepted,
            Decision::Reject => NotificationKind::InvitationRejected,
        };
        dispatch(
            self.notifier.as_ref(),
            Notification::for_event(
                event.organizer_id,
                kind,
                event.id,
                format!("An invitee has answered your invitation to {}", event.title),
            ),
        )
        .await;
        Ok(updated)
    }

    /// Organizer or committee decides a pending participant.
    pub async fn decide(
        &self,
        participant_id: Uuid,
        manager_id: Uuid,
        decision: Decision,
    ) -> DomainResult<Participant> {
        let participant = self.load_participant(participant_id).await?;
        self.require_manager(participant.event_id, manager_id).await?;
        let event = self.load_event(participant.event_id).await?;
        let updated = self
            .apply(&participant, Actor::Manager(manager_id), decision.target_status())
            .await?;

        let (kind, content) = match decision {
            Decision::Accept => (
                NotificationKind::RegistrationApproved,
                format!("You are confirmed for {}", event.title),
            ),
            Decision::Reject => (
                NotificationKind::RegistrationRejected,
                format!("Your registration for {} was declined", event.title),
            ),
        };
        dispatch(
            self.notifier.as_ref(),
            Notification::for_event(updated.user_id, kind, event.id, content),
        )
        .await;
        Ok(updated)
    }

    /// Marks an accepted participant as attended. Already attended is a no-op.
    pub async fn mark_attended(
        &self,
        event: &Event,
        participant: &Participant,
        operator: Option<Uuid>,
    ) -> DomainResult<Participant> {
        if participant.status == ParticipantStatus::Attended && !participant.role.is_immutable() {
            return Ok(participant.clone());
        }
        let updated = match self
            .apply(
                participant,
                Actor::AttendanceRecorder { operator },
                ParticipantStatus::Attended,
            )
            .await
        {
            Ok(updated) => updated,
            // Lost the write to a concurrent scan of the same attendee
            Err(DomainError::WrongStatus {
                current: ParticipantStatus::Attended,
                ..
            }) => return self.load_participant(participant.id).await,
            Err(e) => return Err(e),
        };

        // Self check-in informs the organizer; staff check-in informs the attendee.
        let recipient = match operator {
            Some(_) => updated.user_id,
            None => event.organizer_id,
        };
        dispatch(
            self.notifier.as_ref(),
            Notification::for_event(
                recipient,
                NotificationKind::AttendanceRecorded,
                event.id,
                format!("Attendance recorded for {}", event.title),
            ),
        )
        .await;
        Ok(updated)
    }

    /// Ends a due event and marks accepted audience-like participants absent.
    ///
    /// Returns the number of participants marked absent, or `None` when the
    /// event no longer matched the end filter.
    pub async fn close_out_event(&self, event_id: Uuid) -> DomainResult<Option<usize>> {
        let now = self.clock.now();
        let Some(ended) = self
            .stores
            .events
            .end_event_marking_absent(event_id, now, &ParticipantRole::AUDIENCE_LIKE)
            .await?
        else {
            return Ok(None);
        };

        for absentee in &ended.absentees {
            dispatch(
                self.notifier.as_ref(),
                Notification::for_event(
                    absentee.user_id,
                    NotificationKind::MarkedAbsent,
                    ended.event.id,
                    format!("You were marked absent from {}", ended.event.title),
                ),
            )
            .await;
        }
        Ok(Some(ended.absentees.len()))
    }

    /// Participants of an event, visible to its managers.
    pub async fn list(&self, event_id: Uuid, requester: Uuid) -> DomainResult<Vec<Participant>> {
        self.load_event(event_id).await?;
        self.require_manager(event_id, requester).await?;
        Ok(self.stores.participants.list_for_event(event_id).await?)
    }

    /// Event detail with per-status counts.
    pub async fn summary(&self, event_id: Uuid) -> DomainResult<EventSummary> {
        let event = self.load_event(event_id).await?;
        let counts = self.stores.participants.count_by_status(event_id).await?;
        Ok(EventSummary::new(event, counts))
    }
}

//! Event routes: organizer operations, joining and inviting.

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Json,
};
use domain::models::{
    CreateEventRequest, Event, EventSummary, InviteParticipantRequest, Participant,
    ParticipantRole, RegistrationToggleRequest,
};
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::UserAuth;

/// Response for participant listing.
#[derive(Debug, Serialize)]
pub struct ListParticipantsResponse {
    pub participants: Vec<Participant>,
}

/// Create a draft event owned by the requester.
///
/// POST /api/v1/events
pub async fn create_event(
    State(state): State<AppState>,
    user_auth: UserAuth,
    payload: Result<Json<CreateEventRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Event>), ApiError> {
    let Json(request) = payload?;
    let event = state.engine.events.create(user_auth.user_id, request).await?;
    Ok((StatusCode::CREATED, Json(event)))
}

/// Event detail with participant counts. Drafts are visible to managers only.
///
/// GET /api/v1/events/:event_id
pub async fn get_event(
    State(state): State<AppState>,
    user_auth: UserAuth,
    Path(event_id): Path<Uuid>,
) -> Result<Json<EventSummary>, ApiError> {
    let summary = state.engine.events.get(event_id, user_auth.user_id).await?;
    Ok(Json(summary))
}

/// POST /api/v1/events/:event_id/publish
pub async fn publish_event(
    State(state): State<AppState>,
    user_auth: UserAuth,
    Path(event_id): Path<Uuid>,
) -> Result<Json<Event>, ApiError> {
    let event = state.engine.events.publish(event_id, user_auth.user_id).await?;
    info!(event_id = %event_id, "Event published");
    Ok(Json(event))
}

/// POST /api/v1/events/:event_id/cancel
pub async fn cancel_event(
    State(state): State<AppState>,
    user_auth: UserAuth,
    Path(event_id): Path<Uuid>,
) -> Result<Json<Event>, ApiError> {
    let event = state.engine.events.cancel(event_id, user_auth.user_id).await?;
    Ok(Json(event))
}

/// Open or close registration by hand.
///
/// POST /api/v1/events/:event_id/registration
pub async fn set_registration(
    State(state): State<AppState>,
    user_auth: UserAuth,
    Path(event_id): Path<Uuid>,
    payload: Result<Json<RegistrationToggleRequest>, JsonRejection>,
) -> Result<Json<Event>, ApiError> {
    let Json(request) = payload?;
    let event = state
        .engine
        .events
        .set_registration(event_id, user_auth.user_id, request.open)
        .await?;
    Ok(Json(event))
}

/// Join an event. Joining twice returns the existing participation.
///
/// POST /api/v1/events/:event_id/join
///
/// Responds 201 when a participant was created and 200 otherwise.
pub async fn join_event(
    State(state): State<AppState>,
    user_auth: UserAuth,
    Path(event_id): Path<Uuid>,
) -> Result<(StatusCode, Json<Participant>), ApiError> {
    let admission = state
        .engine
        .admission
        .join(event_id, user_auth.user_id)
        .await?;
    let status = if admission.created {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok((status, Json(admission.participant)))
}

/// Invite a user. Organizer or committee only.
///
/// POST /api/v1/events/:event_id/invitations
pub async fn invite_participant(
    State(state): State<AppState>,
    user_auth: UserAuth,
    Path(event_id): Path<Uuid>,
    payload: Result<Json<InviteParticipantRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Participant>), ApiError> {
    let Json(request) = payload?;
    let participant = state
        .engine
        .admission
        .invite(
            event_id,
            user_auth.user_id,
            request.user_id,
            request.role.unwrap_or(ParticipantRole::Audience),
        )
        .await?;
    Ok((StatusCode::CREATED, Json(participant)))
}

/// List an event's participants. Organizer or committee only.
///
/// GET /api/v1/events/:event_id/participants
pub async fn list_participants(
    State(state): State<AppState>,
    user_auth: UserAuth,
    Path(event_id): Path<Uuid>,
) -> Result<Json<ListParticipantsResponse>, ApiError> {
    let participants = state
        .engine
        .registry
        .list(event_id, user_auth.user_id)
        .await?;
    Ok(Json(ListParticipantsResponse { participants }))
}

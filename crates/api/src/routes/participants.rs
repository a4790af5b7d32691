//! Participant routes: invitation responses and organizer decisions.

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    Json,
};
use domain::models::{DecisionRequest, Participant};
use uuid::Uuid;

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::UserAuth;

/// Invitee accepts or rejects their own invitation.
///
/// POST /api/v1/participants/:participant_id/response
pub async fn respond(
    State(state): State<AppState>,
    user_auth: UserAuth,
    Path(participant_id): Path<Uuid>,
    payload: Result<Json<DecisionRequest>, JsonRejection>,
) -> Result<Json<Participant>, ApiError> {
    let Json(request) = payload?;
    let participant = state
        .engine
        .registry
        .respond(participant_id, user_auth.user_id, request.decision)
        .await?;
    Ok(Json(participant))
}

/// Organizer or committee accepts or rejects a pending participant.
///
/// POST /api/v1/participants/:participant_id/decision
pub async fn decide(
    State(state): State<AppState>,
    user_auth: UserAuth,
    Path(participant_id): Path<Uuid>,
    payload: Result<Json<DecisionRequest>, JsonRejection>,
) -> Result<Json<Participant>, ApiError> {
    let Json(request) = payload?;
    let participant = state
        .engine
        .registry
        .decide(participant_id, user_auth.user_id, request.decision)
        .await?;
    Ok(Json(participant))
}

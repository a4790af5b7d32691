//! Check-in routes: attendance tokens, scans and walk-ins.

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use domain::models::{Participant, WalkInRequest};
use serde::{Deserialize, Serialize};
use shared::IssuedToken;
use uuid::Uuid;

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::UserAuth;

/// A freshly issued attendance token.
#[derive(Debug, Serialize)]
pub struct AttendanceTokenResponse {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

impl From<IssuedToken> for AttendanceTokenResponse {
    fn from(issued: IssuedToken) -> Self {
        Self {
            token: issued.token,
            expires_at: issued.expires_at,
        }
    }
}

/// Request body carrying a scanned token.
#[derive(Debug, Deserialize)]
pub struct ScanRequest {
    pub token: String,
}

/// Issue the event-scoped token displayed at the venue.
///
/// POST /api/v1/events/:event_id/attendance-token
pub async fn issue_event_token(
    State(state): State<AppState>,
    user_auth: UserAuth,
    Path(event_id): Path<Uuid>,
) -> Result<(StatusCode, Json<AttendanceTokenResponse>), ApiError> {
    let issued = state
        .engine
        .attendance
        .issue_event_token(event_id, user_auth.user_id)
        .await?;
    Ok((StatusCode::CREATED, Json(issued.into())))
}

/// Issue the requester's personal token for staff to scan.
///
/// POST /api/v1/events/:event_id/my-attendance-token
pub async fn issue_subject_token(
    State(state): State<AppState>,
    user_auth: UserAuth,
    Path(event_id): Path<Uuid>,
) -> Result<(StatusCode, Json<AttendanceTokenResponse>), ApiError> {
    let issued = state
        .engine
        .attendance
        .issue_subject_token(event_id, user_auth.user_id)
        .await?;
    Ok((StatusCode::CREATED, Json(issued.into())))
}

/// Attendee scans the venue token.
///
/// POST /api/v1/attendance/scan
pub async fn scan_event_token(
    State(state): State<AppState>,
    user_auth: UserAuth,
    payload: Result<Json<ScanRequest>, JsonRejection>,
) -> Result<Json<Participant>, ApiError> {
    let Json(request) = payload?;
    let participant = state
        .engine
        .attendance
        .record_by_token(&request.token, user_auth.user_id)
        .await?;
    Ok(Json(participant))
}

/// Staff confirm an attendee's personal token.
///
/// POST /api/v1/events/:event_id/attendance/confirm
pub async fn confirm_subject_token(
    State(state): State<AppState>,
    user_auth: UserAuth,
    Path(event_id): Path<Uuid>,
    payload: Result<Json<ScanRequest>, JsonRejection>,
) -> Result<Json<Participant>, ApiError> {
    let Json(request) = payload?;
    let participant = state
        .engine
        .attendance
        .record_by_subject_token(event_id, &request.token, user_auth.user_id)
        .await?;
    Ok(Json(participant))
}

/// Staff record someone who turned up without registering.
///
/// POST /api/v1/events/:event_id/attendance/walk-in
pub async fn record_walk_in(
    State(state): State<AppState>,
    user_auth: UserAuth,
    Path(event_id): Path<Uuid>,
    payload: Result<Json<WalkInRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Participant>), ApiError> {
    let Json(request) = payload?;
    let participant = state
        .engine
        .attendance
        .record_walk_in(event_id, user_auth.user_id, request)
        .await?;
    Ok((StatusCode::CREATED, Json(participant)))
}

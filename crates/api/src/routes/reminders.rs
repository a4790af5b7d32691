//! Reminder routes.

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Json,
};
use domain::models::{Reminder, ScheduleReminderRequest};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::UserAuth;
use crate::middleware::metrics::record_reminders_sent;

/// Upper bound on `limit` for on-demand runs.
pub const MAX_RUN_LIMIT: i64 = 1000;

#[derive(Debug, Serialize)]
pub struct ListRemindersResponse {
    pub reminders: Vec<Reminder>,
}

/// Optional body for on-demand reminder and sweep runs.
#[derive(Debug, Default, Deserialize)]
pub struct RunRequest {
    pub limit: Option<i64>,
}

impl RunRequest {
    /// Resolves the batch limit, falling back to `default`.
    pub fn limit_or(&self, default: i64) -> Result<i64, ApiError> {
        match self.limit {
            None => Ok(default),
            Some(limit) if (1..=MAX_RUN_LIMIT).contains(&limit) => Ok(limit),
            Some(_) => Err(ApiError::Validation(format!(
                "limit must be between 1 and {}",
                MAX_RUN_LIMIT
            ))),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct RunRemindersResponse {
    pub count: usize,
    pub reminders: Vec<Reminder>,
}

/// Schedule a reminder before an event starts.
///
/// POST /api/v1/events/:event_id/reminders
pub async fn schedule_reminder(
    State(state): State<AppState>,
    user_auth: UserAuth,
    Path(event_id): Path<Uuid>,
    payload: Result<Json<ScheduleReminderRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Reminder>), ApiError> {
    let Json(request) = payload?;
    let reminder = state
        .engine
        .reminders
        .schedule(event_id, user_auth.user_id, &request.option)
        .await?;
    Ok((StatusCode::CREATED, Json(reminder)))
}

/// GET /api/v1/reminders
pub async fn list_reminders(
    State(state): State<AppState>,
    user_auth: UserAuth,
) -> Result<Json<ListRemindersResponse>, ApiError> {
    let reminders = state.engine.reminders.list_for_user(user_auth.user_id).await?;
    Ok(Json(ListRemindersResponse { reminders }))
}

/// Dispatch the requester's own due reminders now.
///
/// POST /api/v1/reminders/run
pub async fn run_my_reminders(
    State(state): State<AppState>,
    user_auth: UserAuth,
    payload: Option<Json<RunRequest>>,
) -> Result<Json<RunRemindersResponse>, ApiError> {
    let request = payload.map(|Json(r)| r).unwrap_or_default();
    let limit = request.limit_or(state.config.scheduler.reminder_batch_limit)?;
    let reminders = state
        .engine
        .reminders
        .run_due(Some(user_auth.user_id), limit)
        .await?;
    record_reminders_sent(reminders.len());
    Ok(Json(RunRemindersResponse {
        count: reminders.len(),
        reminders,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_limit_defaults_and_bounds() {
        assert_eq!(RunRequest::default().limit_or(50).unwrap(), 50);
        assert_eq!(RunRequest { limit: Some(5) }.limit_or(50).unwrap(), 5);
        assert!(RunRequest { limit: Some(0) }.limit_or(50).is_err());
        assert!(RunRequest {
            limit: Some(MAX_RUN_LIMIT + 1)
        }
        .limit_or(50)
        .is_err());
    }
}

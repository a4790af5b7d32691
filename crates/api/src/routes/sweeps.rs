//! Operator routes that run the background sweeps on demand.

use axum::{extract::State, Json};
use domain::services::SweepReport;
use serde::Serialize;
use tracing::info;

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::AdminKey;
use crate::middleware::metrics::{record_lifecycle_sweep, record_reminders_sent};
use crate::routes::reminders::RunRequest;

#[derive(Debug, Serialize)]
pub struct LifecycleSweepResponse {
    /// Sum of the per-phase counts below.
    pub total_updates: u64,
    #[serde(flatten)]
    pub report: SweepReport,
}

impl From<SweepReport> for LifecycleSweepResponse {
    fn from(report: SweepReport) -> Self {
        Self {
            total_updates: report.total_updates(),
            report,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ReminderSweepResponse {
    pub count: usize,
}

/// POST /api/v1/admin/sweeps/lifecycle
pub async fn run_lifecycle_sweep(
    State(state): State<AppState>,
    _admin: AdminKey,
    payload: Option<Json<RunRequest>>,
) -> Result<Json<LifecycleSweepResponse>, ApiError> {
    let request = payload.map(|Json(r)| r).unwrap_or_default();
    let limit = request.limit_or(state.config.scheduler.lifecycle_batch_limit)?;
    let report = state.engine.lifecycle.run_sweep(limit).await?;
    record_lifecycle_sweep(&report);
    info!(updated = report.total_updates(), "Lifecycle sweep run on demand");
    Ok(Json(report.into()))
}

/// POST /api/v1/admin/sweeps/reminders
pub async fn run_reminder_sweep(
    State(state): State<AppState>,
    _admin: AdminKey,
    payload: Option<Json<RunRequest>>,
) -> Result<Json<ReminderSweepResponse>, ApiError> {
    let request = payload.map(|Json(r)| r).unwrap_or_default();
    let limit = request.limit_or(state.config.scheduler.reminder_batch_limit)?;
    let sent = state.engine.reminders.run_due(None, limit).await?;
    record_reminders_sent(sent.len());
    info!(count = sent.len(), "Reminder sweep run on demand");
    Ok(Json(ReminderSweepResponse { count: sent.len() }))
}

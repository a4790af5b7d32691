use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use domain::Engine;
use shared::jwt::{AccessTokenVerifier, JwtError};
use std::sync::Arc;
use std::time::Duration;
use tower_http::{
    compression::CompressionLayer,
    cors::{AllowOrigin, Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::Config;
use crate::middleware::{metrics_handler, metrics_middleware, trace_id};
use crate::routes::{attendance, events, health, participants, reminders, sweeps};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub engine: Engine,
    pub verifier: Arc<AccessTokenVerifier>,
}

impl AppState {
    /// Builds the state, including the access token verifier from `config.jwt`.
    pub fn new(config: Config, engine: Engine) -> Result<Self, JwtError> {
        let verifier = config.jwt.verifier()?;
        Ok(Self {
            config: Arc::new(config),
            engine,
            verifier: Arc::new(verifier),
        })
    }
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    if origins.is_empty() {
        layer.allow_origin(Any)
    } else {
        let origins: Vec<_> = origins.iter().filter_map(|o| o.parse().ok()).collect();
        layer.allow_origin(AllowOrigin::list(origins))
    }
}

pub fn create_app(state: AppState) -> Router {
    let config = state.config.clone();

    // Requester routes authenticate with a Bearer JWT via the UserAuth extractor
    let api_routes = Router::new()
        .route("/events", post(events::create_event))
        .route("/events/:event_id", get(events::get_event))
        .route("/events/:event_id/publish", post(events::publish_event))
        .route("/events/:event_id/cancel", post(events::cancel_event))
        .route("/events/:event_id/registration", post(events::set_registration))
        .route("/events/:event_id/join", post(events::join_event))
        .route("/events/:event_id/invitations", post(events::invite_participant))
        .route("/events/:event_id/participants", get(events::list_participants))
        .route(
            "/events/:event_id/attendance-token",
            post(attendance::issue_event_token),
        )
        .route(
            "/events/:event_id/my-attendance-token",
            post(attendance::issue_subject_token),
        )
        .route("/attendance/scan", post(attendance::scan_event_token))
        .route(
            "/events/:event_id/attendance/confirm",
            post(attendance::confirm_subject_token),
        )
        .route(
            "/events/:event_id/attendance/walk-in",
            post(attendance::record_walk_in),
        )
        .route("/events/:event_id/reminders", post(reminders::schedule_reminder))
        .route("/reminders", get(reminders::list_reminders))
        .route("/reminders/run", post(reminders::run_my_reminders))
        .route("/participants/:participant_id/response", post(participants::respond))
        .route("/participants/:participant_id/decision", post(participants::decide))
        // Admin routes check X-API-Key via the AdminKey extractor
        .route("/admin/sweeps/lifecycle", post(sweeps::run_lifecycle_sweep))
        .route("/admin/sweeps/reminders", post(sweeps::run_reminder_sweep));

    let public_routes = Router::new()
        .route("/api/health", get(health::health_check))
        .route("/api/health/ready", get(health::ready))
        .route("/api/health/live", get(health::live))
        .route("/metrics", get(metrics_handler));

    Router::new()
        .merge(public_routes)
        .nest("/api/v1", api_routes)
        // Bottom layers run first
        .layer(CompressionLayer::new())
        .layer(TimeoutLayer::new(Duration::from_secs(
            config.server.request_timeout_secs,
        )))
        .layer(middleware::from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(trace_id))
        .layer(cors_layer(&config.security.cors_origins))
        .with_state(state)
}

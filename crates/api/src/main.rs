use anyhow::{Context, Result};
use domain::{Engine, SystemClock};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use turnout_api::app::{create_app, AppState};
use turnout_api::config::Config;
use turnout_api::jobs::{JobScheduler, LifecycleSweepJob, PoolMetricsJob, ReminderSweepJob};
use turnout_api::middleware;
use turnout_api::services::{EmailService, OutboxNotifier};

const JOB_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(30);

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("Shutdown signal received");
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let config = Config::load()?;

    middleware::logging::init_logging(&config.logging);
    middleware::init_metrics().context("Failed to install Prometheus recorder")?;

    info!("Starting Turnout API v{}", env!("CARGO_PKG_VERSION"));

    let db_config = persistence::db::DatabaseConfig::from(&config.database);
    let pool = persistence::db::create_pool(&db_config).await?;

    info!("Running database migrations...");
    persistence::db::run_migrations(&pool).await?;
    info!("Migrations completed");

    let tokens = config
        .attendance
        .token_service()
        .context("Invalid attendance token secret")?;
    let engine = Engine::new(
        persistence::pg_stores(&pool),
        tokens,
        Arc::new(OutboxNotifier::new(pool.clone())),
        Arc::new(EmailService::new(config.email.clone())),
        Arc::new(SystemClock),
        config.engine_settings(),
    );

    let mut scheduler = JobScheduler::new();
    scheduler.register(PoolMetricsJob::new(pool.clone()));
    if config.scheduler.enabled {
        scheduler.register(LifecycleSweepJob::new(
            engine.lifecycle.clone(),
            config.scheduler.lifecycle_batch_limit,
            config.scheduler.lifecycle_interval_secs,
        ));
        scheduler.register(ReminderSweepJob::new(
            engine.reminders.clone(),
            config.scheduler.reminder_batch_limit,
            config.scheduler.reminder_interval_secs,
        ));
    } else {
        info!("Background sweeps disabled by configuration");
    }
    scheduler.start();

    let addr = config.socket_addr()?;
    let state = AppState::new(config, engine).context("Invalid JWT configuration")?;
    let app = create_app(state);

    info!("Server listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    scheduler.shutdown();
    scheduler.wait_for_shutdown(JOB_SHUTDOWN_TIMEOUT).await;
    info!("Server stopped");

    Ok(())
}

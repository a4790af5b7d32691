//! Persistence layer for the Turnout backend.
//!
//! This crate contains:
//! - Database connection management
//! - Entity definitions (database row mappings)
//! - PostgreSQL implementations of the domain store traits

pub mod db;
pub mod entities;
mod error;
pub mod metrics;
pub mod repositories;

use domain::store::Stores;
use sqlx::PgPool;
use std::sync::Arc;

use repositories::{
    EventRepository, IdentityRepository, ParticipantRepository, ReminderRepository,
    SweepLeaseRepository,
};

/// Builds the engine's store handles over one connection pool.
pub fn pg_stores(pool: &PgPool) -> Stores {
    Stores {
        events: Arc::new(EventRepository::new(pool.clone())),
        participants: Arc::new(ParticipantRepository::new(pool.clone())),
        reminders: Arc::new(ReminderRepository::new(pool.clone())),
        identities: Arc::new(IdentityRepository::new(pool.clone())),
        leases: Arc::new(SweepLeaseRepository::new(pool.clone())),
    }
}

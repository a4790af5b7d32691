//! Domain layer for the Turnout event engine.
//!
//! This crate contains:
//! - Domain models (Event, Participant, Reminder, Identity)
//! - The participant state machine and the services built on it
//! - Store traits and an in-memory store
//! - Domain error types

pub mod clock;
pub mod engine;
pub mod error;
pub mod models;
pub mod services;
pub mod store;

#[cfg(test)]
pub(crate) mod test_support;

pub use clock::{Clock, FixedClock, SystemClock};
pub use engine::{Engine, EngineSettings};
pub use error::{DomainError, DomainResult, ErrorKind};

//! HTTP route handlers.

pub mod attendance;
pub mod events;
pub mod health;
pub mod participants;
pub mod reminders;
pub mod sweeps;

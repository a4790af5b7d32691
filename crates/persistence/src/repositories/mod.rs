//! Repository implementations for database operations.

pub mod event;
pub mod identity;
pub mod participant;
pub mod reminder;
pub mod sweep_lease;

pub use event::EventRepository;
pub use identity::{IdentityRepository, NotificationRepository};
pub use participant::ParticipantRepository;
pub use reminder::ReminderRepository;
pub use sweep_lease::SweepLeaseRepository;

//! Engine services.
//!
//! Services hold `Arc` handles only and are cheap to clone.

pub mod admission;
pub mod attendance;
pub mod event;
pub mod lease;
pub mod lifecycle;
pub mod notification;
pub mod participant_registry;
pub mod reminder;

pub use admission::AdmissionController;
pub use attendance::{AttendanceRecorder, TokenTtls};
pub use event::EventService;
pub use lease::{LeaseGuard, SweepLease};
pub use lifecycle::{LifecycleScheduler, SweepReport};
pub use notification::{
    EmailGateway, EmailTemplate, Notification, NotificationGateway, NotificationKind,
    NotificationResult, RecordingGateway,
};
pub use participant_registry::{Actor, ParticipantRegistry};
pub use reminder::ReminderScheduler;

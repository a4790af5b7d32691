//! Entity definitions (database row mappings).

pub mod event;
pub mod identity;
pub mod participant;
pub mod reminder;

pub use event::{AdmissionPolicyRow, EventEntity, EventStatusDb, RegistrationStatusDb};
pub use identity::{IdentityEntity, NotificationEntity};
pub use participant::{ParticipantEntity, ParticipantRoleDb, ParticipantStatusDb, PaymentStatusDb};
pub use reminder::{ReminderEntity, ReminderOptionDb};

//! Domain models for the event lifecycle and attendance engine.

pub mod event;
pub mod identity;
pub mod participant;
pub mod reminder;

pub use event::{
    AdmissionPolicy, CreateEventRequest, Event, EventStatus, EventSummary, NewEvent,
    ParticipantCounts, RegistrationStatus, RegistrationToggleRequest,
};
pub use identity::{Identity, WalkInRequest};
pub use participant::{
    join_method, Admission, Decision, DecisionRequest, InviteParticipantRequest, NewParticipant,
    Participant, ParticipantRole, ParticipantStatus, PaymentStatus,
};
pub use reminder::{NewReminder, Reminder, ReminderOption, ScheduleReminderRequest};

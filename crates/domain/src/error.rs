//! Domain error taxonomy.

use shared::TokenError;
use thiserror::Error;
use uuid::Uuid;
use validator::ValidationErrors;

use crate::models::ParticipantStatus;
use crate::store::StoreError;

/// Coarse error category used by transports to pick a response class.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    NotFound,
    StateConflict,
    Authorization,
    Token,
    Internal,
}

/// Errors produced by engine operations.
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("User is already a participant of this event")]
    AlreadyMember,

    #[error("Event is not open to the public")]
    EventNotPublic,

    #[error("Event is not published")]
    EventNotPublished,

    #[error("Registration for this event is closed")]
    RegistrationClosed,

    #[error("Event is not accepting check-ins")]
    EventNotLive,

    #[error("User {0} is not a participant of this event")]
    NotAParticipant(Uuid),

    #[error("Participant is {current}, expected {expected}")]
    WrongStatus {
        current: ParticipantStatus,
        expected: ParticipantStatus,
    },

    #[error("Transition from {from} to {to} is not allowed")]
    IllegalTransition {
        from: ParticipantStatus,
        to: ParticipantStatus,
    },

    #[error("Organizer participation cannot be changed")]
    OrganizerImmutable,

    #[error("Invalid reminder option: {0}")]
    InvalidOption(String),

    #[error("An unsent reminder with this option already exists")]
    DuplicatePending,

    #[error("Sweep '{0}' is already running")]
    SweepInProgress(&'static str),

    #[error("Event cannot be {action} while {status}")]
    InvalidEventState {
        action: &'static str,
        status: crate::models::EventStatus,
    },

    #[error("Forbidden: {0}")]
    Forbidden(&'static str),

    #[error("Attendance token rejected: {0}")]
    TokenInvalid(#[from] TokenError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl DomainError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            DomainError::Validation(_) | DomainError::InvalidOption(_) => ErrorKind::Validation,
            DomainError::NotFound(_) | DomainError::NotAParticipant(_) => ErrorKind::NotFound,
            DomainError::AlreadyMember
            | DomainError::EventNotPublic
            | DomainError::EventNotPublished
            | DomainError::RegistrationClosed
            | DomainError::EventNotLive
            | DomainError::WrongStatus { .. }
            | DomainError::IllegalTransition { .. }
            | DomainError::OrganizerImmutable
            | DomainError::DuplicatePending
            | DomainError::SweepInProgress(_)
            | DomainError::InvalidEventState { .. } => ErrorKind::StateConflict,
            DomainError::Forbidden(_) => ErrorKind::Authorization,
            DomainError::TokenInvalid(_) => ErrorKind::Token,
            DomainError::Store(StoreError::UniqueViolation(_)) => ErrorKind::StateConflict,
            DomainError::Store(_) => ErrorKind::Internal,
        }
    }

    /// Stable machine-readable reason.
    pub fn code(&self) -> &'static str {
        match self {
            DomainError::Validation(_) => "validation_error",
            DomainError::NotFound(_) => "not_found",
            DomainError::AlreadyMember => "already_member",
            DomainError::EventNotPublic => "event_not_public",
            DomainError::EventNotPublished => "event_not_published",
            DomainError::RegistrationClosed => "registration_closed",
            DomainError::EventNotLive => "event_not_live",
            DomainError::NotAParticipant(_) => "not_a_participant",
            DomainError::WrongStatus { .. } => "wrong_status",
            DomainError::IllegalTransition { .. } => "illegal_transition",
            DomainError::OrganizerImmutable => "organizer_immutable",
            DomainError::InvalidOption(_) => "invalid_option",
            DomainError::DuplicatePending => "duplicate_pending",
            DomainError::SweepInProgress(_) => "sweep_in_progress",
            DomainError::InvalidEventState { .. } => "invalid_event_state",
            DomainError::Forbidden(_) => "forbidden",
            DomainError::TokenInvalid(reason) => reason.code(),
            DomainError::Store(StoreError::UniqueViolation(_)) => "conflict",
            DomainError::Store(_) => "internal_error",
        }
    }
}

impl From<ValidationErrors> for DomainError {
    fn from(errors: ValidationErrors) -> Self {
        let messages: Vec<String> = errors
            .field_errors()
            .into_iter()
            .flat_map(|(field, errs)| {
                errs.iter().map(move |e| match &e.message {
                    Some(msg) => format!("{}: {}", field, msg),
                    None => format!("{}: invalid", field),
                })
            })
            .collect();
        DomainError::Validation(messages.join(", "))
    }
}

impl From<validator::ValidationError> for DomainError {
    fn from(error: validator::ValidationError) -> Self {
        DomainError::Validation(
            error
                .message
                .map(|m| m.to_string())
                .unwrap_or_else(|| error.code.to_string()),
        )
    }
}

pub type DomainResult<T> = Result<T, DomainError>;

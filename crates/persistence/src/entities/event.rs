//! Event entity (database row mapping).

use chrono::{DateTime, Utc};
use domain::models::{AdmissionPolicy, Event, EventStatus, RegistrationStatus};
use sqlx::postgres::{PgHasArrayType, PgTypeInfo};
use sqlx::FromRow;
use uuid::Uuid;

/// Database enum for event_status that maps to PostgreSQL enum type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "event_status", rename_all = "lowercase")]
pub enum EventStatusDb {
    Draft,
    Published,
    Opened,
    Closed,
    Declined,
    Ended,
    Cancelled,
}

impl PgHasArrayType for EventStatusDb {
    fn array_type_info() -> PgTypeInfo {
        PgTypeInfo::with_name("_event_status")
    }
}

impl From<EventStatusDb> for EventStatus {
    fn from(db: EventStatusDb) -> Self {
        match db {
            EventStatusDb::Draft => EventStatus::Draft,
            EventStatusDb::Published => EventStatus::Published,
            EventStatusDb::Opened => EventStatus::Opened,
            EventStatusDb::Closed => EventStatus::Closed,
            EventStatusDb::Declined => EventStatus::Declined,
            EventStatusDb::Ended => EventStatus::Ended,
            EventStatusDb::Cancelled => EventStatus::Cancelled,
        }
    }
}

impl From<EventStatus> for EventStatusDb {
    fn from(status: EventStatus) -> Self {
        match status {
            EventStatus::Draft => EventStatusDb::Draft,
            EventStatus::Published => EventStatusDb::Published,
            EventStatus::Opened => EventStatusDb::Opened,
            EventStatus::Closed => EventStatusDb::Closed,
            EventStatus::Declined => EventStatusDb::Declined,
            EventStatus::Ended => EventStatusDb::Ended,
            EventStatus::Cancelled => EventStatusDb::Cancelled,
        }
    }
}

/// Database enum for registration_status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "registration_status", rename_all = "lowercase")]
pub enum RegistrationStatusDb {
    Opened,
    Closed,
}

impl From<RegistrationStatusDb> for RegistrationStatus {
    fn from(db: RegistrationStatusDb) -> Self {
        match db {
            RegistrationStatusDb::Opened => RegistrationStatus::Opened,
            RegistrationStatusDb::Closed => RegistrationStatus::Closed,
        }
    }
}

impl From<RegistrationStatus> for RegistrationStatusDb {
    fn from(status: RegistrationStatus) -> Self {
        match status {
            RegistrationStatus::Opened => RegistrationStatusDb::Opened,
            RegistrationStatus::Closed => RegistrationStatusDb::Closed,
        }
    }
}

/// Database row mapping for the events table.
#[derive(Debug, Clone, FromRow)]
pub struct EventEntity {
    pub id: Uuid,
    pub organizer_id: Uuid,
    pub title: String,
    pub status: EventStatusDb,
    pub registration_status: RegistrationStatusDb,
    pub start_datetime: DateTime<Utc>,
    pub end_datetime: DateTime<Utc>,
    pub max_participant: Option<i32>,
    pub auto_accept_registration: bool,
    pub is_public: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<EventEntity> for Event {
    fn from(entity: EventEntity) -> Self {
        Self {
            id: entity.id,
            organizer_id: entity.organizer_id,
            title: entity.title,
            status: entity.status.into(),
            registration_status: entity.registration_status.into(),
            start_datetime: entity.start_datetime,
            end_datetime: entity.end_datetime,
            max_participant: entity.max_participant,
            auto_accept_registration: entity.auto_accept_registration,
            is_public: entity.is_public,
            created_at: entity.created_at,
            updated_at: entity.updated_at,
        }
    }
}

/// Admission columns read under `FOR UPDATE` during a join.
#[derive(Debug, Clone, Copy, FromRow)]
pub struct AdmissionPolicyRow {
    pub auto_accept_registration: bool,
    pub max_participant: Option<i32>,
}

impl From<AdmissionPolicyRow> for AdmissionPolicy {
    fn from(row: AdmissionPolicyRow) -> Self {
        Self {
            auto_accept: row.auto_accept_registration,
            max_participant: row.max_participant,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_conversion_is_lossless() {
        for status in [
            EventStatus::Draft,
            EventStatus::Published,
            EventStatus::Opened,
            EventStatus::Closed,
            EventStatus::Declined,
            EventStatus::Ended,
            EventStatus::Cancelled,
        ] {
            assert_eq!(EventStatus::from(EventStatusDb::from(status)), status);
        }
    }
}

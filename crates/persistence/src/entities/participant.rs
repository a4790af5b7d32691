//! Participant entity (database row mapping).

use chrono::{DateTime, Utc};
use domain::models::{Participant, ParticipantRole, ParticipantStatus, PaymentStatus};
use sqlx::postgres::{PgHasArrayType, PgTypeInfo};
use sqlx::FromRow;
use uuid::Uuid;

/// Database enum for participant_role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "participant_role", rename_all = "lowercase")]
pub enum ParticipantRoleDb {
    Organizer,
    Committee,
    Speaker,
    Sponsor,
    Audience,
    Student,
    Teacher,
}

impl PgHasArrayType for ParticipantRoleDb {
    fn array_type_info() -> PgTypeInfo {
        PgTypeInfo::with_name("_participant_role")
    }
}

impl From<ParticipantRoleDb> for ParticipantRole {
    fn from(db: ParticipantRoleDb) -> Self {
        match db {
            ParticipantRoleDb::Organizer => ParticipantRole::Organizer,
            ParticipantRoleDb::Committee => ParticipantRole::Committee,
            ParticipantRoleDb::Speaker => ParticipantRole::Speaker,
            ParticipantRoleDb::Sponsor => ParticipantRole::Sponsor,
            ParticipantRoleDb::Audience => ParticipantRole::Audience,
            ParticipantRoleDb::Student => ParticipantRole::Student,
            ParticipantRoleDb::Teacher => ParticipantRole::Teacher,
        }
    }
}

impl From<ParticipantRole> for ParticipantRoleDb {
    fn from(role: ParticipantRole) -> Self {
        match role {
            ParticipantRole::Organizer => ParticipantRoleDb::Organizer,
            ParticipantRole::Committee => ParticipantRoleDb::Committee,
            ParticipantRole::Speaker => ParticipantRoleDb::Speaker,
            ParticipantRole::Sponsor => ParticipantRoleDb::Sponsor,
            ParticipantRole::Audience => ParticipantRoleDb::Audience,
            ParticipantRole::Student => ParticipantRoleDb::Student,
            ParticipantRole::Teacher => ParticipantRoleDb::Teacher,
        }
    }
}

/// Database enum for participant_status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "participant_status", rename_all = "lowercase")]
pub enum ParticipantStatusDb {
    Pending,
    Accepted,
    Rejected,
    Attended,
    Absent,
}

impl From<ParticipantStatusDb> for ParticipantStatus {
    fn from(db: ParticipantStatusDb) -> Self {
        match db {
            ParticipantStatusDb::Pending => ParticipantStatus::Pending,
            ParticipantStatusDb::Accepted => ParticipantStatus::Accepted,
            ParticipantStatusDb::Rejected => ParticipantStatus::Rejected,
            ParticipantStatusDb::Attended => ParticipantStatus::Attended,
            ParticipantStatusDb::Absent => ParticipantStatus::Absent,
        }
    }
}

impl From<ParticipantStatus> for ParticipantStatusDb {
    fn from(status: ParticipantStatus) -> Self {
        match status {
            ParticipantStatus::Pending => ParticipantStatusDb::Pending,
            ParticipantStatus::Accepted => ParticipantStatusDb::Accepted,
            ParticipantStatus::Rejected => ParticipantStatusDb::Rejected,
            ParticipantStatus::Attended => ParticipantStatusDb::Attended,
            ParticipantStatus::Absent => ParticipantStatusDb::Absent,
        }
    }
}

/// Database enum for payment_status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "payment_status", rename_all = "lowercase")]
pub enum PaymentStatusDb {
    Unpaid,
    Paid,
    Refunded,
    Waived,
}

impl From<PaymentStatusDb> for PaymentStatus {
    fn from(db: PaymentStatusDb) -> Self {
        match db {
            PaymentStatusDb::Unpaid => PaymentStatus::Unpaid,
            PaymentStatusDb::Paid => PaymentStatus::Paid,
            PaymentStatusDb::Refunded => PaymentStatus::Refunded,
            PaymentStatusDb::Waived => PaymentStatus::Waived,
        }
    }
}

/// Database row mapping for the participants table.
#[derive(Debug, Clone, FromRow)]
pub struct ParticipantEntity {
    pub id: Uuid,
    pub event_id: Uuid,
    pub user_id: Uuid,
    pub role: ParticipantRoleDb,
    pub status: ParticipantStatusDb,
    pub payment_status: Option<PaymentStatusDb>,
    pub join_method: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<ParticipantEntity> for Participant {
    fn from(entity: ParticipantEntity) -> Self {
        Self {
            id: entity.id,
            event_id: entity.event_id,
            user_id: entity.user_id,
            role: entity.role.into(),
            status: entity.status.into(),
            payment_status: entity.payment_status.map(Into::into),
            join_method: entity.join_method,
            created_at: entity.created_at,
            updated_at: entity.updated_at,
        }
    }
}

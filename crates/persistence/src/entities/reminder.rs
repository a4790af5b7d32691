//! Reminder entity (database row mapping).

use chrono::{DateTime, Utc};
use domain::models::{Reminder, ReminderOption};
use sqlx::FromRow;
use uuid::Uuid;

/// Database enum for reminder_option.
#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "reminder_option", rename_all = "snake_case")]
pub enum ReminderOptionDb {
    OneWeek,
    ThreeDays,
    OneDay,
}

impl From<ReminderOptionDb> for ReminderOption {
    fn from(db: ReminderOptionDb) -> Self {
        match db {
            ReminderOptionDb::OneWeek => ReminderOption::OneWeek,
            ReminderOptionDb::ThreeDays => ReminderOption::ThreeDays,
            ReminderOptionDb::OneDay => ReminderOption::OneDay,
        }
    }
}

impl From<ReminderOption> for ReminderOptionDb {
    fn from(option: ReminderOption) -> Self {
        match option {
            ReminderOption::OneWeek => ReminderOptionDb::OneWeek,
            ReminderOption::ThreeDays => ReminderOptionDb::ThreeDays,
            ReminderOption::OneDay => ReminderOptionDb::OneDay,
        }
    }
}

/// Database row mapping for the reminders table.
#[derive(Debug, Clone, FromRow)]
pub struct ReminderEntity {
    pub id: Uuid,
    pub event_id: Uuid,
    pub user_id: Uuid,
    pub option: ReminderOptionDb,
    pub remind_at: DateTime<Utc>,
    pub is_sent: bool,
    pub sent_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl From<ReminderEntity> for Reminder {
    fn from(entity: ReminderEntity) -> Self {
        Self {
            id: entity.id,
            event_id: entity.event_id,
            user_id: entity.user_id,
            option: entity.option.into(),
            remind_at: entity.remind_at,
            is_sent: entity.is_sent,
            sent_at: entity.sent_at,
            created_at: entity.created_at,
        }
    }
}

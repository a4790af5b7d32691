//! Event reminder models.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// How long before the event start a reminder fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReminderOption {
    OneWeek,
    ThreeDays,
    OneDay,
}

impl ReminderOption {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReminderOption::OneWeek => "one_week",
            ReminderOption::ThreeDays => "three_days",
            ReminderOption::OneDay => "one_day",
        }
    }

    pub fn offset(&self) -> Duration {
        match self {
            ReminderOption::OneWeek => Duration::days(7),
            ReminderOption::ThreeDays => Duration::days(3),
            ReminderOption::OneDay => Duration::days(1),
        }
    }

    pub fn remind_at(&self, event_start: DateTime<Utc>) -> DateTime<Utc> {
        event_start - self.offset()
    }
}

impl FromStr for ReminderOption {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "one_week" => Ok(ReminderOption::OneWeek),
            "three_days" => Ok(ReminderOption::ThreeDays),
            "one_day" => Ok(ReminderOption::OneDay),
            _ => Err(s.to_string()),
        }
    }
}

impl fmt::Display for ReminderOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A scheduled reminder for one user and one event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Reminder {
    pub id: Uuid,
    pub event_id: Uuid,
    pub user_id: Uuid,
    pub option: ReminderOption,
    pub remind_at: DateTime<Utc>,
    pub is_sent: bool,
    pub sent_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewReminder {
    pub event_id: Uuid,
    pub user_id: Uuid,
    pub option: ReminderOption,
    pub remind_at: DateTime<Utc>,
}

/// Request payload for scheduling a reminder.
///
/// `option` is kept as a string so unknown values surface as `InvalidOption`
/// rather than a generic deserialization failure.
#[derive(Debug, Clone, Deserialize)]
pub struct ScheduleReminderRequest {
    pub option: String,
}

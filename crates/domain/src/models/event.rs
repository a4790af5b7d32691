//! Event domain models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;
use validator::Validate;

use super::participant::ParticipantStatus;

/// Lifecycle status of an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventStatus {
    Draft,
    Published,
    Opened,
    Closed,
    Declined,
    Ended,
    Cancelled,
}

impl EventStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventStatus::Draft => "draft",
            EventStatus::Published => "published",
            EventStatus::Opened => "opened",
            EventStatus::Closed => "closed",
            EventStatus::Declined => "declined",
            EventStatus::Ended => "ended",
            EventStatus::Cancelled => "cancelled",
        }
    }

    /// Statuses in which attendance may still be recorded.
    pub fn accepts_check_in(&self) -> bool {
        matches!(
            self,
            EventStatus::Published | EventStatus::Opened | EventStatus::Closed
        )
    }

    /// Statuses in which the event is still being prepared or run.
    pub fn is_active(&self) -> bool {
        matches!(
            self,
            EventStatus::Draft | EventStatus::Published | EventStatus::Opened | EventStatus::Closed
        )
    }
}

impl FromStr for EventStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "draft" => Ok(EventStatus::Draft),
            "published" => Ok(EventStatus::Published),
            "opened" => Ok(EventStatus::Opened),
            "closed" => Ok(EventStatus::Closed),
            "declined" => Ok(EventStatus::Declined),
            "ended" => Ok(EventStatus::Ended),
            "cancelled" => Ok(EventStatus::Cancelled),
            _ => Err(format!("Invalid event status: {}", s)),
        }
    }
}

impl fmt::Display for EventStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Whether new registrations are accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RegistrationStatus {
    Opened,
    Closed,
}

impl RegistrationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RegistrationStatus::Opened => "opened",
            RegistrationStatus::Closed => "closed",
        }
    }
}

impl fmt::Display for RegistrationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// An event with a bounded time window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Event {
    pub id: Uuid,
    pub organizer_id: Uuid,
    pub title: String,
    pub status: EventStatus,
    pub registration_status: RegistrationStatus,
    pub start_datetime: DateTime<Utc>,
    pub end_datetime: DateTime<Utc>,
    pub max_participant: Option<i32>,
    pub auto_accept_registration: bool,
    pub is_public: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Event {
    /// Check-in is open until the end instant inclusive. There is no lower bound.
    pub fn is_live_at(&self, now: DateTime<Utc>) -> bool {
        self.status.accepts_check_in() && now <= self.end_datetime
    }

    pub fn admission_policy(&self) -> AdmissionPolicy {
        AdmissionPolicy {
            auto_accept: self.auto_accept_registration,
            max_participant: self.max_participant,
        }
    }
}

/// Join policy evaluated while the event row is locked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdmissionPolicy {
    pub auto_accept: bool,
    pub max_participant: Option<i32>,
}

impl AdmissionPolicy {
    /// Status a new joiner receives given the current number of accepted participants.
    pub fn status_for(&self, accepted_count: i64) -> ParticipantStatus {
        if !self.auto_accept {
            return ParticipantStatus::Pending;
        }
        match self.max_participant {
            Some(max) if accepted_count >= i64::from(max) => ParticipantStatus::Pending,
            _ => ParticipantStatus::Accepted,
        }
    }
}

/// Data needed to insert an event row.
#[derive(Debug, Clone)]
pub struct NewEvent {
    pub organizer_id: Uuid,
    pub title: String,
    pub start_datetime: DateTime<Utc>,
    pub end_datetime: DateTime<Utc>,
    pub max_participant: Option<i32>,
    pub auto_accept_registration: bool,
    pub is_public: bool,
}

/// Request payload for creating an event.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "snake_case")]
pub struct CreateEventRequest {
    #[validate(length(
        min = 1,
        max = 200,
        message = "Title must be between 1 and 200 characters"
    ))]
    pub title: String,

    pub start_datetime: DateTime<Utc>,

    pub end_datetime: DateTime<Utc>,

    #[validate(range(min = 1, message = "max_participant must be at least 1"))]
    pub max_participant: Option<i32>,

    #[serde(default)]
    pub auto_accept_registration: bool,

    #[serde(default = "default_is_public")]
    pub is_public: bool,
}

fn default_is_public() -> bool {
    true
}

/// Request payload for toggling registration.
#[derive(Debug, Clone, Deserialize)]
pub struct RegistrationToggleRequest {
    pub open: bool,
}

/// Number of participants per status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ParticipantCounts {
    pub pending: i64,
    pub accepted: i64,
    pub rejected: i64,
    pub attended: i64,
    pub absent: i64,
}

impl ParticipantCounts {
    pub fn add(&mut self, status: ParticipantStatus, n: i64) {
        match status {
            ParticipantStatus::Pending => self.pending += n,
            ParticipantStatus::Accepted => self.accepted += n,
            ParticipantStatus::Rejected => self.rejected += n,
            ParticipantStatus::Attended => self.attended += n,
            ParticipantStatus::Absent => self.absent += n,
        }
    }

    /// Public participant count. Same rule as the capacity check: accepted only.
    pub fn public_count(&self) -> i64 {
        self.accepted
    }
}

/// Event detail with participant counts.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct EventSummary {
    pub event: Event,
    pub counts: ParticipantCounts,
    pub participant_count: i64,
    /// None when the event has no capacity limit.
    pub seats_remaining: Option<i64>,
}

impl EventSummary {
    pub fn new(event: Event, counts: ParticipantCounts) -> Self {
        let participant_count = counts.public_count();
        let seats_remaining = event
            .max_participant
            .map(|max| (i64::from(max) - counts.accepted).max(0));
        Self {
            event,
            counts,
            participant_count,
            seats_remaining,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn sample_event(status: EventStatus) -> Event {
        let now = Utc::now();
        Event {
            id: Uuid::new_v4(),
            organizer_id: Uuid::new_v4(),
            title: "Rust meetup".to_string(),
            status,
            registration_status: RegistrationStatus::Opened,
            start_datetime: now + Duration::hours(1),
            end_datetime: now + Duration::hours(3),
            max_participant: Some(10),
            auto_accept_registration: true,
            is_public: true,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_policy_without_auto_accept_is_pending() {
        let policy = AdmissionPolicy {
            auto_accept: false,
            max_participant: None,
        };
        assert_eq!(policy.status_for(0), ParticipantStatus::Pending);
    }

    #[test]
    fn test_policy_capacity() {
        let policy = AdmissionPolicy {
            auto_accept: true,
            max_participant: Some(1),
        };
        assert_eq!(policy.status_for(0), ParticipantStatus::Accepted);
        assert_eq!(policy.status_for(1), ParticipantStatus::Pending);
        assert_eq!(policy.status_for(5), ParticipantStatus::Pending);
    }

    #[test]
    fn test_policy_unbounded() {
        let policy = AdmissionPolicy {
            auto_accept: true,
            max_participant: None,
        };
        assert_eq!(policy.status_for(10_000), ParticipantStatus::Accepted);
    }

    #[test]
    fn test_live_window_is_inclusive_and_unbounded_below() {
        let event = sample_event(EventStatus::Published);
        assert!(event.is_live_at(event.start_datetime - Duration::days(2)));
        assert!(event.is_live_at(event.end_datetime));
        assert!(!event.is_live_at(event.end_datetime + Duration::seconds(1)));
    }

    #[test]
    fn test_live_window_requires_check_in_status() {
        let now = Utc::now();
        for status in [EventStatus::Draft, EventStatus::Ended, EventStatus::Cancelled, EventStatus::Declined] {
            assert!(!sample_event(status).is_live_at(now));
        }
    }

    #[test]
    fn test_summary_counts() {
        let event = sample_event(EventStatus::Published);
        let mut counts = ParticipantCounts::default();
        counts.add(ParticipantStatus::Accepted, 3);
        counts.add(ParticipantStatus::Pending, 4);

        let summary = EventSummary::new(event, counts);
        assert_eq!(summary.participant_count, 3);
        assert_eq!(summary.seats_remaining, Some(7));
    }

    #[test]
    fn test_event_status_parse() {
        assert_eq!("Published".parse::<EventStatus>().unwrap(), EventStatus::Published);
        assert!("archived".parse::<EventStatus>().is_err());
    }
}

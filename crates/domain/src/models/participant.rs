//! Participant domain models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Provenance tags stored in `join_method`.
pub mod join_method {
    pub const SELF_JOIN: &str = "self_join";
    pub const INVITE: &str = "invite";
    pub const WALK_IN: &str = "walk_in";
    pub const ORGANIZER: &str = "organizer";
}

/// Role a participant plays at an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParticipantRole {
    Organizer,
    Committee,
    Speaker,
    Sponsor,
    Audience,
    Student,
    Teacher,
}

impl ParticipantRole {
    /// General attendees, as opposed to organizing or promotional roles.
    pub const AUDIENCE_LIKE: [ParticipantRole; 3] = [
        ParticipantRole::Audience,
        ParticipantRole::Student,
        ParticipantRole::Teacher,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ParticipantRole::Organizer => "organizer",
            ParticipantRole::Committee => "committee",
            ParticipantRole::Speaker => "speaker",
            ParticipantRole::Sponsor => "sponsor",
            ParticipantRole::Audience => "audience",
            ParticipantRole::Student => "student",
            ParticipantRole::Teacher => "teacher",
        }
    }

    pub fn is_audience_like(&self) -> bool {
        matches!(
            self,
            ParticipantRole::Audience | ParticipantRole::Student | ParticipantRole::Teacher
        )
    }

    /// Returns true if this role may moderate participants and confirm attendance.
    pub fn can_manage_event(&self) -> bool {
        matches!(self, ParticipantRole::Organizer | ParticipantRole::Committee)
    }

    /// Organizer records never change role or status after creation.
    pub fn is_immutable(&self) -> bool {
        matches!(self, ParticipantRole::Organizer)
    }
}

impl FromStr for ParticipantRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "organizer" => Ok(ParticipantRole::Organizer),
            "committee" => Ok(ParticipantRole::Committee),
            "speaker" => Ok(ParticipantRole::Speaker),
            "sponsor" => Ok(ParticipantRole::Sponsor),
            "audience" => Ok(ParticipantRole::Audience),
            "student" => Ok(ParticipantRole::Student),
            "teacher" => Ok(ParticipantRole::Teacher),
            _ => Err(format!("Invalid participant role: {}", s)),
        }
    }
}

impl fmt::Display for ParticipantRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Participation status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParticipantStatus {
    Pending,
    Accepted,
    Rejected,
    Attended,
    Absent,
}

impl ParticipantStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ParticipantStatus::Pending => "pending",
            ParticipantStatus::Accepted => "accepted",
            ParticipantStatus::Rejected => "rejected",
            ParticipantStatus::Attended => "attended",
            ParticipantStatus::Absent => "absent",
        }
    }
}

impl FromStr for ParticipantStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pending" => Ok(ParticipantStatus::Pending),
            "accepted" => Ok(ParticipantStatus::Accepted),
            "rejected" => Ok(ParticipantStatus::Rejected),
            "attended" => Ok(ParticipantStatus::Attended),
            "absent" => Ok(ParticipantStatus::Absent),
            _ => Err(format!("Invalid participant status: {}", s)),
        }
    }
}

impl fmt::Display for ParticipantStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Payment state, orthogonal to participation status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Unpaid,
    Paid,
    Refunded,
    Waived,
}

/// A user's participation in an event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Participant {
    pub id: Uuid,
    pub event_id: Uuid,
    pub user_id: Uuid,
    pub role: ParticipantRole,
    pub status: ParticipantStatus,
    pub payment_status: Option<PaymentStatus>,
    pub join_method: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Data needed to insert a participant row.
#[derive(Debug, Clone)]
pub struct NewParticipant {
    pub event_id: Uuid,
    pub user_id: Uuid,
    pub role: ParticipantRole,
    pub join_method: &'static str,
}

/// Outcome of an admission attempt.
#[derive(Debug, Clone)]
pub struct Admission {
    pub participant: Participant,
    /// False when an existing participant was returned unchanged.
    pub created: bool,
}

/// Answer to an invitation or a pending registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Decision {
    Accept,
    Reject,
}

impl Decision {
    pub fn target_status(&self) -> ParticipantStatus {
        match self {
            Decision::Accept => ParticipantStatus::Accepted,
            Decision::Reject => ParticipantStatus::Rejected,
        }
    }
}

/// Request payload for inviting a user to an event.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct InviteParticipantRequest {
    pub user_id: Uuid,
    /// Defaults to audience.
    pub role: Option<ParticipantRole>,
}

/// Request payload for answering an invitation or moderating a registration.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct DecisionRequest {
    pub decision: Decision,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_audience_like_roles() {
        for role in ParticipantRole::AUDIENCE_LIKE {
            assert!(role.is_audience_like());
        }
        assert!(!ParticipantRole::Organizer.is_audience_like());
        assert!(!ParticipantRole::Committee.is_audience_like());
        assert!(!ParticipantRole::Speaker.is_audience_like());
        assert!(!ParticipantRole::Sponsor.is_audience_like());
    }

    #[test]
    fn test_manage_and_immutability() {
        assert!(ParticipantRole::Organizer.can_manage_event());
        assert!(ParticipantRole::Committee.can_manage_event());
        assert!(!ParticipantRole::Audience.can_manage_event());
        assert!(ParticipantRole::Organizer.is_immutable());
        assert!(!ParticipantRole::Committee.is_immutable());
    }

    #[test]
    fn test_role_round_trip_through_str() {
        for role in [
            ParticipantRole::Organizer,
            ParticipantRole::Committee,
            ParticipantRole::Speaker,
            ParticipantRole::Sponsor,
            ParticipantRole::Audience,
            ParticipantRole::Student,
            ParticipantRole::Teacher,
        ] {
            assert_eq!(role.as_str().parse::<ParticipantRole>().unwrap(), role);
        }
        assert!("guest".parse::<ParticipantRole>().is_err());
    }

    #[test]
    fn test_status_parse_is_case_insensitive() {
        assert_eq!(
            "ATTENDED".parse::<ParticipantStatus>().unwrap(),
            ParticipantStatus::Attended
        );
        assert!("maybe".parse::<ParticipantStatus>().is_err());
    }

    #[test]
    fn test_decision_target_status() {
        assert_eq!(Decision::Accept.target_status(), ParticipantStatus::Accepted);
        assert_eq!(Decision::Reject.target_status(), ParticipantStatus::Rejected);
    }

    #[test]
    fn test_status_serializes_lowercase() {
        let json = serde_json::to_string(&ParticipantStatus::Absent).unwrap();
        assert_eq!(json, "\"absent\"");
    }
}

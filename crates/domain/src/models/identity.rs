//! Minimal projection of the external identity service.

use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// A person the engine can notify and record attendance for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Identity {
    pub id: Uuid,
    pub email: String,
    pub display_name: String,
    /// False for identities first seen at a walk-in check-in.
    pub registered: bool,
}

/// Request payload for recording an on-site attendee.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "snake_case")]
pub struct WalkInRequest {
    #[validate(length(min = 1, max = 100, message = "Name must be between 1 and 100 characters"))]
    pub name: String,

    #[validate(email(message = "Email address is not valid"))]
    pub email: String,
}

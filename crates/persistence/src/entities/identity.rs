//! Identity and notification entities.

use chrono::{DateTime, Utc};
use domain::models::Identity;
use sqlx::FromRow;
use uuid::Uuid;

/// Database row mapping for the identities table.
#[derive(Debug, Clone, FromRow)]
pub struct IdentityEntity {
    pub id: Uuid,
    pub email: String,
    pub display_name: String,
    pub registered: bool,
    pub created_at: DateTime<Utc>,
}

impl From<IdentityEntity> for Identity {
    fn from(entity: IdentityEntity) -> Self {
        Self {
            id: entity.id,
            email: entity.email,
            display_name: entity.display_name,
            registered: entity.registered,
        }
    }
}

/// Database row mapping for the notifications outbox.
#[derive(Debug, Clone, FromRow)]
pub struct NotificationEntity {
    pub id: Uuid,
    pub recipient_id: Uuid,
    pub kind: String,
    pub content: String,
    pub link: String,
    pub created_at: DateTime<Utc>,
    pub read_at: Option<DateTime<Utc>>,
}

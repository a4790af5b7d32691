//! Identity and notification outbox repositories.

use async_trait::async_trait;
use domain::models::Identity;
use domain::services::Notification;
use domain::store::{IdentityStore, StoreError};
use sqlx::PgPool;
use uuid::Uuid;

use crate::entities::{IdentityEntity, NotificationEntity};
use crate::error::map_db_error;
use crate::metrics::QueryTimer;

/// Repository for the local identity projection.
#[derive(Clone)]
pub struct IdentityRepository {
    pool: PgPool,
}

impl IdentityRepository {
    /// Creates a new IdentityRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl IdentityStore for IdentityRepository {
    async fn find_identity(&self, id: Uuid) -> Result<Option<Identity>, StoreError> {
        let timer = QueryTimer::new("find_identity_by_id");
        let result = sqlx::query_as::<_, IdentityEntity>(
            r#"
            SELECT id, email, display_name, registered, created_at
            FROM identities
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        Ok(result.map_err(map_db_error)?.map(Into::into))
    }

    async fn resolve_or_create(
        &self,
        email: &str,
        display_name: &str,
    ) -> Result<Identity, StoreError> {
        let timer = QueryTimer::new("resolve_or_create_identity");
        // The no-op update makes RETURNING yield the existing row on conflict
        let result = sqlx::query_as::<_, IdentityEntity>(
            r#"
            INSERT INTO identities (email, display_name, registered)
            VALUES ($1, $2, FALSE)
            ON CONFLICT (email) DO UPDATE SET email = EXCLUDED.email
            RETURNING id, email, display_name, registered, created_at
            "#,
        )
        .bind(email)
        .bind(display_name)
        .fetch_one(&self.pool)
        .await;
        timer.record();
        Ok(result.map_err(map_db_error)?.into())
    }
}

/// Repository for the in-app notification outbox.
#[derive(Clone)]
pub struct NotificationRepository {
    pool: PgPool,
}

impl NotificationRepository {
    /// Creates a new NotificationRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Appends a notification to the recipient's inbox.
    pub async fn insert(&self, notification: &Notification) -> Result<NotificationEntity, sqlx::Error> {
        let timer = QueryTimer::new("insert_notification");
        let result = sqlx::query_as::<_, NotificationEntity>(
            r#"
            INSERT INTO notifications (recipient_id, kind, content, link)
            VALUES ($1, $2, $3, $4)
            RETURNING id, recipient_id, kind, content, link, created_at, read_at
            "#,
        )
        .bind(notification.recipient_id)
        .bind(notification.kind.as_str())
        .bind(&notification.content)
        .bind(&notification.link)
        .fetch_one(&self.pool)
        .await;
        timer.record();
        result
    }
}

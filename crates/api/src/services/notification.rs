//! In-app notification delivery through the database outbox.

use async_trait::async_trait;
use domain::services::{Notification, NotificationGateway, NotificationResult};
use persistence::repositories::NotificationRepository;
use sqlx::PgPool;

/// Writes notifications to the `notifications` table read by the client apps.
#[derive(Clone)]
pub struct OutboxNotifier {
    repo: NotificationRepository,
}

impl OutboxNotifier {
    pub fn new(pool: PgPool) -> Self {
        Self {
            repo: NotificationRepository::new(pool),
        }
    }
}

#[async_trait]
impl NotificationGateway for OutboxNotifier {
    async fn enqueue(&self, notification: Notification) -> NotificationResult {
        match self.repo.insert(&notification).await {
            Ok(row) => {
                tracing::debug!(
                    notification_id = %row.id,
                    recipient_id = %row.recipient_id,
                    kind = %notification.kind,
                    "Notification enqueued"
                );
                NotificationResult::Sent
            }
            Err(e) => NotificationResult::Failed(e.to_string()),
        }
    }
}

//! Reminder repository for database operations.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use domain::models::{NewReminder, Reminder};
use domain::store::{ReminderStore, StoreError};
use sqlx::PgPool;
use uuid::Uuid;

use crate::entities::{ReminderEntity, ReminderOptionDb};
use crate::error::map_db_error;
use crate::metrics::QueryTimer;

/// Repository for reminder rows.
#[derive(Clone)]
pub struct ReminderRepository {
    pool: PgPool,
}

impl ReminderRepository {
    /// Creates a new ReminderRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ReminderStore for ReminderRepository {
    async fn insert_reminder(
        &self,
        new: NewReminder,
        now: DateTime<Utc>,
    ) -> Result<Reminder, StoreError> {
        let timer = QueryTimer::new("insert_reminder");
        // reminders_unsent_unique rejects a second unsent row for the same option
        let result = sqlx::query_as::<_, ReminderEntity>(
            r#"
            INSERT INTO reminders (event_id, user_id, option, remind_at, created_at)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, event_id, user_id, option, remind_at, is_sent, sent_at, created_at
            "#,
        )
        .bind(new.event_id)
        .bind(new.user_id)
        .bind(ReminderOptionDb::from(new.option))
        .bind(new.remind_at)
        .bind(now)
        .fetch_one(&self.pool)
        .await;
        timer.record();
        Ok(result.map_err(map_db_error)?.into())
    }

    async fn list_reminders_for_user(&self, user_id: Uuid) -> Result<Vec<Reminder>, StoreError> {
        let timer = QueryTimer::new("list_reminders_for_user");
        let result = sqlx::query_as::<_, ReminderEntity>(
            r#"
            SELECT id, event_id, user_id, option, remind_at, is_sent, sent_at, created_at
            FROM reminders
            WHERE user_id = $1
            ORDER BY remind_at
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await;
        timer.record();
        Ok(result
            .map_err(map_db_error)?
            .into_iter()
            .map(Into::into)
            .collect())
    }

    async fn claim_due(
        &self,
        user_id: Option<Uuid>,
        now: DateTime<Utc>,
        limit: i64,
    ) -> Result<Vec<Reminder>, StoreError> {
        let timer = QueryTimer::new("claim_due_reminders");
        let result = sqlx::query_as::<_, ReminderEntity>(
            r#"
            UPDATE reminders
            SET is_sent = TRUE, sent_at = $1
            WHERE id IN (
                SELECT id
                FROM reminders
                WHERE is_sent = FALSE
                  AND remind_at <= $1
                  AND ($2::uuid IS NULL OR user_id = $2)
                ORDER BY remind_at
                LIMIT $3
                FOR UPDATE SKIP LOCKED
            )
            RETURNING id, event_id, user_id, option, remind_at, is_sent, sent_at, created_at
            "#,
        )
        .bind(now)
        .bind(user_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await;
        timer.record();

        // RETURNING does not preserve the subquery order
        let mut claimed: Vec<Reminder> = result
            .map_err(map_db_error)?
            .into_iter()
            .map(Into::into)
            .collect();
        claimed.sort_by_key(|r| r.remind_at);
        Ok(claimed)
    }
}

//! Event repository for database operations.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use domain::models::{Event, EventStatus, NewEvent, ParticipantRole, RegistrationStatus};
use domain::store::{EndedEvent, EventStore, StoreError};
use sqlx::PgPool;
use uuid::Uuid;

use crate::entities::{
    EventEntity, EventStatusDb, ParticipantEntity, ParticipantRoleDb, RegistrationStatusDb,
};
use crate::error::map_db_error;
use crate::metrics::QueryTimer;

/// Repository for event rows.
#[derive(Clone)]
pub struct EventRepository {
    pool: PgPool,
}

impl EventRepository {
    /// Creates a new EventRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl EventStore for EventRepository {
    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(map_db_error)?;
        Ok(())
    }

    async fn insert_event(&self, new: NewEvent, now: DateTime<Utc>) -> Result<Event, StoreError> {
        let timer = QueryTimer::new("insert_event");

        // Event and organizer participant are created atomically
        let mut tx = self.pool.begin().await.map_err(map_db_error)?;

        let event = sqlx::query_as::<_, EventEntity>(
            r#"
            INSERT INTO events (organizer_id, title, start_datetime, end_datetime, max_participant,
                                auto_accept_registration, is_public, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $8)
            RETURNING id, organizer_id, title, status, registration_status, start_datetime, end_datetime,
                      max_participant, auto_accept_registration, is_public, created_at, updated_at
            "#,
        )
        .bind(new.organizer_id)
        .bind(&new.title)
        .bind(new.start_datetime)
        .bind(new.end_datetime)
        .bind(new.max_participant)
        .bind(new.auto_accept_registration)
        .bind(new.is_public)
        .bind(now)
        .fetch_one(&mut *tx)
        .await
        .map_err(map_db_error)?;

        sqlx::query(
            r#"
            INSERT INTO participants (event_id, user_id, role, status, join_method, created_at, updated_at)
            VALUES ($1, $2, 'organizer', 'accepted', 'organizer', $3, $3)
            "#,
        )
        .bind(event.id)
        .bind(new.organizer_id)
        .bind(now)
        .execute(&mut *tx)
        .await
        .map_err(map_db_error)?;

        tx.commit().await.map_err(map_db_error)?;
        timer.record();
        Ok(event.into())
    }

    async fn find_event(&self, id: Uuid) -> Result<Option<Event>, StoreError> {
        let timer = QueryTimer::new("find_event_by_id");
        let result = sqlx::query_as::<_, EventEntity>(
            r#"
            SELECT id, organizer_id, title, status, registration_status, start_datetime, end_datetime,
                   max_participant, auto_accept_registration, is_public, created_at, updated_at
            FROM events
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        Ok(result.map_err(map_db_error)?.map(Into::into))
    }

    async fn update_event_status(
        &self,
        id: Uuid,
        expected: &[EventStatus],
        to: EventStatus,
        now: DateTime<Utc>,
    ) -> Result<Option<Event>, StoreError> {
        let timer = QueryTimer::new("update_event_status");
        let expected: Vec<EventStatusDb> = expected.iter().copied().map(Into::into).collect();
        let result = sqlx::query_as::<_, EventEntity>(
            r#"
            UPDATE events
            SET status = $3, updated_at = $4
            WHERE id = $1 AND status = ANY($2)
            RETURNING id, organizer_id, title, status, registration_status, start_datetime, end_datetime,
                      max_participant, auto_accept_registration, is_public, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(expected)
        .bind(EventStatusDb::from(to))
        .bind(now)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        Ok(result.map_err(map_db_error)?.map(Into::into))
    }

    async fn set_registration_status(
        &self,
        id: Uuid,
        status: RegistrationStatus,
        now: DateTime<Utc>,
    ) -> Result<Option<Event>, StoreError> {
        let timer = QueryTimer::new("set_registration_status");
        let result = sqlx::query_as::<_, EventEntity>(
            r#"
            UPDATE events
            SET registration_status = $2, updated_at = $3
            WHERE id = $1
            RETURNING id, organizer_id, title, status, registration_status, start_datetime, end_datetime,
                      max_participant, auto_accept_registration, is_public, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(RegistrationStatusDb::from(status))
        .bind(now)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        Ok(result.map_err(map_db_error)?.map(Into::into))
    }

    async fn events_due_for_registration_close(
        &self,
        now: DateTime<Utc>,
        limit: i64,
    ) -> Result<Vec<Uuid>, StoreError> {
        let timer = QueryTimer::new("events_due_for_registration_close");
        let result = sqlx::query_scalar::<_, Uuid>(
            r#"
            SELECT id
            FROM events
            WHERE status = 'published' AND registration_status = 'opened' AND start_datetime <= $1
            ORDER BY start_datetime
            LIMIT $2
            "#,
        )
        .bind(now)
        .bind(limit)
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result.map_err(map_db_error)
    }

    async fn close_registration_if_due(
        &self,
        id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<bool, StoreError> {
        let timer = QueryTimer::new("close_registration_if_due");
        let result = sqlx::query(
            r#"
            UPDATE events
            SET registration_status = 'closed', updated_at = $2
            WHERE id = $1
              AND status = 'published'
              AND registration_status = 'opened'
              AND start_datetime <= $2
            "#,
        )
        .bind(id)
        .bind(now)
        .execute(&self.pool)
        .await;
        timer.record();
        Ok(result.map_err(map_db_error)?.rows_affected() == 1)
    }

    async fn events_due_to_end(
        &self,
        now: DateTime<Utc>,
        limit: i64,
    ) -> Result<Vec<Uuid>, StoreError> {
        let timer = QueryTimer::new("events_due_to_end");
        let result = sqlx::query_scalar::<_, Uuid>(
            r#"
            SELECT id
            FROM events
            WHERE status = 'published' AND end_datetime < $1
            ORDER BY end_datetime
            LIMIT $2
            "#,
        )
        .bind(now)
        .bind(limit)
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result.map_err(map_db_error)
    }

    async fn end_event_marking_absent(
        &self,
        id: Uuid,
        now: DateTime<Utc>,
        roles: &[ParticipantRole],
    ) -> Result<Option<EndedEvent>, StoreError> {
        let timer = QueryTimer::new("end_event_marking_absent");
        let mut tx = self.pool.begin().await.map_err(map_db_error)?;

        let ended = sqlx::query_as::<_, EventEntity>(
            r#"
            UPDATE events
            SET status = 'ended', updated_at = $2
            WHERE id = $1 AND status = 'published' AND end_datetime < $2
            RETURNING id, organizer_id, title, status, registration_status, start_datetime, end_datetime,
                      max_participant, auto_accept_registration, is_public, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(now)
        .fetch_optional(&mut *tx)
        .await
        .map_err(map_db_error)?;

        let Some(event) = ended else {
            tx.rollback().await.map_err(map_db_error)?;
            timer.record();
            return Ok(None);
        };

        let roles: Vec<ParticipantRoleDb> = roles.iter().copied().map(Into::into).collect();
        let absentees = sqlx::query_as::<_, ParticipantEntity>(
            r#"
            UPDATE participants
            SET status = 'absent', updated_at = $2
            WHERE event_id = $1
              AND status = 'accepted'
              AND role = ANY($3)
              AND role <> 'organizer'
            RETURNING id, event_id, user_id, role, status, payment_status, join_method, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(now)
        .bind(roles)
        .fetch_all(&mut *tx)
        .await
        .map_err(map_db_error)?;

        tx.commit().await.map_err(map_db_error)?;
        timer.record();
        Ok(Some(EndedEvent {
            event: event.into(),
            absentees: absentees.into_iter().map(Into::into).collect(),
        }))
    }
}

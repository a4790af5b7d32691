//! Participant repository for database operations.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use domain::models::{
    Admission, AdmissionPolicy, NewParticipant, Participant, ParticipantCounts, ParticipantStatus,
};
use domain::store::{ParticipantStore, StoreError};
use sqlx::PgPool;
use uuid::Uuid;

use crate::entities::{
    AdmissionPolicyRow, ParticipantEntity, ParticipantRoleDb, ParticipantStatusDb,
};
use crate::error::map_db_error;
use crate::metrics::QueryTimer;

/// Repository for participant rows.
#[derive(Clone)]
pub struct ParticipantRepository {
    pool: PgPool,
}

impl ParticipantRepository {
    /// Creates a new ParticipantRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ParticipantStore for ParticipantRepository {
    async fn find_participant(&self, id: Uuid) -> Result<Option<Participant>, StoreError> {
        let timer = QueryTimer::new("find_participant_by_id");
        let result = sqlx::query_as::<_, ParticipantEntity>(
            r#"
            SELECT id, event_id, user_id, role, status, payment_status, join_method, created_at, updated_at
            FROM participants
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        Ok(result.map_err(map_db_error)?.map(Into::into))
    }

    async fn find_by_event_and_user(
        &self,
        event_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<Participant>, StoreError> {
        let timer = QueryTimer::new("find_participant_by_event_and_user");
        let result = sqlx::query_as::<_, ParticipantEntity>(
            r#"
            SELECT id, event_id, user_id, role, status, payment_status, join_method, created_at, updated_at
            FROM participants
            WHERE event_id = $1 AND user_id = $2
            "#,
        )
        .bind(event_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        Ok(result.map_err(map_db_error)?.map(Into::into))
    }

    async fn list_for_event(&self, event_id: Uuid) -> Result<Vec<Participant>, StoreError> {
        let timer = QueryTimer::new("list_participants_for_event");
        let result = sqlx::query_as::<_, ParticipantEntity>(
            r#"
            SELECT id, event_id, user_id, role, status, payment_status, join_method, created_at, updated_at
            FROM participants
            WHERE event_id = $1
            ORDER BY created_at
            "#,
        )
        .bind(event_id)
        .fetch_all(&self.pool)
        .await;
        timer.record();
        Ok(result
            .map_err(map_db_error)?
            .into_iter()
            .map(Into::into)
            .collect())
    }

    async fn count_by_status(&self, event_id: Uuid) -> Result<ParticipantCounts, StoreError> {
        let timer = QueryTimer::new("count_participants_by_status");
        let rows = sqlx::query_as::<_, (ParticipantStatusDb, i64)>(
            r#"
            SELECT status, COUNT(*)
            FROM participants
            WHERE event_id = $1 AND role <> 'organizer'
            GROUP BY status
            "#,
        )
        .bind(event_id)
        .fetch_all(&self.pool)
        .await;
        timer.record();

        let mut counts = ParticipantCounts::default();
        for (status, n) in rows.map_err(map_db_error)? {
            counts.add(status.into(), n);
        }
        Ok(counts)
    }

    async fn admit(
        &self,
        new: NewParticipant,
        now: DateTime<Utc>,
    ) -> Result<Option<Admission>, StoreError> {
        let timer = QueryTimer::new("admit_participant");
        let mut tx = self.pool.begin().await.map_err(map_db_error)?;

        // Serialises capacity decisions per event
        let policy = sqlx::query_as::<_, AdmissionPolicyRow>(
            r#"
            SELECT auto_accept_registration, max_participant
            FROM events
            WHERE id = $1
            FOR UPDATE
            "#,
        )
        .bind(new.event_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(map_db_error)?;
        let Some(policy) = policy.map(AdmissionPolicy::from) else {
            tx.rollback().await.map_err(map_db_error)?;
            timer.record();
            return Ok(None);
        };

        let existing = sqlx::query_as::<_, ParticipantEntity>(
            r#"
            SELECT id, event_id, user_id, role, status, payment_status, join_method, created_at, updated_at
            FROM participants
            WHERE event_id = $1 AND user_id = $2
            "#,
        )
        .bind(new.event_id)
        .bind(new.user_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(map_db_error)?;
        if let Some(existing) = existing {
            tx.commit().await.map_err(map_db_error)?;
            timer.record();
            return Ok(Some(Admission {
                participant: existing.into(),
                created: false,
            }));
        }

        let accepted: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*)
            FROM participants
            WHERE event_id = $1 AND status = 'accepted' AND role <> 'organizer'
            "#,
        )
        .bind(new.event_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(map_db_error)?;

        let participant = sqlx::query_as::<_, ParticipantEntity>(
            r#"
            INSERT INTO participants (event_id, user_id, role, status, join_method, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $6)
            RETURNING id, event_id, user_id, role, status, payment_status, join_method, created_at, updated_at
            "#,
        )
        .bind(new.event_id)
        .bind(new.user_id)
        .bind(ParticipantRoleDb::from(new.role))
        .bind(ParticipantStatusDb::from(policy.status_for(accepted)))
        .bind(new.join_method)
        .bind(now)
        .fetch_one(&mut *tx)
        .await
        .map_err(map_db_error)?;

        tx.commit().await.map_err(map_db_error)?;
        timer.record();
        Ok(Some(Admission {
            participant: participant.into(),
            created: true,
        }))
    }

    async fn insert_participant(
        &self,
        new: NewParticipant,
        status: ParticipantStatus,
        now: DateTime<Utc>,
    ) -> Result<Participant, StoreError> {
        let timer = QueryTimer::new("insert_participant");
        let result = sqlx::query_as::<_, ParticipantEntity>(
            r#"
            INSERT INTO participants (event_id, user_id, role, status, join_method, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $6)
            RETURNING id, event_id, user_id, role, status, payment_status, join_method, created_at, updated_at
            "#,
        )
        .bind(new.event_id)
        .bind(new.user_id)
        .bind(ParticipantRoleDb::from(new.role))
        .bind(ParticipantStatusDb::from(status))
        .bind(new.join_method)
        .bind(now)
        .fetch_one(&self.pool)
        .await;
        timer.record();
        Ok(result.map_err(map_db_error)?.into())
    }

    async fn transition_status(
        &self,
        id: Uuid,
        from: ParticipantStatus,
        to: ParticipantStatus,
        now: DateTime<Utc>,
    ) -> Result<Option<Participant>, StoreError> {
        let timer = QueryTimer::new("transition_participant_status");
        let result = sqlx::query_as::<_, ParticipantEntity>(
            r#"
            UPDATE participants
            SET status = $3, updated_at = $4
            WHERE id = $1 AND status = $2 AND role <> 'organizer'
            RETURNING id, event_id, user_id, role, status, payment_status, join_method, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(ParticipantStatusDb::from(from))
        .bind(ParticipantStatusDb::from(to))
        .bind(now)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        Ok(result.map_err(map_db_error)?.map(Into::into))
    }

    async fn upsert_walk_in(
        &self,
        event_id: Uuid,
        user_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<Option<Participant>, StoreError> {
        let timer = QueryTimer::new("upsert_walk_in");
        let result = sqlx::query_as::<_, ParticipantEntity>(
            r#"
            INSERT INTO participants (event_id, user_id, role, status, join_method, created_at, updated_at)
            VALUES ($1, $2, 'audience', 'attended', 'walk_in', $3, $3)
            ON CONFLICT (event_id, user_id) DO UPDATE SET
                status = 'attended',
                join_method = EXCLUDED.join_method,
                updated_at = EXCLUDED.updated_at
            WHERE participants.role <> 'organizer'
            RETURNING id, event_id, user_id, role, status, payment_status, join_method, created_at, updated_at
            "#,
        )
        .bind(event_id)
        .bind(user_id)
        .bind(now)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        Ok(result.map_err(map_db_error)?.map(Into::into))
    }
}

//! Round repository for database operations.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use domain::models::round::{Round, RoundWithWinner};
use domain::stores::{RoundStore, StoreError};
use sqlx::PgPool;
use uuid::Uuid;

use crate::entities::{RoundEntity, RoundWithWinnerEntity};
use crate::metrics::QueryTimer;

/// Repository for rounds.
#[derive(Clone)]
pub struct RoundRepository {
    pool: PgPool,
}

impl RoundRepository {
    /// Creates a new RoundRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RoundStore for RoundRepository {
    async fn create_with_payments(
        &self,
        group_id: Uuid,
        round_number: i32,
        payment_deadline: DateTime<Utc>,
        amount: i64,
        member_ids: &[Uuid],
    ) -> Result<Round, StoreError> {
        let timer = QueryTimer::new("create_round_with_payments");

        // The round and its fan-out payment rows land together or not at all.
        let mut tx = self.pool.begin().await?;

        let round = sqlx::query_as::<_, RoundEntity>(
            r#"
            INSERT INTO rounds (group_id, round_number, payment_deadline)
            VALUES ($1, $2, $3)
            RETURNING id, group_id, round_number, winner_id, payment_deadline, status, created_at, completed_at
            "#,
        )
        .bind(group_id)
        .bind(round_number)
        .bind(payment_deadline)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            INSERT INTO payments (round_id, user_id, amount)
            SELECT $1::uuid, m.member_id, $2::bigint
            FROM UNNEST($3::uuid[]) AS m(member_id)
            "#,
        )
        .bind(round.id)
        .bind(amount)
        .bind(member_ids)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        timer.record();
        Ok(round.into())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Round>, StoreError> {
        let timer = QueryTimer::new("find_round_by_id");
        let result = sqlx::query_as::<_, RoundEntity>(
            r#"
            SELECT id, group_id, round_number, winner_id, payment_deadline, status, created_at, completed_at
            FROM rounds
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        Ok(result?.map(Into::into))
    }

    async fn find_with_winner(&self, id: Uuid) -> Result<Option<RoundWithWinner>, StoreError> {
        let timer = QueryTimer::new("find_round_with_winner");
        let result = sqlx::query_as::<_, RoundWithWinnerEntity>(
            r#"
            SELECT
                r.id, r.group_id, r.round_number, r.winner_id, r.payment_deadline,
                r.status, r.created_at, r.completed_at,
                u.full_name as winner_full_name, u.avatar_url as winner_avatar_url
            FROM rounds r
            LEFT JOIN users u ON r.winner_id = u.id
            WHERE r.id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        Ok(result?.map(Into::into))
    }

    async fn list_for_group(&self, group_id: Uuid) -> Result<Vec<RoundWithWinner>, StoreError> {
        let timer = QueryTimer::new("list_rounds_for_group");
        let result = sqlx::query_as::<_, RoundWithWinnerEntity>(
            r#"
            SELECT
                r.id, r.group_id, r.round_number, r.winner_id, r.payment_deadline,
                r.status, r.created_at, r.completed_at,
                u.full_name as winner_full_name, u.avatar_url as winner_avatar_url
            FROM rounds r
            LEFT JOIN users u ON r.winner_id = u.id
            WHERE r.group_id = $1
            ORDER BY r.round_number DESC
            "#,
        )
        .bind(group_id)
        .fetch_all(&self.pool)
        .await;
        timer.record();
        Ok(result?.into_iter().map(Into::into).collect())
    }

    async fn max_round_number(&self, group_id: Uuid) -> Result<Option<i32>, StoreError> {
        let timer = QueryTimer::new("max_round_number");
        let result = sqlx::query_scalar::<_, Option<i32>>(
            r#"
            SELECT MAX(round_number) FROM rounds WHERE group_id = $1
            "#,
        )
        .bind(group_id)
        .fetch_one(&self.pool)
        .await;
        timer.record();
        Ok(result?)
    }

    async fn past_winner_ids(&self, group_id: Uuid) -> Result<Vec<Uuid>, StoreError> {
        let timer = QueryTimer::new("list_past_winner_ids");
        let result = sqlx::query_scalar::<_, Uuid>(
            r#"
            SELECT DISTINCT winner_id
            FROM rounds
            WHERE group_id = $1 AND winner_id IS NOT NULL
            "#,
        )
        .bind(group_id)
        .fetch_all(&self.pool)
        .await;
        timer.record();
        Ok(result?)
    }

    async fn set_winner_if_unset(&self, id: Uuid, winner_id: Uuid) -> Result<bool, StoreError> {
        let timer = QueryTimer::new("set_round_winner");
        // The IS NULL guard makes the second of two concurrent selections
        // a clean no-op.
        let result = sqlx::query(
            r#"
            UPDATE rounds SET winner_id = $2 WHERE id = $1 AND winner_id IS NULL
            "#,
        )
        .bind(id)
        .bind(winner_id)
        .execute(&self.pool)
        .await;
        timer.record();
        Ok(result?.rows_affected() > 0)
    }

    async fn complete_if_pending(
        &self,
        id: Uuid,
        completed_at: DateTime<Utc>,
    ) -> Result<bool, StoreError> {
        let timer = QueryTimer::new("complete_round");
        let result = sqlx::query(
            r#"
            UPDATE rounds
            SET status = 'completed', completed_at = $2
            WHERE id = $1 AND status = 'pending' AND winner_id IS NOT NULL
            "#,
        )
        .bind(id)
        .bind(completed_at)
        .execute(&self.pool)
        .await;
        timer.record();
        Ok(result?.rows_affected() > 0)
    }
}

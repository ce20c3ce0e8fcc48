//! Payment repository for database operations.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use domain::models::payment::{NewPayment, Payment, PaymentWithUser, UserPaymentView};
use domain::stores::{PaymentStore, StoreError};
use sqlx::PgPool;
use uuid::Uuid;

use crate::entities::{PaymentEntity, PaymentWithUserEntity, UserPaymentEntity};
use crate::metrics::QueryTimer;

/// Repository for payment rows.
#[derive(Clone)]
pub struct PaymentRepository {
    pool: PgPool,
}

impl PaymentRepository {
    /// Creates a new PaymentRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PaymentStore for PaymentRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Payment>, StoreError> {
        let timer = QueryTimer::new("find_payment_by_id");
        let result = sqlx::query_as::<_, PaymentEntity>(
            r#"
            SELECT id, round_id, user_id, amount, status, payment_method, proof_url, paid_at, created_at
            FROM payments
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        Ok(result?.map(Into::into))
    }

    async fn find_by_round_and_user(
        &self,
        round_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<Payment>, StoreError> {
        let timer = QueryTimer::new("find_payment_by_round_and_user");
        let result = sqlx::query_as::<_, PaymentEntity>(
            r#"
            SELECT id, round_id, user_id, amount, status, payment_method, proof_url, paid_at, created_at
            FROM payments
            WHERE round_id = $1 AND user_id = $2
            "#,
        )
        .bind(round_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        Ok(result?.map(Into::into))
    }

    async fn insert(&self, new: &NewPayment) -> Result<Payment, StoreError> {
        let timer = QueryTimer::new("insert_payment");
        let result = sqlx::query_as::<_, PaymentEntity>(
            r#"
            INSERT INTO payments (round_id, user_id, amount, payment_method, proof_url, paid_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, round_id, user_id, amount, status, payment_method, proof_url, paid_at, created_at
            "#,
        )
        .bind(new.round_id)
        .bind(new.user_id)
        .bind(new.amount)
        .bind(new.payment_method.as_deref())
        .bind(new.proof_url.as_deref())
        .bind(new.paid_at)
        .fetch_one(&self.pool)
        .await;
        timer.record();
        Ok(result?.into())
    }

    async fn record_submission(
        &self,
        id: Uuid,
        proof_url: &str,
        payment_method: &str,
        paid_at: DateTime<Utc>,
    ) -> Result<Option<Payment>, StoreError> {
        let timer = QueryTimer::new("record_payment_submission");
        // Resubmission puts the payment back under review.
        let result = sqlx::query_as::<_, PaymentEntity>(
            r#"
            UPDATE payments
            SET proof_url = $2, payment_method = $3, paid_at = $4, status = 'pending'
            WHERE id = $1
            RETURNING id, round_id, user_id, amount, status, payment_method, proof_url, paid_at, created_at
            "#,
        )
        .bind(id)
        .bind(proof_url)
        .bind(payment_method)
        .bind(paid_at)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        Ok(result?.map(Into::into))
    }

    async fn mark_paid(
        &self,
        id: Uuid,
        paid_at: DateTime<Utc>,
    ) -> Result<Option<Payment>, StoreError> {
        let timer = QueryTimer::new("mark_payment_paid");
        let result = sqlx::query_as::<_, PaymentEntity>(
            r#"
            UPDATE payments
            SET status = 'paid', paid_at = $2
            WHERE id = $1
            RETURNING id, round_id, user_id, amount, status, payment_method, proof_url, paid_at, created_at
            "#,
        )
        .bind(id)
        .bind(paid_at)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        Ok(result?.map(Into::into))
    }

    async fn list_for_round(&self, round_id: Uuid) -> Result<Vec<PaymentWithUser>, StoreError> {
        let timer = QueryTimer::new("list_payments_for_round");
        let result = sqlx::query_as::<_, PaymentWithUserEntity>(
            r#"
            SELECT
                p.id, p.round_id, p.user_id, p.amount, p.status,
                p.payment_method, p.proof_url, p.paid_at, p.created_at,
                u.full_name, u.avatar_url
            FROM payments p
            JOIN users u ON p.user_id = u.id
            WHERE p.round_id = $1
            ORDER BY p.created_at ASC
            "#,
        )
        .bind(round_id)
        .fetch_all(&self.pool)
        .await;
        timer.record();
        Ok(result?.into_iter().map(Into::into).collect())
    }

    async fn list_for_user(
        &self,
        user_id: Uuid,
        group_id: Option<Uuid>,
    ) -> Result<Vec<UserPaymentView>, StoreError> {
        let timer = QueryTimer::new("list_payments_for_user");
        let result = sqlx::query_as::<_, UserPaymentEntity>(
            r#"
            SELECT
                p.id, p.round_id, r.round_number, r.group_id, g.name as group_name,
                p.amount, p.status, p.payment_method, p.proof_url, p.paid_at,
                r.payment_deadline, p.created_at
            FROM payments p
            JOIN rounds r ON p.round_id = r.id
            JOIN groups g ON r.group_id = g.id
            WHERE p.user_id = $1 AND (r.group_id = $2 OR $2 IS NULL)
            ORDER BY p.created_at DESC
            "#,
        )
        .bind(user_id)
        .bind(group_id)
        .fetch_all(&self.pool)
        .await;
        timer.record();
        Ok(result?.into_iter().map(Into::into).collect())
    }
}

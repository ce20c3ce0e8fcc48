//! OTP code repository for database operations.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use domain::models::otp::{NewOtpCode, OtpCode};
use domain::stores::{OtpStore, StoreError};
use sqlx::PgPool;
use uuid::Uuid;

use crate::entities::OtpCodeEntity;
use crate::metrics::QueryTimer;

/// Repository for OTP codes.
#[derive(Clone)]
pub struct OtpRepository {
    pool: PgPool,
}

impl OtpRepository {
    /// Creates a new OtpRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl OtpStore for OtpRepository {
    async fn replace_for_phone(&self, new: &NewOtpCode) -> Result<OtpCode, StoreError> {
        let timer = QueryTimer::new("replace_otp_for_phone");

        // At most one live code per phone: discard, then insert.
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            DELETE FROM otp_codes WHERE phone = $1 AND consumed_at IS NULL
            "#,
        )
        .bind(&new.phone)
        .execute(&mut *tx)
        .await?;

        let otp = sqlx::query_as::<_, OtpCodeEntity>(
            r#"
            INSERT INTO otp_codes (phone, code_hash, expires_at)
            VALUES ($1, $2, $3)
            RETURNING id, phone, code_hash, expires_at, attempts, consumed_at, created_at
            "#,
        )
        .bind(&new.phone)
        .bind(&new.code_hash)
        .bind(new.expires_at)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        timer.record();
        Ok(otp.into())
    }

    async fn find_latest_unconsumed(&self, phone: &str) -> Result<Option<OtpCode>, StoreError> {
        let timer = QueryTimer::new("find_latest_unconsumed_otp");
        let result = sqlx::query_as::<_, OtpCodeEntity>(
            r#"
            SELECT id, phone, code_hash, expires_at, attempts, consumed_at, created_at
            FROM otp_codes
            WHERE phone = $1 AND consumed_at IS NULL
            ORDER BY created_at DESC
            LIMIT 1
            "#,
        )
        .bind(phone)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        Ok(result?.map(Into::into))
    }

    async fn increment_attempts(&self, id: Uuid) -> Result<i32, StoreError> {
        let timer = QueryTimer::new("increment_otp_attempts");
        let result = sqlx::query_scalar::<_, i32>(
            r#"
            UPDATE otp_codes SET attempts = attempts + 1 WHERE id = $1 RETURNING attempts
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result?.ok_or(StoreError::NotFound)
    }

    async fn consume(&self, id: Uuid, at: DateTime<Utc>) -> Result<(), StoreError> {
        let timer = QueryTimer::new("consume_otp");
        let result = sqlx::query(
            r#"
            UPDATE otp_codes SET consumed_at = $2 WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(at)
        .execute(&self.pool)
        .await;
        timer.record();
        if result?.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }
}

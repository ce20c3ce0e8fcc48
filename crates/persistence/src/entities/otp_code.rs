//! OTP code entity (database row mapping).

use chrono::{DateTime, Utc};
use domain::models::otp::OtpCode;
use sqlx::FromRow;
use uuid::Uuid;

/// Database row mapping for the otp_codes table.
#[derive(Debug, Clone, FromRow)]
pub struct OtpCodeEntity {
    pub id: Uuid,
    pub phone: String,
    pub code_hash: String,
    pub expires_at: DateTime<Utc>,
    pub attempts: i32,
    pub consumed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl From<OtpCodeEntity> for OtpCode {
    fn from(entity: OtpCodeEntity) -> Self {
        Self {
            id: entity.id,
            phone: entity.phone,
            code_hash: entity.code_hash,
            expires_at: entity.expires_at,
            attempts: entity.attempts,
            consumed_at: entity.consumed_at,
            created_at: entity.created_at,
        }
    }
}

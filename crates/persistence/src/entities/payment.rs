//! Payment entities (database row mappings).

use chrono::{DateTime, Utc};
use domain::models::payment::{Payment, PaymentStatus, PaymentWithUser, UserPaymentView};
use domain::models::user::UserPublic;
use sqlx::FromRow;
use uuid::Uuid;

/// Database enum for payment_status that maps to PostgreSQL enum type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "payment_status", rename_all = "lowercase")]
pub enum PaymentStatusDb {
    Pending,
    Paid,
    Late,
}

impl From<PaymentStatusDb> for PaymentStatus {
    fn from(db: PaymentStatusDb) -> Self {
        match db {
            PaymentStatusDb::Pending => PaymentStatus::Pending,
            PaymentStatusDb::Paid => PaymentStatus::Paid,
            PaymentStatusDb::Late => PaymentStatus::Late,
        }
    }
}

impl From<PaymentStatus> for PaymentStatusDb {
    fn from(status: PaymentStatus) -> Self {
        match status {
            PaymentStatus::Pending => PaymentStatusDb::Pending,
            PaymentStatus::Paid => PaymentStatusDb::Paid,
            PaymentStatus::Late => PaymentStatusDb::Late,
        }
    }
}

/// Database row mapping for the payments table.
#[derive(Debug, Clone, FromRow)]
pub struct PaymentEntity {
    pub id: Uuid,
    pub round_id: Uuid,
    pub user_id: Uuid,
    pub amount: i64,
    pub status: PaymentStatusDb,
    pub payment_method: Option<String>,
    pub proof_url: Option<String>,
    pub paid_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl From<PaymentEntity> for Payment {
    fn from(entity: PaymentEntity) -> Self {
        Self {
            id: entity.id,
            round_id: entity.round_id,
            user_id: entity.user_id,
            amount: entity.amount,
            status: entity.status.into(),
            payment_method: entity.payment_method,
            proof_url: entity.proof_url,
            paid_at: entity.paid_at,
            created_at: entity.created_at,
        }
    }
}

/// Payment row joined with the payer's display fields.
#[derive(Debug, Clone, FromRow)]
pub struct PaymentWithUserEntity {
    pub id: Uuid,
    pub round_id: Uuid,
    pub user_id: Uuid,
    pub amount: i64,
    pub status: PaymentStatusDb,
    pub payment_method: Option<String>,
    pub proof_url: Option<String>,
    pub paid_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    // User fields
    pub full_name: String,
    pub avatar_url: Option<String>,
}

impl From<PaymentWithUserEntity> for PaymentWithUser {
    fn from(entity: PaymentWithUserEntity) -> Self {
        Self {
            id: entity.id,
            round_id: entity.round_id,
            user: UserPublic {
                id: entity.user_id,
                full_name: entity.full_name,
                avatar_url: entity.avatar_url,
            },
            amount: entity.amount,
            status: entity.status.into(),
            payment_method: entity.payment_method,
            proof_url: entity.proof_url,
            paid_at: entity.paid_at,
            created_at: entity.created_at,
        }
    }
}

/// Payment row joined with its round and group context.
#[derive(Debug, Clone, FromRow)]
pub struct UserPaymentEntity {
    pub id: Uuid,
    pub round_id: Uuid,
    pub round_number: i32,
    pub group_id: Uuid,
    pub group_name: String,
    pub amount: i64,
    pub status: PaymentStatusDb,
    pub payment_method: Option<String>,
    pub proof_url: Option<String>,
    pub paid_at: Option<DateTime<Utc>>,
    pub payment_deadline: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl From<UserPaymentEntity> for UserPaymentView {
    fn from(entity: UserPaymentEntity) -> Self {
        Self {
            id: entity.id,
            round_id: entity.round_id,
            round_number: entity.round_number,
            group_id: entity.group_id,
            group_name: entity.group_name,
            amount: entity.amount,
            status: entity.status.into(),
            payment_method: entity.payment_method,
            proof_url: entity.proof_url,
            paid_at: entity.paid_at,
            payment_deadline: entity.payment_deadline,
            created_at: entity.created_at,
        }
    }
}

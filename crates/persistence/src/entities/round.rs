//! Round entities (database row mappings).

use chrono::{DateTime, Utc};
use domain::models::round::{Round, RoundStatus, RoundWithWinner};
use domain::models::user::UserPublic;
use sqlx::FromRow;
use uuid::Uuid;

/// Database enum for round_status that maps to PostgreSQL enum type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "round_status", rename_all = "lowercase")]
pub enum RoundStatusDb {
    Pending,
    Completed,
}

impl From<RoundStatusDb> for RoundStatus {
    fn from(db: RoundStatusDb) -> Self {
        match db {
            RoundStatusDb::Pending => RoundStatus::Pending,
            RoundStatusDb::Completed => RoundStatus::Completed,
        }
    }
}

impl From<RoundStatus> for RoundStatusDb {
    fn from(status: RoundStatus) -> Self {
        match status {
            RoundStatus::Pending => RoundStatusDb::Pending,
            RoundStatus::Completed => RoundStatusDb::Completed,
        }
    }
}

/// Database row mapping for the rounds table.
#[derive(Debug, Clone, FromRow)]
pub struct RoundEntity {
    pub id: Uuid,
    pub group_id: Uuid,
    pub round_number: i32,
    pub winner_id: Option<Uuid>,
    pub payment_deadline: DateTime<Utc>,
    pub status: RoundStatusDb,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl From<RoundEntity> for Round {
    fn from(entity: RoundEntity) -> Self {
        Self {
            id: entity.id,
            group_id: entity.group_id,
            round_number: entity.round_number,
            winner_id: entity.winner_id,
            payment_deadline: entity.payment_deadline,
            status: entity.status.into(),
            created_at: entity.created_at,
            completed_at: entity.completed_at,
        }
    }
}

/// Round row joined with the winner's display fields.
///
/// Winner columns come from a LEFT JOIN and are null until a winner is
/// selected.
#[derive(Debug, Clone, FromRow)]
pub struct RoundWithWinnerEntity {
    pub id: Uuid,
    pub group_id: Uuid,
    pub round_number: i32,
    pub winner_id: Option<Uuid>,
    pub payment_deadline: DateTime<Utc>,
    pub status: RoundStatusDb,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    // Winner fields
    pub winner_full_name: Option<String>,
    pub winner_avatar_url: Option<String>,
}

impl From<RoundWithWinnerEntity> for RoundWithWinner {
    fn from(entity: RoundWithWinnerEntity) -> Self {
        let winner = match (entity.winner_id, entity.winner_full_name) {
            (Some(id), Some(full_name)) => Some(UserPublic {
                id,
                full_name,
                avatar_url: entity.winner_avatar_url,
            }),
            _ => None,
        };
        Self {
            round: Round {
                id: entity.id,
                group_id: entity.group_id,
                round_number: entity.round_number,
                winner_id: entity.winner_id,
                payment_deadline: entity.payment_deadline,
                status: entity.status.into(),
                created_at: entity.created_at,
                completed_at: entity.completed_at,
            },
            winner,
        }
    }
}

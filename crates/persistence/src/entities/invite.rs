//! Invite entity (database row mapping).

use chrono::{DateTime, Utc};
use domain::models::invite::GroupInvite;
use sqlx::FromRow;
use uuid::Uuid;

/// Database row mapping for the group_invites table.
#[derive(Debug, Clone, FromRow)]
pub struct GroupInviteEntity {
    pub id: Uuid,
    pub group_id: Uuid,
    pub code: String,
    pub created_by: Uuid,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl From<GroupInviteEntity> for GroupInvite {
    fn from(entity: GroupInviteEntity) -> Self {
        Self {
            id: entity.id,
            group_id: entity.group_id,
            code: entity.code,
            created_by: entity.created_by,
            expires_at: entity.expires_at,
            created_at: entity.created_at,
        }
    }
}

//! User entity (database row mapping).

use chrono::{DateTime, Utc};
use domain::models::user::User;
use sqlx::FromRow;
use uuid::Uuid;

/// Database row mapping for the users table.
#[derive(Debug, Clone, FromRow)]
pub struct UserEntity {
    pub id: Uuid,
    pub phone: String,
    pub full_name: String,
    pub avatar_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<UserEntity> for User {
    fn from(entity: UserEntity) -> Self {
        Self {
            id: entity.id,
            phone: entity.phone,
            full_name: entity.full_name,
            avatar_url: entity.avatar_url,
            created_at: entity.created_at,
            updated_at: entity.updated_at,
        }
    }
}

//! User repository for database operations.

use async_trait::async_trait;
use domain::models::user::User;
use domain::stores::{StoreError, UserStore};
use sqlx::PgPool;
use uuid::Uuid;

use crate::entities::UserEntity;
use crate::metrics::QueryTimer;

/// Repository for user rows.
#[derive(Clone)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    /// Creates a new UserRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserStore for UserRepository {
    async fn create(&self, phone: &str) -> Result<User, StoreError> {
        let timer = QueryTimer::new("create_user");
        let result = sqlx::query_as::<_, UserEntity>(
            r#"
            INSERT INTO users (phone)
            VALUES ($1)
            RETURNING id, phone, full_name, avatar_url, created_at, updated_at
            "#,
        )
        .bind(phone)
        .fetch_one(&self.pool)
        .await;
        timer.record();
        Ok(result?.into())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        let timer = QueryTimer::new("find_user_by_id");
        let result = sqlx::query_as::<_, UserEntity>(
            r#"
            SELECT id, phone, full_name, avatar_url, created_at, updated_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        Ok(result?.map(Into::into))
    }

    async fn find_by_phone(&self, phone: &str) -> Result<Option<User>, StoreError> {
        let timer = QueryTimer::new("find_user_by_phone");
        let result = sqlx::query_as::<_, UserEntity>(
            r#"
            SELECT id, phone, full_name, avatar_url, created_at, updated_at
            FROM users
            WHERE phone = $1
            "#,
        )
        .bind(phone)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        Ok(result?.map(Into::into))
    }

    async fn update_profile(
        &self,
        id: Uuid,
        full_name: Option<&str>,
        avatar_url: Option<&str>,
    ) -> Result<Option<User>, StoreError> {
        let timer = QueryTimer::new("update_user_profile");
        let result = sqlx::query_as::<_, UserEntity>(
            r#"
            UPDATE users
            SET full_name = COALESCE($2, full_name),
                avatar_url = COALESCE($3, avatar_url),
                updated_at = NOW()
            WHERE id = $1
            RETURNING id, phone, full_name, avatar_url, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(full_name)
        .bind(avatar_url)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        Ok(result?.map(Into::into))
    }
}

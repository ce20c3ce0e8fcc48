//! Invite repository for database operations.

use async_trait::async_trait;
use domain::models::invite::{GroupInvite, NewInvite};
use domain::stores::{InviteStore, StoreError};
use sqlx::PgPool;

use crate::entities::GroupInviteEntity;
use crate::metrics::QueryTimer;

/// Repository for invite codes.
#[derive(Clone)]
pub struct InviteRepository {
    pool: PgPool,
}

impl InviteRepository {
    /// Creates a new InviteRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl InviteStore for InviteRepository {
    async fn create(&self, invite: &NewInvite) -> Result<GroupInvite, StoreError> {
        let timer = QueryTimer::new("create_invite");
        let result = sqlx::query_as::<_, GroupInviteEntity>(
            r#"
            INSERT INTO group_invites (group_id, code, created_by, expires_at)
            VALUES ($1, $2, $3, $4)
            RETURNING id, group_id, code, created_by, expires_at, created_at
            "#,
        )
        .bind(invite.group_id)
        .bind(&invite.code)
        .bind(invite.created_by)
        .bind(invite.expires_at)
        .fetch_one(&self.pool)
        .await;
        timer.record();
        Ok(result?.into())
    }

    async fn find_by_code(&self, code: &str) -> Result<Option<GroupInvite>, StoreError> {
        let timer = QueryTimer::new("find_invite_by_code");
        let result = sqlx::query_as::<_, GroupInviteEntity>(
            r#"
            SELECT id, group_id, code, created_by, expires_at, created_at
            FROM group_invites
            WHERE code = $1
            "#,
        )
        .bind(code)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        Ok(result?.map(Into::into))
    }
}

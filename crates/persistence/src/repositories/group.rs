//! Group repository for database operations.

use async_trait::async_trait;
use domain::models::group::{
    CreateGroupRequest, Group, GroupMember, GroupWithMembership, MemberWithUser,
    UpdateGroupRequest,
};
use domain::stores::{GroupStore, StoreError};
use sqlx::PgPool;
use uuid::Uuid;

use crate::entities::{
    FrequencyDb, GroupEntity, GroupMemberEntity, GroupStatusDb, GroupWithMembershipEntity,
    MemberWithUserEntity,
};
use crate::metrics::QueryTimer;

/// Repository for groups and their membership rows.
#[derive(Clone)]
pub struct GroupRepository {
    pool: PgPool,
}

impl GroupRepository {
    /// Creates a new GroupRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl GroupStore for GroupRepository {
    async fn create_with_admin(
        &self,
        req: &CreateGroupRequest,
        created_by: Uuid,
    ) -> Result<(Group, GroupMember), StoreError> {
        let timer = QueryTimer::new("create_group_with_admin");

        // Group row and the creator's admin membership are one unit.
        let mut tx = self.pool.begin().await?;

        let group = sqlx::query_as::<_, GroupEntity>(
            r#"
            INSERT INTO groups (name, contribution_amount, frequency, member_count, start_date, created_by)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, name, contribution_amount, frequency, member_count, start_date, status, created_by, created_at, updated_at
            "#,
        )
        .bind(&req.name)
        .bind(req.contribution_amount)
        .bind(FrequencyDb::from(req.frequency))
        .bind(req.member_count)
        .bind(req.start_date)
        .bind(created_by)
        .fetch_one(&mut *tx)
        .await?;

        let membership = sqlx::query_as::<_, GroupMemberEntity>(
            r#"
            INSERT INTO group_members (group_id, user_id, is_admin)
            VALUES ($1, $2, true)
            RETURNING id, group_id, user_id, is_admin, joined_at
            "#,
        )
        .bind(group.id)
        .bind(created_by)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        timer.record();
        Ok((group.into(), membership.into()))
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Group>, StoreError> {
        let timer = QueryTimer::new("find_group_by_id");
        let result = sqlx::query_as::<_, GroupEntity>(
            r#"
            SELECT id, name, contribution_amount, frequency, member_count, start_date, status, created_by, created_at, updated_at
            FROM groups
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        Ok(result?.map(Into::into))
    }

    async fn update(
        &self,
        id: Uuid,
        changes: &UpdateGroupRequest,
    ) -> Result<Option<Group>, StoreError> {
        let timer = QueryTimer::new("update_group");
        let result = sqlx::query_as::<_, GroupEntity>(
            r#"
            UPDATE groups
            SET name = COALESCE($2, name),
                contribution_amount = COALESCE($3, contribution_amount),
                frequency = COALESCE($4, frequency),
                status = COALESCE($5, status),
                start_date = COALESCE($6, start_date),
                updated_at = NOW()
            WHERE id = $1
            RETURNING id, name, contribution_amount, frequency, member_count, start_date, status, created_by, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(changes.name.as_deref())
        .bind(changes.contribution_amount)
        .bind(changes.frequency.map(FrequencyDb::from))
        .bind(changes.status.map(GroupStatusDb::from))
        .bind(changes.start_date)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        Ok(result?.map(Into::into))
    }

    async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<GroupWithMembership>, StoreError> {
        let timer = QueryTimer::new("list_groups_for_user");
        let result = sqlx::query_as::<_, GroupWithMembershipEntity>(
            r#"
            SELECT
                g.id, g.name, g.contribution_amount, g.frequency, g.member_count,
                g.start_date, g.status, g.created_by, g.created_at, g.updated_at,
                gm.id as membership_id, gm.user_id as membership_user_id,
                gm.is_admin, gm.joined_at,
                (SELECT COUNT(*) FROM group_members WHERE group_id = g.id) as current_members
            FROM groups g
            JOIN group_members gm ON g.id = gm.group_id
            WHERE gm.user_id = $1
            ORDER BY gm.joined_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await;
        timer.record();
        Ok(result?.into_iter().map(Into::into).collect())
    }

    async fn add_member(
        &self,
        group_id: Uuid,
        user_id: Uuid,
        is_admin: bool,
    ) -> Result<GroupMember, StoreError> {
        let timer = QueryTimer::new("add_group_member");
        let result = sqlx::query_as::<_, GroupMemberEntity>(
            r#"
            INSERT INTO group_members (group_id, user_id, is_admin)
            VALUES ($1, $2, $3)
            RETURNING id, group_id, user_id, is_admin, joined_at
            "#,
        )
        .bind(group_id)
        .bind(user_id)
        .bind(is_admin)
        .fetch_one(&self.pool)
        .await;
        timer.record();
        Ok(result?.into())
    }

    async fn find_member(
        &self,
        group_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<GroupMember>, StoreError> {
        let timer = QueryTimer::new("find_group_member");
        let result = sqlx::query_as::<_, GroupMemberEntity>(
            r#"
            SELECT id, group_id, user_id, is_admin, joined_at
            FROM group_members
            WHERE group_id = $1 AND user_id = $2
            "#,
        )
        .bind(group_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        Ok(result?.map(Into::into))
    }

    async fn list_members(&self, group_id: Uuid) -> Result<Vec<MemberWithUser>, StoreError> {
        let timer = QueryTimer::new("list_group_members");
        let result = sqlx::query_as::<_, MemberWithUserEntity>(
            r#"
            SELECT
                gm.id, gm.group_id, gm.user_id, gm.is_admin, gm.joined_at,
                u.full_name, u.avatar_url
            FROM group_members gm
            JOIN users u ON gm.user_id = u.id
            WHERE gm.group_id = $1
            ORDER BY gm.joined_at ASC
            "#,
        )
        .bind(group_id)
        .fetch_all(&self.pool)
        .await;
        timer.record();
        Ok(result?.into_iter().map(Into::into).collect())
    }

    async fn member_ids(&self, group_id: Uuid) -> Result<Vec<Uuid>, StoreError> {
        let timer = QueryTimer::new("list_group_member_ids");
        let result = sqlx::query_scalar::<_, Uuid>(
            r#"
            SELECT user_id
            FROM group_members
            WHERE group_id = $1
            ORDER BY joined_at ASC
            "#,
        )
        .bind(group_id)
        .fetch_all(&self.pool)
        .await;
        timer.record();
        Ok(result?)
    }

    async fn count_members(&self, group_id: Uuid) -> Result<i64, StoreError> {
        let timer = QueryTimer::new("count_group_members");
        let result = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*) FROM group_members WHERE group_id = $1
            "#,
        )
        .bind(group_id)
        .fetch_one(&self.pool)
        .await;
        timer.record();
        Ok(result?)
    }

    async fn remove_member(&self, group_id: Uuid, user_id: Uuid) -> Result<bool, StoreError> {
        let timer = QueryTimer::new("remove_group_member");
        let result = sqlx::query(
            r#"
            DELETE FROM group_members WHERE group_id = $1 AND user_id = $2
            "#,
        )
        .bind(group_id)
        .bind(user_id)
        .execute(&self.pool)
        .await;
        timer.record();
        Ok(result?.rows_affected() > 0)
    }

    async fn set_member_admin(
        &self,
        group_id: Uuid,
        user_id: Uuid,
        is_admin: bool,
    ) -> Result<Option<GroupMember>, StoreError> {
        let timer = QueryTimer::new("set_group_member_admin");
        let result = sqlx::query_as::<_, GroupMemberEntity>(
            r#"
            UPDATE group_members
            SET is_admin = $3
            WHERE group_id = $1 AND user_id = $2
            RETURNING id, group_id, user_id, is_admin, joined_at
            "#,
        )
        .bind(group_id)
        .bind(user_id)
        .bind(is_admin)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        Ok(result?.map(Into::into))
    }
}

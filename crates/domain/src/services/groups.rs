//! Group lifecycle: creation, membership, roles, partial updates.

use tracing::info;
use uuid::Uuid;

use crate::error::DomainError;
use crate::models::group::{
    CreateGroupRequest, Group, GroupDetail, GroupMember, GroupSummary, ListGroupsResponse,
    ListMembersResponse, RemoveMemberResponse, UpdateGroupRequest,
};
use crate::services::{require_admin, require_membership};
use crate::stores::Stores;

#[derive(Debug, Clone)]
pub struct GroupService {
    stores: Stores,
}

impl GroupService {
    pub fn new(stores: Stores) -> Self {
        Self { stores }
    }

    /// Creates a group and seats the creator as its first admin. Both
    /// rows are written in one transaction by the store.
    pub async fn create_group(
        &self,
        caller: Uuid,
        req: &CreateGroupRequest,
    ) -> Result<GroupDetail, DomainError> {
        let (group, _membership) = self.stores.groups.create_with_admin(req, caller).await?;
        info!(
            group_id = %group.id,
            created_by = %caller,
            name = %group.name,
            "group created"
        );
        let members = self.stores.groups.list_members(group.id).await?;
        Ok(GroupDetail::new(group, true, members))
    }

    pub async fn get_group(
        &self,
        caller: Uuid,
        group_id: Uuid,
    ) -> Result<GroupDetail, DomainError> {
        let (group, membership) = require_membership(&self.stores, group_id, caller).await?;
        let members = self.stores.groups.list_members(group_id).await?;
        Ok(GroupDetail::new(group, membership.is_admin, members))
    }

    pub async fn list_groups(&self, caller: Uuid) -> Result<ListGroupsResponse, DomainError> {
        let memberships = self.stores.groups.list_for_user(caller).await?;
        let data: Vec<GroupSummary> = memberships.into_iter().map(GroupSummary::from).collect();
        let count = data.len();
        Ok(ListGroupsResponse { data, count })
    }

    pub async fn list_members(
        &self,
        caller: Uuid,
        group_id: Uuid,
    ) -> Result<ListMembersResponse, DomainError> {
        require_membership(&self.stores, group_id, caller).await?;
        let data = self.stores.groups.list_members(group_id).await?;
        let count = data.len();
        Ok(ListMembersResponse { data, count })
    }

    /// Partial update; status changes must follow the group state machine
    /// (`active` ⇄ `paused`, `active` → `completed`, nothing else).
    pub async fn update_group(
        &self,
        caller: Uuid,
        group_id: Uuid,
        changes: &UpdateGroupRequest,
    ) -> Result<Group, DomainError> {
        let (group, _) = require_admin(&self.stores, group_id, caller).await?;

        if changes.is_empty() {
            return Err(DomainError::Validation(
                "At least one field must be provided".into(),
            ));
        }
        if let Some(requested) = changes.status {
            if requested != group.status && !group.status.can_transition_to(requested) {
                return Err(DomainError::Conflict(format!(
                    "Cannot change group status from {} to {}",
                    group.status, requested
                )));
            }
        }

        let updated = self
            .stores
            .groups
            .update(group_id, changes)
            .await?
            .ok_or_else(|| DomainError::NotFound("Group not found".into()))?;
        info!(group_id = %group_id, updated_by = %caller, "group updated");
        Ok(updated)
    }

    /// Deletes the caller's own membership row.
    pub async fn leave_group(
        &self,
        caller: Uuid,
        group_id: Uuid,
    ) -> Result<RemoveMemberResponse, DomainError> {
        self.stores
            .groups
            .find_by_id(group_id)
            .await?
            .ok_or_else(|| DomainError::NotFound("Group not found".into()))?;

        let removed = self.stores.groups.remove_member(group_id, caller).await?;
        if !removed {
            return Err(DomainError::NotFound("Membership not found".into()));
        }
        info!(group_id = %group_id, user_id = %caller, "member left group");
        Ok(RemoveMemberResponse {
            removed: true,
            group_id,
            user_id: caller,
        })
    }

    /// Admin-only removal of another member. Self-removal must go
    /// through [`GroupService::leave_group`].
    pub async fn remove_member(
        &self,
        caller: Uuid,
        group_id: Uuid,
        target: Uuid,
    ) -> Result<RemoveMemberResponse, DomainError> {
        require_admin(&self.stores, group_id, caller).await?;

        if target == caller {
            return Err(DomainError::Validation(
                "Use leave to remove yourself from the group".into(),
            ));
        }
        let removed = self.stores.groups.remove_member(group_id, target).await?;
        if !removed {
            return Err(DomainError::NotFound("Member not found in this group".into()));
        }
        info!(
            group_id = %group_id,
            user_id = %target,
            removed_by = %caller,
            "member removed from group"
        );
        Ok(RemoveMemberResponse {
            removed: true,
            group_id,
            user_id: target,
        })
    }

    /// Admin-only promotion; there is no demotion operation.
    pub async fn promote_member(
        &self,
        caller: Uuid,
        group_id: Uuid,
        target: Uuid,
    ) -> Result<GroupMember, DomainError> {
        require_admin(&self.stores, group_id, caller).await?;

        let promoted = self
            .stores
            .groups
            .set_member_admin(group_id, target, true)
            .await?
            .ok_or_else(|| DomainError::NotFound("Member not found in this group".into()))?;
        info!(
            group_id = %group_id,
            user_id = %target,
            promoted_by = %caller,
            "member promoted to admin"
        );
        Ok(promoted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::group::{Frequency, GroupStatus};
    use crate::models::User;
    use chrono::NaiveDate;

    fn group_request() -> CreateGroupRequest {
        CreateGroupRequest {
            name: "Arisan Kantor".to_string(),
            contribution_amount: 100_000,
            frequency: Frequency::Monthly,
            member_count: 5,
            start_date: NaiveDate::from_ymd_opt(2025, 3, 1).unwrap(),
        }
    }

    async fn setup() -> (GroupService, Stores, User, User) {
        let stores = Stores::in_memory();
        let admin = stores.users.create("+6281111111111").await.unwrap();
        let member = stores.users.create("+6282222222222").await.unwrap();
        (GroupService::new(stores.clone()), stores, admin, member)
    }

    #[tokio::test]
    async fn test_create_group_returns_detail_with_creator() {
        let (service, _, admin, _) = setup().await;

        let detail = service.create_group(admin.id, &group_request()).await.unwrap();

        assert_eq!(detail.name, "Arisan Kantor");
        assert_eq!(detail.status, GroupStatus::Active);
        assert_eq!(detail.current_members, 1);
        assert!(detail.is_admin);
        assert_eq!(detail.members.len(), 1);
        assert!(detail.members[0].is_admin);
    }

    #[tokio::test]
    async fn test_get_group_requires_membership() {
        let (service, _, admin, outsider) = setup().await;
        let detail = service.create_group(admin.id, &group_request()).await.unwrap();

        let result = service.get_group(outsider.id, detail.id).await;
        assert!(matches!(result, Err(DomainError::Forbidden(_))));
    }

    #[tokio::test]
    async fn test_update_group_requires_admin() {
        let (service, stores, admin, member) = setup().await;
        let detail = service.create_group(admin.id, &group_request()).await.unwrap();
        stores
            .groups
            .add_member(detail.id, member.id, false)
            .await
            .unwrap();

        let changes = UpdateGroupRequest {
            name: Some("Arisan RT 05".to_string()),
            ..Default::default()
        };
        let result = service.update_group(member.id, detail.id, &changes).await;
        assert!(matches!(result, Err(DomainError::Forbidden(_))));
    }

    #[tokio::test]
    async fn test_update_group_rejects_empty_changes() {
        let (service, _, admin, _) = setup().await;
        let detail = service.create_group(admin.id, &group_request()).await.unwrap();

        let result = service
            .update_group(admin.id, detail.id, &UpdateGroupRequest::default())
            .await;
        assert!(matches!(result, Err(DomainError::Validation(_))));
    }

    #[tokio::test]
    async fn test_status_can_pause_and_resume() {
        let (service, _, admin, _) = setup().await;
        let detail = service.create_group(admin.id, &group_request()).await.unwrap();

        let pause = UpdateGroupRequest {
            status: Some(GroupStatus::Paused),
            ..Default::default()
        };
        let paused = service.update_group(admin.id, detail.id, &pause).await.unwrap();
        assert_eq!(paused.status, GroupStatus::Paused);

        let resume = UpdateGroupRequest {
            status: Some(GroupStatus::Active),
            ..Default::default()
        };
        let resumed = service.update_group(admin.id, detail.id, &resume).await.unwrap();
        assert_eq!(resumed.status, GroupStatus::Active);
    }

    #[tokio::test]
    async fn test_paused_group_cannot_complete() {
        let (service, _, admin, _) = setup().await;
        let detail = service.create_group(admin.id, &group_request()).await.unwrap();

        let pause = UpdateGroupRequest {
            status: Some(GroupStatus::Paused),
            ..Default::default()
        };
        service.update_group(admin.id, detail.id, &pause).await.unwrap();

        let complete = UpdateGroupRequest {
            status: Some(GroupStatus::Completed),
            ..Default::default()
        };
        let result = service.update_group(admin.id, detail.id, &complete).await;
        assert!(matches!(result, Err(DomainError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_completed_is_terminal() {
        let (service, _, admin, _) = setup().await;
        let detail = service.create_group(admin.id, &group_request()).await.unwrap();

        let complete = UpdateGroupRequest {
            status: Some(GroupStatus::Completed),
            ..Default::default()
        };
        service.update_group(admin.id, detail.id, &complete).await.unwrap();

        let reopen = UpdateGroupRequest {
            status: Some(GroupStatus::Active),
            ..Default::default()
        };
        let result = service.update_group(admin.id, detail.id, &reopen).await;
        assert!(matches!(result, Err(DomainError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_leave_group_removes_membership() {
        let (service, stores, admin, member) = setup().await;
        let detail = service.create_group(admin.id, &group_request()).await.unwrap();
        stores
            .groups
            .add_member(detail.id, member.id, false)
            .await
            .unwrap();

        let response = service.leave_group(member.id, detail.id).await.unwrap();
        assert!(response.removed);
        assert_eq!(stores.groups.count_members(detail.id).await.unwrap(), 1);

        // a second leave has nothing to delete
        let result = service.leave_group(member.id, detail.id).await;
        assert!(matches!(result, Err(DomainError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_remove_member_rejects_self_removal() {
        let (service, _, admin, _) = setup().await;
        let detail = service.create_group(admin.id, &group_request()).await.unwrap();

        let result = service.remove_member(admin.id, detail.id, admin.id).await;
        assert!(matches!(result, Err(DomainError::Validation(_))));
    }

    #[tokio::test]
    async fn test_remove_member_requires_admin() {
        let (service, stores, admin, member) = setup().await;
        let detail = service.create_group(admin.id, &group_request()).await.unwrap();
        stores
            .groups
            .add_member(detail.id, member.id, false)
            .await
            .unwrap();

        let result = service.remove_member(member.id, detail.id, admin.id).await;
        assert!(matches!(result, Err(DomainError::Forbidden(_))));

        let response = service.remove_member(admin.id, detail.id, member.id).await.unwrap();
        assert!(response.removed);
        assert_eq!(response.user_id, member.id);
    }

    #[tokio::test]
    async fn test_promote_member_sets_admin_flag() {
        let (service, stores, admin, member) = setup().await;
        let detail = service.create_group(admin.id, &group_request()).await.unwrap();
        stores
            .groups
            .add_member(detail.id, member.id, false)
            .await
            .unwrap();

        let promoted = service
            .promote_member(admin.id, detail.id, member.id)
            .await
            .unwrap();
        assert!(promoted.is_admin);

        let result = service
            .promote_member(admin.id, detail.id, Uuid::new_v4())
            .await;
        assert!(matches!(result, Err(DomainError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_list_groups_reflects_role() {
        let (service, stores, admin, member) = setup().await;
        let detail = service.create_group(admin.id, &group_request()).await.unwrap();
        stores
            .groups
            .add_member(detail.id, member.id, false)
            .await
            .unwrap();

        let mine = service.list_groups(member.id).await.unwrap();
        assert_eq!(mine.count, 1);
        assert!(!mine.data[0].is_admin);
        assert_eq!(mine.data[0].current_members, 2);

        let theirs = service.list_groups(admin.id).await.unwrap();
        assert!(theirs.data[0].is_admin);
    }
}

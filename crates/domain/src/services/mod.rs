//! Manager services for the arisan backend.
//!
//! Services hold the business rules and operate on the store traits only.
//! The caller identity is always an explicit `Uuid` resolved by the HTTP
//! layer from the access token.

pub mod groups;
pub mod invites;
pub mod payments;
pub mod rounds;

pub use groups::GroupService;
pub use invites::InviteService;
pub use payments::PaymentService;
pub use rounds::{FixedWinnerPicker, RandomWinnerPicker, RoundService, WinnerPicker};

use uuid::Uuid;

use crate::error::DomainError;
use crate::models::{Group, GroupMember};
use crate::stores::Stores;

/// Loads the group and the caller's membership, rejecting non-members.
pub(crate) async fn require_membership(
    stores: &Stores,
    group_id: Uuid,
    caller: Uuid,
) -> Result<(Group, GroupMember), DomainError> {
    let group = stores
        .groups
        .find_by_id(group_id)
        .await?
        .ok_or_else(|| DomainError::NotFound("Group not found".into()))?;
    let membership = stores
        .groups
        .find_member(group_id, caller)
        .await?
        .ok_or_else(|| DomainError::Forbidden("You are not a member of this group".into()))?;
    Ok((group, membership))
}

/// Same as [`require_membership`], but the caller must hold the admin flag.
pub(crate) async fn require_admin(
    stores: &Stores,
    group_id: Uuid,
    caller: Uuid,
) -> Result<(Group, GroupMember), DomainError> {
    let (group, membership) = require_membership(stores, group_id, caller).await?;
    if !membership.is_admin {
        return Err(DomainError::Forbidden(
            "Only group admins can perform this action".into(),
        ));
    }
    Ok((group, membership))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::group::{CreateGroupRequest, Frequency};
    use chrono::NaiveDate;

    async fn setup() -> (Stores, Uuid, Uuid) {
        let stores = Stores::in_memory();
        let admin = stores.users.create("+6281111111111").await.unwrap();
        let outsider = stores.users.create("+6282222222222").await.unwrap();
        let req = CreateGroupRequest {
            name: "Arisan Kantor".to_string(),
            contribution_amount: 100_000,
            frequency: Frequency::Monthly,
            member_count: 5,
            start_date: NaiveDate::from_ymd_opt(2025, 3, 1).unwrap(),
        };
        let (group, _) = stores.groups.create_with_admin(&req, admin.id).await.unwrap();
        (stores, group.id, outsider.id)
    }

    #[tokio::test]
    async fn test_require_membership_rejects_outsider() {
        let (stores, group_id, outsider) = setup().await;
        let result = require_membership(&stores, group_id, outsider).await;
        assert!(matches!(result, Err(DomainError::Forbidden(_))));
    }

    #[tokio::test]
    async fn test_require_membership_missing_group_is_not_found() {
        let (stores, _, outsider) = setup().await;
        let result = require_membership(&stores, Uuid::new_v4(), outsider).await;
        assert!(matches!(result, Err(DomainError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_require_admin_rejects_plain_member() {
        let (stores, group_id, outsider) = setup().await;
        stores
            .groups
            .add_member(group_id, outsider, false)
            .await
            .unwrap();
        let result = require_admin(&stores, group_id, outsider).await;
        assert!(matches!(result, Err(DomainError::Forbidden(_))));
    }
}

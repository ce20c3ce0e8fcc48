//! Invite codes: issuing, public preview, redemption.

use chrono::{Duration, Utc};
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::DomainError;
use crate::models::invite::{
    generate_invite_code, CreateInviteRequest, GroupInvite, InvitePreview, NewInvite,
    DEFAULT_INVITE_EXPIRY_HOURS, INVITE_CODE_REGEX,
};
use crate::models::GroupMember;
use crate::services::require_membership;
use crate::stores::{StoreError, Stores};

/// Collisions in the code space are vanishingly rare; a couple of
/// retries cover them.
const CODE_RETRY_LIMIT: usize = 3;

#[derive(Debug, Clone)]
pub struct InviteService {
    stores: Stores,
}

impl InviteService {
    pub fn new(stores: Stores) -> Self {
        Self { stores }
    }

    /// Issues an invite code for a group. Any current member may invite;
    /// admin rights are not required.
    pub async fn create_invite(
        &self,
        caller: Uuid,
        group_id: Uuid,
        req: &CreateInviteRequest,
    ) -> Result<GroupInvite, DomainError> {
        require_membership(&self.stores, group_id, caller).await?;

        let hours = req.expires_in_hours.unwrap_or(DEFAULT_INVITE_EXPIRY_HOURS);
        let expires_at = Utc::now() + Duration::hours(hours);

        for _ in 0..CODE_RETRY_LIMIT {
            let new = NewInvite {
                group_id,
                code: generate_invite_code(),
                created_by: caller,
                expires_at,
            };
            match self.stores.invites.create(&new).await {
                Ok(invite) => {
                    info!(
                        group_id = %group_id,
                        code = %invite.code,
                        created_by = %caller,
                        expires_at = %invite.expires_at,
                        "invite created"
                    );
                    return Ok(invite);
                }
                Err(StoreError::Duplicate(_)) => {
                    warn!(group_id = %group_id, "invite code collision, regenerating");
                }
                Err(e) => return Err(e.into()),
            }
        }
        Err(DomainError::Storage(
            "could not allocate a unique invite code".into(),
        ))
    }

    /// Unauthenticated preview of what an invite joins.
    pub async fn preview_invite(&self, code: &str) -> Result<InvitePreview, DomainError> {
        let invite = self.find_invite(code).await?;
        let group = self
            .stores
            .groups
            .find_by_id(invite.group_id)
            .await?
            .ok_or_else(|| DomainError::NotFound("Group not found".into()))?;
        let current_members = self.stores.groups.count_members(group.id).await?;
        let is_valid =
            !invite.is_expired(Utc::now()) && current_members < i64::from(group.member_count);

        Ok(InvitePreview {
            code: invite.code,
            group_name: group.name,
            group_status: group.status,
            current_members,
            member_count: group.member_count,
            expires_at: invite.expires_at,
            is_valid,
        })
    }

    /// Joins the caller to the invite's group as a non-admin member.
    pub async fn redeem_invite(
        &self,
        caller: Uuid,
        code: &str,
    ) -> Result<GroupMember, DomainError> {
        let invite = self.find_invite(code).await?;
        if invite.is_expired(Utc::now()) {
            return Err(DomainError::Conflict("Invite code has expired".into()));
        }

        let group = self
            .stores
            .groups
            .find_by_id(invite.group_id)
            .await?
            .ok_or_else(|| DomainError::NotFound("Group not found".into()))?;
        let current_members = self.stores.groups.count_members(group.id).await?;
        if current_members >= i64::from(group.member_count) {
            return Err(DomainError::Conflict("Group is already full".into()));
        }

        match self.stores.groups.add_member(group.id, caller, false).await {
            Ok(member) => {
                info!(
                    group_id = %group.id,
                    user_id = %caller,
                    code = %invite.code,
                    "invite redeemed"
                );
                Ok(member)
            }
            Err(StoreError::Duplicate(_)) => Err(DomainError::Conflict(
                "You are already a member of this group".into(),
            )),
            Err(e) => Err(e.into()),
        }
    }

    /// Normalizes the user-entered code and resolves it. A code that
    /// does not match the `XXX-XXX-XXX` shape cannot exist.
    async fn find_invite(&self, code: &str) -> Result<GroupInvite, DomainError> {
        let normalized = code.trim().to_ascii_uppercase();
        if !INVITE_CODE_REGEX.is_match(&normalized) {
            return Err(DomainError::NotFound("Invite not found".into()));
        }
        self.stores
            .invites
            .find_by_code(&normalized)
            .await?
            .ok_or_else(|| DomainError::NotFound("Invite not found".into()))
    }
}

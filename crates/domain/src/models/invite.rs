//! Invite domain models for group invitations.
//!
//! Invites are random expiring codes; anyone holding a live code may join
//! until the group reaches its target size. There is no revocation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use super::group::GroupStatus;

/// Default invite lifetime when the request does not specify one.
pub const DEFAULT_INVITE_EXPIRY_HOURS: i64 = 72;
/// Hard cap on invite lifetime (one week).
pub const MAX_INVITE_EXPIRY_HOURS: i64 = 168;

/// Represents a group invitation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct GroupInvite {
    pub id: Uuid,
    pub group_id: Uuid,
    pub code: String,
    pub created_by: Uuid,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl GroupInvite {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

/// Insert payload for a new invite.
#[derive(Debug, Clone)]
pub struct NewInvite {
    pub group_id: Uuid,
    pub code: String,
    pub created_by: Uuid,
    pub expires_at: DateTime<Utc>,
}

/// Request to create a new invite.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "snake_case")]
pub struct CreateInviteRequest {
    /// Hours until expiry (1-168, default: 72)
    #[validate(range(
        min = 1,
        max = 168,
        message = "expires_in_hours must be between 1 and 168"
    ))]
    pub expires_in_hours: Option<i64>,
}

/// Response after creating an invite.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct InviteResponse {
    pub id: Uuid,
    pub group_id: Uuid,
    pub code: String,
    pub created_by: Uuid,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl From<GroupInvite> for InviteResponse {
    fn from(invite: GroupInvite) -> Self {
        Self {
            id: invite.id,
            group_id: invite.group_id,
            code: invite.code,
            created_by: invite.created_by,
            expires_at: invite.expires_at,
            created_at: invite.created_at,
        }
    }
}

/// Public invite info (for GET /invites/:code without auth).
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct InvitePreview {
    pub code: String,
    pub group_name: String,
    pub group_status: GroupStatus,
    pub current_members: i64,
    pub member_count: i32,
    pub expires_at: DateTime<Utc>,
    /// False once the code is expired or the group is full.
    pub is_valid: bool,
}

lazy_static::lazy_static! {
    pub static ref INVITE_CODE_REGEX: regex::Regex =
        regex::Regex::new(r"^[A-Z0-9]{3}-[A-Z0-9]{3}-[A-Z0-9]{3}$").unwrap();
}

/// Generate a random invite code in XXX-XXX-XXX format.
pub fn generate_invite_code() -> String {
    use rand::Rng;
    let mut rng = rand::thread_rng();
    let chars: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789"; // Avoiding confusing chars: 0, O, I, 1

    let mut generate_segment = || -> String {
        (0..3)
            .map(|_| {
                let idx = rng.gen_range(0..chars.len());
                chars[idx] as char
            })
            .collect()
    };

    format!(
        "{}-{}-{}",
        generate_segment(),
        generate_segment(),
        generate_segment()
    )
}

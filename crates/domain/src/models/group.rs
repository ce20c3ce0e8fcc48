//! Arisan group domain models.

use chrono::{DateTime, Duration, Months, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;
use validator::Validate;

use crate::models::user::UserPublic;

/// Minimum and maximum target size of an arisan group.
pub const MIN_MEMBER_COUNT: i32 = 2;
pub const MAX_MEMBER_COUNT: i32 = 20;

/// Lifecycle status of a group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GroupStatus {
    Active,
    Completed,
    Paused,
}

impl GroupStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            GroupStatus::Active => "active",
            GroupStatus::Completed => "completed",
            GroupStatus::Paused => "paused",
        }
    }

    /// Allowed status transitions: active ⇄ paused, active → completed.
    /// `completed` is terminal.
    pub fn can_transition_to(&self, next: GroupStatus) -> bool {
        matches!(
            (self, next),
            (GroupStatus::Active, GroupStatus::Paused)
                | (GroupStatus::Active, GroupStatus::Completed)
                | (GroupStatus::Paused, GroupStatus::Active)
        )
    }
}

impl FromStr for GroupStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "active" => Ok(GroupStatus::Active),
            "completed" => Ok(GroupStatus::Completed),
            "paused" => Ok(GroupStatus::Paused),
            _ => Err(format!("Invalid group status: {}", s)),
        }
    }
}

impl fmt::Display for GroupStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Contribution cadence of a group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Frequency {
    Weekly,
    Monthly,
}

impl Frequency {
    pub fn as_str(&self) -> &'static str {
        match self {
            Frequency::Weekly => "weekly",
            Frequency::Monthly => "monthly",
        }
    }

    /// Computes the payment deadline for a round created at `from`.
    ///
    /// Weekly rounds are due 7 days later; monthly rounds one calendar
    /// month later, with the day-of-month clamped to the end of shorter
    /// months (Jan 31 → Feb 28).
    pub fn deadline_from(&self, from: DateTime<Utc>) -> DateTime<Utc> {
        match self {
            Frequency::Weekly => from + Duration::days(7),
            Frequency::Monthly => from
                .checked_add_months(Months::new(1))
                .unwrap_or(from + Duration::days(30)),
        }
    }
}

impl FromStr for Frequency {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "weekly" => Ok(Frequency::Weekly),
            "monthly" => Ok(Frequency::Monthly),
            _ => Err(format!("Invalid frequency: {}", s)),
        }
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Represents a rotating-savings group.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Group {
    pub id: Uuid,
    pub name: String,
    /// Contribution per member per round, in rupiah.
    pub contribution_amount: i64,
    pub frequency: Frequency,
    /// Target size fixed at creation; the denominator for "group full".
    pub member_count: i32,
    pub start_date: NaiveDate,
    pub status: GroupStatus,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Represents a user's membership in a group.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct GroupMember {
    pub id: Uuid,
    pub group_id: Uuid,
    pub user_id: Uuid,
    pub is_admin: bool,
    pub joined_at: DateTime<Utc>,
}

/// Request payload for creating a group.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "snake_case")]
pub struct CreateGroupRequest {
    #[validate(length(
        min = 1,
        max = 100,
        message = "Name must be between 1 and 100 characters"
    ))]
    pub name: String,

    #[validate(range(min = 1, message = "Contribution amount must be at least 1"))]
    pub contribution_amount: i64,

    pub frequency: Frequency,

    #[validate(range(min = 2, max = 20, message = "Member count must be between 2 and 20"))]
    pub member_count: i32,

    pub start_date: NaiveDate,
}

/// Request payload for partially updating a group.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "snake_case")]
pub struct UpdateGroupRequest {
    #[validate(length(
        min = 1,
        max = 100,
        message = "Name must be between 1 and 100 characters"
    ))]
    pub name: Option<String>,

    #[validate(range(min = 1, message = "Contribution amount must be at least 1"))]
    pub contribution_amount: Option<i64>,

    pub frequency: Option<Frequency>,

    pub status: Option<GroupStatus>,

    pub start_date: Option<NaiveDate>,
}

impl UpdateGroupRequest {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.contribution_amount.is_none()
            && self.frequency.is_none()
            && self.status.is_none()
            && self.start_date.is_none()
    }
}

/// Store projection: a group joined with one user's membership row and the
/// live member count.
#[derive(Debug, Clone)]
pub struct GroupWithMembership {
    pub group: Group,
    pub membership: GroupMember,
    pub current_members: i64,
}

/// Store projection: a membership row joined with user display fields.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct MemberWithUser {
    pub id: Uuid,
    pub group_id: Uuid,
    pub user: UserPublic,
    pub is_admin: bool,
    pub joined_at: DateTime<Utc>,
}

/// Response for group listing.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct GroupSummary {
    pub id: Uuid,
    pub name: String,
    pub contribution_amount: i64,
    pub frequency: Frequency,
    pub member_count: i32,
    pub current_members: i64,
    pub start_date: NaiveDate,
    pub status: GroupStatus,
    pub is_admin: bool,
    pub joined_at: DateTime<Utc>,
}

impl From<GroupWithMembership> for GroupSummary {
    fn from(gm: GroupWithMembership) -> Self {
        Self {
            id: gm.group.id,
            name: gm.group.name,
            contribution_amount: gm.group.contribution_amount,
            frequency: gm.group.frequency,
            member_count: gm.group.member_count,
            current_members: gm.current_members,
            start_date: gm.group.start_date,
            status: gm.group.status,
            is_admin: gm.membership.is_admin,
            joined_at: gm.membership.joined_at,
        }
    }
}

/// Response for group detail.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct GroupDetail {
    pub id: Uuid,
    pub name: String,
    pub contribution_amount: i64,
    pub frequency: Frequency,
    pub member_count: i32,
    pub current_members: i64,
    pub start_date: NaiveDate,
    pub status: GroupStatus,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub is_admin: bool,
    pub members: Vec<MemberWithUser>,
}

impl GroupDetail {
    pub fn new(group: Group, is_admin: bool, members: Vec<MemberWithUser>) -> Self {
        Self {
            id: group.id,
            name: group.name,
            contribution_amount: group.contribution_amount,
            frequency: group.frequency,
            member_count: group.member_count,
            current_members: members.len() as i64,
            start_date: group.start_date,
            status: group.status,
            created_by: group.created_by,
            created_at: group.created_at,
            updated_at: group.updated_at,
            is_admin,
            members,
        }
    }
}

/// Response for listing the caller's groups.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct ListGroupsResponse {
    pub data: Vec<GroupSummary>,
    pub count: usize,
}

/// Response for listing group members.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct ListMembersResponse {
    pub data: Vec<MemberWithUser>,
    pub count: usize,
}

/// Response when removing a member.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct RemoveMemberResponse {
    pub removed: bool,
    pub group_id: Uuid,
    pub user_id: Uuid,
}

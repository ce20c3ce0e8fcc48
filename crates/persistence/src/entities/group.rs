//! Group and membership entities (database row mappings).

use chrono::{DateTime, NaiveDate, Utc};
use domain::models::group::{Frequency, Group, GroupMember, GroupStatus, GroupWithMembership};
use domain::models::user::UserPublic;
use sqlx::FromRow;
use uuid::Uuid;

/// Database enum for group_frequency that maps to PostgreSQL enum type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "group_frequency", rename_all = "lowercase")]
pub enum FrequencyDb {
    Weekly,
    Monthly,
}

impl From<FrequencyDb> for Frequency {
    fn from(db: FrequencyDb) -> Self {
        match db {
            FrequencyDb::Weekly => Frequency::Weekly,
            FrequencyDb::Monthly => Frequency::Monthly,
        }
    }
}

impl From<Frequency> for FrequencyDb {
    fn from(frequency: Frequency) -> Self {
        match frequency {
            Frequency::Weekly => FrequencyDb::Weekly,
            Frequency::Monthly => FrequencyDb::Monthly,
        }
    }
}

/// Database enum for group_status that maps to PostgreSQL enum type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "group_status", rename_all = "lowercase")]
pub enum GroupStatusDb {
    Active,
    Completed,
    Paused,
}

impl From<GroupStatusDb> for GroupStatus {
    fn from(db: GroupStatusDb) -> Self {
        match db {
            GroupStatusDb::Active => GroupStatus::Active,
            GroupStatusDb::Completed => GroupStatus::Completed,
            GroupStatusDb::Paused => GroupStatus::Paused,
        }
    }
}

impl From<GroupStatus> for GroupStatusDb {
    fn from(status: GroupStatus) -> Self {
        match status {
            GroupStatus::Active => GroupStatusDb::Active,
            GroupStatus::Completed => GroupStatusDb::Completed,
            GroupStatus::Paused => GroupStatusDb::Paused,
        }
    }
}

/// Database row mapping for the groups table.
#[derive(Debug, Clone, FromRow)]
pub struct GroupEntity {
    pub id: Uuid,
    pub name: String,
    pub contribution_amount: i64,
    pub frequency: FrequencyDb,
    pub member_count: i32,
    pub start_date: NaiveDate,
    pub status: GroupStatusDb,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<GroupEntity> for Group {
    fn from(entity: GroupEntity) -> Self {
        Self {
            id: entity.id,
            name: entity.name,
            contribution_amount: entity.contribution_amount,
            frequency: entity.frequency.into(),
            member_count: entity.member_count,
            start_date: entity.start_date,
            status: entity.status.into(),
            created_by: entity.created_by,
            created_at: entity.created_at,
            updated_at: entity.updated_at,
        }
    }
}

/// Database row mapping for the group_members table.
#[derive(Debug, Clone, FromRow)]
pub struct GroupMemberEntity {
    pub id: Uuid,
    pub group_id: Uuid,
    pub user_id: Uuid,
    pub is_admin: bool,
    pub joined_at: DateTime<Utc>,
}

impl From<GroupMemberEntity> for GroupMember {
    fn from(entity: GroupMemberEntity) -> Self {
        Self {
            id: entity.id,
            group_id: entity.group_id,
            user_id: entity.user_id,
            is_admin: entity.is_admin,
            joined_at: entity.joined_at,
        }
    }
}

/// Group row joined with one user's membership and the live member count.
#[derive(Debug, Clone, FromRow)]
pub struct GroupWithMembershipEntity {
    pub id: Uuid,
    pub name: String,
    pub contribution_amount: i64,
    pub frequency: FrequencyDb,
    pub member_count: i32,
    pub start_date: NaiveDate,
    pub status: GroupStatusDb,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    // Membership fields
    pub membership_id: Uuid,
    pub membership_user_id: Uuid,
    pub is_admin: bool,
    pub joined_at: DateTime<Utc>,
    // Aggregates
    pub current_members: i64,
}

impl From<GroupWithMembershipEntity> for GroupWithMembership {
    fn from(entity: GroupWithMembershipEntity) -> Self {
        Self {
            membership: GroupMember {
                id: entity.membership_id,
                group_id: entity.id,
                user_id: entity.membership_user_id,
                is_admin: entity.is_admin,
                joined_at: entity.joined_at,
            },
            group: Group {
                id: entity.id,
                name: entity.name,
                contribution_amount: entity.contribution_amount,
                frequency: entity.frequency.into(),
                member_count: entity.member_count,
                start_date: entity.start_date,
                status: entity.status.into(),
                created_by: entity.created_by,
                created_at: entity.created_at,
                updated_at: entity.updated_at,
            },
            current_members: entity.current_members,
        }
    }
}

/// Membership row joined with user display fields for listing members.
#[derive(Debug, Clone, FromRow)]
pub struct MemberWithUserEntity {
    // Membership fields
    pub id: Uuid,
    pub group_id: Uuid,
    pub user_id: Uuid,
    pub is_admin: bool,
    pub joined_at: DateTime<Utc>,
    // User fields
    pub full_name: String,
    pub avatar_url: Option<String>,
}

impl From<MemberWithUserEntity> for domain::models::group::MemberWithUser {
    fn from(entity: MemberWithUserEntity) -> Self {
        Self {
            id: entity.id,
            group_id: entity.group_id,
            user: UserPublic {
                id: entity.user_id,
                full_name: entity.full_name,
                avatar_url: entity.avatar_url,
            },
            is_admin: entity.is_admin,
            joined_at: entity.joined_at,
        }
    }
}

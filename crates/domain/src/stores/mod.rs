//! Store traits: one per entity, implemented by the PostgreSQL
//! repositories in the persistence crate and by [`InMemoryStore`] for
//! tests. Manager services depend only on these traits.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

use crate::models::group::{
    CreateGroupRequest, Group, GroupMember, GroupWithMembership, MemberWithUser,
    UpdateGroupRequest,
};
use crate::models::invite::{GroupInvite, NewInvite};
use crate::models::otp::{NewOtpCode, OtpCode};
use crate::models::payment::{NewPayment, Payment, PaymentWithUser, UserPaymentView};
use crate::models::round::{Round, RoundWithWinner};
use crate::models::user::User;

pub mod memory;

pub use memory::InMemoryStore;

/// Errors surfaced by store implementations.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Record not found")]
    NotFound,

    #[error("Duplicate record: {0}")]
    Duplicate(String),

    #[error("Referenced record missing: {0}")]
    ForeignKey(String),

    #[error("Database error: {0}")]
    Database(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => StoreError::NotFound,
            sqlx::Error::Database(db_err) => {
                let constraint = || {
                    db_err
                        .constraint()
                        .unwrap_or("unnamed constraint")
                        .to_string()
                };
                match db_err.code().as_deref() {
                    Some("23505") => StoreError::Duplicate(constraint()),
                    Some("23503") => StoreError::ForeignKey(constraint()),
                    _ => StoreError::Database(db_err.to_string()),
                }
            }
            other => StoreError::Database(other.to_string()),
        }
    }
}

/// Store for user rows.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Creates a user with an empty profile. Fails with
    /// [`StoreError::Duplicate`] if the phone is taken.
    async fn create(&self, phone: &str) -> Result<User, StoreError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError>;

    async fn find_by_phone(&self, phone: &str) -> Result<Option<User>, StoreError>;

    /// Partial profile update; `None` fields keep their current value.
    async fn update_profile(
        &self,
        id: Uuid,
        full_name: Option<&str>,
        avatar_url: Option<&str>,
    ) -> Result<Option<User>, StoreError>;
}

/// Store for groups and their membership rows.
#[async_trait]
pub trait GroupStore: Send + Sync {
    /// Inserts the group and the creator's admin membership atomically.
    async fn create_with_admin(
        &self,
        req: &CreateGroupRequest,
        created_by: Uuid,
    ) -> Result<(Group, GroupMember), StoreError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Group>, StoreError>;

    /// Partial update; `None` fields keep their current value.
    async fn update(
        &self,
        id: Uuid,
        changes: &UpdateGroupRequest,
    ) -> Result<Option<Group>, StoreError>;

    /// Groups the user belongs to, joined with their membership row and
    /// the live member count, newest membership first.
    async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<GroupWithMembership>, StoreError>;

    /// Fails with [`StoreError::Duplicate`] if the user is already a member.
    async fn add_member(
        &self,
        group_id: Uuid,
        user_id: Uuid,
        is_admin: bool,
    ) -> Result<GroupMember, StoreError>;

    async fn find_member(
        &self,
        group_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<GroupMember>, StoreError>;

    /// Members joined with user display fields, oldest membership first.
    async fn list_members(&self, group_id: Uuid) -> Result<Vec<MemberWithUser>, StoreError>;

    async fn member_ids(&self, group_id: Uuid) -> Result<Vec<Uuid>, StoreError>;

    async fn count_members(&self, group_id: Uuid) -> Result<i64, StoreError>;

    /// Returns false when no membership row existed.
    async fn remove_member(&self, group_id: Uuid, user_id: Uuid) -> Result<bool, StoreError>;

    async fn set_member_admin(
        &self,
        group_id: Uuid,
        user_id: Uuid,
        is_admin: bool,
    ) -> Result<Option<GroupMember>, StoreError>;
}

/// Store for rounds.
#[async_trait]
pub trait RoundStore: Send + Sync {
    /// Inserts the round and one pending payment per member atomically,
    /// snapshotting `amount` into every payment row.
    async fn create_with_payments(
        &self,
        group_id: Uuid,
        round_number: i32,
        payment_deadline: DateTime<Utc>,
        amount: i64,
        member_ids: &[Uuid],
    ) -> Result<Round, StoreError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Round>, StoreError>;

    async fn find_with_winner(&self, id: Uuid) -> Result<Option<RoundWithWinner>, StoreError>;

    /// Rounds of a group with winner display fields, newest first.
    async fn list_for_group(&self, group_id: Uuid) -> Result<Vec<RoundWithWinner>, StoreError>;

    async fn max_round_number(&self, group_id: Uuid) -> Result<Option<i32>, StoreError>;

    /// Distinct winners over all rounds of the group.
    async fn past_winner_ids(&self, group_id: Uuid) -> Result<Vec<Uuid>, StoreError>;

    /// Atomic set-if-null. Returns false when a winner was already set,
    /// so a concurrent second selection loses cleanly.
    async fn set_winner_if_unset(&self, id: Uuid, winner_id: Uuid) -> Result<bool, StoreError>;

    /// Atomic completion guarded on `pending` status and a present winner.
    /// Returns false when the guard did not match.
    async fn complete_if_pending(
        &self,
        id: Uuid,
        completed_at: DateTime<Utc>,
    ) -> Result<bool, StoreError>;
}

/// Store for payment rows.
#[async_trait]
pub trait PaymentStore: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Payment>, StoreError>;

    async fn find_by_round_and_user(
        &self,
        round_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<Payment>, StoreError>;

    /// Inserts a pending payment row. Fails with [`StoreError::Duplicate`]
    /// if a row for (round, user) already exists.
    async fn insert(&self, new: &NewPayment) -> Result<Payment, StoreError>;

    /// Records a proof submission: new proof reference, method, paid_at,
    /// and status reset to pending (resubmission semantics).
    async fn record_submission(
        &self,
        id: Uuid,
        proof_url: &str,
        payment_method: &str,
        paid_at: DateTime<Utc>,
    ) -> Result<Option<Payment>, StoreError>;

    /// Marks a payment verified by an admin.
    async fn mark_paid(
        &self,
        id: Uuid,
        paid_at: DateTime<Utc>,
    ) -> Result<Option<Payment>, StoreError>;

    /// Payments of a round joined with payer display fields.
    async fn list_for_round(&self, round_id: Uuid) -> Result<Vec<PaymentWithUser>, StoreError>;

    /// The user's payments with round/group context, optionally scoped to
    /// one group, newest first.
    async fn list_for_user(
        &self,
        user_id: Uuid,
        group_id: Option<Uuid>,
    ) -> Result<Vec<UserPaymentView>, StoreError>;
}

/// Store for invite codes.
#[async_trait]
pub trait InviteStore: Send + Sync {
    /// Fails with [`StoreError::Duplicate`] on a code collision.
    async fn create(&self, invite: &NewInvite) -> Result<GroupInvite, StoreError>;

    async fn find_by_code(&self, code: &str) -> Result<Option<GroupInvite>, StoreError>;
}

/// Store for OTP codes.
#[async_trait]
pub trait OtpStore: Send + Sync {
    /// Inserts a fresh code, discarding any live code for the same phone.
    async fn replace_for_phone(&self, new: &NewOtpCode) -> Result<OtpCode, StoreError>;

    async fn find_latest_unconsumed(&self, phone: &str) -> Result<Option<OtpCode>, StoreError>;

    /// Bumps the attempt counter and returns the new value.
    async fn increment_attempts(&self, id: Uuid) -> Result<i32, StoreError>;

    async fn consume(&self, id: Uuid, at: DateTime<Utc>) -> Result<(), StoreError>;
}

/// Registry of all entity stores, shared across services and handlers.
#[derive(Clone)]
pub struct Stores {
    pub users: Arc<dyn UserStore>,
    pub groups: Arc<dyn GroupStore>,
    pub rounds: Arc<dyn RoundStore>,
    pub payments: Arc<dyn PaymentStore>,
    pub invites: Arc<dyn InviteStore>,
    pub otp_codes: Arc<dyn OtpStore>,
}

impl Stores {
    /// Registry backed by a single shared in-memory store.
    pub fn in_memory() -> Self {
        let store = Arc::new(InMemoryStore::new());
        Self {
            users: store.clone(),
            groups: store.clone(),
            rounds: store.clone(),
            payments: store.clone(),
            invites: store.clone(),
            otp_codes: store,
        }
    }
}

impl std::fmt::Debug for Stores {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Stores").finish_non_exhaustive()
    }
}

//! In-memory implementation of every store trait.
//!
//! Backs the manager-service unit tests and the API integration tests.
//! Mirrors the PostgreSQL constraints (unique pairs, foreign keys, the
//! conditional winner/completion updates) so tests exercise the same
//! failure paths as production.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashSet;
use std::sync::{Mutex, MutexGuard};
use uuid::Uuid;

use crate::models::group::{
    CreateGroupRequest, Group, GroupMember, GroupStatus, GroupWithMembership, MemberWithUser,
    UpdateGroupRequest,
};
use crate::models::invite::{GroupInvite, NewInvite};
use crate::models::otp::{NewOtpCode, OtpCode};
use crate::models::payment::{
    NewPayment, Payment, PaymentStatus, PaymentWithUser, UserPaymentView,
};
use crate::models::round::{Round, RoundStatus, RoundWithWinner};
use crate::models::user::{User, UserPublic};
use crate::stores::{
    GroupStore, InviteStore, OtpStore, PaymentStore, RoundStore, StoreError, UserStore,
};

#[derive(Debug, Default)]
struct Inner {
    users: Vec<User>,
    groups: Vec<Group>,
    members: Vec<GroupMember>,
    rounds: Vec<Round>,
    payments: Vec<Payment>,
    invites: Vec<GroupInvite>,
    otp_codes: Vec<OtpCode>,
}

/// Shared in-memory store; one instance implements every store trait.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    inner: Mutex<Inner>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl UserStore for InMemoryStore {
    async fn create(&self, phone: &str) -> Result<User, StoreError> {
        let mut inner = self.lock();
        if inner.users.iter().any(|u| u.phone == phone) {
            return Err(StoreError::Duplicate("users_phone_key".into()));
        }
        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            phone: phone.to_string(),
            full_name: String::new(),
            avatar_url: None,
            created_at: now,
            updated_at: now,
        };
        inner.users.push(user.clone());
        Ok(user)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        let inner = self.lock();
        Ok(inner.users.iter().find(|u| u.id == id).cloned())
    }

    async fn find_by_phone(&self, phone: &str) -> Result<Option<User>, StoreError> {
        let inner = self.lock();
        Ok(inner.users.iter().find(|u| u.phone == phone).cloned())
    }

    async fn update_profile(
        &self,
        id: Uuid,
        full_name: Option<&str>,
        avatar_url: Option<&str>,
    ) -> Result<Option<User>, StoreError> {
        let mut inner = self.lock();
        let Some(user) = inner.users.iter_mut().find(|u| u.id == id) else {
            return Ok(None);
        };
        if let Some(name) = full_name {
            user.full_name = name.to_string();
        }
        if let Some(url) = avatar_url {
            user.avatar_url = Some(url.to_string());
        }
        user.updated_at = Utc::now();
        Ok(Some(user.clone()))
    }
}

#[async_trait]
impl GroupStore for InMemoryStore {
    async fn create_with_admin(
        &self,
        req: &CreateGroupRequest,
        created_by: Uuid,
    ) -> Result<(Group, GroupMember), StoreError> {
        let mut inner = self.lock();
        if !inner.users.iter().any(|u| u.id == created_by) {
            return Err(StoreError::ForeignKey("groups_created_by_fkey".into()));
        }
        let now = Utc::now();
        let group = Group {
            id: Uuid::new_v4(),
            name: req.name.clone(),
            contribution_amount: req.contribution_amount,
            frequency: req.frequency,
            member_count: req.member_count,
            start_date: req.start_date,
            status: GroupStatus::Active,
            created_by: Some(created_by),
            created_at: now,
            updated_at: now,
        };
        let membership = GroupMember {
            id: Uuid::new_v4(),
            group_id: group.id,
            user_id: created_by,
            is_admin: true,
            joined_at: now,
        };
        inner.groups.push(group.clone());
        inner.members.push(membership.clone());
        Ok((group, membership))
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Group>, StoreError> {
        let inner = self.lock();
        Ok(inner.groups.iter().find(|g| g.id == id).cloned())
    }

    async fn update(
        &self,
        id: Uuid,
        changes: &UpdateGroupRequest,
    ) -> Result<Option<Group>, StoreError> {
        let mut inner = self.lock();
        let Some(group) = inner.groups.iter_mut().find(|g| g.id == id) else {
            return Ok(None);
        };
        if let Some(name) = &changes.name {
            group.name = name.clone();
        }
        if let Some(amount) = changes.contribution_amount {
            group.contribution_amount = amount;
        }
        if let Some(frequency) = changes.frequency {
            group.frequency = frequency;
        }
        if let Some(status) = changes.status {
            group.status = status;
        }
        if let Some(start_date) = changes.start_date {
            group.start_date = start_date;
        }
        group.updated_at = Utc::now();
        Ok(Some(group.clone()))
    }

    async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<GroupWithMembership>, StoreError> {
        let inner = self.lock();
        let mut memberships: Vec<&GroupMember> = inner
            .members
            .iter()
            .filter(|m| m.user_id == user_id)
            .collect();
        memberships.sort_by(|a, b| b.joined_at.cmp(&a.joined_at));

        let result = memberships
            .into_iter()
            .filter_map(|membership| {
                let group = inner.groups.iter().find(|g| g.id == membership.group_id)?;
                let current_members = inner
                    .members
                    .iter()
                    .filter(|m| m.group_id == group.id)
                    .count() as i64;
                Some(GroupWithMembership {
                    group: group.clone(),
                    membership: membership.clone(),
                    current_members,
                })
            })
            .collect();
        Ok(result)
    }

    async fn add_member(
        &self,
        group_id: Uuid,
        user_id: Uuid,
        is_admin: bool,
    ) -> Result<GroupMember, StoreError> {
        let mut inner = self.lock();
        if !inner.groups.iter().any(|g| g.id == group_id) {
            return Err(StoreError::ForeignKey("group_members_group_id_fkey".into()));
        }
        if !inner.users.iter().any(|u| u.id == user_id) {
            return Err(StoreError::ForeignKey("group_members_user_id_fkey".into()));
        }
        if inner
            .members
            .iter()
            .any(|m| m.group_id == group_id && m.user_id == user_id)
        {
            return Err(StoreError::Duplicate(
                "group_members_group_id_user_id_key".into(),
            ));
        }
        let member = GroupMember {
            id: Uuid::new_v4(),
            group_id,
            user_id,
            is_admin,
            joined_at: Utc::now(),
        };
        inner.members.push(member.clone());
        Ok(member)
    }

    async fn find_member(
        &self,
        group_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<GroupMember>, StoreError> {
        let inner = self.lock();
        Ok(inner
            .members
            .iter()
            .find(|m| m.group_id == group_id && m.user_id == user_id)
            .cloned())
    }

    async fn list_members(&self, group_id: Uuid) -> Result<Vec<MemberWithUser>, StoreError> {
        let inner = self.lock();
        let mut members: Vec<&GroupMember> = inner
            .members
            .iter()
            .filter(|m| m.group_id == group_id)
            .collect();
        members.sort_by_key(|m| m.joined_at);

        let result = members
            .into_iter()
            .filter_map(|member| {
                let user = inner.users.iter().find(|u| u.id == member.user_id)?;
                Some(MemberWithUser {
                    id: member.id,
                    group_id: member.group_id,
                    user: UserPublic::from(user),
                    is_admin: member.is_admin,
                    joined_at: member.joined_at,
                })
            })
            .collect();
        Ok(result)
    }

    async fn member_ids(&self, group_id: Uuid) -> Result<Vec<Uuid>, StoreError> {
        let inner = self.lock();
        Ok(inner
            .members
            .iter()
            .filter(|m| m.group_id == group_id)
            .map(|m| m.user_id)
            .collect())
    }

    async fn count_members(&self, group_id: Uuid) -> Result<i64, StoreError> {
        let inner = self.lock();
        Ok(inner
            .members
            .iter()
            .filter(|m| m.group_id == group_id)
            .count() as i64)
    }

    async fn remove_member(&self, group_id: Uuid, user_id: Uuid) -> Result<bool, StoreError> {
        let mut inner = self.lock();
        let before = inner.members.len();
        inner
            .members
            .retain(|m| !(m.group_id == group_id && m.user_id == user_id));
        Ok(inner.members.len() < before)
    }

    async fn set_member_admin(
        &self,
        group_id: Uuid,
        user_id: Uuid,
        is_admin: bool,
    ) -> Result<Option<GroupMember>, StoreError> {
        let mut inner = self.lock();
        let Some(member) = inner
            .members
            .iter_mut()
            .find(|m| m.group_id == group_id && m.user_id == user_id)
        else {
            return Ok(None);
        };
        member.is_admin = is_admin;
        Ok(Some(member.clone()))
    }
}

#[async_trait]
impl RoundStore for InMemoryStore {
    async fn create_with_payments(
        &self,
        group_id: Uuid,
        round_number: i32,
        payment_deadline: DateTime<Utc>,
        amount: i64,
        member_ids: &[Uuid],
    ) -> Result<Round, StoreError> {
        let mut inner = self.lock();
        if !inner.groups.iter().any(|g| g.id == group_id) {
            return Err(StoreError::ForeignKey("rounds_group_id_fkey".into()));
        }
        if inner
            .rounds
            .iter()
            .any(|r| r.group_id == group_id && r.round_number == round_number)
        {
            return Err(StoreError::Duplicate(
                "rounds_group_id_round_number_key".into(),
            ));
        }
        let now = Utc::now();
        let round = Round {
            id: Uuid::new_v4(),
            group_id,
            round_number,
            winner_id: None,
            payment_deadline,
            status: RoundStatus::Pending,
            created_at: now,
            completed_at: None,
        };
        inner.rounds.push(round.clone());
        for &user_id in member_ids {
            inner.payments.push(Payment {
                id: Uuid::new_v4(),
                round_id: round.id,
                user_id,
                amount,
                status: PaymentStatus::Pending,
                payment_method: None,
                proof_url: None,
                paid_at: None,
                created_at: now,
            });
        }
        Ok(round)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Round>, StoreError> {
        let inner = self.lock();
        Ok(inner.rounds.iter().find(|r| r.id == id).cloned())
    }

    async fn find_with_winner(&self, id: Uuid) -> Result<Option<RoundWithWinner>, StoreError> {
        let inner = self.lock();
        Ok(inner.rounds.iter().find(|r| r.id == id).map(|round| {
            let winner = round.winner_id.and_then(|winner_id| {
                inner
                    .users
                    .iter()
                    .find(|u| u.id == winner_id)
                    .map(UserPublic::from)
            });
            RoundWithWinner {
                round: round.clone(),
                winner,
            }
        }))
    }

    async fn list_for_group(&self, group_id: Uuid) -> Result<Vec<RoundWithWinner>, StoreError> {
        let inner = self.lock();
        let mut rounds: Vec<&Round> = inner
            .rounds
            .iter()
            .filter(|r| r.group_id == group_id)
            .collect();
        rounds.sort_by(|a, b| b.round_number.cmp(&a.round_number));

        let result = rounds
            .into_iter()
            .map(|round| {
                let winner = round.winner_id.and_then(|winner_id| {
                    inner
                        .users
                        .iter()
                        .find(|u| u.id == winner_id)
                        .map(UserPublic::from)
                });
                RoundWithWinner {
                    round: round.clone(),
                    winner,
                }
            })
            .collect();
        Ok(result)
    }

    async fn max_round_number(&self, group_id: Uuid) -> Result<Option<i32>, StoreError> {
        let inner = self.lock();
        Ok(inner
            .rounds
            .iter()
            .filter(|r| r.group_id == group_id)
            .map(|r| r.round_number)
            .max())
    }

    async fn past_winner_ids(&self, group_id: Uuid) -> Result<Vec<Uuid>, StoreError> {
        let inner = self.lock();
        let winners: HashSet<Uuid> = inner
            .rounds
            .iter()
            .filter(|r| r.group_id == group_id)
            .filter_map(|r| r.winner_id)
            .collect();
        Ok(winners.into_iter().collect())
    }

    async fn set_winner_if_unset(&self, id: Uuid, winner_id: Uuid) -> Result<bool, StoreError> {
        let mut inner = self.lock();
        let Some(round) = inner.rounds.iter_mut().find(|r| r.id == id) else {
            return Ok(false);
        };
        if round.winner_id.is_some() {
            return Ok(false);
        }
        round.winner_id = Some(winner_id);
        Ok(true)
    }

    async fn complete_if_pending(
        &self,
        id: Uuid,
        completed_at: DateTime<Utc>,
    ) -> Result<bool, StoreError> {
        let mut inner = self.lock();
        let Some(round) = inner.rounds.iter_mut().find(|r| r.id == id) else {
            return Ok(false);
        };
        if round.status != RoundStatus::Pending || round.winner_id.is_none() {
            return Ok(false);
        }
        round.status = RoundStatus::Completed;
        round.completed_at = Some(completed_at);
        Ok(true)
    }
}

#[async_trait]
impl PaymentStore for InMemoryStore {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Payment>, StoreError> {
        let inner = self.lock();
        Ok(inner.payments.iter().find(|p| p.id == id).cloned())
    }

    async fn find_by_round_and_user(
        &self,
        round_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<Payment>, StoreError> {
        let inner = self.lock();
        Ok(inner
            .payments
            .iter()
            .find(|p| p.round_id == round_id && p.user_id == user_id)
            .cloned())
    }

    async fn insert(&self, new: &NewPayment) -> Result<Payment, StoreError> {
        let mut inner = self.lock();
        if !inner.rounds.iter().any(|r| r.id == new.round_id) {
            return Err(StoreError::ForeignKey("payments_round_id_fkey".into()));
        }
        if inner
            .payments
            .iter()
            .any(|p| p.round_id == new.round_id && p.user_id == new.user_id)
        {
            return Err(StoreError::Duplicate(
                "payments_round_id_user_id_key".into(),
            ));
        }
        let payment = Payment {
            id: Uuid::new_v4(),
            round_id: new.round_id,
            user_id: new.user_id,
            amount: new.amount,
            status: PaymentStatus::Pending,
            payment_method: new.payment_method.clone(),
            proof_url: new.proof_url.clone(),
            paid_at: new.paid_at,
            created_at: Utc::now(),
        };
        inner.payments.push(payment.clone());
        Ok(payment)
    }

    async fn record_submission(
        &self,
        id: Uuid,
        proof_url: &str,
        payment_method: &str,
        paid_at: DateTime<Utc>,
    ) -> Result<Option<Payment>, StoreError> {
        let mut inner = self.lock();
        let Some(payment) = inner.payments.iter_mut().find(|p| p.id == id) else {
            return Ok(None);
        };
        payment.proof_url = Some(proof_url.to_string());
        payment.payment_method = Some(payment_method.to_string());
        payment.paid_at = Some(paid_at);
        payment.status = PaymentStatus::Pending;
        Ok(Some(payment.clone()))
    }

    async fn mark_paid(
        &self,
        id: Uuid,
        paid_at: DateTime<Utc>,
    ) -> Result<Option<Payment>, StoreError> {
        let mut inner = self.lock();
        let Some(payment) = inner.payments.iter_mut().find(|p| p.id == id) else {
            return Ok(None);
        };
        payment.status = PaymentStatus::Paid;
        payment.paid_at = Some(paid_at);
        Ok(Some(payment.clone()))
    }

    async fn list_for_round(&self, round_id: Uuid) -> Result<Vec<PaymentWithUser>, StoreError> {
        let inner = self.lock();
        let mut payments: Vec<&Payment> = inner
            .payments
            .iter()
            .filter(|p| p.round_id == round_id)
            .collect();
        payments.sort_by_key(|p| p.created_at);

        let result = payments
            .into_iter()
            .filter_map(|payment| {
                let user = inner.users.iter().find(|u| u.id == payment.user_id)?;
                Some(PaymentWithUser {
                    id: payment.id,
                    round_id: payment.round_id,
                    user: UserPublic::from(user),
                    amount: payment.amount,
                    status: payment.status,
                    payment_method: payment.payment_method.clone(),
                    proof_url: payment.proof_url.clone(),
                    paid_at: payment.paid_at,
                    created_at: payment.created_at,
                })
            })
            .collect();
        Ok(result)
    }

    async fn list_for_user(
        &self,
        user_id: Uuid,
        group_id: Option<Uuid>,
    ) -> Result<Vec<UserPaymentView>, StoreError> {
        let inner = self.lock();
        let mut views: Vec<UserPaymentView> = inner
            .payments
            .iter()
            .filter(|p| p.user_id == user_id)
            .filter_map(|payment| {
                let round = inner.rounds.iter().find(|r| r.id == payment.round_id)?;
                if let Some(filter) = group_id {
                    if round.group_id != filter {
                        return None;
                    }
                }
                let group = inner.groups.iter().find(|g| g.id == round.group_id)?;
                Some(UserPaymentView {
                    id: payment.id,
                    round_id: payment.round_id,
                    round_number: round.round_number,
                    group_id: group.id,
                    group_name: group.name.clone(),
                    amount: payment.amount,
                    status: payment.status,
                    payment_method: payment.payment_method.clone(),
                    proof_url: payment.proof_url.clone(),
                    paid_at: payment.paid_at,
                    payment_deadline: round.payment_deadline,
                    created_at: payment.created_at,
                })
            })
            .collect();
        views.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(views)
    }
}

#[async_trait]
impl InviteStore for InMemoryStore {
    async fn create(&self, invite: &NewInvite) -> Result<GroupInvite, StoreError> {
        let mut inner = self.lock();
        if !inner.groups.iter().any(|g| g.id == invite.group_id) {
            return Err(StoreError::ForeignKey("group_invites_group_id_fkey".into()));
        }
        if inner.invites.iter().any(|i| i.code == invite.code) {
            return Err(StoreError::Duplicate("group_invites_code_key".into()));
        }
        let record = GroupInvite {
            id: Uuid::new_v4(),
            group_id: invite.group_id,
            code: invite.code.clone(),
            created_by: invite.created_by,
            expires_at: invite.expires_at,
            created_at: Utc::now(),
        };
        inner.invites.push(record.clone());
        Ok(record)
    }

    async fn find_by_code(&self, code: &str) -> Result<Option<GroupInvite>, StoreError> {
        let inner = self.lock();
        Ok(inner.invites.iter().find(|i| i.code == code).cloned())
    }
}

#[async_trait]
impl OtpStore for InMemoryStore {
    async fn replace_for_phone(&self, new: &NewOtpCode) -> Result<OtpCode, StoreError> {
        let mut inner = self.lock();
        inner
            .otp_codes
            .retain(|c| !(c.phone == new.phone && c.consumed_at.is_none()));
        let code = OtpCode {
            id: Uuid::new_v4(),
            phone: new.phone.clone(),
            code_hash: new.code_hash.clone(),
            expires_at: new.expires_at,
            attempts: 0,
            consumed_at: None,
            created_at: Utc::now(),
        };
        inner.otp_codes.push(code.clone());
        Ok(code)
    }

    async fn find_latest_unconsumed(&self, phone: &str) -> Result<Option<OtpCode>, StoreError> {
        let inner = self.lock();
        Ok(inner
            .otp_codes
            .iter()
            .filter(|c| c.phone == phone && c.consumed_at.is_none())
            .max_by_key(|c| c.created_at)
            .cloned())
    }

    async fn increment_attempts(&self, id: Uuid) -> Result<i32, StoreError> {
        let mut inner = self.lock();
        let Some(code) = inner.otp_codes.iter_mut().find(|c| c.id == id) else {
            return Err(StoreError::NotFound);
        };
        code.attempts += 1;
        Ok(code.attempts)
    }

    async fn consume(&self, id: Uuid, at: DateTime<Utc>) -> Result<(), StoreError> {
        let mut inner = self.lock();
        let Some(code) = inner.otp_codes.iter_mut().find(|c| c.id == id) else {
            return Err(StoreError::NotFound);
        };
        code.consumed_at = Some(at);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::group::Frequency;
    use chrono::{Duration, NaiveDate};

    fn group_request() -> CreateGroupRequest {
        CreateGroupRequest {
            name: "Arisan Kantor".to_string(),
            contribution_amount: 100_000,
            frequency: Frequency::Monthly,
            member_count: 5,
            start_date: NaiveDate::from_ymd_opt(2025, 3, 1).unwrap(),
        }
    }

    async fn seed_user(store: &InMemoryStore, phone: &str) -> User {
        UserStore::create(store, phone).await.unwrap()
    }

    #[tokio::test]
    async fn test_user_phone_is_unique() {
        let store = InMemoryStore::new();
        seed_user(&store, "+6281234567890").await;

        let result = UserStore::create(&store, "+6281234567890").await;
        assert!(matches!(result, Err(StoreError::Duplicate(_))));
    }

    #[tokio::test]
    async fn test_create_group_adds_creator_as_admin() {
        let store = InMemoryStore::new();
        let creator = seed_user(&store, "+6281234567890").await;

        let (group, membership) = store
            .create_with_admin(&group_request(), creator.id)
            .await
            .unwrap();

        assert_eq!(group.status, GroupStatus::Active);
        assert!(membership.is_admin);
        assert_eq!(membership.user_id, creator.id);
        assert_eq!(store.count_members(group.id).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_duplicate_membership_rejected() {
        let store = InMemoryStore::new();
        let creator = seed_user(&store, "+6281234567890").await;
        let (group, _) = store
            .create_with_admin(&group_request(), creator.id)
            .await
            .unwrap();

        let result = store.add_member(group.id, creator.id, false).await;
        assert!(matches!(result, Err(StoreError::Duplicate(_))));
    }

    #[tokio::test]
    async fn test_partial_group_update_keeps_other_fields() {
        let store = InMemoryStore::new();
        let creator = seed_user(&store, "+6281234567890").await;
        let (group, _) = store
            .create_with_admin(&group_request(), creator.id)
            .await
            .unwrap();

        let changes = UpdateGroupRequest {
            name: Some("Arisan RT 05".to_string()),
            ..Default::default()
        };
        let updated = store.update(group.id, &changes).await.unwrap().unwrap();

        assert_eq!(updated.name, "Arisan RT 05");
        assert_eq!(updated.contribution_amount, 100_000);
        assert_eq!(updated.frequency, Frequency::Monthly);
    }

    #[tokio::test]
    async fn test_round_fanout_snapshots_amount() {
        let store = InMemoryStore::new();
        let a = seed_user(&store, "+6281111111111").await;
        let b = seed_user(&store, "+6282222222222").await;
        let (group, _) = store.create_with_admin(&group_request(), a.id).await.unwrap();
        store.add_member(group.id, b.id, false).await.unwrap();

        let deadline = Utc::now() + Duration::days(30);
        let round = store
            .create_with_payments(group.id, 1, deadline, 100_000, &[a.id, b.id])
            .await
            .unwrap();

        // raising the contribution later must not touch existing payments
        let changes = UpdateGroupRequest {
            contribution_amount: Some(250_000),
            ..Default::default()
        };
        store.update(group.id, &changes).await.unwrap();

        let payments = store.list_for_round(round.id).await.unwrap();
        assert_eq!(payments.len(), 2);
        assert!(payments.iter().all(|p| p.amount == 100_000));
        assert!(payments.iter().all(|p| p.status == PaymentStatus::Pending));
    }

    #[tokio::test]
    async fn test_round_number_unique_per_group() {
        let store = InMemoryStore::new();
        let a = seed_user(&store, "+6281111111111").await;
        let (group, _) = store.create_with_admin(&group_request(), a.id).await.unwrap();

        let deadline = Utc::now() + Duration::days(7);
        store
            .create_with_payments(group.id, 1, deadline, 100_000, &[a.id])
            .await
            .unwrap();
        let result = store
            .create_with_payments(group.id, 1, deadline, 100_000, &[a.id])
            .await;
        assert!(matches!(result, Err(StoreError::Duplicate(_))));
    }

    #[tokio::test]
    async fn test_winner_set_if_unset_is_one_shot() {
        let store = InMemoryStore::new();
        let a = seed_user(&store, "+6281111111111").await;
        let b = seed_user(&store, "+6282222222222").await;
        let (group, _) = store.create_with_admin(&group_request(), a.id).await.unwrap();
        let round = store
            .create_with_payments(group.id, 1, Utc::now(), 100_000, &[a.id])
            .await
            .unwrap();

        assert!(store.set_winner_if_unset(round.id, a.id).await.unwrap());
        // second write loses
        assert!(!store.set_winner_if_unset(round.id, b.id).await.unwrap());

        let reloaded = RoundStore::find_by_id(&store, round.id).await.unwrap().unwrap();
        assert_eq!(reloaded.winner_id, Some(a.id));
    }

    #[tokio::test]
    async fn test_completion_requires_pending_and_winner() {
        let store = InMemoryStore::new();
        let a = seed_user(&store, "+6281111111111").await;
        let (group, _) = store.create_with_admin(&group_request(), a.id).await.unwrap();
        let round = store
            .create_with_payments(group.id, 1, Utc::now(), 100_000, &[a.id])
            .await
            .unwrap();

        // no winner yet
        assert!(!store.complete_if_pending(round.id, Utc::now()).await.unwrap());

        store.set_winner_if_unset(round.id, a.id).await.unwrap();
        assert!(store.complete_if_pending(round.id, Utc::now()).await.unwrap());
        // already completed
        assert!(!store.complete_if_pending(round.id, Utc::now()).await.unwrap());

        let reloaded = RoundStore::find_by_id(&store, round.id).await.unwrap().unwrap();
        assert_eq!(reloaded.status, RoundStatus::Completed);
        assert!(reloaded.completed_at.is_some());
    }

    #[tokio::test]
    async fn test_record_submission_resets_status_to_pending() {
        let store = InMemoryStore::new();
        let a = seed_user(&store, "+6281111111111").await;
        let (group, _) = store.create_with_admin(&group_request(), a.id).await.unwrap();
        let round = store
            .create_with_payments(group.id, 1, Utc::now(), 100_000, &[a.id])
            .await
            .unwrap();
        let payment = store
            .find_by_round_and_user(round.id, a.id)
            .await
            .unwrap()
            .unwrap();

        store.mark_paid(payment.id, Utc::now()).await.unwrap();
        let resubmitted = store
            .record_submission(payment.id, "memory://proofs/new.png", "transfer", Utc::now())
            .await
            .unwrap()
            .unwrap();

        assert_eq!(resubmitted.status, PaymentStatus::Pending);
        assert_eq!(
            resubmitted.proof_url.as_deref(),
            Some("memory://proofs/new.png")
        );
    }

    #[tokio::test]
    async fn test_replace_for_phone_keeps_single_live_code() {
        let store = InMemoryStore::new();
        let phone = "+6281234567890";
        let expires = Utc::now() + Duration::minutes(5);

        let first = store
            .replace_for_phone(&NewOtpCode {
                phone: phone.to_string(),
                code_hash: "hash1".to_string(),
                expires_at: expires,
            })
            .await
            .unwrap();
        store.increment_attempts(first.id).await.unwrap();

        let second = store
            .replace_for_phone(&NewOtpCode {
                phone: phone.to_string(),
                code_hash: "hash2".to_string(),
                expires_at: expires,
            })
            .await
            .unwrap();

        let live = store.find_latest_unconsumed(phone).await.unwrap().unwrap();
        assert_eq!(live.id, second.id);
        assert_eq!(live.code_hash, "hash2");
        assert_eq!(live.attempts, 0);

        // the first code is gone entirely
        assert!(matches!(
            store.increment_attempts(first.id).await,
            Err(StoreError::NotFound)
        ));
    }

    #[tokio::test]
    async fn test_consumed_code_not_returned() {
        let store = InMemoryStore::new();
        let phone = "+6281234567890";
        let code = store
            .replace_for_phone(&NewOtpCode {
                phone: phone.to_string(),
                code_hash: "hash".to_string(),
                expires_at: Utc::now() + Duration::minutes(5),
            })
            .await
            .unwrap();

        store.consume(code.id, Utc::now()).await.unwrap();
        assert!(store.find_latest_unconsumed(phone).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_invite_code_unique() {
        let store = InMemoryStore::new();
        let a = seed_user(&store, "+6281111111111").await;
        let (group, _) = store.create_with_admin(&group_request(), a.id).await.unwrap();

        let new = NewInvite {
            group_id: group.id,
            code: "ABC-DEF-GHJ".to_string(),
            created_by: a.id,
            expires_at: Utc::now() + Duration::hours(72),
        };
        InviteStore::create(&store, &new).await.unwrap();
        let result = InviteStore::create(&store, &new).await;
        assert!(matches!(result, Err(StoreError::Duplicate(_))));
    }

    #[tokio::test]
    async fn test_list_for_user_scopes_by_group() {
        let store = InMemoryStore::new();
        let a = seed_user(&store, "+6281111111111").await;
        let (group1, _) = store.create_with_admin(&group_request(), a.id).await.unwrap();
        let (group2, _) = store.create_with_admin(&group_request(), a.id).await.unwrap();

        store
            .create_with_payments(group1.id, 1, Utc::now(), 100_000, &[a.id])
            .await
            .unwrap();
        store
            .create_with_payments(group2.id, 1, Utc::now(), 50_000, &[a.id])
            .await
            .unwrap();

        let all = PaymentStore::list_for_user(&store, a.id, None).await.unwrap();
        assert_eq!(all.len(), 2);

        let scoped = PaymentStore::list_for_user(&store, a.id, Some(group2.id))
            .await
            .unwrap();
        assert_eq!(scoped.len(), 1);
        assert_eq!(scoped[0].amount, 50_000);
        assert_eq!(scoped[0].group_name, "Arisan Kantor");
    }
}

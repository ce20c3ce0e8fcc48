//! Payment submissions, admin verification, payment projections.

use chrono::Utc;
use std::fmt;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::DomainError;
use crate::models::payment::{
    ListPaymentsResponse, MyPaymentsResponse, NewPayment, Payment, ProofUpload,
};
use crate::services::{require_admin, require_membership};
use crate::storage::{proof_object_name, ProofStorage};
use crate::stores::Stores;

#[derive(Clone)]
pub struct PaymentService {
    stores: Stores,
    storage: Arc<dyn ProofStorage>,
}

impl fmt::Debug for PaymentService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PaymentService").finish_non_exhaustive()
    }
}

impl PaymentService {
    pub fn new(stores: Stores, storage: Arc<dyn ProofStorage>) -> Self {
        Self { stores, storage }
    }

    /// Stores a proof-of-payment for the caller in a round.
    ///
    /// Resubmission updates the existing payment row and replaces the
    /// stored object: upload first, then the row update, then a
    /// best-effort delete of the old object. A failed delete only
    /// orphans the old object and is logged, never surfaced.
    pub async fn submit_payment(
        &self,
        caller: Uuid,
        round_id: Uuid,
        proof: ProofUpload,
        payment_method: &str,
    ) -> Result<Payment, DomainError> {
        proof.validate()?;
        let method = payment_method.trim();
        if method.is_empty() {
            return Err(DomainError::Validation("Payment method is required".into()));
        }

        let round = self
            .stores
            .rounds
            .find_by_id(round_id)
            .await?
            .ok_or_else(|| DomainError::NotFound("Round not found".into()))?;
        let group = self
            .stores
            .groups
            .find_by_id(round.group_id)
            .await?
            .ok_or_else(|| DomainError::NotFound("Group not found".into()))?;

        let now = Utc::now();
        let object_name = proof_object_name(round_id, caller, now, proof.extension());
        let proof_url = self
            .storage
            .store(&object_name, &proof.content_type, proof.bytes)
            .await
            .map_err(|e| DomainError::Storage(e.to_string()))?;

        let existing = self
            .stores
            .payments
            .find_by_round_and_user(round_id, caller)
            .await?;
        match existing {
            Some(payment) => {
                let old_url = payment.proof_url.clone();
                let updated = self
                    .stores
                    .payments
                    .record_submission(payment.id, &proof_url, method, now)
                    .await?
                    .ok_or_else(|| DomainError::NotFound("Payment not found".into()))?;

                if let Some(old) = old_url {
                    if old != proof_url {
                        if let Err(e) = self.storage.remove(&old).await {
                            warn!(url = %old, error = %e, "failed to delete replaced proof object");
                        }
                    }
                }
                info!(
                    payment_id = %updated.id,
                    round_id = %round_id,
                    user_id = %caller,
                    "payment proof resubmitted"
                );
                Ok(updated)
            }
            None => {
                let new = NewPayment {
                    round_id,
                    user_id: caller,
                    amount: group.contribution_amount,
                    payment_method: Some(method.to_string()),
                    proof_url: Some(proof_url),
                    paid_at: Some(now),
                };
                let inserted = self.stores.payments.insert(&new).await?;
                info!(
                    payment_id = %inserted.id,
                    round_id = %round_id,
                    user_id = %caller,
                    "payment proof submitted"
                );
                Ok(inserted)
            }
        }
    }

    /// Admin confirmation that a payment arrived. There is no un-verify;
    /// a repeat call re-stamps `paid_at`.
    pub async fn verify_payment(
        &self,
        caller: Uuid,
        payment_id: Uuid,
    ) -> Result<Payment, DomainError> {
        let payment = self
            .stores
            .payments
            .find_by_id(payment_id)
            .await?
            .ok_or_else(|| DomainError::NotFound("Payment not found".into()))?;
        let round = self
            .stores
            .rounds
            .find_by_id(payment.round_id)
            .await?
            .ok_or_else(|| DomainError::NotFound("Round not found".into()))?;
        require_admin(&self.stores, round.group_id, caller).await?;

        let verified = self
            .stores
            .payments
            .mark_paid(payment_id, Utc::now())
            .await?
            .ok_or_else(|| DomainError::NotFound("Payment not found".into()))?;
        info!(
            payment_id = %payment_id,
            verified_by = %caller,
            "payment verified"
        );
        Ok(verified)
    }

    pub async fn get_round_payments(
        &self,
        caller: Uuid,
        round_id: Uuid,
    ) -> Result<ListPaymentsResponse, DomainError> {
        let round = self
            .stores
            .rounds
            .find_by_id(round_id)
            .await?
            .ok_or_else(|| DomainError::NotFound("Round not found".into()))?;
        require_membership(&self.stores, round.group_id, caller).await?;

        let data = self.stores.payments.list_for_round(round_id).await?;
        let count = data.len();
        Ok(ListPaymentsResponse { data, count })
    }

    /// The caller's own payments with round/group context, optionally
    /// scoped to one group.
    pub async fn get_user_payments(
        &self,
        caller: Uuid,
        group_id: Option<Uuid>,
    ) -> Result<MyPaymentsResponse, DomainError> {
        let data = self.stores.payments.list_for_user(caller, group_id).await?;
        let count = data.len();
        Ok(MyPaymentsResponse { data, count })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::group::{CreateGroupRequest, Frequency};
    use crate::models::payment::{PaymentStatus, MAX_PROOF_SIZE_BYTES};
    use crate::models::User;
    use crate::storage::InMemoryProofStorage;
    use chrono::{Duration, NaiveDate};

    fn proof(file_name: &str, content_type: &str, size: usize) -> ProofUpload {
        ProofUpload {
            file_name: file_name.to_string(),
            content_type: content_type.to_string(),
            bytes: vec![0u8; size],
        }
    }

    async fn setup() -> (
        PaymentService,
        Arc<InMemoryProofStorage>,
        Stores,
        User,
        User,
        Uuid,
        Uuid,
    ) {
        let stores = Stores::in_memory();
        let storage = Arc::new(InMemoryProofStorage::new());
        let admin = stores.users.create("+6281111111111").await.unwrap();
        let member = stores.users.create("+6282222222222").await.unwrap();
        let req = CreateGroupRequest {
            name: "Arisan Kantor".to_string(),
            contribution_amount: 100_000,
            frequency: Frequency::Monthly,
            member_count: 5,
            start_date: NaiveDate::from_ymd_opt(2025, 3, 1).unwrap(),
        };
        let (group, _) = stores.groups.create_with_admin(&req, admin.id).await.unwrap();
        stores
            .groups
            .add_member(group.id, member.id, false)
            .await
            .unwrap();
        let round = stores
            .rounds
            .create_with_payments(
                group.id,
                1,
                Utc::now() + Duration::days(30),
                100_000,
                &[admin.id, member.id],
            )
            .await
            .unwrap();
        let service = PaymentService::new(stores.clone(), storage.clone());
        (service, storage, stores, admin, member, group.id, round.id)
    }

    #[tokio::test]
    async fn test_submit_updates_fanned_out_row() {
        let (service, storage, stores, _, member, _, round_id) = setup().await;

        let payment = service
            .submit_payment(member.id, round_id, proof("bukti.png", "image/png", 128), "transfer")
            .await
            .unwrap();

        assert_eq!(payment.status, PaymentStatus::Pending);
        assert_eq!(payment.payment_method.as_deref(), Some("transfer"));
        assert!(payment.paid_at.is_some());
        assert!(storage.contains(payment.proof_url.as_deref().unwrap()));
        assert_eq!(storage.object_count(), 1);

        // still the same row the fan-out created
        let rows = stores.payments.list_for_round(round_id).await.unwrap();
        assert_eq!(rows.len(), 2);
    }

    #[tokio::test]
    async fn test_resubmit_replaces_old_proof_object() {
        let (service, storage, _, _, member, _, round_id) = setup().await;

        let first = service
            .submit_payment(member.id, round_id, proof("bukti.png", "image/png", 64), "transfer")
            .await
            .unwrap();
        let first_url = first.proof_url.clone().unwrap();

        let second = service
            .submit_payment(member.id, round_id, proof("bukti2.jpg", "image/jpeg", 64), "cash")
            .await
            .unwrap();
        let second_url = second.proof_url.clone().unwrap();

        assert_eq!(first.id, second.id);
        assert_ne!(first_url, second_url);
        assert!(!storage.contains(&first_url));
        assert!(storage.contains(&second_url));
        assert_eq!(storage.object_count(), 1);
        assert_eq!(second.payment_method.as_deref(), Some("cash"));
    }

    #[tokio::test]
    async fn test_resubmit_after_verification_resets_status() {
        let (service, _, _, admin, member, _, round_id) = setup().await;

        let submitted = service
            .submit_payment(member.id, round_id, proof("bukti.png", "image/png", 64), "transfer")
            .await
            .unwrap();
        let verified = service.verify_payment(admin.id, submitted.id).await.unwrap();
        assert_eq!(verified.status, PaymentStatus::Paid);

        let resubmitted = service
            .submit_payment(member.id, round_id, proof("baru.jpg", "image/jpeg", 64), "transfer")
            .await
            .unwrap();
        assert_eq!(resubmitted.id, submitted.id);
        assert_eq!(resubmitted.status, PaymentStatus::Pending);
    }

    #[tokio::test]
    async fn test_submit_validates_upload_and_method() {
        let (service, _, _, _, member, _, round_id) = setup().await;

        let result = service
            .submit_payment(member.id, round_id, proof("d.pdf", "application/pdf", 64), "transfer")
            .await;
        assert!(matches!(result, Err(DomainError::Validation(_))));

        let result = service
            .submit_payment(
                member.id,
                round_id,
                proof("big.png", "image/png", MAX_PROOF_SIZE_BYTES + 1),
                "transfer",
            )
            .await;
        assert!(matches!(result, Err(DomainError::Validation(_))));

        let result = service
            .submit_payment(member.id, round_id, proof("bukti.png", "image/png", 64), "  ")
            .await;
        assert!(matches!(result, Err(DomainError::Validation(_))));
    }

    #[tokio::test]
    async fn test_submit_unknown_round_is_not_found() {
        let (service, storage, _, _, member, _, _) = setup().await;

        let result = service
            .submit_payment(member.id, Uuid::new_v4(), proof("bukti.png", "image/png", 64), "transfer")
            .await;
        assert!(matches!(result, Err(DomainError::NotFound(_))));
        // nothing uploaded for a rejected submission
        assert_eq!(storage.object_count(), 0);
    }

    #[tokio::test]
    async fn test_submit_without_fanout_row_inserts_with_current_amount() {
        let (service, _, stores, _, _, _group_id, round_id) = setup().await;
        let latecomer = stores.users.create("+6283333333333").await.unwrap();

        let payment = service
            .submit_payment(latecomer.id, round_id, proof("bukti.png", "image/png", 64), "cash")
            .await
            .unwrap();

        assert_eq!(payment.amount, 100_000);
        assert_eq!(payment.round_id, round_id);
        let rows = stores.payments.list_for_round(round_id).await.unwrap();
        assert_eq!(rows.len(), 3);
    }

    #[tokio::test]
    async fn test_verify_requires_group_admin() {
        let (service, _, _, _, member, _, round_id) = setup().await;

        let submitted = service
            .submit_payment(member.id, round_id, proof("bukti.png", "image/png", 64), "transfer")
            .await
            .unwrap();

        let result = service.verify_payment(member.id, submitted.id).await;
        assert!(matches!(result, Err(DomainError::Forbidden(_))));

        let result = service.verify_payment(member.id, Uuid::new_v4()).await;
        assert!(matches!(result, Err(DomainError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_round_payments_are_member_only() {
        let (service, _, stores, _, _, _, round_id) = setup().await;
        let outsider = stores.users.create("+6283333333333").await.unwrap();

        let result = service.get_round_payments(outsider.id, round_id).await;
        assert!(matches!(result, Err(DomainError::Forbidden(_))));
    }

    #[tokio::test]
    async fn test_user_payments_scoped_to_group() {
        let (service, _, stores, admin, _, group_id, _) = setup().await;
        let req = CreateGroupRequest {
            name: "Arisan Kedua".to_string(),
            contribution_amount: 50_000,
            frequency: Frequency::Weekly,
            member_count: 3,
            start_date: NaiveDate::from_ymd_opt(2025, 4, 1).unwrap(),
        };
        let (other_group, _) = stores.groups.create_with_admin(&req, admin.id).await.unwrap();
        stores
            .rounds
            .create_with_payments(
                other_group.id,
                1,
                Utc::now() + Duration::days(7),
                50_000,
                &[admin.id],
            )
            .await
            .unwrap();

        let all = service.get_user_payments(admin.id, None).await.unwrap();
        assert_eq!(all.count, 2);

        let scoped = service
            .get_user_payments(admin.id, Some(group_id))
            .await
            .unwrap();
        assert_eq!(scoped.count, 1);
        assert_eq!(scoped.data[0].amount, 100_000);
        assert_eq!(scoped.data[0].group_name, "Arisan Kantor");
    }
}

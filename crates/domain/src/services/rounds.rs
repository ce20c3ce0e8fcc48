//! Contribution rounds: creation with payment fan-out, winner draws,
//! completion.

use chrono::Utc;
use rand::seq::SliceRandom;
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use crate::error::DomainError;
use crate::models::group::GroupStatus;
use crate::models::round::{ListRoundsResponse, RoundResponse, SelectWinnerRequest};
use crate::services::{require_admin, require_membership};
use crate::stores::Stores;

/// Chooses a winner among the eligible member ids. Injected into
/// [`RoundService`] so tests can pin the draw.
pub trait WinnerPicker: Send + Sync {
    fn pick(&self, eligible: &[Uuid]) -> Option<Uuid>;
}

/// Uniform draw over the eligible pool.
#[derive(Debug, Default)]
pub struct RandomWinnerPicker;

impl WinnerPicker for RandomWinnerPicker {
    fn pick(&self, eligible: &[Uuid]) -> Option<Uuid> {
        eligible.choose(&mut rand::thread_rng()).copied()
    }
}

/// Always picks the first eligible id, in membership join order.
/// Deterministic stand-in for tests.
#[derive(Debug, Default)]
pub struct FixedWinnerPicker;

impl WinnerPicker for FixedWinnerPicker {
    fn pick(&self, eligible: &[Uuid]) -> Option<Uuid> {
        eligible.first().copied()
    }
}

#[derive(Clone)]
pub struct RoundService {
    stores: Stores,
    picker: Arc<dyn WinnerPicker>,
}

impl fmt::Debug for RoundService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RoundService").finish_non_exhaustive()
    }
}

impl RoundService {
    pub fn new(stores: Stores, picker: Arc<dyn WinnerPicker>) -> Self {
        Self { stores, picker }
    }

    /// Opens the next round for a group. Inserts the round and one
    /// pending payment per current member, snapshotting the group's
    /// contribution amount, in one transaction.
    pub async fn create_round(
        &self,
        caller: Uuid,
        group_id: Uuid,
    ) -> Result<RoundResponse, DomainError> {
        let (group, _) = require_admin(&self.stores, group_id, caller).await?;
        if group.status == GroupStatus::Completed {
            return Err(DomainError::Conflict(
                "Cannot start a round in a completed group".into(),
            ));
        }

        let member_ids = self.stores.groups.member_ids(group_id).await?;
        if member_ids.is_empty() {
            return Err(DomainError::Validation("Group has no members".into()));
        }

        let round_number = self
            .stores
            .rounds
            .max_round_number(group_id)
            .await?
            .map_or(1, |n| n + 1);
        let payment_deadline = group.frequency.deadline_from(Utc::now());

        let round = self
            .stores
            .rounds
            .create_with_payments(
                group_id,
                round_number,
                payment_deadline,
                group.contribution_amount,
                &member_ids,
            )
            .await?;
        info!(
            group_id = %group_id,
            round_id = %round.id,
            round_number = round.round_number,
            payments = member_ids.len(),
            payment_deadline = %round.payment_deadline,
            "round created"
        );
        Ok(RoundResponse::from(round))
    }

    /// Picks or accepts a winner for the round. The write is a
    /// set-if-null so a concurrent second call loses with a Conflict.
    pub async fn select_winner(
        &self,
        caller: Uuid,
        round_id: Uuid,
        req: &SelectWinnerRequest,
    ) -> Result<RoundResponse, DomainError> {
        let round = self
            .stores
            .rounds
            .find_by_id(round_id)
            .await?
            .ok_or_else(|| DomainError::NotFound("Round not found".into()))?;
        require_admin(&self.stores, round.group_id, caller).await?;

        if round.winner_id.is_some() {
            return Err(DomainError::Conflict(
                "Winner has already been selected for this round".into(),
            ));
        }

        let member_ids = self.stores.groups.member_ids(round.group_id).await?;
        let winner_id = match req.winner_id {
            Some(explicit) => {
                if !member_ids.contains(&explicit) {
                    return Err(DomainError::Validation(
                        "Winner must be a member of the group".into(),
                    ));
                }
                explicit
            }
            None => {
                let past: HashSet<Uuid> = self
                    .stores
                    .rounds
                    .past_winner_ids(round.group_id)
                    .await?
                    .into_iter()
                    .collect();
                let eligible: Vec<Uuid> = member_ids
                    .into_iter()
                    .filter(|id| !past.contains(id))
                    .collect();
                self.picker.pick(&eligible).ok_or_else(|| {
                    DomainError::Conflict("Every member has already won a round".into())
                })?
            }
        };

        let written = self
            .stores
            .rounds
            .set_winner_if_unset(round_id, winner_id)
            .await?;
        if !written {
            return Err(DomainError::Conflict(
                "Winner has already been selected for this round".into(),
            ));
        }
        info!(
            round_id = %round_id,
            winner_id = %winner_id,
            selected_by = %caller,
            explicit = req.winner_id.is_some(),
            "round winner selected"
        );

        self.load_response(round_id).await
    }

    /// Marks the round completed. Requires a selected winner; the write
    /// is conditional on `pending` status so a repeat call conflicts.
    pub async fn complete_round(
        &self,
        caller: Uuid,
        round_id: Uuid,
    ) -> Result<RoundResponse, DomainError> {
        let round = self
            .stores
            .rounds
            .find_by_id(round_id)
            .await?
            .ok_or_else(|| DomainError::NotFound("Round not found".into()))?;
        require_admin(&self.stores, round.group_id, caller).await?;

        if round.winner_id.is_none() {
            return Err(DomainError::Conflict(
                "A winner must be selected before completing the round".into(),
            ));
        }

        let completed = self
            .stores
            .rounds
            .complete_if_pending(round_id, Utc::now())
            .await?;
        if !completed {
            return Err(DomainError::Conflict("Round is already completed".into()));
        }
        info!(round_id = %round_id, completed_by = %caller, "round completed");

        self.load_response(round_id).await
    }

    pub async fn get_round(
        &self,
        caller: Uuid,
        round_id: Uuid,
    ) -> Result<RoundResponse, DomainError> {
        let with_winner = self
            .stores
            .rounds
            .find_with_winner(round_id)
            .await?
            .ok_or_else(|| DomainError::NotFound("Round not found".into()))?;
        require_membership(&self.stores, with_winner.round.group_id, caller).await?;
        Ok(RoundResponse::from(with_winner))
    }

    pub async fn list_rounds(
        &self,
        caller: Uuid,
        group_id: Uuid,
    ) -> Result<ListRoundsResponse, DomainError> {
        require_membership(&self.stores, group_id, caller).await?;
        let rounds = self.stores.rounds.list_for_group(group_id).await?;
        let data: Vec<RoundResponse> = rounds.into_iter().map(RoundResponse::from).collect();
        let count = data.len();
        Ok(ListRoundsResponse { data, count })
    }

    async fn load_response(&self, round_id: Uuid) -> Result<RoundResponse, DomainError> {
        let with_winner = self
            .stores
            .rounds
            .find_with_winner(round_id)
            .await?
            .ok_or_else(|| DomainError::NotFound("Round not found".into()))?;
        Ok(RoundResponse::from(with_winner))
    }
}

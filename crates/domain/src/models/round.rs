//! Round domain models.
//!
//! A round is one turn of the rotation: every member owes one contribution
//! and exactly one member wins the pot.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::models::user::UserPublic;

/// Lifecycle status of a round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoundStatus {
    Pending,
    Completed,
}

impl RoundStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RoundStatus::Pending => "pending",
            RoundStatus::Completed => "completed",
        }
    }
}

impl FromStr for RoundStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pending" => Ok(RoundStatus::Pending),
            "completed" => Ok(RoundStatus::Completed),
            _ => Err(format!("Invalid round status: {}", s)),
        }
    }
}

impl fmt::Display for RoundStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Represents an arisan round.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Round {
    pub id: Uuid,
    pub group_id: Uuid,
    /// Per-group sequence starting at 1 with no gaps.
    pub round_number: i32,
    pub winner_id: Option<Uuid>,
    pub payment_deadline: DateTime<Utc>,
    pub status: RoundStatus,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

/// Request payload for selecting a round winner.
///
/// `winner_id` absent means draw uniformly at random among members who
/// have not yet won in this group.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct SelectWinnerRequest {
    pub winner_id: Option<Uuid>,
}

/// Store projection: a round joined with the winner's display fields.
#[derive(Debug, Clone)]
pub struct RoundWithWinner {
    pub round: Round,
    pub winner: Option<UserPublic>,
}

/// Response shape for a single round.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct RoundResponse {
    pub id: Uuid,
    pub group_id: Uuid,
    pub round_number: i32,
    pub winner: Option<UserPublic>,
    pub payment_deadline: DateTime<Utc>,
    pub status: RoundStatus,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl From<RoundWithWinner> for RoundResponse {
    fn from(rw: RoundWithWinner) -> Self {
        Self {
            id: rw.round.id,
            group_id: rw.round.group_id,
            round_number: rw.round.round_number,
            winner: rw.winner,
            payment_deadline: rw.round.payment_deadline,
            status: rw.round.status,
            created_at: rw.round.created_at,
            completed_at: rw.round.completed_at,
        }
    }
}

impl From<Round> for RoundResponse {
    fn from(round: Round) -> Self {
        Self {
            id: round.id,
            group_id: round.group_id,
            round_number: round.round_number,
            winner: None,
            payment_deadline: round.payment_deadline,
            status: round.status,
            created_at: round.created_at,
            completed_at: round.completed_at,
        }
    }
}

/// Response for listing rounds of a group.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct ListRoundsResponse {
    pub data: Vec<RoundResponse>,
    pub count: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_status_as_str() {
        assert_eq!(RoundStatus::Pending.as_str(), "pending");
        assert_eq!(RoundStatus::Completed.as_str(), "completed");
    }

    #[test]
    fn test_round_status_from_str() {
        assert_eq!(
            RoundStatus::from_str("pending").unwrap(),
            RoundStatus::Pending
        );
        assert_eq!(
            RoundStatus::from_str("COMPLETED").unwrap(),
            RoundStatus::Completed
        );
        assert!(RoundStatus::from_str("open").is_err());
    }

    #[test]
    fn test_round_response_from_round_has_no_winner() {
        let round = Round {
            id: Uuid::new_v4(),
            group_id: Uuid::new_v4(),
            round_number: 1,
            winner_id: None,
            payment_deadline: Utc::now(),
            status: RoundStatus::Pending,
            created_at: Utc::now(),
            completed_at: None,
        };

        let response = RoundResponse::from(round.clone());
        assert_eq!(response.id, round.id);
        assert_eq!(response.round_number, 1);
        assert!(response.winner.is_none());
    }

    #[test]
    fn test_round_response_carries_winner_display() {
        let winner = UserPublic {
            id: Uuid::new_v4(),
            full_name: "Siti Rahayu".to_string(),
            avatar_url: None,
        };
        let round = Round {
            id: Uuid::new_v4(),
            group_id: Uuid::new_v4(),
            round_number: 3,
            winner_id: Some(winner.id),
            payment_deadline: Utc::now(),
            status: RoundStatus::Completed,
            created_at: Utc::now(),
            completed_at: Some(Utc::now()),
        };

        let response = RoundResponse::from(RoundWithWinner {
            round,
            winner: Some(winner.clone()),
        });
        assert_eq!(
            response.winner.as_ref().map(|w| w.full_name.as_str()),
            Some("Siti Rahayu")
        );
        assert_eq!(response.status, RoundStatus::Completed);
    }

    #[test]
    fn test_select_winner_request_default_is_random_draw() {
        let req = SelectWinnerRequest::default();
        assert!(req.winner_id.is_none());
    }
}

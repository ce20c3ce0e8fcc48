//! Payment domain models.
//!
//! One payment row exists per (round, member). The amount is a snapshot of
//! the group's contribution at round creation and never changes afterwards.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;
use validator::ValidationError;

use crate::models::user::UserPublic;

/// Maximum accepted proof image size.
pub const MAX_PROOF_SIZE_BYTES: usize = 5 * 1024 * 1024;

/// Status of a payment.
///
/// `pending` covers both "no proof yet" and "proof awaiting verification";
/// clients distinguish the two by `proof_url`. `late` is reserved for
/// deadline enforcement and currently has no writer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Pending,
    Paid,
    Late,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Paid => "paid",
            PaymentStatus::Late => "late",
        }
    }
}

impl FromStr for PaymentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pending" => Ok(PaymentStatus::Pending),
            "paid" => Ok(PaymentStatus::Paid),
            "late" => Ok(PaymentStatus::Late),
            _ => Err(format!("Invalid payment status: {}", s)),
        }
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Represents a member's payment obligation for one round.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Payment {
    pub id: Uuid,
    pub round_id: Uuid,
    pub user_id: Uuid,
    /// Snapshot of the group contribution at round creation, in rupiah.
    pub amount: i64,
    pub status: PaymentStatus,
    pub payment_method: Option<String>,
    pub proof_url: Option<String>,
    pub paid_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// Insert payload for a payment row created outside round fan-out
/// (a submission by a user who has no row for the round yet).
#[derive(Debug, Clone)]
pub struct NewPayment {
    pub round_id: Uuid,
    pub user_id: Uuid,
    pub amount: i64,
    pub payment_method: Option<String>,
    pub proof_url: Option<String>,
    pub paid_at: Option<DateTime<Utc>>,
}

/// An uploaded proof-of-payment image, decoded from a multipart field.
#[derive(Debug, Clone)]
pub struct ProofUpload {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl ProofUpload {
    /// Validates the upload: must be a non-empty image of at most 5 MiB.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if !self.content_type.starts_with("image/") {
            return Err(proof_error("Proof file must be an image"));
        }
        if self.bytes.is_empty() {
            return Err(proof_error("Proof file is empty"));
        }
        if self.bytes.len() > MAX_PROOF_SIZE_BYTES {
            return Err(proof_error("Proof file must be at most 5 MB"));
        }
        Ok(())
    }

    /// File extension taken from the uploaded name, for the stored object.
    pub fn extension(&self) -> &str {
        self.file_name
            .rsplit_once('.')
            .map(|(_, ext)| ext)
            .filter(|ext| !ext.is_empty())
            .unwrap_or("jpg")
    }
}

fn proof_error(message: &'static str) -> ValidationError {
    let mut err = ValidationError::new("proof_file");
    err.message = Some(message.into());
    err
}

/// Store projection: a payment joined with the payer's display fields.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct PaymentWithUser {
    pub id: Uuid,
    pub round_id: Uuid,
    pub user: UserPublic,
    pub amount: i64,
    pub status: PaymentStatus,
    pub payment_method: Option<String>,
    pub proof_url: Option<String>,
    pub paid_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// Store projection: one of the caller's payments with round/group context.
///
/// `payment_deadline` is included so clients can derive lateness.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct UserPaymentView {
    pub id: Uuid,
    pub round_id: Uuid,
    pub round_number: i32,
    pub group_id: Uuid,
    pub group_name: String,
    pub amount: i64,
    pub status: PaymentStatus,
    pub payment_method: Option<String>,
    pub proof_url: Option<String>,
    pub paid_at: Option<DateTime<Utc>>,
    pub payment_deadline: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

/// Query parameters for listing the caller's payments.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct MyPaymentsQuery {
    pub group_id: Option<Uuid>,
}

/// Response for listing a round's payments.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct ListPaymentsResponse {
    pub data: Vec<PaymentWithUser>,
    pub count: usize,
}

/// Response for listing the caller's payments.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct MyPaymentsResponse {
    pub data: Vec<UserPaymentView>,
    pub count: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payment_status_round_trip() {
        assert_eq!(PaymentStatus::Pending.as_str(), "pending");
        assert_eq!(PaymentStatus::Paid.as_str(), "paid");
        assert_eq!(PaymentStatus::Late.as_str(), "late");
        assert_eq!(
            PaymentStatus::from_str("paid").unwrap(),
            PaymentStatus::Paid
        );
        assert_eq!(
            PaymentStatus::from_str("LATE").unwrap(),
            PaymentStatus::Late
        );
        assert!(PaymentStatus::from_str("overdue").is_err());
    }

    fn proof(content_type: &str, len: usize) -> ProofUpload {
        ProofUpload {
            file_name: "bukti_transfer.png".to_string(),
            content_type: content_type.to_string(),
            bytes: vec![0u8; len],
        }
    }

    #[test]
    fn test_proof_accepts_images_up_to_cap() {
        assert!(proof("image/png", 1024).validate().is_ok());
        assert!(proof("image/jpeg", MAX_PROOF_SIZE_BYTES).validate().is_ok());
    }

    #[test]
    fn test_proof_rejects_oversized_file() {
        let result = proof("image/png", MAX_PROOF_SIZE_BYTES + 1).validate();
        assert!(result.is_err());
    }

    #[test]
    fn test_proof_rejects_non_image() {
        assert!(proof("application/pdf", 1024).validate().is_err());
        assert!(proof("text/plain", 10).validate().is_err());
    }

    #[test]
    fn test_proof_rejects_empty_file() {
        assert!(proof("image/png", 0).validate().is_err());
    }

    #[test]
    fn test_proof_extension() {
        assert_eq!(proof("image/png", 1).extension(), "png");

        let named = ProofUpload {
            file_name: "foto.bukti.jpeg".to_string(),
            content_type: "image/jpeg".to_string(),
            bytes: vec![0u8],
        };
        assert_eq!(named.extension(), "jpeg");

        let bare = ProofUpload {
            file_name: "proof".to_string(),
            content_type: "image/png".to_string(),
            bytes: vec![0u8],
        };
        assert_eq!(bare.extension(), "jpg");

        let trailing_dot = ProofUpload {
            file_name: "proof.".to_string(),
            content_type: "image/png".to_string(),
            bytes: vec![0u8],
        };
        assert_eq!(trailing_dot.extension(), "jpg");
    }
}

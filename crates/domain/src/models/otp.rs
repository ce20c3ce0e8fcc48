//! OTP login domain models.
//!
//! Phone login issues a short-lived 6-digit code. Only the SHA-256 hash is
//! stored; at most one live code exists per phone at a time.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::models::user::UserResponse;

/// How many wrong codes a user may try before the code is burned.
pub const OTP_MAX_ATTEMPTS: i32 = 5;
/// Default code lifetime in seconds (5 minutes).
pub const OTP_DEFAULT_TTL_SECS: i64 = 300;

/// A stored one-time code. The plain code never leaves the SMS seam.
#[derive(Debug, Clone)]
pub struct OtpCode {
    pub id: Uuid,
    pub phone: String,
    pub code_hash: String,
    pub expires_at: DateTime<Utc>,
    pub attempts: i32,
    pub consumed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl OtpCode {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }

    pub fn is_consumed(&self) -> bool {
        self.consumed_at.is_some()
    }

    /// Compares a plain code against the stored hash.
    pub fn matches(&self, code: &str) -> bool {
        shared::crypto::otp_matches(code, &self.code_hash)
    }

    pub fn attempts_exhausted(&self, max_attempts: i32) -> bool {
        self.attempts >= max_attempts
    }
}

/// Insert payload replacing any live code for the phone.
#[derive(Debug, Clone)]
pub struct NewOtpCode {
    pub phone: String,
    pub code_hash: String,
    pub expires_at: DateTime<Utc>,
}

/// Generate a random zero-padded 6-digit OTP code.
pub fn generate_otp_code() -> String {
    use rand::Rng;
    let n: u32 = rand::thread_rng().gen_range(0..1_000_000);
    format!("{:06}", n)
}

/// Request payload for POST /auth/otp/request.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "snake_case")]
pub struct RequestOtpRequest {
    /// Accepted in local spellings (08..., 62..., +62...); normalized
    /// to E.164 before storage.
    #[validate(length(min = 9, max = 20, message = "Phone number length is invalid"))]
    pub phone: String,
}

/// Response for POST /auth/otp/request. Never contains the code.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct RequestOtpResponse {
    pub message: String,
    pub expires_in_secs: i64,
}

/// Request payload for POST /auth/otp/verify.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "snake_case")]
pub struct VerifyOtpRequest {
    #[validate(length(min = 9, max = 20, message = "Phone number length is invalid"))]
    pub phone: String,

    #[validate(length(equal = 6, message = "OTP code must be 6 digits"))]
    pub code: String,
}

/// Request payload for POST /auth/refresh.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "snake_case")]
pub struct RefreshTokenRequest {
    #[validate(length(min = 1, message = "Refresh token is required"))]
    pub refresh_token: String,
}

/// Session tokens plus the authenticated user.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct AuthResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
    pub expires_in: i64,
    pub user: UserResponse,
}

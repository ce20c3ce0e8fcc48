//! Phone-based authentication: OTP issuance, verification, and token refresh.

use chrono::{Duration, Utc};
use metrics::counter;
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

use domain::models::otp::{generate_otp_code, AuthResponse, NewOtpCode, RequestOtpResponse};
use domain::models::user::{User, UserResponse};
use domain::stores::{StoreError, Stores};
use shared::crypto::sha256_hex;
use shared::jwt::{JwtConfig, JwtError};
use shared::phone::normalize_phone;

use crate::config::OtpConfig;
use crate::middleware::rate_limit::PhoneRateLimiter;
use crate::services::sms::SmsService;

/// Errors that can occur during authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("{0}")]
    InvalidPhone(String),

    #[error("Too many verification code requests")]
    RateLimited { retry_after_secs: u64 },

    #[error("Invalid or expired verification code")]
    CodeInvalid,

    #[error("Too many incorrect attempts")]
    AttemptsExhausted,

    #[error("Invalid or expired refresh token")]
    TokenInvalid,

    #[error("Failed to deliver verification code: {0}")]
    Delivery(String),

    #[error("Token generation failed: {0}")]
    Token(#[from] JwtError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Issues OTP codes over SMS and exchanges them for JWT sessions.
#[derive(Clone)]
pub struct AuthService {
    stores: Stores,
    jwt: Arc<JwtConfig>,
    sms: SmsService,
    limiter: Arc<PhoneRateLimiter>,
    otp_ttl_secs: i64,
    otp_max_attempts: i32,
    access_expiry_secs: i64,
}

impl AuthService {
    pub fn new(
        stores: Stores,
        jwt: Arc<JwtConfig>,
        sms: SmsService,
        limiter: Arc<PhoneRateLimiter>,
        otp: &OtpConfig,
        access_expiry_secs: i64,
    ) -> Self {
        Self {
            stores,
            jwt,
            sms,
            limiter,
            otp_ttl_secs: otp.ttl_secs,
            otp_max_attempts: otp.max_attempts,
            access_expiry_secs,
        }
    }

    /// Generates a fresh code for the phone and sends it over SMS.
    /// Any previous unconsumed code for the phone is invalidated.
    pub async fn request_otp(&self, raw_phone: &str) -> Result<RequestOtpResponse, AuthError> {
        let phone = normalize_phone(raw_phone)
            .map_err(|e| AuthError::InvalidPhone(e.to_string()))?;

        if let Err(retry_after_secs) = self.limiter.check(&phone) {
            warn!(phone = %phone, retry_after_secs, "otp request throttled");
            counter!("otp_requests_total", "outcome" => "throttled").increment(1);
            return Err(AuthError::RateLimited { retry_after_secs });
        }

        let code = generate_otp_code();
        let new_code = NewOtpCode {
            phone: phone.clone(),
            code_hash: sha256_hex(&code),
            expires_at: Utc::now() + Duration::seconds(self.otp_ttl_secs),
        };
        self.stores.otp_codes.replace_for_phone(&new_code).await?;

        self.sms
            .send_verification_code(&phone, &code, self.otp_ttl_secs)
            .await
            .map_err(|e| AuthError::Delivery(e.to_string()))?;

        counter!("otp_requests_total", "outcome" => "sent").increment(1);
        // The code itself never reaches the log.
        info!(phone = %phone, "verification code issued");

        Ok(RequestOtpResponse {
            message: "Verification code sent".to_string(),
            expires_in_secs: self.otp_ttl_secs,
        })
    }

    /// Checks a submitted code and signs the caller in, creating the
    /// user row on first login.
    pub async fn verify_otp(&self, raw_phone: &str, code: &str) -> Result<AuthResponse, AuthError> {
        let phone = normalize_phone(raw_phone)
            .map_err(|e| AuthError::InvalidPhone(e.to_string()))?;

        let otp = self
            .stores
            .otp_codes
            .find_latest_unconsumed(&phone)
            .await?
            .ok_or(AuthError::CodeInvalid)?;

        if otp.is_expired(Utc::now()) {
            return Err(AuthError::CodeInvalid);
        }
        if otp.attempts_exhausted(self.otp_max_attempts) {
            return Err(AuthError::AttemptsExhausted);
        }

        if !otp.matches(code) {
            let attempts = self.stores.otp_codes.increment_attempts(otp.id).await?;
            warn!(phone = %phone, attempts, "otp mismatch");
            counter!("otp_verifications_total", "outcome" => "mismatch").increment(1);
            if attempts >= self.otp_max_attempts {
                return Err(AuthError::AttemptsExhausted);
            }
            return Err(AuthError::CodeInvalid);
        }

        self.stores.otp_codes.consume(otp.id, Utc::now()).await?;

        let user = self.find_or_create_user(&phone).await?;
        counter!("otp_verifications_total", "outcome" => "success").increment(1);
        info!(user_id = %user.id, "phone verified");

        self.issue_tokens(user)
    }

    /// Exchanges a valid refresh token for a new token pair.
    pub async fn refresh_session(&self, refresh_token: &str) -> Result<AuthResponse, AuthError> {
        let claims = self
            .jwt
            .validate_refresh_token(refresh_token)
            .map_err(|_| AuthError::TokenInvalid)?;
        let user_id = claims.user_id().map_err(|_| AuthError::TokenInvalid)?;

        let user = self
            .stores
            .users
            .find_by_id(user_id)
            .await?
            .ok_or(AuthError::TokenInvalid)?;

        self.issue_tokens(user)
    }

    async fn find_or_create_user(&self, phone: &str) -> Result<User, AuthError> {
        if let Some(user) = self.stores.users.find_by_phone(phone).await? {
            return Ok(user);
        }

        match self.stores.users.create(phone).await {
            Ok(user) => Ok(user),
            Err(StoreError::Duplicate(_)) => {
                // Lost a concurrent first-login race; the row now exists.
                self.stores
                    .users
                    .find_by_phone(phone)
                    .await?
                    .ok_or_else(|| {
                        AuthError::Store(StoreError::Database(
                            "user vanished after duplicate create".to_string(),
                        ))
                    })
            }
            Err(e) => Err(e.into()),
        }
    }

    fn issue_tokens(&self, user: User) -> Result<AuthResponse, AuthError> {
        let (access_token, _) = self.jwt.generate_access_token(user.id)?;
        let (refresh_token, _) = self.jwt.generate_refresh_token(user.id)?;

        Ok(AuthResponse {
            access_token,
            refresh_token,
            token_type: "Bearer".to_string(),
            expires_in: self.access_expiry_secs,
            user: UserResponse::from(user),
        })
    }
}

//! Authentication routes: OTP request, OTP verification, token refresh.

use axum::{extract::State, Json};
use validator::Validate;

use domain::models::otp::{
    AuthResponse, RefreshTokenRequest, RequestOtpRequest, RequestOtpResponse, VerifyOtpRequest,
};

use crate::app::AppState;
use crate::error::ApiError;

/// POST /api/v1/auth/otp/request
///
/// Sends a verification code to the given phone number.
pub async fn request_otp(
    State(state): State<AppState>,
    Json(request): Json<RequestOtpRequest>,
) -> Result<Json<RequestOtpResponse>, ApiError> {
    request.validate()?;
    let response = state.auth.request_otp(&request.phone).await?;
    Ok(Json(response))
}

/// POST /api/v1/auth/otp/verify
///
/// Exchanges a verification code for a token pair, creating the user
/// on first login.
pub async fn verify_otp(
    State(state): State<AppState>,
    Json(request): Json<VerifyOtpRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    request.validate()?;
    let response = state.auth.verify_otp(&request.phone, &request.code).await?;
    Ok(Json(response))
}

/// POST /api/v1/auth/refresh
///
/// Exchanges a valid refresh token for a new token pair.
pub async fn refresh(
    State(state): State<AppState>,
    Json(request): Json<RefreshTokenRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    request.validate()?;
    let response = state.auth.refresh_session(&request.refresh_token).await?;
    Ok(Json(response))
}

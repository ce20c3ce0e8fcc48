//! User profile routes for viewing and updating the caller's own profile.

use axum::{extract::State, Json};
use validator::Validate;

use domain::models::user::{UpdateProfileRequest, UserResponse};

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::UserAuth;

/// GET /api/v1/users/me
pub async fn get_me(
    State(state): State<AppState>,
    auth: UserAuth,
) -> Result<Json<UserResponse>, ApiError> {
    let user = state
        .stores
        .users
        .find_by_id(auth.user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    Ok(Json(UserResponse::from(user)))
}

/// PUT /api/v1/users/me
///
/// Updates the caller's display name and/or avatar. Fields left out of
/// the body keep their current value.
pub async fn update_me(
    State(state): State<AppState>,
    auth: UserAuth,
    Json(request): Json<UpdateProfileRequest>,
) -> Result<Json<UserResponse>, ApiError> {
    request.validate()?;
    if request.full_name.is_none() && request.avatar_url.is_none() {
        return Err(ApiError::Validation(
            "At least one profile field is required".to_string(),
        ));
    }

    let user = state
        .stores
        .users
        .update_profile(
            auth.user_id,
            request.full_name.as_deref(),
            request.avatar_url.as_deref(),
        )
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    Ok(Json(UserResponse::from(user)))
}

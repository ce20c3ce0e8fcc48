//! Invite routes for sharing and joining groups by code.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;
use validator::Validate;

use domain::models::group::GroupMember;
use domain::models::invite::{CreateInviteRequest, InvitePreview, InviteResponse};

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::UserAuth;

/// POST /api/v1/groups/:group_id/invites
///
/// Creates a shareable invite code. The body is optional; without it
/// the code expires after the default window.
pub async fn create_invite(
    State(state): State<AppState>,
    auth: UserAuth,
    Path(group_id): Path<Uuid>,
    body: Option<Json<CreateInviteRequest>>,
) -> Result<(StatusCode, Json<InviteResponse>), ApiError> {
    let request = body.map(|Json(r)| r).unwrap_or_default();
    request.validate()?;

    let invite = state
        .invites
        .create_invite(auth.user_id, group_id, &request)
        .await?;
    Ok((StatusCode::CREATED, Json(InviteResponse::from(invite))))
}

/// GET /api/v1/invites/:code
///
/// Public preview of an invite: group name and whether the code can
/// still be redeemed.
pub async fn preview_invite(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Result<Json<InvitePreview>, ApiError> {
    let preview = state.invites.preview_invite(&code).await?;
    Ok(Json(preview))
}

/// POST /api/v1/invites/:code/join
///
/// Redeems an invite code, adding the caller to the group.
pub async fn join_group(
    State(state): State<AppState>,
    auth: UserAuth,
    Path(code): Path<String>,
) -> Result<(StatusCode, Json<GroupMember>), ApiError> {
    let member = state.invites.redeem_invite(auth.user_id, &code).await?;
    Ok((StatusCode::CREATED, Json(member)))
}

//! Group management routes for creating and running arisan groups.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;
use validator::Validate;

use domain::models::group::{
    CreateGroupRequest, Group, GroupDetail, GroupMember, ListGroupsResponse, ListMembersResponse,
    RemoveMemberResponse, UpdateGroupRequest,
};

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::UserAuth;

/// POST /api/v1/groups
///
/// Creates a group with the caller as its first member and admin.
pub async fn create_group(
    State(state): State<AppState>,
    auth: UserAuth,
    Json(request): Json<CreateGroupRequest>,
) -> Result<(StatusCode, Json<GroupDetail>), ApiError> {
    request.validate()?;
    let detail = state.groups.create_group(auth.user_id, &request).await?;
    Ok((StatusCode::CREATED, Json(detail)))
}

/// GET /api/v1/groups
pub async fn list_groups(
    State(state): State<AppState>,
    auth: UserAuth,
) -> Result<Json<ListGroupsResponse>, ApiError> {
    let response = state.groups.list_groups(auth.user_id).await?;
    Ok(Json(response))
}

/// GET /api/v1/groups/:group_id
pub async fn get_group(
    State(state): State<AppState>,
    auth: UserAuth,
    Path(group_id): Path<Uuid>,
) -> Result<Json<GroupDetail>, ApiError> {
    let detail = state.groups.get_group(auth.user_id, group_id).await?;
    Ok(Json(detail))
}

/// PUT /api/v1/groups/:group_id
///
/// Admin-only. Applies the given field changes to the group.
pub async fn update_group(
    State(state): State<AppState>,
    auth: UserAuth,
    Path(group_id): Path<Uuid>,
    Json(request): Json<UpdateGroupRequest>,
) -> Result<Json<Group>, ApiError> {
    request.validate()?;
    let group = state
        .groups
        .update_group(auth.user_id, group_id, &request)
        .await?;
    Ok(Json(group))
}

/// GET /api/v1/groups/:group_id/members
pub async fn list_members(
    State(state): State<AppState>,
    auth: UserAuth,
    Path(group_id): Path<Uuid>,
) -> Result<Json<ListMembersResponse>, ApiError> {
    let response = state.groups.list_members(auth.user_id, group_id).await?;
    Ok(Json(response))
}

/// POST /api/v1/groups/:group_id/leave
pub async fn leave_group(
    State(state): State<AppState>,
    auth: UserAuth,
    Path(group_id): Path<Uuid>,
) -> Result<Json<RemoveMemberResponse>, ApiError> {
    let response = state.groups.leave_group(auth.user_id, group_id).await?;
    Ok(Json(response))
}

/// DELETE /api/v1/groups/:group_id/members/:user_id
///
/// Admin-only. Removes a member from the group.
pub async fn remove_member(
    State(state): State<AppState>,
    auth: UserAuth,
    Path((group_id, user_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<RemoveMemberResponse>, ApiError> {
    let response = state
        .groups
        .remove_member(auth.user_id, group_id, user_id)
        .await?;
    Ok(Json(response))
}

/// POST /api/v1/groups/:group_id/members/:user_id/promote
///
/// Admin-only. Grants group admin to a member.
pub async fn promote_member(
    State(state): State<AppState>,
    auth: UserAuth,
    Path((group_id, user_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<GroupMember>, ApiError> {
    let member = state
        .groups
        .promote_member(auth.user_id, group_id, user_id)
        .await?;
    Ok(Json(member))
}

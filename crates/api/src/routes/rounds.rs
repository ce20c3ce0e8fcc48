//! Round routes: starting rounds, drawing winners, completing rounds.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use domain::models::round::{ListRoundsResponse, RoundResponse, SelectWinnerRequest};

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::UserAuth;

/// POST /api/v1/groups/:group_id/rounds
///
/// Admin-only. Opens the next round and creates a pending payment for
/// every current member.
pub async fn create_round(
    State(state): State<AppState>,
    auth: UserAuth,
    Path(group_id): Path<Uuid>,
) -> Result<(StatusCode, Json<RoundResponse>), ApiError> {
    let round = state.rounds.create_round(auth.user_id, group_id).await?;
    Ok((StatusCode::CREATED, Json(round)))
}

/// GET /api/v1/groups/:group_id/rounds
pub async fn list_rounds(
    State(state): State<AppState>,
    auth: UserAuth,
    Path(group_id): Path<Uuid>,
) -> Result<Json<ListRoundsResponse>, ApiError> {
    let response = state.rounds.list_rounds(auth.user_id, group_id).await?;
    Ok(Json(response))
}

/// GET /api/v1/rounds/:round_id
pub async fn get_round(
    State(state): State<AppState>,
    auth: UserAuth,
    Path(round_id): Path<Uuid>,
) -> Result<Json<RoundResponse>, ApiError> {
    let round = state.rounds.get_round(auth.user_id, round_id).await?;
    Ok(Json(round))
}

/// POST /api/v1/rounds/:round_id/winner
///
/// Admin-only. Draws a winner from members who have not won yet, or
/// records the explicit winner given in the body.
pub async fn select_winner(
    State(state): State<AppState>,
    auth: UserAuth,
    Path(round_id): Path<Uuid>,
    body: Option<Json<SelectWinnerRequest>>,
) -> Result<Json<RoundResponse>, ApiError> {
    let request = body.map(|Json(r)| r).unwrap_or_default();
    let round = state
        .rounds
        .select_winner(auth.user_id, round_id, &request)
        .await?;
    Ok(Json(round))
}

/// POST /api/v1/rounds/:round_id/complete
///
/// Admin-only. Closes a round whose winner has been drawn.
pub async fn complete_round(
    State(state): State<AppState>,
    auth: UserAuth,
    Path(round_id): Path<Uuid>,
) -> Result<Json<RoundResponse>, ApiError> {
    let round = state.rounds.complete_round(auth.user_id, round_id).await?;
    Ok(Json(round))
}

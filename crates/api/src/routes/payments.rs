//! Payment routes: proof submission, verification, and listings.

use axum::{
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use domain::models::payment::{
    ListPaymentsResponse, MyPaymentsQuery, MyPaymentsResponse, Payment, ProofUpload,
};

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::UserAuth;

/// POST /api/v1/rounds/:round_id/payments
///
/// Submits a payment proof as multipart form data with a `proof` image
/// part and a `payment_method` text part.
pub async fn submit_payment(
    State(state): State<AppState>,
    auth: UserAuth,
    Path(round_id): Path<Uuid>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<Payment>), ApiError> {
    let mut proof: Option<ProofUpload> = None;
    let mut payment_method: Option<String> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::Validation(format!("Malformed multipart body: {e}")))?
    {
        match field.name() {
            Some("proof") => {
                let file_name = field.file_name().unwrap_or("proof").to_string();
                let content_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|_| ApiError::Validation("Could not read proof file".to_string()))?
                    .to_vec();
                proof = Some(ProofUpload {
                    file_name,
                    content_type,
                    bytes,
                });
            }
            Some("payment_method") => {
                let value = field.text().await.map_err(|_| {
                    ApiError::Validation("Could not read payment_method".to_string())
                })?;
                payment_method = Some(value);
            }
            // Unknown parts are ignored rather than rejected.
            _ => {}
        }
    }

    let proof =
        proof.ok_or_else(|| ApiError::Validation("A proof file is required".to_string()))?;
    let payment_method = payment_method
        .ok_or_else(|| ApiError::Validation("payment_method is required".to_string()))?;

    let payment = state
        .payments
        .submit_payment(auth.user_id, round_id, proof, &payment_method)
        .await?;
    Ok((StatusCode::CREATED, Json(payment)))
}

/// GET /api/v1/rounds/:round_id/payments
///
/// Lists every member's payment state for the round.
pub async fn list_round_payments(
    State(state): State<AppState>,
    auth: UserAuth,
    Path(round_id): Path<Uuid>,
) -> Result<Json<ListPaymentsResponse>, ApiError> {
    let response = state
        .payments
        .get_round_payments(auth.user_id, round_id)
        .await?;
    Ok(Json(response))
}

/// POST /api/v1/payments/:payment_id/verify
///
/// Admin-only. Marks a submitted payment as paid.
pub async fn verify_payment(
    State(state): State<AppState>,
    auth: UserAuth,
    Path(payment_id): Path<Uuid>,
) -> Result<Json<Payment>, ApiError> {
    let payment = state
        .payments
        .verify_payment(auth.user_id, payment_id)
        .await?;
    Ok(Json(payment))
}

/// GET /api/v1/payments/me
///
/// Lists the caller's own payments, optionally filtered by group.
pub async fn my_payments(
    State(state): State<AppState>,
    auth: UserAuth,
    Query(query): Query<MyPaymentsQuery>,
) -> Result<Json<MyPaymentsResponse>, ApiError> {
    let response = state
        .payments
        .get_user_payments(auth.user_id, query.group_id)
        .await?;
    Ok(Json(response))
}

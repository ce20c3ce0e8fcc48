//! Bearer-token authentication extractor.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::{async_trait, RequestPartsExt};
use axum_extra::headers::authorization::Bearer;
use axum_extra::headers::Authorization;
use axum_extra::TypedHeader;
use uuid::Uuid;

use crate::app::AppState;
use crate::error::ApiError;

/// The authenticated caller, resolved from the `Authorization` header.
///
/// Handlers that take this extractor reject unauthenticated requests
/// with 401 before the handler body runs.
#[derive(Debug, Clone)]
pub struct UserAuth {
    pub user_id: Uuid,
}

#[async_trait]
impl FromRequestParts<AppState> for UserAuth {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let TypedHeader(Authorization(bearer)) = parts
            .extract::<TypedHeader<Authorization<Bearer>>>()
            .await
            .map_err(|_| {
                ApiError::Unauthorized("Missing or invalid Authorization header".to_string())
            })?;

        let claims = state
            .jwt
            .validate_access_token(bearer.token())
            .map_err(|_| ApiError::Unauthorized("Invalid or expired token".to_string()))?;

        let user_id = claims
            .user_id()
            .map_err(|_| ApiError::Unauthorized("Invalid or expired token".to_string()))?;

        Ok(UserAuth { user_id })
    }
}

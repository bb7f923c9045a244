use axum::extract::State;
use axum::http::HeaderMap;
use axum::http::StatusCode;

use super::login::TokenPairData;
use super::ApiError;
use super::ApiSuccess;
use crate::inbound::http::middleware::bearer_token;
use crate::inbound::http::router::AppState;

/// Rotate the refresh token carried in the `Authorization` header.
pub async fn refresh(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<ApiSuccess<TokenPairData>, ApiError> {
    let token = bearer_token(&headers)
        .ok_or_else(|| ApiError::Unauthorized("missing token".to_string()))?;

    state
        .auth_service
        .refresh(token)
        .await
        .map_err(ApiError::from)
        .map(|pair| ApiSuccess::new(StatusCode::OK, pair.into()))
}

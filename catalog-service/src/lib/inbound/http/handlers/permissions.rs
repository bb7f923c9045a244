use axum::extract::rejection::JsonRejection;
use axum::extract::Path;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Extension;
use axum::Json;
use serde::Deserialize;

use super::ApiError;
use crate::domain::user::models::UserId;
use crate::inbound::http::middleware::AuthenticatedUser;
use crate::inbound::http::router::AppState;

pub async fn update_permissions(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthenticatedUser>,
    Path(user_id): Path<String>,
    payload: Result<Json<UpdatePermissionsRequest>, JsonRejection>,
) -> Result<StatusCode, ApiError> {
    let user_id = UserId::from_string(&user_id)
        .map_err(|_| ApiError::BadRequest("invalid user ID".to_string()))?;
    let Json(body) = payload?;

    state
        .auth_service
        .update_user_permissions(user_id, body.is_admin)
        .await?;

    tracing::info!(
        admin_id = %caller.user_id,
        user_id = %user_id,
        is_admin = body.is_admin,
        "Permissions changed"
    );

    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct UpdatePermissionsRequest {
    is_admin: bool,
}

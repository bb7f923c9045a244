use axum::extract::Request;
use axum::extract::State;
use axum::http::header::AUTHORIZATION;
use axum::http::HeaderMap;
use axum::middleware::Next;
use axum::response::IntoResponse;
use axum::response::Response;

use super::handlers::ApiError;
use crate::domain::user::models::UserId;
use crate::inbound::http::router::AppState;

const BEARER_PREFIX: &str = "bearer ";

/// Extension type to store the authenticated caller in request extensions
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub user_id: UserId,
    pub is_admin: bool,
}

/// Middleware that validates access tokens and adds the caller to request extensions
pub async fn authenticate(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, Response> {
    let token = bearer_token(req.headers()).ok_or_else(|| {
        ApiError::Unauthorized("missing token".to_string()).into_response()
    })?;

    let claims = state
        .auth_service
        .validate_access_token(token)
        .map_err(|e| ApiError::from(e).into_response())?;

    req.extensions_mut().insert(AuthenticatedUser {
        user_id: UserId(claims.user_id),
        is_admin: claims.is_admin,
    });

    Ok(next.run(req).await)
}

/// Middleware that lets only admin callers through. Must run after [`authenticate`].
pub async fn require_admin(req: Request, next: Next) -> Result<Response, Response> {
    let caller = req
        .extensions()
        .get::<AuthenticatedUser>()
        .cloned()
        .ok_or_else(|| ApiError::Unauthorized("missing token".to_string()).into_response())?;

    if !caller.is_admin {
        tracing::warn!(user_id = %caller.user_id, "Admin route denied");
        return Err(ApiError::Forbidden("admin rights required".to_string()).into_response());
    }

    Ok(next.run(req).await)
}

/// Token from an `Authorization: Bearer <token>` header; the scheme is
/// case-insensitive and an empty token counts as absent.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;

    let scheme = value.get(..BEARER_PREFIX.len())?;
    if !scheme.eq_ignore_ascii_case(BEARER_PREFIX) {
        return None;
    }

    let token = value[BEARER_PREFIX.len()..].trim();
    (!token.is_empty()).then_some(token)
}

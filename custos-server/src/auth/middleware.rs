use axum::{
    extract::{Request, State},
    http::{HeaderMap, header},
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

use crate::errors::AppError;
use crate::infra::app_state::AppState;

/// Authenticated identity resolved by [`require_access_token`] and injected
/// into request extensions for downstream handlers.
#[derive(Debug, Clone, Copy)]
pub struct AuthUser {
    pub id: Uuid,
}

/// Gate for access-protected routes: validates the bearer access token and
/// injects the typed [`AuthUser`] identity. On any failure the handler never
/// runs.
pub async fn require_access_token(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = bearer_token(request.headers())?;

    let user_id = state
        .tokens
        .validate_access_token(token)
        .map_err(|_| AppError::unauthorized("Invalid access token"))?;

    request.extensions_mut().insert(AuthUser { id: user_id });
    Ok(next.run(request).await)
}

/// Gate for the refresh endpoint: validates the bearer refresh token but does
/// not inject identity; the handler re-derives it from the token itself.
pub async fn require_refresh_token(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = bearer_token(request.headers())?;

    state
        .tokens
        .validate_refresh_token(token)
        .map_err(|_| AppError::unauthorized("Invalid refresh token"))?;

    Ok(next.run(request).await)
}

/// Extracts the credential from the `Authorization` header. The literal
/// `Bearer ` scheme prefix followed by a non-empty token is the only
/// accepted shape; this check never touches a store.
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, AppError> {
    let header = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| AppError::unauthorized("invalid Authorization header"))?;

    header
        .strip_prefix("Bearer ")
        .filter(|token| !token.is_empty())
        .ok_or_else(|| AppError::unauthorized("invalid Authorization header"))
}

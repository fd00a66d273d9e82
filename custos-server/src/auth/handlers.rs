use axum::{Extension, Json, extract::State, http::HeaderMap};
use custos_core::{
    ApiResponse, User,
    ports::UserLookup,
    user::LoginRequest,
};

use super::jwt::TokenPair;
use super::middleware::{AuthUser, bearer_token};
use super::password;
use crate::errors::{AppError, AppResult};
use crate::extract::ValidatedJson;
use crate::infra::app_state::AppState;

/// `POST /api/auth/login`. Every credential failure collapses into the same
/// response so callers cannot tell an unknown email from a wrong password.
pub async fn login(
    State(state): State<AppState>,
    ValidatedJson(request): ValidatedJson<LoginRequest>,
) -> AppResult<Json<ApiResponse<TokenPair>>> {
    let user = state
        .users
        .get_by(&UserLookup::Email(request.email.clone()))
        .await
        .map_err(|_| AppError::bad_request("Invalid email or password"))?;

    password::verify(&request.password, &user.password_hash)
        .map_err(|_| AppError::bad_request("Invalid email or password"))?;

    let access_token = state
        .tokens
        .issue_access_token(user.id)
        .map_err(|_| AppError::internal("Failed to generate access token"))?;
    let refresh_token = state
        .tokens
        .issue_refresh_token(user.id)
        .map_err(|_| AppError::internal("Failed to generate refresh token"))?;

    Ok(Json(ApiResponse::success(TokenPair {
        access_token,
        refresh_token,
    })))
}

/// `GET /api/auth/me` (access-protected).
pub async fn me(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
) -> AppResult<Json<ApiResponse<User>>> {
    let user = state
        .users
        .get_by(&UserLookup::Id(auth.id))
        .await
        .map_err(|_| AppError::unauthorized("Unauthorized"))?;

    Ok(Json(ApiResponse::success(user)))
}

/// `POST /api/auth/refresh-token` (refresh-protected). Re-derives identity
/// from the token and rotates the full pair.
pub async fn refresh_token(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> AppResult<Json<ApiResponse<TokenPair>>> {
    let token = bearer_token(&headers)?;

    let pair = state
        .tokens
        .refresh(token)
        .map_err(|_| AppError::unauthorized("Invalid refresh token"))?;

    Ok(Json(ApiResponse::success(pair)))
}

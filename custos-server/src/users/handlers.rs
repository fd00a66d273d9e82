use axum::{
    Extension, Json,
    extract::{OriginalUri, Path, State},
};
use chrono::Utc;
use custos_core::{
    ApiResponse, AuditEvent, AuditEventKind, Pagination, User,
    ports::UserLookup,
    user::{CreateUserRequest, ListUsersQuery, UpdateUserRequest},
};
use serde_json::json;
use uuid::Uuid;

use crate::auth::middleware::AuthUser;
use crate::auth::password;
use crate::errors::{AppError, AppResult};
use crate::extract::{ValidatedJson, ValidatedQuery};
use crate::infra::app_state::AppState;

/// `GET /api/users`: paginated listing with an optional name-substring
/// search.
pub async fn list_users(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    OriginalUri(uri): OriginalUri,
    ValidatedQuery(query): ValidatedQuery<ListUsersQuery>,
) -> AppResult<Json<ApiResponse<Vec<User>>>> {
    let (page, page_size) = query.pagination();

    let (users, total) = state
        .users
        .find(query.search.as_deref(), page, page_size)
        .await?;

    state
        .audit
        .publish(AuditEvent::now(
            auth.id.to_string(),
            AuditEventKind::Read,
            json!({ "full_url": uri.to_string() }),
        ))
        .await;

    Ok(Json(
        ApiResponse::success(users).with_pagination(Pagination::new(page, page_size, total)),
    ))
}

/// `GET /api/users/{id}`.
pub async fn get_user(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<User>>> {
    let user = state.users.get_by(&UserLookup::Id(id)).await?;

    state
        .audit
        .publish(AuditEvent::now(
            auth.id.to_string(),
            AuditEventKind::Read,
            json!({ "id": user.id, "name": user.name, "email": user.email }),
        ))
        .await;

    Ok(Json(ApiResponse::success(user)))
}

/// `POST /api/users`.
pub async fn create_user(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    ValidatedJson(request): ValidatedJson<CreateUserRequest>,
) -> AppResult<Json<ApiResponse<()>>> {
    let now = Utc::now();
    let user = User {
        id: Uuid::new_v4(),
        name: request.name.clone(),
        email: request.email.clone(),
        password_hash: password::hash(&request.password)
            .map_err(|_| AppError::internal("Failed to hash password"))?,
        created_at: now,
        updated_at: now,
    };

    state.users.create(&user).await?;

    state
        .audit
        .publish(AuditEvent::now(
            auth.id.to_string(),
            AuditEventKind::Created,
            json!({ "name": user.name, "email": user.email }),
        ))
        .await;

    Ok(Json(ApiResponse::message("User created successfully")))
}

/// `PUT /api/users/{id}`: partial update; the password is re-hashed only
/// when a new one is supplied.
pub async fn update_user(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<Uuid>,
    ValidatedJson(request): ValidatedJson<UpdateUserRequest>,
) -> AppResult<Json<ApiResponse<()>>> {
    let mut user = state.users.get_by(&UserLookup::Id(id)).await?;

    if let Some(name) = request.name {
        user.name = name;
    }
    if let Some(email) = request.email {
        user.email = email;
    }
    if let Some(new_password) = request.password {
        user.password_hash = password::hash(&new_password)
            .map_err(|_| AppError::internal("Failed to hash password"))?;
    }
    user.updated_at = Utc::now();

    state.users.update(&user).await?;

    state
        .audit
        .publish(AuditEvent::now(
            auth.id.to_string(),
            AuditEventKind::Updated,
            json!({ "name": user.name, "email": user.email }),
        ))
        .await;

    Ok(Json(ApiResponse::message("User updated successfully")))
}

/// `DELETE /api/users/{id}`.
pub async fn delete_user(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<()>>> {
    state.users.delete_by(&UserLookup::Id(id)).await?;

    state
        .audit
        .publish(AuditEvent::now(
            auth.id.to_string(),
            AuditEventKind::Deleted,
            json!({ "id": id }),
        ))
        .await;

    Ok(Json(ApiResponse::message("User deleted successfully")))
}

use axum::{Json, extract::State};
use custos_core::{ApiResponse, AuditEvent, Pagination, audit::ListAuditQuery};

use crate::errors::AppResult;
use crate::extract::ValidatedQuery;
use crate::infra::app_state::AppState;

/// `GET /api/user-logs` (access-protected): the persisted audit trail,
/// newest first.
pub async fn list_user_logs(
    State(state): State<AppState>,
    ValidatedQuery(query): ValidatedQuery<ListAuditQuery>,
) -> AppResult<Json<ApiResponse<Vec<AuditEvent>>>> {
    let (page, page_size) = query.pagination();

    let (logs, total) = state.audit_logs.find(page, page_size).await?;

    Ok(Json(
        ApiResponse::success(logs).with_pagination(Pagination::new(page, page_size, total)),
    ))
}

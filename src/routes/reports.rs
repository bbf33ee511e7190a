//! Reporting route handlers (breaking changes, audit trail)

use crate::error::ApiResult;
use crate::models::SuccessResponse;
use crate::state::SharedState;
use crate::versioning::{AuditEntry, BreakingChangeSummary};
use axum::extract::State;
use axum::Json;

pub async fn breaking_changes(
    State(state): State<SharedState>,
) -> ApiResult<Json<SuccessResponse<BreakingChangeSummary>>> {
    let summary = state.engine.breaking_change_summary().await;
    Ok(Json(SuccessResponse::with_data(
        format!("{} breaking changes", summary.total),
        summary,
    )))
}

pub async fn audit_trail(
    State(state): State<SharedState>,
) -> ApiResult<Json<SuccessResponse<Vec<AuditEntry>>>> {
    let entries = state.engine.get_audit_trail().await;
    Ok(Json(SuccessResponse::with_data(
        format!("{} audit entries", entries.len()),
        entries,
    )))
}

//! Schema diff route handlers

use crate::error::ApiResult;
use crate::models::{CreateDiffRequest, SuccessResponse};
use crate::state::SharedState;
use crate::versioning::SchemaDiff;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use uuid::Uuid;

/// Compare two stored versions
pub async fn create_diff(
    State(state): State<SharedState>,
    Json(payload): Json<CreateDiffRequest>,
) -> ApiResult<(StatusCode, Json<SuccessResponse<SchemaDiff>>)> {
    let diff = state
        .engine
        .generate_diff(payload.from_version_id, payload.to_version_id)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(SuccessResponse::with_data(
            format!(
                "Diff {} -> {}: {} changes",
                diff.from_version,
                diff.to_version,
                diff.changes.len()
            ),
            diff,
        )),
    ))
}

/// Fetch a previously generated diff
pub async fn get_diff(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<SuccessResponse<SchemaDiff>>> {
    let diff = state.engine.get_diff(id).await?;
    Ok(Json(SuccessResponse::with_data("Schema diff", diff)))
}

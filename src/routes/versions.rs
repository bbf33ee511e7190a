//! Schema version route handlers

use crate::error::{validation_error, ApiResult};
use crate::models::{CreateVersionRequest, DeployRequest, RejectRequest, SuccessResponse};
use crate::schema::SchemaSnapshot;
use crate::state::SharedState;
use crate::versioning::{MigrationPlan, RollbackPlan, SchemaVersion, VersionSummary};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use uuid::Uuid;
use validator::Validate;

/// Create a version from a submitted schema (idempotent by content hash)
pub async fn create_version(
    State(state): State<SharedState>,
    Json(payload): Json<CreateVersionRequest>,
) -> ApiResult<(StatusCode, Json<SuccessResponse<SchemaVersion>>)> {
    payload
        .validate()
        .map_err(|e| validation_error(e.to_string()))?;

    let snapshot = SchemaSnapshot::from_value(payload.schema)?;
    let version = state
        .engine
        .create_version(
            snapshot,
            payload.metadata.unwrap_or_default(),
            payload.options.unwrap_or_default(),
        )
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(SuccessResponse::with_data(
            format!("Schema version {}", version.version),
            version,
        )),
    ))
}

/// List version summaries in semantic version order
pub async fn list_versions(
    State(state): State<SharedState>,
) -> ApiResult<Json<SuccessResponse<Vec<VersionSummary>>>> {
    let versions: Vec<VersionSummary> = state
        .engine
        .list_versions()
        .await
        .iter()
        .map(VersionSummary::from)
        .collect();

    Ok(Json(SuccessResponse::with_data(
        format!("{} versions", versions.len()),
        versions,
    )))
}

pub async fn get_version(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<SuccessResponse<SchemaVersion>>> {
    let version = state.engine.get_version(id).await?;
    Ok(Json(SuccessResponse::with_data("Schema version", version)))
}

pub async fn get_version_by_number(
    State(state): State<SharedState>,
    Path(number): Path<String>,
) -> ApiResult<Json<SuccessResponse<SchemaVersion>>> {
    let version = state.engine.get_version_by_number(&number).await?;
    Ok(Json(SuccessResponse::with_data("Schema version", version)))
}

pub async fn migration_plan(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<SuccessResponse<MigrationPlan>>> {
    let plan = state.engine.migration_plan(id).await?;
    Ok(Json(SuccessResponse::with_data("Migration plan", plan)))
}

pub async fn rollback_plan(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<SuccessResponse<RollbackPlan>>> {
    let plan = state.engine.rollback_plan(id).await?;
    Ok(Json(SuccessResponse::with_data("Rollback plan", plan)))
}

pub async fn approve(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<SuccessResponse<SchemaVersion>>> {
    let version = state.engine.approve(id).await?;
    Ok(Json(SuccessResponse::with_data(
        format!("Version {} approved", version.version),
        version,
    )))
}

pub async fn deploy(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<DeployRequest>,
) -> ApiResult<Json<SuccessResponse<SchemaVersion>>> {
    payload
        .validate()
        .map_err(|e| validation_error(e.to_string()))?;

    let version = state.engine.deploy(id, &payload.environment).await?;
    Ok(Json(SuccessResponse::with_data(
        format!(
            "Version {} deployed to {}",
            version.version, version.metadata.environment
        ),
        version,
    )))
}

pub async fn rollback(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<SuccessResponse<SchemaVersion>>> {
    let version = state.engine.rollback(id).await?;
    Ok(Json(SuccessResponse::with_data(
        format!("Version {} rolled back", version.version),
        version,
    )))
}

pub async fn reject(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<RejectRequest>,
) -> ApiResult<Json<SuccessResponse<SchemaVersion>>> {
    payload
        .validate()
        .map_err(|e| validation_error(e.to_string()))?;

    let version = state.engine.reject(id, &payload.reason).await?;
    Ok(Json(SuccessResponse::with_data(
        format!("Version {} rejected", version.version),
        version,
    )))
}

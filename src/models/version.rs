//! Versioning request DTOs

use crate::versioning::{CreateOptions, MetadataInput};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

/// Request to create a schema version
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateVersionRequest {
    /// Raw schema snapshot; validated by the schema module
    pub schema: serde_json::Value,

    #[serde(default)]
    #[validate(nested)]
    pub metadata: Option<MetadataInput>,

    #[serde(default)]
    pub options: Option<CreateOptions>,
}

/// Request to compare two stored versions
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateDiffRequest {
    pub from_version_id: Uuid,
    pub to_version_id: Uuid,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct DeployRequest {
    #[validate(length(min = 1, max = 50, message = "Environment must be 1-50 characters"))]
    pub environment: String,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RejectRequest {
    #[validate(length(min = 1, max = 500, message = "Reason must be 1-500 characters"))]
    pub reason: String,
}

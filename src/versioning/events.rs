//! Versioning events
//!
//! Broadcast to every receiver obtained from `VersioningEngine::subscribe`.

use crate::versioning::types::{ImpactLevel, VersionStatus};
use semver::Version;
use serde::Serialize;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanKind {
    Migration,
    Rollback,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum VersioningEvent {
    VersionCreated {
        version_id: Uuid,
        version: Version,
        breaking_changes: usize,
    },
    DiffGenerated {
        diff_id: Uuid,
        from_version: Version,
        to_version: Version,
        impact: ImpactLevel,
    },
    PlanGenerated {
        version_id: Uuid,
        kind: PlanKind,
        steps: usize,
    },
    StatusChanged {
        version_id: Uuid,
        from: VersionStatus,
        to: VersionStatus,
    },
}

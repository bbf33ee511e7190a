//! Append-only audit trail of versioning operations

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    // Creation and analysis
    VersionCreated,
    DiffGenerated,
    MigrationPlanGenerated,
    RollbackPlanGenerated,

    // Lifecycle
    VersionApproved,
    VersionDeployed,
    VersionRolledBack,
    VersionRejected,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditEntry {
    pub id: Uuid,
    pub action: AuditAction,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diff_id: Option<Uuid>,
    pub timestamp: DateTime<Utc>,
    /// Operation details, always including `processingTimeMs`
    pub metadata: serde_json::Value,
}

impl AuditEntry {
    pub fn new(action: AuditAction, metadata: serde_json::Value) -> Self {
        Self {
            id: Uuid::new_v4(),
            action,
            version_id: None,
            diff_id: None,
            timestamp: Utc::now(),
            metadata,
        }
    }

    pub fn for_version(mut self, version_id: Uuid) -> Self {
        self.version_id = Some(version_id);
        self
    }

    pub fn for_diff(mut self, diff_id: Uuid) -> Self {
        self.diff_id = Some(diff_id);
        self
    }
}

/// Audit log; entries are never removed
pub struct AuditTrail {
    log: RwLock<Vec<AuditEntry>>,
}

impl AuditTrail {
    pub fn new() -> Self {
        Self {
            log: RwLock::new(Vec::new()),
        }
    }

    pub async fn record(&self, entry: AuditEntry) {
        tracing::debug!("Audit: {:?} {:?}", entry.action, entry.version_id);
        self.log.write().await.push(entry);
    }

    /// Full log in append order
    pub async fn entries(&self) -> Vec<AuditEntry> {
        self.log.read().await.clone()
    }
}

impl Default for AuditTrail {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_entries_in_append_order() {
        let trail = AuditTrail::new();
        let version_id = Uuid::new_v4();
        let diff_id = Uuid::new_v4();

        trail
            .record(AuditEntry::new(AuditAction::VersionCreated, json!({ "processingTimeMs": 3 })).for_version(version_id))
            .await;
        trail
            .record(AuditEntry::new(AuditAction::DiffGenerated, json!({ "processingTimeMs": 1 })).for_diff(diff_id))
            .await;

        let entries = trail.entries().await;
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].action, AuditAction::VersionCreated);
        assert_eq!(entries[0].version_id, Some(version_id));
        assert_eq!(entries[1].diff_id, Some(diff_id));
        assert_eq!(entries[1].metadata["processingTimeMs"], 1);
    }

    #[test]
    fn test_action_wire_names() {
        assert_eq!(
            serde_json::to_value(AuditAction::MigrationPlanGenerated).unwrap(),
            json!("migration_plan_generated")
        );
        assert_eq!(
            serde_json::to_value(AuditAction::VersionRolledBack).unwrap(),
            json!("version_rolled_back")
        );
    }
}

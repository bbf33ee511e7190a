//! Core types for schema versioning
//!
//! Versions, diffs, breaking changes and the migration/rollback plans
//! derived from them. All wire formats are camelCase JSON.

use crate::schema::SchemaSnapshot;
use chrono::{DateTime, Utc};
use semver::Version;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;
use validator::Validate;

// =============================================================================
// CHANGES
// =============================================================================

/// Impact / risk / severity scale. Ordered from least to most severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImpactLevel {
    #[default]
    Low,
    Medium,
    High,
    Critical,
}

impl ImpactLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            ImpactLevel::Low => "low",
            ImpactLevel::Medium => "medium",
            ImpactLevel::High => "high",
            ImpactLevel::Critical => "critical",
        }
    }

    /// High or critical
    pub fn is_severe(&self) -> bool {
        *self >= ImpactLevel::High
    }
}

impl fmt::Display for ImpactLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What happened to an object
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Added,
    Removed,
    Modified,
}

/// What kind of object changed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectKind {
    Table,
    Field,
    Index,
    Constraint,
    Relationship,
}

/// Structural change classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeType {
    TableAdded,
    TableRemoved,
    TableModified,
    FieldAdded,
    FieldRemoved,
    FieldModified,
    IndexAdded,
    IndexRemoved,
    IndexModified,
    ConstraintAdded,
    ConstraintRemoved,
    ConstraintModified,
    RelationshipAdded,
    RelationshipRemoved,
    RelationshipModified,
}

impl ChangeType {
    pub fn new(object: ObjectKind, kind: ChangeKind) -> Self {
        use ChangeKind::*;
        use ObjectKind::*;
        match (object, kind) {
            (Table, Added) => ChangeType::TableAdded,
            (Table, Removed) => ChangeType::TableRemoved,
            (Table, Modified) => ChangeType::TableModified,
            (Field, Added) => ChangeType::FieldAdded,
            (Field, Removed) => ChangeType::FieldRemoved,
            (Field, Modified) => ChangeType::FieldModified,
            (Index, Added) => ChangeType::IndexAdded,
            (Index, Removed) => ChangeType::IndexRemoved,
            (Index, Modified) => ChangeType::IndexModified,
            (Constraint, Added) => ChangeType::ConstraintAdded,
            (Constraint, Removed) => ChangeType::ConstraintRemoved,
            (Constraint, Modified) => ChangeType::ConstraintModified,
            (Relationship, Added) => ChangeType::RelationshipAdded,
            (Relationship, Removed) => ChangeType::RelationshipRemoved,
            (Relationship, Modified) => ChangeType::RelationshipModified,
        }
    }

    pub fn kind(&self) -> ChangeKind {
        match self {
            ChangeType::TableAdded
            | ChangeType::FieldAdded
            | ChangeType::IndexAdded
            | ChangeType::ConstraintAdded
            | ChangeType::RelationshipAdded => ChangeKind::Added,
            ChangeType::TableRemoved
            | ChangeType::FieldRemoved
            | ChangeType::IndexRemoved
            | ChangeType::ConstraintRemoved
            | ChangeType::RelationshipRemoved => ChangeKind::Removed,
            _ => ChangeKind::Modified,
        }
    }

    pub fn object(&self) -> ObjectKind {
        match self {
            ChangeType::TableAdded | ChangeType::TableRemoved | ChangeType::TableModified => {
                ObjectKind::Table
            }
            ChangeType::FieldAdded | ChangeType::FieldRemoved | ChangeType::FieldModified => {
                ObjectKind::Field
            }
            ChangeType::IndexAdded | ChangeType::IndexRemoved | ChangeType::IndexModified => {
                ObjectKind::Index
            }
            ChangeType::ConstraintAdded
            | ChangeType::ConstraintRemoved
            | ChangeType::ConstraintModified => ObjectKind::Constraint,
            ChangeType::RelationshipAdded
            | ChangeType::RelationshipRemoved
            | ChangeType::RelationshipModified => ObjectKind::Relationship,
        }
    }

    /// The change type that undoes this one
    pub fn inverse(&self) -> ChangeType {
        let kind = match self.kind() {
            ChangeKind::Added => ChangeKind::Removed,
            ChangeKind::Removed => ChangeKind::Added,
            ChangeKind::Modified => ChangeKind::Modified,
        };
        ChangeType::new(self.object(), kind)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ChangeType::TableAdded => "table_added",
            ChangeType::TableRemoved => "table_removed",
            ChangeType::TableModified => "table_modified",
            ChangeType::FieldAdded => "field_added",
            ChangeType::FieldRemoved => "field_removed",
            ChangeType::FieldModified => "field_modified",
            ChangeType::IndexAdded => "index_added",
            ChangeType::IndexRemoved => "index_removed",
            ChangeType::IndexModified => "index_modified",
            ChangeType::ConstraintAdded => "constraint_added",
            ChangeType::ConstraintRemoved => "constraint_removed",
            ChangeType::ConstraintModified => "constraint_modified",
            ChangeType::RelationshipAdded => "relationship_added",
            ChangeType::RelationshipRemoved => "relationship_removed",
            ChangeType::RelationshipModified => "relationship_modified",
        }
    }
}

impl fmt::Display for ChangeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single structural delta between two snapshots
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaChange {
    pub change_type: ChangeType,
    /// `table` or `table.element`; relationships use their own name
    pub path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub table: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub before: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub after: Option<serde_json::Value>,
    pub impact: ImpactLevel,
    pub breaking: bool,
    pub confidence: f64,
    pub description: String,
}

impl SchemaChange {
    /// The change that undoes this one (before/after swapped)
    pub fn inverted(&self) -> SchemaChange {
        SchemaChange {
            change_type: self.change_type.inverse(),
            before: self.after.clone(),
            after: self.before.clone(),
            ..self.clone()
        }
    }

    /// Dropping a table or a field loses stored data
    pub fn is_destructive(&self) -> bool {
        matches!(
            self.change_type,
            ChangeType::TableRemoved | ChangeType::FieldRemoved
        )
    }
}

// =============================================================================
// BREAKING CHANGES
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BreakingChangeType {
    FieldRemoved,
    FieldTypeChanged,
    ConstraintAdded,
    ConstraintRemoved,
    IndexChanged,
    RelationshipChanged,
    TableRemoved,
    Unknown,
}

/// A change that alters the observable contract of the schema
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BreakingChange {
    /// `{change_type}:{path}`, stable across regenerations
    pub id: String,
    pub category: BreakingChangeType,
    pub severity: ImpactLevel,
    pub description: String,
    pub affected_tables: Vec<String>,
    pub affected_fields: Vec<String>,
    pub impact: String,
    pub mitigation: String,
    pub rollback_strategy: String,
    pub testing_required: bool,
    pub confidence: f64,
    pub source_path: String,
}

// =============================================================================
// ANALYSIS
// =============================================================================

/// Advisory analysis. Never consulted by control flow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AiAnalysis {
    pub confidence: f64,
    pub reasoning: String,
    pub suggestions: Vec<String>,
    pub risks: Vec<String>,
    pub optimizations: Vec<String>,
    pub analyzed_at: DateTime<Utc>,
}

// =============================================================================
// METADATA
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComplianceStatus {
    #[default]
    Compliant,
    NonCompliant,
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SecurityStatus {
    #[default]
    Secure,
    AtRisk,
    Vulnerable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PerformanceStatus {
    #[default]
    Improved,
    Unchanged,
    Degraded,
}

/// One named check inside an impact block
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ImpactCheck<S> {
    pub status: S,
    pub issues: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ComplianceImpact {
    pub gdpr: ImpactCheck<ComplianceStatus>,
    pub sox: ImpactCheck<ComplianceStatus>,
    pub hipaa: ImpactCheck<ComplianceStatus>,
    pub pci: ImpactCheck<ComplianceStatus>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SecurityImpact {
    pub encryption: ImpactCheck<SecurityStatus>,
    pub access_control: ImpactCheck<SecurityStatus>,
    pub data_masking: ImpactCheck<SecurityStatus>,
    pub audit_logging: ImpactCheck<SecurityStatus>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PerformanceImpact {
    pub query_performance: ImpactCheck<PerformanceStatus>,
    pub index_efficiency: ImpactCheck<PerformanceStatus>,
    pub storage_usage: ImpactCheck<PerformanceStatus>,
    pub migration_duration: ImpactCheck<PerformanceStatus>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionMetadata {
    pub author: String,
    pub environment: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub tags: Vec<String>,
    pub impact: ImpactLevel,
    pub risk: ImpactLevel,
    pub compliance: ComplianceImpact,
    pub security: SecurityImpact,
    pub performance: PerformanceImpact,
}

impl Default for VersionMetadata {
    fn default() -> Self {
        Self {
            author: "system".to_string(),
            environment: "development".to_string(),
            description: None,
            tags: Vec::new(),
            impact: ImpactLevel::Low,
            risk: ImpactLevel::Low,
            compliance: ComplianceImpact::default(),
            security: SecurityImpact::default(),
            performance: PerformanceImpact::default(),
        }
    }
}

/// Caller-supplied metadata, merged over [`VersionMetadata::default`]
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct MetadataInput {
    #[validate(length(min = 1, max = 100, message = "Author must be 1-100 characters"))]
    pub author: Option<String>,

    #[validate(length(min = 1, max = 50, message = "Environment must be 1-50 characters"))]
    pub environment: Option<String>,

    #[validate(length(max = 2000, message = "Description must be at most 2000 characters"))]
    pub description: Option<String>,

    pub tags: Option<Vec<String>>,
    pub impact: Option<ImpactLevel>,
    pub risk: Option<ImpactLevel>,
    pub compliance: Option<ComplianceImpact>,
    pub security: Option<SecurityImpact>,
    pub performance: Option<PerformanceImpact>,
}

impl MetadataInput {
    pub fn merge(self) -> VersionMetadata {
        let defaults = VersionMetadata::default();
        VersionMetadata {
            author: self.author.unwrap_or(defaults.author),
            environment: self.environment.unwrap_or(defaults.environment),
            description: self.description,
            tags: self.tags.unwrap_or(defaults.tags),
            impact: self.impact.unwrap_or(defaults.impact),
            risk: self.risk.unwrap_or(defaults.risk),
            compliance: self.compliance.unwrap_or(defaults.compliance),
            security: self.security.unwrap_or(defaults.security),
            performance: self.performance.unwrap_or(defaults.performance),
        }
    }
}

// =============================================================================
// VERSIONS
// =============================================================================

/// Version lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VersionStatus {
    Draft,
    Review,
    Approved,
    Deployed,
    RolledBack,
    Rejected,
}

impl VersionStatus {
    pub fn can_transition_to(&self, next: VersionStatus) -> bool {
        use VersionStatus::*;
        if self.is_terminal() {
            return false;
        }
        matches!(
            (self, next),
            (Draft, Review)
                | (Draft, Approved)
                | (Review, Approved)
                | (Approved, Deployed)
                | (Deployed, RolledBack)
                | (Draft, Rejected)
                | (Review, Rejected)
        )
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, VersionStatus::RolledBack | VersionStatus::Rejected)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            VersionStatus::Draft => "draft",
            VersionStatus::Review => "review",
            VersionStatus::Approved => "approved",
            VersionStatus::Deployed => "deployed",
            VersionStatus::RolledBack => "rolled_back",
            VersionStatus::Rejected => "rejected",
        }
    }
}

impl fmt::Display for VersionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Flags for `create_version`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CreateOptions {
    pub analyze: bool,
    pub generate_plan: bool,
}

impl Default for CreateOptions {
    fn default() -> Self {
        Self {
            analyze: true,
            generate_plan: true,
        }
    }
}

/// Immutable schema version (aggregate root)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaVersion {
    pub id: Uuid,
    pub version: Version,
    pub created_at: DateTime<Utc>,
    pub snapshot_hash: String,
    pub snapshot: SchemaSnapshot,
    pub metadata: VersionMetadata,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ai_analysis: Option<AiAnalysis>,
    pub breaking_changes: Vec<BreakingChange>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub migration_plan: Option<MigrationPlan>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rollback_plan: Option<RollbackPlan>,
    pub confidence_score: f64,
    pub status: VersionStatus,
}

/// Listing view of a version (no snapshot or plans)
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionSummary {
    pub id: Uuid,
    pub version: Version,
    pub created_at: DateTime<Utc>,
    pub snapshot_hash: String,
    pub status: VersionStatus,
    pub author: String,
    pub environment: String,
    pub table_count: usize,
    pub breaking_change_count: usize,
    pub confidence_score: f64,
}

impl From<&SchemaVersion> for VersionSummary {
    fn from(v: &SchemaVersion) -> Self {
        Self {
            id: v.id,
            version: v.version.clone(),
            created_at: v.created_at,
            snapshot_hash: v.snapshot_hash.clone(),
            status: v.status,
            author: v.metadata.author.clone(),
            environment: v.metadata.environment.clone(),
            table_count: v.snapshot.tables.len(),
            breaking_change_count: v.breaking_changes.len(),
            confidence_score: v.confidence_score,
        }
    }
}

/// Comparison between two stored versions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaDiff {
    pub id: Uuid,
    pub from_version: Version,
    pub to_version: Version,
    pub from_hash: String,
    pub to_hash: String,
    pub timestamp: DateTime<Utc>,
    pub changes: Vec<SchemaChange>,
    pub breaking_changes: Vec<BreakingChange>,
    pub additions: Vec<SchemaChange>,
    pub modifications: Vec<SchemaChange>,
    pub deletions: Vec<SchemaChange>,
    pub impact: ImpactLevel,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ai_analysis: Option<AiAnalysis>,
}

/// Totals across every stored version
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BreakingChangeSummary {
    pub total: usize,
    pub by_severity: std::collections::BTreeMap<ImpactLevel, usize>,
    pub changes: Vec<VersionedBreakingChange>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionedBreakingChange {
    pub version: Version,
    pub breaking_change: BreakingChange,
}

// =============================================================================
// PLANS
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RetryPolicy {
    pub retryable: bool,
    pub max_retries: u32,
    pub timeout_seconds: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MigrationStepType {
    Backup,
    SchemaChange,
    DataMigration,
    Validation,
    RollbackPoint,
    Cleanup,
}

impl MigrationStepType {
    /// Steps that alter the schema or its data
    pub fn mutates_schema(&self) -> bool {
        matches!(
            self,
            MigrationStepType::SchemaChange
                | MigrationStepType::DataMigration
                | MigrationStepType::Cleanup
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MigrationStep {
    pub id: String,
    pub order: u32,
    pub step_type: MigrationStepType,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub statement: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rollback_statement: Option<String>,
    pub validation: String,
    pub estimated_minutes: u32,
    pub risk: ImpactLevel,
    pub dependencies: Vec<String>,
    pub parallel: bool,
    pub retry: RetryPolicy,
    pub confidence: f64,
    pub testing_required: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MigrationPlan {
    pub id: Uuid,
    pub version_id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from_version: Option<Version>,
    pub to_version: Version,
    pub steps: Vec<MigrationStep>,
    pub estimated_minutes: u32,
    pub risk: ImpactLevel,
    pub rollback_supported: bool,
    pub testing_required: bool,
    pub backup_required: bool,
    pub downtime_required: bool,
    pub parallel_execution: bool,
    pub confidence: f64,
    pub generated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RollbackStepType {
    SchemaRollback,
    DataRestore,
    Validation,
    Cleanup,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RollbackStep {
    pub id: String,
    pub order: u32,
    pub step_type: RollbackStepType,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub statement: Option<String>,
    pub validation: String,
    pub estimated_minutes: u32,
    pub risk: ImpactLevel,
    pub dependencies: Vec<String>,
    pub parallel: bool,
    pub retry: RetryPolicy,
    pub confidence: f64,
    pub testing_required: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_hash: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataLossRisk {
    None,
    Minimal,
    Moderate,
    High,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RollbackPlan {
    pub id: Uuid,
    pub version_id: Uuid,
    /// The version being rolled back
    pub from_version: Version,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to_version: Option<Version>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_hash: Option<String>,
    pub steps: Vec<RollbackStep>,
    pub estimated_minutes: u32,
    pub risk: ImpactLevel,
    pub data_loss_risk: DataLossRisk,
    pub confidence: f64,
    pub generated_at: DateTime<Utc>,
}

//! Versioning Engine
//!
//! Orchestrates the version store, diff engine, classifier, plan generator,
//! advisory analysis, audit trail and event channel. Constructed once and
//! shared through `AppState`.

use crate::config::VersioningConfig;
use crate::error::{not_found_error, validation_error, AppError};
use crate::schema::SchemaSnapshot;
use crate::versioning::analysis::{AnalysisError, HeuristicAnalyzer, SchemaAnalyzer};
use crate::versioning::audit::{AuditAction, AuditEntry, AuditTrail};
use crate::versioning::diff::{DiffEngine, DiffResult};
use crate::versioning::events::{PlanKind, VersioningEvent};
use crate::versioning::planner::MigrationPlanner;
use crate::versioning::store::{InsertOutcome, VersionStore};
use crate::versioning::types::*;
use chrono::Utc;
use semver::Version;
use serde_json::json;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{broadcast, Mutex};
use tracing::{debug, error, info, warn};
use uuid::Uuid;
use validator::Validate;

pub struct VersioningEngine {
    store: VersionStore,
    audit: AuditTrail,
    diff_engine: DiffEngine,
    planner: MigrationPlanner,
    analyzer: Option<Arc<dyn SchemaAnalyzer>>,
    events: broadcast::Sender<VersioningEvent>,
    /// Serializes create_version from the hash check through the insert
    create_lock: Mutex<()>,
}

impl VersioningEngine {
    pub fn new(config: VersioningConfig, analyzer: Option<Arc<dyn SchemaAnalyzer>>) -> Self {
        let (events, _) = broadcast::channel(config.event_channel_capacity.max(1));
        Self {
            store: VersionStore::new(),
            audit: AuditTrail::new(),
            diff_engine: DiffEngine::new(&config.planner),
            planner: MigrationPlanner::new(config.planner),
            analyzer,
            events,
            create_lock: Mutex::new(()),
        }
    }

    /// Engine with the heuristic analyzer, unless analysis is disabled
    pub fn with_config(config: VersioningConfig) -> Self {
        let analyzer: Option<Arc<dyn SchemaAnalyzer>> = if config.analysis_enabled {
            Some(Arc::new(HeuristicAnalyzer))
        } else {
            None
        };
        Self::new(config, analyzer)
    }

    /// Receive every event emitted after this call
    pub fn subscribe(&self) -> broadcast::Receiver<VersioningEvent> {
        self.events.subscribe()
    }

    fn run_analysis(
        &self,
        snapshot: &SchemaSnapshot,
        previous: Option<&SchemaSnapshot>,
        changes: &[SchemaChange],
    ) -> Result<AiAnalysis, AnalysisError> {
        match &self.analyzer {
            Some(analyzer) => analyzer.analyze(snapshot, previous, changes),
            None => Err(AnalysisError::Unavailable("no analyzer configured".to_string())),
        }
    }

    fn emit(&self, event: VersioningEvent) {
        // No receivers is fine
        let _ = self.events.send(event);
    }

    // =========================================================================
    // VERSIONS
    // =========================================================================

    /// Store `snapshot` as a new version, or return the version already
    /// holding an identical schema
    pub async fn create_version(
        &self,
        snapshot: SchemaSnapshot,
        metadata: MetadataInput,
        options: CreateOptions,
    ) -> Result<SchemaVersion, AppError> {
        let started = Instant::now();

        self.create_version_inner(snapshot, metadata, options, started)
            .await
            .map_err(|e| {
                error!(
                    "create_version failed after {}ms: {}",
                    started.elapsed().as_millis(),
                    e
                );
                AppError::versioning("create version", e)
            })
    }

    async fn create_version_inner(
        &self,
        snapshot: SchemaSnapshot,
        metadata: MetadataInput,
        options: CreateOptions,
        started: Instant,
    ) -> Result<SchemaVersion, AppError> {
        snapshot.validate()?;
        metadata
            .validate()
            .map_err(|e| validation_error(e.to_string()))?;

        let snapshot = snapshot.canonical();
        let snapshot_hash = snapshot.compute_hash()?;

        let _guard = self.create_lock.lock().await;

        if let Some(existing) = self.store.find_by_hash(&snapshot_hash).await {
            info!(
                "Schema unchanged, returning existing version {}",
                existing.version
            );
            return Ok(existing);
        }

        let number = self.store.next_version().await;
        let previous = self.latest_version().await;

        let diff = match &previous {
            Some(previous) => self.diff_engine.analyze(&previous.snapshot, &snapshot)?,
            None => empty_diff(),
        };

        let mut version = SchemaVersion {
            id: Uuid::new_v4(),
            version: number,
            created_at: Utc::now(),
            snapshot_hash,
            snapshot,
            metadata: metadata.merge(),
            ai_analysis: None,
            breaking_changes: diff.breaking_changes.clone(),
            migration_plan: None,
            rollback_plan: None,
            confidence_score: 0.0,
            status: VersionStatus::Draft,
        };

        if options.analyze {
            let previous_snapshot = previous.as_ref().map(|p| &p.snapshot);
            match self.run_analysis(&version.snapshot, previous_snapshot, &diff.changes) {
                Ok(analysis) => {
                    version.confidence_score = analysis.confidence;
                    version.ai_analysis = Some(analysis);
                    version.status = VersionStatus::Review;
                }
                Err(e) => warn!("Analysis failed for {}: {}", version.version, e),
            }
        }

        if options.generate_plan {
            version.migration_plan = Some(self.planner.generate_migration_plan(
                &version,
                previous.as_ref(),
                &diff.changes,
            )?);
            version.rollback_plan = Some(self.planner.generate_rollback_plan(
                &version,
                previous.as_ref(),
                &diff.changes,
            )?);
        }

        let version = match self.store.insert(version).await? {
            InsertOutcome::Inserted(version) => version,
            InsertOutcome::Existing(existing) => return Ok(existing),
        };

        let elapsed = started.elapsed().as_millis() as u64;
        self.audit
            .record(
                AuditEntry::new(
                    AuditAction::VersionCreated,
                    json!({
                        "version": version.version.to_string(),
                        "snapshotHash": version.snapshot_hash,
                        "changeCount": diff.changes.len(),
                        "breakingChangeCount": version.breaking_changes.len(),
                        "analyzed": version.ai_analysis.is_some(),
                        "planGenerated": version.migration_plan.is_some(),
                        "processingTimeMs": elapsed,
                    }),
                )
                .for_version(version.id),
            )
            .await;

        self.emit(VersioningEvent::VersionCreated {
            version_id: version.id,
            version: version.version.clone(),
            breaking_changes: version.breaking_changes.len(),
        });

        if let Some(plan) = &version.migration_plan {
            self.record_plan(&version, PlanKind::Migration, plan.steps.len(), elapsed)
                .await;
        }
        if let Some(plan) = &version.rollback_plan {
            self.record_plan(&version, PlanKind::Rollback, plan.steps.len(), elapsed)
                .await;
        }

        info!(
            "Created schema version {} ({} changes, {} breaking, status {})",
            version.version,
            diff.changes.len(),
            version.breaking_changes.len(),
            version.status
        );

        Ok(version)
    }

    pub async fn get_version(&self, id: Uuid) -> Result<SchemaVersion, AppError> {
        self.store
            .get(id)
            .await
            .ok_or_else(|| not_found_error(format!("Schema version {} not found", id)))
    }

    pub async fn get_version_by_number(&self, number: &str) -> Result<SchemaVersion, AppError> {
        let parsed = Version::parse(number)
            .map_err(|e| validation_error(format!("invalid version '{}': {}", number, e)))?;
        self.store
            .get_by_number(&parsed)
            .await
            .ok_or_else(|| not_found_error(format!("Schema version {} not found", number)))
    }

    /// All versions in semantic version order
    pub async fn list_versions(&self) -> Vec<SchemaVersion> {
        self.store.list().await
    }

    pub async fn latest_version(&self) -> Option<SchemaVersion> {
        self.store.latest().await
    }

    pub async fn get_previous_version(&self, number: &Version) -> Option<SchemaVersion> {
        self.store.previous(number).await
    }

    // =========================================================================
    // DIFFS
    // =========================================================================

    pub async fn generate_diff(&self, from_id: Uuid, to_id: Uuid) -> Result<SchemaDiff, AppError> {
        let started = Instant::now();
        self.generate_diff_inner(from_id, to_id, started)
            .await
            .map_err(|e| {
                error!(
                    "generate_diff {} -> {} failed after {}ms: {}",
                    from_id,
                    to_id,
                    started.elapsed().as_millis(),
                    e
                );
                AppError::versioning("generate diff", e)
            })
    }

    async fn generate_diff_inner(
        &self,
        from_id: Uuid,
        to_id: Uuid,
        started: Instant,
    ) -> Result<SchemaDiff, AppError> {
        let from = self.get_version(from_id).await?;
        let to = self.get_version(to_id).await?;

        let result = self.diff_engine.analyze(&from.snapshot, &to.snapshot)?;
        let ai_analysis = match self.run_analysis(&to.snapshot, Some(&from.snapshot), &result.changes) {
            Ok(analysis) => Some(analysis),
            Err(e) => {
                warn!("Diff analysis failed for {} -> {}: {}", from.version, to.version, e);
                None
            }
        };

        let diff = SchemaDiff {
            id: Uuid::new_v4(),
            from_version: from.version.clone(),
            to_version: to.version.clone(),
            from_hash: from.snapshot_hash.clone(),
            to_hash: to.snapshot_hash.clone(),
            timestamp: Utc::now(),
            changes: result.changes,
            breaking_changes: result.breaking_changes,
            additions: result.additions,
            modifications: result.modifications,
            deletions: result.deletions,
            impact: result.impact,
            ai_analysis,
        };

        self.store.save_diff(diff.clone()).await;

        self.audit
            .record(
                AuditEntry::new(
                    AuditAction::DiffGenerated,
                    json!({
                        "fromVersion": from.version.to_string(),
                        "toVersion": to.version.to_string(),
                        "changeCount": diff.changes.len(),
                        "breakingChangeCount": diff.breaking_changes.len(),
                        "impact": diff.impact,
                        "processingTimeMs": started.elapsed().as_millis() as u64,
                    }),
                )
                .for_version(to.id)
                .for_diff(diff.id),
            )
            .await;

        self.emit(VersioningEvent::DiffGenerated {
            diff_id: diff.id,
            from_version: diff.from_version.clone(),
            to_version: diff.to_version.clone(),
            impact: diff.impact,
        });

        debug!(
            "Diff {} -> {}: {} changes, impact {}",
            diff.from_version,
            diff.to_version,
            diff.changes.len(),
            diff.impact
        );

        Ok(diff)
    }

    pub async fn get_diff(&self, id: Uuid) -> Result<SchemaDiff, AppError> {
        self.store
            .get_diff(id)
            .await
            .ok_or_else(|| not_found_error(format!("Diff {} not found", id)))
    }

    // =========================================================================
    // PLANS
    // =========================================================================

    /// Stored migration plan, or a freshly generated one
    pub async fn migration_plan(&self, id: Uuid) -> Result<MigrationPlan, AppError> {
        let version = self.get_version(id).await?;
        match version.migration_plan {
            Some(plan) => Ok(plan),
            None => self.generate_migration_plan(id).await,
        }
    }

    /// Stored rollback plan, or a freshly generated one
    pub async fn rollback_plan(&self, id: Uuid) -> Result<RollbackPlan, AppError> {
        let version = self.get_version(id).await?;
        match version.rollback_plan {
            Some(plan) => Ok(plan),
            None => self.generate_rollback_plan(id).await,
        }
    }

    pub async fn generate_migration_plan(&self, id: Uuid) -> Result<MigrationPlan, AppError> {
        let started = Instant::now();
        let result = async {
            let (version, previous, changes) = self.plan_inputs(id).await?;
            let plan = self
                .planner
                .generate_migration_plan(&version, previous.as_ref(), &changes)?;
            self.record_plan(
                &version,
                PlanKind::Migration,
                plan.steps.len(),
                started.elapsed().as_millis() as u64,
            )
            .await;
            Ok::<_, AppError>(plan)
        }
        .await;

        result.map_err(|e| {
            error!(
                "Migration plan for {} failed after {}ms: {}",
                id,
                started.elapsed().as_millis(),
                e
            );
            AppError::versioning("generate migration plan", e)
        })
    }

    pub async fn generate_rollback_plan(&self, id: Uuid) -> Result<RollbackPlan, AppError> {
        let started = Instant::now();
        let result = async {
            let (version, previous, changes) = self.plan_inputs(id).await?;
            let plan = self
                .planner
                .generate_rollback_plan(&version, previous.as_ref(), &changes)?;
            self.record_plan(
                &version,
                PlanKind::Rollback,
                plan.steps.len(),
                started.elapsed().as_millis() as u64,
            )
            .await;
            Ok::<_, AppError>(plan)
        }
        .await;

        result.map_err(|e| {
            error!(
                "Rollback plan for {} failed after {}ms: {}",
                id,
                started.elapsed().as_millis(),
                e
            );
            AppError::versioning("generate rollback plan", e)
        })
    }

    /// The version, its predecessor and the annotated changes between them
    async fn plan_inputs(
        &self,
        id: Uuid,
    ) -> Result<(SchemaVersion, Option<SchemaVersion>, Vec<SchemaChange>), AppError> {
        let version = self.get_version(id).await?;
        let previous = self.get_previous_version(&version.version).await;
        let changes = match &previous {
            Some(previous) => {
                self.diff_engine
                    .analyze(&previous.snapshot, &version.snapshot)?
                    .changes
            }
            None => Vec::new(),
        };
        Ok((version, previous, changes))
    }

    async fn record_plan(&self, version: &SchemaVersion, kind: PlanKind, steps: usize, elapsed_ms: u64) {
        let action = match kind {
            PlanKind::Migration => AuditAction::MigrationPlanGenerated,
            PlanKind::Rollback => AuditAction::RollbackPlanGenerated,
        };
        self.audit
            .record(
                AuditEntry::new(
                    action,
                    json!({
                        "version": version.version.to_string(),
                        "stepCount": steps,
                        "processingTimeMs": elapsed_ms,
                    }),
                )
                .for_version(version.id),
            )
            .await;

        self.emit(VersioningEvent::PlanGenerated {
            version_id: version.id,
            kind,
            steps,
        });
    }

    // =========================================================================
    // LIFECYCLE
    // =========================================================================

    pub async fn approve(&self, id: Uuid) -> Result<SchemaVersion, AppError> {
        self.transition(id, VersionStatus::Approved, AuditAction::VersionApproved, json!({}), |_| {})
            .await
    }

    pub async fn deploy(&self, id: Uuid, environment: &str) -> Result<SchemaVersion, AppError> {
        let environment = environment.trim().to_string();
        if environment.is_empty() {
            return Err(validation_error("environment must not be empty"));
        }

        let details = json!({ "environment": environment });
        self.transition(id, VersionStatus::Deployed, AuditAction::VersionDeployed, details, |v| {
            v.metadata.environment = environment;
        })
        .await
    }

    pub async fn rollback(&self, id: Uuid) -> Result<SchemaVersion, AppError> {
        self.transition(id, VersionStatus::RolledBack, AuditAction::VersionRolledBack, json!({}), |_| {})
            .await
    }

    pub async fn reject(&self, id: Uuid, reason: &str) -> Result<SchemaVersion, AppError> {
        self.transition(
            id,
            VersionStatus::Rejected,
            AuditAction::VersionRejected,
            json!({ "reason": reason }),
            |_| {},
        )
        .await
    }

    async fn transition<F>(
        &self,
        id: Uuid,
        to: VersionStatus,
        action: AuditAction,
        details: serde_json::Value,
        apply: F,
    ) -> Result<SchemaVersion, AppError>
    where
        F: FnOnce(&mut SchemaVersion),
    {
        let started = Instant::now();
        let mut from = None;

        let updated = self
            .store
            .update(id, |version| {
                if !version.status.can_transition_to(to) {
                    return Err(validation_error(format!(
                        "version {} cannot move from {} to {}",
                        version.version, version.status, to
                    )));
                }
                from = Some(version.status);
                version.status = to;
                apply(version);
                Ok(())
            })
            .await?;

        let from = from.unwrap_or(to);

        let mut metadata = json!({
            "version": updated.version.to_string(),
            "from": from,
            "to": to,
            "processingTimeMs": started.elapsed().as_millis() as u64,
        });
        if let (Some(target), Some(extra)) = (metadata.as_object_mut(), details.as_object()) {
            target.extend(extra.clone());
        }

        self.audit
            .record(AuditEntry::new(action, metadata).for_version(id))
            .await;

        self.emit(VersioningEvent::StatusChanged {
            version_id: id,
            from,
            to,
        });

        info!("Schema version {} moved from {} to {}", updated.version, from, to);

        Ok(updated)
    }

    // =========================================================================
    // REPORTING
    // =========================================================================

    pub async fn get_audit_trail(&self) -> Vec<AuditEntry> {
        self.audit.entries().await
    }

    pub async fn breaking_change_summary(&self) -> BreakingChangeSummary {
        let mut by_severity = BTreeMap::new();
        let mut changes = Vec::new();

        for version in self.store.list().await {
            for breaking_change in version.breaking_changes {
                *by_severity.entry(breaking_change.severity).or_insert(0) += 1;
                changes.push(VersionedBreakingChange {
                    version: version.version.clone(),
                    breaking_change,
                });
            }
        }

        BreakingChangeSummary {
            total: changes.len(),
            by_severity,
            changes,
        }
    }
}

fn empty_diff() -> DiffResult {
    DiffResult {
        changes: Vec::new(),
        breaking_changes: Vec::new(),
        additions: Vec::new(),
        modifications: Vec::new(),
        deletions: Vec::new(),
        impact: ImpactLevel::Low,
    }
}

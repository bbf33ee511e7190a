//! Migration and rollback plan generation
//!
//! Plans are pure functions of a version, its predecessor and the changes
//! between them. Aggregates (time, risk, flags) are always computed from the
//! steps, never set independently.

use crate::config::PlannerConfig;
use crate::error::AppError;
use crate::versioning::apply::SnapshotPatcher;
use crate::versioning::statements::StatementBuilder;
use crate::versioning::types::{
    ChangeKind, DataLossRisk, ImpactLevel, MigrationPlan, MigrationStep, MigrationStepType,
    RetryPolicy, RollbackPlan, RollbackStep, RollbackStepType, SchemaChange, SchemaVersion,
};
use chrono::Utc;
use tracing::debug;
use uuid::Uuid;

pub struct MigrationPlanner {
    config: PlannerConfig,
}

impl MigrationPlanner {
    pub fn new(config: PlannerConfig) -> Self {
        Self { config }
    }

    // =========================================================================
    // MIGRATION
    // =========================================================================

    /// Ordered steps taking `previous` to `version`.
    ///
    /// `changes` must be the annotated diff from `previous` to `version`.
    pub fn generate_migration_plan(
        &self,
        version: &SchemaVersion,
        previous: Option<&SchemaVersion>,
        changes: &[SchemaChange],
    ) -> Result<MigrationPlan, AppError> {
        let previous = match previous {
            Some(previous) => previous,
            None => return Ok(self.empty_migration_plan(version)),
        };

        let mut steps = Vec::with_capacity(changes.len() + 2);

        steps.push(MigrationStep {
            id: String::new(),
            order: 0,
            step_type: MigrationStepType::Backup,
            description: format!(
                "Back up the database at version {} before migrating",
                previous.version
            ),
            statement: None,
            rollback_statement: None,
            validation: format!("Backup of {} completed and verified restorable", previous.snapshot_hash),
            estimated_minutes: self.config.backup_minutes,
            risk: ImpactLevel::Low,
            dependencies: Vec::new(),
            parallel: false,
            retry: self.retry_policy(true, self.config.backup_minutes),
            confidence: 1.0,
            testing_required: false,
        });

        for change in ordered(changes) {
            let minutes = self.change_minutes(change.impact);
            steps.push(MigrationStep {
                id: String::new(),
                order: 0,
                step_type: MigrationStepType::SchemaChange,
                description: change.description.clone(),
                statement: Some(StatementBuilder::forward(change)?),
                rollback_statement: StatementBuilder::inverse(change)?,
                validation: format!("Verify {} matches version {}", change.path, version.version),
                estimated_minutes: minutes,
                risk: change.impact,
                dependencies: Vec::new(),
                parallel: change.change_type.kind() == ChangeKind::Added && !change.breaking,
                retry: self.retry_policy(!change.breaking, minutes),
                confidence: change.confidence,
                testing_required: change.breaking || change.impact.is_severe(),
            });
        }

        steps.push(MigrationStep {
            id: String::new(),
            order: 0,
            step_type: MigrationStepType::Validation,
            description: format!("Validate schema against version {}", version.version),
            statement: None,
            rollback_statement: None,
            validation: format!("Schema hash equals {}", version.snapshot_hash),
            estimated_minutes: self.config.validation_minutes,
            risk: ImpactLevel::Low,
            dependencies: Vec::new(),
            parallel: false,
            retry: self.retry_policy(true, self.config.validation_minutes),
            confidence: 1.0,
            testing_required: false,
        });

        chain_migration_steps(&mut steps);

        let plan = MigrationPlan {
            id: Uuid::new_v4(),
            version_id: version.id,
            from_version: Some(previous.version.clone()),
            to_version: version.version.clone(),
            estimated_minutes: steps.iter().map(|s| s.estimated_minutes).sum(),
            risk: self.plan_risk(steps.iter().map(|s| s.risk)),
            rollback_supported: steps.iter().all(|s| {
                !s.step_type.mutates_schema()
                    || s.rollback_statement.is_some()
                    || s.step_type == MigrationStepType::Backup
            }),
            testing_required: steps.iter().any(|s| s.testing_required || s.risk.is_severe()),
            backup_required: steps.iter().any(|s| s.risk >= ImpactLevel::Medium),
            downtime_required: steps.iter().any(|s| s.risk == ImpactLevel::Critical),
            parallel_execution: steps.iter().all(|s| s.parallel),
            confidence: min_confidence(steps.iter().map(|s| s.confidence)),
            generated_at: Utc::now(),
            steps,
        };

        debug!(
            "Migration plan for {}: {} steps, {} min, risk {}",
            version.version,
            plan.steps.len(),
            plan.estimated_minutes,
            plan.risk
        );

        Ok(plan)
    }

    fn empty_migration_plan(&self, version: &SchemaVersion) -> MigrationPlan {
        MigrationPlan {
            id: Uuid::new_v4(),
            version_id: version.id,
            from_version: None,
            to_version: version.version.clone(),
            steps: Vec::new(),
            estimated_minutes: 0,
            risk: ImpactLevel::Low,
            rollback_supported: true,
            testing_required: false,
            backup_required: false,
            downtime_required: false,
            parallel_execution: true,
            confidence: 1.0,
            generated_at: Utc::now(),
        }
    }

    // =========================================================================
    // ROLLBACK
    // =========================================================================

    /// Steps taking `version` back to `previous`.
    ///
    /// Fails when reverting `changes` from the version's snapshot does not
    /// reproduce the predecessor's hash.
    pub fn generate_rollback_plan(
        &self,
        version: &SchemaVersion,
        previous: Option<&SchemaVersion>,
        changes: &[SchemaChange],
    ) -> Result<RollbackPlan, AppError> {
        let previous = match previous {
            Some(previous) => previous,
            None => return Ok(self.empty_rollback_plan(version)),
        };

        let restored = SnapshotPatcher::revert(&version.snapshot, changes)?.compute_hash()?;
        if restored != previous.snapshot_hash {
            return Err(AppError::Versioning {
                action: "generate rollback plan".to_string(),
                message: format!(
                    "reverting {} changes from {} yields {} instead of {}",
                    changes.len(),
                    version.version,
                    restored,
                    previous.snapshot_hash
                ),
            });
        }

        let migration = self.generate_migration_plan(version, Some(previous), changes)?;
        let schema_minutes: u32 = migration
            .steps
            .iter()
            .filter(|s| s.step_type == MigrationStepType::SchemaChange)
            .map(|s| s.estimated_minutes)
            .sum();
        let schema_minutes = schema_minutes.max(self.config.rollback_minimum_minutes);

        let mut steps = vec![RollbackStep {
            id: String::new(),
            order: 0,
            step_type: RollbackStepType::SchemaRollback,
            description: format!(
                "Revert schema from {} to {}",
                version.version, previous.version
            ),
            statement: Some(StatementBuilder::structural_rollback(changes)?),
            validation: format!("Schema hash equals {}", previous.snapshot_hash),
            estimated_minutes: schema_minutes,
            risk: migration.risk,
            dependencies: Vec::new(),
            parallel: false,
            retry: self.retry_policy(true, schema_minutes),
            confidence: migration.confidence,
            testing_required: migration.risk.is_severe(),
            target_hash: Some(previous.snapshot_hash.clone()),
        }];

        for change in changes.iter().rev().filter(|c| c.is_destructive()) {
            let minutes = self.config.data_restore_minutes;
            steps.push(RollbackStep {
                id: String::new(),
                order: 0,
                step_type: RollbackStepType::DataRestore,
                description: format!("Restore data for {} from the pre-migration backup", change.path),
                statement: None,
                validation: format!("Row counts for {} match the backup", change.path),
                estimated_minutes: minutes,
                risk: ImpactLevel::High,
                dependencies: Vec::new(),
                parallel: false,
                retry: self.retry_policy(false, minutes),
                confidence: change.confidence,
                testing_required: true,
                target_hash: None,
            });
        }

        chain_rollback_steps(&mut steps);

        let restore_count = steps
            .iter()
            .filter(|s| s.step_type == RollbackStepType::DataRestore)
            .count();

        Ok(RollbackPlan {
            id: Uuid::new_v4(),
            version_id: version.id,
            from_version: version.version.clone(),
            to_version: Some(previous.version.clone()),
            target_hash: Some(previous.snapshot_hash.clone()),
            estimated_minutes: steps.iter().map(|s| s.estimated_minutes).sum(),
            risk: steps.iter().map(|s| s.risk).max().unwrap_or_default(),
            data_loss_risk: self.data_loss_risk(restore_count),
            confidence: min_confidence(steps.iter().map(|s| s.confidence)),
            generated_at: Utc::now(),
            steps,
        })
    }

    fn empty_rollback_plan(&self, version: &SchemaVersion) -> RollbackPlan {
        RollbackPlan {
            id: Uuid::new_v4(),
            version_id: version.id,
            from_version: version.version.clone(),
            to_version: None,
            target_hash: None,
            steps: Vec::new(),
            estimated_minutes: 0,
            risk: ImpactLevel::Low,
            data_loss_risk: DataLossRisk::None,
            confidence: 1.0,
            generated_at: Utc::now(),
        }
    }

    // =========================================================================
    // ESTIMATES
    // =========================================================================

    fn change_minutes(&self, impact: ImpactLevel) -> u32 {
        match impact {
            ImpactLevel::Critical => self.config.critical_change_minutes,
            ImpactLevel::High => self.config.high_change_minutes,
            ImpactLevel::Medium => self.config.medium_change_minutes,
            ImpactLevel::Low => self.config.low_change_minutes,
        }
    }

    fn retry_policy(&self, retryable: bool, minutes: u32) -> RetryPolicy {
        RetryPolicy {
            retryable,
            max_retries: if retryable { self.config.max_retries } else { 1 },
            timeout_seconds: u64::from(minutes) * 60 * 2,
        }
    }

    fn plan_risk(&self, risks: impl Iterator<Item = ImpactLevel>) -> ImpactLevel {
        let mut high = 0;
        let mut critical = false;
        for risk in risks {
            match risk {
                ImpactLevel::Critical => critical = true,
                ImpactLevel::High => high += 1,
                _ => {}
            }
        }

        if critical {
            ImpactLevel::Critical
        } else if high > self.config.high_risk_step_threshold {
            ImpactLevel::High
        } else if high > 0 {
            ImpactLevel::Medium
        } else {
            ImpactLevel::Low
        }
    }

    fn data_loss_risk(&self, restore_steps: usize) -> DataLossRisk {
        match restore_steps {
            0 => DataLossRisk::None,
            n if n <= self.config.minimal_data_loss_steps => DataLossRisk::Minimal,
            n if n <= self.config.moderate_data_loss_steps => DataLossRisk::Moderate,
            _ => DataLossRisk::High,
        }
    }
}

/// Additions, then modifications, then deletions; stable within each group
fn ordered(changes: &[SchemaChange]) -> Vec<&SchemaChange> {
    let rank = |c: &SchemaChange| match c.change_type.kind() {
        ChangeKind::Added => 0,
        ChangeKind::Modified => 1,
        ChangeKind::Removed => 2,
    };
    let mut ordered: Vec<&SchemaChange> = changes.iter().collect();
    ordered.sort_by_key(|c| rank(c));
    ordered
}

/// Assign 1-based orders, ids and the dependency on the preceding step
fn chain_migration_steps(steps: &mut [MigrationStep]) {
    let mut previous: Option<String> = None;
    for (i, step) in steps.iter_mut().enumerate() {
        step.order = i as u32 + 1;
        step.id = format!("migrate-{:02}", step.order);
        step.dependencies = previous.iter().cloned().collect();
        previous = Some(step.id.clone());
    }
}

fn chain_rollback_steps(steps: &mut [RollbackStep]) {
    let mut previous: Option<String> = None;
    for (i, step) in steps.iter_mut().enumerate() {
        step.order = i as u32 + 1;
        step.id = format!("rollback-{:02}", step.order);
        step.dependencies = previous.iter().cloned().collect();
        previous = Some(step.id.clone());
    }
}

fn min_confidence(values: impl Iterator<Item = f64>) -> f64 {
    values.fold(1.0, f64::min)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::SchemaSnapshot;
    use crate::versioning::diff::DiffEngine;
    use crate::versioning::types::{MetadataInput, VersionStatus};
    use pretty_assertions::assert_eq;
    use semver::Version;
    use serde_json::json;

    fn version(number: &str, schema: serde_json::Value) -> SchemaVersion {
        let snapshot = SchemaSnapshot::from_value(schema).unwrap();
        SchemaVersion {
            id: Uuid::new_v4(),
            version: Version::parse(number).unwrap(),
            created_at: Utc::now(),
            snapshot_hash: snapshot.compute_hash().unwrap(),
            snapshot,
            metadata: MetadataInput::default().merge(),
            ai_analysis: None,
            breaking_changes: Vec::new(),
            migration_plan: None,
            rollback_plan: None,
            confidence_score: 0.0,
            status: VersionStatus::Draft,
        }
    }

    fn users_only() -> serde_json::Value {
        json!({ "tables": [{ "name": "users", "fields": [
            { "name": "id", "dataType": "uuid", "nullable": false, "primaryKey": true }
        ] }] })
    }

    fn with_orders(extra_field: bool) -> serde_json::Value {
        let mut fields = vec![
            json!({ "name": "id", "dataType": "uuid", "nullable": false, "primaryKey": true }),
            json!({ "name": "total", "dataType": "numeric" }),
        ];
        if extra_field {
            fields.push(json!({ "name": "notes", "dataType": "text" }));
        }
        json!({ "tables": [
            { "name": "users", "fields": [
                { "name": "id", "dataType": "uuid", "nullable": false, "primaryKey": true }
            ] },
            { "name": "orders", "fields": fields }
        ] })
    }

    fn plan_inputs(from: &SchemaVersion, to: &SchemaVersion) -> Vec<SchemaChange> {
        DiffEngine::new(&PlannerConfig::default())
            .analyze(&from.snapshot, &to.snapshot)
            .unwrap()
            .changes
    }

    #[test]
    fn test_first_version_has_empty_plans() {
        let planner = MigrationPlanner::new(PlannerConfig::default());
        let first = version("1.0.0", users_only());

        let migration = planner.generate_migration_plan(&first, None, &[]).unwrap();
        assert!(migration.steps.is_empty());
        assert_eq!(migration.estimated_minutes, 0);
        assert_eq!(migration.risk, ImpactLevel::Low);
        assert!(migration.rollback_supported);
        assert_eq!(migration.confidence, 1.0);

        let rollback = planner.generate_rollback_plan(&first, None, &[]).unwrap();
        assert!(rollback.steps.is_empty());
        assert_eq!(rollback.data_loss_risk, DataLossRisk::None);
    }

    #[test]
    fn test_additive_migration_plan() {
        let planner = MigrationPlanner::new(PlannerConfig::default());
        let a = version("1.0.0", users_only());
        let b = version("1.0.1", with_orders(false));
        let changes = plan_inputs(&a, &b);

        let plan = planner.generate_migration_plan(&b, Some(&a), &changes).unwrap();
        let types: Vec<_> = plan.steps.iter().map(|s| s.step_type).collect();
        assert_eq!(
            types,
            vec![
                MigrationStepType::Backup,
                MigrationStepType::SchemaChange,
                MigrationStepType::Validation
            ]
        );
        let orders: Vec<_> = plan.steps.iter().map(|s| s.order).collect();
        assert_eq!(orders, vec![1, 2, 3]);
        assert_eq!(plan.steps[1].dependencies, vec!["migrate-01".to_string()]);
        assert_eq!(plan.estimated_minutes, 10);
        assert_eq!(plan.risk, ImpactLevel::Low);
        assert!(plan.rollback_supported);
        assert!(!plan.testing_required);
        assert!(!plan.downtime_required);

        let rollback = planner.generate_rollback_plan(&b, Some(&a), &changes).unwrap();
        assert_eq!(rollback.steps.len(), 1);
        assert_eq!(rollback.steps[0].step_type, RollbackStepType::SchemaRollback);
        assert_eq!(rollback.steps[0].estimated_minutes, 5);
        assert_eq!(rollback.target_hash.as_deref(), Some(a.snapshot_hash.as_str()));
        assert_eq!(rollback.data_loss_risk, DataLossRisk::None);
        assert_eq!(
            rollback.steps[0].statement.as_deref(),
            Some("DROP TABLE \"orders\";")
        );
    }

    #[test]
    fn test_field_removal_plan() {
        let planner = MigrationPlanner::new(PlannerConfig::default());
        let b = version("1.0.1", with_orders(true));
        let c = version("1.0.2", with_orders(false));
        let changes = plan_inputs(&b, &c);

        let plan = planner.generate_migration_plan(&c, Some(&b), &changes).unwrap();
        let step = &plan.steps[1];
        assert_eq!(step.step_type, MigrationStepType::SchemaChange);
        assert_eq!(step.risk, ImpactLevel::High);
        assert_eq!(step.estimated_minutes, 15);
        assert!(step.testing_required);
        assert!(!step.retry.retryable);
        assert_eq!(step.retry.max_retries, 1);
        assert_eq!(step.rollback_statement, None);
        assert!(!plan.rollback_supported);
        assert!(plan.backup_required);
        assert_eq!(plan.risk, ImpactLevel::Medium);

        let rollback = planner.generate_rollback_plan(&c, Some(&b), &changes).unwrap();
        assert_eq!(rollback.steps.len(), 2);
        assert_eq!(rollback.steps[1].step_type, RollbackStepType::DataRestore);
        assert_eq!(rollback.steps[1].estimated_minutes, 10);
        assert_eq!(rollback.steps[1].dependencies, vec!["rollback-01".to_string()]);
        assert_eq!(rollback.data_loss_risk, DataLossRisk::Minimal);
        assert_eq!(rollback.risk, ImpactLevel::High);
    }

    #[test]
    fn test_steps_ordered_by_kind() {
        let planner = MigrationPlanner::new(PlannerConfig::default());
        let from = version("1.0.0", with_orders(true));
        let to = version(
            "1.0.1",
            json!({ "tables": [
                { "name": "invoices" },
                { "name": "orders", "fields": [
                    { "name": "id", "dataType": "uuid", "nullable": false, "primaryKey": true },
                    { "name": "total", "dataType": "numeric", "nullable": false }
                ] },
                { "name": "users", "fields": [
                    { "name": "id", "dataType": "uuid", "nullable": false, "primaryKey": true }
                ] }
            ] }),
        );
        let changes = plan_inputs(&from, &to);

        let plan = planner.generate_migration_plan(&to, Some(&from), &changes).unwrap();
        let descriptions: Vec<_> = plan.steps[1..plan.steps.len() - 1]
            .iter()
            .map(|s| s.description.split(' ').take(2).collect::<Vec<_>>().join(" "))
            .collect();
        assert_eq!(
            descriptions,
            vec!["Table invoices", "Field orders.total", "Field orders.notes"]
        );
    }

    #[test]
    fn test_rollback_rejects_inconsistent_changes() {
        let planner = MigrationPlanner::new(PlannerConfig::default());
        let a = version("1.0.0", users_only());
        let b = version("1.0.1", with_orders(false));

        let result = planner.generate_rollback_plan(&b, Some(&a), &[]);
        assert!(matches!(result, Err(AppError::Versioning { action, .. }) if action == "generate rollback plan"));
    }

    #[test]
    fn test_plan_risk_thresholds() {
        let planner = MigrationPlanner::new(PlannerConfig::default());
        use ImpactLevel::*;
        assert_eq!(planner.plan_risk([Low, Medium].into_iter()), Low);
        assert_eq!(planner.plan_risk([High, High].into_iter()), Medium);
        assert_eq!(planner.plan_risk([High, High, High].into_iter()), High);
        assert_eq!(planner.plan_risk([Low, Critical].into_iter()), Critical);
    }

    #[test]
    fn test_data_loss_buckets() {
        let planner = MigrationPlanner::new(PlannerConfig::default());
        assert_eq!(planner.data_loss_risk(0), DataLossRisk::None);
        assert_eq!(planner.data_loss_risk(1), DataLossRisk::Minimal);
        assert_eq!(planner.data_loss_risk(3), DataLossRisk::Moderate);
        assert_eq!(planner.data_loss_risk(4), DataLossRisk::High);
    }
}

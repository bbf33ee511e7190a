//! Schema Diff Engine
//!
//! Structural comparison of two snapshots. Output order is fully determined
//! by object names: tables by name, and within a table the table-level
//! change, then fields, indexes and constraints; relationships come last.

use crate::config::PlannerConfig;
use crate::error::AppError;
use crate::schema::{Constraint, Field, Index, Relationship, SchemaSnapshot, Table};
use crate::versioning::classifier::BreakingChangeClassifier;
use crate::versioning::types::{
    BreakingChange, ChangeKind, ChangeType, ImpactLevel, ObjectKind, SchemaChange,
};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

/// Confidence for structural facts read straight off the snapshots
const STRUCTURAL_CONFIDENCE: f64 = 1.0;
/// Type compatibility is a heuristic over type names
const TYPE_CHANGE_CONFIDENCE: f64 = 0.9;

/// Changes plus everything derived from them
#[derive(Debug, Clone)]
pub struct DiffResult {
    pub changes: Vec<SchemaChange>,
    pub breaking_changes: Vec<BreakingChange>,
    pub additions: Vec<SchemaChange>,
    pub modifications: Vec<SchemaChange>,
    pub deletions: Vec<SchemaChange>,
    pub impact: ImpactLevel,
}

pub struct DiffEngine {
    breaking_impact_threshold: usize,
}

impl DiffEngine {
    pub fn new(config: &PlannerConfig) -> Self {
        Self {
            breaking_impact_threshold: config.breaking_impact_threshold,
        }
    }

    /// Compare, classify and partition in one pass
    pub fn analyze(&self, from: &SchemaSnapshot, to: &SchemaSnapshot) -> Result<DiffResult, AppError> {
        let mut changes = Self::compare(from, to)?;
        BreakingChangeClassifier::annotate(&mut changes);
        let breaking_changes = BreakingChangeClassifier::classify(&changes);

        let partition = |kind: ChangeKind| -> Vec<SchemaChange> {
            changes
                .iter()
                .filter(|c| c.change_type.kind() == kind)
                .cloned()
                .collect()
        };
        let additions = partition(ChangeKind::Added);
        let modifications = partition(ChangeKind::Modified);
        let deletions = partition(ChangeKind::Removed);

        let impact = self.overall_impact(&changes, breaking_changes.len());

        Ok(DiffResult {
            changes,
            breaking_changes,
            additions,
            modifications,
            deletions,
            impact,
        })
    }

    /// Compare two snapshots and return every structural difference
    pub fn compare(from: &SchemaSnapshot, to: &SchemaSnapshot) -> Result<Vec<SchemaChange>, AppError> {
        let mut changes = Vec::new();

        for (name, before, after) in pair_by_name(&from.tables, &to.tables, |t| &t.name) {
            match (before, after) {
                (None, Some(table)) => changes.push(Self::table_added(table)?),
                (Some(table), None) => changes.push(Self::table_removed(table)?),
                (Some(before), Some(after)) => Self::diff_table(name, before, after, &mut changes)?,
                (None, None) => {}
            }
        }

        Self::diff_relationships(&from.relationships, &to.relationships, &mut changes)?;

        Ok(changes)
    }

    fn overall_impact(&self, changes: &[SchemaChange], breaking_count: usize) -> ImpactLevel {
        if changes.iter().any(|c| c.impact == ImpactLevel::Critical) {
            ImpactLevel::Critical
        } else if breaking_count > self.breaking_impact_threshold {
            ImpactLevel::High
        } else if breaking_count > 0 {
            ImpactLevel::Medium
        } else {
            ImpactLevel::Low
        }
    }

    // =========================================================================
    // TABLES
    // =========================================================================

    fn table_added(table: &Table) -> Result<SchemaChange, AppError> {
        Ok(SchemaChange {
            change_type: ChangeType::TableAdded,
            path: table.name.clone(),
            table: Some(table.name.clone()),
            field: None,
            before: None,
            after: Some(serde_json::to_value(table)?),
            impact: ImpactLevel::Low,
            breaking: false,
            confidence: STRUCTURAL_CONFIDENCE,
            description: format!("Table {} created with {} fields", table.name, table.fields.len()),
        })
    }

    fn table_removed(table: &Table) -> Result<SchemaChange, AppError> {
        Ok(SchemaChange {
            change_type: ChangeType::TableRemoved,
            path: table.name.clone(),
            table: Some(table.name.clone()),
            field: None,
            before: Some(serde_json::to_value(table)?),
            after: None,
            impact: ImpactLevel::Critical,
            breaking: true,
            confidence: STRUCTURAL_CONFIDENCE,
            description: format!(
                "Table {} dropped ({} fields, all data lost)",
                table.name,
                table.fields.len()
            ),
        })
    }

    fn diff_table(
        name: &str,
        before: &Table,
        after: &Table,
        changes: &mut Vec<SchemaChange>,
    ) -> Result<(), AppError> {
        if before.description != after.description {
            changes.push(SchemaChange {
                change_type: ChangeType::TableModified,
                path: name.to_string(),
                table: Some(name.to_string()),
                field: None,
                before: Some(serde_json::to_value(&before.description)?),
                after: Some(serde_json::to_value(&after.description)?),
                impact: ImpactLevel::Low,
                breaking: false,
                confidence: STRUCTURAL_CONFIDENCE,
                description: format!("Table {} description updated", name),
            });
        }

        for (field_name, from, to) in pair_by_name(&before.fields, &after.fields, |f| &f.name) {
            let path = format!("{}.{}", name, field_name);
            let (change_type, impact, breaking, confidence, description) = match (from, to) {
                (None, Some(field)) => {
                    let (impact, breaking) = Self::assess_add_field_risk(field);
                    (
                        ChangeType::FieldAdded,
                        impact,
                        breaking,
                        STRUCTURAL_CONFIDENCE,
                        format!(
                            "Field {} added (type: {}, nullable: {})",
                            path, field.data_type, field.nullable
                        ),
                    )
                }
                (Some(field), None) => (
                    ChangeType::FieldRemoved,
                    ImpactLevel::High,
                    true,
                    STRUCTURAL_CONFIDENCE,
                    format!("Field {} dropped (type: {}, data lost)", path, field.data_type),
                ),
                (Some(from), Some(to)) => {
                    let assessment = Self::compare_fields(from, to);
                    (
                        ChangeType::FieldModified,
                        assessment.impact,
                        assessment.breaking,
                        assessment.confidence,
                        format!("Field {} modified: {}", path, assessment.modifications.join(", ")),
                    )
                }
                (None, None) => continue,
            };

            changes.push(SchemaChange {
                change_type,
                path,
                table: Some(name.to_string()),
                field: Some(field_name.to_string()),
                before: to_json(from)?,
                after: to_json(to)?,
                impact,
                breaking,
                confidence,
                description,
            });
        }

        for (index_name, from, to) in pair_by_name(&before.indexes, &after.indexes, |i| &i.name) {
            let (impact, breaking, description) = Self::assess_index_change(name, index_name, from, to);
            changes.push(SchemaChange {
                change_type: ChangeType::new(ObjectKind::Index, kind_of(from, to)),
                path: format!("{}.{}", name, index_name),
                table: Some(name.to_string()),
                field: None,
                before: to_json(from)?,
                after: to_json(to)?,
                impact,
                breaking,
                confidence: STRUCTURAL_CONFIDENCE,
                description,
            });
        }

        for (constraint_name, from, to) in
            pair_by_name(&before.constraints, &after.constraints, |c| &c.name)
        {
            let (impact, breaking, description) =
                Self::assess_constraint_change(name, constraint_name, from, to);
            changes.push(SchemaChange {
                change_type: ChangeType::new(ObjectKind::Constraint, kind_of(from, to)),
                path: format!("{}.{}", name, constraint_name),
                table: Some(name.to_string()),
                field: None,
                before: to_json(from)?,
                after: to_json(to)?,
                impact,
                breaking,
                confidence: STRUCTURAL_CONFIDENCE,
                description,
            });
        }

        Ok(())
    }

    // =========================================================================
    // FIELDS
    // =========================================================================

    fn assess_add_field_risk(field: &Field) -> (ImpactLevel, bool) {
        // NOT NULL without default fails on existing rows
        if !field.nullable && field.default_value.is_none() {
            return (ImpactLevel::High, true);
        }
        (ImpactLevel::Low, false)
    }

    fn compare_fields(from: &Field, to: &Field) -> FieldAssessment {
        let mut assessment = FieldAssessment {
            modifications: Vec::new(),
            impact: ImpactLevel::Low,
            breaking: false,
            confidence: STRUCTURAL_CONFIDENCE,
        };

        if from.data_type != to.data_type {
            assessment
                .modifications
                .push(format!("type: {} → {}", from.data_type, to.data_type));
            assessment.confidence = TYPE_CHANGE_CONFIDENCE;
            if is_type_change_breaking(&from.data_type, &to.data_type) {
                assessment.raise(ImpactLevel::High, true);
            } else {
                assessment.raise(ImpactLevel::Medium, false);
            }
        }

        if from.nullable != to.nullable {
            if to.nullable {
                assessment.modifications.push("now nullable".to_string());
            } else {
                assessment.modifications.push("now NOT NULL".to_string());
                // Could fail if NULLs exist
                assessment.raise(ImpactLevel::Medium, true);
            }
        }

        if from.unique != to.unique {
            if to.unique {
                assessment.modifications.push("now UNIQUE".to_string());
                assessment.raise(ImpactLevel::Medium, true);
            } else {
                assessment.modifications.push("no longer UNIQUE".to_string());
            }
        }

        if from.default_value != to.default_value {
            assessment.modifications.push(format!(
                "default: {:?} → {:?}",
                from.default_value, to.default_value
            ));
        }

        if from.primary_key != to.primary_key {
            if to.primary_key {
                assessment.modifications.push("added to PRIMARY KEY".to_string());
            } else {
                assessment.modifications.push("removed from PRIMARY KEY".to_string());
                assessment.raise(ImpactLevel::Critical, true);
            }
        }

        assessment
    }

    // =========================================================================
    // INDEXES & CONSTRAINTS
    // =========================================================================

    fn assess_index_change(
        table: &str,
        name: &str,
        from: Option<&Index>,
        to: Option<&Index>,
    ) -> (ImpactLevel, bool, String) {
        match (from, to) {
            (None, Some(index)) => (
                ImpactLevel::Low,
                false,
                format!(
                    "{}Index {} added on {} (fields: {})",
                    if index.unique { "Unique " } else { "" },
                    name,
                    table,
                    index.fields.join(", ")
                ),
            ),
            (Some(index), None) => {
                // Unique index removal drops an enforced guarantee
                let impact = if index.unique { ImpactLevel::High } else { ImpactLevel::Medium };
                (
                    impact,
                    index.unique,
                    format!("Index {} dropped from {} (may impact query performance)", name, table),
                )
            }
            (Some(from), Some(to)) => {
                let became_unique = !from.unique && to.unique;
                (
                    ImpactLevel::Medium,
                    became_unique,
                    format!(
                        "Index {} on {} modified: ({}) → ({}){}",
                        name,
                        table,
                        from.fields.join(", "),
                        to.fields.join(", "),
                        if became_unique { ", now unique" } else { "" }
                    ),
                )
            }
            (None, None) => (ImpactLevel::Low, false, String::new()),
        }
    }

    fn assess_constraint_change(
        table: &str,
        name: &str,
        from: Option<&Constraint>,
        to: Option<&Constraint>,
    ) -> (ImpactLevel, bool, String) {
        use crate::schema::ConstraintKind;

        match (from, to) {
            (None, Some(constraint)) => (
                ImpactLevel::Medium,
                true,
                format!(
                    "Constraint {} ({:?}) added on {}; existing rows must satisfy it",
                    name, constraint.kind, table
                ),
            ),
            (Some(constraint), None) => {
                let guarantees_identity = matches!(
                    constraint.kind,
                    ConstraintKind::PrimaryKey | ConstraintKind::Unique
                );
                let impact = if guarantees_identity { ImpactLevel::High } else { ImpactLevel::Medium };
                (
                    impact,
                    guarantees_identity,
                    format!("Constraint {} ({:?}) dropped from {}", name, constraint.kind, table),
                )
            }
            (Some(_), Some(_)) => (
                ImpactLevel::Medium,
                true,
                format!("Constraint {} on {} modified", name, table),
            ),
            (None, None) => (ImpactLevel::Low, false, String::new()),
        }
    }

    // =========================================================================
    // RELATIONSHIPS
    // =========================================================================

    fn diff_relationships(
        from: &[Relationship],
        to: &[Relationship],
        changes: &mut Vec<SchemaChange>,
    ) -> Result<(), AppError> {
        for (name, before, after) in pair_by_name(from, to, |r| &r.name) {
            let rel = match after.or(before) {
                Some(rel) => rel,
                None => continue,
            };
            let (impact, breaking, description) = match (before, after) {
                (None, Some(_)) => (
                    ImpactLevel::Low,
                    false,
                    format!(
                        "Relationship {} added: {}.{} → {}.{}",
                        name,
                        rel.from_table,
                        rel.from_fields.join(","),
                        rel.to_table,
                        rel.to_fields.join(",")
                    ),
                ),
                (Some(_), None) => (
                    ImpactLevel::Medium,
                    false,
                    format!("Relationship {} dropped (referential integrity removed)", name),
                ),
                _ => (
                    ImpactLevel::High,
                    true,
                    format!("Relationship {} redefined", name),
                ),
            };

            changes.push(SchemaChange {
                change_type: ChangeType::new(ObjectKind::Relationship, kind_of(before, after)),
                path: name.to_string(),
                table: Some(rel.from_table.clone()),
                field: None,
                before: to_json(before)?,
                after: to_json(after)?,
                impact,
                breaking,
                confidence: STRUCTURAL_CONFIDENCE,
                description,
            });
        }
        Ok(())
    }
}

struct FieldAssessment {
    modifications: Vec<String>,
    impact: ImpactLevel,
    breaking: bool,
    confidence: f64,
}

impl FieldAssessment {
    fn raise(&mut self, impact: ImpactLevel, breaking: bool) {
        self.impact = self.impact.max(impact);
        self.breaking |= breaking;
    }
}

/// Pair up elements of two collections by name, in name order, keeping only
/// the names whose elements differ
fn pair_by_name<'a, T: PartialEq>(
    from: &'a [T],
    to: &'a [T],
    name: impl Fn(&T) -> &String,
) -> Vec<(&'a str, Option<&'a T>, Option<&'a T>)> {
    let from_map: BTreeMap<&str, &T> = from.iter().map(|x| (name(x).as_str(), x)).collect();
    let to_map: BTreeMap<&str, &T> = to.iter().map(|x| (name(x).as_str(), x)).collect();
    let names: BTreeSet<&str> = from_map.keys().chain(to_map.keys()).copied().collect();

    names
        .into_iter()
        .filter_map(|key| {
            let before = from_map.get(key).copied();
            let after = to_map.get(key).copied();
            if before == after {
                None
            } else {
                Some((key, before, after))
            }
        })
        .collect()
}

fn kind_of<T>(before: Option<&T>, after: Option<&T>) -> ChangeKind {
    match (before, after) {
        (None, _) => ChangeKind::Added,
        (_, None) => ChangeKind::Removed,
        _ => ChangeKind::Modified,
    }
}

fn to_json<T: Serialize>(value: Option<&T>) -> Result<Option<serde_json::Value>, AppError> {
    value.map(serde_json::to_value).transpose().map_err(AppError::from)
}

/// Strip length/precision parameters: `varchar(50)` → `varchar`
fn base_type(data_type: &str) -> String {
    let lower = data_type.trim().to_lowercase();
    match lower.find('(') {
        Some(pos) => lower[..pos].trim().to_string(),
        None => lower,
    }
}

fn type_length(data_type: &str) -> Option<u32> {
    let start = data_type.find('(')?;
    let end = data_type.find(')')?;
    data_type.get(start + 1..end)?.split(',').next()?.trim().parse().ok()
}

fn is_type_change_breaking(from: &str, to: &str) -> bool {
    let from_base = base_type(from);
    let to_base = base_type(to);

    // Widening conversions are generally safe
    let safe_widenings = [
        ("integer", "bigint"),
        ("int", "bigint"),
        ("smallint", "integer"),
        ("smallint", "bigint"),
        ("real", "double precision"),
        ("float", "double precision"),
        ("varchar", "text"),
        ("char", "varchar"),
        ("char", "text"),
    ];
    if safe_widenings
        .iter()
        .any(|(f, t)| from_base == *f && to_base == *t)
    {
        return false;
    }

    // Same base type with a larger (or removed) length limit
    if from_base == to_base {
        return match (type_length(from), type_length(to)) {
            (Some(old), Some(new)) => new < old,
            (Some(_), None) => false,
            _ => true,
        };
    }

    // Any other type change is potentially breaking
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn snapshot(value: serde_json::Value) -> SchemaSnapshot {
        SchemaSnapshot::from_value(value).unwrap()
    }

    fn users() -> serde_json::Value {
        json!({
            "name": "users",
            "fields": [
                { "name": "id", "dataType": "integer", "nullable": false, "primaryKey": true },
                { "name": "email", "dataType": "varchar(100)" }
            ]
        })
    }

    #[test]
    fn test_identical_snapshots_have_no_changes() {
        let a = snapshot(json!({ "tables": [users()] }));
        assert!(DiffEngine::compare(&a, &a.clone()).unwrap().is_empty());
    }

    #[test]
    fn test_table_added_and_removed() {
        let a = snapshot(json!({ "tables": [users()] }));
        let b = snapshot(json!({ "tables": [{ "name": "orders" }] }));

        let changes = DiffEngine::compare(&a, &b).unwrap();
        let kinds: Vec<_> = changes.iter().map(|c| (c.change_type, c.path.as_str())).collect();
        assert_eq!(
            kinds,
            vec![
                (ChangeType::TableAdded, "orders"),
                (ChangeType::TableRemoved, "users"),
            ]
        );
        assert_eq!(changes[1].impact, ImpactLevel::Critical);
        assert!(changes[1].breaking);
    }

    #[test]
    fn test_field_removed_is_high_and_breaking() {
        let a = snapshot(json!({ "tables": [users()] }));
        let b = snapshot(json!({
            "tables": [{ "name": "users", "fields": [
                { "name": "id", "dataType": "integer", "nullable": false, "primaryKey": true }
            ] }]
        }));

        let changes = DiffEngine::compare(&a, &b).unwrap();
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].change_type, ChangeType::FieldRemoved);
        assert_eq!(changes[0].path, "users.email");
        assert_eq!(changes[0].field.as_deref(), Some("email"));
        assert_eq!(changes[0].impact, ImpactLevel::High);
        assert!(changes[0].breaking);
    }

    #[test]
    fn test_not_null_field_without_default_is_breaking() {
        let a = snapshot(json!({ "tables": [users()] }));
        let mut with_status = users();
        with_status["fields"]
            .as_array_mut()
            .unwrap()
            .push(json!({ "name": "status", "dataType": "text", "nullable": false }));
        let b = snapshot(json!({ "tables": [with_status] }));

        let changes = DiffEngine::compare(&a, &b).unwrap();
        assert_eq!(changes[0].change_type, ChangeType::FieldAdded);
        assert_eq!(changes[0].impact, ImpactLevel::High);
        assert!(changes[0].breaking);
    }

    #[test]
    fn test_type_widening_is_safe() {
        assert!(!is_type_change_breaking("integer", "bigint"));
        assert!(!is_type_change_breaking("varchar(50)", "varchar(100)"));
        assert!(!is_type_change_breaking("VARCHAR(50)", "text"));
        assert!(is_type_change_breaking("varchar(100)", "varchar(50)"));
        assert!(is_type_change_breaking("bigint", "integer"));
        assert!(is_type_change_breaking("text", "integer"));
    }

    #[test]
    fn test_field_modifications_take_highest_impact() {
        let a = snapshot(json!({ "tables": [users()] }));
        let b = snapshot(json!({
            "tables": [{ "name": "users", "fields": [
                { "name": "id", "dataType": "bigint", "nullable": false, "primaryKey": false },
                { "name": "email", "dataType": "varchar(100)" }
            ] }]
        }));

        let changes = DiffEngine::compare(&a, &b).unwrap();
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].change_type, ChangeType::FieldModified);
        assert_eq!(changes[0].impact, ImpactLevel::Critical);
        assert!(changes[0].breaking);
        assert_eq!(changes[0].confidence, TYPE_CHANGE_CONFIDENCE);
        assert!(changes[0].description.contains("removed from PRIMARY KEY"));
    }

    #[test]
    fn test_deterministic_order() {
        let a = snapshot(json!({ "tables": [users()] }));
        let b = snapshot(json!({
            "tables": [
                { "name": "zeta" },
                {
                    "name": "users",
                    "fields": [
                        { "name": "id", "dataType": "integer", "nullable": false, "primaryKey": true },
                        { "name": "email", "dataType": "varchar(100)" },
                        { "name": "age", "dataType": "integer" }
                    ],
                    "indexes": [{ "name": "idx_users_email", "fields": ["email"], "unique": true }]
                },
                { "name": "alpha" }
            ]
        }));

        let first = DiffEngine::compare(&a, &b).unwrap();
        let second = DiffEngine::compare(&a, &b).unwrap();
        assert_eq!(first, second);

        let paths: Vec<_> = first.iter().map(|c| c.path.as_str()).collect();
        assert_eq!(paths, vec!["alpha", "users.age", "users.idx_users_email", "zeta"]);
    }

    #[test]
    fn test_relationship_changes() {
        let base = json!({
            "tables": [
                users(),
                { "name": "orders", "fields": [{ "name": "user_id", "dataType": "integer" }] }
            ]
        });
        let mut linked = base.clone();
        linked["relationships"] = json!([{
            "name": "fk_orders_user",
            "fromTable": "orders",
            "fromFields": ["user_id"],
            "toTable": "users",
            "toFields": ["id"]
        }]);
        let mut cascaded = linked.clone();
        cascaded["relationships"][0]["onDelete"] = json!("cascade");

        let a = snapshot(base);
        let b = snapshot(linked);
        let c = snapshot(cascaded);

        let added = DiffEngine::compare(&a, &b).unwrap();
        assert_eq!(added[0].change_type, ChangeType::RelationshipAdded);
        assert_eq!(added[0].table.as_deref(), Some("orders"));
        assert!(!added[0].breaking);

        let modified = DiffEngine::compare(&b, &c).unwrap();
        assert_eq!(modified[0].change_type, ChangeType::RelationshipModified);
        assert_eq!(modified[0].impact, ImpactLevel::High);
        assert!(modified[0].breaking);

        let removed = DiffEngine::compare(&b, &a).unwrap();
        assert_eq!(removed[0].change_type, ChangeType::RelationshipRemoved);
        assert_eq!(removed[0].impact, ImpactLevel::Medium);
    }

    #[test]
    fn test_analyze_partitions_and_impact() {
        let engine = DiffEngine::new(&PlannerConfig::default());
        let a = snapshot(json!({ "tables": [users()] }));
        let b = snapshot(json!({
            "tables": [
                { "name": "users", "fields": [
                    { "name": "id", "dataType": "integer", "nullable": false, "primaryKey": true }
                ] },
                { "name": "orders" }
            ]
        }));

        let result = engine.analyze(&a, &b).unwrap();
        assert_eq!(result.changes.len(), 2);
        assert_eq!(result.additions.len(), 1);
        assert_eq!(result.deletions.len(), 1);
        assert!(result.modifications.is_empty());
        assert_eq!(result.breaking_changes.len(), 1);
        assert_eq!(result.impact, ImpactLevel::Medium);
    }

    #[test]
    fn test_impact_high_above_breaking_threshold() {
        let engine = DiffEngine::new(&PlannerConfig {
            breaking_impact_threshold: 1,
            ..PlannerConfig::default()
        });
        let a = snapshot(json!({ "tables": [users()] }));
        let b = snapshot(json!({
            "tables": [{ "name": "users", "fields": [
                { "name": "id", "dataType": "integer", "nullable": false, "primaryKey": true },
                { "name": "email", "dataType": "varchar(100)", "nullable": false, "unique": true }
            ] }]
        }));

        // One field change flagged breaking for two reasons still counts once
        let result = engine.analyze(&a, &b).unwrap();
        assert_eq!(result.breaking_changes.len(), 1);
        assert_eq!(result.impact, ImpactLevel::Medium);

        let c = snapshot(json!({ "tables": [{ "name": "users" }] }));
        let result = engine.analyze(&a, &c).unwrap();
        assert_eq!(result.breaking_changes.len(), 2);
        assert_eq!(result.impact, ImpactLevel::High);
    }
}

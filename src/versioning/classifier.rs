//! Breaking-change classification
//!
//! Decides which structural changes alter the observable contract of the
//! schema and turns them into [`BreakingChange`] records with templated
//! impact, mitigation and rollback guidance.

use crate::versioning::types::{BreakingChange, BreakingChangeType, ChangeType, SchemaChange};
use std::collections::BTreeSet;

pub struct BreakingChangeClassifier;

impl BreakingChangeClassifier {
    /// Breaking when flagged by the diff, or when the change is high/critical
    pub fn is_breaking(change: &SchemaChange) -> bool {
        change.breaking || change.impact.is_severe()
    }

    pub fn category(change_type: ChangeType) -> BreakingChangeType {
        match change_type {
            ChangeType::FieldRemoved => BreakingChangeType::FieldRemoved,
            ChangeType::FieldModified => BreakingChangeType::FieldTypeChanged,
            ChangeType::ConstraintAdded => BreakingChangeType::ConstraintAdded,
            ChangeType::ConstraintRemoved => BreakingChangeType::ConstraintRemoved,
            ChangeType::IndexAdded | ChangeType::IndexRemoved | ChangeType::IndexModified => {
                BreakingChangeType::IndexChanged
            }
            ChangeType::RelationshipAdded
            | ChangeType::RelationshipRemoved
            | ChangeType::RelationshipModified => BreakingChangeType::RelationshipChanged,
            ChangeType::TableRemoved => BreakingChangeType::TableRemoved,
            _ => BreakingChangeType::Unknown,
        }
    }

    /// Write the breaking decision back onto each change so every
    /// breaking record points at a change flagged `breaking`
    pub fn annotate(changes: &mut [SchemaChange]) {
        for change in changes.iter_mut() {
            change.breaking = Self::is_breaking(change);
        }
    }

    /// Build breaking-change records for every breaking change, in input order
    pub fn classify(changes: &[SchemaChange]) -> Vec<BreakingChange> {
        changes
            .iter()
            .filter(|c| Self::is_breaking(c))
            .map(Self::describe)
            .collect()
    }

    fn describe(change: &SchemaChange) -> BreakingChange {
        let category = Self::category(change.change_type);
        let severity = change.impact;

        BreakingChange {
            id: format!("{}:{}", change.change_type, change.path),
            category,
            severity,
            description: change.description.clone(),
            affected_tables: affected_tables(change),
            affected_fields: affected_fields(change),
            impact: impact_text(category, &change.path),
            mitigation: mitigation_text(category, &change.path),
            rollback_strategy: rollback_text(category, &change.path),
            testing_required: severity.is_severe() || Self::is_breaking(change),
            confidence: change.confidence,
            source_path: change.path.clone(),
        }
    }
}

fn affected_tables(change: &SchemaChange) -> Vec<String> {
    let mut tables = BTreeSet::new();
    if let Some(table) = &change.table {
        tables.insert(table.clone());
    }
    for value in change.before.iter().chain(change.after.iter()) {
        if let Some(target) = value.get("toTable").and_then(|v| v.as_str()) {
            tables.insert(target.to_string());
        }
    }
    tables.into_iter().collect()
}

fn affected_fields(change: &SchemaChange) -> Vec<String> {
    if let Some(field) = &change.field {
        return vec![field.clone()];
    }

    let mut fields = BTreeSet::new();
    for value in change.before.iter().chain(change.after.iter()) {
        for key in ["fields", "fromFields"] {
            if let Some(list) = value.get(key).and_then(|v| v.as_array()) {
                fields.extend(list.iter().filter_map(|f| f.as_str()).map(str::to_string));
            }
        }
    }
    fields.into_iter().collect()
}

fn impact_text(category: BreakingChangeType, path: &str) -> String {
    match category {
        BreakingChangeType::TableRemoved => format!(
            "All queries, views and application code reading or writing {} will fail and its data is lost",
            path
        ),
        BreakingChangeType::FieldRemoved => format!(
            "Queries selecting or writing {} will fail and the stored values are lost",
            path
        ),
        BreakingChangeType::FieldTypeChanged => format!(
            "Existing values of {} may not convert and clients may read a different type",
            path
        ),
        BreakingChangeType::ConstraintAdded => format!(
            "Existing rows violating {} block the migration and new writes may be rejected",
            path
        ),
        BreakingChangeType::ConstraintRemoved => format!(
            "Guarantees enforced by {} disappear; duplicates or invalid rows become possible",
            path
        ),
        BreakingChangeType::IndexChanged => format!(
            "Uniqueness or query performance provided by {} changes",
            path
        ),
        BreakingChangeType::RelationshipChanged => format!(
            "Referential integrity and joins relying on {} change behavior",
            path
        ),
        BreakingChangeType::Unknown => format!("Change at {} alters the schema contract", path),
    }
}

fn mitigation_text(category: BreakingChangeType, path: &str) -> String {
    match category {
        BreakingChangeType::TableRemoved => format!(
            "Archive {} and confirm no service still references it before dropping",
            path
        ),
        BreakingChangeType::FieldRemoved => format!(
            "Deprecate {} first, stop all reads and writes, then drop it in a later release",
            path
        ),
        BreakingChangeType::FieldTypeChanged => format!(
            "Add a new field with the target type, backfill from {}, then switch clients over",
            path
        ),
        BreakingChangeType::ConstraintAdded => format!(
            "Clean up rows violating {} and add it as NOT VALID before validating",
            path
        ),
        BreakingChangeType::ConstraintRemoved => format!(
            "Enforce the rule behind {} in application code before removing it",
            path
        ),
        BreakingChangeType::IndexChanged => format!(
            "Build the replacement for {} concurrently before dropping the old one",
            path
        ),
        BreakingChangeType::RelationshipChanged => format!(
            "Verify orphaned rows and cascade behavior for {} in staging",
            path
        ),
        BreakingChangeType::Unknown => {
            format!("Review {} manually and test against production-like data", path)
        }
    }
}

fn rollback_text(category: BreakingChangeType, path: &str) -> String {
    match category {
        BreakingChangeType::TableRemoved | BreakingChangeType::FieldRemoved => format!(
            "Recreate {} from the previous version and restore its data from backup",
            path
        ),
        BreakingChangeType::FieldTypeChanged => {
            format!("Convert {} back to its previous type; lossy conversions need a backup", path)
        }
        _ => format!("Re-apply the previous definition of {}", path),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::versioning::types::ImpactLevel;
    use serde_json::json;

    fn change(change_type: ChangeType, impact: ImpactLevel, breaking: bool) -> SchemaChange {
        SchemaChange {
            change_type,
            path: "orders.notes".to_string(),
            table: Some("orders".to_string()),
            field: Some("notes".to_string()),
            before: None,
            after: None,
            impact,
            breaking,
            confidence: 1.0,
            description: "Field orders.notes dropped".to_string(),
        }
    }

    #[test]
    fn test_breaking_rule() {
        assert!(BreakingChangeClassifier::is_breaking(&change(ChangeType::FieldModified, ImpactLevel::Medium, true)));
        assert!(BreakingChangeClassifier::is_breaking(&change(ChangeType::FieldModified, ImpactLevel::High, false)));
        assert!(!BreakingChangeClassifier::is_breaking(&change(ChangeType::FieldModified, ImpactLevel::Medium, false)));
    }

    #[test]
    fn test_field_removed_record() {
        let records = BreakingChangeClassifier::classify(&[change(ChangeType::FieldRemoved, ImpactLevel::High, true)]);
        assert_eq!(records.len(), 1);

        let record = &records[0];
        assert_eq!(record.id, "field_removed:orders.notes");
        assert_eq!(record.category, BreakingChangeType::FieldRemoved);
        assert_eq!(record.severity, ImpactLevel::High);
        assert_eq!(record.affected_tables, vec!["orders"]);
        assert_eq!(record.affected_fields, vec!["notes"]);
        assert!(record.testing_required);
        assert_eq!(record.source_path, "orders.notes");
    }

    #[test]
    fn test_unmapped_types_are_unknown() {
        assert_eq!(
            BreakingChangeClassifier::category(ChangeType::FieldAdded),
            BreakingChangeType::Unknown
        );
        assert_eq!(
            BreakingChangeClassifier::category(ChangeType::ConstraintModified),
            BreakingChangeType::Unknown
        );
        assert_eq!(
            BreakingChangeClassifier::category(ChangeType::TableRemoved),
            BreakingChangeType::TableRemoved
        );
    }

    #[test]
    fn test_annotate_flags_severe_changes() {
        let mut changes = vec![
            change(ChangeType::FieldRemoved, ImpactLevel::High, false),
            change(ChangeType::FieldModified, ImpactLevel::Low, false),
        ];
        BreakingChangeClassifier::annotate(&mut changes);
        assert!(changes[0].breaking);
        assert!(!changes[1].breaking);

        // Every record traces back to a change flagged breaking
        for record in BreakingChangeClassifier::classify(&changes) {
            assert!(changes.iter().any(|c| c.path == record.source_path && c.breaking));
        }
    }

    #[test]
    fn test_relationship_affects_both_tables() {
        let mut c = change(ChangeType::RelationshipModified, ImpactLevel::High, true);
        c.path = "fk_orders_customer".to_string();
        c.field = None;
        c.after = Some(json!({
            "name": "fk_orders_customer",
            "fromTable": "orders",
            "fromFields": ["customer_id"],
            "toTable": "customers",
            "toFields": ["id"]
        }));

        let record = &BreakingChangeClassifier::classify(&[c])[0];
        assert_eq!(record.category, BreakingChangeType::RelationshipChanged);
        assert_eq!(record.affected_tables, vec!["customers", "orders"]);
        assert_eq!(record.affected_fields, vec!["customer_id"]);
    }
}

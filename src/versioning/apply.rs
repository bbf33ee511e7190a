//! Snapshot patching
//!
//! Replays a list of [`SchemaChange`]s on a snapshot. Each change carries the
//! full before/after value of the object it touches, so a diff can be applied
//! forward on its source or reverted from its target.

use crate::error::AppError;
use crate::schema::{Constraint, Field, Index, Relationship, SchemaSnapshot, Table};
use crate::versioning::types::{ChangeKind, ObjectKind, SchemaChange};
use serde::de::DeserializeOwned;

pub struct SnapshotPatcher;

impl SnapshotPatcher {
    /// Apply `changes` in order to `base`
    pub fn apply(base: &SchemaSnapshot, changes: &[SchemaChange]) -> Result<SchemaSnapshot, AppError> {
        let mut snapshot = base.clone();
        for change in changes {
            Self::apply_one(&mut snapshot, change)?;
        }
        Ok(snapshot.canonical())
    }

    /// Undo `changes` (which led to `target`) in reverse order
    pub fn revert(target: &SchemaSnapshot, changes: &[SchemaChange]) -> Result<SchemaSnapshot, AppError> {
        let inverted: Vec<SchemaChange> = changes.iter().rev().map(|c| c.inverted()).collect();
        Self::apply(target, &inverted)
    }

    fn apply_one(snapshot: &mut SchemaSnapshot, change: &SchemaChange) -> Result<(), AppError> {
        let kind = change.change_type.kind();

        match change.change_type.object() {
            ObjectKind::Table => match kind {
                ChangeKind::Added => {
                    let table: Table = value_of(change, change.after.as_ref())?;
                    snapshot.tables.retain(|t| t.name != table.name);
                    snapshot.tables.push(table);
                }
                ChangeKind::Removed => {
                    let table: Table = value_of(change, change.before.as_ref())?;
                    snapshot.tables.retain(|t| t.name != table.name);
                }
                ChangeKind::Modified => {
                    let description = change
                        .after
                        .as_ref()
                        .and_then(|v| v.as_str())
                        .map(str::to_string);
                    table_of(snapshot, change)?.description = description;
                }
            },
            ObjectKind::Field => {
                let table = table_of(snapshot, change)?;
                patch_named::<Field>(&mut table.fields, change, |f| &f.name)?;
            }
            ObjectKind::Index => {
                let table = table_of(snapshot, change)?;
                patch_named::<Index>(&mut table.indexes, change, |i| &i.name)?;
            }
            ObjectKind::Constraint => {
                let table = table_of(snapshot, change)?;
                patch_named::<Constraint>(&mut table.constraints, change, |c| &c.name)?;
            }
            ObjectKind::Relationship => {
                patch_named::<Relationship>(&mut snapshot.relationships, change, |r| &r.name)?;
            }
        }

        Ok(())
    }
}

fn table_of<'a>(snapshot: &'a mut SchemaSnapshot, change: &SchemaChange) -> Result<&'a mut Table, AppError> {
    let name = change.table.as_deref().unwrap_or_default();
    snapshot.table_mut(name).ok_or_else(|| {
        AppError::Internal(format!(
            "cannot apply {} at '{}': table '{}' does not exist",
            change.change_type, change.path, name
        ))
    })
}

fn value_of<T: DeserializeOwned>(change: &SchemaChange, value: Option<&serde_json::Value>) -> Result<T, AppError> {
    let value = value.ok_or_else(|| {
        AppError::Internal(format!(
            "{} at '{}' carries no value to apply",
            change.change_type, change.path
        ))
    })?;
    serde_json::from_value(value.clone()).map_err(|e| {
        AppError::Internal(format!(
            "{} at '{}' carries an unreadable value: {}",
            change.change_type, change.path, e
        ))
    })
}

/// Add, remove or replace one named element of a collection
fn patch_named<T: DeserializeOwned>(
    items: &mut Vec<T>,
    change: &SchemaChange,
    name: impl Fn(&T) -> &String,
) -> Result<(), AppError> {
    match change.change_type.kind() {
        ChangeKind::Added | ChangeKind::Modified => {
            let item: T = value_of(change, change.after.as_ref())?;
            let key = name(&item).clone();
            items.retain(|existing| *name(existing) != key);
            items.push(item);
        }
        ChangeKind::Removed => {
            let item: T = value_of(change, change.before.as_ref())?;
            let key = name(&item).clone();
            items.retain(|existing| *name(existing) != key);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::versioning::types::{ChangeType, ImpactLevel};
    use serde_json::json;

    fn base() -> SchemaSnapshot {
        SchemaSnapshot::from_value(json!({
            "tables": [{
                "name": "orders",
                "fields": [
                    { "name": "id", "dataType": "uuid", "nullable": false, "primaryKey": true },
                    { "name": "notes", "dataType": "text" }
                ]
            }]
        }))
        .unwrap()
    }

    fn change(change_type: ChangeType, path: &str, before: Option<serde_json::Value>, after: Option<serde_json::Value>) -> SchemaChange {
        SchemaChange {
            change_type,
            path: path.to_string(),
            table: Some("orders".to_string()),
            field: None,
            before,
            after,
            impact: ImpactLevel::Low,
            breaking: false,
            confidence: 1.0,
            description: String::new(),
        }
    }

    #[test]
    fn test_apply_then_revert_restores_hash() {
        let original = base();
        let notes = serde_json::to_value(original.tables[0].field("notes").unwrap()).unwrap();
        let changes = vec![
            change(
                ChangeType::FieldAdded,
                "orders.status",
                None,
                Some(json!({ "name": "status", "dataType": "text", "nullable": true })),
            ),
            change(ChangeType::FieldRemoved, "orders.notes", Some(notes), None),
            change(ChangeType::TableModified, "orders", Some(json!(null)), Some(json!("Customer orders"))),
        ];

        let patched = SnapshotPatcher::apply(&original, &changes).unwrap();
        let orders = patched.table("orders").unwrap();
        assert!(orders.field("status").is_some());
        assert!(orders.field("notes").is_none());
        assert_eq!(orders.description.as_deref(), Some("Customer orders"));

        let reverted = SnapshotPatcher::revert(&patched, &changes).unwrap();
        assert_eq!(reverted.compute_hash().unwrap(), original.compute_hash().unwrap());
    }

    #[test]
    fn test_apply_to_missing_table_fails() {
        let mut c = change(
            ChangeType::FieldAdded,
            "invoices.total",
            None,
            Some(json!({ "name": "total", "dataType": "numeric" })),
        );
        c.table = Some("invoices".to_string());

        let result = SnapshotPatcher::apply(&base(), &[c]);
        assert!(matches!(result, Err(AppError::Internal(msg)) if msg.contains("table 'invoices' does not exist")));
    }

    #[test]
    fn test_apply_table_added() {
        let c = SchemaChange {
            table: Some("customers".to_string()),
            ..change(
                ChangeType::TableAdded,
                "customers",
                None,
                Some(json!({ "name": "customers", "fields": [], "indexes": [], "constraints": [] })),
            )
        };

        let patched = SnapshotPatcher::apply(&base(), &[c]).unwrap();
        assert_eq!(patched.tables.len(), 2);
        assert_eq!(patched.tables[0].name, "customers");
    }
}

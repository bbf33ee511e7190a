//! Structural validation of submitted snapshots
//!
//! Every error names the offending path (`tables[2].fields[0].name`) so a
//! client can point at the exact element it sent.

use super::snapshot::{SchemaSnapshot, Table};
use crate::error::{validation_error, AppError};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;

static IDENTIFIER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z_][A-Za-z0-9_$]*$").expect("identifier pattern is valid")
});

fn check_identifier(path: &str, name: &str) -> Result<(), AppError> {
    if name.is_empty() {
        return Err(validation_error(format!("{} must not be empty", path)));
    }
    if !IDENTIFIER.is_match(name) {
        return Err(validation_error(format!(
            "{} '{}' is not a valid identifier",
            path, name
        )));
    }
    Ok(())
}

/// Insert into a scope's name set, failing on duplicates
fn check_unique<'a>(
    seen: &mut HashSet<&'a str>,
    path: &str,
    name: &'a str,
) -> Result<(), AppError> {
    if !seen.insert(name) {
        return Err(validation_error(format!("{} '{}' is duplicated", path, name)));
    }
    Ok(())
}

fn check_field_refs(path: &str, table: &Table, fields: &[String]) -> Result<(), AppError> {
    for (i, field) in fields.iter().enumerate() {
        if table.field(field).is_none() {
            return Err(validation_error(format!(
                "{}.fields[{}] references unknown field '{}.{}'",
                path, i, table.name, field
            )));
        }
    }
    Ok(())
}

impl SchemaSnapshot {
    /// Validate names, uniqueness and cross references
    pub fn validate(&self) -> Result<(), AppError> {
        let mut table_names = HashSet::new();

        for (t, table) in self.tables.iter().enumerate() {
            let table_path = format!("tables[{}]", t);
            check_identifier(&format!("{}.name", table_path), &table.name)?;
            check_unique(&mut table_names, &format!("{}.name", table_path), &table.name)?;

            let mut field_names = HashSet::new();
            for (f, field) in table.fields.iter().enumerate() {
                let path = format!("{}.fields[{}]", table_path, f);
                check_identifier(&format!("{}.name", path), &field.name)?;
                check_unique(&mut field_names, &format!("{}.name", path), &field.name)?;
                if field.data_type.trim().is_empty() {
                    return Err(validation_error(format!("{}.dataType must not be empty", path)));
                }
            }

            let mut index_names = HashSet::new();
            for (i, index) in table.indexes.iter().enumerate() {
                let path = format!("{}.indexes[{}]", table_path, i);
                check_identifier(&format!("{}.name", path), &index.name)?;
                check_unique(&mut index_names, &format!("{}.name", path), &index.name)?;
                if index.fields.is_empty() {
                    return Err(validation_error(format!("{}.fields must not be empty", path)));
                }
                check_field_refs(&path, table, &index.fields)?;
            }

            let mut constraint_names = HashSet::new();
            for (c, constraint) in table.constraints.iter().enumerate() {
                let path = format!("{}.constraints[{}]", table_path, c);
                check_identifier(&format!("{}.name", path), &constraint.name)?;
                check_unique(&mut constraint_names, &format!("{}.name", path), &constraint.name)?;
                check_field_refs(&path, table, &constraint.fields)?;
            }
        }

        let mut relationship_names = HashSet::new();
        for (r, rel) in self.relationships.iter().enumerate() {
            let path = format!("relationships[{}]", r);
            check_identifier(&format!("{}.name", path), &rel.name)?;
            check_unique(&mut relationship_names, &format!("{}.name", path), &rel.name)?;

            if rel.from_fields.is_empty() || rel.from_fields.len() != rel.to_fields.len() {
                return Err(validation_error(format!(
                    "{} must map the same non-zero number of fields on both sides",
                    path
                )));
            }

            for (side, table_name, fields) in [
                ("fromTable", &rel.from_table, &rel.from_fields),
                ("toTable", &rel.to_table, &rel.to_fields),
            ] {
                let table = self.table(table_name).ok_or_else(|| {
                    validation_error(format!(
                        "{}.{} references unknown table '{}'",
                        path, side, table_name
                    ))
                })?;
                check_field_refs(&path, table, fields)?;
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parse(value: serde_json::Value) -> Result<SchemaSnapshot, AppError> {
        SchemaSnapshot::from_value(value)
    }

    #[test]
    fn test_identifier_pattern() {
        assert!(IDENTIFIER.is_match("orders"));
        assert!(IDENTIFIER.is_match("_tmp$1"));
        assert!(!IDENTIFIER.is_match("1orders"));
        assert!(!IDENTIFIER.is_match("order items"));
    }

    #[test]
    fn test_valid_schema_passes() {
        let result = parse(json!({
            "tables": [
                { "name": "customers", "fields": [{ "name": "id", "dataType": "uuid", "primaryKey": true }] },
                {
                    "name": "orders",
                    "fields": [
                        { "name": "id", "dataType": "uuid", "primaryKey": true },
                        { "name": "customer_id", "dataType": "uuid" }
                    ],
                    "indexes": [{ "name": "idx_orders_customer", "fields": ["customer_id"] }]
                }
            ],
            "relationships": [{
                "name": "fk_orders_customer",
                "fromTable": "orders",
                "fromFields": ["customer_id"],
                "toTable": "customers",
                "toFields": ["id"]
            }]
        }));
        assert!(result.is_ok());
    }

    #[test]
    fn test_duplicate_table_rejected() {
        let err = parse(json!({
            "tables": [{ "name": "orders" }, { "name": "orders" }]
        }))
        .unwrap_err();
        assert_eq!(
            err,
            AppError::Validation("tables[1].name 'orders' is duplicated".to_string())
        );
    }

    #[test]
    fn test_invalid_field_name_rejected() {
        let err = parse(json!({
            "tables": [{ "name": "orders", "fields": [{ "name": "total amount", "dataType": "numeric" }] }]
        }))
        .unwrap_err();
        assert!(matches!(err, AppError::Validation(msg) if msg.starts_with("tables[0].fields[0].name")));
    }

    #[test]
    fn test_index_on_unknown_field_rejected() {
        let err = parse(json!({
            "tables": [{
                "name": "orders",
                "fields": [{ "name": "id", "dataType": "uuid" }],
                "indexes": [{ "name": "idx_missing", "fields": ["missing"] }]
            }]
        }))
        .unwrap_err();
        assert!(matches!(err, AppError::Validation(msg) if msg.contains("unknown field 'orders.missing'")));
    }

    #[test]
    fn test_relationship_to_unknown_table_rejected() {
        let err = parse(json!({
            "tables": [{ "name": "orders", "fields": [{ "name": "customer_id", "dataType": "uuid" }] }],
            "relationships": [{
                "name": "fk_orders_customer",
                "fromTable": "orders",
                "fromFields": ["customer_id"],
                "toTable": "customers",
                "toFields": ["id"]
            }]
        }))
        .unwrap_err();
        assert!(matches!(err, AppError::Validation(msg) if msg.contains("unknown table 'customers'")));
    }
}

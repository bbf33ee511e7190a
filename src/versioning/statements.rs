//! Portable DDL statements for plan steps
//!
//! Statements are built from the before/after values carried by each
//! [`SchemaChange`]. They are documentation for humans and a future executor;
//! nothing here runs them.

use crate::error::AppError;
use crate::schema::{Constraint, ConstraintKind, Field, Index, Relationship, Table};
use crate::versioning::types::{ChangeType, SchemaChange};
use serde::de::DeserializeOwned;

pub struct StatementBuilder;

impl StatementBuilder {
    /// Statement applying `change`
    pub fn forward(change: &SchemaChange) -> Result<String, AppError> {
        let table = change.table.as_deref().unwrap_or_default();

        let sql = match change.change_type {
            ChangeType::TableAdded => create_table_sql(&after::<Table>(change)?),
            ChangeType::TableRemoved => format!("DROP TABLE \"{}\";", table),
            ChangeType::TableModified => {
                match change.after.as_ref().and_then(|v| v.as_str()) {
                    Some(text) => format!("COMMENT ON TABLE \"{}\" IS '{}';", table, text.replace('\'', "''")),
                    None => format!("COMMENT ON TABLE \"{}\" IS NULL;", table),
                }
            }
            ChangeType::FieldAdded => add_field_sql(table, &after::<Field>(change)?),
            ChangeType::FieldRemoved => {
                let field = before::<Field>(change)?;
                format!("ALTER TABLE \"{}\" DROP COLUMN \"{}\";", table, field.name)
            }
            ChangeType::FieldModified => {
                modify_field_sql(table, &before::<Field>(change)?, &after::<Field>(change)?)
            }
            ChangeType::IndexAdded => create_index_sql(table, &after::<Index>(change)?),
            ChangeType::IndexRemoved => drop_index_sql(&before::<Index>(change)?),
            ChangeType::IndexModified => format!(
                "{}\n{}",
                drop_index_sql(&before::<Index>(change)?),
                create_index_sql(table, &after::<Index>(change)?)
            ),
            ChangeType::ConstraintAdded => add_constraint_sql(table, &after::<Constraint>(change)?),
            ChangeType::ConstraintRemoved => {
                drop_constraint_sql(table, &before::<Constraint>(change)?.name)
            }
            ChangeType::ConstraintModified => format!(
                "{}\n{}",
                drop_constraint_sql(table, &before::<Constraint>(change)?.name),
                add_constraint_sql(table, &after::<Constraint>(change)?)
            ),
            ChangeType::RelationshipAdded => add_relationship_sql(&after::<Relationship>(change)?),
            ChangeType::RelationshipRemoved => {
                let rel = before::<Relationship>(change)?;
                drop_constraint_sql(&rel.from_table, &rel.name)
            }
            ChangeType::RelationshipModified => {
                let old = before::<Relationship>(change)?;
                format!(
                    "{}\n{}",
                    drop_constraint_sql(&old.from_table, &old.name),
                    add_relationship_sql(&after::<Relationship>(change)?)
                )
            }
        };

        Ok(sql)
    }

    /// Statement undoing `change`. Dropped tables and fields can't be
    /// recreated with their data, so those have no inverse.
    pub fn inverse(change: &SchemaChange) -> Result<Option<String>, AppError> {
        if change.is_destructive() {
            return Ok(None);
        }
        Self::forward(&change.inverted()).map(Some)
    }

    /// Structural inverse of every change, newest first. Destructive changes
    /// are recreated empty; their data comes back from backup.
    pub fn structural_rollback(changes: &[SchemaChange]) -> Result<String, AppError> {
        let statements = changes
            .iter()
            .rev()
            .map(|c| Self::forward(&c.inverted()))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(statements.join("\n"))
    }
}

fn before<T: DeserializeOwned>(change: &SchemaChange) -> Result<T, AppError> {
    decode(change, change.before.as_ref(), "before")
}

fn after<T: DeserializeOwned>(change: &SchemaChange) -> Result<T, AppError> {
    decode(change, change.after.as_ref(), "after")
}

fn decode<T: DeserializeOwned>(
    change: &SchemaChange,
    value: Option<&serde_json::Value>,
    side: &str,
) -> Result<T, AppError> {
    let value = value.ok_or_else(|| {
        AppError::Internal(format!(
            "{} at '{}' has no {} value",
            change.change_type, change.path, side
        ))
    })?;
    serde_json::from_value(value.clone()).map_err(AppError::from)
}

fn quoted(names: &[String]) -> String {
    names
        .iter()
        .map(|n| format!("\"{}\"", n))
        .collect::<Vec<_>>()
        .join(", ")
}

fn field_definition(field: &Field) -> String {
    let mut def = format!("\"{}\" {}", field.name, field.data_type);
    if !field.nullable {
        def.push_str(" NOT NULL");
    }
    if field.unique && !field.primary_key {
        def.push_str(" UNIQUE");
    }
    if let Some(ref default) = field.default_value {
        def.push_str(&format!(" DEFAULT {}", default));
    }
    def
}

fn create_table_sql(table: &Table) -> String {
    let mut lines: Vec<String> = table
        .fields
        .iter()
        .map(|f| format!("    {}", field_definition(f)))
        .collect();

    let pk: Vec<String> = table
        .fields
        .iter()
        .filter(|f| f.primary_key)
        .map(|f| f.name.clone())
        .collect();
    if !pk.is_empty() {
        lines.push(format!("    PRIMARY KEY ({})", quoted(&pk)));
    }

    let mut sql = format!("CREATE TABLE \"{}\" (\n{}\n);", table.name, lines.join(",\n"));

    for constraint in &table.constraints {
        sql.push('\n');
        sql.push_str(&add_constraint_sql(&table.name, constraint));
    }
    for index in &table.indexes {
        sql.push('\n');
        sql.push_str(&create_index_sql(&table.name, index));
    }
    sql
}

fn add_field_sql(table: &str, field: &Field) -> String {
    format!("ALTER TABLE \"{}\" ADD COLUMN {};", table, field_definition(field))
}

fn modify_field_sql(table: &str, from: &Field, to: &Field) -> String {
    let prefix = format!("ALTER TABLE \"{}\" ALTER COLUMN \"{}\"", table, to.name);
    let mut statements = Vec::new();

    if from.data_type != to.data_type {
        statements.push(format!("{} TYPE {};", prefix, to.data_type));
    }

    if from.nullable != to.nullable {
        if to.nullable {
            statements.push(format!("{} DROP NOT NULL;", prefix));
        } else {
            statements.push(format!("{} SET NOT NULL;", prefix));
        }
    }

    if from.default_value != to.default_value {
        match &to.default_value {
            Some(default) => statements.push(format!("{} SET DEFAULT {};", prefix, default)),
            None => statements.push(format!("{} DROP DEFAULT;", prefix)),
        }
    }

    if from.unique != to.unique {
        let name = format!("{}_{}_key", table, to.name);
        if to.unique {
            statements.push(format!(
                "ALTER TABLE \"{}\" ADD CONSTRAINT \"{}\" UNIQUE (\"{}\");",
                table, name, to.name
            ));
        } else {
            statements.push(drop_constraint_sql(table, &name));
        }
    }

    if from.primary_key != to.primary_key {
        let name = format!("{}_pkey", table);
        if to.primary_key {
            statements.push(format!(
                "ALTER TABLE \"{}\" ADD CONSTRAINT \"{}\" PRIMARY KEY (\"{}\");",
                table, name, to.name
            ));
        } else {
            statements.push(drop_constraint_sql(table, &name));
        }
    }

    statements.join("\n")
}

fn create_index_sql(table: &str, index: &Index) -> String {
    format!(
        "CREATE {}INDEX \"{}\" ON \"{}\" ({});",
        if index.unique { "UNIQUE " } else { "" },
        index.name,
        table,
        quoted(&index.fields)
    )
}

fn drop_index_sql(index: &Index) -> String {
    format!("DROP INDEX \"{}\";", index.name)
}

fn add_constraint_sql(table: &str, constraint: &Constraint) -> String {
    let body = match constraint.kind {
        ConstraintKind::PrimaryKey => format!("PRIMARY KEY ({})", quoted(&constraint.fields)),
        ConstraintKind::Unique => format!("UNIQUE ({})", quoted(&constraint.fields)),
        ConstraintKind::Check => format!(
            "CHECK ({})",
            constraint.expression.as_deref().unwrap_or("TRUE")
        ),
        ConstraintKind::NotNull => {
            let checks: Vec<String> = constraint
                .fields
                .iter()
                .map(|f| format!("\"{}\" IS NOT NULL", f))
                .collect();
            format!("CHECK ({})", checks.join(" AND "))
        }
    };
    format!(
        "ALTER TABLE \"{}\" ADD CONSTRAINT \"{}\" {};",
        table, constraint.name, body
    )
}

fn drop_constraint_sql(table: &str, name: &str) -> String {
    format!("ALTER TABLE \"{}\" DROP CONSTRAINT \"{}\";", table, name)
}

fn add_relationship_sql(rel: &Relationship) -> String {
    let mut sql = format!(
        "ALTER TABLE \"{}\" ADD CONSTRAINT \"{}\" FOREIGN KEY ({}) REFERENCES \"{}\" ({})",
        rel.from_table,
        rel.name,
        quoted(&rel.from_fields),
        rel.to_table,
        quoted(&rel.to_fields)
    );
    if let Some(ref action) = rel.on_delete {
        sql.push_str(&format!(" ON DELETE {}", action.to_uppercase()));
    }
    sql.push(';');
    sql
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::versioning::types::ImpactLevel;
    use serde_json::json;

    fn change(change_type: ChangeType, before: Option<serde_json::Value>, after: Option<serde_json::Value>) -> SchemaChange {
        SchemaChange {
            change_type,
            path: "orders.status".to_string(),
            table: Some("orders".to_string()),
            field: Some("status".to_string()),
            before,
            after,
            impact: ImpactLevel::Low,
            breaking: false,
            confidence: 1.0,
            description: String::new(),
        }
    }

    #[test]
    fn test_add_field_and_inverse() {
        let c = change(
            ChangeType::FieldAdded,
            None,
            Some(json!({ "name": "status", "dataType": "text", "nullable": false, "defaultValue": "'new'" })),
        );

        assert_eq!(
            StatementBuilder::forward(&c).unwrap(),
            "ALTER TABLE \"orders\" ADD COLUMN \"status\" text NOT NULL DEFAULT 'new';"
        );
        assert_eq!(
            StatementBuilder::inverse(&c).unwrap().as_deref(),
            Some("ALTER TABLE \"orders\" DROP COLUMN \"status\";")
        );
    }

    #[test]
    fn test_destructive_change_has_no_inverse() {
        let c = change(
            ChangeType::FieldRemoved,
            Some(json!({ "name": "status", "dataType": "text" })),
            None,
        );
        assert_eq!(StatementBuilder::inverse(&c).unwrap(), None);

        // The structural rollback still recreates the column
        assert_eq!(
            StatementBuilder::structural_rollback(&[c]).unwrap(),
            "ALTER TABLE \"orders\" ADD COLUMN \"status\" text;"
        );
    }

    #[test]
    fn test_modify_field_statements() {
        let c = change(
            ChangeType::FieldModified,
            Some(json!({ "name": "status", "dataType": "varchar(20)" })),
            Some(json!({ "name": "status", "dataType": "text", "nullable": false })),
        );

        let sql = StatementBuilder::forward(&c).unwrap();
        assert!(sql.contains("ALTER COLUMN \"status\" TYPE text;"));
        assert!(sql.contains("ALTER COLUMN \"status\" SET NOT NULL;"));
    }

    #[test]
    fn test_create_table_with_index() {
        let mut c = change(
            ChangeType::TableAdded,
            None,
            Some(json!({
                "name": "orders",
                "fields": [{ "name": "id", "dataType": "uuid", "nullable": false, "primaryKey": true }],
                "indexes": [{ "name": "idx_orders_id", "fields": ["id"], "unique": true }],
                "constraints": []
            })),
        );
        c.field = None;

        let sql = StatementBuilder::forward(&c).unwrap();
        assert!(sql.starts_with("CREATE TABLE \"orders\" (\n    \"id\" uuid NOT NULL,\n    PRIMARY KEY (\"id\")\n);"));
        assert!(sql.ends_with("CREATE UNIQUE INDEX \"idx_orders_id\" ON \"orders\" (\"id\");"));
    }
}

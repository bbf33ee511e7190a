//! Schema snapshot model
//!
//! Snapshots are canonicalized before hashing: every collection is sorted by
//! name, so two submissions describing the same schema always share a
//! checksum regardless of the order their elements were listed in.

use crate::error::AppError;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Complete schema snapshot at a point in time
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaSnapshot {
    #[serde(default)]
    pub tables: Vec<Table>,
    #[serde(default)]
    pub relationships: Vec<Relationship>,
}

/// Table representation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Table {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub fields: Vec<Field>,
    #[serde(default)]
    pub indexes: Vec<Index>,
    #[serde(default)]
    pub constraints: Vec<Constraint>,
}

/// Field (column) representation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Field {
    pub name: String,
    pub data_type: String,
    #[serde(default = "default_nullable")]
    pub nullable: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<String>,
    #[serde(default)]
    pub primary_key: bool,
    #[serde(default)]
    pub unique: bool,
}

fn default_nullable() -> bool {
    true
}

/// Index representation. Field order is significant (composite indexes).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Index {
    pub name: String,
    pub fields: Vec<String>,
    #[serde(default)]
    pub unique: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConstraintKind {
    PrimaryKey,
    Unique,
    Check,
    NotNull,
}

/// Table-level constraint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Constraint {
    pub name: String,
    pub kind: ConstraintKind,
    #[serde(default)]
    pub fields: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expression: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationshipKind {
    OneToOne,
    #[default]
    ManyToOne,
    ManyToMany,
}

/// Relationship between two tables (foreign key)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Relationship {
    pub name: String,
    pub from_table: String,
    pub from_fields: Vec<String>,
    pub to_table: String,
    pub to_fields: Vec<String>,
    #[serde(default)]
    pub kind: RelationshipKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub on_delete: Option<String>,
}

impl SchemaSnapshot {
    /// Parse a raw JSON schema representation and validate it
    pub fn from_value(value: serde_json::Value) -> Result<Self, AppError> {
        let snapshot: SchemaSnapshot = serde_json::from_value(value)
            .map_err(|e| AppError::Validation(format!("malformed schema: {}", e)))?;
        snapshot.validate()?;
        Ok(snapshot.canonical())
    }

    /// Return the canonical form: all collections sorted by name
    pub fn canonical(mut self) -> Self {
        self.tables.sort_by(|a, b| a.name.cmp(&b.name));
        for table in &mut self.tables {
            table.fields.sort_by(|a, b| a.name.cmp(&b.name));
            table.indexes.sort_by(|a, b| a.name.cmp(&b.name));
            table.constraints.sort_by(|a, b| a.name.cmp(&b.name));
        }
        self.relationships.sort_by(|a, b| a.name.cmp(&b.name));
        self
    }

    /// Compute the content hash (SHA-256 over the canonical serialization)
    pub fn compute_hash(&self) -> Result<String, AppError> {
        let canonical = self.clone().canonical();
        let bytes = serde_json::to_vec(&canonical)?;

        let mut hasher = Sha256::new();
        hasher.update(&bytes);
        Ok(format!("{:x}", hasher.finalize()))
    }

    pub fn table(&self, name: &str) -> Option<&Table> {
        self.tables.iter().find(|t| t.name == name)
    }

    pub fn table_mut(&mut self, name: &str) -> Option<&mut Table> {
        self.tables.iter_mut().find(|t| t.name == name)
    }

    pub fn field_count(&self) -> usize {
        self.tables.iter().map(|t| t.fields.len()).sum()
    }
}

impl Table {
    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Whether the table declares a primary key, on a field or as a constraint
    pub fn has_primary_key(&self) -> bool {
        self.fields.iter().any(|f| f.primary_key)
            || self
                .constraints
                .iter()
                .any(|c| c.kind == ConstraintKind::PrimaryKey)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn orders_table() -> Table {
        Table {
            name: "orders".to_string(),
            description: None,
            fields: vec![
                Field {
                    name: "id".to_string(),
                    data_type: "uuid".to_string(),
                    nullable: false,
                    default_value: None,
                    primary_key: true,
                    unique: true,
                },
                Field {
                    name: "total".to_string(),
                    data_type: "numeric".to_string(),
                    nullable: true,
                    default_value: None,
                    primary_key: false,
                    unique: false,
                },
            ],
            indexes: vec![],
            constraints: vec![],
        }
    }

    #[test]
    fn test_hash_consistency() {
        let snapshot = SchemaSnapshot {
            tables: vec![orders_table()],
            relationships: vec![],
        };

        let hash1 = snapshot.compute_hash().unwrap();
        let hash2 = snapshot.compute_hash().unwrap();

        assert_eq!(hash1, hash2);
        assert_eq!(hash1.len(), 64);
    }

    #[test]
    fn test_hash_ignores_element_order() {
        let mut reversed = orders_table();
        reversed.fields.reverse();

        let customers = Table {
            name: "customers".to_string(),
            description: None,
            fields: vec![],
            indexes: vec![],
            constraints: vec![],
        };

        let a = SchemaSnapshot {
            tables: vec![orders_table(), customers.clone()],
            relationships: vec![],
        };
        let b = SchemaSnapshot {
            tables: vec![customers, reversed],
            relationships: vec![],
        };

        assert_eq!(a.compute_hash().unwrap(), b.compute_hash().unwrap());
    }

    #[test]
    fn test_hash_ignores_json_key_order() {
        let a = SchemaSnapshot::from_value(json!({
            "tables": [{ "name": "orders", "fields": [{ "name": "id", "dataType": "uuid" }] }]
        }))
        .unwrap();
        let b = SchemaSnapshot::from_value(json!({
            "relationships": [],
            "tables": [{ "fields": [{ "dataType": "uuid", "name": "id", "nullable": true }], "name": "orders" }]
        }))
        .unwrap();

        assert_eq!(a.compute_hash().unwrap(), b.compute_hash().unwrap());
    }

    #[test]
    fn test_hash_changes_with_content() {
        let a = SchemaSnapshot {
            tables: vec![orders_table()],
            relationships: vec![],
        };
        let mut b = a.clone();
        b.tables[0].fields[1].data_type = "bigint".to_string();

        assert_ne!(a.compute_hash().unwrap(), b.compute_hash().unwrap());
    }

    #[test]
    fn test_from_value_rejects_malformed_input() {
        let result = SchemaSnapshot::from_value(json!({ "tables": "orders" }));
        assert!(matches!(result, Err(AppError::Validation(msg)) if msg.starts_with("malformed schema")));
    }

    #[test]
    fn test_field_defaults_to_nullable() {
        let snapshot = SchemaSnapshot::from_value(json!({
            "tables": [{ "name": "orders", "fields": [{ "name": "note", "dataType": "text" }] }]
        }))
        .unwrap();

        let field = snapshot.table("orders").and_then(|t| t.field("note")).unwrap();
        assert!(field.nullable);
        assert!(!field.primary_key);
    }
}

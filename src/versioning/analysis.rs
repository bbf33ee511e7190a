//! Advisory schema analysis
//!
//! Analysis output is attached to versions and diffs for humans to read.
//! Nothing in the engine branches on it, and an analyzer failure never
//! blocks version creation.

use crate::schema::SchemaSnapshot;
use crate::versioning::types::{AiAnalysis, SchemaChange};
use chrono::Utc;
use std::collections::HashMap;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum AnalysisError {
    #[error("analysis unavailable: {0}")]
    Unavailable(String),
}

/// Produces advisory analysis for a snapshot and the changes that led to it
pub trait SchemaAnalyzer: Send + Sync {
    fn analyze(
        &self,
        snapshot: &SchemaSnapshot,
        previous: Option<&SchemaSnapshot>,
        changes: &[SchemaChange],
    ) -> Result<AiAnalysis, AnalysisError>;
}

/// Tables with more fields than this get a split suggestion
const WIDE_TABLE_FIELDS: usize = 30;
const HEURISTIC_CONFIDENCE: f64 = 0.85;

/// Rule-based analyzer working purely from structure
pub struct HeuristicAnalyzer;

impl SchemaAnalyzer for HeuristicAnalyzer {
    fn analyze(
        &self,
        snapshot: &SchemaSnapshot,
        previous: Option<&SchemaSnapshot>,
        changes: &[SchemaChange],
    ) -> Result<AiAnalysis, AnalysisError> {
        let mut suggestions = Vec::new();
        let mut risks = Vec::new();
        let mut optimizations = Vec::new();

        for table in &snapshot.tables {
            if !table.has_primary_key() {
                suggestions.push(format!("Add a primary key to {}", table.name));
            }
            if table.fields.len() > WIDE_TABLE_FIELDS {
                suggestions.push(format!(
                    "Consider splitting {} ({} fields) into narrower tables",
                    table.name,
                    table.fields.len()
                ));
            }

            let mut seen: HashMap<&[String], &str> = HashMap::new();
            for index in &table.indexes {
                if let Some(existing) = seen.insert(index.fields.as_slice(), index.name.as_str()) {
                    optimizations.push(format!(
                        "Drop redundant index {} on {} (same fields as {})",
                        index.name, table.name, existing
                    ));
                }
            }
        }

        for rel in &snapshot.relationships {
            let indexed = snapshot.table(&rel.from_table).is_some_and(|t| {
                t.indexes.iter().any(|i| i.fields.starts_with(&rel.from_fields))
                    || (rel.from_fields.len() == 1
                        && t.field(&rel.from_fields[0]).is_some_and(|f| f.primary_key || f.unique))
            });
            if !indexed {
                optimizations.push(format!(
                    "Index {}({}) to support relationship {}",
                    rel.from_table,
                    rel.from_fields.join(", "),
                    rel.name
                ));
            }
        }

        let breaking: Vec<&SchemaChange> = changes.iter().filter(|c| c.breaking).collect();
        risks.extend(breaking.iter().map(|c| c.description.clone()));

        let reasoning = match previous {
            Some(previous) => format!(
                "Compared {} tables against {} in the previous version: {} changes, {} breaking",
                snapshot.tables.len(),
                previous.tables.len(),
                changes.len(),
                breaking.len()
            ),
            None => format!(
                "Initial schema with {} tables and {} fields",
                snapshot.tables.len(),
                snapshot.field_count()
            ),
        };

        Ok(AiAnalysis {
            confidence: HEURISTIC_CONFIDENCE,
            reasoning,
            suggestions,
            risks,
            optimizations,
            analyzed_at: Utc::now(),
        })
    }
}
